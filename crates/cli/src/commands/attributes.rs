use crate::context::Globals;
use crate::render;

pub(crate) async fn cmd_attributes(globals: &Globals) -> Result<(), String> {
    let (catalog, issues) = globals.catalog(None).await?;

    if globals.json() {
        let value = serde_json::json!({
            "attributes": catalog.iter().collect::<Vec<_>>(),
            "issues": issues.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?);
        return Ok(());
    }

    for attr in catalog.iter() {
        println!("{}", render::attribute_line(attr));
    }
    if !globals.quiet {
        for issue in &issues {
            eprintln!("warning: {}", issue);
        }
    }
    Ok(())
}
