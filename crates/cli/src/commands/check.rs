use std::path::Path;
use std::sync::Arc;

use segment_core::SegmentBuilder;

use crate::context::{read_filter, Globals};
use crate::render;

/// Replay a filter file through the builder. Exits non-zero when any
/// condition is rejected or incomplete.
pub(crate) async fn cmd_check(globals: &Globals, filter_path: &Path) -> Result<(), String> {
    let filter = read_filter(filter_path)?;
    let (catalog, _) = globals.catalog(None).await?;
    let (builder, issues) = SegmentBuilder::load(Arc::new(catalog), filter);
    let ok = issues.is_empty() && builder.is_previewable();

    if globals.json() {
        let value = serde_json::json!({
            "valid": ok,
            "issues": issues.iter().map(render::issue_line).collect::<Vec<_>>(),
            "payload": builder.filter().payload(),
        });
        println!("{}", serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?);
    } else if !globals.quiet {
        for line in render::filter_lines(builder.filter(), builder.catalog()) {
            println!("{}", line);
        }
        for issue in &issues {
            println!("{}", render::issue_line(issue));
        }
    }

    if ok {
        if !globals.quiet && !globals.json() {
            println!("{}: ok", filter_path.display());
        }
        Ok(())
    } else if builder.is_empty() {
        Err(format!("{}: filter has no conditions", filter_path.display()))
    } else {
        Err(format!(
            "{}: {} problem(s) found",
            filter_path.display(),
            issues.len().max(1)
        ))
    }
}
