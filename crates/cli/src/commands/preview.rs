use std::path::Path;
use std::sync::Arc;

use segment_client::SegmentApi;
use segment_core::SegmentBuilder;

use crate::context::{read_filter, Globals};
use crate::render;

/// One-off preview of a filter file. No debounce: the request goes out
/// immediately.
pub(crate) async fn cmd_preview(globals: &Globals, filter_path: &Path) -> Result<(), String> {
    let filter = read_filter(filter_path)?;
    let (api, settings) = globals.api()?;
    let (catalog, _) = globals.catalog(Some(&*api)).await?;

    let (builder, issues) = SegmentBuilder::load(Arc::new(catalog), filter);
    if let Some(issue) = issues.first() {
        return Err(format!(
            "{}: {}",
            filter_path.display(),
            render::issue_line(issue)
        ));
    }
    if !builder.is_previewable() {
        return Err(format!("{}: filter has no conditions", filter_path.display()));
    }

    let result = api
        .preview(&builder.filter().payload(), settings.limit)
        .await
        .map_err(|e| e.to_string())?;

    if globals.json() {
        println!("{}", serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?);
    } else {
        for line in render::preview_lines(&result) {
            println!("{}", line);
        }
    }
    Ok(())
}
