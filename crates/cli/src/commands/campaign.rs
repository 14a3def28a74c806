use std::path::Path;

use segment_client::{CampaignMessage, SegmentSession};

use crate::context::{read_filter, Globals};
use crate::render;

pub(crate) async fn cmd_campaign(
    globals: &Globals,
    filter_path: &Path,
    message: CampaignMessage,
) -> Result<(), String> {
    let filter = read_filter(filter_path)?;
    let (api, settings) = globals.api()?;
    let (catalog, _) = globals.catalog(Some(&*api)).await?;

    let mut session = SegmentSession::with_catalog(api, std::sync::Arc::new(catalog), settings);
    let issues = session.load_filter(filter);
    if let Some(issue) = issues.first() {
        return Err(format!(
            "{}: {}",
            filter_path.display(),
            render::issue_line(issue)
        ));
    }

    let campaign = session
        .create_campaign(message)
        .await
        .map_err(|e| e.to_string())?;

    if globals.json() {
        println!("{}", serde_json::to_string_pretty(&campaign).map_err(|e| e.to_string())?);
    } else if !globals.quiet {
        println!(
            "created campaign '{}' (id {}, status {})",
            campaign.name,
            campaign.id.as_deref().unwrap_or("?"),
            campaign.status.as_deref().unwrap_or("unknown")
        );
    }
    Ok(())
}
