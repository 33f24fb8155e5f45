//! Search command handler: raw catalog query.

use anyhow::{Context, Result};
use tracing::info;

use alexandria_core::{AppConfig, CandidateSearch, SearchClient};

use super::print_candidates;
use crate::cli::SearchArgs;

pub async fn run_search_command(config: &AppConfig, args: &SearchArgs) -> Result<()> {
    let client = SearchClient::new(&config.catalog_host, config.page_timeouts())
        .context("Failed to create search client")?;
    let query = args.query.join(" ");
    info!(query = %query, host = %config.catalog_host, "searching catalog");

    let Some(candidates) = client.search_candidates(&query).await else {
        println!("Catalog unavailable; no results for \"{query}\".");
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else if candidates.is_empty() {
        println!("No results for \"{query}\".");
    } else {
        print_candidates(&candidates);
    }
    Ok(())
}
