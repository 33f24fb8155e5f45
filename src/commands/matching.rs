//! Match command handler: candidates for one catalog record.

use std::sync::Arc;

use anyhow::{Context, Result};

use alexandria_core::{
    AppConfig, CandidateMatcher, MatchOutcome, MatchPolicy, MatchRegistry, SearchClient,
};

use super::{load_record, print_candidates};
use crate::cli::MatchArgs;

pub async fn run_match_command(config: &AppConfig, args: &MatchArgs) -> Result<()> {
    let record = load_record(&args.record)?;
    let matcher = build_matcher(config, args.rank)?;
    let registry = MatchRegistry::new();

    match registry.search_once(&matcher, &record).await {
        MatchOutcome::Matched(matches) if args.json => {
            println!("{}", serde_json::to_string_pretty(&matches)?);
        }
        MatchOutcome::Matched(matches) if matches.is_empty() => {
            println!("Not found: {}", record.title());
        }
        MatchOutcome::Matched(matches) => print_candidates(&matches),
        MatchOutcome::Unavailable => println!("Catalog unavailable; try again later."),
        MatchOutcome::Skipped => {}
    }
    Ok(())
}

pub(crate) fn build_matcher(config: &AppConfig, rank: bool) -> Result<CandidateMatcher> {
    let search = SearchClient::new(&config.catalog_host, config.page_timeouts())
        .context("Failed to create search client")?;
    let policy = if rank {
        MatchPolicy::RankByTitle
    } else {
        MatchPolicy::Permissive
    };
    Ok(CandidateMatcher::new(Arc::new(search)).with_policy(policy))
}
