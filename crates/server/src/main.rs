//! Test harness for the hybrid recommendation engine.
//!
//! Loads a dataset, builds a snapshot, and runs one recommendation round
//! end-to-end. Useful for eyeballing the pipeline without the CLI.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use data_loader::parser;
use server::{EngineConfig, HybridEngine, SignalStatus};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info,server=debug,sources=debug,pipeline=debug")
        .init();

    info!("Starting cine-fuse server test harness");

    info!("Loading dataset...");
    let (report, ratings) = parser::parse_dataset(
        Path::new("data/enriched_movies.jsonl"),
        Path::new("data/ratings.dat"),
    )
    .context("Failed to load dataset")?;

    info!("Building snapshot...");
    let engine = HybridEngine::from_records(report.movies, ratings, EngineConfig::default())?;
    info!("Snapshot ready");

    let query = "Avatar";
    let top_k = 10;
    info!("Requesting {} recommendations for {:?}", top_k, query);
    let response = engine.recommend(query, None, top_k, None).await?;

    info!(
        "Resolved to movie {} ({})",
        response.resolved_id, response.resolved_title
    );
    if let SignalStatus::ColdStart(reason) = response.collaborative {
        info!("Collaborative signal unavailable: {}", reason);
    }
    for rec in &response.recommendations {
        info!(
            "{}. {} ({}) - fused {:.3} (content {:?}, collaborative {:?})",
            rec.rank,
            rec.title,
            rec.year.map(|y| y.to_string()).unwrap_or("????".to_string()),
            rec.fused_score,
            rec.content_score,
            rec.collaborative_score,
        );
        info!("   Genres: {}", rec.genres.join(", "));
    }

    Ok(())
}
