use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{parser, MovieId, UserId};
use pipeline::{HybridWeights, QueryError};
use server::{EngineConfig, HybridEngine, RecommendResponse, SignalStatus};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// cine-fuse - Hybrid Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "cine-fuse")]
#[command(about = "Hybrid movie recommendations (content + collaborative)", long_about = None)]
struct Cli {
    /// Path to the enriched movies JSON-lines file
    #[arg(long, default_value = "data/enriched_movies.jsonl")]
    movies: PathBuf,

    /// Path to the ratings file (userId::movieId::rating::timestamp)
    #[arg(long, default_value = "data/ratings.dat")]
    ratings: PathBuf,

    /// Minimum ratings a movie needs to enter the interaction matrix
    #[arg(long, default_value = "10")]
    min_ratings: u32,

    /// Neighbor count for collaborative retrieval
    #[arg(long, default_value = "10")]
    k_neighbors: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get recommendations for a movie title (any supported language)
    Recommend {
        /// Movie title to recommend from
        #[arg(long)]
        query: String,

        /// Number of recommendations to return
        #[arg(long, default_value = "5")]
        limit: usize,

        /// Requesting user, if known
        #[arg(long)]
        user_id: Option<UserId>,

        /// Content weight override (collaborative becomes 1 - content)
        #[arg(long)]
        content_weight: Option<f32>,

        /// Show per-source scores for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Resolve a title query to its canonical movie without recommending
    Resolve {
        /// Movie title to resolve
        #[arg(long)]
        query: String,
    },

    /// Search movies by title substring
    Search {
        /// Title fragment to search for (case-insensitive)
        #[arg(long)]
        title: String,
    },

    /// Show one movie record and its rating stats
    Movie {
        /// Movie ID to display
        #[arg(long)]
        id: MovieId,
    },

    /// Run a latency benchmark over random queries
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    println!(
        "Loading dataset from {} and {}...",
        cli.movies.display(),
        cli.ratings.display()
    );
    let start = Instant::now();
    let (report, ratings) =
        parser::parse_dataset(&cli.movies, &cli.ratings).context("Failed to load dataset")?;
    if !report.rejected.is_empty() {
        println!(
            "{} {} malformed movie records excluded",
            "!".yellow(),
            report.rejected.len()
        );
    }

    let config = EngineConfig {
        min_ratings: cli.min_ratings,
        k_neighbors: cli.k_neighbors,
        ..EngineConfig::default()
    };
    let engine = Arc::new(
        HybridEngine::from_records(report.movies, ratings, config)
            .map_err(|e| anyhow!("Failed to build snapshot: {e}"))?,
    );
    println!("{} Engine ready in {:?}", "✓".green(), start.elapsed());

    match cli.command {
        Commands::Recommend {
            query,
            limit,
            user_id,
            content_weight,
            explain,
        } => handle_recommend(engine, query, limit, user_id, content_weight, explain).await?,
        Commands::Resolve { query } => handle_resolve(engine, query)?,
        Commands::Search { title } => handle_search(engine, title)?,
        Commands::Movie { id } => handle_movie(engine, id)?,
        Commands::Benchmark { requests } => handle_benchmark(engine, requests).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    engine: Arc<HybridEngine>,
    query: String,
    limit: usize,
    user_id: Option<UserId>,
    content_weight: Option<f32>,
    explain: bool,
) -> Result<()> {
    let weights = content_weight.map(|c| HybridWeights::new(c, 1.0 - c));

    let response = match engine.recommend(&query, user_id, limit, weights).await {
        Ok(response) => response,
        Err(e) => return Err(describe_query_error(e, &engine)),
    };

    print_response(&response, explain);
    Ok(())
}

/// Handle the 'resolve' command
fn handle_resolve(engine: Arc<HybridEngine>, query: String) -> Result<()> {
    let snapshot = engine.snapshot();
    match snapshot.resolver.resolve(&query) {
        Ok(resolved) => {
            let movie = snapshot
                .catalog
                .get_movie(resolved.movie_id)
                .ok_or_else(|| anyhow!("Resolved movie {} missing from catalog", resolved.movie_id))?;
            println!(
                "{} {:?} -> {} ({}) [id {}, match score {:.2}, query language {:?}]",
                "✓".green(),
                query,
                movie.title,
                movie.year.map(|y| y.to_string()).unwrap_or("????".to_string()),
                movie.id,
                resolved.match_score,
                resolved.query_language,
            );
            Ok(())
        }
        Err(QueryError::Ambiguous { candidates, .. }) => {
            println!("{} Query {:?} is ambiguous between:", "!".yellow(), query);
            for (id, score) in &candidates {
                if let Some(movie) = snapshot.catalog.get_movie(*id) {
                    println!("  - {} [id {}, score {:.2}]", movie.title, id, score);
                }
            }
            Err(anyhow!("ambiguous query"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle the 'search' command
fn handle_search(engine: Arc<HybridEngine>, title: String) -> Result<()> {
    let snapshot = engine.snapshot();
    let hits = snapshot.catalog.search_titles(&title, 20);

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if hits.is_empty() {
        println!("  (no matches)");
        return Ok(());
    }
    for movie in hits {
        println!(
            "{}: {} ({}) [{}] vote avg {:.1} ({} votes, {} ratings)",
            movie.id,
            movie.title,
            movie.year.map(|y| y.to_string()).unwrap_or("????".to_string()),
            movie.genres.join(", "),
            movie.vote_average,
            movie.vote_count,
            snapshot.catalog.rating_count_for(movie.id),
        );
    }
    Ok(())
}

/// Handle the 'movie' command
fn handle_movie(engine: Arc<HybridEngine>, id: MovieId) -> Result<()> {
    let snapshot = engine.snapshot();
    let movie = snapshot
        .catalog
        .get_movie(id)
        .ok_or_else(|| anyhow!("Movie {} not found", id))?;

    println!("{}", format!("Movie {}", id).bold().blue());
    println!("{}Title: {}", "• ".green(), movie.title);
    if !movie.alternate_titles.is_empty() {
        println!("{}Also known as: {}", "• ".green(), movie.alternate_titles.join(", "));
    }
    println!("{}Language: {}", "• ".green(), movie.language);
    println!(
        "{}Year: {}",
        "• ".green(),
        movie.year.map(|y| y.to_string()).unwrap_or("unknown".to_string())
    );
    println!("{}Genres: {}", "• ".green(), movie.genres.join(", "));
    println!("{}Director: {}", "• ".green(), movie.director);
    println!("{}Actors: {}", "• ".green(), movie.actors.join(", "));
    println!(
        "{}Votes: {:.1} avg over {} votes",
        "• ".cyan(),
        movie.vote_average,
        movie.vote_count
    );
    if let Some(sentiment) = movie.sentiment_rating {
        println!("{}Sentiment rating: {:.2} / 4.0", "• ".cyan(), sentiment);
    }
    println!(
        "{}Ratings in dataset: {}",
        "• ".cyan(),
        snapshot.catalog.rating_count_for(id)
    );
    if snapshot.matrix.contains(id) {
        println!("{}In interaction matrix: yes", "• ".cyan());
    } else {
        println!(
            "{}In interaction matrix: no (below min-ratings threshold)",
            "• ".cyan()
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(engine: Arc<HybridEngine>, requests: usize) -> Result<()> {
    let snapshot = engine.snapshot();
    let movie_ids = snapshot.catalog.movie_ids();
    if movie_ids.is_empty() {
        return Err(anyhow!("No movies loaded; nothing to benchmark"));
    }

    // Random titles from the catalog as queries
    let queries: Vec<String> = (0..requests)
        .filter_map(|_| {
            let id = movie_ids[rand::random::<u32>() as usize % movie_ids.len()];
            Some(snapshot.catalog.get_movie(id)?.title.clone())
        })
        .collect();

    let bench_start = Instant::now();
    let mut handles = vec![];
    for query in queries {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let start = Instant::now();
            // Cold starts and ambiguous titles still count as served requests
            let _ = engine.recommend(&query, None, 10, None).await;
            start.elapsed()
        }));
    }

    let mut timings = vec![];
    for handle in handles {
        timings.push(handle.await?);
    }
    if timings.is_empty() {
        return Err(anyhow!("No requests were made"));
    }

    timings.sort();
    let total: std::time::Duration = timings.iter().sum();
    let p50 = timings[timings.len() / 2];
    let p95 = timings[((timings.len() as f32 * 0.95) as usize).min(timings.len() - 1)];
    let p99 = timings[((timings.len() as f32 * 0.99) as usize).min(timings.len() - 1)];

    println!("Benchmark results:");
    println!("Requests: {}", requests);
    println!("Wall time: {:?}", bench_start.elapsed());
    println!("Average latency: {:?}", total / timings.len() as u32);
    println!("P50 latency: {:?}", p50);
    println!("P95 latency: {:?}", p95);
    println!("P99 latency: {:?}", p99);
    println!(
        "Throughput: {:.2} requests/second",
        requests as f32 / bench_start.elapsed().as_secs_f32()
    );
    Ok(())
}

/// Render query-layer failures with their candidate sets where useful.
fn describe_query_error(e: anyhow::Error, engine: &HybridEngine) -> anyhow::Error {
    if let Some(QueryError::Ambiguous { query, candidates }) = e.downcast_ref::<QueryError>() {
        let snapshot = engine.snapshot();
        let titles: Vec<String> = candidates
            .iter()
            .filter_map(|(id, _)| snapshot.catalog.get_movie(*id).map(|m| m.title.clone()))
            .collect();
        return anyhow!(
            "Query {:?} is ambiguous between: {}. Be more specific.",
            query,
            titles.join(" / ")
        );
    }
    e
}

/// Format and print one recommendation response
fn print_response(response: &RecommendResponse, explain: bool) {
    println!(
        "{}",
        format!(
            "Recommendations for {} (resolved from {:?}):",
            response.resolved_title, response.query
        )
        .bold()
        .blue()
    );
    if let SignalStatus::ColdStart(reason) = response.collaborative {
        println!(
            "{} Collaborative signal unavailable ({}); content-only ranking",
            "!".yellow(),
            reason
        );
    }
    for rec in &response.recommendations {
        println!(
            "{}. {} ({}) [{}] - score {:.3}",
            rec.rank.to_string().green(),
            rec.title,
            rec.year.map(|y| y.to_string()).unwrap_or("????".to_string()),
            rec.genres.join(", "),
            rec.fused_score,
        );
        if explain {
            println!(
                "   content: {}, collaborative: {}",
                rec.content_score
                    .map(|s| format!("{:.3}", s))
                    .unwrap_or_else(|| "absent".to_string()),
                rec.collaborative_score
                    .map(|s| format!("{:.3}", s))
                    .unwrap_or_else(|| "absent".to_string()),
            );
        }
    }
}
