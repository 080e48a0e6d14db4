//! Parsers for the source datasets.
//!
//! Two input formats:
//! - `movies.jsonl`: one enriched movie record per line, JSON, UTF-8.
//!   Produced by the external metadata-enrichment collaborator.
//! - `ratings.dat`: `userId::movieId::rating::timestamp`, ISO-8859-1,
//!   the classic MovieLens layout.
//!
//! Movie parsing uses partial-failure semantics: a malformed record is
//! recorded and excluded rather than aborting the whole load. Whether the
//! rejected fraction is acceptable is decided by the build phase, not here.
//! Ratings files are machine-generated and parsed strictly.

use crate::error::{DataLoadError, Result};
use crate::types::{Movie, RatingEntry};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// A movie record that failed parsing or validation, with the reason.
#[derive(Debug)]
pub struct RejectedRecord {
    pub line: usize,
    pub reason: String,
}

/// Result of parsing an enriched movie file: accepted records plus the
/// rejection ledger.
#[derive(Debug)]
pub struct MovieParseReport {
    pub movies: Vec<Movie>,
    pub rejected: Vec<RejectedRecord>,
}

/// Helper to read a file with ISO-8859-1 encoding (Latin-1).
///
/// The ratings dataset predates UTF-8 adoption; each byte maps directly to
/// the Unicode code point of the same value.
fn read_lines_latin1(path: &Path) -> Result<Vec<String>> {
    let mut file = File::open(path).map_err(|_| DataLoadError::FileNotFound {
        path: path.display().to_string(),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content: String = bytes.iter().map(|&b| b as char).collect();
    Ok(content.lines().map(|s| s.to_string()).collect())
}

fn read_lines_utf8(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|_| DataLoadError::FileNotFound {
        path: path.display().to_string(),
    })?;
    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Parse a JSON-lines file of enriched movie records.
///
/// Each accepted record has passed [`Movie::validate`]; everything else
/// lands in the report's `rejected` list with line number and reason.
pub fn parse_movies(path: &Path) -> Result<MovieParseReport> {
    let lines = read_lines_utf8(path)?;
    let mut movies = Vec::new();
    let mut rejected = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let movie: Movie = match serde_json::from_str(trimmed) {
            Ok(movie) => movie,
            Err(e) => {
                warn!("Rejecting movie record at line {}: {}", line_no, e);
                rejected.push(RejectedRecord {
                    line: line_no,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if let Err(e) = movie.validate() {
            warn!("Rejecting movie {} at line {}: {}", movie.id, line_no, e);
            rejected.push(RejectedRecord {
                line: line_no,
                reason: e.to_string(),
            });
            continue;
        }

        movies.push(movie);
    }

    Ok(MovieParseReport { movies, rejected })
}

/// Parse a `userId::movieId::rating::timestamp` ratings file.
pub fn parse_ratings(path: &Path) -> Result<Vec<RatingEntry>> {
    let lines = read_lines_latin1(path)?;
    let mut ratings = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let parts: Vec<&str> = trimmed.split("::").collect();
        if parts.len() != 4 {
            return Err(DataLoadError::FieldCountMismatch {
                expected: 4,
                found: parts.len(),
                line: line_no,
            });
        }

        let rating = RatingEntry {
            user_id: parse_field(parts[0], "userId", path, line_no)?,
            movie_id: parse_field(parts[1], "movieId", path, line_no)?,
            rating: parse_field(parts[2], "rating", path, line_no)?,
            timestamp: parse_field(parts[3], "timestamp", path, line_no)?,
        };

        if !(1.0..=5.0).contains(&rating.rating) {
            return Err(DataLoadError::InvalidValue {
                field: "rating".to_string(),
                value: rating.rating.to_string(),
            });
        }

        ratings.push(rating);
    }

    Ok(ratings)
}

/// Parse the movies and ratings files in parallel.
///
/// This is the usual entry point for loading a full refresh of source
/// data; the pieces feed the build phase directly.
pub fn parse_dataset(
    movies_path: &Path,
    ratings_path: &Path,
) -> Result<(MovieParseReport, Vec<RatingEntry>)> {
    let (report, ratings) = rayon::join(
        || parse_movies(movies_path),
        || parse_ratings(ratings_path),
    );
    let report = report?;
    let ratings = ratings?;

    info!(
        "Loaded {} movies ({} rejected) and {} ratings",
        report.movies.len(),
        report.rejected.len(),
        ratings.len()
    );
    Ok((report, ratings))
}

fn parse_field<T: std::str::FromStr>(
    raw: &str,
    field: &str,
    path: &Path,
    line: usize,
) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| DataLoadError::ParseError {
        file: path.display().to_string(),
        line,
        reason: format!("Invalid {}: {}", field, e),
    })
}
