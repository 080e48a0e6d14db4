//! Query resolution: free-text, possibly multilingual title → canonical
//! movie id.
//!
//! ## Algorithm
//! 1. Normalize the query (trim, lowercase, collapse whitespace) and
//!    detect its language by script inspection
//! 2. Exact match against canonical and alternate-language titles
//! 3. Fall back to fuzzy matching (normalized Levenshtein) over every
//!    registered title
//! 4. Below the acceptance threshold → `NoMatch`; two distinct movies
//!    within the ambiguity margin → `Ambiguous` with the candidate set
//!
//! Never a silent wrong guess: an exact hit on a title registered for
//! several movies is ambiguous too.

use crate::error::{QueryError, Result};
use data_loader::{Language, Movie, MovieId};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Default minimum fuzzy score a match must clear.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.6;

/// Default margin under the best score within which a second distinct
/// movie makes the query ambiguous.
pub const DEFAULT_AMBIGUITY_MARGIN: f64 = 0.05;

/// A successfully resolved query.
#[derive(Debug, Clone)]
pub struct ResolvedQuery {
    pub movie_id: MovieId,
    /// The registered title that matched (canonical or alternate).
    pub matched_title: String,
    /// Language detected from the query text.
    pub query_language: Language,
    /// 1.0 for exact matches, the fuzzy score otherwise.
    pub match_score: f64,
}

/// One registered title, canonical or alternate, pointing at its movie.
#[derive(Debug, Clone)]
struct TitleEntry {
    normalized: String,
    movie_id: MovieId,
}

/// Maps free-text title queries to canonical movie ids.
///
/// Built once per snapshot over every canonical and alternate title in the
/// catalog; read-only afterward.
pub struct QueryResolver {
    titles: Vec<TitleEntry>,
    exact: HashMap<String, Vec<MovieId>>,
    fuzzy_threshold: f64,
    ambiguity_margin: f64,
}

impl QueryResolver {
    /// Build a resolver over the given movies.
    pub fn new<'a>(movies: impl Iterator<Item = &'a Movie>, fuzzy_threshold: f64) -> Self {
        let mut titles = Vec::new();
        let mut exact: HashMap<String, Vec<MovieId>> = HashMap::new();

        for movie in movies {
            for title in std::iter::once(&movie.title).chain(movie.alternate_titles.iter()) {
                let normalized = normalize_title(title);
                if normalized.is_empty() {
                    continue;
                }
                let ids = exact.entry(normalized.clone()).or_default();
                if !ids.contains(&movie.id) {
                    ids.push(movie.id);
                    titles.push(TitleEntry {
                        normalized,
                        movie_id: movie.id,
                    });
                }
            }
        }

        Self {
            titles,
            exact,
            fuzzy_threshold,
            ambiguity_margin: DEFAULT_AMBIGUITY_MARGIN,
        }
    }

    /// Configure the ambiguity margin (default: 0.05)
    pub fn with_ambiguity_margin(mut self, margin: f64) -> Self {
        self.ambiguity_margin = margin;
        self
    }

    pub fn title_count(&self) -> usize {
        self.titles.len()
    }

    /// Resolve a query to the single best-matching movie.
    #[instrument(skip(self))]
    pub fn resolve(&self, query: &str) -> Result<ResolvedQuery> {
        let normalized = normalize_title(query);
        let query_language = Language::detect(query);
        debug!(?query_language, %normalized, "Resolving query");

        if normalized.is_empty() {
            return Err(QueryError::NoMatch {
                query: query.to_string(),
                best_score: 0.0,
            });
        }

        // Exact match first, canonical and alternate titles alike
        if let Some(ids) = self.exact.get(&normalized) {
            match ids.as_slice() {
                [movie_id] => {
                    return Ok(ResolvedQuery {
                        movie_id: *movie_id,
                        matched_title: normalized,
                        query_language,
                        match_score: 1.0,
                    });
                }
                _ => {
                    // The same title is registered for several movies
                    return Err(QueryError::Ambiguous {
                        query: query.to_string(),
                        candidates: ids.iter().map(|&id| (id, 1.0)).collect(),
                    });
                }
            }
        }

        self.resolve_fuzzy(query, &normalized, query_language)
    }

    /// Approximate matching over all registered titles, keeping the best
    /// score per distinct movie.
    fn resolve_fuzzy(
        &self,
        query: &str,
        normalized: &str,
        query_language: Language,
    ) -> Result<ResolvedQuery> {
        let mut best_per_movie: HashMap<MovieId, (f64, &TitleEntry)> = HashMap::new();
        for entry in &self.titles {
            let score = strsim::normalized_levenshtein(normalized, &entry.normalized);
            let slot = best_per_movie
                .entry(entry.movie_id)
                .or_insert((f64::NEG_INFINITY, entry));
            if score > slot.0 {
                *slot = (score, entry);
            }
        }

        let mut ranked: Vec<(MovieId, f64, &TitleEntry)> = best_per_movie
            .into_iter()
            .map(|(id, (score, entry))| (id, score, entry))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        let Some(&(best_id, best_score, best_entry)) = ranked.first() else {
            return Err(QueryError::NoMatch {
                query: query.to_string(),
                best_score: 0.0,
            });
        };

        if best_score < self.fuzzy_threshold {
            debug!(best_score, "Best fuzzy candidate below threshold");
            return Err(QueryError::NoMatch {
                query: query.to_string(),
                best_score,
            });
        }

        // Near-ties above threshold are reported, not arbitrarily resolved
        let near_ties: Vec<(MovieId, f64)> = ranked
            .iter()
            .take_while(|(_, score, _)| best_score - score <= self.ambiguity_margin)
            .filter(|(_, score, _)| *score >= self.fuzzy_threshold)
            .map(|(id, score, _)| (*id, *score))
            .collect();
        if near_ties.len() > 1 {
            return Err(QueryError::Ambiguous {
                query: query.to_string(),
                candidates: near_ties,
            });
        }

        debug!(best_score, movie_id = best_id, "Fuzzy match accepted");
        Ok(ResolvedQuery {
            movie_id: best_id,
            matched_title: best_entry.normalized.clone(),
            query_language,
            match_score: best_score,
        })
    }
}

/// Normalize casing and whitespace for title comparison.
fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
