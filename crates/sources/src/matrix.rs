//! Sparse user-movie interaction matrix.
//!
//! ## Algorithm
//! 1. Count ratings per movie and drop movies below the minimum-ratings
//!    threshold (a quality gate, not an error)
//! 2. Assign column order by movie id ascending and user rows by user id
//!    ascending, so identical input always produces an identical matrix
//! 3. Store each column as a sorted `(user_row, rating)` list with a
//!    precomputed L2 norm for cosine computations
//!
//! Absence of a cell means "no interaction", never a zero rating. For
//! duplicate (user, movie) pairs the entry with the latest timestamp wins.

use data_loader::{MovieId, RatingEntry, UserId};
use std::collections::HashMap;
use tracing::{info, instrument};

/// One movie column: the users who rated it and their ratings.
#[derive(Debug, Clone)]
pub struct MovieColumn {
    pub movie_id: MovieId,
    /// `(user_row, rating)` pairs sorted by user row.
    entries: Vec<(u32, f32)>,
    norm: f32,
}

impl MovieColumn {
    pub fn rating_count(&self) -> usize {
        self.entries.len()
    }

    /// Cosine similarity with another column via two-pointer sparse dot.
    /// Returns 0 when the columns share no raters.
    pub fn cosine(&self, other: &MovieColumn) -> f32 {
        if self.norm == 0.0 || other.norm == 0.0 {
            return 0.0;
        }
        let (mut i, mut j) = (0, 0);
        let mut dot = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            match self.entries[i].0.cmp(&other.entries[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dot += self.entries[i].1 * other.entries[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        dot / (self.norm * other.norm)
    }

    /// True when the two columns have at least one rater in common.
    pub fn overlaps(&self, other: &MovieColumn) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.entries.len() && j < other.entries.len() {
            match self.entries[i].0.cmp(&other.entries[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => return true,
            }
        }
        false
    }
}

/// The published sparse interaction matrix: one column per movie that
/// cleared the minimum-ratings gate. Read-only after build.
#[derive(Debug, Default)]
pub struct InteractionMatrix {
    columns: Vec<MovieColumn>,
    column_index: HashMap<MovieId, usize>,
    user_count: usize,
}

impl InteractionMatrix {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn user_count(&self) -> usize {
        self.user_count
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.column_index.contains_key(&movie_id)
    }

    pub fn column(&self, movie_id: MovieId) -> Option<&MovieColumn> {
        self.column_index.get(&movie_id).map(|&i| &self.columns[i])
    }

    /// Columns in movie-id order.
    pub fn columns(&self) -> &[MovieColumn] {
        &self.columns
    }
}

/// Builds the [`InteractionMatrix`] from raw rating entries.
pub struct InteractionMatrixBuilder {
    min_ratings: u32,
}

impl InteractionMatrixBuilder {
    /// # Arguments
    /// * `min_ratings` - movies with fewer ratings are dropped before
    ///   assembly; too few signals make neighbor estimates unreliable
    pub fn new(min_ratings: u32) -> Self {
        Self { min_ratings }
    }

    /// Assemble the matrix. Deterministic for identical input and
    /// threshold. An empty input yields a zero-column matrix.
    #[instrument(skip(self, ratings), fields(ratings = ratings.len(), min_ratings = self.min_ratings))]
    pub fn build(&self, ratings: &[RatingEntry]) -> InteractionMatrix {
        // Deduplicate (user, movie) pairs, latest timestamp wins
        let mut cells: HashMap<(UserId, MovieId), RatingEntry> = HashMap::new();
        for entry in ratings {
            cells
                .entry((entry.user_id, entry.movie_id))
                .and_modify(|kept| {
                    if entry.timestamp > kept.timestamp {
                        *kept = *entry;
                    }
                })
                .or_insert(*entry);
        }

        // Quality gate: count per movie, keep those at or above threshold
        let mut counts: HashMap<MovieId, u32> = HashMap::new();
        for (_, movie_id) in cells.keys() {
            *counts.entry(*movie_id).or_insert(0) += 1;
        }
        let mut kept_movies: Vec<MovieId> = counts
            .iter()
            .filter(|(_, &count)| count >= self.min_ratings)
            .map(|(&id, _)| id)
            .collect();
        kept_movies.sort_unstable();

        // Stable user-row assignment over users appearing in kept cells
        let mut user_ids: Vec<UserId> = cells
            .keys()
            .filter(|(_, movie_id)| counts[movie_id] >= self.min_ratings)
            .map(|(user_id, _)| *user_id)
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let user_rows: HashMap<UserId, u32> = user_ids
            .iter()
            .enumerate()
            .map(|(row, &id)| (id, row as u32))
            .collect();

        // Assemble sorted columns with precomputed norms
        let mut per_movie: HashMap<MovieId, Vec<(u32, f32)>> = HashMap::new();
        for ((user_id, movie_id), entry) in &cells {
            if counts[movie_id] >= self.min_ratings {
                per_movie
                    .entry(*movie_id)
                    .or_default()
                    .push((user_rows[user_id], entry.rating));
            }
        }

        let columns: Vec<MovieColumn> = kept_movies
            .iter()
            .map(|&movie_id| {
                let mut entries = per_movie.remove(&movie_id).unwrap_or_default();
                entries.sort_unstable_by_key(|(row, _)| *row);
                let norm = entries.iter().map(|(_, r)| r * r).sum::<f32>().sqrt();
                MovieColumn {
                    movie_id,
                    entries,
                    norm,
                }
            })
            .collect();

        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.movie_id, i))
            .collect();

        info!(
            "Built interaction matrix: {} columns x {} users ({} movies dropped by threshold)",
            columns.len(),
            user_ids.len(),
            counts.len() - columns.len()
        );

        InteractionMatrix {
            columns,
            column_index,
            user_count: user_ids.len(),
        }
    }
}
