//! Feature building: TF-IDF vectorization of text attribute groups and
//! min-max scaling of numeric attributes.
//!
//! ## Algorithm
//! 1. For each accepted movie, pick a tokenizer from its language tag and
//!    tokenize the six text attribute groups
//! 2. Fit one TF-IDF model per attribute group over the whole corpus
//! 3. Transform each movie's tokens into L2-normalized sparse vectors
//!    (so cosine similarity downstream is a plain sparse dot product)
//! 4. Min-max scale the numeric attributes with bounds fixed at build time
//!
//! Movies that fail integrity checks are recorded and excluded; one bad
//! record never aborts the build here. The caller applies its ceiling.

use crate::error::{Result, SimilarityError};
use crate::tokenize;
use data_loader::{Movie, MovieId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Tolerance for weight-sum validation.
const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

// =============================================================================
// Attribute groups and weights
// =============================================================================

/// The six text attribute groups every movie record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeGroup {
    Genres,
    Keywords,
    Overview,
    Director,
    Actors,
    Production,
}

impl AttributeGroup {
    pub const ALL: [AttributeGroup; 6] = [
        AttributeGroup::Genres,
        AttributeGroup::Keywords,
        AttributeGroup::Overview,
        AttributeGroup::Director,
        AttributeGroup::Actors,
        AttributeGroup::Production,
    ];

    pub(crate) fn index(&self) -> usize {
        match self {
            AttributeGroup::Genres => 0,
            AttributeGroup::Keywords => 1,
            AttributeGroup::Overview => 2,
            AttributeGroup::Director => 3,
            AttributeGroup::Actors => 4,
            AttributeGroup::Production => 5,
        }
    }

    /// The raw text for this group on a record.
    fn text_of(&self, movie: &Movie) -> String {
        match self {
            AttributeGroup::Genres => movie.genres.join(" "),
            AttributeGroup::Keywords => movie.keywords.join(" "),
            AttributeGroup::Overview => movie.overview.clone(),
            AttributeGroup::Director => movie.director.clone(),
            AttributeGroup::Actors => movie.actors.join(" "),
            AttributeGroup::Production => movie.production_companies.join(" "),
        }
    }
}

/// The numeric attributes folded into the reserved numeric weight block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericAttribute {
    VoteAverage,
    Popularity,
    VoteCount,
    Sentiment,
}

impl NumericAttribute {
    pub const ALL: [NumericAttribute; 4] = [
        NumericAttribute::VoteAverage,
        NumericAttribute::Popularity,
        NumericAttribute::VoteCount,
        NumericAttribute::Sentiment,
    ];

    pub(crate) fn index(&self) -> usize {
        match self {
            NumericAttribute::VoteAverage => 0,
            NumericAttribute::Popularity => 1,
            NumericAttribute::VoteCount => 2,
            NumericAttribute::Sentiment => 3,
        }
    }

    /// Share of the numeric weight block assigned to this attribute.
    /// Shares sum to 1.0.
    pub(crate) fn share(&self) -> f32 {
        match self {
            NumericAttribute::VoteAverage => 0.40,
            NumericAttribute::Popularity => 0.30,
            NumericAttribute::VoteCount => 0.20,
            NumericAttribute::Sentiment => 0.10,
        }
    }

    fn value_of(&self, movie: &Movie) -> Option<f32> {
        match self {
            NumericAttribute::VoteAverage => Some(movie.vote_average),
            NumericAttribute::Popularity => Some(movie.popularity),
            NumericAttribute::VoteCount => Some(movie.vote_count as f32),
            NumericAttribute::Sentiment => movie.sentiment_rating,
        }
    }
}

/// Per-attribute-group similarity weights. Must be non-negative and sum to
/// 1.0 together with the reserved numeric block.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupWeights {
    pub genres: f32,
    pub keywords: f32,
    pub overview: f32,
    pub director: f32,
    pub actors: f32,
    pub production: f32,
    /// Weight reserved for the numeric attributes (popularity, vote
    /// average/count, sentiment), subdivided by [`NumericAttribute::share`].
    pub numeric: f32,
}

impl Default for GroupWeights {
    fn default() -> Self {
        Self {
            genres: 0.20,
            keywords: 0.15,
            overview: 0.15,
            director: 0.10,
            actors: 0.10,
            production: 0.10,
            numeric: 0.10,
        }
    }
}

impl GroupWeights {
    pub fn for_group(&self, group: AttributeGroup) -> f32 {
        match group {
            AttributeGroup::Genres => self.genres,
            AttributeGroup::Keywords => self.keywords,
            AttributeGroup::Overview => self.overview,
            AttributeGroup::Director => self.director,
            AttributeGroup::Actors => self.actors,
            AttributeGroup::Production => self.production,
        }
    }

    fn sum(&self) -> f32 {
        self.genres
            + self.keywords
            + self.overview
            + self.director
            + self.actors
            + self.production
            + self.numeric
    }

    /// Validate at build time; violating configurations never reach the
    /// similarity engines.
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.genres,
            self.keywords,
            self.overview,
            self.director,
            self.actors,
            self.production,
            self.numeric,
        ];
        let sum = self.sum();
        if values.iter().any(|w| *w < 0.0) || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(SimilarityError::InvalidWeights { sum });
        }
        Ok(())
    }
}

// =============================================================================
// Sparse vectors and TF-IDF
// =============================================================================

/// A sparse term-weight vector, sorted by term id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparseVector {
    terms: Vec<(u32, f32)>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Dot product via two-pointer merge over the sorted term lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.terms.len() && j < other.terms.len() {
            match self.terms[i].0.cmp(&other.terms[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.terms[i].1 * other.terms[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    fn l2_normalize(&mut self) {
        let norm: f32 = self.terms.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut self.terms {
                *w /= norm;
            }
        }
    }
}

/// TF-IDF model for one attribute group, fit over the accepted corpus.
///
/// Uses smoothed idf `ln((1 + n) / (1 + df)) + 1` and L2-normalizes the
/// output vectors, so per-group cosine similarity reduces to `dot`.
#[derive(Debug, Default)]
pub struct TfidfModel {
    vocab: HashMap<String, u32>,
    idf: Vec<f32>,
}

impl TfidfModel {
    pub fn fit(documents: &[Vec<String>]) -> Self {
        let mut vocab: HashMap<String, u32> = HashMap::new();
        let mut document_frequency: Vec<u32> = Vec::new();

        for doc in documents {
            let mut seen: Vec<u32> = doc
                .iter()
                .map(|term| {
                    let next_id = vocab.len() as u32;
                    let id = *vocab.entry(term.clone()).or_insert(next_id);
                    if id as usize >= document_frequency.len() {
                        document_frequency.push(0);
                    }
                    id
                })
                .collect();
            seen.sort_unstable();
            seen.dedup();
            for id in seen {
                document_frequency[id as usize] += 1;
            }
        }

        let n = documents.len() as f32;
        let idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        Self { vocab, idf }
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Transform a token list into an L2-normalized sparse vector.
    /// Out-of-vocabulary terms are ignored.
    pub fn transform(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<u32, f32> = HashMap::new();
        for token in tokens {
            if let Some(&id) = self.vocab.get(token) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let mut terms: Vec<(u32, f32)> = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id as usize]))
            .collect();
        terms.sort_unstable_by_key(|(id, _)| *id);

        let mut vector = SparseVector { terms };
        vector.l2_normalize();
        vector
    }
}

// =============================================================================
// Numeric scaling
// =============================================================================

/// Min-max bounds for one numeric attribute, fixed at build time and
/// reused unchanged for every subsequent query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NumericBounds {
    pub min: f32,
    pub max: f32,
}

impl NumericBounds {
    fn from_values(values: &[f32]) -> Self {
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if min.is_finite() && max.is_finite() {
            Self { min, max }
        } else {
            Self { min: 0.0, max: 0.0 }
        }
    }

    /// Rescale into [0, 1], clamping values outside the observed range.
    pub fn scale(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

// =============================================================================
// Feature vectors and the store
// =============================================================================

/// The vectorized form of one movie: a sparse TF-IDF vector per text
/// attribute group and the scaled numeric attributes. Owned by exactly one
/// movie in the [`FeatureStore`].
#[derive(Debug, Clone)]
pub struct FeatureVector {
    pub movie_id: MovieId,
    groups: [SparseVector; 6],
    numeric: [f32; 4],
}

impl FeatureVector {
    pub fn group(&self, group: AttributeGroup) -> &SparseVector {
        &self.groups[group.index()]
    }

    pub fn numeric(&self, attribute: NumericAttribute) -> f32 {
        self.numeric[attribute.index()]
    }
}

/// Immutable set of feature vectors published by one build, plus the
/// weights and scaling bounds that produced it.
#[derive(Debug)]
pub struct FeatureStore {
    vectors: HashMap<MovieId, FeatureVector>,
    weights: GroupWeights,
    bounds: [NumericBounds; 4],
}

impl FeatureStore {
    pub fn get(&self, id: MovieId) -> Option<&FeatureVector> {
        self.vectors.get(&id)
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.vectors.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn weights(&self) -> &GroupWeights {
        &self.weights
    }

    pub fn bounds(&self, attribute: NumericAttribute) -> NumericBounds {
        self.bounds[attribute.index()]
    }

    pub fn vectors(&self) -> impl Iterator<Item = &FeatureVector> {
        self.vectors.values()
    }

    /// Movie ids in ascending order, for deterministic iteration.
    pub fn movie_ids(&self) -> Vec<MovieId> {
        let mut ids: Vec<MovieId> = self.vectors.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Outcome of a feature build: the published store and the per-movie
/// rejection record.
#[derive(Debug)]
pub struct FeatureBuild {
    pub store: FeatureStore,
    pub rejected: Vec<(MovieId, SimilarityError)>,
}

// =============================================================================
// Feature builder
// =============================================================================

/// Builds the [`FeatureStore`] from enriched movie records.
pub struct FeatureBuilder {
    weights: GroupWeights,
}

impl FeatureBuilder {
    /// Create a builder with validated weights. A configuration that does
    /// not sum to 1.0 fails here, before any data is touched.
    pub fn new(weights: GroupWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    /// Vectorize the corpus.
    ///
    /// # Returns
    /// The feature store over all accepted movies plus the list of movies
    /// rejected by integrity checks (missing language tag, no usable
    /// attribute groups).
    #[instrument(skip_all, fields(movies = movies.len()))]
    pub fn build(&self, movies: &[Movie]) -> FeatureBuild {
        // Tokenize every record in parallel, splitting accepted from
        // rejected. Tokenizer choice is per-record, from the language tag.
        let tokenized: Vec<std::result::Result<TokenizedMovie, (MovieId, SimilarityError)>> =
            movies.par_iter().map(tokenize_movie).collect();

        let mut accepted: Vec<TokenizedMovie> = Vec::new();
        let mut rejected: Vec<(MovieId, SimilarityError)> = Vec::new();
        for item in tokenized {
            match item {
                Ok(movie) => accepted.push(movie),
                Err(pair) => rejected.push(pair),
            }
        }
        // Deterministic output regardless of parallel scheduling
        accepted.sort_by_key(|t| t.movie_id);
        rejected.sort_by_key(|(id, _)| *id);

        if !rejected.is_empty() {
            info!("Rejected {} movie records during feature build", rejected.len());
        }

        // One TF-IDF model per attribute group, fit over accepted records only
        let models: Vec<TfidfModel> = AttributeGroup::ALL
            .par_iter()
            .map(|group| {
                let docs: Vec<Vec<String>> = accepted
                    .iter()
                    .map(|t| t.groups[group.index()].clone())
                    .collect();
                TfidfModel::fit(&docs)
            })
            .collect();
        for (group, model) in AttributeGroup::ALL.iter().zip(&models) {
            debug!(?group, vocab = model.vocab_size(), "Fitted TF-IDF model");
        }

        // Numeric bounds fixed from the accepted corpus; missing sentiment
        // filled with the corpus mean before scaling
        let bounds = self.numeric_bounds(&accepted);
        let sentiment_mean = mean(
            accepted
                .iter()
                .filter_map(|t| t.numeric[NumericAttribute::Sentiment.index()]),
        );

        let vectors: HashMap<MovieId, FeatureVector> = accepted
            .par_iter()
            .map(|t| {
                let mut groups: [SparseVector; 6] = Default::default();
                for group in AttributeGroup::ALL {
                    groups[group.index()] =
                        models[group.index()].transform(&t.groups[group.index()]);
                }
                let mut numeric = [0.0f32; 4];
                for attribute in NumericAttribute::ALL {
                    let raw = t.numeric[attribute.index()].unwrap_or(sentiment_mean);
                    numeric[attribute.index()] = bounds[attribute.index()].scale(raw);
                }
                (
                    t.movie_id,
                    FeatureVector {
                        movie_id: t.movie_id,
                        groups,
                        numeric,
                    },
                )
            })
            .collect();

        info!("Built feature vectors for {} movies", vectors.len());
        FeatureBuild {
            store: FeatureStore {
                vectors,
                weights: self.weights,
                bounds,
            },
            rejected,
        }
    }

    fn numeric_bounds(&self, accepted: &[TokenizedMovie]) -> [NumericBounds; 4] {
        let mut bounds = [NumericBounds { min: 0.0, max: 0.0 }; 4];
        for attribute in NumericAttribute::ALL {
            let values: Vec<f32> = accepted
                .iter()
                .filter_map(|t| t.numeric[attribute.index()])
                .collect();
            bounds[attribute.index()] = NumericBounds::from_values(&values);
        }
        bounds
    }
}

/// One movie after tokenization, before vectorization.
struct TokenizedMovie {
    movie_id: MovieId,
    groups: [Vec<String>; 6],
    numeric: [Option<f32>; 4],
}

fn tokenize_movie(
    movie: &Movie,
) -> std::result::Result<TokenizedMovie, (MovieId, SimilarityError)> {
    let language = movie.language_tag().ok_or_else(|| {
        (
            movie.id,
            SimilarityError::DataIntegrity {
                id: movie.id,
                reason: format!("unparseable language tag {:?}", movie.language),
            },
        )
    })?;
    if movie.has_no_attributes() {
        return Err((
            movie.id,
            SimilarityError::DataIntegrity {
                id: movie.id,
                reason: "all attribute groups are empty".to_string(),
            },
        ));
    }

    let tokenizer = tokenize::for_language(language);
    let mut groups: [Vec<String>; 6] = Default::default();
    for group in AttributeGroup::ALL {
        groups[group.index()] = tokenizer.tokenize(&group.text_of(movie));
    }

    let mut numeric = [None; 4];
    for attribute in NumericAttribute::ALL {
        numeric[attribute.index()] = attribute.value_of(movie);
    }

    Ok(TokenizedMovie {
        movie_id: movie.id,
        groups,
        numeric,
    })
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0f32, 0u32), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}
