//! Core domain types for the enriched movie dataset.
//!
//! This module defines the record types the rest of the system is built on:
//! enriched movie metadata, raw rating entries, and the language tag used to
//! select tokenization strategies downstream.

use crate::error::{DataLoadError, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with movie IDs

/// Unique identifier for a user in the ratings dataset
pub type UserId = u32;

/// Unique identifier for a movie (stable across refreshes of the catalog)
pub type MovieId = u32;

// =============================================================================
// Language
// =============================================================================

/// Canonical language of a movie record or a free-text query.
///
/// Parsed once from the record's language tag; queries fall back to script
/// inspection via [`Language::detect`]. The variant decides which tokenizer
/// strategy handles the record's text attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Chinese,
    Japanese,
    Korean,
    /// A recognized tag outside the four families above. Tokenized with the
    /// word-boundary strategy.
    Other,
}

impl Language {
    /// Parse a language tag like `en`, `en-US`, `zh-CN`, `ja`, `ko`.
    ///
    /// Returns `None` for an empty or unrecognizable tag so callers can
    /// reject the record instead of guessing.
    pub fn from_tag(tag: &str) -> Option<Language> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "" => None,
            "en" => Some(Language::English),
            "zh" | "cn" => Some(Language::Chinese),
            "ja" | "jp" => Some(Language::Japanese),
            "ko" | "kr" => Some(Language::Korean),
            p if p.chars().all(|c| c.is_ascii_alphabetic()) && p.len() <= 3 => {
                Some(Language::Other)
            }
            _ => None,
        }
    }

    /// Detect the language of raw text by script inspection.
    ///
    /// Kana and hangul are checked before Han so that Japanese text (which
    /// mixes kanji with kana) is not mistaken for Chinese.
    pub fn detect(text: &str) -> Language {
        let mut saw_han = false;
        for c in text.chars() {
            match c {
                '\u{3040}'..='\u{30FF}' => return Language::Japanese,
                '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}' => return Language::Korean,
                '\u{4E00}'..='\u{9FFF}' => saw_han = true,
                _ => {}
            }
        }
        if saw_han {
            Language::Chinese
        } else {
            Language::English
        }
    }

    /// Whether this language separates words with explicit boundaries.
    pub fn uses_word_boundaries(&self) -> bool {
        !matches!(self, Language::Chinese | Language::Japanese)
    }
}

// =============================================================================
// Movie
// =============================================================================

/// An enriched movie record as supplied by the metadata-enrichment
/// collaborator.
///
/// Immutable once constructed; the catalog is rebuilt wholesale when source
/// data refreshes. The six text attribute groups (genres, keywords, overview,
/// director, actors, production companies) may be individually empty and
/// degrade gracefully during feature building, but a record with *all* of
/// them empty is rejected by [`Movie::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Titles in other languages registered for this movie, used by query
    /// resolution (e.g. "阿凡达" alongside "Avatar").
    #[serde(default)]
    pub alternate_titles: Vec<String>,
    /// Canonical language tag (`en`, `zh-CN`, ...). Must parse via
    /// [`Language::from_tag`].
    pub language: String,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub director: String,
    /// Lead actors in billing order.
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub production_companies: Vec<String>,
    #[serde(default)]
    pub popularity: f32,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u32,
    /// Sentiment-adjusted rating from the external sentiment collaborator,
    /// averaged from per-review category scores on a 0-4 scale.
    #[serde(default)]
    pub sentiment_rating: Option<f32>,
}

impl Movie {
    /// Parsed form of the record's language tag.
    pub fn language_tag(&self) -> Option<Language> {
        Language::from_tag(&self.language)
    }

    /// True when every text attribute group on this record is empty.
    pub fn has_no_attributes(&self) -> bool {
        self.genres.is_empty()
            && self.keywords.is_empty()
            && self.overview.trim().is_empty()
            && self.director.trim().is_empty()
            && self.actors.is_empty()
            && self.production_companies.is_empty()
    }

    /// Reject malformed records at the boundary instead of letting bad data
    /// flow into numeric computations.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(DataLoadError::InvalidValue {
                field: "title".to_string(),
                value: self.title.clone(),
            });
        }
        if self.language_tag().is_none() {
            return Err(DataLoadError::InvalidValue {
                field: "language".to_string(),
                value: self.language.clone(),
            });
        }
        if self.has_no_attributes() {
            return Err(DataLoadError::ValidationError(format!(
                "movie {} has no usable attribute groups",
                self.id
            )));
        }
        if let Some(s) = self.sentiment_rating {
            if !(0.0..=4.0).contains(&s) {
                return Err(DataLoadError::InvalidValue {
                    field: "sentiment_rating".to_string(),
                    value: s.to_string(),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Rating Entry
// =============================================================================

/// A single rating from a user for a movie.
///
/// Append-only source record; never mutated after parsing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RatingEntry {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value from 1.0 to 5.0
    pub rating: f32,
    /// Unix timestamp when the rating was made
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_movie() -> Movie {
        Movie {
            id: 1,
            title: "Avatar".to_string(),
            alternate_titles: vec!["阿凡达".to_string()],
            language: "en-US".to_string(),
            year: Some(2009),
            genres: vec!["Science Fiction".to_string()],
            keywords: vec![],
            overview: String::new(),
            director: String::new(),
            actors: vec![],
            production_companies: vec![],
            popularity: 150.4,
            vote_average: 7.5,
            vote_count: 27000,
            sentiment_rating: Some(3.2),
        }
    }

    #[test]
    fn test_language_from_tag() {
        assert_eq!(Language::from_tag("en"), Some(Language::English));
        assert_eq!(Language::from_tag("en-US"), Some(Language::English));
        assert_eq!(Language::from_tag("zh-CN"), Some(Language::Chinese));
        assert_eq!(Language::from_tag("ja"), Some(Language::Japanese));
        assert_eq!(Language::from_tag("fr"), Some(Language::Other));
        assert_eq!(Language::from_tag(""), None);
        assert_eq!(Language::from_tag("???"), None);
    }

    #[test]
    fn test_language_detection_by_script() {
        assert_eq!(Language::detect("Avatar"), Language::English);
        assert_eq!(Language::detect("阿凡达"), Language::Chinese);
        assert_eq!(Language::detect("千と千尋の神隠し"), Language::Japanese);
        assert_eq!(Language::detect("기생충"), Language::Korean);
    }

    #[test]
    fn test_validate_accepts_well_formed_record() {
        assert!(minimal_movie().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_language() {
        let mut movie = minimal_movie();
        movie.language = String::new();
        assert!(movie.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_attribute_groups() {
        let mut movie = minimal_movie();
        movie.genres.clear();
        movie.sentiment_rating = None;
        assert!(movie.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_sentiment() {
        let mut movie = minimal_movie();
        movie.sentiment_rating = Some(4.5);
        assert!(movie.validate().is_err());
    }
}
