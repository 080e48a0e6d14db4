//! Language-aware tokenization strategies.
//!
//! The feature builder picks a strategy once per movie from its language
//! tag instead of re-detecting per call:
//! - [`WordBoundaryTokenizer`] for space-delimited languages
//! - [`CjkBigramTokenizer`] for languages without explicit word boundaries
//!
//! Both strategies handle mixed text: latin runs are kept as lowercase
//! words either way. The difference is what happens to a CJK run — the
//! word-boundary strategy keeps it as one opaque term, while the bigram
//! strategy segments it into overlapping character pairs so partial
//! overlaps still score.

use data_loader::Language;

/// Stopwords removed from every tokenized attribute group. English function
/// words plus the high-frequency Chinese particles that would otherwise
/// dominate term frequencies in mixed corpora.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "的", "了", "和", "是", "就",
    "都", "而", "及", "与", "着", "把", "让", "向", "在", "由", "这", "那", "到", "去", "又",
];

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'   // hiragana + katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{AC00}'..='\u{D7AF}' // hangul syllables
    )
}

/// How a scanner emits a buffered CJK run.
#[derive(Clone, Copy)]
enum CjkRunMode {
    /// Keep the run as a single opaque term.
    Whole,
    /// Segment the run into overlapping character bigrams.
    Bigram,
}

fn push_token(token: String, tokens: &mut Vec<String>) {
    if !token.is_empty() && !is_stopword(&token) {
        tokens.push(token);
    }
}

fn flush_cjk(run: &mut Vec<char>, mode: CjkRunMode, tokens: &mut Vec<String>) {
    match (run.len(), mode) {
        (0, _) => return,
        (1, _) | (_, CjkRunMode::Whole) => {
            push_token(run.iter().collect(), tokens);
        }
        (_, CjkRunMode::Bigram) => {
            for pair in run.windows(2) {
                push_token(pair.iter().collect(), tokens);
            }
        }
    }
    run.clear();
}

/// Shared traversal: latin/numeric runs become lowercase words, CJK runs
/// are emitted according to `mode`.
fn scan(text: &str, mode: CjkRunMode) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut cjk_run: Vec<char> = Vec::new();

    for c in text.chars() {
        if is_cjk(c) {
            push_token(std::mem::take(&mut word), &mut tokens);
            cjk_run.push(c);
        } else if c.is_alphanumeric() {
            flush_cjk(&mut cjk_run, mode, &mut tokens);
            word.extend(c.to_lowercase());
        } else {
            push_token(std::mem::take(&mut word), &mut tokens);
            flush_cjk(&mut cjk_run, mode, &mut tokens);
        }
    }
    push_token(word, &mut tokens);
    flush_cjk(&mut cjk_run, mode, &mut tokens);
    tokens
}

/// A tokenization strategy over one attribute group's text.
pub trait Tokenize: Send + Sync {
    /// Strategy name for logging/debugging
    fn name(&self) -> &'static str;

    /// Split text into lowercase, stopword-filtered terms.
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Word-boundary segmentation for space-delimited languages.
pub struct WordBoundaryTokenizer;

impl Tokenize for WordBoundaryTokenizer {
    fn name(&self) -> &'static str {
        "word-boundary"
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        scan(text, CjkRunMode::Whole)
    }
}

/// Bigram segmentation for languages without explicit word boundaries.
///
/// Bigrams are the lexicon-free stand-in for dictionary segmentation and
/// behave equivalently under TF-IDF cosine similarity.
pub struct CjkBigramTokenizer;

impl Tokenize for CjkBigramTokenizer {
    fn name(&self) -> &'static str {
        "cjk-bigram"
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        scan(text, CjkRunMode::Bigram)
    }
}

/// Select the tokenizer strategy for a language, chosen once per record.
pub fn for_language(language: Language) -> &'static dyn Tokenize {
    static WORD: WordBoundaryTokenizer = WordBoundaryTokenizer;
    static CJK: CjkBigramTokenizer = CjkBigramTokenizer;
    if language.uses_word_boundaries() {
        &WORD
    } else {
        &CJK
    }
}
