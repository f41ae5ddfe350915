//! Factor implementations and the name registry.
//!
//! A factor annotates tokenized text with one label per token: casing shape,
//! mask-placeholder detection, numeric detection, or (for the segmentation
//! factor) one positional tag per subword unit. Factors are stateless pure
//! functions behind the [`Factor`] trait; the [`FactorRegistry`] maps the
//! names accepted on the command line to constructors, so new factors
//! register without touching any dispatcher.
//!
//! In training mode a factor reads a whole tokenized line; in inference mode
//! it picks the raw-text field it needs out of the JSON record
//! ([`Factor::json_field`]) and computes over that.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;
use thiserror::Error;

use super::broadcast::AlignmentMismatch;
use super::record::{Record, RecordError};
use super::segmentation::tag_segment;

/// Mask placeholders look like `__NAME__` or `__NAME_7__`, anchored at the
/// token start.
static MASK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^__[A-Za-z0-9]+(_[0-9]+)?__").expect("mask pattern is valid"));

/// Signed decimal with optional fraction and exponent, anchored at the token
/// start.
static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?").expect("number pattern is valid")
});

/// Errors from factor configuration and line processing.
#[derive(Debug, Error)]
pub enum FactorError {
    #[error("no such factor \"{0}\"")]
    UnknownFactor(String),
    #[error("text mode computes a single factor, but {0} were requested")]
    SingleFactorRequired(usize),
    #[error("factor \"{factor}\": {source}")]
    Misaligned {
        factor: String,
        source: AlignmentMismatch,
    },
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        source: Box<FactorError>,
    },
}

impl FactorError {
    /// Decorate this error with the 1-based number of the input line that
    /// produced it.
    pub fn at_line(self, line: usize) -> Self {
        FactorError::AtLine {
            line,
            source: Box::new(self),
        }
    }
}

/// How the pipeline treats a factor's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorRole {
    /// One label per original token; broadcast across subword units when a
    /// segmentation factor is co-requested.
    Token,
    /// One tag per subword unit; defines the grouping other factors are
    /// broadcast over. Not itself broadcastable.
    Segmentation,
}

/// A per-token (or per-unit) annotation over tokenized text.
pub trait Factor: std::fmt::Debug + Send + Sync {
    /// The record field this factor reads in inference mode.
    fn json_field(&self) -> &'static str;

    /// Role marker; the pipeline keys broadcasting off this, not off the
    /// factor's registered name.
    fn role(&self) -> FactorRole {
        FactorRole::Token
    }

    /// One label per whitespace token of `segment`. The segmentation factor
    /// is the exception: its labels align with the subword units of the
    /// segmented line it is given.
    fn compute(&self, segment: &str) -> Vec<String>;

    /// Inference entry point: extract this factor's field from the record
    /// and compute over it. The record also carries `factor_names`, so an
    /// implementation may be field-name-aware.
    fn compute_record(&self, record: &Record) -> Result<Vec<String>, RecordError> {
        Ok(self.compute(record.text_field(self.json_field())?))
    }
}

/// Casing shape of each token: `UPPER`, `Title`, `lower`, or `-`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseFactor;

impl CaseFactor {
    fn label(token: &str) -> &'static str {
        if is_uppercase(token) {
            "UPPER"
        } else if is_titlecase(token) {
            "Title"
        } else if is_lowercase(token) {
            "lower"
        } else {
            "-"
        }
    }
}

impl Factor for CaseFactor {
    fn json_field(&self) -> &'static str {
        "tok_text"
    }

    fn compute(&self, segment: &str) -> Vec<String> {
        segment
            .split_whitespace()
            .map(|token| Self::label(token).to_string())
            .collect()
    }
}

/// At least one cased character, and no lowercase ones.
fn is_uppercase(token: &str) -> bool {
    let mut cased = false;
    for c in token.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// At least one cased character, and no uppercase ones.
fn is_lowercase(token: &str) -> bool {
    let mut cased = false;
    for c in token.chars() {
        if c.is_uppercase() {
            return false;
        }
        if c.is_lowercase() {
            cased = true;
        }
    }
    cased
}

/// Titlecase shape: uppercase only after uncased characters, lowercase only
/// after cased ones, at least one cased character overall.
fn is_titlecase(token: &str) -> bool {
    let mut cased = false;
    let mut prev_cased = false;
    for c in token.chars() {
        if c.is_uppercase() {
            if prev_cased {
                return false;
            }
            prev_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !prev_cased {
                return false;
            }
            prev_cased = true;
            cased = true;
        } else {
            prev_cased = false;
        }
    }
    cased
}

/// Whether each token is a mask placeholder: `Y` or `n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskFactor;

impl Factor for MaskFactor {
    fn json_field(&self) -> &'static str {
        "text"
    }

    fn compute(&self, segment: &str) -> Vec<String> {
        segment
            .split_whitespace()
            .map(|token| {
                if MASK_PATTERN.is_match(token) {
                    "Y".to_string()
                } else {
                    "n".to_string()
                }
            })
            .collect()
    }
}

/// Whether each token starts with a decimal number: `1` or `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberFactor;

impl Factor for NumberFactor {
    fn json_field(&self) -> &'static str {
        "tok_text"
    }

    fn compute(&self, segment: &str) -> Vec<String> {
        segment
            .split_whitespace()
            .map(|token| {
                if NUMBER_PATTERN.is_match(token) {
                    "1".to_string()
                } else {
                    "0".to_string()
                }
            })
            .collect()
    }
}

/// Positional tag of each subword unit (`O`/`B`/`I`/`E`); the segmentation
/// factor. Computing it requires already-segmented input: the tag stream is
/// derived from the continuation markers, BPE or SentencePiece.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubwordFactor;

impl Factor for SubwordFactor {
    fn json_field(&self) -> &'static str {
        "subword_text"
    }

    fn role(&self) -> FactorRole {
        FactorRole::Segmentation
    }

    fn compute(&self, segment: &str) -> Vec<String> {
        tag_segment(segment)
            .iter()
            .map(|tag| tag.as_str().to_string())
            .collect()
    }
}

/// Constructor for a registered factor.
pub type FactorConstructor = fn() -> Box<dyn Factor>;

/// Name → constructor registry for factor dispatch.
///
/// `with_builtins` registers `case`, `subword`, `mask` and `number`; callers
/// may [`register`](Self::register) further variants under new names.
pub struct FactorRegistry {
    constructors: FxHashMap<&'static str, FactorConstructor>,
}

impl FactorRegistry {
    /// A registry with no factors registered.
    pub fn empty() -> Self {
        Self {
            constructors: FxHashMap::default(),
        }
    }

    /// A registry holding the four built-in factors.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("case", || Box::new(CaseFactor));
        registry.register("subword", || Box::new(SubwordFactor));
        registry.register("mask", || Box::new(MaskFactor));
        registry.register("number", || Box::new(NumberFactor));
        registry
    }

    /// Register a factor under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &'static str, constructor: FactorConstructor) {
        self.constructors.insert(name, constructor);
    }

    /// Construct the factor registered under `name`.
    pub fn build(&self, name: &str) -> Result<Box<dyn Factor>, FactorError> {
        self.constructors
            .get(name)
            .map(|constructor| constructor())
            .ok_or_else(|| FactorError::UnknownFactor(name.to_string()))
    }

    /// Registered names, sorted for stable help and error output.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.constructors.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for FactorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compute(factor: &dyn Factor, segment: &str) -> Vec<String> {
        factor.compute(segment)
    }

    #[test]
    fn test_case_labels() {
        let labels = compute(&CaseFactor, "NATO Berlin is nice , 7 iPhone");
        assert_eq!(labels, vec!["UPPER", "Title", "lower", "lower", "-", "-", "-"]);
    }

    #[test]
    fn test_case_single_letter_is_upper() {
        // "A" is both all-caps and titlecased; all-caps wins by precedence.
        assert_eq!(compute(&CaseFactor, "A"), vec!["UPPER"]);
    }

    #[test]
    fn test_case_with_punctuation() {
        // Uncased characters do not break the shape on either side.
        assert_eq!(compute(&CaseFactor, "U.S. it's O'Brien"), vec!["UPPER", "lower", "Title"]);
    }

    #[test]
    fn test_mask_labels() {
        let labels = compute(&MaskFactor, "__URL__ __NUM_3__ plain __lonely");
        assert_eq!(labels, vec!["Y", "Y", "n", "n"]);
    }

    #[test]
    fn test_number_labels() {
        let labels = compute(&NumberFactor, "3 -2.5 1e-9 .75 three 3rd");
        assert_eq!(labels, vec!["1", "1", "1", "1", "0", "1"]);
    }

    #[test]
    fn test_subword_tags_as_labels() {
        let labels = compute(&SubwordFactor, "The waff@@ le .");
        assert_eq!(labels, vec!["O", "B", "E", "O"]);
    }

    #[test]
    fn test_registry_builds_builtins() {
        let registry = FactorRegistry::default();
        for name in ["case", "subword", "mask", "number"] {
            assert!(registry.build(name).is_ok(), "builtin {name} missing");
        }
        assert_eq!(registry.names(), vec!["case", "mask", "number", "subword"]);
    }

    #[test]
    fn test_registry_rejects_unknown_name() {
        let registry = FactorRegistry::default();
        let err = registry.build("casing").unwrap_err();
        assert!(matches!(err, FactorError::UnknownFactor(name) if name == "casing"));
    }

    #[test]
    fn test_registry_accepts_new_variants() {
        #[derive(Debug)]
        struct Width;
        impl Factor for Width {
            fn json_field(&self) -> &'static str {
                "tok_text"
            }
            fn compute(&self, segment: &str) -> Vec<String> {
                segment
                    .split_whitespace()
                    .map(|t| t.chars().count().to_string())
                    .collect()
            }
        }

        let mut registry = FactorRegistry::default();
        registry.register("width", || Box::new(Width));
        let widths = registry.build("width").unwrap().compute("ab cde");
        assert_eq!(widths, vec!["2", "3"]);
    }

    #[test]
    fn test_compute_record_routes_fields() {
        let record = Record::parse(
            r#"{"text": "__X__", "tok_text": "Hello", "subword_text": "Hel@@ lo"}"#,
        )
        .unwrap();
        assert_eq!(MaskFactor.compute_record(&record).unwrap(), vec!["Y"]);
        assert_eq!(CaseFactor.compute_record(&record).unwrap(), vec!["Title"]);
        assert_eq!(
            SubwordFactor.compute_record(&record).unwrap(),
            vec!["B", "E"]
        );
    }

    #[test]
    fn test_compute_record_missing_field() {
        let record = Record::parse(r#"{"text": "hi"}"#).unwrap();
        assert!(matches!(
            CaseFactor.compute_record(&record),
            Err(RecordError::MissingField(field)) if field == "tok_text"
        ));
    }
}
