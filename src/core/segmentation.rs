//! Subword segment tagging for marker-bearing token streams.
//!
//! A subword segmenter splits some tokens of a sentence into several units and
//! marks the split with a continuation convention. This module recovers, from
//! an already-segmented line, a per-unit tag describing each unit's position
//! inside its original token:
//!
//! - `O`: a complete, unsplit word
//! - `B`: beginning of a split word
//! - `I`: interior of a split word
//! - `E`: end of a split word
//!
//! Two marker conventions are supported and auto-detected:
//!
//! - **BPE**: non-final pieces carry an `@@` suffix.
//!
//!   ```text
//!   The boy ate the waff@@ le .
//!     O   O   O   O      B  E O
//!   ```
//!
//! - **SentencePiece**: word-initial pieces carry a `▁` prefix.
//!
//!   ```text
//!   ▁iron ▁c ement ▁is
//!       O  B     E   O
//!   ```
//!
//! The tag sequence is both a factor in its own right (one label per unit)
//! and the grouping consumed by [`crate::core::broadcast`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Suffix marking a non-final BPE piece.
pub const BPE_CONTINUATION: &str = "@@";

/// Prefix marking a word-initial SentencePiece piece (U+2581).
pub const SP_WORD_BOUNDARY: char = '\u{2581}';

static BPE_MERGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@@( |$)").expect("BPE merge pattern is valid"));

/// Position of one subword unit inside its original token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubwordTag {
    /// A complete word (`O`).
    Complete,
    /// Beginning of a split word (`B`).
    Begin,
    /// Interior of a split word (`I`).
    Inside,
    /// End of a split word (`E`).
    End,
}

impl SubwordTag {
    /// Stable single-letter rendering used in factor streams.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubwordTag::Complete => "O",
            SubwordTag::Begin => "B",
            SubwordTag::Inside => "I",
            SubwordTag::End => "E",
        }
    }

    /// Whether this tag opens a new token group (`O` and `B` do).
    pub fn starts_token(&self) -> bool {
        matches!(self, SubwordTag::Complete | SubwordTag::Begin)
    }
}

impl fmt::Display for SubwordTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Continuation-marker convention of a segmented line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubwordScheme {
    /// `@@`-suffix convention.
    Bpe,
    /// `▁`-prefix convention.
    SentencePiece,
}

impl SubwordScheme {
    /// Detect the convention of a segmented line. Any occurrence of the
    /// SentencePiece boundary character decides; everything else is BPE.
    pub fn detect(segment: &str) -> Self {
        if segment.contains(SP_WORD_BOUNDARY) {
            SubwordScheme::SentencePiece
        } else {
            SubwordScheme::Bpe
        }
    }
}

/// Tag a whitespace-segmented line, auto-detecting the marker convention.
pub fn tag_segment(segment: &str) -> Vec<SubwordTag> {
    let units: Vec<&str> = segment.split_whitespace().collect();
    match SubwordScheme::detect(segment) {
        SubwordScheme::Bpe => tag_bpe(&units),
        SubwordScheme::SentencePiece => tag_sentencepiece(&units),
    }
}

/// Tag BPE units in a single pass.
///
/// A unit ending in `@@` continues into its successor. A dangling `@@` on the
/// final unit still opens a group; end-of-sequence closes it.
pub fn tag_bpe(units: &[&str]) -> Vec<SubwordTag> {
    let mut tags = Vec::with_capacity(units.len());
    let mut in_word = false;
    for unit in units {
        let continues = unit.ends_with(BPE_CONTINUATION);
        tags.push(match (in_word, continues) {
            (false, false) => SubwordTag::Complete,
            (false, true) => SubwordTag::Begin,
            (true, true) => SubwordTag::Inside,
            (true, false) => SubwordTag::End,
        });
        in_word = continues;
    }
    tags
}

/// Tag SentencePiece units in a single pass.
///
/// A unit starting with `▁` begins a new word; the very first unit always
/// begins the first word, marker or not.
pub fn tag_sentencepiece(units: &[&str]) -> Vec<SubwordTag> {
    let mut tags = Vec::with_capacity(units.len());
    let mut run = 0usize;
    for (i, unit) in units.iter().enumerate() {
        if i > 0 && unit.starts_with(SP_WORD_BOUNDARY) {
            close_run(&mut tags, run);
            run = 0;
        }
        run += 1;
    }
    close_run(&mut tags, run);
    tags
}

/// Emit the tags for one completed run of `len` units.
fn close_run(tags: &mut Vec<SubwordTag>, len: usize) {
    match len {
        0 => {}
        1 => tags.push(SubwordTag::Complete),
        n => {
            tags.push(SubwordTag::Begin);
            tags.extend(std::iter::repeat(SubwordTag::Inside).take(n - 2));
            tags.push(SubwordTag::End);
        }
    }
}

/// Undo segmentation on a line, auto-detecting the marker convention.
pub fn merge_segment(segment: &str) -> String {
    match SubwordScheme::detect(segment) {
        SubwordScheme::Bpe => merge_bpe(segment),
        SubwordScheme::SentencePiece => merge_sentencepiece(segment),
    }
}

/// Undo BPE segmentation on a line: `waff@@ le` becomes `waffle`.
pub fn merge_bpe(segment: &str) -> String {
    BPE_MERGE.replace_all(segment, "").into_owned()
}

/// Undo SentencePiece segmentation on a line: pieces are concatenated and
/// every `▁` becomes a space.
pub fn merge_sentencepiece(segment: &str) -> String {
    let joined: String = segment.split_whitespace().collect();
    joined
        .replace(SP_WORD_BOUNDARY, " ")
        .trim_start()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use SubwordTag::{Begin, Complete, End, Inside};

    #[test]
    fn test_tag_bpe_documented_example() {
        let units = ["The", "boy", "ate", "the", "waff@@", "le", "."];
        let tags = tag_bpe(&units);
        assert_eq!(
            tags,
            vec![Complete, Complete, Complete, Complete, Begin, End, Complete]
        );
    }

    #[test]
    fn test_tag_bpe_interior_pieces() {
        let tags = tag_bpe(&["un@@", "believ@@", "able"]);
        assert_eq!(tags, vec![Begin, Inside, End]);
    }

    #[test]
    fn test_tag_bpe_dangling_continuation() {
        // A final unit ending in @@ opens a group that end-of-line closes.
        let tags = tag_bpe(&["word@@"]);
        assert_eq!(tags, vec![Begin]);
    }

    #[test]
    fn test_tag_sentencepiece_runs() {
        let units = ["\u{2581}iron", "\u{2581}c", "ement", "\u{2581}is"];
        let tags = tag_sentencepiece(&units);
        assert_eq!(tags, vec![Complete, Begin, End, Complete]);
    }

    #[test]
    fn test_tag_sentencepiece_first_unit_unmarked() {
        let tags = tag_sentencepiece(&["iron", "\u{2581}is"]);
        assert_eq!(tags, vec![Complete, Complete]);
    }

    #[test]
    fn test_tag_sentencepiece_long_word() {
        let tags = tag_sentencepiece(&["\u{2581}in", "go", "t"]);
        assert_eq!(tags, vec![Begin, Inside, End]);
    }

    #[test]
    fn test_tag_segment_detects_scheme() {
        assert_eq!(tag_segment("waff@@ le"), vec![Begin, End]);
        assert_eq!(tag_segment("\u{2581}waff le"), vec![Begin, End]);
    }

    #[test]
    fn test_tag_segment_empty_line() {
        assert!(tag_segment("").is_empty());
        assert!(tag_segment("   ").is_empty());
    }

    #[test]
    fn test_scheme_detection() {
        assert_eq!(SubwordScheme::detect("waff@@ le"), SubwordScheme::Bpe);
        assert_eq!(
            SubwordScheme::detect("\u{2581}waffle"),
            SubwordScheme::SentencePiece
        );
        assert_eq!(SubwordScheme::detect("plain text"), SubwordScheme::Bpe);
    }

    #[test]
    fn test_merge_bpe() {
        assert_eq!(merge_bpe("The waff@@ le ."), "The waffle .");
        assert_eq!(merge_bpe("trailing@@"), "trailing");
    }

    #[test]
    fn test_merge_segment_detects_scheme() {
        assert_eq!(merge_segment("waff@@ le"), "waffle");
        assert_eq!(merge_segment("\u{2581}waff le"), "waffle");
    }

    #[test]
    fn test_merge_sentencepiece() {
        assert_eq!(
            merge_sentencepiece("\u{2581}iron \u{2581}c ement \u{2581}is"),
            "iron cement is"
        );
    }
}
