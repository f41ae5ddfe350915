//! factr - per-token linguistic factors with subword broadcast
//!
//! Computes factor streams over tokenized text for training and serving a
//! factored sequence-to-sequence translation model:
//! - Casing, mask-placeholder and numeric factors, one label per token
//! - Subword segment tags (`O`/`B`/`I`/`E`) for BPE and SentencePiece output
//! - Broadcasting of token-level labels across subword units, with strict
//!   alignment checking (misaligned data is an error, never emitted)
//! - A text mode for corpus preparation and a JSON-record mode for inference
//!
//! The `factr` binary exposes both modes on the command line; the library
//! surface below is everything the binary uses.

pub mod core;

pub use core::{
    broadcast, group_sizes, merge_bpe, merge_segment, merge_sentencepiece, tag_segment,
    AlignmentMismatch, CaseFactor, Factor, FactorError, FactorRegistry, FactorRole, MaskFactor,
    NumberFactor, Pipeline, Record, RecordError, SubwordFactor, SubwordScheme, SubwordTag,
};
