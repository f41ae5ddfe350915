//! Core factor computation and subword broadcasting.
//!
//! The pipeline for one line of a factored-translation corpus:
//!
//! 1. [`factor`]: per-token label computation (case, mask, number) and the
//!    per-unit segmentation tags, behind the [`Factor`] trait and a name
//!    registry.
//! 2. [`segmentation`]: derivation of `O`/`B`/`I`/`E` unit tags from BPE or
//!    SentencePiece continuation markers.
//! 3. [`broadcast`]: replication of token-level labels across subword
//!    units, with a hard [`AlignmentMismatch`] on any count disagreement.
//! 4. [`record`] / [`pipeline`]: inference-mode JSON records and the
//!    text/JSON line drivers with sequential and batch runners.

pub mod broadcast;
pub mod factor;
pub mod pipeline;
pub mod record;
pub mod segmentation;

pub use broadcast::{broadcast, group_sizes, AlignmentMismatch};
pub use factor::{
    CaseFactor, Factor, FactorConstructor, FactorError, FactorRegistry, FactorRole, MaskFactor,
    NumberFactor, SubwordFactor,
};
pub use pipeline::Pipeline;
pub use record::{Record, RecordError};
pub use segmentation::{
    merge_bpe, merge_segment, merge_sentencepiece, tag_bpe, tag_segment, tag_sentencepiece,
    SubwordScheme, SubwordTag,
};
