//! Broadcasting token-level factor values across subword units.
//!
//! Segmentation turns N original tokens into M ≥ N subword units; a
//! token-level factor still has only N values. Broadcasting replicates each
//! token's value over every unit derived from that token, producing an
//! M-long sequence aligned 1:1 with the unit stream.
//!
//! The grouping comes from the unit tag sequence (see
//! [`crate::core::segmentation`]): a group is a single `O` or a maximal
//! `B I* E` run. Groups are derived in one left-to-right pass, and any
//! disagreement between the derived group count and a factor's value count is
//! an [`AlignmentMismatch`]; misaligned output is never emitted.
//!
//! # Example
//!
//! ```
//! use factr::core::broadcast::broadcast;
//! use factr::core::segmentation::tag_segment;
//!
//! let tags = tag_segment("Hel@@ lo world");
//! let case = vec!["upper".to_string(), "lower".to_string()];
//! let per_unit = broadcast(&tags, &case).unwrap();
//! assert_eq!(per_unit, vec!["upper", "upper", "lower"]);
//! ```

use thiserror::Error;

use super::segmentation::SubwordTag;

/// A factor's token count disagrees with the segmentation's token count.
///
/// Raised whenever the number of groups derivable from the unit tag sequence
/// differs from the number of values a factor produced, in either direction.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("segmentation yields {groups} token groups but {values} factor values were given")]
pub struct AlignmentMismatch {
    /// Token groups derived from the unit tag sequence.
    pub groups: usize,
    /// Values produced by the factor being broadcast.
    pub values: usize,
}

/// Group index of every unit, in one left-to-right pass.
///
/// A new group opens at every group-starting tag, and at position 0
/// unconditionally, so a stray leading continuation cannot orphan units.
fn group_indices(tags: &[SubwordTag]) -> Vec<usize> {
    let mut indices = Vec::with_capacity(tags.len());
    let mut current = 0usize;
    for (j, tag) in tags.iter().enumerate() {
        if j > 0 && tag.starts_token() {
            current += 1;
        }
        indices.push(current);
    }
    indices
}

/// Sizes of the token groups induced by a unit tag sequence.
///
/// The sizes sum to `tags.len()` and their count is the number of original
/// tokens the segmentation refines.
pub fn group_sizes(tags: &[SubwordTag]) -> Vec<usize> {
    let mut sizes: Vec<usize> = Vec::new();
    for (j, tag) in tags.iter().enumerate() {
        match sizes.last_mut() {
            Some(last) if j > 0 && !tag.starts_token() => *last += 1,
            _ => sizes.push(1),
        }
    }
    sizes
}

/// Replicate token-level `values` across the units grouped by `tags`.
///
/// Returns one value per unit, each equal to the value of the token whose
/// group contains that unit, in unit order. When no token was split the
/// output is a plain copy of `values`; that is the general pass at work, not
/// a special case. Fails with [`AlignmentMismatch`] when the derived group
/// count differs from `values.len()`.
pub fn broadcast(
    tags: &[SubwordTag],
    values: &[String],
) -> Result<Vec<String>, AlignmentMismatch> {
    let indices = group_indices(tags);
    let groups = indices.last().map_or(0, |&g| g + 1);
    if groups != values.len() {
        return Err(AlignmentMismatch {
            groups,
            values: values.len(),
        });
    }
    Ok(indices.into_iter().map(|g| values[g].clone()).collect())
}
