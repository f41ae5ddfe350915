//! Integration tests for the built-in factors: label alphabets, both subword
//! tag schemes, and the marker-merge helpers.

use factr::{
    merge_bpe, merge_sentencepiece, CaseFactor, Factor, MaskFactor, NumberFactor, SubwordFactor,
};

fn compute(factor: &dyn Factor, segment: &str) -> String {
    factor.compute(segment).join(" ")
}

#[test]
fn test_case_factor_alphabet() {
    assert_eq!(
        compute(&CaseFactor, "NATO Berlin came back ."),
        "UPPER Title lower lower -"
    );
}

#[test]
fn test_case_factor_mixed_shapes() {
    // Internal capitals are neither title nor upper.
    assert_eq!(compute(&CaseFactor, "McDonald iPhone"), "- -");
    // Digits and punctuation are uncased and do not break a shape.
    assert_eq!(compute(&CaseFactor, "A4 B-52 ok-ish"), "UPPER UPPER lower");
}

#[test]
fn test_case_factor_unicode() {
    assert_eq!(compute(&CaseFactor, "ÄPFEL Straße früh"), "UPPER Title lower");
}

#[test]
fn test_mask_factor() {
    assert_eq!(
        compute(&MaskFactor, "__URL__ __EMAIL_12__ x__y__ plain"),
        "Y Y n n"
    );
}

#[test]
fn test_number_factor() {
    assert_eq!(
        compute(&NumberFactor, "42 -3.5 +7 1e-9 .25 12% price"),
        "1 1 1 1 1 1 0"
    );
}

#[test]
fn test_subword_factor_bpe() {
    assert_eq!(
        compute(&SubwordFactor, "The boy ate the waff@@ le ."),
        "O O O O B E O"
    );
}

#[test]
fn test_subword_factor_sentencepiece() {
    let segment = "\u{2581}iron \u{2581}c ement \u{2581}is \u{2581}a \u{2581}past e";
    assert_eq!(compute(&SubwordFactor, segment), "O B E O O B E");
}

#[test]
fn test_subword_factor_label_count_matches_units() {
    let segment = "\u{2581}fill et \u{2581}by \u{2581}kni fe \u{2581}in go t";
    let labels = SubwordFactor.compute(segment);
    assert_eq!(labels.len(), segment.split_whitespace().count());
}

#[test]
fn test_token_factors_emit_one_label_per_token() {
    let line = "One , __MASK__ 2.5 words HERE";
    let n = line.split_whitespace().count();
    for factor in [&CaseFactor as &dyn Factor, &MaskFactor, &NumberFactor] {
        assert_eq!(factor.compute(line).len(), n);
    }
}

#[test]
fn test_empty_line_yields_no_labels() {
    for factor in [
        &CaseFactor as &dyn Factor,
        &MaskFactor,
        &NumberFactor,
        &SubwordFactor,
    ] {
        assert!(factor.compute("").is_empty());
    }
}

#[test]
fn test_merge_bpe_restores_surface() {
    assert_eq!(
        merge_bpe("The boy ate the waff@@ le ."),
        "The boy ate the waffle ."
    );
}

#[test]
fn test_merge_sentencepiece_restores_surface() {
    assert_eq!(
        merge_sentencepiece("\u{2581}iron \u{2581}c ement \u{2581}is"),
        "iron cement is"
    );
}
