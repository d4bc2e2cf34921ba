//! Truth-value heuristics
//!
//! Lexical estimates of how far a retelling has drifted from the event it
//! describes. Only words of four or more characters count towards overlap, so
//! articles and short connectives do not mask real changes.

use rumormill_domain::clamp_unit;
use std::collections::HashSet;

const MIN_SIGNIFICANT_LEN: usize = 4;
const LENGTH_PENALTY_WEIGHT: f64 = 0.2;
const OVERLAP_PENALTY_WEIGHT: f64 = 0.3;

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lowercased words of at least four characters, punctuation trimmed
fn significant_words(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| w.chars().count() >= MIN_SIGNIFICANT_LEN)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

/// Similarity of two texts in [0, 1]
///
/// Jaccard overlap of their significant words. Two texts without any
/// significant words are similar only if they are equal ignoring case.
pub fn content_similarity(a: &str, b: &str) -> f64 {
    let words_a = significant_words(a);
    let words_b = significant_words(b);
    if words_a.is_empty() && words_b.is_empty() {
        return if a.trim().to_lowercase() == b.trim().to_lowercase() { 1.0 } else { 0.0 };
    }
    jaccard(&words_a, &words_b)
}

/// Estimate the truth value of a retelling
///
/// Starts from `base_truth` and subtracts a length-mismatch penalty
/// (`|wc(o) - wc(t)| / max(wc(o), 1) * 0.2`) and a lexical-overlap penalty
/// (`0.3 * (1 - jaccard)`). Never exceeds `base_truth`.
///
/// # Examples
///
/// ```
/// use rumormill_transformer::calculate_truth_value;
///
/// let same = calculate_truth_value("The king is ill", "The king is ill", 0.8);
/// assert!((same - 0.8).abs() < 1e-9);
///
/// let drifted = calculate_truth_value("The king is ill", "Dragons burned the harbour", 0.8);
/// assert!(drifted < same);
/// ```
pub fn calculate_truth_value(original_event: &str, transformed: &str, base_truth: f64) -> f64 {
    let base = clamp_unit(base_truth);

    let original_count = word_count(original_event);
    let transformed_count = word_count(transformed);
    let length_penalty = original_count.abs_diff(transformed_count) as f64 / original_count.max(1) as f64
        * LENGTH_PENALTY_WEIGHT;

    let overlap = jaccard(&significant_words(original_event), &significant_words(transformed));
    let overlap_penalty = OVERLAP_PENALTY_WEIGHT * (1.0 - overlap);

    clamp_unit(base - length_penalty - overlap_penalty).min(base)
}
