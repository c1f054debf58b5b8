//! Word-set similarity for fuzzy duplicate detection.

use std::collections::HashSet;

use crate::fingerprint::normalize;

/// Tokenize normalized text into its set of words.
pub fn token_set(text: &str) -> HashSet<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity (intersection over union) of two titles' word sets.
///
/// Returns 0.0 when either side has no tokens, so an empty title never
/// matches anything.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let set_a = token_set(a);
    let set_b = token_set(b);
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_titles() {
        assert!((title_similarity("Sunset Yoga", "Sunset Yoga") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_case_and_punctuation_ignored() {
        assert!((title_similarity("Sunset Yoga!", "sunset YOGA") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_overlap() {
        // {sunset, yoga} vs {sunset, yoga, class}: 2 shared of 3 total.
        let sim = title_similarity("Sunset Yoga", "Sunset Yoga Class");
        assert!((sim - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_titles() {
        assert_eq!(title_similarity("Sunset Yoga", "Farmers Market"), 0.0);
    }

    #[test]
    fn test_empty_title_never_matches() {
        assert_eq!(title_similarity("", "Sunset Yoga"), 0.0);
        assert_eq!(title_similarity("", ""), 0.0);
        assert_eq!(title_similarity("!!!", "Sunset Yoga"), 0.0);
    }

    #[test]
    fn test_duplicate_words_counted_once() {
        let sim = title_similarity("yoga yoga yoga", "yoga");
        assert!((sim - 1.0).abs() < 1e-9);
    }
}
