//! Canonical normalization and duplicate fingerprinting.
//!
//! A stored event's fingerprint is a sha-256 over the normalized
//! `title|date|location` key. Case and punctuation differences normalize
//! away, so two spellings of the same listing hash identically.

use sha2::{Digest, Sha256};

/// Normalize free text for comparison: lowercase, replace non-alphanumeric
/// characters with spaces, collapse whitespace runs.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deterministic fingerprint over (title, start date, location name).
///
/// The three fields are normalized independently and joined with `|` before
/// hashing, so field boundaries survive normalization.
pub fn fingerprint(title: &str, date_start: &str, location: &str) -> String {
    let key = format!(
        "{}|{}|{}",
        normalize(title),
        normalize(date_start),
        normalize(location)
    );
    hex::encode(Sha256::digest(key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("Sunset  Yoga!"), "sunset yoga");
        assert_eq!(normalize("SUNSET-YOGA"), "sunset yoga");
        assert_eq!(normalize("  sunset,   yoga.  "), "sunset yoga");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!! ???"), "");
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = fingerprint("Sunset Yoga", "2025-06-01", "City Park");
        let b = fingerprint("Sunset Yoga", "2025-06-01", "City Park");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_case_and_punctuation_invariant() {
        let a = fingerprint("Sunset Yoga", "2025-06-01", "City Park");
        let b = fingerprint("SUNSET YOGA!", "2025-06-01", "city park.");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_field_sensitive() {
        let a = fingerprint("Sunset Yoga", "2025-06-01", "City Park");
        let b = fingerprint("Sunset Yoga", "2025-06-02", "City Park");
        let c = fingerprint("Sunset Yoga", "2025-06-01", "Lake Park");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_fingerprint_order_sensitive() {
        // Field contents must not bleed across the separator.
        let a = fingerprint("yoga city", "2025-06-01", "park");
        let b = fingerprint("yoga", "2025-06-01", "city park");
        assert_ne!(a, b);
    }
}
