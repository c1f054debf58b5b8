//! Defensive parsing of provider responses.
//!
//! Search providers answer in free text that should contain a JSON array of
//! event objects. The parser locates the first well-formed array, attempts a
//! strict parse, falls back to a trailing-comma repair, and finally gives up
//! with an empty list rather than failing the job.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::candidate::CandidateEvent;

/// Wire shape of one event object in a provider response. All fields are
/// tolerant: dates arrive as text and unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawCandidate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Event date/time as text, e.g. "2025-06-01 18:00" or "June 1, 2025".
    #[serde(default, alias = "date_time", alias = "start")]
    pub date: Option<String>,
    #[serde(default, alias = "end")]
    pub end_date: Option<String>,
    #[serde(default, alias = "location", alias = "venue")]
    pub location_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "virtual")]
    pub is_virtual: bool,
    #[serde(default, alias = "price")]
    pub cost: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "url", alias = "link")]
    pub source_url: Option<String>,
}

impl RawCandidate {
    /// Convert the wire shape into a pipeline candidate, parsing dates
    /// best-effort and keeping the raw text for audit.
    pub fn into_candidate(self) -> CandidateEvent {
        let starts_at = self.date.as_deref().and_then(parse_datetime);
        let ends_at = self.end_date.as_deref().and_then(parse_datetime);
        CandidateEvent {
            title: self.title,
            description: self.description,
            date_raw: self.date,
            starts_at,
            ends_at,
            location_name: self.location_name,
            address: self.address,
            is_virtual: self.is_virtual,
            cost: self.cost,
            tags: self.tags,
            source_url: self.source_url,
            job_id: None,
        }
    }
}

/// Parse a date or datetime string in the formats providers actually emit.
///
/// Tries RFC 3339, then `YYYY-MM-DD HH:MM[:SS]`, then bare `YYYY-MM-DD`
/// (midnight UTC). Anything else is left unparsed.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(day.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Extract the first top-level JSON array from free text.
///
/// Scans for `[` and tracks bracket depth while respecting string literals
/// and escapes, so titles containing `]` don't truncate the slice.
pub fn first_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove trailing commas before `]` or `}`, the most common defect in
/// provider-emitted JSON.
fn strip_trailing_commas(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ']' | '}' => {
                // Drop a comma (and any whitespace after it) left dangling
                // before this closer.
                while out
                    .chars()
                    .last()
                    .map(|p| p.is_whitespace())
                    .unwrap_or(false)
                {
                    out.pop();
                }
                if out.ends_with(',') {
                    out.pop();
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Parse candidate events out of a free-text provider response.
///
/// Returns an empty vec when no parseable array is present; the caller
/// treats that as "nothing found", not an error.
pub fn parse_candidates(text: &str) -> Vec<CandidateEvent> {
    let Some(raw) = first_json_array(text) else {
        tracing::debug!("no JSON array found in provider response");
        return vec![];
    };

    let parsed: Vec<RawCandidate> = match serde_json::from_str(raw) {
        Ok(candidates) => candidates,
        Err(strict_err) => {
            let repaired = strip_trailing_commas(raw);
            match serde_json::from_str(&repaired) {
                Ok(candidates) => candidates,
                Err(_) => {
                    tracing::warn!(error = %strict_err, "provider response array unparseable");
                    return vec![];
                }
            }
        }
    };

    parsed.into_iter().map(RawCandidate::into_candidate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_json_array_in_prose() {
        let text = "Here are the events I found:\n[{\"title\": \"A\"}]\nLet me know!";
        assert_eq!(first_json_array(text), Some("[{\"title\": \"A\"}]"));
    }

    #[test]
    fn test_first_json_array_nested() {
        let text = "x [1, [2, 3], 4] y";
        assert_eq!(first_json_array(text), Some("[1, [2, 3], 4]"));
    }

    #[test]
    fn test_first_json_array_bracket_in_string() {
        let text = r#"[{"title": "Jazz [live]"}]"#;
        assert_eq!(first_json_array(text), Some(r#"[{"title": "Jazz [live]"}]"#));
    }

    #[test]
    fn test_first_json_array_none() {
        assert_eq!(first_json_array("no structured data here"), None);
        assert_eq!(first_json_array("unterminated [1, 2"), None);
    }

    #[test]
    fn test_strict_parse() {
        let text = r#"Found these: [{"title": "Sunset Yoga", "date": "2025-06-01", "location": "City Park"}]"#;
        let candidates = parse_candidates(text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Sunset Yoga");
        assert_eq!(candidates[0].location_name.as_deref(), Some("City Park"));
        assert_eq!(candidates[0].date_key(), "2025-06-01");
    }

    #[test]
    fn test_trailing_comma_repair() {
        let text = r#"[{"title": "Sunset Yoga", "tags": ["yoga", "outdoors",], }, ]"#;
        let candidates = parse_candidates(text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].tags, vec!["yoga", "outdoors"]);
    }

    #[test]
    fn test_gives_up_on_garbage() {
        assert!(parse_candidates("events: [not json at all]").is_empty());
        assert!(parse_candidates("").is_empty());
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2025-06-01T18:00:00Z").is_some());
        assert!(parse_datetime("2025-06-01 18:00").is_some());
        assert!(parse_datetime("2025-06-01").is_some());
        assert!(parse_datetime("first Saturday in June").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_unparseable_date_kept_as_raw() {
        let text = r#"[{"title": "Undated", "date": "sometime in June"}]"#;
        let candidates = parse_candidates(text);
        assert_eq!(candidates[0].starts_at, None);
        assert_eq!(candidates[0].date_raw.as_deref(), Some("sometime in June"));
    }
}
