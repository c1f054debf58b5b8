//! Mock providers for testing pipeline stages without network calls.
//!
//! Mocks return scripted results in order and fall back to a permissive
//! default when the script runs out. Calls are recorded for assertions.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AcquisitionError, ValidationProviderError};
use crate::parse::RawCandidate;
use crate::providers::logger::CallMeta;
use crate::providers::search::{EventExtractor, ExtractReply, SearchProvider, SearchReply};
use crate::providers::validator::{ValidationContext, ValidationProvider, VerdictReply};
use crate::types::candidate::CandidateEvent;
use crate::types::validation::{Corrections, Recommendation, ValidationVerdict};

/// Search provider returning scripted free-text responses.
#[derive(Default)]
pub struct MockSearchProvider {
    responses: Mutex<VecDeque<Result<String, AcquisitionError>>>,
    queries: Mutex<Vec<String>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful free-text response.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    /// Queue a provider failure.
    pub fn with_error(self, error: AcquisitionError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(
        &self,
        query: &str,
        _recency_days: Option<i64>,
    ) -> Result<SearchReply, AcquisitionError> {
        self.queries.lock().unwrap().push(query.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(SearchReply {
                text,
                meta: CallMeta::default(),
            }),
            Some(Err(e)) => Err(e),
            None => Ok(SearchReply {
                text: "[]".to_string(),
                meta: CallMeta::default(),
            }),
        }
    }
}

/// Event extractor returning scripted candidate lists.
#[derive(Default)]
pub struct MockEventExtractor {
    results: Mutex<VecDeque<Result<Vec<RawCandidate>, AcquisitionError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockEventExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(self, events: Vec<RawCandidate>) -> Self {
        self.results.lock().unwrap().push_back(Ok(events));
        self
    }

    pub fn with_error(self, error: AcquisitionError) -> Self {
        self.results.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventExtractor for MockEventExtractor {
    async fn extract_events(&self, prompt: &str) -> Result<ExtractReply, AcquisitionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.results.lock().unwrap().pop_front() {
            Some(Ok(events)) => {
                let raw = serde_json::to_string(&events).unwrap_or_default();
                Ok(ExtractReply {
                    events,
                    raw,
                    meta: CallMeta::default(),
                })
            }
            Some(Err(e)) => Err(e),
            None => Ok(ExtractReply {
                events: vec![],
                raw: "{\"events\":[]}".to_string(),
                meta: CallMeta::default(),
            }),
        }
    }
}

/// Validation provider returning scripted verdicts in order.
///
/// With no script, every candidate gets an accept at 0.9.
#[derive(Default)]
pub struct MockValidationProvider {
    results: Mutex<VecDeque<Result<ValidationVerdict, ValidationProviderError>>>,
    validated_titles: Mutex<Vec<String>>,
}

impl MockValidationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(
        self,
        results: Vec<Result<ValidationVerdict, ValidationProviderError>>,
    ) -> Self {
        *self.results.lock().unwrap() = results.into();
        self
    }

    /// Shorthand accept verdict.
    pub fn accept(confidence: f64) -> ValidationVerdict {
        ValidationVerdict {
            is_valid: true,
            confidence,
            issues: vec![],
            corrections: Corrections::default(),
            recommendation: Recommendation::Accept,
        }
    }

    /// Shorthand reject verdict.
    pub fn reject(confidence: f64) -> ValidationVerdict {
        ValidationVerdict {
            is_valid: false,
            confidence,
            issues: vec!["not a real event".to_string()],
            corrections: Corrections::default(),
            recommendation: Recommendation::Reject,
        }
    }

    /// Titles validated so far, in call order.
    pub fn validated_titles(&self) -> Vec<String> {
        self.validated_titles.lock().unwrap().clone()
    }
}

#[async_trait]
impl ValidationProvider for MockValidationProvider {
    async fn validate(
        &self,
        candidate: &CandidateEvent,
        _context: &ValidationContext,
    ) -> Result<VerdictReply, ValidationProviderError> {
        self.validated_titles
            .lock()
            .unwrap()
            .push(candidate.title.clone());
        match self.results.lock().unwrap().pop_front() {
            Some(Ok(verdict)) => Ok(VerdictReply {
                verdict,
                meta: CallMeta::default(),
            }),
            Some(Err(e)) => Err(e),
            None => Ok(VerdictReply {
                verdict: Self::accept(0.9),
                meta: CallMeta::default(),
            }),
        }
    }
}
