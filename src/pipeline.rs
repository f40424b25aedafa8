use log::info;
use serde::Serialize;

use crate::classifier::{Classify, ClassifierError, SentimentLabel};
use crate::encoder::{EncodeError, TextEncoder};
use crate::store::{ComplaintRecord, RecordStore, StoreError};

/// Required width of a submitter id, in characters.
pub const SUBMITTER_ID_CHARS: usize = 10;
/// Complaint text must be strictly longer than this, in characters.
pub const MIN_TEXT_CHARS: usize = 4;
/// Upper bound on complaint text, matching the input form's limit.
pub const MAX_TEXT_CHARS: usize = 100;

/// Failures of one submission, distinguishable so the presentation layer
/// can show a specific message instead of swallowing the cause.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Caller input rejected before any side effect.
    #[error("fields not properly filled: {0}")]
    Validation(String),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Classify(#[from] ClassifierError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the caller gets back for immediate display after a successful
/// submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitOutcome {
    pub label: SentimentLabel,
    pub confidence: String,
}

/// Orchestrates one complaint end to end: validate, encode, classify,
/// persist. Atomic with respect to storage — the append at the end is the
/// only write, so any earlier failure leaves the store untouched.
pub struct SubmissionPipeline<C: Classify> {
    encoder: TextEncoder,
    classifier: C,
    store: RecordStore,
}

impl<C: Classify> SubmissionPipeline<C> {
    pub fn new(encoder: TextEncoder, classifier: C, store: RecordStore) -> Self {
        Self {
            encoder,
            classifier,
            store,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Classifies and records one complaint.
    ///
    /// Bounds are business constants, counted in characters: the submitter
    /// id is exactly 10, the text longer than 4 and at most 100. Validation
    /// happens before encoding, so a rejected submission performs no
    /// inference and no write.
    pub fn submit(&self, submitter_id: &str, text: &str) -> Result<SubmitOutcome, SubmitError> {
        validate_submission(submitter_id, text)?;

        let encoded = self.encoder.encode(text)?;
        let result = self.classifier.classify(&encoded)?;
        let record = ComplaintRecord {
            submitter_id: submitter_id.to_string(),
            text: text.to_string(),
            label: result.label,
            confidence: result.confidence_percent(),
        };
        self.store.append(&record)?;
        info!(
            "recorded complaint from {}: {} ({}%)",
            record.submitter_id, record.label, record.confidence
        );

        Ok(SubmitOutcome {
            label: record.label,
            confidence: record.confidence,
        })
    }
}

fn validate_submission(submitter_id: &str, text: &str) -> Result<(), SubmitError> {
    let id_chars = submitter_id.chars().count();
    if id_chars != SUBMITTER_ID_CHARS {
        return Err(SubmitError::Validation(format!(
            "submitter id must be exactly {} characters, got {}",
            SUBMITTER_ID_CHARS, id_chars
        )));
    }
    let text_chars = text.chars().count();
    if text_chars <= MIN_TEXT_CHARS {
        return Err(SubmitError::Validation(format!(
            "complaint text must be longer than {} characters, got {}",
            MIN_TEXT_CHARS, text_chars
        )));
    }
    if text_chars > MAX_TEXT_CHARS {
        return Err(SubmitError::Validation(format!(
            "complaint text must be at most {} characters, got {}",
            MAX_TEXT_CHARS, text_chars
        )));
    }
    Ok(())
}
