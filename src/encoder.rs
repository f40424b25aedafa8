use std::sync::Arc;

use tokenizers::Tokenizer;

use crate::artifact::ModelArtifact;

/// Error raised when the vocabulary cannot encode the input text. Unknown
/// words are not an error; they map to the vocabulary's unknown id (or are
/// dropped, per the tokenizer file's own policy).
#[derive(Debug, thiserror::Error)]
#[error("failed to tokenize input: {0}")]
pub struct EncodeError(pub String);

/// A fixed-length integer encoding of one complaint, shaped for the model's
/// input layer: always exactly `sequence_length` ids, left-padded with the
/// fill id. The constructor is the only way to build one, so the length
/// invariant holds everywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInput {
    ids: Vec<u32>,
}

/// Id used to fill positions that carry no token. Matches the padding value
/// the model was trained with.
pub const FILL_ID: u32 = 0;

impl EncodedInput {
    /// Left-pads or left-truncates `ids` so the result is exactly
    /// `sequence_length` long. Pre-padding is deliberate: the trained model
    /// expects signal at the tail positions, so a too-long sequence keeps
    /// its tail and a too-short one is pushed right.
    fn from_token_ids(ids: &[u32], sequence_length: usize) -> Self {
        let mut padded = vec![FILL_ID; sequence_length];
        if ids.len() >= sequence_length {
            padded.copy_from_slice(&ids[ids.len() - sequence_length..]);
        } else {
            padded[sequence_length - ids.len()..].copy_from_slice(ids);
        }
        Self { ids: padded }
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Turns raw complaint text into the fixed-shape numeric input the model
/// expects. Purely functional over the shared tokenizer; no state, no side
/// effects.
#[derive(Debug, Clone)]
pub struct TextEncoder {
    tokenizer: Arc<Tokenizer>,
    sequence_length: usize,
}

impl TextEncoder {
    pub fn new(artifact: &ModelArtifact) -> Self {
        Self {
            tokenizer: Arc::clone(artifact.tokenizer()),
            sequence_length: artifact.sequence_length(),
        }
    }

    /// Builds an encoder straight from a tokenizer and length, without a
    /// loaded model. Used by tests and benches.
    pub fn from_parts(tokenizer: Arc<Tokenizer>, sequence_length: usize) -> Self {
        Self {
            tokenizer,
            sequence_length,
        }
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// Encodes one complaint: case-fold, tokenize without special tokens,
    /// map tokens to ids, then fix the shape to the model's sequence
    /// length. An input that normalizes to nothing still yields the
    /// all-fill sequence rather than failing.
    pub fn encode(&self, raw_text: &str) -> Result<EncodedInput, EncodeError> {
        let lowered = raw_text.to_lowercase();
        let encoding = self
            .tokenizer
            .encode(lowered.as_str(), false)
            .map_err(|e| EncodeError(e.to_string()))?;
        Ok(EncodedInput::from_token_ids(
            encoding.get_ids(),
            self.sequence_length,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sequence_is_left_padded() {
        let encoded = EncodedInput::from_token_ids(&[7, 8, 9], 6);
        assert_eq!(encoded.ids(), &[0, 0, 0, 7, 8, 9]);
    }

    #[test]
    fn test_long_sequence_keeps_tail() {
        let encoded = EncodedInput::from_token_ids(&[1, 2, 3, 4, 5, 6, 7], 4);
        assert_eq!(encoded.ids(), &[4, 5, 6, 7]);
    }

    #[test]
    fn test_exact_length_passes_through() {
        let encoded = EncodedInput::from_token_ids(&[3, 1, 4, 1], 4);
        assert_eq!(encoded.ids(), &[3, 1, 4, 1]);
    }

    #[test]
    fn test_empty_input_yields_all_fill() {
        let encoded = EncodedInput::from_token_ids(&[], 5);
        assert_eq!(encoded.ids(), &[FILL_ID; 5]);
    }
}
