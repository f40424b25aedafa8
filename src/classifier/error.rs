use std::time::Duration;

/// Per-request classification failures. None of these are persisted; the
/// pipeline reports them to the caller and leaves the record store alone.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The runtime failed while building tensors or executing the model.
    #[error("inference failed: {0}")]
    Inference(String),
    /// The model ran but produced something that is not a two-class
    /// probability vector.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),
    /// Inference did not finish within the configured bound.
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),
}
