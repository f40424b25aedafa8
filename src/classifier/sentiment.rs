use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::debug;
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;

use super::{ClassificationResult, Classify, ClassifierError};
use crate::artifact::ModelArtifact;
use crate::encoder::EncodedInput;
use crate::runtime::{RuntimeConfig, DEFAULT_INFERENCE_TIMEOUT};

/// Runs the trained model on encoded complaints. Thread-safe: the session
/// is shared read-only behind an `Arc`, so one classifier can serve any
/// number of concurrent callers.
#[derive(Debug, Clone)]
pub struct SentimentClassifier {
    session: Arc<Session>,
    input_name: String,
    timeout: Duration,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<SentimentClassifier>();
    }
};

impl SentimentClassifier {
    pub fn new(artifact: &ModelArtifact) -> Self {
        let session = Arc::clone(artifact.session());
        // ArtifactLoader validated that at least one input exists.
        let input_name = session.inputs[0].name.clone();
        Self {
            session,
            input_name,
            timeout: DEFAULT_INFERENCE_TIMEOUT,
        }
    }

    /// Like [`SentimentClassifier::new`], with the inference bound taken
    /// from the runtime configuration the session was built with.
    pub fn with_runtime_config(artifact: &ModelArtifact, config: &RuntimeConfig) -> Self {
        Self::new(artifact).with_timeout(config.inference_timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Classify for SentimentClassifier {
    /// Runs the model on one encoded input and derives the result from the
    /// emitted probability vector.
    ///
    /// The session call executes on a worker thread and the caller waits at
    /// most the configured timeout; a stuck runtime surfaces as
    /// `ClassifierError::Timeout` instead of hanging the submission.
    fn classify(&self, encoded: &EncodedInput) -> Result<ClassificationResult, ClassifierError> {
        let session = Arc::clone(&self.session);
        let input_name = self.input_name.clone();
        let ids: Vec<i64> = encoded.ids().iter().map(|&id| id as i64).collect();

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(run_inference(&session, &input_name, &ids));
        });

        let probs = match rx.recv_timeout(self.timeout) {
            Ok(result) => result?,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                return Err(ClassifierError::Timeout(self.timeout));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(ClassifierError::Inference(
                    "inference worker terminated unexpectedly".to_string(),
                ));
            }
        };
        debug!("model probabilities: {:?}", probs);
        ClassificationResult::from_probabilities(&probs)
    }
}

/// Feeds one `[1, L]` id tensor through the session and flattens the output
/// into the raw probability vector.
fn run_inference(
    session: &Session,
    input_name: &str,
    ids: &[i64],
) -> Result<Vec<f32>, ClassifierError> {
    let input_array = Array2::from_shape_vec((1, ids.len()), ids.to_vec())
        .map_err(|e| ClassifierError::Inference(format!("Failed to create input array: {}", e)))?;
    let input_dyn = input_array.into_dyn();
    let input_ids = input_dyn.as_standard_layout();

    let mut input_tensors = HashMap::new();
    input_tensors.insert(
        input_name,
        Tensor::from_array(&input_ids)
            .map_err(|e| ClassifierError::Inference(format!("Failed to create input tensor: {}", e)))?,
    );

    let outputs = session
        .run(input_tensors)
        .map_err(|e| ClassifierError::Inference(format!("Failed to run model: {}", e)))?;
    let output_tensor = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| ClassifierError::Inference(format!("Failed to extract output tensor: {}", e)))?;

    Ok(output_tensor.iter().copied().collect())
}
