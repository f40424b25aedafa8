//! Sentiment classification and durable recording for short free-text
//! complaints, backed by an ONNX sequence model and a SQLite record store.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use limbic::{
//!     ArtifactConfig, ArtifactLoader, RecordStore, SentimentClassifier,
//!     SubmissionPipeline, TextEncoder,
//! };
//!
//! let loader = ArtifactLoader::new(ArtifactConfig::new(
//!     "ai/model.onnx",
//!     "ai/tokenizer.json",
//!     469,
//! ));
//! let artifact = loader.load()?;
//!
//! let store = RecordStore::new("complaints.db");
//! store.ensure_schema()?;
//!
//! let pipeline = SubmissionPipeline::new(
//!     TextEncoder::new(&artifact),
//!     SentimentClassifier::new(&artifact),
//!     store,
//! );
//!
//! let outcome = pipeline.submit("SIGU000001", "Muito bom atendimento")?;
//! println!("{} ({}%)", outcome.label, outcome.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The loaded artifact is immutable and `Arc`-shared, so one pipeline can
//! serve concurrent submissions; the record store serializes writers at the
//! SQLite layer:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use limbic::{
//!     ArtifactConfig, ArtifactLoader, RecordStore, SentimentClassifier,
//!     SubmissionPipeline, TextEncoder,
//! };
//! use std::sync::Arc;
//! use std::thread;
//!
//! let loader = ArtifactLoader::new(ArtifactConfig::new(
//!     "ai/model.onnx",
//!     "ai/tokenizer.json",
//!     469,
//! ));
//! let artifact = loader.load()?;
//! let store = RecordStore::new("complaints.db");
//! store.ensure_schema()?;
//!
//! let pipeline = Arc::new(SubmissionPipeline::new(
//!     TextEncoder::new(&artifact),
//!     SentimentClassifier::new(&artifact),
//!     store,
//! ));
//!
//! let mut handles = vec![];
//! for i in 0..3 {
//!     let pipeline = Arc::clone(&pipeline);
//!     handles.push(thread::spawn(move || {
//!         pipeline
//!             .submit(&format!("SIGU00000{i}"), "Serviço demorou demais")
//!             .unwrap();
//!     }));
//! }
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod classifier;
pub mod encoder;
pub mod pipeline;
mod runtime;
pub mod store;

pub use artifact::{ArtifactConfig, ArtifactError, ArtifactLoader, ModelArtifact};
pub use classifier::{
    ClassificationResult, Classify, ClassifierError, SentimentClassifier, SentimentLabel,
};
pub use encoder::{EncodeError, EncodedInput, TextEncoder};
pub use pipeline::{SubmissionPipeline, SubmitError, SubmitOutcome};
pub use runtime::{create_session_builder, RuntimeConfig, DEFAULT_INFERENCE_TIMEOUT};
pub use store::{ComplaintRecord, RecordStore, StoreError};

pub fn init_logger() {
    env_logger::init();
}
