use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokenizers::Tokenizer;

use ort::session::Session;

use crate::runtime::{create_session_builder, RuntimeConfig};

/// Errors raised while resolving or loading the model artifact. All of them
/// are fatal for classification: the process cannot serve predictions until
/// the artifact pair is readable and structurally sound.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("failed to load tokenizer from {path}: {message}")]
    Tokenizer { path: PathBuf, message: String },
    #[error("failed to load model from {path}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },
    #[error("model graph is not usable: {0}")]
    InvalidModel(String),
    #[error("sequence length must be greater than zero")]
    ZeroSequenceLength,
}

/// Selects the artifact pair for this process. Resolved once at startup;
/// swapping artifacts means restarting with a different config.
///
/// The sequence length is part of the selection because it is a property of
/// the trained model's input layer, not something the encoder may choose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub sequence_length: usize,
    /// Optional SHA-256 (hex) of the model file, verified before load.
    #[serde(default)]
    pub model_sha256: Option<String>,
    /// Optional SHA-256 (hex) of the tokenizer file, verified before load.
    #[serde(default)]
    pub tokenizer_sha256: Option<String>,
}

impl ArtifactConfig {
    pub fn new(
        model_path: impl Into<PathBuf>,
        tokenizer_path: impl Into<PathBuf>,
        sequence_length: usize,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            tokenizer_path: tokenizer_path.into(),
            sequence_length,
            model_sha256: None,
            tokenizer_sha256: None,
        }
    }

    pub fn with_model_sha256(mut self, hash: impl Into<String>) -> Self {
        self.model_sha256 = Some(hash.into());
        self
    }

    pub fn with_tokenizer_sha256(mut self, hash: impl Into<String>) -> Self {
        self.tokenizer_sha256 = Some(hash.into());
        self
    }
}

/// The trained model and its paired vocabulary, loaded once and shared
/// read-only by every encoding and classification call.
#[derive(Debug)]
pub struct ModelArtifact {
    session: Arc<Session>,
    tokenizer: Arc<Tokenizer>,
    sequence_length: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ModelArtifact>();
    }
};

impl ModelArtifact {
    /// Loads the artifact pair described by `config`.
    ///
    /// Verifies file presence (and checksums when configured) before
    /// touching the runtime, loads the tokenizer, then commits the ONNX
    /// session and checks that the graph exposes at least one input and
    /// one output tensor.
    pub fn load(config: &ArtifactConfig, runtime: &RuntimeConfig) -> Result<Self, ArtifactError> {
        if config.sequence_length == 0 {
            return Err(ArtifactError::ZeroSequenceLength);
        }
        for path in [&config.model_path, &config.tokenizer_path] {
            if !path.exists() {
                return Err(ArtifactError::NotFound(path.clone()));
            }
        }
        if let Some(expected) = &config.model_sha256 {
            verify_checksum(&config.model_path, expected)?;
        }
        if let Some(expected) = &config.tokenizer_sha256 {
            verify_checksum(&config.tokenizer_path, expected)?;
        }

        let tokenizer =
            Tokenizer::from_file(&config.tokenizer_path).map_err(|e| ArtifactError::Tokenizer {
                path: config.tokenizer_path.clone(),
                message: e.to_string(),
            })?;
        info!("Tokenizer loaded from {:?}", config.tokenizer_path);

        let session = create_session_builder(runtime)
            .and_then(|builder| builder.commit_from_file(&config.model_path))
            .map_err(|source| ArtifactError::Model {
                path: config.model_path.clone(),
                source,
            })?;
        Self::validate_session(&session)?;
        info!(
            "Model loaded from {:?} (sequence length {})",
            config.model_path, config.sequence_length
        );

        Ok(Self {
            session: Arc::new(session),
            tokenizer: Arc::new(tokenizer),
            sequence_length: config.sequence_length,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn tokenizer(&self) -> &Arc<Tokenizer> {
        &self.tokenizer
    }

    /// Number of integer positions the model's input layer expects.
    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    fn validate_session(session: &Session) -> Result<(), ArtifactError> {
        if session.inputs.is_empty() {
            return Err(ArtifactError::InvalidModel(
                "model must expose at least one input tensor".to_string(),
            ));
        }
        if session.outputs.is_empty() {
            return Err(ArtifactError::InvalidModel(
                "model must expose at least one output tensor".to_string(),
            ));
        }
        Ok(())
    }
}

fn verify_checksum(path: &Path, expected: &str) -> Result<(), ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let actual = format!("{:x}", hasher.finalize());
    if !actual.eq_ignore_ascii_case(expected) {
        warn!("Checksum mismatch for {:?}", path);
        return Err(ArtifactError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

/// Loads the artifact once and hands out the same shared instance for the
/// rest of the process lifetime. Construct one at startup and inject it
/// wherever classification is needed; there is no hidden global.
pub struct ArtifactLoader {
    config: ArtifactConfig,
    runtime: RuntimeConfig,
    loaded: OnceLock<Arc<ModelArtifact>>,
}

impl ArtifactLoader {
    pub fn new(config: ArtifactConfig) -> Self {
        Self::with_runtime(config, RuntimeConfig::default())
    }

    pub fn with_runtime(config: ArtifactConfig, runtime: RuntimeConfig) -> Self {
        Self {
            config,
            runtime,
            loaded: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &ArtifactConfig {
        &self.config
    }

    /// Returns the cached artifact, loading it on first call. Repeated
    /// calls return the same `Arc` without re-reading from disk.
    pub fn load(&self) -> Result<Arc<ModelArtifact>, ArtifactError> {
        if let Some(artifact) = self.loaded.get() {
            return Ok(Arc::clone(artifact));
        }
        let artifact = Arc::new(ModelArtifact::load(&self.config, &self.runtime)?);
        // Two threads may race the first load; the runner-up's copy is
        // dropped and everyone settles on the stored instance.
        Ok(Arc::clone(self.loaded.get_or_init(|| artifact)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_model_file() {
        let config = ArtifactConfig::new("/nonexistent/model.onnx", "/nonexistent/tokenizer.json", 64);
        let err = ModelArtifact::load(&config, &RuntimeConfig::default()).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(_)));
    }

    #[test]
    fn test_zero_sequence_length_rejected() {
        let config = ArtifactConfig::new("model.onnx", "tokenizer.json", 0);
        let err = ModelArtifact::load(&config, &RuntimeConfig::default()).unwrap_err();
        assert!(matches!(err, ArtifactError::ZeroSequenceLength));
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.bin");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"not the advertised bytes").unwrap();

        let err = verify_checksum(&path, &"0".repeat(64)).unwrap_err();
        assert!(matches!(err, ArtifactError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_checksum_accepts_matching_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.bin");
        fs::write(&path, b"stable bytes").unwrap();

        let mut hasher = Sha256::new();
        hasher.update(b"stable bytes");
        let hash = format!("{:x}", hasher.finalize());

        assert!(verify_checksum(&path, &hash).is_ok());
        assert!(verify_checksum(&path, &hash.to_uppercase()).is_ok());
    }

    #[test]
    fn test_loader_error_is_not_cached() {
        let loader = ArtifactLoader::new(ArtifactConfig::new(
            "/nonexistent/model.onnx",
            "/nonexistent/tokenizer.json",
            64,
        ));
        assert!(loader.load().is_err());
        // A failed load must not poison the cache slot.
        assert!(loader.load().is_err());
    }
}
