//! Durable storage for trained models and sample logs.
//!
//! Storage backends implement [`PermanentStorage`]. The agent only needs
//! three operations: save a model blob, load it back, and append one line
//! to a named log. [`FileStorage`] keeps everything in a data directory;
//! [`MemoryStorage`] keeps it in process.

use crate::classifier::{ClassifierState, KnnClassifier, KnnConfig, ModelSnapshot};
use crate::classifier::{Classifier, ClassifierError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const MODEL_EXTENSION: &str = "model";
const LOG_EXTENSION: &str = "log";

/// Persistence errors.
#[derive(Debug)]
pub enum PersistenceError {
    /// No model or log stored under the name
    NotFound(String),
    /// Underlying I/O failure
    Io(std::io::Error),
    /// The stored blob could not be decoded
    Corrupt(String),
    /// The model could not be encoded
    Encode(String),
    /// Names must be non-empty and must not contain path separators
    InvalidName(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::NotFound(name) => write!(f, "nothing stored under '{name}'"),
            PersistenceError::Io(e) => write!(f, "I/O error: {e}"),
            PersistenceError::Corrupt(msg) => write!(f, "corrupt model: {msg}"),
            PersistenceError::Encode(msg) => write!(f, "failed to encode model: {msg}"),
            PersistenceError::InvalidName(name) => write!(f, "invalid storage name '{name}'"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        PersistenceError::Io(e)
    }
}

/// Backend for models and logs.
pub trait PermanentStorage: Send + Sync {
    fn save_model(&self, name: &str, blob: &[u8]) -> Result<(), PersistenceError>;

    fn load_model(&self, name: &str) -> Result<Vec<u8>, PersistenceError>;

    /// Append one line to the named log, creating it if needed.
    fn append_log(&self, name: &str, line: &str) -> Result<(), PersistenceError>;

    /// Every line of the named log, oldest first.
    fn read_log(&self, name: &str) -> Result<Vec<String>, PersistenceError>;
}

fn check_name(name: &str) -> Result<(), PersistenceError> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(PersistenceError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// One file per model and per log inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir`, creating it if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{MODEL_EXTENSION}"))
    }

    pub fn log_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{LOG_EXTENSION}"))
    }
}

impl PermanentStorage for FileStorage {
    fn save_model(&self, name: &str, blob: &[u8]) -> Result<(), PersistenceError> {
        check_name(name)?;
        let path = self.model_path(name);
        // Write then rename so a crash never leaves a half-written model.
        let tmp = path.with_extension(format!("{MODEL_EXTENSION}.tmp"));
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load_model(&self, name: &str) -> Result<Vec<u8>, PersistenceError> {
        check_name(name)?;
        match std::fs::read(self.model_path(name)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PersistenceError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn append_log(&self, name: &str, line: &str) -> Result<(), PersistenceError> {
        check_name(name)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(name))?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn read_log(&self, name: &str) -> Result<Vec<String>, PersistenceError> {
        check_name(name)?;
        match std::fs::read_to_string(self.log_path(name)) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PersistenceError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    models: Mutex<HashMap<String, Vec<u8>>>,
    logs: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PermanentStorage for MemoryStorage {
    fn save_model(&self, name: &str, blob: &[u8]) -> Result<(), PersistenceError> {
        check_name(name)?;
        self.models.lock().insert(name.to_string(), blob.to_vec());
        Ok(())
    }

    fn load_model(&self, name: &str) -> Result<Vec<u8>, PersistenceError> {
        self.models
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(name.to_string()))
    }

    fn append_log(&self, name: &str, line: &str) -> Result<(), PersistenceError> {
        check_name(name)?;
        self.logs
            .lock()
            .entry(name.to_string())
            .or_default()
            .push(line.to_string());
        Ok(())
    }

    fn read_log(&self, name: &str) -> Result<Vec<String>, PersistenceError> {
        self.logs
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(name.to_string()))
    }
}

/// Persist a classifier's model. Returns false when there is nothing to
/// save because the classifier is not trained.
pub fn save_classifier(
    storage: &dyn PermanentStorage,
    name: &str,
    classifier: &dyn Classifier,
) -> Result<bool, PersistenceError> {
    let Some(snapshot) = classifier.model_snapshot() else {
        return Ok(false);
    };
    let bytes = snapshot
        .to_bytes()
        .map_err(|e| PersistenceError::Encode(e.to_string()))?;
    storage.save_model(name, &bytes)?;
    tracing::info!(model = name, bytes = bytes.len(), "model saved");
    Ok(true)
}

/// Load a stored model snapshot.
pub fn load_snapshot(
    storage: &dyn PermanentStorage,
    name: &str,
) -> Result<ModelSnapshot, PersistenceError> {
    let bytes = storage.load_model(name)?;
    ModelSnapshot::from_bytes(&bytes).map_err(|e| PersistenceError::Corrupt(e.to_string()))
}

/// Restore a KNN classifier from storage.
///
/// A missing or unreadable model is not an error: the classifier simply
/// starts untrained with `fallback` parameters. Only invalid `fallback`
/// parameters fail.
pub fn restore_knn(
    storage: &dyn PermanentStorage,
    name: &str,
    fallback: KnnConfig,
) -> Result<KnnClassifier, ClassifierError> {
    match load_snapshot(storage, name) {
        Ok(snapshot) => match KnnClassifier::from_snapshot(snapshot) {
            Ok(knn) => {
                tracing::info!(model = name, samples = knn.sample_count(), "model restored");
                return Ok(knn);
            }
            Err(e) => tracing::warn!(model = name, error = %e, "stored model rejected"),
        },
        Err(PersistenceError::NotFound(_)) => {
            tracing::info!(model = name, "no stored model, starting untrained");
        }
        Err(e) => tracing::warn!(model = name, error = %e, "could not load stored model"),
    }

    let knn = KnnClassifier::new(fallback)?;
    debug_assert_eq!(knn.state(), ClassifierState::NotTrained);
    Ok(knn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feature_vector::{ClassLabel, FeatureVector};

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("trust-persistence-{tag}-{}", uuid::Uuid::new_v4()))
    }

    fn trained_knn() -> KnnClassifier {
        let knn = KnnClassifier::new(KnnConfig { k: 1, num_features: 2 }).unwrap();
        knn.train(vec![
            FeatureVector::new(vec![0.0, 0.0], ClassLabel::Positive),
            FeatureVector::new(vec![9.0, 9.0], ClassLabel::Negative),
        ])
        .unwrap();
        knn
    }

    #[test]
    fn test_file_storage_models_and_logs() {
        let dir = temp_dir("files");
        let storage = FileStorage::new(&dir).unwrap();

        storage.save_model("m", b"blob").unwrap();
        assert_eq!(storage.load_model("m").unwrap(), b"blob");
        assert!(matches!(
            storage.load_model("other"),
            Err(PersistenceError::NotFound(_))
        ));

        storage.append_log("touch", "1;1:1.0").unwrap();
        storage.append_log("touch", "-1;1:2.0").unwrap();
        assert_eq!(storage.read_log("touch").unwrap(), vec!["1;1:1.0", "-1;1:2.0"]);

        assert!(matches!(
            storage.append_log("../escape", "x"),
            Err(PersistenceError::InvalidName(_))
        ));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert!(storage.read_log("none").is_err());
        storage.append_log("log", "a").unwrap();
        assert_eq!(storage.read_log("log").unwrap(), vec!["a"]);
    }

    #[test]
    fn test_save_and_restore_classifier() {
        let storage = MemoryStorage::new();
        let knn = trained_knn();
        assert!(save_classifier(&storage, "model", &knn).unwrap());

        let restored = restore_knn(&storage, "model", KnnConfig::default()).unwrap();
        assert_eq!(restored.state(), ClassifierState::Trained);
        assert_eq!(restored.config().num_features, 2);
    }

    #[test]
    fn test_untrained_classifier_is_not_saved() {
        let storage = MemoryStorage::new();
        let knn = KnnClassifier::new(KnnConfig::default()).unwrap();
        assert!(!save_classifier(&storage, "model", &knn).unwrap());
        assert!(storage.load_model("model").is_err());
    }

    #[test]
    fn test_missing_or_corrupt_model_starts_untrained() {
        let storage = MemoryStorage::new();
        let knn = restore_knn(&storage, "model", KnnConfig::default()).unwrap();
        assert_eq!(knn.state(), ClassifierState::NotTrained);

        storage.save_model("model", b"not json").unwrap();
        assert!(matches!(
            load_snapshot(&storage, "model"),
            Err(PersistenceError::Corrupt(_))
        ));
        let knn = restore_knn(&storage, "model", KnnConfig::default()).unwrap();
        assert_eq!(knn.state(), ClassifierState::NotTrained);
    }
}
