//! Configuration for the trust agent.

use crate::agent::AgentConfig;
use crate::classifier::KnnConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the trust agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control loop and bin tunables
    pub agent: AgentConfig,

    /// Parameters for a classifier that has no saved model
    pub classifier: KnnConfig,

    /// Directory holding the saved model, sample logs and transparency stats
    pub data_path: PathBuf,

    /// Name the classifier model is saved under
    pub model_name: String,

    /// Name of the sample log written in log-only mode
    pub touch_log_name: String,

    /// Offline evaluation settings
    pub evaluation: EvaluationSettings,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-trust-agent");

        Self {
            agent: AgentConfig::default(),
            classifier: KnnConfig::default(),
            data_path: data_dir,
            model_name: "trust_classifier_model".to_string(),
            touch_log_name: "touch_samples".to_string(),
            evaluation: EvaluationSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-trust-agent")
            .join("config.json")
    }

    /// Path of the persisted transparency counters.
    pub fn transparency_path(&self) -> PathBuf {
        self.data_path.join("transparency.json")
    }

    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path).map_err(|e| ConfigError::IoError(e.to_string()))
    }
}

/// Where to find a recorded dataset and how to split it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSettings {
    pub dataset_path: PathBuf,
    /// Files needed before an evaluation runs
    pub min_data_sources: usize,
    pub touch_prefix: String,
    pub keystroke_prefix: String,
    /// Lines a touch file needs to count as a source
    pub min_swipes: usize,
    /// Lines a keystroke file needs to count as a source
    pub min_keystrokes: usize,
    pub train_test_ratio: f64,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("./res/"),
            min_data_sources: 4,
            touch_prefix: "touch_samples".to_string(),
            keystroke_prefix: "keystroke_samples".to_string(),
            min_swipes: 20,
            min_keystrokes: 50,
            train_test_ratio: 0.5,
        }
    }
}

impl EvaluationSettings {
    /// Read `key=value` lines on top of the defaults.
    ///
    /// Blank lines and lines starting with `#` are skipped. Unknown keys are
    /// ignored with a warning.
    pub fn from_key_values(text: &str) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        for line in text.lines() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .filter(|(k, v)| !k.is_empty() && !v.is_empty())
                .ok_or_else(|| ConfigError::ParseError(format!("failed to parse line: {line}")))?;
            settings.apply(key, value)?;
        }
        Ok(settings)
    }

    pub fn load_key_values(path: &Path) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_key_values(&text)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "dataset_path" => self.dataset_path = PathBuf::from(value),
            "min_data_sources" => self.min_data_sources = parse_value(key, value)?,
            "touch_prefix" => self.touch_prefix = value.to_string(),
            "keystroke_prefix" => self.keystroke_prefix = value.to_string(),
            "min_swipes" => self.min_swipes = parse_value(key, value)?,
            "min_keystrokes" => self.min_keystrokes = parse_value(key, value)?,
            "train_test_ratio" => self.train_test_ratio = parse_value(key, value)?,
            _ => tracing::warn!(key, "unsupported evaluation setting ignored"),
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::ParseError(format!("invalid value for {key}: {value}")))
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agent.period, Duration::from_millis(5000));
        assert_eq!(config.agent.training_threshold, 8);
        assert_eq!(config.agent.score_history, 10);
        assert_eq!(config.classifier, KnnConfig { k: 7, num_features: 29 });
        assert_eq!(config.model_name, "trust_classifier_model");
        assert_eq!(config.evaluation.min_data_sources, 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"agent": {"period_ms": 250}, "model_name": "m"}"#).unwrap();
        assert_eq!(config.agent.period, Duration::from_millis(250));
        assert_eq!(config.agent.recent_capacity, 10);
        assert_eq!(config.model_name, "m");
        assert_eq!(config.touch_log_name, "touch_samples");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("trust-config-{}", uuid::Uuid::new_v4()))
            .join("config.json");
        let mut config = Config::default();
        config.agent.training_threshold = 3;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("trust-config-does-not-exist.json");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_key_value_settings() {
        let text = "# oracle\n\
                    dataset_path = /data/touch\n\
                    \n\
                    min_swipes=30\n\
                    train_test_ratio=0.6\n\
                    colour=blue\n";
        let settings = EvaluationSettings::from_key_values(text).unwrap();
        assert_eq!(settings.dataset_path, PathBuf::from("/data/touch"));
        assert_eq!(settings.min_swipes, 30);
        assert_eq!(settings.train_test_ratio, 0.6);
        assert_eq!(settings.min_keystrokes, 50);
    }

    #[test]
    fn test_key_value_parse_errors() {
        assert!(matches!(
            EvaluationSettings::from_key_values("min_swipes="),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            EvaluationSettings::from_key_values("=4"),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            EvaluationSettings::from_key_values("min_swipes=many"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
