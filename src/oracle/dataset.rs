//! Discovery and loading of recorded sample files.

use super::OracleError;
use crate::config::EvaluationSettings;
use crate::core::deflate::parse_lines;
use crate::core::feature_vector::FeatureVector;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Files in a dataset directory that hold enough samples to be used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetScan {
    /// Touch sample files, sorted by name
    pub touch_files: Vec<PathBuf>,
    /// Keystroke sample files, sorted by name
    pub keystroke_files: Vec<PathBuf>,
}

impl DatasetScan {
    pub fn is_empty(&self) -> bool {
        self.touch_files.is_empty() && self.keystroke_files.is_empty()
    }
}

/// Samples read from one file, i.e. one user.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    pub path: PathBuf,
    pub samples: Vec<FeatureVector>,
    /// Lines that could not be parsed
    pub skipped: usize,
}

/// List the sample files under `settings.dataset_path`.
///
/// A file counts when its name starts with the touch or keystroke prefix
/// and it has at least `min_swipes` or `min_keystrokes` non-blank lines.
/// Subdirectories are ignored.
pub fn scan(settings: &EvaluationSettings) -> Result<DatasetScan, OracleError> {
    let dir = &settings.dataset_path;
    info!(path = %dir.display(), "scanning for dataset");
    let entries = std::fs::read_dir(dir).map_err(|e| OracleError::io(dir, e))?;

    let mut scan = DatasetScan::default();
    for entry in entries {
        let entry = entry.map_err(|e| OracleError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();

        if name.starts_with(&settings.touch_prefix) {
            if count_lines(&path)? >= settings.min_swipes {
                scan.touch_files.push(path);
            }
        } else if name.starts_with(&settings.keystroke_prefix)
            && count_lines(&path)? >= settings.min_keystrokes
        {
            scan.keystroke_files.push(path);
        }
    }

    scan.touch_files.sort();
    scan.keystroke_files.sort();
    info!(
        touch = scan.touch_files.len(),
        keystroke = scan.keystroke_files.len(),
        "dataset scanned"
    );
    Ok(scan)
}

fn count_lines(path: &Path) -> Result<usize, OracleError> {
    let text = std::fs::read_to_string(path).map_err(|e| OracleError::io(path, e))?;
    Ok(text.lines().filter(|l| !l.trim().is_empty()).count())
}

/// Parse a deflated sample file into vectors of `num_features` features.
/// Malformed lines are skipped with a warning.
pub fn load_source(path: &Path, num_features: usize) -> Result<DataSource, OracleError> {
    let text = std::fs::read_to_string(path).map_err(|e| OracleError::io(path, e))?;
    let (samples, failures) = parse_lines(&text, num_features);
    for (line, error) in &failures {
        warn!(file = %path.display(), line, error = %error, "skipping malformed sample");
    }
    Ok(DataSource {
        path: path.to_path_buf(),
        samples,
        skipped: failures.len(),
    })
}

pub fn load_sources(paths: &[PathBuf], num_features: usize) -> Result<Vec<DataSource>, OracleError> {
    paths.iter().map(|p| load_source(p, num_features)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deflate::deflate;
    use crate::core::feature_vector::ClassLabel;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trust-dataset-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_samples(path: &Path, count: usize) {
        let lines: Vec<String> = (0..count)
            .map(|i| deflate(&FeatureVector::new(vec![i as f64, 1.0], ClassLabel::Positive)))
            .collect();
        std::fs::write(path, lines.join("\n")).unwrap();
    }

    #[test]
    fn test_scan_filters_by_prefix_and_size() {
        let dir = temp_dir();
        write_samples(&dir.join("touch_samples_b.log"), 5);
        write_samples(&dir.join("touch_samples_a.log"), 3);
        write_samples(&dir.join("touch_samples_short.log"), 2);
        write_samples(&dir.join("keystroke_samples_a.log"), 4);
        write_samples(&dir.join("notes.txt"), 10);
        std::fs::create_dir_all(dir.join("touch_samples_dir")).unwrap();

        let settings = EvaluationSettings {
            dataset_path: dir.clone(),
            min_swipes: 3,
            min_keystrokes: 5,
            ..EvaluationSettings::default()
        };
        let scan = scan(&settings).unwrap();
        assert_eq!(
            scan.touch_files,
            vec![dir.join("touch_samples_a.log"), dir.join("touch_samples_b.log")]
        );
        assert!(scan.keystroke_files.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let settings = EvaluationSettings {
            dataset_path: std::env::temp_dir().join("trust-dataset-missing-dir"),
            ..EvaluationSettings::default()
        };
        assert!(matches!(scan(&settings), Err(OracleError::Io { .. })));
    }

    #[test]
    fn test_load_skips_malformed_lines() {
        let dir = temp_dir();
        let path = dir.join("touch_samples_x.log");
        std::fs::write(&path, "1;1:0.5;2:1.5\nnot a sample\n\n-1;2:3.0\n").unwrap();

        let source = load_source(&path, 2).unwrap();
        assert_eq!(source.samples.len(), 2);
        assert_eq!(source.skipped, 1);
        assert_eq!(source.samples[1].as_slice(), &[0.0, 3.0]);
        assert_eq!(source.samples[1].label(), ClassLabel::Negative);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
