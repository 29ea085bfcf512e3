//! Labelled bins of feature vectors.
//!
//! Samples flow into whichever bin is active. While a baseline is being
//! collected the active bin is [`BinLabel::Train`]; as soon as the training
//! bin reaches the training threshold the active bin flips to
//! [`BinLabel::Recent`], which behaves as a bounded FIFO queue drained by the
//! control loop.
//!
//! A single lock guards every bin and the active-bin pointer, so the
//! add / size check / flip sequence is atomic to other threads.

use crate::core::feature_vector::FeatureVector;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Names of the bins owned by [`DataStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinLabel {
    /// Baseline samples used to train the classifier
    Train,
    /// Recently collected samples waiting to be scored
    Recent,
}

impl std::fmt::Display for BinLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinLabel::Train => write!(f, "train"),
            BinLabel::Recent => write!(f, "recent"),
        }
    }
}

/// Storage errors.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// The bin has never been written to
    MissingBin(BinLabel),
    /// Index past the end of a bin
    OutOfBounds { bin: BinLabel, index: usize, len: usize },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::MissingBin(bin) => write!(f, "bin '{bin}' does not exist"),
            StorageError::OutOfBounds { bin, index, len } => {
                write!(f, "index {index} out of bounds for bin '{bin}' of size {len}")
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Capacity policy for the bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Maximum samples kept in the recent bin before the oldest is evicted
    pub recent_capacity: usize,
    /// Training bin size at which the active bin flips to recent
    pub training_threshold: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            recent_capacity: 10,
            training_threshold: 8,
        }
    }
}

#[derive(Debug)]
struct Bins {
    bins: HashMap<BinLabel, VecDeque<FeatureVector>>,
    active: BinLabel,
    recent_capacity: usize,
    training_threshold: usize,
}

impl Bins {
    fn size(&self, bin: BinLabel) -> usize {
        self.bins.get(&bin).map_or(0, VecDeque::len)
    }

    fn push(&mut self, bin: BinLabel, fv: FeatureVector) {
        let entries = self.bins.entry(bin).or_default();
        entries.push_back(fv);

        match bin {
            BinLabel::Recent => {
                while entries.len() > self.recent_capacity {
                    entries.pop_front();
                }
            }
            BinLabel::Train => {
                if entries.len() >= self.training_threshold && self.active != BinLabel::Recent {
                    tracing::debug!(
                        size = entries.len(),
                        threshold = self.training_threshold,
                        "training bin full, routing new samples to recent bin"
                    );
                    self.active = BinLabel::Recent;
                }
            }
        }
    }
}

/// Thread-safe owner of the training and recent bins.
#[derive(Debug)]
pub struct DataStorage {
    inner: Mutex<Bins>,
}

impl DataStorage {
    /// Create empty storage. The active bin starts as `Train` unless the
    /// threshold is zero, in which case there is no baseline to collect.
    pub fn new(config: StorageConfig) -> Self {
        let active = if config.training_threshold == 0 {
            BinLabel::Recent
        } else {
            BinLabel::Train
        };
        Self {
            inner: Mutex::new(Bins {
                bins: HashMap::new(),
                active,
                recent_capacity: config.recent_capacity,
                training_threshold: config.training_threshold,
            }),
        }
    }

    /// Append to a specific bin, applying eviction and the auto-flip rule.
    pub fn add(&self, bin: BinLabel, fv: FeatureVector) {
        self.inner.lock().push(bin, fv);
    }

    /// Append to the currently active bin. Returns the bin used.
    pub fn add_active(&self, fv: FeatureVector) -> BinLabel {
        let mut bins = self.inner.lock();
        let bin = bins.active;
        bins.push(bin, fv);
        bin
    }

    /// Remove and return the oldest sample in the recent bin.
    pub fn take_most_recent(&self) -> Option<FeatureVector> {
        self.inner
            .lock()
            .bins
            .get_mut(&BinLabel::Recent)
            .and_then(VecDeque::pop_front)
    }

    /// Number of samples in a bin; zero for a bin never written to.
    pub fn bin_size(&self, bin: BinLabel) -> usize {
        self.inner.lock().size(bin)
    }

    /// Whether the training bin holds at least the threshold.
    pub fn has_training_quota(&self) -> bool {
        let bins = self.inner.lock();
        bins.size(BinLabel::Train) >= bins.training_threshold
    }

    /// Empty an existing bin.
    pub fn clear(&self, bin: BinLabel) -> Result<(), StorageError> {
        self.inner
            .lock()
            .bins
            .get_mut(&bin)
            .map(VecDeque::clear)
            .ok_or(StorageError::MissingBin(bin))
    }

    /// Copy of the sample at `index` in `bin`.
    pub fn get(&self, bin: BinLabel, index: usize) -> Result<FeatureVector, StorageError> {
        let bins = self.inner.lock();
        let entries = bins.bins.get(&bin).ok_or(StorageError::MissingBin(bin))?;
        entries.get(index).cloned().ok_or(StorageError::OutOfBounds {
            bin,
            index,
            len: entries.len(),
        })
    }

    /// Copy of every sample in `bin`, oldest first.
    pub fn snapshot(&self, bin: BinLabel) -> Result<Vec<FeatureVector>, StorageError> {
        self.inner
            .lock()
            .bins
            .get(&bin)
            .map(|entries| entries.iter().cloned().collect())
            .ok_or(StorageError::MissingBin(bin))
    }

    pub fn active_bin(&self) -> BinLabel {
        self.inner.lock().active
    }

    /// Route new samples to `bin` until the next flip.
    pub fn set_active_bin(&self, bin: BinLabel) {
        self.inner.lock().active = bin;
    }

    /// Change the recent-bin capacity, evicting immediately if needed.
    pub fn set_recent_capacity(&self, capacity: usize) {
        let mut bins = self.inner.lock();
        bins.recent_capacity = capacity;
        if let Some(recent) = bins.bins.get_mut(&BinLabel::Recent) {
            while recent.len() > capacity {
                recent.pop_front();
            }
        }
    }

    pub fn training_threshold(&self) -> usize {
        self.inner.lock().training_threshold
    }
}
