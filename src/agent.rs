//! The trust agent: event intake plus the periodic control loop.
//!
//! An [`Agent`] owns the dispatcher, the bins and the classifier of one
//! authentication session. Callers feed it raw events through
//! [`Agent::dispatch`]; once started, a background thread repeatedly
//!
//! 1. trains the classifier the first time the training bin is full,
//! 2. classifies the oldest waiting sample of the recent bin and keeps
//!    decisive results in a bounded score history,
//! 3. sends a [`EventKind::Periodic`] tick through the dispatcher,
//! 4. sleeps for the configured period, at least [`MIN_LOOP_PAUSE`].
//!
//! A training failure stops the agent for good. Stopping is terminal: build
//! a new agent to run again.

use crate::classifier::{Classifier, ClassifierError, ClassifierState};
use crate::core::feature_vector::{ClassLabel, FeatureVector};
use crate::core::storage::{BinLabel, DataStorage, StorageConfig};
use crate::measurement::{DispatchReport, Dispatcher, EventKind, Measurement, RawEvent, SampleSink};
use crate::persistence::PermanentStorage;
use crate::transparency::{create_shared_log, SharedTransparencyLog};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Shortest pause between two control loop cycles.
pub const MIN_LOOP_PAUSE: Duration = Duration::from_millis(1);

/// What the agent does with collected samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    /// Train on a collected baseline, then score live samples
    Online,
    /// Only write samples to the durable log
    Config,
    /// Score replayed samples from a recorded dataset
    Oracle,
}

impl std::fmt::Display for AgentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentMode::Online => write!(f, "online"),
            AgentMode::Config => write!(f, "config"),
            AgentMode::Oracle => write!(f, "oracle"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRunState {
    Stopped,
    Running,
}

/// User-facing progress of the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum AgentStatus {
    /// Gathering the training baseline
    CollectingBaseline { collected: usize, required: usize },
    /// Trained and producing scores
    Scoring,
    /// Writing samples to the durable log only
    Logging,
    /// Stopped, with the reason if the stop was not requested
    Stopped { reason: Option<String> },
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::CollectingBaseline {
                collected,
                required,
            } => write!(f, "collecting baseline ({collected}/{required})"),
            AgentStatus::Scoring => write!(f, "scoring"),
            AgentStatus::Logging => write!(f, "logging samples"),
            AgentStatus::Stopped { reason: None } => write!(f, "stopped"),
            AgentStatus::Stopped {
                reason: Some(reason),
            } => write!(f, "stopped: {reason}"),
        }
    }
}

/// Tunables of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Pause between control loop cycles
    #[serde(rename = "period_ms", with = "crate::config::duration_ms")]
    pub period: Duration,
    /// Training bin size that triggers training
    pub training_threshold: usize,
    /// Maximum scores kept between two [`Agent::take_scores`] calls
    pub score_history: usize,
    /// Maximum samples waiting in the recent bin
    pub recent_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(5000),
            training_threshold: 8,
            score_history: 10,
            recent_capacity: 10,
        }
    }
}

impl AgentConfig {
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            recent_capacity: self.recent_capacity,
            training_threshold: self.training_threshold,
        }
    }
}

/// Agent errors.
#[derive(Debug)]
pub enum AgentError {
    /// `start` on an agent that was already started or stopped
    AlreadyStarted,
    /// The agent has stopped and cannot cycle again
    Stopped(Option<String>),
    /// Config mode agents have no control loop
    LoopDisabled,
    /// Online and Oracle agents need a classifier
    MissingClassifier,
    /// Config mode agents need a durable log
    MissingLog,
    /// Online and Oracle agents need a training threshold of at least one
    ZeroTrainingThreshold,
    /// `step` while the control loop thread is running
    LoopRunning,
    /// The classifier failed to train
    Training(ClassifierError),
    /// The control loop thread could not be spawned
    Spawn(std::io::Error),
    /// The control loop thread panicked
    LoopPanicked,
}

impl std::fmt::Display for AgentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentError::AlreadyStarted => write!(f, "agent was already started"),
            AgentError::Stopped(None) => write!(f, "agent is stopped"),
            AgentError::Stopped(Some(reason)) => write!(f, "agent is stopped: {reason}"),
            AgentError::LoopDisabled => write!(f, "control loop is disabled in config mode"),
            AgentError::MissingClassifier => write!(f, "no classifier configured"),
            AgentError::MissingLog => write!(f, "config mode requires a sample log"),
            AgentError::ZeroTrainingThreshold => {
                write!(f, "training threshold must be at least one sample")
            }
            AgentError::LoopRunning => write!(f, "control loop is running on its own thread"),
            AgentError::Training(e) => write!(f, "training failed: {e}"),
            AgentError::Spawn(e) => write!(f, "failed to spawn control loop: {e}"),
            AgentError::LoopPanicked => write!(f, "control loop panicked"),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AgentError::Training(e) => Some(e),
            AgentError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

/// What one control loop cycle did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    /// The classifier was trained during this cycle
    pub trained: bool,
    /// Label given to the sample classified in this cycle
    pub classified: Option<ClassLabel>,
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    mode: AgentMode,
    config: AgentConfig,
    classifier: Option<Arc<dyn Classifier>>,
    log: Option<(Arc<dyn PermanentStorage>, String)>,
    measurements: Vec<Box<dyn Measurement>>,
    transparency: Option<SharedTransparencyLog>,
}

impl AgentBuilder {
    pub fn new(mode: AgentMode) -> Self {
        Self {
            mode,
            config: AgentConfig::default(),
            classifier: None,
            log: None,
            measurements: Vec::new(),
            transparency: None,
        }
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Durable log that Config mode writes samples to.
    pub fn log_to(mut self, storage: Arc<dyn PermanentStorage>, log_name: impl Into<String>) -> Self {
        self.log = Some((storage, log_name.into()));
        self
    }

    /// Install a measurement for every kind it subscribes to.
    pub fn measurement(mut self, measurement: Box<dyn Measurement>) -> Self {
        self.measurements.push(measurement);
        self
    }

    pub fn transparency(mut self, log: SharedTransparencyLog) -> Self {
        self.transparency = Some(log);
        self
    }

    pub fn build(self) -> Result<Agent, AgentError> {
        if self.mode != AgentMode::Config && self.config.training_threshold == 0 {
            return Err(AgentError::ZeroTrainingThreshold);
        }
        let storage = Arc::new(DataStorage::new(self.config.storage_config()));
        let transparency = self.transparency.unwrap_or_else(create_shared_log);

        let sink = match self.mode {
            AgentMode::Config => {
                let (log, log_name) = self.log.ok_or(AgentError::MissingLog)?;
                SampleSink::Log {
                    storage: log,
                    log_name,
                }
            }
            AgentMode::Online | AgentMode::Oracle => {
                if self.classifier.is_none() {
                    return Err(AgentError::MissingClassifier);
                }
                SampleSink::Store(storage.clone())
            }
        };

        let mut dispatcher = Dispatcher::new(sink).with_transparency(transparency.clone());
        for measurement in self.measurements {
            dispatcher.install(measurement);
        }

        // A restored model skips the baseline phase.
        let restored = self.mode != AgentMode::Config
            && self
                .classifier
                .as_ref()
                .is_some_and(|c| c.state() == ClassifierState::Trained);
        if restored {
            info!("classifier already trained, scoring from the first sample");
            storage.set_active_bin(BinLabel::Recent);
        }

        let (wake_tx, wake_rx) = bounded(1);
        let shared = Arc::new(Shared {
            instance_id: Uuid::new_v4(),
            mode: self.mode,
            config: self.config,
            storage,
            dispatcher: Mutex::new(dispatcher),
            classifier: self.classifier,
            run: Mutex::new(RunControl::default()),
            training: Mutex::new(()),
            training_triggered: AtomicBool::new(restored),
            scores: Mutex::new(VecDeque::new()),
            outcomes: Mutex::new(Vec::new()),
            wake_tx,
            wake_rx,
            transparency,
        });

        Ok(Agent {
            shared,
            handle: Mutex::new(None),
        })
    }
}

#[derive(Debug)]
struct RunControl {
    state: AgentRunState,
    started: bool,
    /// Set once the agent has stopped for good
    terminated: bool,
    stop_reason: Option<String>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self {
            state: AgentRunState::Stopped,
            started: false,
            terminated: false,
            stop_reason: None,
        }
    }
}

struct Shared {
    instance_id: Uuid,
    mode: AgentMode,
    config: AgentConfig,
    storage: Arc<DataStorage>,
    dispatcher: Mutex<Dispatcher>,
    classifier: Option<Arc<dyn Classifier>>,
    run: Mutex<RunControl>,
    /// Held from the quota check until training returns
    training: Mutex<()>,
    training_triggered: AtomicBool,
    scores: Mutex<VecDeque<ClassLabel>>,
    /// Every classification result, neutral ones included (Oracle mode only)
    outcomes: Mutex<Vec<ClassLabel>>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    transparency: SharedTransparencyLog,
}

impl Shared {
    fn is_running(&self) -> bool {
        self.run.lock().state == AgentRunState::Running
    }

    fn terminate(&self, reason: Option<String>) {
        let mut run = self.run.lock();
        run.state = AgentRunState::Stopped;
        run.terminated = true;
        if run.stop_reason.is_none() {
            run.stop_reason = reason;
        }
    }

    fn cycle(&self) -> Result<StepOutcome, AgentError> {
        let Some(classifier) = self.classifier.as_ref() else {
            return Err(AgentError::MissingClassifier);
        };
        let mut outcome = StepOutcome::default();

        {
            let _training = self.training.lock();
            if !self.training_triggered.load(Ordering::SeqCst)
                && self.storage.has_training_quota()
            {
                self.train(classifier.as_ref())?;
                outcome.trained = true;
            }
        }

        if self.training_triggered.load(Ordering::SeqCst) {
            if let Some(sample) = self.storage.take_most_recent() {
                outcome.classified = self.score(classifier.as_ref(), &sample);
            }
        }

        self.dispatcher.lock().dispatch(EventKind::Periodic, &RawEvent::Tick);
        Ok(outcome)
    }

    fn train(&self, classifier: &dyn Classifier) -> Result<(), AgentError> {
        let mut samples = self.storage.snapshot(BinLabel::Train).unwrap_or_default();
        let baseline = samples.len();
        if self.mode == AgentMode::Online {
            samples.extend(self.dispatcher.lock().default_negative_samples());
        }
        info!(
            classifier = classifier.name(),
            baseline,
            total = samples.len(),
            "training triggered"
        );

        if let Err(e) = classifier.train(samples) {
            error!(classifier = classifier.name(), error = %e, "training failed, stopping agent");
            self.terminate(Some(format!("training failed: {e}")));
            return Err(AgentError::Training(e));
        }
        self.training_triggered.store(true, Ordering::SeqCst);
        self.transparency.record_training();
        Ok(())
    }

    fn score(&self, classifier: &dyn Classifier, sample: &FeatureVector) -> Option<ClassLabel> {
        let result = classifier.classify(sample);
        if self.mode == AgentMode::Oracle {
            let recorded = result.as_ref().ok().copied().unwrap_or(ClassLabel::Unknown);
            self.outcomes.lock().push(recorded);
        }
        let label = match result {
            Ok(label) => label,
            Err(e) => {
                warn!(error = %e, "classification failed");
                return None;
            }
        };
        self.transparency.record_decision(label);
        debug!(label = %label, "sample classified");

        if label.is_decisive() && self.config.score_history > 0 {
            let mut scores = self.scores.lock();
            while scores.len() >= self.config.score_history {
                scores.pop_front();
            }
            scores.push_back(label);
        }
        Some(label)
    }

    /// Sleep for one period, returning early when woken by `stop`.
    fn pause(&self) {
        let _ = self
            .wake_rx
            .recv_timeout(self.config.period.max(MIN_LOOP_PAUSE));
    }
}

fn run_loop(shared: Arc<Shared>) {
    info!(
        instance = %shared.instance_id,
        mode = %shared.mode,
        period_ms = shared.config.period.as_millis() as u64,
        "control loop started"
    );
    while shared.is_running() {
        if shared.cycle().is_err() {
            break;
        }
        shared.pause();
    }
    info!("control loop exited");
}

/// Handle to one running authentication session.
pub struct Agent {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Agent {
    pub fn builder(mode: AgentMode) -> AgentBuilder {
        AgentBuilder::new(mode)
    }

    /// Identifier of this agent, distinct for every build.
    pub fn instance_id(&self) -> Uuid {
        self.shared.instance_id
    }

    pub fn mode(&self) -> AgentMode {
        self.shared.mode
    }

    pub fn config(&self) -> &AgentConfig {
        &self.shared.config
    }

    /// Start the control loop on its own thread.
    ///
    /// In Config mode there is no loop: the call succeeds and the agent only
    /// logs the samples it is fed.
    pub fn start(&self) -> Result<(), AgentError> {
        {
            let mut run = self.shared.run.lock();
            if run.started || run.terminated {
                return Err(AgentError::AlreadyStarted);
            }
            run.started = true;
            if self.shared.mode == AgentMode::Config {
                info!("config mode, samples are logged without scoring");
                return Ok(());
            }
            run.state = AgentRunState::Running;
        }

        let shared = self.shared.clone();
        let spawned = std::thread::Builder::new()
            .name("trust-agent-loop".to_string())
            .spawn(move || run_loop(shared));

        match spawned {
            Ok(handle) => {
                *self.handle.lock() = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.terminate(Some(format!("spawn failed: {e}")));
                Err(AgentError::Spawn(e))
            }
        }
    }

    /// Ask the control loop to stop. A cycle in progress runs to completion.
    pub fn stop(&self) {
        self.shared.terminate(None);
        let _ = self.shared.wake_tx.try_send(());
    }

    /// Wait for the control loop thread to exit.
    pub fn join(&self) -> Result<(), AgentError> {
        let handle = self.handle.lock().take();
        match handle {
            Some(handle) => handle.join().map_err(|_| AgentError::LoopPanicked),
            None => Ok(()),
        }
    }

    /// Run one control loop cycle on the calling thread.
    ///
    /// Refused once [`Agent::start`] has the loop running on its own thread.
    pub fn step(&self) -> Result<StepOutcome, AgentError> {
        if self.shared.mode == AgentMode::Config {
            return Err(AgentError::LoopDisabled);
        }
        {
            let run = self.shared.run.lock();
            if run.terminated {
                return Err(AgentError::Stopped(run.stop_reason.clone()));
            }
            if run.state == AgentRunState::Running {
                return Err(AgentError::LoopRunning);
            }
        }
        self.shared.cycle()
    }

    /// Feed one raw event to the measurements.
    pub fn dispatch(&self, kind: EventKind, event: &RawEvent) -> DispatchReport {
        self.shared.dispatcher.lock().dispatch(kind, event)
    }

    /// Drain the score history.
    pub fn take_scores(&self) -> Vec<ClassLabel> {
        self.shared.scores.lock().drain(..).collect()
    }

    /// Drain every classification result since the last call, neutral ones
    /// included, in the order the samples were classified. Only Oracle
    /// agents record them.
    pub fn take_outcomes(&self) -> Vec<ClassLabel> {
        std::mem::take(&mut *self.shared.outcomes.lock())
    }

    pub fn run_state(&self) -> AgentRunState {
        self.shared.run.lock().state
    }

    pub fn is_training_triggered(&self) -> bool {
        self.shared.training_triggered.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> AgentStatus {
        {
            let run = self.shared.run.lock();
            if run.terminated {
                return AgentStatus::Stopped {
                    reason: run.stop_reason.clone(),
                };
            }
        }
        if self.shared.mode == AgentMode::Config {
            AgentStatus::Logging
        } else if self.is_training_triggered() {
            AgentStatus::Scoring
        } else {
            AgentStatus::CollectingBaseline {
                collected: self.shared.storage.bin_size(BinLabel::Train),
                required: self.shared.config.training_threshold,
            }
        }
    }

    pub fn storage(&self) -> &Arc<DataStorage> {
        &self.shared.storage
    }

    pub fn classifier(&self) -> Option<&Arc<dyn Classifier>> {
        self.shared.classifier.as_ref()
    }

    pub fn transparency(&self) -> &SharedTransparencyLog {
        &self.shared.transparency
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("instance_id", &self.shared.instance_id)
            .field("mode", &self.shared.mode)
            .field("run_state", &self.run_state())
            .field("training_triggered", &self.is_training_triggered())
            .finish()
    }
}
