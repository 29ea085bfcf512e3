//! Synheart Trust Agent - continuous implicit authentication.
//!
//! The agent silently scores how a user interacts with a device (touch
//! strokes, typed bigrams, device motion) against a behavioral profile
//! learned from that same user, and flags interaction that deviates from it.
//!
//! # Privacy Guarantees
//!
//! - **No content**: keystroke samples hold bigram timings, never text
//! - **No raw traces**: touch points are reduced to stroke features as soon
//!   as a stroke ends
//! - **Local only**: models and sample logs stay in the local data directory
//! - **Transparency**: every event, sample and decision is counted and
//!   auditable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       Synheart Trust Agent                       │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  raw events ──▶ Dispatcher ──▶ Measurement ──▶ FeatureVector     │
//! │                                                     │            │
//! │                                                     ▼            │
//! │  score history ◀── Classifier ◀── control loop ◀── DataStorage   │
//! │                                        │          (train/recent) │
//! │                                        └── flips active bin ─────┘
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use synheart_trust_agent::{Agent, AgentMode, RunConfiguration};
//!
//! let preset = RunConfiguration::touchalytics();
//! let agent = Agent::builder(AgentMode::Online)
//!     .classifier(Arc::new(preset.classifier().expect("valid preset")))
//!     .measurement(Box::new(preset.touch_measurement()))
//!     .build()
//!     .expect("agent");
//! agent.start().expect("control loop");
//!
//! // Feed events with agent.dispatch(..) and read agent.take_scores().
//! ```

pub mod agent;
pub mod classifier;
pub mod config;
pub mod core;
pub mod measurement;
pub mod oracle;
pub mod persistence;
pub mod prefab;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use agent::{
    Agent, AgentBuilder, AgentConfig, AgentError, AgentMode, AgentRunState, AgentStatus,
    StepOutcome,
};
pub use classifier::{Classifier, ClassifierError, ClassifierState, KnnClassifier, KnnConfig};
pub use config::{Config, ConfigError, EvaluationSettings};
pub use crate::core::{BinLabel, ClassLabel, DataStorage, FeatureVector};
pub use measurement::{Dispatcher, EventKind, InputRecord, Measurement, RawEvent};
pub use persistence::{FileStorage, MemoryStorage, PermanentStorage, PersistenceError};
pub use prefab::RunConfiguration;
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║           SYNHEART TRUST AGENT - PRIVACY DECLARATION             ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent checks that the person using the device is its       ║
║  owner, based on how they interact with it.                      ║
║                                                                  ║
║  ✓ WHAT WE MEASURE:                                              ║
║    • The shape and timing of touch strokes                       ║
║    • The time between two typed letters                          ║
║    • Device motion and orientation                               ║
║                                                                  ║
║  ✗ WHAT WE NEVER KEEP:                                           ║
║    • What you type (no passwords, messages, etc.)                ║
║    • The raw path of your finger on the screen                   ║
║    • What applications you use                                   ║
║    • Any screen content                                          ║
║                                                                  ║
║  All data is processed locally. The behavioral model and         ║
║  sample logs never leave the data directory.                     ║
║                                                                  ║
║  You can view collection statistics anytime with:                ║
║    synheart-trust status                                         ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privacy_declaration_contents() {
        assert!(PRIVACY_DECLARATION.contains("PRIVACY"));
        assert!(PRIVACY_DECLARATION.contains("NEVER KEEP"));
        assert!(PRIVACY_DECLARATION.contains("What you type"));
    }
}
