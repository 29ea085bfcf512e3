//! Transparency module for the trust agent.
//!
//! Counts what the agent collected and decided, so a user can audit its
//! activity without the agent keeping any raw input.

pub mod log;

pub use log::{
    create_shared_log, create_shared_log_with_persistence, SharedTransparencyLog, TransparencyLog,
    TransparencyStats,
};
