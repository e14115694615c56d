//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and the driver
//! loop so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: guildhall_core::ConfigError,
    },

    /// The orchestrator failed to set up or hit a fatal state.
    #[error("orchestrator error: {source}")]
    Orchestrator {
        /// The underlying orchestrator error.
        #[from]
        source: guildhall_core::OrchestratorError,
    },

    /// The AI decision source failed.
    #[error("decision error: {source}")]
    Decision {
        /// The underlying decision error.
        #[from]
        source: guildhall_core::DecisionError,
    },

    /// The shutdown signal handler could not be installed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
