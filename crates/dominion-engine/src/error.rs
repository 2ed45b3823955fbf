//! Error types for the engine binary.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: dominion_core::ConfigError,
    },

    /// The node failed to start or stopped on a fatal error.
    #[error("node error: {source}")]
    Node {
        /// The underlying node error.
        #[from]
        source: dominion_core::NodeError,
    },
}
