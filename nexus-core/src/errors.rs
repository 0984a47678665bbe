// nexus-core/src/errors.rs
use thiserror::Error;

/// Errors that can escape the conversation and goal machinery.
///
/// Tool failures are not listed here: the tool layer reports them as
/// [`crate::ToolOutcome::Failure`] so the model can react to them.
#[derive(Error, Debug)]
pub enum NexusError {
    /// Missing or invalid configuration. Fatal at startup.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// The completion service could not be reached or answered with something unusable.
    #[error("{context}: {source:#}")]
    Gateway {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A message sequence that would break the tool-call pairing rules.
    #[error("Protocol Error: {0}")]
    Protocol(String),
}

impl NexusError {
    pub fn config(msg: impl Into<String>) -> Self {
        NexusError::Config(msg.into())
    }

    pub fn gateway(context: &'static str, source: anyhow::Error) -> Self {
        NexusError::Gateway { context, source }
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        NexusError::Protocol(msg.into())
    }
}
