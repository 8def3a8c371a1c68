//! Error types for Hydra Mind

use thiserror::Error;

/// Errors surfaced at the crate's API seams.
///
/// The recoverable runtime conditions (a missed snapshot, a full transition
/// queue) are reported as `Option`/`bool` by the store and the channel and
/// never reach this type; `MindError` covers configuration and spawn-time
/// failures, where a caller needs a real error value.
#[derive(Debug, Error)]
pub enum MindError {
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("failed to spawn task: {0}")]
    SpawnError(#[from] std::io::Error),
}
