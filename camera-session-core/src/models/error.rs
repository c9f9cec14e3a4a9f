use thiserror::Error;

use super::state::SessionState;

/// Contract violations raised by the session controller.
///
/// These signal a logic error in the embedding application, not a runtime
/// condition to recover from. Hardware trouble never surfaces here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not started")]
    NotStarted,

    #[error("session already active in state {0}")]
    AlreadyActive(SessionState),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// Errors reported by a hardware implementation.
///
/// Caught at the device adapter boundary and converted into boolean
/// completions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HardwareError {
    #[error("camera busy")]
    Busy,

    #[error("camera disconnected")]
    Disconnected,

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("hardware failure: {0}")]
    Failed(String),
}

/// Errors from photo storage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from photo post-processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("failed to decode photo: {0}")]
    Decode(String),

    #[error("failed to encode photo: {0}")]
    Encode(String),
}
