//! Common error types for tickinput-core.

use crate::event::DeviceKind;
use thiserror::Error;

/// Errors raised while bringing up the input backend or loading configuration.
///
/// Listener registration and removal never fail; they are silent no-ops.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to open input session: {0}")]
    SessionCreation(String),
    #[error("failed to create {kind} device: {reason}")]
    DeviceCreation { kind: DeviceKind, reason: String },
    #[error("{0} device not supported by backend")]
    Unsupported(DeviceKind),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for input operations.
pub type InputResult<T> = Result<T, InputError>;
