use thiserror::Error;

/// Errors that can occur during a relay session.
///
/// Every variant is terminal for the session it occurs in: the worker
/// converts it into a teardown and a final state, never an automatic retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("capture authorization rejected: {0}")]
    Authorization(String),

    #[error("connection attempts exhausted after {attempts} attempts")]
    ConnectionExhausted { attempts: u32 },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("capture failure: {0}")]
    Capture(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("configuration failed: {0}")]
    Config(String),
}
