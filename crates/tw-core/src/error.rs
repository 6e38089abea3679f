//! Framework error type.
//!
//! Errors only describe setup-time failures.  Tick-time rejections are
//! reason codes on the event stream, never `Err`.

use thiserror::Error;

use crate::AgentId;

/// Common base error for `tw-*` crates.
#[derive(Debug, Error)]
pub enum TwError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `tw-*` crates.
pub type TwResult<T> = Result<T, TwError>;
