//! Error types for reliable-queue.

use thiserror::Error;

use crate::shutdown::ShutdownReason;

#[derive(Debug, Error)]
pub enum Error {
    #[error("store error: {0}")]
    Store(#[from] redis::RedisError),

    #[error("key {key} holds the wrong kind of value, expected a {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("invalid worker id: {0:?}")]
    InvalidWorkerId(String),

    /// A sweep failed; the cleaner loop has stopped and should be restarted.
    #[error("error cleaning up after dead workers: {0}")]
    Cleaning(#[source] Box<Error>),

    #[error("{0}")]
    Cancelled(ShutdownReason),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True when this error only reports that a shutdown was signalled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
