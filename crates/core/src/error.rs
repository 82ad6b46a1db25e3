use thiserror::Error;

/// Result type for easybulk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for easybulk operations
///
/// Errors raised by a caller-supplied bulk operation are deliberately absent:
/// they are consumed by the retry loop and only reach the failure listener.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid construction parameters or configuration sources
    #[error("Configuration error: {0}")]
    Config(String),

    /// An item was submitted after the handler started closing
    #[error("bulk handler already closed")]
    Closed,

    /// The flush dispatch path failed (worker slot unavailable, task panicked)
    #[error("Dispatch error: {0}")]
    Dispatch(String),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a dispatch error
    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }

    /// Whether this is the error returned for submissions after close
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
