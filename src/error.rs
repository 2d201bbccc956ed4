/// Result alias carrying the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failures at the crate's boundaries. Gameplay itself has no error path:
/// bad input degrades to a miss or a no-op.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The engine thread has exited, so its command channel is closed.
    #[error("game engine is no longer running")]
    EngineGone,
    #[error("{0} lock poisoned")]
    Poisoned(&'static str),
}

