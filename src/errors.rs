/// Startup and server fault classification for the relay
///
/// Per-frame faults (decode errors, auth rejections, closed sockets) are
/// handled locally where they occur and never surface here; this type covers
/// the errors that are allowed to stop the process.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("JWT secret is required when running in production mode")]
    MissingSecret,

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
