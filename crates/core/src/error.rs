//! Error taxonomy for the deployment engine

use std::path::PathBuf;

/// Result alias used throughout ftpwatch
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while walking, planning or syncing
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The endpoint URL could not be turned into a usable remote target
    #[error("invalid endpoint `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// Settings were present but unusable
    #[error("invalid settings: {0}")]
    Settings(String),

    /// Network connect or handshake failed after every attempt
    #[error("could not connect to {host}:{port} after {attempts} attempts: {reason}")]
    ConnectFailed {
        host: String,
        port: u16,
        attempts: u32,
        reason: String,
    },

    /// The server rejected our credentials
    #[error("login rejected for user `{user}`: {reason}")]
    AuthFailed { user: String, reason: String },

    /// A remote directory could not be created (often because it already exists)
    #[error("could not create remote directory {path}: {reason}")]
    DirectoryCreateFailed { path: String, reason: String },

    #[error("upload {} -> {destination} failed: {reason}", source_path.display())]
    UploadFailed {
        source_path: PathBuf,
        destination: String,
        reason: String,
    },

    #[error("delete {destination} failed: {reason}")]
    DeleteFailed { destination: String, reason: String },

    /// A file or directory could not be read during a walk
    #[error("skipping unreadable entry {}: {reason}", path.display())]
    WalkEntryUnreadable { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the reconciliation loop can carry on after this error.
    ///
    /// Per-job and per-cycle failures are recoverable; credential and
    /// configuration problems are not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::AuthFailed { .. } | Self::InvalidEndpoint { .. } | Self::Settings(_)
        )
    }
}
