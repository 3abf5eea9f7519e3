//! ftpwatch-transport: remote side of a deployment
//!
//! [`RemoteSession`] is the capability set a transfer protocol has to offer.
//! [`SyncClient`] owns one session and layers reconnects, directory creation
//! and file/directory deletion on top; [`Reconciler`] drives walk, plan and
//! sync cycles.

pub mod client;
pub mod ftp;
pub mod local;
pub mod reconcile;
#[cfg(test)]
mod testing;

use std::io::Read;

pub use client::{ConnectionState, RetryPolicy, Sleeper, SyncClient, ThreadSleeper};
pub use ftp::FtpSession;
pub use local::LocalSession;
pub use reconcile::{CycleObserver, CycleReport, Phase, Reconciler, run_once};

/// Failure reported by a protocol session
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("not connected")]
    NotConnected,
    /// The server answered with an error reply
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Operations a stateful transfer protocol exposes.
///
/// Paths are absolute, `/`-separated remote paths. Implementations keep at
/// most one live connection and may be reconnected after [`disconnect`].
///
/// [`disconnect`]: RemoteSession::disconnect
pub trait RemoteSession {
    /// Open the network connection and wait for the server greeting
    fn connect(&mut self, host: &str, port: u16) -> Result<(), RemoteError>;

    fn login(&mut self, user: &str, password: &str) -> Result<(), RemoteError>;

    fn set_passive(&mut self, enabled: bool) -> Result<(), RemoteError>;

    /// Text (ASCII) rather than binary transfers
    fn set_text_mode(&mut self, enabled: bool) -> Result<(), RemoteError>;

    /// Probe the connection in [`is_connected`](RemoteSession::is_connected)
    fn set_keep_alive(&mut self, enabled: bool);

    /// Select `path` as the current directory
    fn change_dir(&mut self, path: &str) -> Result<(), RemoteError>;

    fn make_dir(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Store the reader's bytes at `path`, returning the byte count
    fn store(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64, RemoteError>;

    fn delete_file(&mut self, path: &str) -> Result<(), RemoteError>;

    fn remove_dir(&mut self, path: &str) -> Result<(), RemoteError>;

    fn is_connected(&mut self) -> bool;

    fn disconnect(&mut self);
}

impl<S: RemoteSession + ?Sized> RemoteSession for Box<S> {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), RemoteError> {
        (**self).connect(host, port)
    }

    fn login(&mut self, user: &str, password: &str) -> Result<(), RemoteError> {
        (**self).login(user, password)
    }

    fn set_passive(&mut self, enabled: bool) -> Result<(), RemoteError> {
        (**self).set_passive(enabled)
    }

    fn set_text_mode(&mut self, enabled: bool) -> Result<(), RemoteError> {
        (**self).set_text_mode(enabled)
    }

    fn set_keep_alive(&mut self, enabled: bool) {
        (**self).set_keep_alive(enabled);
    }

    fn change_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        (**self).change_dir(path)
    }

    fn make_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        (**self).make_dir(path)
    }

    fn store(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64, RemoteError> {
        (**self).store(path, reader)
    }

    fn delete_file(&mut self, path: &str) -> Result<(), RemoteError> {
        (**self).delete_file(path)
    }

    fn remove_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        (**self).remove_dir(path)
    }

    fn is_connected(&mut self) -> bool {
        (**self).is_connected()
    }

    fn disconnect(&mut self) {
        (**self).disconnect();
    }
}

/// A session for the endpoint's scheme
#[must_use]
pub fn session_for(endpoint: &ftpwatch_core::Endpoint) -> Box<dyn RemoteSession> {
    match endpoint.scheme {
        ftpwatch_core::Scheme::Ftp => Box::new(FtpSession::new()),
        ftpwatch_core::Scheme::Local => Box::new(LocalSession::new("/")),
    }
}
