//! Local-filesystem session
//!
//! Treats a local directory as the remote root. Backs `file://` endpoints and
//! is the remote used by the integration tests.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::{RemoteError, RemoteSession};

/// Session whose remote paths live under a local root directory
pub struct LocalSession {
    root: PathBuf,
    connected: bool,
    cwd: String,
}

impl LocalSession {
    /// Remote `/` maps to `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            connected: false,
            cwd: "/".to_string(),
        }
    }

    /// Local path backing a remote path
    #[must_use]
    pub fn resolve(&self, remote_path: &str) -> PathBuf {
        let relative = remote_path.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    /// Current directory selected by the last successful `change_dir`
    #[must_use]
    pub fn current_dir(&self) -> &str {
        &self.cwd
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem failures are refusals; only `connect` can lose the link
    fn refused(path: &str, err: &std::io::Error) -> RemoteError {
        RemoteError::Rejected(format!("{path}: {err}"))
    }

    fn ensure_connected(&self) -> Result<(), RemoteError> {
        if self.connected {
            Ok(())
        } else {
            Err(RemoteError::NotConnected)
        }
    }
}

impl RemoteSession for LocalSession {
    fn connect(&mut self, _host: &str, _port: u16) -> Result<(), RemoteError> {
        if !self.root.is_dir() {
            return Err(RemoteError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            )));
        }
        self.connected = true;
        self.cwd = "/".to_string();
        Ok(())
    }

    fn login(&mut self, _user: &str, _password: &str) -> Result<(), RemoteError> {
        self.ensure_connected()
    }

    fn set_passive(&mut self, _enabled: bool) -> Result<(), RemoteError> {
        self.ensure_connected()
    }

    fn set_text_mode(&mut self, _enabled: bool) -> Result<(), RemoteError> {
        // Bytes are copied verbatim
        self.ensure_connected()
    }

    fn set_keep_alive(&mut self, _enabled: bool) {}

    fn change_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.ensure_connected()?;
        let local = self.resolve(path);
        if local.is_dir() {
            self.cwd = path.to_string();
            Ok(())
        } else {
            Err(RemoteError::Rejected(format!("{path}: no such directory")))
        }
    }

    fn make_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.ensure_connected()?;
        fs::create_dir(self.resolve(path)).map_err(|e| Self::refused(path, &e))
    }

    fn store(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64, RemoteError> {
        self.ensure_connected()?;
        let mut file = fs::File::create(self.resolve(path)).map_err(|e| Self::refused(path, &e))?;
        std::io::copy(reader, &mut file).map_err(|e| Self::refused(path, &e))
    }

    fn delete_file(&mut self, path: &str) -> Result<(), RemoteError> {
        self.ensure_connected()?;
        fs::remove_file(self.resolve(path)).map_err(|e| Self::refused(path, &e))
    }

    fn remove_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.ensure_connected()?;
        fs::remove_dir(self.resolve(path)).map_err(|e| Self::refused(path, &e))
    }

    fn is_connected(&mut self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }
}
