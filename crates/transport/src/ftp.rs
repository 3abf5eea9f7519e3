//! FTP session backed by `suppaftp`

use std::io::Read;
use std::net::ToSocketAddrs;
use std::time::Duration;

use suppaftp::types::{FileType, FormatControl};
use suppaftp::{FtpError, FtpStream, Mode};
use tracing::debug;

use crate::{RemoteError, RemoteSession};

/// How long a single TCP connect may take
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking FTP control connection
pub struct FtpSession {
    stream: Option<FtpStream>,
    passive: bool,
    keep_alive: bool,
    connect_timeout: Duration,
}

impl FtpSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stream: None,
            passive: true,
            keep_alive: false,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    /// Override the TCP connect timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn stream(&mut self) -> Result<&mut FtpStream, RemoteError> {
        self.stream.as_mut().ok_or(RemoteError::NotConnected)
    }
}

impl Default for FtpSession {
    fn default() -> Self {
        Self::new()
    }
}

impl From<FtpError> for RemoteError {
    fn from(err: FtpError) -> Self {
        match err {
            FtpError::ConnectionError(io) => Self::Io(io),
            other => Self::Rejected(other.to_string()),
        }
    }
}

impl RemoteSession for FtpSession {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), RemoteError> {
        self.disconnect();

        let addr = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            RemoteError::Rejected(format!("{host}:{port} did not resolve to an address"))
        })?;
        debug!("connecting to {addr}");
        let mut stream = FtpStream::connect_timeout(addr, self.connect_timeout)?;
        stream.set_mode(if self.passive {
            Mode::Passive
        } else {
            Mode::Active
        });
        self.stream = Some(stream);
        Ok(())
    }

    fn login(&mut self, user: &str, password: &str) -> Result<(), RemoteError> {
        self.stream()?.login(user, password)?;
        Ok(())
    }

    fn set_passive(&mut self, enabled: bool) -> Result<(), RemoteError> {
        self.passive = enabled;
        let mode = if enabled { Mode::Passive } else { Mode::Active };
        self.stream()?.set_mode(mode);
        Ok(())
    }

    fn set_text_mode(&mut self, enabled: bool) -> Result<(), RemoteError> {
        let file_type = if enabled {
            FileType::Ascii(FormatControl::Default)
        } else {
            FileType::Binary
        };
        self.stream()?.transfer_type(file_type)?;
        Ok(())
    }

    fn set_keep_alive(&mut self, enabled: bool) {
        self.keep_alive = enabled;
    }

    fn change_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.stream()?.cwd(path)?;
        Ok(())
    }

    fn make_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.stream()?.mkdir(path)?;
        Ok(())
    }

    fn store(&mut self, path: &str, mut reader: &mut dyn Read) -> Result<u64, RemoteError> {
        let written = self.stream()?.put_file(path, &mut reader)?;
        Ok(written)
    }

    fn delete_file(&mut self, path: &str) -> Result<(), RemoteError> {
        self.stream()?.rm(path)?;
        Ok(())
    }

    fn remove_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.stream()?.rmdir(path)?;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        let keep_alive = self.keep_alive;
        match self.stream.as_mut() {
            None => false,
            // NOOP doubles as the keep-alive probe
            Some(stream) if keep_alive => stream.noop().is_ok(),
            Some(_) => true,
        }
    }

    fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.quit() {
                debug!("QUIT failed: {e}");
            }
        }
    }
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}
