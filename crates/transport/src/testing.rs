//! Scripted session and recording sleeper for unit tests

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::io::Read;
use std::rc::Rc;
use std::time::Duration;

use crate::client::Sleeper;
use crate::{RemoteError, RemoteSession};

/// What a [`ScriptedSession`] has seen and how it should behave
#[derive(Debug, Default)]
pub struct Script {
    /// Outcome of each successive connect; empty means succeed
    pub connect_results: VecDeque<bool>,
    pub connect_calls: u32,
    pub reject_login: bool,
    /// Flip to false to make the liveness probe fail
    pub alive: bool,
    pub connected: bool,
    pub disconnects: u32,
    pub passive: bool,
    pub text_mode: bool,
    pub keep_alive: bool,
    pub dirs: BTreeSet<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    pub fail_mkdir: HashSet<String>,
    pub fail_store: HashSet<String>,
    /// Store drops the connection instead of being rejected
    pub drop_on_store: bool,
    /// Every protocol call in order, e.g. `"MKD /www"`
    pub calls: Vec<String>,
}

/// In-memory session driven by a shared [`Script`]
#[derive(Clone)]
pub struct ScriptedSession(pub Rc<RefCell<Script>>);

impl ScriptedSession {
    pub fn new() -> Self {
        let script = Script {
            alive: true,
            ..Script::default()
        };
        Self(Rc::new(RefCell::new(script)))
    }

    pub fn script(&self) -> std::cell::RefMut<'_, Script> {
        self.0.borrow_mut()
    }

    fn guard(&self) -> Result<(), RemoteError> {
        if self.0.borrow().connected {
            Ok(())
        } else {
            Err(RemoteError::NotConnected)
        }
    }

    fn log(&self, call: String) {
        self.0.borrow_mut().calls.push(call);
    }
}

impl RemoteSession for ScriptedSession {
    fn connect(&mut self, _host: &str, _port: u16) -> Result<(), RemoteError> {
        let mut s = self.0.borrow_mut();
        s.connect_calls += 1;
        s.calls.push("CONNECT".to_string());
        if s.connect_results.pop_front().unwrap_or(true) {
            s.connected = true;
            s.alive = true;
            Ok(())
        } else {
            Err(RemoteError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused",
            )))
        }
    }

    fn login(&mut self, user: &str, _password: &str) -> Result<(), RemoteError> {
        self.guard()?;
        self.log(format!("USER {user}"));
        if self.0.borrow().reject_login {
            Err(RemoteError::Rejected("530 Login incorrect".to_string()))
        } else {
            Ok(())
        }
    }

    fn set_passive(&mut self, enabled: bool) -> Result<(), RemoteError> {
        self.guard()?;
        self.0.borrow_mut().passive = enabled;
        Ok(())
    }

    fn set_text_mode(&mut self, enabled: bool) -> Result<(), RemoteError> {
        self.guard()?;
        self.0.borrow_mut().text_mode = enabled;
        Ok(())
    }

    fn set_keep_alive(&mut self, enabled: bool) {
        self.0.borrow_mut().keep_alive = enabled;
    }

    fn change_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.guard()?;
        self.log(format!("CWD {path}"));
        if path == "/" || self.0.borrow().dirs.contains(path) {
            Ok(())
        } else {
            Err(RemoteError::Rejected(format!("550 {path}")))
        }
    }

    fn make_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.guard()?;
        self.log(format!("MKD {path}"));
        let mut s = self.0.borrow_mut();
        if s.fail_mkdir.contains(path) || s.dirs.contains(path) {
            return Err(RemoteError::Rejected(format!("550 {path}")));
        }
        s.dirs.insert(path.to_string());
        Ok(())
    }

    fn store(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64, RemoteError> {
        self.guard()?;
        self.log(format!("STOR {path}"));
        let mut s = self.0.borrow_mut();
        if s.drop_on_store {
            s.connected = false;
            return Err(RemoteError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "connection reset",
            )));
        }
        if s.fail_store.contains(path) {
            return Err(RemoteError::Rejected(format!("552 {path}")));
        }
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let len = data.len() as u64;
        s.files.insert(path.to_string(), data);
        Ok(len)
    }

    fn delete_file(&mut self, path: &str) -> Result<(), RemoteError> {
        self.guard()?;
        self.log(format!("DELE {path}"));
        match self.0.borrow_mut().files.remove(path) {
            Some(_) => Ok(()),
            None => Err(RemoteError::Rejected(format!("550 {path}"))),
        }
    }

    fn remove_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.guard()?;
        self.log(format!("RMD {path}"));
        if self.0.borrow_mut().dirs.remove(path) {
            Ok(())
        } else {
            Err(RemoteError::Rejected(format!("550 {path}")))
        }
    }

    fn is_connected(&mut self) -> bool {
        let s = self.0.borrow();
        s.connected && s.alive
    }

    fn disconnect(&mut self) {
        let mut s = self.0.borrow_mut();
        if s.connected {
            s.disconnects += 1;
        }
        s.connected = false;
    }
}

/// Sleeper that records instead of sleeping
#[derive(Clone, Default)]
pub struct RecordingSleeper(pub Rc<RefCell<Vec<Duration>>>);

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.0.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.0.borrow_mut().push(duration);
    }
}
