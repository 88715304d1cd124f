//! Session record types and launch-argument construction

use std::fmt;

use serde::{Deserialize, Serialize};
use termdock_utils::{Result, TermdockError};

/// Wire protocol spoken by the external terminal emulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ssh,
    Telnet,
    Rlogin,
    Raw,
    Serial,
}

impl Protocol {
    /// Command-line flag name (lower-cased protocol name)
    pub fn flag(&self) -> &'static str {
        match self {
            Protocol::Ssh => "ssh",
            Protocol::Telnet => "telnet",
            Protocol::Rlogin => "rlogin",
            Protocol::Raw => "raw",
            Protocol::Serial => "serial",
        }
    }
}

/// Panel position/presentation within the docking workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockState {
    #[default]
    Document,
    DockLeft,
    DockRight,
    DockTop,
    DockBottom,
    Float,
    Hidden,
    Unknown,
}

impl DockState {
    /// Hidden/Unknown are transient presentation states; a panel never
    /// writes them back to its session record on close.
    pub fn is_persistable(&self) -> bool {
        !matches!(self, DockState::Hidden | DockState::Unknown)
    }
}

impl fmt::Display for DockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DockState::Document => "document",
            DockState::DockLeft => "dock_left",
            DockState::DockRight => "dock_right",
            DockState::DockTop => "dock_top",
            DockState::DockBottom => "dock_bottom",
            DockState::Float => "float",
            DockState::Hidden => "hidden",
            DockState::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for DockState {
    type Err = TermdockError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "document" => Ok(DockState::Document),
            "dock_left" => Ok(DockState::DockLeft),
            "dock_right" => Ok(DockState::DockRight),
            "dock_top" => Ok(DockState::DockTop),
            "dock_bottom" => Ok(DockState::DockBottom),
            "float" => Ok(DockState::Float),
            "hidden" => Ok(DockState::Hidden),
            "unknown" => Ok(DockState::Unknown),
            other => Err(TermdockError::layout(format!("unknown dock state: {}", other))),
        }
    }
}

/// One connection the terminal emulator can open
///
/// The password is held in plaintext in memory only; persistence goes
/// through [`crate::store::SessionStore`], which protects it first. The
/// record deliberately does not derive `Serialize` so the plaintext can
/// never reach disk through a generic serializer.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Unique identity, stable across restarts (the session name)
    pub session_id: String,
    pub host: String,
    /// 1-65535
    pub port: u16,
    pub protocol: Protocol,
    /// Reference into the emulator's own saved-profile store; empty for none
    pub profile_name: String,
    pub username: String,
    /// Plaintext credential, in memory only
    pub password: String,
    /// Where this session's panel was last docked
    pub last_dock_state: DockState,
    /// Open a panel for this session at startup
    pub auto_start: bool,
}

impl SessionRecord {
    /// Create a record with the emulator's customary defaults
    pub fn new(session_id: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            host: host.into(),
            port: 22,
            protocol: Protocol::Ssh,
            profile_name: String::new(),
            username: String::new(),
            password: String::new(),
            last_dock_state: DockState::Document,
            auto_start: false,
        }
    }

    /// Validate the invariants the store relies on
    pub fn validate(&self) -> Result<()> {
        if self.session_id.is_empty() {
            return Err(TermdockError::store("session id must not be empty"));
        }
        if self.host.is_empty() {
            return Err(TermdockError::store(format!(
                "session {:?} has no host",
                self.session_id
            )));
        }
        if self.port == 0 {
            return Err(TermdockError::store(format!(
                "session {:?} has port 0 (must be 1-65535)",
                self.session_id
            )));
        }
        Ok(())
    }

    /// Build the argument vector for the spawned emulator process.
    ///
    /// Shape: `-<protocol> [-pw <password>] -P <port> [-load <profile>]
    /// <username>@<host>`. The password argument is present only when the
    /// credential is non-empty, and the target collapses to the bare host
    /// when no username is set.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![format!("-{}", self.protocol.flag())];

        if !self.password.is_empty() {
            args.push("-pw".into());
            args.push(self.password.clone());
        }

        args.push("-P".into());
        args.push(self.port.to_string());

        if !self.profile_name.is_empty() {
            args.push("-load".into());
            args.push(self.profile_name.clone());
        }

        if self.username.is_empty() {
            args.push(self.host.clone());
        } else {
            args.push(format!("{}@{}", self.username, self.host));
        }

        args
    }

    /// Argument vector with the credential masked, safe for logging
    pub fn redacted_args(&self) -> Vec<String> {
        let mut args = self.launch_args();
        if let Some(pos) = args.iter().position(|a| a == "-pw") {
            if let Some(pw) = args.get_mut(pos + 1) {
                *pw = "***".into();
            }
        }
        args
    }
}

// Manual Debug so the password cannot leak through {:?} formatting.
impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("session_id", &self.session_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("protocol", &self.protocol)
            .field("profile_name", &self.profile_name)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("last_dock_state", &self.last_dock_state)
            .field("auto_start", &self.auto_start)
            .finish()
    }
}
