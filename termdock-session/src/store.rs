//! Session store: ordered CRUD over session records
//!
//! Records are persisted as a TOML document with the password field
//! replaced by a protected blob. The store never writes a plaintext
//! credential, and a record whose blob fails to decrypt loads with an
//! empty password rather than failing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use termdock_utils::{paths, Result, TermdockError};

use crate::record::{DockState, Protocol, SessionRecord};
use crate::secret;

/// On-disk shape of a single session entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    id: String,
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_protocol")]
    protocol: Protocol,
    #[serde(default)]
    profile: String,
    #[serde(default)]
    username: String,
    /// Protected blob, never plaintext
    #[serde(default)]
    password: String,
    #[serde(default)]
    last_dock_state: DockState,
    #[serde(default)]
    auto_start: bool,
}

fn default_port() -> u16 {
    22
}

fn default_protocol() -> Protocol {
    Protocol::Ssh
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    sessions: Vec<StoredSession>,
}

impl StoredSession {
    fn from_record(record: &SessionRecord) -> Self {
        Self {
            id: record.session_id.clone(),
            host: record.host.clone(),
            port: record.port,
            protocol: record.protocol,
            profile: record.profile_name.clone(),
            username: record.username.clone(),
            password: secret::protect(&record.password),
            last_dock_state: record.last_dock_state,
            auto_start: record.auto_start,
        }
    }

    fn into_record(self) -> SessionRecord {
        SessionRecord {
            session_id: self.id,
            host: self.host,
            port: self.port,
            protocol: self.protocol,
            profile_name: self.profile,
            username: self.username,
            password: secret::reveal(&self.password),
            last_dock_state: self.last_dock_state,
            auto_start: self.auto_start,
        }
    }
}

/// Ordered session store backed by a TOML file
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    sessions: Vec<SessionRecord>,
}

impl SessionStore {
    /// Open a store at the given path; a missing file yields an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let sessions = if path.exists() {
            Self::load(&path)?
        } else {
            Vec::new()
        };
        debug!(sessions = sessions.len(), path = %path.display(), "session store opened");
        Ok(Self { path, sessions })
    }

    /// Open the store at the default platform location
    pub fn open_default() -> Result<Self> {
        Self::open(paths::sessions_file())
    }

    fn load(path: &Path) -> Result<Vec<SessionRecord>> {
        let content = std::fs::read_to_string(path).map_err(|e| TermdockError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: StoreFile = toml::from_str(&content)
            .map_err(|e| TermdockError::store(format!("failed to parse {}: {}", path.display(), e)))?;

        let mut records = Vec::with_capacity(file.sessions.len());
        for stored in file.sessions {
            let record = stored.into_record();
            match record.validate() {
                Ok(()) => records.push(record),
                Err(e) => warn!("skipping invalid session entry: {}", e),
            }
        }
        Ok(records)
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TermdockError::FileWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let file = StoreFile {
            sessions: self.sessions.iter().map(StoredSession::from_record).collect(),
        };
        let content = toml::to_string_pretty(&file)
            .map_err(|e| TermdockError::store(format!("failed to serialize store: {}", e)))?;

        std::fs::write(&self.path, content).map_err(|e| TermdockError::FileWrite {
            path: self.path.clone(),
            source: e,
        })
    }

    /// All sessions, in stable insertion order
    pub fn list(&self) -> &[SessionRecord] {
        &self.sessions
    }

    /// Look up a session by id
    pub fn get(&self, session_id: &str) -> Option<&SessionRecord> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }

    /// Insert or update a record (matched by id), then write the file.
    ///
    /// Updates keep the record's position; inserts append.
    pub fn save(&mut self, record: SessionRecord) -> Result<()> {
        record.validate()?;

        match self
            .sessions
            .iter_mut()
            .find(|s| s.session_id == record.session_id)
        {
            Some(existing) => *existing = record,
            None => self.sessions.push(record),
        }
        self.flush()
    }

    /// Remove a record by id; removing an absent id is a no-op
    pub fn remove(&mut self, session_id: &str) -> Result<Option<SessionRecord>> {
        let removed = self
            .sessions
            .iter()
            .position(|s| s.session_id == session_id)
            .map(|idx| self.sessions.remove(idx));
        if removed.is_some() {
            self.flush()?;
        }
        Ok(removed)
    }

    /// Number of stored sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
