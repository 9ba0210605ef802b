//! Whole-collection persistence for chat sessions.
//!
//! The session list is always written as one JSON document and read back
//! verbatim. There is no incremental diffing: every mutation rewrites the file.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use directories::ProjectDirs;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::core::config::data::path_display;
use crate::core::session::Session;

pub const SESSIONS_FILE_NAME: &str = "sessions.json";

#[derive(Debug)]
pub enum PersistError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Encode(serde_json::Error),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io { path, source } => {
                write!(f, "Failed to write sessions to {}: {}", path_display(path), source)
            }
            PersistError::Encode(source) => write!(f, "Failed to encode sessions: {source}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PersistError::Io { source, .. } => Some(source),
            PersistError::Encode(source) => Some(source),
        }
    }
}

/// Backing storage for the session collection.
pub trait SessionPersistence: Send {
    /// Read the stored collection. Missing or unreadable state is an empty list.
    fn load(&self) -> Vec<Session>;

    /// Replace the stored collection with `sessions`.
    fn save(&self, sessions: &[Session]) -> Result<(), PersistError>;
}

/// Decode a stored document, treating corrupt content as empty.
pub fn decode_sessions(contents: &str, origin: &str) -> Vec<Session> {
    if contents.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<Session>>(contents) {
        Ok(sessions) => sessions,
        Err(err) => {
            warn!(origin, error = %err, "discarding unreadable session history");
            Vec::new()
        }
    }
}

/// Sessions stored as a JSON file, replaced atomically on every save.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Storage at the platform data directory.
    pub fn at_default_location() -> Option<Self> {
        default_sessions_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

pub fn default_sessions_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "causerie", "causerie")
        .map(|dirs| dirs.data_dir().join(SESSIONS_FILE_NAME))
}

impl SessionPersistence for JsonFileStorage {
    fn load(&self) -> Vec<Session> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => decode_sessions(&contents, &path_display(&self.path)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                warn!(path = %path_display(&self.path), error = %err, "failed to read session history");
                Vec::new()
            }
        }
    }

    fn save(&self, sessions: &[Session]) -> Result<(), PersistError> {
        let contents = serde_json::to_string(sessions).map_err(PersistError::Encode)?;
        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(|err| self.io_error(err))?;
        }

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(|err| self.io_error(err))?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|err| self.io_error(err))?;
        temp_file
            .as_file_mut()
            .sync_all()
            .map_err(|err| self.io_error(err))?;
        temp_file
            .persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }
}

/// In-memory storage that still goes through JSON, so round-trips are real.
///
/// Clones share the same document, which lets a test reopen a store on the
/// state a previous store wrote.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    document: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Arc::new(Mutex::new(Some(document.into()))),
        }
    }

    pub fn document(&self) -> Option<String> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionPersistence for MemoryStorage {
    fn load(&self) -> Vec<Session> {
        match self.document() {
            Some(contents) => decode_sessions(&contents, "memory"),
            None => Vec::new(),
        }
    }

    fn save(&self, sessions: &[Session]) -> Result<(), PersistError> {
        let contents = serde_json::to_string(sessions).map_err(PersistError::Encode)?;
        *self
            .document
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(contents);
        Ok(())
    }
}
