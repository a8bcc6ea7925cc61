//! Session identity persistence
//!
//! The session id survives process restarts by living in a small file
//! under a fixed name; it is created once and reused until the file is
//! removed. Stores built without a file get an ephemeral id instead.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{Result, TelemetryError};

/// Fixed file name for the persisted session id
pub const SESSION_FILE_NAME: &str = "tracelet-session";

/// Default location for the session file, when the platform has a
/// state/cache directory. `None` on platforms without one.
pub fn default_session_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|d| d.join("tracelet").join(SESSION_FILE_NAME))
}

/// Generate a fresh session id
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Read the session id from `path`, creating it (and parent
/// directories) with a fresh id if absent or unreadable as a UUID.
pub fn load_or_create(path: &Path) -> Result<String> {
    if let Ok(contents) = fs::read_to_string(path) {
        let trimmed = contents.trim();
        if Uuid::parse_str(trimmed).is_ok() {
            return Ok(trimmed.to_string());
        }
    }

    let id = generate_session_id();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| TelemetryError::Session(format!("create {}: {e}", parent.display())))?;
    }
    fs::write(path, &id)
        .map_err(|e| TelemetryError::Session(format!("write {}: {e}", path.display())))?;
    Ok(id)
}
