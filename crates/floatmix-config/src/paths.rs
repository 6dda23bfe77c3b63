//! Platform-specific paths for session files.
//!
//! # Directory Structure
//!
//! - **User sessions**: `~/.config/floatmix/sessions/` (Linux), `~/Library/Application Support/floatmix/sessions/` (macOS), `%APPDATA%\floatmix\sessions\` (Windows)
//! - **User config**: `~/.config/floatmix/` (Linux), `~/Library/Application Support/floatmix/` (macOS), `%APPDATA%\floatmix\` (Windows)
//!
//! # Example
//!
//! ```rust,no_run
//! use floatmix_config::paths;
//!
//! if let Some(path) = paths::find_session("two-track") {
//!     println!("Found session at: {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "floatmix";

/// Subdirectory name for sessions.
const SESSIONS_SUBDIR: &str = "sessions";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user-specific sessions directory.
pub fn user_sessions_dir() -> PathBuf {
    user_config_dir().join(SESSIONS_SUBDIR)
}

/// Find a session file by name.
///
/// Searches in the following order:
/// 1. The name as a file path
/// 2. User sessions directory (with `.toml` appended if missing)
pub fn find_session(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    find_session_in_dir(&user_sessions_dir(), name)
}

fn find_session_in_dir(dir: &Path, name: &str) -> Option<PathBuf> {
    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };

    let candidate = dir.join(filename);
    candidate.is_file().then_some(candidate)
}

/// Ensure the user sessions directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_sessions_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_sessions_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

/// List all session files in the user sessions directory.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_user_sessions() -> Vec<PathBuf> {
    list_sessions_in_dir(&user_sessions_dir())
}

fn list_sessions_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut sessions: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    sessions.sort();
    sessions
}

/// Get the session name from a file path.
///
/// ```rust
/// use floatmix_config::paths::session_name_from_path;
/// use std::path::Path;
///
/// let name = session_name_from_path(Path::new("/path/to/live-set.toml"));
/// assert_eq!(name, Some("live-set".to_string()));
/// ```
pub fn session_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_user_config_dir() {
        let dir = user_config_dir();
        assert!(dir.to_string_lossy().contains("floatmix"));
    }

    #[test]
    fn test_user_sessions_dir() {
        let dir = user_sessions_dir();
        assert!(dir.ends_with("floatmix/sessions"));
    }

    #[test]
    fn test_find_session_by_path() {
        let temp_dir = TempDir::new().unwrap();
        let session_path = temp_dir.path().join("test.toml");
        fs::write(&session_path, "name = \"test\"").unwrap();

        let found = find_session(session_path.to_str().unwrap());
        assert_eq!(found, Some(session_path));
    }

    #[test]
    fn test_find_session_adds_extension() {
        let temp_dir = TempDir::new().unwrap();
        let session_path = temp_dir.path().join("mysession.toml");
        fs::write(&session_path, "name = \"test\"").unwrap();

        assert_eq!(
            find_session_in_dir(temp_dir.path(), "mysession"),
            Some(session_path.clone())
        );
        assert_eq!(
            find_session_in_dir(temp_dir.path(), "mysession.toml"),
            Some(session_path)
        );
    }

    #[test]
    fn test_find_session_not_found() {
        assert!(find_session("nonexistent_session_12345").is_none());
    }

    #[test]
    fn test_list_sessions_in_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.toml"), "").unwrap();
        fs::write(temp_dir.path().join("a.toml"), "").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();

        let sessions = list_sessions_in_dir(temp_dir.path());
        assert_eq!(sessions.len(), 2);
        assert!(sessions[0].ends_with("a.toml"));
    }

    #[test]
    fn test_list_sessions_nonexistent_dir() {
        assert!(list_sessions_in_dir(Path::new("/nonexistent/path/12345")).is_empty());
    }

    #[test]
    fn test_session_name_from_path() {
        assert_eq!(
            session_name_from_path(Path::new("simple.toml")),
            Some("simple".to_string())
        );
    }
}
