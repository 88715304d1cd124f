//! Path utilities for termdock
//!
//! Resolves per-user config, state, and log locations via the platform
//! directory conventions (AppData on Windows, XDG elsewhere).

use std::path::PathBuf;

use directories::ProjectDirs;

/// Application identifier for platform directories
const APP_NAME: &str = "termdock";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(fallback_config_dir)
}

/// Get the main configuration file path
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the state directory (persistent state like the session store)
pub fn state_dir() -> PathBuf {
    project_dirs()
        .and_then(|p| p.state_dir().map(|d| d.to_path_buf()))
        // state_dir() is None on Windows; keep state beside the local data dir
        .or_else(|| project_dirs().map(|p| p.data_local_dir().to_path_buf()))
        .unwrap_or_else(fallback_state_dir)
}

/// Get the log directory
pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

/// Get the session store file path
pub fn sessions_file() -> PathBuf {
    state_dir().join("sessions.toml")
}

/// Get the docking layout file path
pub fn layout_file() -> PathBuf {
    state_dir().join("layout.txt")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Ensure all required directories exist
pub fn ensure_all_dirs() -> std::io::Result<()> {
    ensure_dir(&config_dir())?;
    ensure_dir(&state_dir())?;
    ensure_dir(&log_dir())?;
    Ok(())
}

// Fallback implementations when ProjectDirs is unavailable

fn home_dir() -> PathBuf {
    std::env::var("APPDATA")
        .or_else(|_| std::env::var("HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

fn fallback_config_dir() -> PathBuf {
    home_dir().join(APP_NAME).join("config")
}

fn fallback_state_dir() -> PathBuf {
    home_dir().join(APP_NAME).join("state")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_is_toml() {
        let path = config_file();
        assert!(path.to_string_lossy().ends_with(".toml"));
    }

    #[test]
    fn test_config_file_in_config_dir() {
        assert!(config_file().starts_with(config_dir()));
    }

    #[test]
    fn test_all_paths_contain_app_name() {
        for path in [config_dir(), state_dir(), log_dir(), sessions_file(), layout_file()] {
            assert!(
                path.to_string_lossy().contains(APP_NAME),
                "Path should contain '{}': {:?}",
                APP_NAME,
                path
            );
        }
    }

    #[test]
    fn test_subdirs_are_under_parents() {
        assert!(log_dir().starts_with(state_dir()));
        assert!(sessions_file().starts_with(state_dir()));
        assert!(layout_file().starts_with(state_dir()));
    }

    #[test]
    fn test_layout_and_sessions_file_names() {
        assert_eq!(sessions_file().file_name().unwrap(), "sessions.toml");
        assert_eq!(layout_file().file_name().unwrap(), "layout.txt");
    }

    #[test]
    fn test_ensure_dir_creates_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let test_dir = temp_dir.path().join("nested").join("deep");

        let result = ensure_dir(&test_dir);
        assert!(result.is_ok());
        assert!(test_dir.is_dir());
    }

    #[test]
    fn test_ensure_dir_already_exists() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let test_dir = temp_dir.path().to_path_buf();
        assert!(ensure_dir(&test_dir).is_ok());
    }
}
