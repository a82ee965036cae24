use directories::ProjectDirs;
use std::path::PathBuf;

/// Where cornerbell keeps its files. Presets and the plain-text session
/// log are configuration; the history database is state.
pub struct AppDirs;

impl AppDirs {
    /// Session history database.
    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("history.db"))
    }

    /// Presets file, theme selection included.
    pub fn presets_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("presets.json"))
    }

    /// Plain-text session log kept alongside the presets file.
    pub fn csv_log_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("sessions.csv"))
    }

    /// `~/.local/state/cornerbell` when HOME is known, the platform's
    /// local data dir otherwise.
    fn state_dir() -> Option<PathBuf> {
        match std::env::var("HOME") {
            Ok(home) => Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("cornerbell"),
            ),
            Err(_) => Self::project_dirs().map(|dirs| dirs.data_local_dir().to_path_buf()),
        }
    }

    fn config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "cornerbell")
    }
}
