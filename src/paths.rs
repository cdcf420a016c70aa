//! Configuration file locations
//!
//! ~/.crudcheck/
//! └── config.toml     # Global config
//!
//! ./crudcheck.toml    # Project config, searched upward from the cwd

use std::path::{Path, PathBuf};

pub const PROJECT_CONFIG_FILE: &str = "crudcheck.toml";

/// Get the crudcheck home directory (~/.crudcheck)
pub fn crudcheck_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".crudcheck"))
}

/// Get the global config file path (~/.crudcheck/config.toml)
pub fn global_config_file() -> Option<PathBuf> {
    crudcheck_dir().map(|dir| dir.join("config.toml"))
}

/// Search up the directory tree for a crudcheck.toml
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let candidate = current.join(PROJECT_CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }

        if !current.pop() {
            return None;
        }
    }
}
