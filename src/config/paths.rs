//! Platform-specific data directory paths.
//!
//!   Windows: %APPDATA%/nihongo-master/data
//!   macOS:   ~/Library/Application Support/nihongo-master/data
//!   Linux:   $XDG_CONFIG_HOME/nihongo-master/data (default ~/.config)

use std::path::PathBuf;

const APP_DIR: &str = "nihongo-master";

/// Get the app data directory (cross-platform).
pub fn get_data_dir() -> PathBuf {
    get_config_base().join(APP_DIR).join("data")
}

/// Get the platform-appropriate base config directory.
fn get_config_base() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata);
        }
        dirs::config_dir().unwrap_or_else(|| home().join("AppData").join("Roaming"))
    }

    #[cfg(target_os = "macos")]
    {
        home().join("Library").join("Application Support")
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg);
        }
        home().join(".config")
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_layout() {
        let dir = get_data_dir();
        assert!(dir.ends_with(PathBuf::from(APP_DIR).join("data")));
    }
}
