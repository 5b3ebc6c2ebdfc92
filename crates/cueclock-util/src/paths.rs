//! Default paths for cueclockd components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/cueclock/config.toml` or `~/.config/cueclock/config.toml`
//! - Socket: `$XDG_RUNTIME_DIR/cueclock/cueclockd.sock` or `/tmp/cueclock-$USER/cueclockd.sock`
//! - Data: `$XDG_DATA_HOME/cueclock` or `~/.local/share/cueclock`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const CUECLOCK_CONFIG_ENV: &str = "CUECLOCK_CONFIG";

/// Environment variable for overriding the socket path
pub const CUECLOCK_SOCKET_ENV: &str = "CUECLOCK_SOCKET";

/// Environment variable for overriding the data directory
pub const CUECLOCK_DATA_DIR_ENV: &str = "CUECLOCK_DATA_DIR";

const SOCKET_FILENAME: &str = "cueclockd.sock";

const CONFIG_FILENAME: &str = "config.toml";

const APP_DIR: &str = "cueclock";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$CUECLOCK_CONFIG`
/// 2. `$XDG_CONFIG_HOME/cueclock/config.toml`
/// 3. `~/.config/cueclock/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CUECLOCK_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$CUECLOCK_SOCKET`
/// 2. `$XDG_RUNTIME_DIR/cueclock/cueclockd.sock`
/// 3. `/tmp/cueclock-$USER/cueclockd.sock`
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(CUECLOCK_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Socket path ignoring `CUECLOCK_SOCKET`, for config defaults where the
/// env var is checked separately.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$CUECLOCK_DATA_DIR`
/// 2. `$XDG_DATA_HOME/cueclock`
/// 3. `~/.local/share/cueclock`
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(CUECLOCK_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Data directory ignoring `CUECLOCK_DATA_DIR`.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("data")
}
