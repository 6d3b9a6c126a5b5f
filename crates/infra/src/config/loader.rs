//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CHIME_DB_PATH`: Database file path (required for the env source)
//! - `CHIME_DB_POOL_SIZE`: Connection pool size (required for the env source)
//! - `CHIME_GUARD_INTERVAL_MS`: Auto-timer guard margin in milliseconds
//! - `CHIME_DEFAULT_SNOOZE_MINUTES`: Fallback snooze duration
//! - `CHIME_WATCHDOG_INTERVAL_SECS`: Media watchdog poll cadence
//! - `CHIME_VOLUME_RESTRICT_INTERVAL_SECS`: Restrict-volume poll cadence
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./chime.json` or `./chime.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)

use std::path::PathBuf;

use chime_domain::{ChimeError, Config, DatabaseConfig, Result, SessionConfig, WakeupConfig};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ChimeError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The database variables must be present; timing knobs fall back to the
/// session and wakeup defaults.
///
/// # Errors
/// Returns `ChimeError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("CHIME_DB_PATH")?;
    let db_pool_size = env_var("CHIME_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| ChimeError::Config(format!("Invalid pool size: {}", e)))
    })?;

    let mut session = SessionConfig::default();
    if let Some(guard_ms) = optional_env_u64("CHIME_GUARD_INTERVAL_MS")? {
        session.guard_interval_ms = guard_ms;
    }
    if let Some(minutes) = optional_env_u64("CHIME_DEFAULT_SNOOZE_MINUTES")? {
        session.default_snooze_minutes = u32::try_from(minutes)
            .map_err(|_| ChimeError::Config("Snooze minutes out of range".into()))?;
    }

    let mut wakeup = WakeupConfig::default();
    if let Some(secs) = optional_env_u64("CHIME_WATCHDOG_INTERVAL_SECS")? {
        wakeup.watchdog_interval_secs = secs;
    }
    if let Some(secs) = optional_env_u64("CHIME_VOLUME_RESTRICT_INTERVAL_SECS")? {
        wakeup.volume_restrict_interval_secs = secs;
    }

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        session,
        wakeup,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ChimeError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ChimeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ChimeError::Config("No config file found in probed locations".into())
        })?,
    };

    let contents = std::fs::read_to_string(&config_path).map_err(|e| {
        ChimeError::Config(format!("Failed to read {}: {}", config_path.display(), e))
    })?;

    let config = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents)
            .map_err(|e| ChimeError::Config(format!("Invalid JSON config: {}", e)))?,
        Some("toml") => toml::from_str(&contents)
            .map_err(|e| ChimeError::Config(format!("Invalid TOML config: {}", e)))?,
        other => {
            return Err(ChimeError::Config(format!(
                "Unsupported config extension: {:?}",
                other
            )))
        }
    };

    tracing::info!(path = %config_path.display(), "Configuration loaded from file");
    Ok(config)
}

/// Probe the known config file locations, first hit wins.
fn probe_config_paths() -> Option<PathBuf> {
    let candidates = [
        "config.json",
        "config.toml",
        "chime.json",
        "chime.toml",
        "../config.json",
        "../config.toml",
    ];

    candidates.iter().map(PathBuf::from).find(|candidate| candidate.exists())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| ChimeError::Config(format!("Missing environment variable: {}", name)))
}

fn optional_env_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ChimeError::Config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_json_config_from_an_explicit_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).expect("create");
        write!(
            file,
            r#"{{"database": {{"path": "alarms.db", "pool_size": 2}},
                "session": {{"guard_interval_ms": 250, "default_snooze_minutes": 5}}}}"#
        )
        .expect("write");

        let config = load_from_file(Some(path)).expect("load");
        assert_eq!(config.database.path, "alarms.db");
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.session.guard_interval_ms, 250);
        assert_eq!(config.session.default_snooze_minutes, 5);
        // Unspecified sections fall back to defaults.
        assert_eq!(config.wakeup.watchdog_interval_secs, 10);
    }

    #[test]
    fn loads_toml_config_from_an_explicit_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).expect("create");
        write!(
            file,
            "[database]\npath = \"alarms.db\"\npool_size = 3\n\
             \n[wakeup]\nwatchdog_interval_secs = 20\nvolume_restrict_interval_secs = 2\n"
        )
        .expect("write");

        let config = load_from_file(Some(path)).expect("load");
        assert_eq!(config.database.pool_size, 3);
        assert_eq!(config.wakeup.watchdog_interval_secs, 20);
    }

    #[test]
    fn missing_explicit_path_is_a_config_error() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/chime.json")))
            .expect_err("missing file");
        assert!(matches!(err, ChimeError::Config(_)));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "database: {}").expect("write");

        let err = load_from_file(Some(path)).expect_err("unsupported format");
        assert!(matches!(err, ChimeError::Config(_)));
    }
}
