//! Service configuration.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use pos_core::DEFAULT_PASSWORD_ITERATIONS;
use pos_store::StoreConfig;

/// Service configuration loaded from a config file and environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Path to the `RocksDB` data directory (default: "./data/pos").
    pub data_dir: String,

    /// Fast cache quota in bytes (default: 5 MiB).
    pub fast_quota_bytes: usize,

    /// Change notification buffer; 0 disables notifications (default: 64).
    pub broadcast_capacity: usize,

    /// Seed default users, products and settings into an empty store
    /// (default: true).
    pub seed_defaults: bool,

    /// PBKDF2 iterations for new password hashes (default: 100 000).
    pub password_iterations: u32,

    /// Where the boot binary exports a backup (optional).
    pub backup_path: Option<String>,
}

/// Config file structure. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    data_dir: Option<String>,
    fast_quota_bytes: Option<usize>,
    broadcast_capacity: Option<usize>,
    seed_defaults: Option<bool>,
    password_iterations: Option<u32>,
    backup_path: Option<String>,
}

impl AppConfig {
    /// Load configuration from the config file (if any), then environment
    /// variables, which take precedence.
    #[must_use]
    pub fn from_env() -> Self {
        let file = load_config();
        Self::from_sources(file, |name| std::env::var(name).ok())
    }

    fn from_sources(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            data_dir: env("POS_DATA_DIR")
                .or(file.data_dir)
                .unwrap_or(defaults.data_dir),
            fast_quota_bytes: parse_var(&env, "POS_FAST_QUOTA_BYTES")
                .or(file.fast_quota_bytes)
                .unwrap_or(defaults.fast_quota_bytes),
            broadcast_capacity: parse_var(&env, "POS_BROADCAST_CAPACITY")
                .or(file.broadcast_capacity)
                .unwrap_or(defaults.broadcast_capacity),
            seed_defaults: env("POS_SEED_DEFAULTS")
                .and_then(|s| parse_flag(&s))
                .or(file.seed_defaults)
                .unwrap_or(defaults.seed_defaults),
            password_iterations: parse_var(&env, "POS_PASSWORD_ITERATIONS")
                .or(file.password_iterations)
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.password_iterations),
            backup_path: env("POS_BACKUP_PATH")
                .or(file.backup_path)
                .filter(|s| !s.trim().is_empty()),
        }
    }

    /// Store tuning derived from this configuration.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            fast_quota_bytes: self.fast_quota_bytes,
            broadcast_capacity: self.broadcast_capacity,
        }
    }
}

fn parse_var<T: FromStr>(env: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    env(name).and_then(|s| s.trim().parse().ok())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load the first config file found, or an empty one.
fn load_config() -> ConfigFile {
    let config_paths = ["pos.json", ".pos/config.json", "../.pos/config.json"];

    for path in &config_paths {
        match load_config_file::<ConfigFile>(path) {
            Ok(file) => {
                tracing::info!(path = %path, "Loaded config file");
                return file;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path, error = %e, "Ignoring unreadable config file"),
        }
    }

    tracing::debug!("No config file found, using environment variables");
    ConfigFile::default()
}

/// Load a JSON config file.
fn load_config_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Config file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for AppConfig {
    fn default() -> Self {
        let store = StoreConfig::default();
        Self {
            data_dir: "./data/pos".into(),
            fast_quota_bytes: store.fast_quota_bytes,
            broadcast_capacity: store.broadcast_capacity,
            seed_defaults: true,
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
            backup_path: None,
        }
    }
}
