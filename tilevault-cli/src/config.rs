//! CLI configuration file.
//!
//! Reads an optional INI file from the platform config directory
//! (`<config_dir>/tilevault/config.ini`):
//!
//! ```ini
//! [catalog]
//! root = /var/lib/tilevault/tiles
//!
//! [upload]
//! policy = counted
//! ```
//!
//! Command-line flags always win over the file; missing file or missing keys
//! fall back to defaults.

use std::path::PathBuf;

use ini::Ini;
use tilevault::transfer::DrainPolicy;
use tracing::debug;

/// Default catalog root when neither flag nor config provides one.
const DEFAULT_ROOT: &str = "tiles";

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Catalog root directory.
    pub root: PathBuf,
    /// Upload drain policy.
    pub drain_policy: DrainPolicy,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            drain_policy: DrainPolicy::default(),
        }
    }
}

impl CliConfig {
    /// Load from the platform config path, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = dirs::config_dir().map(|d| d.join("tilevault").join("config.ini"))
        else {
            return Self::default();
        };
        match Ini::load_from_file(&path) {
            Ok(ini) => Self::from_ini(&ini),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no config file; using defaults");
                Self::default()
            }
        }
    }

    fn from_ini(ini: &Ini) -> Self {
        let mut config = Self::default();

        if let Some(root) = ini.get_from(Some("catalog"), "root") {
            config.root = PathBuf::from(root);
        }
        if let Some(policy) = ini.get_from(Some("upload"), "policy") {
            config.drain_policy = match policy {
                "counted" => DrainPolicy::Counted,
                _ => DrainPolicy::Eager,
            };
        }
        config
    }
}
