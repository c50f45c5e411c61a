//! Application configuration: TOML file loading and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. Explicit path passed to [`AppConfig::load`]
//! 2. `$MENU_EDITOR_CONFIG` environment variable (path to config file)
//! 3. Project-local `.menu-editor.toml` in the current working directory
//! 4. Global `<config_dir>/menu-editor/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::reorder::{OrderKeyAllocator, DEFAULT_COLLISION_OFFSET, DEFAULT_NOOP_RADIUS, DEFAULT_SPACING};
use crate::session::SessionSettings;

pub const APP_NAME: &str = "menu-editor";

/// Where records and preferences live
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file; `:memory:` for a throwaway database
    pub db_path: Option<PathBuf>,
    /// JSON file holding client-local preferences
    pub preferences_path: Option<PathBuf>,
}

/// Sort key allocation
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ReorderConfig {
    /// Gap between appended keys
    pub spacing: Option<f64>,
    /// Offset used when neighbours are too close to split
    pub collision_offset: Option<f64>,
    /// Same-level drops this close to the current position are ignored
    pub noop_radius: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DragConfig {
    /// Pixels the pointer must move before a press becomes a drag
    pub activation_distance: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    /// "trace", "debug", "info", "warn", "error" or "off"
    pub level: Option<String>,
}

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub reorder: ReorderConfig,
    pub drag: DragConfig,
    pub logging: LoggingConfig,
}

pub const DEFAULT_ACTIVATION_DISTANCE: u32 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Candidate config file paths, highest priority first
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("MENU_EDITOR_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".menu-editor.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_NAME).join("config.toml"));
    }

    paths
}

/// Read and parse a TOML config file. Missing or malformed files yield `None`.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config file");
            None
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            storage: StorageConfig {
                db_path: other.storage.db_path.clone().or(self.storage.db_path),
                preferences_path: other
                    .storage
                    .preferences_path
                    .clone()
                    .or(self.storage.preferences_path),
            },
            reorder: ReorderConfig {
                spacing: other.reorder.spacing.or(self.reorder.spacing),
                collision_offset: other.reorder.collision_offset.or(self.reorder.collision_offset),
                noop_radius: other.reorder.noop_radius.or(self.reorder.noop_radius),
            },
            drag: DragConfig {
                activation_distance: other.drag.activation_distance.or(self.drag.activation_distance),
            },
            logging: LoggingConfig {
                dir: other.logging.dir.clone().or(self.logging.dir),
                level: other.logging.level.clone().or(self.logging.level),
            },
        }
    }

    /// Load the final merged configuration.
    pub fn load(explicit_path: Option<&Path>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher ones overwrite
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(path) = explicit_path {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn db_path(&self) -> PathBuf {
        self.storage
            .db_path
            .clone()
            .unwrap_or_else(|| data_dir().join("menu.db"))
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.storage
            .preferences_path
            .clone()
            .unwrap_or_else(|| data_dir().join("preferences.json"))
    }

    /// Non-finite or negative values fall back to the defaults
    pub fn spacing(&self) -> f64 {
        self.reorder
            .spacing
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(DEFAULT_SPACING)
    }

    pub fn collision_offset(&self) -> f64 {
        self.reorder
            .collision_offset
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(DEFAULT_COLLISION_OFFSET)
    }

    pub fn noop_radius(&self) -> usize {
        self.reorder.noop_radius.unwrap_or(DEFAULT_NOOP_RADIUS)
    }

    pub fn activation_distance(&self) -> u32 {
        self.drag.activation_distance.unwrap_or(DEFAULT_ACTIVATION_DISTANCE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.logging.dir.clone().unwrap_or_else(|| data_dir().join("logs"))
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn allocator(&self) -> OrderKeyAllocator {
        OrderKeyAllocator::new(self.spacing(), self.collision_offset())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            allocator: self.allocator(),
            noop_radius: self.noop_radius(),
            activation_distance: self.activation_distance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.spacing(), 1000.0);
        assert_eq!(cfg.collision_offset(), 500.0);
        assert_eq!(cfg.noop_radius(), 1);
        assert_eq!(cfg.activation_distance(), 10);
        assert_eq!(cfg.log_level(), "info");
        assert!(cfg.db_path().ends_with("menu-editor/menu.db"));
        assert!(cfg.preferences_path().ends_with("menu-editor/preferences.json"));
    }

    #[test]
    fn test_toml_parsing_full() {
        let toml = r#"
[storage]
db_path = ":memory:"
preferences_path = "/tmp/prefs.json"

[reorder]
spacing = 100.0
collision_offset = 50.0
noop_radius = 0

[drag]
activation_distance = 4

[logging]
dir = "/var/log/menu"
level = "debug"
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(cfg.db_path(), PathBuf::from(":memory:"));
        assert_eq!(cfg.preferences_path(), PathBuf::from("/tmp/prefs.json"));
        assert_eq!(cfg.allocator(), OrderKeyAllocator::new(100.0, 50.0));
        assert_eq!(cfg.noop_radius(), 0);
        assert_eq!(cfg.session_settings().activation_distance, 4);
        assert_eq!(cfg.log_dir(), PathBuf::from("/var/log/menu"));
        assert_eq!(cfg.log_level(), "debug");
    }

    #[test]
    fn test_invalid_spacing_falls_back() {
        let cfg: AppConfig = toml::from_str("[reorder]\nspacing = -5.0\ncollision_offset = nan\n").unwrap();
        assert_eq!(cfg.spacing(), 1000.0);
        assert_eq!(cfg.collision_offset(), 500.0);
    }

    #[test]
    fn test_merge_prefers_other() {
        let base: AppConfig = toml::from_str("[reorder]\nspacing = 10.0\nnoop_radius = 3\n").unwrap();
        let over: AppConfig = toml::from_str("[reorder]\nnoop_radius = 0\n").unwrap();
        let merged = base.merge(&over);
        assert_eq!(merged.spacing(), 10.0);
        assert_eq!(merged.noop_radius(), 0);
    }

    #[test]
    fn test_load_explicit_file_and_skip_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.toml");
        let mut f = std::fs::File::create(&good).unwrap();
        writeln!(f, "[drag]\nactivation_distance = 25").unwrap();

        let cfg = AppConfig::load(Some(&good));
        assert_eq!(cfg.activation_distance(), 25);

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[drag\nactivation_distance = ").unwrap();
        assert!(load_file(&bad).is_none());
        assert!(load_file(&dir.path().join("missing.toml")).is_none());
    }
}
