//! Menu Editor Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - reorder: Sort key allocation, tree snapshot and move decisions
//! - session: Drag gesture lifecycle
//! - preferences: Client-local sorting mode and expansion state
//! - repository: Data access abstractions and implementations
//! - commands: Command handlers over the shared application state
//! - config: TOML configuration
//! - tree: Display flattening

use std::sync::Arc;

use tokio::sync::Mutex;

pub mod domain;
pub mod reorder;
pub mod session;
pub mod preferences;
pub mod repository;
pub mod commands;
pub mod config;
pub mod tree;

use config::{AppConfig, APP_NAME};
use preferences::{ExpansionState, JsonFileStore, KeyValueStore, SortingPreference};
use reorder::MenuTree;
use repository::{init_db, DbState, MenuStore};
use session::DragSessionController;

/// The tree currently being edited
pub struct LoadedMenu {
    pub restaurant_id: u32,
    pub tree: MenuTree,
}

/// Application state shared across commands
pub struct AppState {
    pub config: AppConfig,
    pub db_state: DbState,
    pub store: MenuStore,
    pub sorting: Mutex<SortingPreference>,
    pub expansion: Mutex<ExpansionState>,
    pub session: Mutex<DragSessionController>,
    pub menu: Mutex<Option<LoadedMenu>>,
}

impl AppState {
    /// Open the database and preferences named by `config`
    pub async fn open(config: AppConfig) -> Result<Self, String> {
        let preferences: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(config.preferences_path()));
        Self::open_with_preferences(config, preferences).await
    }

    /// Same as [`AppState::open`] with a caller-supplied preference store
    pub async fn open_with_preferences(config: AppConfig, preferences: Arc<dyn KeyValueStore>) -> Result<Self, String> {
        let db_state = init_db(&config.db_path()).await?;
        let store = MenuStore::new(db_state.connection(), config.allocator());

        let sorting = SortingPreference::load(preferences.clone());
        let expansion = ExpansionState::load(preferences);
        let session = DragSessionController::new(sorting.mode(), config.session_settings());

        Ok(Self {
            config,
            db_state,
            store,
            sorting: Mutex::new(sorting),
            expansion: Mutex::new(expansion),
            session: Mutex::new(session),
            menu: Mutex::new(None),
        })
    }
}

/// Install the rolling file logger configured by `config`
pub fn init_logging(config: &AppConfig) -> Result<(), String> {
    let options = rolling_logger::LoggerOptions {
        level: rolling_logger::parse_level(config.log_level()),
        ..Default::default()
    };
    rolling_logger::init_logger_with(config.log_dir(), APP_NAME, options)
}

/// Load configuration, start logging and open the application state
pub async fn run(config_path: Option<&std::path::Path>) -> Result<AppState, String> {
    let config = AppConfig::load(config_path);
    if let Err(e) = init_logging(&config) {
        // Keep going without a log file
        eprintln!("Logger init failed: {}", e);
    }
    let state = AppState::open(config).await?;
    tracing::info!(db = %state.config.db_path().display(), "menu editor started");
    Ok(state)
}
