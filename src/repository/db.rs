//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations.

use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::DomainError;

/// Shared connection handle; `None` until initialized
pub type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Database state wrapper
pub struct DbState {
    conn: SharedConnection,
}

impl DbState {
    pub fn new() -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle to the connection, shared by all repositories
    pub fn connection(&self) -> SharedConnection {
        self.conn.clone()
    }

    pub async fn is_initialized(&self) -> bool {
        self.conn.lock().await.is_some()
    }
}

impl Default for DbState {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn not_initialized() -> DomainError {
    DomainError::Internal("Database not initialized".to_string())
}

/// Initialize database with path. `:memory:` opens a private in-memory database.
pub async fn init_db(db_path: &PathBuf) -> Result<DbState, String> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && db_path.as_os_str() != ":memory:" {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create db dir {}: {}", parent.display(), e))?;
        }
    }

    let conn = Connection::open(db_path).map_err(|e| format!("Failed to open db: {}", e))?;

    // Run migrations
    run_migrations(&conn)?;

    let state = DbState::new();
    *state.conn.lock().await = Some(conn);

    tracing::info!(path = %db_path.display(), "database ready");
    Ok(state)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let query = format!("PRAGMA table_info({})", table);
    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };
    let Ok(mut rows) = stmt.query([]) else {
        return false;
    };
    while let Ok(Some(row)) = rows.next() {
        if let Ok(name) = row.get::<_, String>(1) {
            if name == column {
                return true;
            }
        }
    }
    false
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            restaurant_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            sort_order REAL NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            parent_id INTEGER,
            created_at INTEGER,
            updated_at INTEGER
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS menu_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            restaurant_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            price REAL NOT NULL DEFAULT 0,
            tax_rate REAL NOT NULL DEFAULT 5,
            dish_type TEXT NOT NULL DEFAULT 'VEG',
            sort_order REAL NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER,
            updated_at INTEGER
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    // Serviceability flags were added after the first schema
    for (column, default) in [("delivery", 1), ("takeaway", 0), ("dine_in", 0)] {
        if !column_exists(conn, "menu_items", column) {
            conn.execute(
                &format!("ALTER TABLE menu_items ADD COLUMN {} INTEGER NOT NULL DEFAULT {}", column, default),
                [],
            )
            .map_err(|e| format!("Failed to add {}: {}", column, e))?;
        }
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(restaurant_id, parent_id)",
        [],
    )
    .map_err(|e| e.to_string())?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_menu_items_category ON menu_items(category_id)",
        [],
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}
