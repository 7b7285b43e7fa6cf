use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use plancraft_core::PlanError;
use rusqlite::Connection;
use rusqlite::types::Type;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    role TEXT DEFAULT 'user',
    company TEXT,
    skills TEXT,
    level INTEGER DEFAULT 1
);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    owner_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    status TEXT NOT NULL DEFAULT 'development',
    lead INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS milestones (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    done INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS features (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    milestone_id INTEGER REFERENCES milestones(id) ON DELETE SET NULL,
    name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'todo'
);

CREATE TABLE IF NOT EXISTS task_assignments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    description TEXT,
    type TEXT,
    status TEXT,
    assigned_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
    eta TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tech_stack (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    tech TEXT NOT NULL,
    level INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS user_projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    role TEXT NOT NULL DEFAULT 'member',
    created_at TEXT NOT NULL,
    UNIQUE(user_id, project_id)
);

CREATE TABLE IF NOT EXISTS project_uml (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER REFERENCES projects(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    uml_schema TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_user ON task_assignments(user_id, status);
CREATE INDEX IF NOT EXISTS idx_features_project ON features(project_id);
CREATE INDEX IF NOT EXISTS idx_users_company ON users(company);
";

/// Handle to the planning database. Cheap to clone; all clones share one connection.
#[derive(Clone)]
pub struct Store {
    db: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> plancraft_core::Result<Self> {
        info!(?path, "opening planning database");

        let conn = Connection::open(path).map_err(storage)?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )
        .map_err(storage)?;

        conn.execute_batch(SCHEMA).map_err(storage)?;

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> plancraft_core::Result<Self> {
        Self::open(Path::new(":memory:"))
    }

    /// Lock the underlying connection.
    pub fn conn(&self) -> parking_lot::MutexGuard<'_, Connection> {
        self.db.lock()
    }
}

/// Map a SQLite error onto the backend error taxonomy.
pub(crate) fn storage(e: rusqlite::Error) -> PlanError {
    if let rusqlite::Error::SqliteFailure(ref err, ref msg) = e
        && err.code == rusqlite::ErrorCode::ConstraintViolation
    {
        let detail = msg.clone().unwrap_or_else(|| e.to_string());
        return match err.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                PlanError::Conflict(detail)
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                PlanError::Validation("referenced record does not exist".into())
            }
            _ => PlanError::Validation(detail),
        };
    }
    PlanError::Storage(e.to_string())
}

/// Turn an empty lookup into `NotFound`.
pub(crate) fn found<T>(row: Option<T>, what: impl FnOnce() -> String) -> plancraft_core::Result<T> {
    row.ok_or_else(|| PlanError::NotFound(what()))
}

pub(crate) fn now() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_json(idx: usize, raw: &str) -> rusqlite::Result<serde_json::Value> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
