pub mod repository;
pub mod sqlite;

pub use repository::*;
pub use sqlite::*;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use thiserror::Error;

use crate::models::{MedicineFilter, NewMedicine, StoredMedicine};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Document encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Stored document {id} is not a JSON object")]
    CorruptDocument { id: String },

    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// Persistence seam for medicine documents.
///
/// The pipeline only talks to this trait; `Database` is the SQLite
/// implementation. Inserts are atomic per document.
pub trait MedicineStore: Send + Sync {
    /// Persist one document and return its store-assigned id.
    fn insert_medicine(&self, medicine: &NewMedicine) -> Result<String, StoreError>;

    /// Documents owned by `user_id` matching every predicate in `filter`,
    /// in insertion order.
    fn list_medicines(
        &self,
        user_id: &str,
        filter: &MedicineFilter,
    ) -> Result<Vec<StoredMedicine>, StoreError>;
}

/// Process-wide SQLite handle. One connection, serialized by a mutex.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (creating parent directories) and migrate the database file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = open_database(path)?;
        tracing::info!(path = %path.display(), "Database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Mutex::new(open_memory_database()?),
        })
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut conn)
    }
}

impl MedicineStore for Database {
    fn insert_medicine(&self, medicine: &NewMedicine) -> Result<String, StoreError> {
        self.with_conn(|conn| repository::insert_medicine(conn, medicine))
    }

    fn list_medicines(
        &self,
        user_id: &str,
        filter: &MedicineFilter,
    ) -> Result<Vec<StoredMedicine>, StoreError> {
        self.with_conn(|conn| repository::list_medicines(conn, user_id, filter))
    }
}
