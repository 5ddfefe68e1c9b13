//! Acceso a la base SQLite del portal.
//!
//! Una sola conexión protegida por `Mutex`, compartida por los handlers a
//! través de `web::Data`. Cada submódulo agrupa las consultas de una entidad.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, ErrorCode, OptionalExtension};
use tracing::info;

pub mod courses;
pub mod departments;
pub mod enrollments;
pub mod faculties;
pub mod feedback;
pub mod materials;
mod migrate;
pub mod notes;
mod schema;
mod seed;
pub mod users;

pub use seed::seed;

pub struct Database {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Database(..)")
    }
}

impl Database {
    /// Abre (o crea) el archivo SQLite, creando el directorio padre si falta.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn)?)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Bloqueo breve sobre la conexión. Un mutex envenenado no invalida la
    /// conexión, así que se recupera en vez de propagar el pánico.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Crea las tablas que falten. Si detecta el esquema antiguo
/// (`instructors`/`students` sin `users`) ejecuta la migración.
pub fn initialize(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = db.conn();

    if table_exists(&conn, "instructors")? && !table_exists(&conn, "users")? {
        info!("Detected old database schema, running migration...");
        migrate::migrate_legacy(&mut conn)?;
        return Ok(());
    }

    schema::create_tables(&conn)?;
    info!("Database tables ready");
    Ok(())
}

pub(crate) fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}

/// UNIQUE, FOREIGN KEY o CHECK rechazados por SQLite.
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}
