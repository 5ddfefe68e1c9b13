// Consultas sobre `faculties`.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::Faculty;

fn faculty_from_row(row: &Row<'_>) -> rusqlite::Result<Faculty> {
    Ok(Faculty {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Faculty>> {
    let mut stmt = conn.prepare("SELECT id, name, created_at FROM faculties ORDER BY name")?;
    let rows = stmt.query_map([], faculty_from_row)?;
    rows.collect()
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Faculty>> {
    conn.query_row(
        "SELECT id, name, created_at FROM faculties WHERE id = ?1",
        [id],
        faculty_from_row,
    )
    .optional()
}

pub fn insert(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    conn.execute("INSERT INTO faculties (name, created_at) VALUES (?1, datetime('now'))", [name])?;
    Ok(conn.last_insert_rowid())
}

pub fn rename(conn: &Connection, id: i64, name: &str) -> rusqlite::Result<usize> {
    conn.execute("UPDATE faculties SET name = ?1 WHERE id = ?2", params![name, id])
}

/// Falla con violación de clave foránea si quedan departamentos, usuarios o
/// cursos que la referencian.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM faculties WHERE id = ?1", [id])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{initialize, is_constraint_violation, Database};

    #[test]
    fn crud_and_unique_name() {
        let db = Database::open_in_memory().unwrap();
        initialize(&db).unwrap();
        let conn = db.conn();

        let id = insert(&conn, "Tıp Fakültesi").unwrap();
        assert!(is_constraint_violation(&insert(&conn, "Tıp Fakültesi").unwrap_err()));

        assert_eq!(rename(&conn, id, "Sağlık Bilimleri Fakültesi").unwrap(), 1);
        assert_eq!(get(&conn, id).unwrap().unwrap().name, "Sağlık Bilimleri Fakültesi");
        assert_eq!(rename(&conn, id + 1, "x").unwrap(), 0);

        assert_eq!(delete(&conn, id).unwrap(), 1);
        assert!(list(&conn).unwrap().is_empty());
    }

    #[test]
    fn delete_with_departments_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        initialize(&db).unwrap();
        let conn = db.conn();
        let id = insert(&conn, "Mühendislik Fakültesi").unwrap();
        crate::db::departments::insert(&conn, "Makine Mühendisliği", id).unwrap();
        assert!(is_constraint_violation(&delete(&conn, id).unwrap_err()));
    }
}
