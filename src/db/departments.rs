// Consultas sobre `departments`.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::Department;

const DEPARTMENT_SELECT: &str = "
    SELECT d.id, d.name, d.faculty_id, d.created_at, f.name AS faculty_name
    FROM departments d
    LEFT JOIN faculties f ON d.faculty_id = f.id";

fn department_from_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get(0)?,
        name: row.get(1)?,
        faculty_id: row.get(2)?,
        created_at: row.get(3)?,
        faculty_name: row.get(4)?,
    })
}

/// Todos los departamentos, o solo los de una facultad.
pub fn list(conn: &Connection, faculty_id: Option<i64>) -> rusqlite::Result<Vec<Department>> {
    match faculty_id {
        Some(fid) => {
            let mut stmt = conn.prepare(&format!(
                "{DEPARTMENT_SELECT} WHERE d.faculty_id = ?1 ORDER BY f.name, d.name"
            ))?;
            let rows = stmt.query_map([fid], department_from_row)?;
            rows.collect()
        }
        None => {
            let mut stmt = conn.prepare(&format!("{DEPARTMENT_SELECT} ORDER BY f.name, d.name"))?;
            let rows = stmt.query_map([], department_from_row)?;
            rows.collect()
        }
    }
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Department>> {
    conn.query_row(&format!("{DEPARTMENT_SELECT} WHERE d.id = ?1"), [id], department_from_row)
        .optional()
}

pub fn insert(conn: &Connection, name: &str, faculty_id: i64) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO departments (name, faculty_id, created_at) VALUES (?1, ?2, datetime('now'))",
        params![name, faculty_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, id: i64, name: &str, faculty_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE departments SET name = ?1, faculty_id = ?2 WHERE id = ?3",
        params![name, faculty_id, id],
    )
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM departments WHERE id = ?1", [id])
}
