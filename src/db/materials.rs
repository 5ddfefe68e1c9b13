// Consultas sobre `materials` (archivos versionados de un curso).

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{Material, NewMaterial};

const MATERIAL_COLUMNS: &str = "id, course_id, instructor_id, original_name, stored_name, description, mime_type, size_bytes, version, created_at";

fn material_from_row(row: &Row<'_>) -> rusqlite::Result<Material> {
    Ok(Material {
        id: row.get(0)?,
        course_id: row.get(1)?,
        instructor_id: row.get(2)?,
        original_name: row.get(3)?,
        stored_name: row.get(4)?,
        description: row.get(5)?,
        mime_type: row.get(6)?,
        size_bytes: row.get(7)?,
        version: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Materiales del curso por nombre y versión descendente.
pub fn list_for_course(conn: &Connection, course_id: i64) -> rusqlite::Result<Vec<Material>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MATERIAL_COLUMNS} FROM materials WHERE course_id = ?1 ORDER BY original_name, version DESC"
    ))?;
    let rows = stmt.query_map([course_id], material_from_row)?;
    rows.collect()
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Material>> {
    conn.query_row(
        &format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = ?1"),
        [id],
        material_from_row,
    )
    .optional()
}

pub fn exists(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    Ok(get(conn, id)?.is_some())
}

/// Id y versión más alta ya subida con ese nombre en el curso.
pub fn latest_version(conn: &Connection, course_id: i64, original_name: &str) -> rusqlite::Result<Option<(i64, i64)>> {
    conn.query_row(
        "SELECT id, version FROM materials WHERE course_id = ?1 AND original_name = ?2
         ORDER BY version DESC LIMIT 1",
        params![course_id, original_name],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .optional()
}

/// ¿Otro material del curso (distinto de `except`) ya ocupa ese archivo?
pub fn stored_name_taken(
    conn: &Connection,
    course_id: i64,
    stored_name: &str,
    except: Option<i64>,
) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM materials WHERE course_id = ?1 AND stored_name = ?2 AND id != ?3 LIMIT 1",
            params![course_id, stored_name, except.unwrap_or(-1)],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn insert(conn: &Connection, m: &NewMaterial) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO materials (course_id, instructor_id, original_name, stored_name, description, mime_type, size_bytes, version, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))",
        params![
            m.course_id,
            m.instructor_id,
            m.original_name,
            m.stored_name,
            m.description,
            m.mime_type,
            m.size_bytes,
            m.version
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Sobrescribe la fila existente de esa versión; conserva el id y las
/// valoraciones asociadas.
pub fn overwrite(conn: &Connection, id: i64, m: &NewMaterial) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE materials
         SET instructor_id = ?1, stored_name = ?2, description = ?3, mime_type = ?4,
             size_bytes = ?5, version = ?6, created_at = datetime('now')
         WHERE id = ?7",
        params![m.instructor_id, m.stored_name, m.description, m.mime_type, m.size_bytes, m.version, id],
    )
}

/// Borra el material con sus valoraciones y notas.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM material_ratings WHERE material_id = ?1", [id])?;
    tx.execute("DELETE FROM material_grades WHERE material_id = ?1", [id])?;
    let deleted = tx.execute("DELETE FROM materials WHERE id = ?1", [id])?;
    tx.commit()?;
    Ok(deleted)
}
