// Consultas sobre `lecture_notes`.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{LectureNote, NewLectureNote};

const NOTE_SELECT: &str = "
    SELECT n.id, n.course_id, n.uploader_id, n.original_name, n.stored_name,
           n.description, n.mime_type, n.size_bytes, n.created_at,
           u.name AS uploader_name, u.role AS uploader_role
    FROM lecture_notes n
    JOIN users u ON n.uploader_id = u.id";

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<LectureNote> {
    Ok(LectureNote {
        id: row.get(0)?,
        course_id: row.get(1)?,
        uploader_id: row.get(2)?,
        original_name: row.get(3)?,
        stored_name: row.get(4)?,
        description: row.get(5)?,
        mime_type: row.get(6)?,
        size_bytes: row.get(7)?,
        created_at: row.get(8)?,
        uploader_name: row.get(9)?,
        uploader_role: row.get(10)?,
    })
}

/// Apuntes del curso, los más recientes primero.
pub fn list_for_course(conn: &Connection, course_id: i64) -> rusqlite::Result<Vec<LectureNote>> {
    let mut stmt = conn.prepare(&format!(
        "{NOTE_SELECT} WHERE n.course_id = ?1 ORDER BY n.created_at DESC, n.id DESC"
    ))?;
    let rows = stmt.query_map([course_id], note_from_row)?;
    rows.collect()
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<LectureNote>> {
    conn.query_row(&format!("{NOTE_SELECT} WHERE n.id = ?1"), [id], note_from_row)
        .optional()
}

pub fn insert(conn: &Connection, note: &NewLectureNote) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO lecture_notes (course_id, uploader_id, original_name, stored_name, description, mime_type, size_bytes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))",
        params![
            note.course_id,
            note.uploader_id,
            note.original_name,
            note.stored_name,
            note.description,
            note.mime_type,
            note.size_bytes
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM lecture_note_ratings WHERE note_id = ?1", [id])?;
    let deleted = tx.execute("DELETE FROM lecture_notes WHERE id = ?1", [id])?;
    tx.commit()?;
    Ok(deleted)
}
