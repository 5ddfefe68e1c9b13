// Consultas sobre `courses`.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::Course;

const COURSE_SELECT: &str = "
    SELECT c.id, c.title, c.instructor_id, u.name AS instructor_name, u.email AS instructor_email,
           c.faculty_id, c.department_id, f.name AS faculty_name, d.name AS department_name
    FROM courses c
    JOIN users u ON c.instructor_id = u.id
    LEFT JOIN faculties f ON c.faculty_id = f.id
    LEFT JOIN departments d ON c.department_id = d.id";

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub instructor_id: i64,
    pub faculty_id: i64,
    pub department_id: i64,
}

fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        instructor_id: row.get(2)?,
        instructor_name: row.get(3)?,
        instructor_email: row.get(4)?,
        faculty_id: row.get(5)?,
        department_id: row.get(6)?,
        faculty_name: row.get(7)?,
        department_name: row.get(8)?,
        enrollment_count: None,
    })
}

fn query_courses(conn: &Connection, sql: &str, id: Option<i64>) -> rusqlite::Result<Vec<Course>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = match id {
        Some(id) => stmt.query_map([id], course_from_row)?.collect(),
        None => stmt.query_map([], course_from_row)?.collect(),
    };
    rows
}

pub fn list_all(conn: &Connection) -> rusqlite::Result<Vec<Course>> {
    query_courses(conn, &format!("{COURSE_SELECT} ORDER BY c.title"), None)
}

pub fn list_by_instructor(conn: &Connection, instructor_id: i64) -> rusqlite::Result<Vec<Course>> {
    query_courses(
        conn,
        &format!("{COURSE_SELECT} WHERE c.instructor_id = ?1 ORDER BY c.title"),
        Some(instructor_id),
    )
}

/// Cursos en los que el alumno está matriculado.
pub fn list_by_student(conn: &Connection, student_id: i64) -> rusqlite::Result<Vec<Course>> {
    query_courses(
        conn,
        &format!(
            "{COURSE_SELECT} JOIN course_enrollments ce ON c.id = ce.course_id
             WHERE ce.student_id = ?1 ORDER BY c.title"
        ),
        Some(student_id),
    )
}

/// Cursos a los que el usuario puede pedir matrícula: ni matriculado ni con
/// una solicitud pendiente. Incluye el número de matriculados.
pub fn list_available(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Course>> {
    let mut stmt = conn.prepare(&format!(
        "{COURSE_SELECT_COUNTED}
         WHERE c.id NOT IN (SELECT course_id FROM course_enrollments WHERE student_id = ?1)
           AND c.id NOT IN (SELECT course_id FROM course_enrollment_requests
                            WHERE student_id = ?1 AND status = 'pending')
         ORDER BY c.title"
    ))?;
    let rows = stmt.query_map([user_id], |row| {
        let mut course = course_from_row(row)?;
        course.enrollment_count = Some(row.get(9)?);
        Ok(course)
    })?;
    rows.collect()
}

const COURSE_SELECT_COUNTED: &str = "
    SELECT c.id, c.title, c.instructor_id, u.name AS instructor_name, u.email AS instructor_email,
           c.faculty_id, c.department_id, f.name AS faculty_name, d.name AS department_name,
           (SELECT COUNT(*) FROM course_enrollments ce WHERE ce.course_id = c.id) AS enrollment_count
    FROM courses c
    JOIN users u ON c.instructor_id = u.id
    LEFT JOIN faculties f ON c.faculty_id = f.id
    LEFT JOIN departments d ON c.department_id = d.id";

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Course>> {
    conn.query_row(&format!("{COURSE_SELECT} WHERE c.id = ?1"), [id], course_from_row)
        .optional()
}

/// Título e instructor del curso, si existe.
pub fn owner(conn: &Connection, id: i64) -> rusqlite::Result<Option<(String, i64)>> {
    conn.query_row(
        "SELECT title, instructor_id FROM courses WHERE id = ?1",
        [id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .optional()
}

pub fn teaches_any(conn: &Connection, instructor_id: i64) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM courses WHERE instructor_id = ?1",
        [instructor_id],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

pub fn insert(conn: &Connection, course: &NewCourse) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO courses (title, instructor_id, faculty_id, department_id) VALUES (?1, ?2, ?3, ?4)",
        params![course.title, course.instructor_id, course.faculty_id, course.department_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Borra el curso con todo lo que cuelga de él (materiales, apuntes,
/// valoraciones, notas, matrículas y solicitudes). Los archivos en disco
/// quedan a cargo del llamador.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    for sql in [
        "DELETE FROM lecture_note_ratings WHERE note_id IN (SELECT id FROM lecture_notes WHERE course_id = ?1)",
        "DELETE FROM lecture_notes WHERE course_id = ?1",
        "DELETE FROM material_ratings WHERE material_id IN (SELECT id FROM materials WHERE course_id = ?1)",
        "DELETE FROM material_grades WHERE material_id IN (SELECT id FROM materials WHERE course_id = ?1)",
        "DELETE FROM materials WHERE course_id = ?1",
        "DELETE FROM course_enrollment_requests WHERE course_id = ?1",
        "DELETE FROM course_enrollments WHERE course_id = ?1",
    ] {
        tx.execute(sql, [id])?;
    }
    let deleted = tx.execute("DELETE FROM courses WHERE id = ?1", [id])?;
    tx.commit()?;
    Ok(deleted)
}
