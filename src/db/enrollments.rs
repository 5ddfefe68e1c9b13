// Matrículas y solicitudes de matrícula.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{EnrollmentRequest, RequestStatus};

/// Columnas comunes de una solicitud. `place` indica de quién se toman
/// facultad y departamento: `s` (alumno) o `c` (curso).
fn request_select(place: &str) -> String {
    format!(
        "SELECT cer.id, cer.course_id, cer.student_id, cer.status, cer.created_at,
                c.title AS course_title, c.instructor_id, u.name AS instructor_name,
                s.name AS student_name, s.email AS student_email,
                f.name AS faculty_name, d.name AS department_name
         FROM course_enrollment_requests cer
         JOIN courses c ON cer.course_id = c.id
         JOIN users u ON c.instructor_id = u.id
         JOIN users s ON cer.student_id = s.id
         LEFT JOIN faculties f ON {place}.faculty_id = f.id
         LEFT JOIN departments d ON {place}.department_id = d.id"
    )
}

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<EnrollmentRequest> {
    Ok(EnrollmentRequest {
        id: row.get(0)?,
        course_id: row.get(1)?,
        student_id: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        course_title: row.get(5)?,
        instructor_id: row.get(6)?,
        instructor_name: row.get(7)?,
        student_name: row.get(8)?,
        student_email: row.get(9)?,
        faculty_name: row.get(10)?,
        department_name: row.get(11)?,
    })
}

/// Lo mínimo para decidir sobre una solicitud.
#[derive(Debug, Clone, Copy)]
pub struct RequestRef {
    pub id: i64,
    pub course_id: i64,
    pub student_id: i64,
    pub status: RequestStatus,
}

pub fn is_enrolled(conn: &Connection, course_id: i64, student_id: i64) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM course_enrollments WHERE course_id = ?1 AND student_id = ?2",
            params![course_id, student_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn has_pending_request(conn: &Connection, course_id: i64, student_id: i64) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM course_enrollment_requests
             WHERE course_id = ?1 AND student_id = ?2 AND status = 'pending'",
            params![course_id, student_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Crea la solicitud en estado `pending`. Si ya hubo una (rechazada o
/// aprobada y luego dada de baja) se reabre la misma fila.
pub fn create_request(conn: &Connection, course_id: i64, student_id: i64) -> rusqlite::Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM course_enrollment_requests WHERE course_id = ?1 AND student_id = ?2",
            params![course_id, student_id],
            |r| r.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        conn.execute(
            "UPDATE course_enrollment_requests
             SET status = 'pending', created_at = datetime('now'), updated_at = datetime('now')
             WHERE id = ?1",
            [id],
        )?;
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO course_enrollment_requests (course_id, student_id, status, created_at, updated_at)
         VALUES (?1, ?2, 'pending', datetime('now'), datetime('now'))",
        params![course_id, student_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_request(conn: &Connection, id: i64) -> rusqlite::Result<Option<EnrollmentRequest>> {
    conn.query_row(
        &format!("{} WHERE cer.id = ?1", request_select("s")),
        [id],
        request_from_row,
    )
    .optional()
}

pub fn find_request(conn: &Connection, id: i64) -> rusqlite::Result<Option<RequestRef>> {
    conn.query_row(
        "SELECT id, course_id, student_id, status FROM course_enrollment_requests WHERE id = ?1",
        [id],
        |r| {
            Ok(RequestRef {
                id: r.get(0)?,
                course_id: r.get(1)?,
                student_id: r.get(2)?,
                status: r.get(3)?,
            })
        },
    )
    .optional()
}

/// Solicitudes pendientes; con `instructor_id` solo las de sus cursos.
pub fn pending_requests(conn: &Connection, instructor_id: Option<i64>) -> rusqlite::Result<Vec<EnrollmentRequest>> {
    let base = request_select("s");
    match instructor_id {
        Some(iid) => {
            let mut stmt = conn.prepare(&format!(
                "{base} WHERE c.instructor_id = ?1 AND cer.status = 'pending'
                 ORDER BY cer.created_at DESC, cer.id DESC"
            ))?;
            let rows = stmt.query_map([iid], request_from_row)?;
            rows.collect()
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "{base} WHERE cer.status = 'pending' ORDER BY cer.created_at DESC, cer.id DESC"
            ))?;
            let rows = stmt.query_map([], request_from_row)?;
            rows.collect()
        }
    }
}

/// Solicitudes del alumno, más recientes primero, con la facultad del curso.
pub fn requests_of_student(conn: &Connection, student_id: i64) -> rusqlite::Result<Vec<EnrollmentRequest>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE cer.student_id = ?1 ORDER BY cer.created_at DESC, cer.id DESC",
        request_select("c")
    ))?;
    let rows = stmt.query_map([student_id], request_from_row)?;
    rows.collect()
}

/// Aprueba o rechaza. Aprobar matricula al alumno (sin duplicar).
pub fn decide(conn: &Connection, request: &RequestRef, status: RequestStatus) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE course_enrollment_requests SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![status, request.id],
    )?;
    if status == RequestStatus::Approved {
        tx.execute(
            "INSERT OR IGNORE INTO course_enrollments (course_id, student_id) VALUES (?1, ?2)",
            params![request.course_id, request.student_id],
        )?;
    }
    tx.commit()
}

/// Nombre y email de los alumnos matriculados en el curso.
pub fn enrolled_students(conn: &Connection, course_id: i64) -> rusqlite::Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT u.name, u.email FROM users u
         JOIN course_enrollments ce ON u.id = ce.student_id
         WHERE ce.course_id = ?1
         ORDER BY u.name",
    )?;
    let rows = stmt.query_map([course_id], |r| Ok((r.get(0)?, r.get(1)?)))?;
    rows.collect()
}
