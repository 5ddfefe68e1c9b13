// Migración desde el esquema antiguo (tablas `instructors`, `students` y
// `enrollments`) al esquema unificado con `users`, facultades y departamentos.

use std::collections::HashMap;
use std::error::Error;

use rusqlite::{params, Connection};
use tracing::info;

use super::schema;
use crate::auth::hash_password;

struct LegacyMaterial {
    id: i64,
    course_id: i64,
    instructor_id: i64,
    original_name: String,
    stored_name: String,
    description: Option<String>,
    mime_type: String,
    size_bytes: i64,
    version: i64,
    created_at: String,
}

pub(super) fn migrate_legacy(conn: &mut Connection) -> Result<(), Box<dyn Error>> {
    // Los cursos migrados apuntan a facultad/departamento 1, que todavía no
    // existen hasta que corra el seed.
    conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
    let result = run(conn);
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    result
}

fn load_people(conn: &Connection, table: &str) -> rusqlite::Result<Vec<(i64, String, String)>> {
    let mut stmt = conn.prepare(&format!("SELECT id, name, email FROM {} ORDER BY id", table))?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
    rows.collect()
}

fn run(conn: &mut Connection) -> Result<(), Box<dyn Error>> {
    let old_instructors = load_people(conn, "instructors")?;
    let old_students = load_people(conn, "students")?;

    let old_courses: Vec<(i64, String, i64)> = {
        let mut stmt = conn.prepare("SELECT id, title, instructorId FROM courses ORDER BY id")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        rows.collect::<rusqlite::Result<_>>()?
    };

    let old_materials: Vec<LegacyMaterial> = {
        let mut stmt = conn.prepare(
            "SELECT id, courseId, instructorId, originalName, storedName, description, mimeType, sizeBytes, version, createdAt
             FROM materials ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LegacyMaterial {
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
        })?;
        rows.collect::<rusqlite::Result<_>>()?
    };

    let old_enrollments: Vec<(i64, i64)> = {
        let mut stmt = conn.prepare("SELECT courseId, studentId FROM enrollments")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<rusqlite::Result<_>>()?
    };

    // bcrypt es lento: un hash por contraseña por defecto, no uno por usuario
    let instructor_hash = hash_password("instructor123")?;
    let student_hash = hash_password("student123")?;
    let admin_hash = hash_password("admin123")?;

    let tx = conn.transaction()?;
    tx.execute_batch(schema::CREATE_FACULTIES)?;
    tx.execute_batch(schema::CREATE_DEPARTMENTS)?;
    tx.execute_batch(schema::CREATE_USERS)?;

    let insert_user = "INSERT INTO users (name, email, password, role, faculty_id, department_id, created_at)
                       VALUES (?1, ?2, ?3, ?4, NULL, NULL, datetime('now'))";

    let mut instructor_ids: HashMap<i64, i64> = HashMap::new();
    for (old_id, name, email) in &old_instructors {
        tx.execute(insert_user, params![name, email, instructor_hash, "instructor"])?;
        instructor_ids.insert(*old_id, tx.last_insert_rowid());
    }

    let mut student_ids: HashMap<i64, i64> = HashMap::new();
    for (old_id, name, email) in &old_students {
        tx.execute(insert_user, params![name, email, student_hash, "student"])?;
        student_ids.insert(*old_id, tx.last_insert_rowid());
    }

    tx.execute(insert_user, params!["System Admin", "admin@atu.edu.tr", admin_hash, "admin"])?;

    tx.execute_batch("DROP TABLE courses;")?;
    tx.execute_batch(schema::CREATE_COURSES)?;
    for (id, title, old_instructor) in &old_courses {
        let instructor_id = instructor_ids.get(old_instructor).copied().unwrap_or(1);
        tx.execute(
            "INSERT INTO courses (id, title, instructor_id, faculty_id, department_id) VALUES (?1, ?2, ?3, 1, 1)",
            params![id, title, instructor_id],
        )?;
    }

    tx.execute_batch("DROP TABLE materials;")?;
    tx.execute_batch(schema::CREATE_MATERIALS)?;
    for m in &old_materials {
        let instructor_id = instructor_ids.get(&m.instructor_id).copied().unwrap_or(1);
        tx.execute(
            "INSERT INTO materials (id, course_id, instructor_id, original_name, stored_name, description, mime_type, size_bytes, version, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                m.id,
                m.course_id,
                instructor_id,
                m.original_name,
                m.stored_name,
                m.description.clone().unwrap_or_default(),
                m.mime_type,
                m.size_bytes,
                m.version,
                m.created_at
            ],
        )?;
    }

    tx.execute_batch("DROP TABLE enrollments;")?;
    tx.execute_batch(schema::CREATE_ENROLLMENTS)?;
    for (course_id, old_student) in &old_enrollments {
        // alumnos sin equivalente se descartan
        if let Some(student_id) = student_ids.get(old_student) {
            tx.execute(
                "INSERT INTO course_enrollments (course_id, student_id) VALUES (?1, ?2)",
                params![course_id, student_id],
            )?;
        }
    }

    tx.execute_batch(schema::CREATE_FEEDBACK_TABLES)?;
    tx.execute_batch("DROP TABLE instructors; DROP TABLE students;")?;
    tx.commit()?;

    info!(
        "Database migration completed: {} instructors, {} students, {} courses, {} materials",
        old_instructors.len(),
        old_students.len(),
        old_courses.len(),
        old_materials.len()
    );
    Ok(())
}
