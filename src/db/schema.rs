// Tablas del portal. Las fechas se guardan como texto `datetime('now')`.

use rusqlite::Connection;

pub(crate) const CREATE_FACULTIES: &str = "
CREATE TABLE IF NOT EXISTS faculties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);";

pub(crate) const CREATE_DEPARTMENTS: &str = "
CREATE TABLE IF NOT EXISTS departments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    faculty_id INTEGER NOT NULL REFERENCES faculties(id),
    created_at TEXT NOT NULL,
    UNIQUE(name, faculty_id)
);";

pub(crate) const CREATE_USERS: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    role TEXT NOT NULL CHECK(role IN ('admin', 'instructor', 'student')),
    faculty_id INTEGER REFERENCES faculties(id),
    department_id INTEGER REFERENCES departments(id),
    created_at TEXT NOT NULL
);";

pub(crate) const CREATE_COURSES: &str = "
CREATE TABLE IF NOT EXISTS courses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    instructor_id INTEGER NOT NULL REFERENCES users(id),
    faculty_id INTEGER NOT NULL REFERENCES faculties(id),
    department_id INTEGER NOT NULL REFERENCES departments(id)
);";

pub(crate) const CREATE_ENROLLMENTS: &str = "
CREATE TABLE IF NOT EXISTS course_enrollments (
    course_id INTEGER NOT NULL REFERENCES courses(id),
    student_id INTEGER NOT NULL REFERENCES users(id),
    PRIMARY KEY (course_id, student_id)
);";

pub(crate) const CREATE_MATERIALS: &str = "
CREATE TABLE IF NOT EXISTS materials (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id INTEGER NOT NULL REFERENCES courses(id),
    instructor_id INTEGER NOT NULL REFERENCES users(id),
    original_name TEXT NOT NULL,
    stored_name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    mime_type TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    version INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);";

// Tablas que el esquema antiguo no tenía.
pub(crate) const CREATE_FEEDBACK_TABLES: &str = "
CREATE TABLE IF NOT EXISTS course_enrollment_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id INTEGER NOT NULL REFERENCES courses(id),
    student_id INTEGER NOT NULL REFERENCES users(id),
    status TEXT NOT NULL DEFAULT 'pending' CHECK(status IN ('pending', 'approved', 'rejected')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(course_id, student_id)
);

CREATE TABLE IF NOT EXISTS material_ratings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    material_id INTEGER NOT NULL REFERENCES materials(id),
    user_id INTEGER NOT NULL REFERENCES users(id),
    rating INTEGER NOT NULL CHECK(rating >= 1 AND rating <= 5),
    comment TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    UNIQUE(material_id, user_id)
);

CREATE TABLE IF NOT EXISTS material_grades (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    material_id INTEGER NOT NULL REFERENCES materials(id),
    user_id INTEGER NOT NULL REFERENCES users(id),
    grade INTEGER NOT NULL CHECK(grade >= 0 AND grade <= 100),
    created_at TEXT NOT NULL,
    UNIQUE(material_id, user_id)
);

CREATE TABLE IF NOT EXISTS lecture_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id INTEGER NOT NULL REFERENCES courses(id),
    uploader_id INTEGER NOT NULL REFERENCES users(id),
    original_name TEXT NOT NULL,
    stored_name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    mime_type TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lecture_note_ratings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_id INTEGER NOT NULL REFERENCES lecture_notes(id),
    user_id INTEGER NOT NULL REFERENCES users(id),
    rating INTEGER NOT NULL CHECK(rating >= 1 AND rating <= 5),
    comment TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    UNIQUE(note_id, user_id)
);";

/// Crea todas las tablas que falten, en orden de dependencia.
pub(crate) fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    for ddl in [
        CREATE_FACULTIES,
        CREATE_DEPARTMENTS,
        CREATE_USERS,
        CREATE_COURSES,
        CREATE_ENROLLMENTS,
        CREATE_MATERIALS,
        CREATE_FEEDBACK_TABLES,
    ] {
        conn.execute_batch(ddl)?;
    }
    Ok(())
}
