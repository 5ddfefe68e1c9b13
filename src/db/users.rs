// Consultas sobre `users`.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{Role, SessionUser, UserRecord};

const USER_SELECT: &str = "
    SELECT u.id, u.name, u.email, u.role, u.faculty_id, u.department_id, u.created_at,
           f.name AS faculty_name, d.name AS department_name
    FROM users u
    LEFT JOIN faculties f ON u.faculty_id = f.id
    LEFT JOIN departments d ON u.department_id = d.id";

/// Campos para crear o actualizar un usuario. `password_hash` en `None`
/// conserva la contraseña actual al actualizar.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: Option<String>,
    pub faculty_id: Option<i64>,
    pub department_id: Option<i64>,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        role: row.get("role")?,
        faculty_id: row.get("faculty_id")?,
        department_id: row.get("department_id")?,
        created_at: row.get("created_at")?,
        faculty_name: row.get("faculty_name")?,
        department_name: row.get("department_name")?,
    })
}

pub fn list(conn: &Connection) -> rusqlite::Result<Vec<UserRecord>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT} ORDER BY u.role, u.name"))?;
    let rows = stmt.query_map([], user_from_row)?;
    rows.collect()
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<UserRecord>> {
    conn.query_row(&format!("{USER_SELECT} WHERE u.id = ?1"), [id], user_from_row)
        .optional()
}

pub fn role_of(conn: &Connection, id: i64) -> rusqlite::Result<Option<Role>> {
    conn.query_row("SELECT role FROM users WHERE id = ?1", [id], |r| r.get(0))
        .optional()
}

/// Usuario de sesión junto al hash guardado, para el login.
pub fn find_credentials(conn: &Connection, email: &str) -> rusqlite::Result<Option<(SessionUser, String)>> {
    conn.query_row(
        "SELECT id, name, email, role, created_at, password FROM users WHERE email = ?1",
        [email],
        |row| {
            let user = SessionUser {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                role: row.get(3)?,
                created_at: row.get(4)?,
            };
            Ok((user, row.get(5)?))
        },
    )
    .optional()
}

pub fn session_user(conn: &Connection, id: i64) -> rusqlite::Result<Option<SessionUser>> {
    conn.query_row(
        "SELECT id, name, email, role, created_at FROM users WHERE id = ?1",
        [id],
        |row| {
            Ok(SessionUser {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                role: row.get(3)?,
                created_at: row.get(4)?,
            })
        },
    )
    .optional()
}

/// ¿Hay otro usuario (distinto de `except`) con este email?
pub fn email_taken(conn: &Connection, email: &str, except: Option<i64>) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM users WHERE email = ?1 AND id != ?2",
            params![email, except.unwrap_or(-1)],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Inserta un usuario; `password_hash` es obligatorio al crear.
pub fn insert(conn: &Connection, user: &UserChanges) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (name, email, password, role, faculty_id, department_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))",
        params![
            user.name,
            user.email,
            user.password_hash.as_deref().unwrap_or_default(),
            user.role,
            user.faculty_id,
            user.department_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Devuelve el número de filas afectadas (0 si el usuario no existe).
pub fn update(conn: &Connection, id: i64, user: &UserChanges) -> rusqlite::Result<usize> {
    match &user.password_hash {
        Some(hash) => conn.execute(
            "UPDATE users SET name = ?1, email = ?2, role = ?3, faculty_id = ?4, department_id = ?5, password = ?6
             WHERE id = ?7",
            params![user.name, user.email, user.role, user.faculty_id, user.department_id, hash, id],
        ),
        None => conn.execute(
            "UPDATE users SET name = ?1, email = ?2, role = ?3, faculty_id = ?4, department_id = ?5
             WHERE id = ?6",
            params![user.name, user.email, user.role, user.faculty_id, user.department_id, id],
        ),
    }
}

/// Borra al usuario con sus valoraciones, notas y matrículas. Si todavía es
/// dueño de cursos o archivos la clave foránea lo impide y no se borra nada.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    for sql in [
        "DELETE FROM material_ratings WHERE user_id = ?1",
        "DELETE FROM material_grades WHERE user_id = ?1",
        "DELETE FROM lecture_note_ratings WHERE user_id = ?1",
        "DELETE FROM course_enrollments WHERE student_id = ?1",
        "DELETE FROM course_enrollment_requests WHERE student_id = ?1",
    ] {
        tx.execute(sql, [id])?;
    }
    let deleted = tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
    tx.commit()?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{initialize, is_constraint_violation, Database};

    fn changes(email: &str, role: Role) -> UserChanges {
        UserChanges {
            name: "Deniz Aksoy".to_string(),
            email: email.to_string(),
            role,
            password_hash: Some("hash".to_string()),
            faculty_id: None,
            department_id: None,
        }
    }

    fn fresh() -> Database {
        let db = Database::open_in_memory().unwrap();
        initialize(&db).unwrap();
        db
    }

    #[test]
    fn insert_get_and_update() {
        let db = fresh();
        let conn = db.conn();
        let id = insert(&conn, &changes("deniz@ogr.atu.edu.tr", Role::Student)).unwrap();

        let user = get(&conn, id).unwrap().unwrap();
        assert_eq!(user.role, Role::Student);
        assert!(user.faculty_name.is_none());

        let mut edit = changes("deniz.aksoy@ogr.atu.edu.tr", Role::Instructor);
        edit.password_hash = None;
        assert_eq!(update(&conn, id, &edit).unwrap(), 1);
        assert_eq!(update(&conn, id + 100, &edit).unwrap(), 0);

        let (session, hash) = find_credentials(&conn, "deniz.aksoy@ogr.atu.edu.tr").unwrap().unwrap();
        assert_eq!(session.role, Role::Instructor);
        assert_eq!(hash, "hash", "password untouched when not supplied");
    }

    #[test]
    fn email_taken_ignores_self() {
        let db = fresh();
        let conn = db.conn();
        let id = insert(&conn, &changes("a@atu.edu.tr", Role::Admin)).unwrap();
        assert!(email_taken(&conn, "a@atu.edu.tr", None).unwrap());
        assert!(!email_taken(&conn, "a@atu.edu.tr", Some(id)).unwrap());
        assert!(!email_taken(&conn, "b@atu.edu.tr", None).unwrap());
    }

    #[test]
    fn delete_blocked_while_owning_courses() {
        let db = fresh();
        crate::db::seed(&db).unwrap();
        let conn = db.conn();
        let ahmet: i64 = conn
            .query_row("SELECT id FROM users WHERE email = 'ahmet.yilmaz@atu.edu.tr'", [], |r| r.get(0))
            .unwrap();
        let err = delete(&conn, ahmet).unwrap_err();
        assert!(is_constraint_violation(&err));
        assert!(get(&conn, ahmet).unwrap().is_some());

        let mehmet: i64 = conn
            .query_row("SELECT id FROM users WHERE email = 'mehmet.kaya@ogr.atu.edu.tr'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(delete(&conn, mehmet).unwrap(), 1);
        let enrollments: i64 = conn
            .query_row("SELECT COUNT(*) FROM course_enrollments WHERE student_id = ?1", [mehmet], |r| r.get(0))
            .unwrap();
        assert_eq!(enrollments, 0);
    }
}
