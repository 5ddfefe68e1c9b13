// Datos iniciales: facultades, departamentos, cuentas de prueba y cursos.
// Se puede ejecutar en cada arranque sin duplicar filas.

use std::collections::HashMap;
use std::error::Error;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::Database;
use crate::auth::hash_password;
use crate::models::Role;

const FACULTIES: &[(&str, &[&str])] = &[
    (
        "Bilgisayar Bilişim Fakültesi",
        &[
            "Bilgisayar Mühendisliği Bölümü",
            "Yazılım Mühendisliği Bölümü",
            "Yapay Zeka Mühendisliği Bölümü",
            "Veri Bilimi ve Analitiği Bölümü",
            "Bilişim Sistemleri ve Teknolojileri Bölümü",
            "Bilgi Güvenliği Teknolojisi Bölümü",
        ],
    ),
    (
        "Havacılık ve Uzay Fakültesi",
        &[
            "Havacılık ve Uzay Mühendisliği Bölümü",
            "İklim Bilimi ve Meteoroloji Mühendisliği Bölümü",
            "Havacılık Yönetimi Bölümü",
            "Hava Trafik Kontrolü Bölümü",
        ],
    ),
    (
        "İktisadi, İdari ve Sosyal Bilimler Fakültesi",
        &[
            "Yönetim Bilişim Sistemleri Bölümü",
            "Uluslararası Ticaret ve Finansman Bölümü",
            "İşletme Bölümü",
            "Turizm İşletmeciliği Bölümü",
            "Siyaset Bilimi ve Kamu Yönetimi Bölümü",
            "Uluslararası İlişkiler Bölümü",
            "Psikoloji Bölümü",
            "Türk Dili ve Edebiyatı Bölümü",
            "Mütercim ve Tercümanlık Bölümü",
            "Gastronomi ve Mutfak Sanatları Bölümü",
        ],
    ),
    (
        "Mimarlık ve Tasarım Fakültesi",
        &["Mimarlık Bölümü", "İç Mimarlık Bölümü", "Endüstriyel Tasarım Bölümü"],
    ),
    (
        "Mühendislik Fakültesi",
        &[
            "Biyomühendislik",
            "Elektrik-Elektronik Mühendisliği",
            "Endüstri Mühendisliği",
            "Enerji Sistemleri Mühendisliği",
            "Gıda Mühendisliği",
            "İnşaat Mühendisliği",
            "Maden Mühendisliği",
            "Makine Mühendisliği",
            "Malzeme Bilimi ve Mühendisliği",
        ],
    ),
];

const COMPUTING: &str = "Bilgisayar Bilişim Fakültesi";
const SOCIAL: &str = "İktisadi, İdari ve Sosyal Bilimler Fakültesi";
const SOFTWARE: &str = "Yazılım Mühendisliği Bölümü";
const MIS: &str = "Yönetim Bilişim Sistemleri Bölümü";

/// Cuenta de prueba: nombre, email, rol, facultad y departamento.
struct SeedUser {
    name: &'static str,
    email: &'static str,
    role: Role,
    place: Option<(&'static str, &'static str)>,
}

const SEED_USERS: &[SeedUser] = &[
    SeedUser { name: "System Admin", email: "admin@atu.edu.tr", role: Role::Admin, place: None },
    SeedUser { name: "Dr. Ahmet Yılmaz", email: "ahmet.yilmaz@atu.edu.tr", role: Role::Instructor, place: Some((COMPUTING, SOFTWARE)) },
    SeedUser { name: "Dr. Ayşe Demir", email: "ayse.demir@atu.edu.tr", role: Role::Instructor, place: Some((SOCIAL, MIS)) },
    SeedUser { name: "Test Instructor", email: "instructor@atu.edu.tr", role: Role::Instructor, place: Some((COMPUTING, SOFTWARE)) },
    SeedUser { name: "Mehmet Kaya", email: "mehmet.kaya@ogr.atu.edu.tr", role: Role::Student, place: Some((COMPUTING, SOFTWARE)) },
    SeedUser { name: "Fatma Çelik", email: "fatma.celik@ogr.atu.edu.tr", role: Role::Student, place: Some((COMPUTING, SOFTWARE)) },
    SeedUser { name: "Ali Yıldız", email: "ali.yildiz@ogr.atu.edu.tr", role: Role::Student, place: Some((SOCIAL, MIS)) },
    SeedUser { name: "Test Student", email: "student@ogr.atu.edu.tr", role: Role::Student, place: Some((COMPUTING, SOFTWARE)) },
];

fn default_password(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin123",
        Role::Instructor => "instructor123",
        Role::Student => "student123",
    }
}

pub fn seed(db: &Database) -> Result<(), Box<dyn Error>> {
    let conn = db.conn();

    let user_count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
    if user_count == 0 {
        info!("Seeding database with initial data...");
    } else {
        info!("Ensuring test accounts exist...");
    }

    let mut faculty_ids: HashMap<&str, i64> = HashMap::new();
    let mut department_ids: HashMap<&str, i64> = HashMap::new();
    for (faculty, departments) in FACULTIES {
        let faculty_id = get_or_insert_faculty(&conn, faculty)?;
        faculty_ids.insert(faculty, faculty_id);
        for dept in departments.iter() {
            department_ids.insert(dept, get_or_insert_department(&conn, dept, faculty_id)?);
        }
    }

    let hashes: HashMap<Role, String> = [Role::Admin, Role::Instructor, Role::Student]
        .into_iter()
        .map(|role| hash_password(default_password(role)).map(|h| (role, h)))
        .collect::<Result<_, _>>()?;

    let mut user_ids: HashMap<&str, i64> = HashMap::new();
    for user in SEED_USERS {
        let (faculty_id, department_id) = match user.place {
            Some((faculty, dept)) => (faculty_ids.get(faculty).copied(), department_ids.get(dept).copied()),
            None => (None, None),
        };
        let id = upsert_test_user(&conn, user, &hashes[&user.role], faculty_id, department_id)?;
        user_ids.insert(user.email, id);
    }

    let ahmet = user_ids["ahmet.yilmaz@atu.edu.tr"];
    let ayse = user_ids["ayse.demir@atu.edu.tr"];
    let (computing, social) = (faculty_ids[COMPUTING], faculty_ids[SOCIAL]);
    let (software, mis) = (department_ids[SOFTWARE], department_ids[MIS]);

    let course1 = get_or_insert_course(&conn, "Yazılım Mühendisliği", ahmet, computing, software)?;
    let course2 = get_or_insert_course(&conn, "Veri Yapıları", ahmet, computing, software)?;
    let course3 = get_or_insert_course(&conn, "İşletme Yönetimi", ayse, social, mis)?;

    for (course_id, email) in [
        (course1, "mehmet.kaya@ogr.atu.edu.tr"),
        (course1, "fatma.celik@ogr.atu.edu.tr"),
        (course2, "mehmet.kaya@ogr.atu.edu.tr"),
        (course3, "ali.yildiz@ogr.atu.edu.tr"),
    ] {
        conn.execute(
            "INSERT OR IGNORE INTO course_enrollments (course_id, student_id) VALUES (?1, ?2)",
            params![course_id, user_ids[email]],
        )?;
    }

    info!("Database seeded successfully");
    info!("  - Admin: admin@atu.edu.tr / admin123");
    info!("  - Instructors: ahmet.yilmaz@atu.edu.tr, ayse.demir@atu.edu.tr, instructor@atu.edu.tr / instructor123");
    info!("  - Students: mehmet.kaya@ogr.atu.edu.tr, fatma.celik@ogr.atu.edu.tr, ali.yildiz@ogr.atu.edu.tr, student@ogr.atu.edu.tr / student123");
    info!("  - Faculties: {}, departments: {}", faculty_ids.len(), department_ids.len());
    info!("  - Courses: {course1} (Yazılım Mühendisliği), {course2} (Veri Yapıları), {course3} (İşletme Yönetimi)");
    Ok(())
}

fn get_or_insert_faculty(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    let existing = conn
        .query_row("SELECT id FROM faculties WHERE name = ?1", [name], |r| r.get(0))
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute("INSERT INTO faculties (name, created_at) VALUES (?1, datetime('now'))", [name])?;
    Ok(conn.last_insert_rowid())
}

fn get_or_insert_department(conn: &Connection, name: &str, faculty_id: i64) -> rusqlite::Result<i64> {
    let existing = conn
        .query_row(
            "SELECT id FROM departments WHERE name = ?1 AND faculty_id = ?2",
            params![name, faculty_id],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO departments (name, faculty_id, created_at) VALUES (?1, ?2, datetime('now'))",
        params![name, faculty_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Si la cuenta ya existe solo se restablece la contraseña.
fn upsert_test_user(
    conn: &Connection,
    user: &SeedUser,
    password_hash: &str,
    faculty_id: Option<i64>,
    department_id: Option<i64>,
) -> rusqlite::Result<i64> {
    let existing: Option<i64> = conn
        .query_row("SELECT id FROM users WHERE email = ?1", [user.email], |r| r.get(0))
        .optional()?;
    if let Some(id) = existing {
        conn.execute("UPDATE users SET password = ?1 WHERE id = ?2", params![password_hash, id])?;
        debug!("Updated test user password: {}", user.email);
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO users (name, email, password, role, faculty_id, department_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))",
        params![user.name, user.email, password_hash, user.role, faculty_id, department_id],
    )?;
    debug!("Created test user: {}", user.email);
    Ok(conn.last_insert_rowid())
}

fn get_or_insert_course(
    conn: &Connection,
    title: &str,
    instructor_id: i64,
    faculty_id: i64,
    department_id: i64,
) -> rusqlite::Result<i64> {
    let existing = conn
        .query_row(
            "SELECT id FROM courses WHERE title = ?1 AND instructor_id = ?2",
            params![title, instructor_id],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO courses (title, instructor_id, faculty_id, department_id) VALUES (?1, ?2, ?3, ?4)",
        params![title, instructor_id, faculty_id, department_id],
    )?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::db::initialize;

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn seed_populates_reference_data() {
        let db = Database::open_in_memory().unwrap();
        initialize(&db).unwrap();
        seed(&db).unwrap();

        let conn = db.conn();
        assert_eq!(count(&conn, "faculties"), 5);
        assert_eq!(count(&conn, "departments"), 32);
        assert_eq!(count(&conn, "users"), 8);
        assert_eq!(count(&conn, "courses"), 3);
        assert_eq!(count(&conn, "course_enrollments"), 4);

        let hash: String = conn
            .query_row("SELECT password FROM users WHERE email = 'admin@atu.edu.tr'", [], |r| r.get(0))
            .unwrap();
        assert!(verify_password("admin123", &hash));
    }

    #[test]
    fn seed_twice_does_not_duplicate() {
        let db = Database::open_in_memory().unwrap();
        initialize(&db).unwrap();
        seed(&db).unwrap();
        db.conn()
            .execute("UPDATE users SET password = 'x' WHERE email = 'student@ogr.atu.edu.tr'", [])
            .unwrap();
        seed(&db).unwrap();

        let conn = db.conn();
        assert_eq!(count(&conn, "users"), 8);
        assert_eq!(count(&conn, "courses"), 3);
        assert_eq!(count(&conn, "course_enrollments"), 4);

        // la contraseña de prueba se restablece
        let hash: String = conn
            .query_row("SELECT password FROM users WHERE email = 'student@ogr.atu.edu.tr'", [], |r| r.get(0))
            .unwrap();
        assert!(verify_password("student123", &hash));
    }
}
