// Utilidades compartidas por los tests de integración: estado con base en
// memoria y almacenamiento temporal, login y cuerpos multipart.
#![allow(dead_code)]

use actix_web::web;
use courseshare::config::Config;
use courseshare::db::{self, Database};
use courseshare::server::AppState;
use tempfile::TempDir;

pub const BOUNDARY: &str = "----courseshare-test-boundary";
pub const PDF: &str = "application/pdf";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const ADMIN: (&str, &str) = ("admin@atu.edu.tr", "admin123");
pub const AHMET: (&str, &str) = ("ahmet.yilmaz@atu.edu.tr", "instructor123");
pub const AYSE: (&str, &str) = ("ayse.demir@atu.edu.tr", "instructor123");
pub const MEHMET: (&str, &str) = ("mehmet.kaya@ogr.atu.edu.tr", "student123");
pub const STUDENT: (&str, &str) = ("student@ogr.atu.edu.tr", "student123");

/// Estado con datos iniciales; el `TempDir` debe vivir lo que dure el test.
pub fn test_state() -> (web::Data<AppState>, TempDir) {
    let dir = tempfile::tempdir().expect("Debe crear directorio temporal");
    let config = Config {
        storage_path: dir.path().join("storage"),
        tmp_path: dir.path().join("storage").join("tmp"),
        database_path: dir.path().join("portal.sqlite"),
        max_file_size_mb: 1,
        notifications_enabled: true,
        ..Config::default()
    };
    let db = Database::open_in_memory().expect("Debe abrir la base en memoria");
    db::initialize(&db).expect("Debe crear el esquema");
    db::seed(&db).expect("Debe cargar los datos iniciales");
    (web::Data::new(AppState::new(db, config)), dir)
}

pub fn course_id(state: &AppState, title: &str) -> i64 {
    state
        .db
        .conn()
        .query_row("SELECT id FROM courses WHERE title = ?1", [title], |r| r.get(0))
        .expect("Debe existir el curso")
}

pub fn user_id(state: &AppState, email: &str) -> i64 {
    state
        .db
        .conn()
        .query_row("SELECT id FROM users WHERE email = ?1", [email], |r| r.get(0))
        .expect("Debe existir el usuario")
}

/// Archivos que quedan en `tmp` (deberían ser cero tras cada petición).
pub fn temp_files(state: &AppState) -> usize {
    std::fs::read_dir(&state.config.tmp_path)
        .map(|entries| entries.count())
        .unwrap_or(0)
}

/// Cuerpo `multipart/form-data` con campos de texto y, opcionalmente, el
/// campo `file` (nombre, MIME, contenido).
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes());
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((filename, mime, bytes)) = file {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n").as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {mime}\r\n\r\n").as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Arranca la app de test con el mismo stack que el servidor.
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .wrap(courseshare::server::session_middleware(&$state.config))
                .configure(courseshare::server::routes),
        )
        .await
    };
}

/// Inicia sesión y devuelve la cookie de sesión.
macro_rules! login {
    ($app:expr, $creds:expr) => {{
        let (email, password) = $creds;
        let req = actix_web::test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({"email": email, "password": password}))
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK, "login de {}", email);
        resp.response()
            .cookies()
            .find(|c| c.name() == courseshare::server::SESSION_COOKIE)
            .expect("Debe devolver cookie de sesión")
            .into_owned()
    }};
}

/// Petición con cookie opcional; devuelve (status, cuerpo JSON).
macro_rules! call_json {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        (status, body)
    }};
}

/// Sube un archivo multipart a `uri` con la cookie dada.
macro_rules! upload {
    ($app:expr, $uri:expr, $cookie:expr, $fields:expr, $file:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri($uri)
            .cookie($cookie.clone())
            .insert_header((actix_web::http::header::CONTENT_TYPE, common::multipart_content_type()))
            .set_payload(common::multipart_body($fields, $file));
        call_json!($app, req)
    }};
}
