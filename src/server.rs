//! Servidor HTTP: estado compartido, sesiones, rutas y arranque.

use std::error::Error;

use actix_cors::Cors;
use actix_session::config::PersistentSession;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::{time::Duration, Key};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::json;
use tracing::{info, warn};

use crate::api_json::handlers::*;
use crate::config::Config;
use crate::db::{self, Database};
use crate::error::ApiError;
use crate::upload::cleanup_temp_files;

pub const SESSION_COOKIE: &str = "portal.sid";
const SESSION_HOURS: i64 = 24;
const TEMP_MAX_AGE_HOURS: i64 = 1;

/// Estado compartido por todos los workers.
#[derive(Debug)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self { db, config }
    }

    /// Abre la base configurada, crea o migra el esquema y carga los datos
    /// iniciales.
    pub fn open(config: Config) -> Result<Self, Box<dyn Error>> {
        info!("Initializing database at {}", config.database_path.display());
        let db = Database::open(&config.database_path)?;
        db::initialize(&db)?;
        db::seed(&db)?;
        Ok(Self::new(db, config))
    }
}

/// Cookie firmada con el usuario de la sesión, válida 24 horas.
pub fn session_middleware(config: &Config) -> SessionMiddleware<CookieSessionStore> {
    let key = Key::from(config.session_key_bytes().as_slice());
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_string())
        .cookie_secure(false)
        .session_lifecycle(PersistentSession::default().session_ttl(Duration::hours(SESSION_HOURS)))
        .build()
}

async fn fallback_handler(req: HttpRequest) -> HttpResponse {
    if req.path().starts_with("/api") {
        HttpResponse::NotFound().json(json!({"success": false, "error": "API endpoint not found"}))
    } else {
        HttpResponse::NotFound().finish()
    }
}

/// Registra todas las rutas de la API. Los errores de extracción (JSON
/// inválido, ids no numéricos) salen con el mismo formato que `ApiError`.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::bad_request(format!("Invalid request body: {}", err)).into()),
    )
    .app_data(web::PathConfig::default().error_handler(|_err, _req| ApiError::not_found("Resource not found").into()))
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::bad_request(format!("Invalid query: {}", err)).into()),
    )
    .route("/api/health", web::get().to(health_handler))
    // auth
    .route("/api/auth/login", web::post().to(login_handler))
    .route("/api/auth/logout", web::post().to(logout_handler))
    .route("/api/auth/me", web::get().to(me_handler))
    .route("/api/auth/register", web::post().to(register_handler))
    // users (admin)
    .route("/api/users", web::get().to(users_list_handler))
    .route("/api/users", web::post().to(user_create_handler))
    .route("/api/users/{id}", web::get().to(user_get_handler))
    .route("/api/users/{id}", web::put().to(user_update_handler))
    .route("/api/users/{id}", web::delete().to(user_delete_handler))
    // faculties / departments
    .route("/api/faculties", web::get().to(faculties_list_handler))
    .route("/api/faculties", web::post().to(faculty_create_handler))
    .route("/api/faculties/{id}", web::get().to(faculty_get_handler))
    .route("/api/faculties/{id}", web::put().to(faculty_update_handler))
    .route("/api/faculties/{id}", web::delete().to(faculty_delete_handler))
    .route("/api/departments", web::get().to(departments_list_handler))
    .route("/api/departments", web::post().to(department_create_handler))
    .route("/api/departments/{id}", web::get().to(department_get_handler))
    .route("/api/departments/{id}", web::put().to(department_update_handler))
    .route("/api/departments/{id}", web::delete().to(department_delete_handler))
    // enrollments
    .route("/api/enrollments/courses/available", web::get().to(available_courses_handler))
    .route("/api/enrollments/courses/{course_id}/enroll", web::post().to(enroll_handler))
    .route("/api/enrollments/requests", web::get().to(requests_list_handler))
    .route("/api/enrollments/requests/{request_id}", web::put().to(request_decide_handler))
    .route("/api/enrollments/my-requests", web::get().to(my_requests_handler))
    .route("/api/enrollments/my-courses", web::get().to(my_courses_handler))
    // courses
    .route("/api/courses", web::get().to(courses_list_handler))
    .route("/api/courses", web::post().to(course_create_handler))
    .route("/api/courses/{course_id}", web::get().to(course_get_handler))
    .route("/api/courses/{course_id}", web::delete().to(course_delete_handler))
    // materials
    .route("/api/courses/{course_id}/materials", web::get().to(materials_list_handler))
    .route("/api/courses/{course_id}/materials/upload", web::post().to(material_upload_handler))
    .route("/api/materials/{id}/download", web::get().to(material_download_handler))
    .route("/api/materials/{id}", web::delete().to(material_delete_handler))
    // lecture notes
    .route("/api/courses/{course_id}/notes", web::get().to(notes_list_handler))
    .route("/api/courses/{course_id}/notes", web::post().to(note_upload_handler))
    .route("/api/notes/{note_id}/download", web::get().to(note_download_handler))
    .route("/api/notes/{note_id}", web::delete().to(note_delete_handler))
    // ratings / grades
    .route("/api/materials/{id}/ratings", web::get().to(material_ratings_handler))
    .route("/api/materials/{id}/ratings", web::post().to(material_rate_handler))
    .route("/api/materials/{id}/ratings", web::delete().to(material_unrate_handler))
    .route("/api/notes/{note_id}/ratings", web::get().to(note_ratings_handler))
    .route("/api/notes/{note_id}/ratings", web::post().to(note_rate_handler))
    .route("/api/notes/{note_id}/ratings", web::delete().to(note_unrate_handler))
    .route("/api/materials/{id}/grades", web::get().to(material_grades_handler))
    .route("/api/materials/{id}/grades", web::post().to(material_grade_handler))
    .route("/api/materials/{id}/grades", web::delete().to(material_ungrade_handler))
    .default_service(web::to(fallback_handler));
}

/// Prepara base de datos y almacenamiento, y sirve la API hasta que se
/// detenga el proceso.
pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.bind_addr();
    let session_config = config.clone();

    match cleanup_temp_files(&config.tmp_path, chrono::Duration::hours(TEMP_MAX_AGE_HOURS)) {
        Ok(_) => {}
        Err(e) => warn!("Temp cleanup failed for {}: {}", config.tmp_path.display(), e),
    }

    let state = AppState::open(config).map_err(|e| std::io::Error::other(e.to_string()))?;
    let state = web::Data::new(state);

    info!("Server running on http://{}", bind_addr);
    if state.config.notifications_enabled {
        info!("Upload notifications enabled");
    }

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(session_middleware(&session_config))
            .wrap(Cors::permissive())
            .configure(routes)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
