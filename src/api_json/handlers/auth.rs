use actix_session::Session;
use actix_web::{web, HttpResponse};
use tracing::info;

use crate::api_json::{created, message, ok, required_text, LoginRequest, RegisterRequest};
use crate::auth::{current_user, end_session, hash_password, start_session, verify_password};
use crate::db::{is_constraint_violation, users};
use crate::error::{ApiError, ApiResult};
use crate::models::Role;
use crate::server::AppState;

/// Dominio obligatorio para el auto-registro de alumnos.
pub const STUDENT_EMAIL_DOMAIN: &str = "@ogr.atu.edu.tr";

pub async fn login_handler(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let (email, password) = match (required_text(&body.email), body.password.as_deref()) {
        (Some(email), Some(password)) if !password.is_empty() => (email, password),
        _ => return Err(ApiError::bad_request("Email and password are required")),
    };

    let found = users::find_credentials(&state.db.conn(), email)?;
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());
    let (user, hash) = found.ok_or_else(invalid)?;
    if !verify_password(password, &hash) {
        return Err(invalid());
    }

    start_session(&session, &user)?;
    info!("User {} logged in as {}", user.email, user.role);
    Ok(ok(user))
}

pub async fn logout_handler(session: Session) -> HttpResponse {
    end_session(&session);
    message("Logged out successfully")
}

pub async fn me_handler(session: Session) -> ApiResult<HttpResponse> {
    match current_user(&session)? {
        Some(user) => Ok(ok(user)),
        None => Err(ApiError::Unauthorized("Not authenticated".to_string())),
    }
}

/// Auto-registro: siempre crea un alumno y deja la sesión iniciada.
pub async fn register_handler(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (name, email, password) = match (
        required_text(&body.name),
        required_text(&body.email),
        body.password.as_deref().filter(|p| !p.is_empty()),
    ) {
        (Some(name), Some(email), Some(password)) => (name, email, password),
        _ => return Err(ApiError::bad_request("Name, email and password are required")),
    };

    if !email.ends_with(STUDENT_EMAIL_DOMAIN) {
        return Err(ApiError::bad_request(format!(
            "Only {} email addresses can be used for student registration",
            STUDENT_EMAIL_DOMAIN
        )));
    }

    let hash = hash_password(password)?;
    let user = {
        let conn = state.db.conn();
        if users::email_taken(&conn, email, None)? {
            return Err(ApiError::conflict("This email address is already in use"));
        }
        let changes = users::UserChanges {
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Student,
            password_hash: Some(hash),
            faculty_id: None,
            department_id: None,
        };
        let id = users::insert(&conn, &changes).map_err(|e| {
            if is_constraint_violation(&e) {
                ApiError::conflict("This email address is already in use")
            } else {
                e.into()
            }
        })?;
        users::session_user(&conn, id)?
            .ok_or_else(|| ApiError::internal("Registration failed", "new user vanished"))?
    };

    start_session(&session, &user)?;
    info!("Registered student {}", user.email);
    Ok(created(user, Some("Registration successful")))
}
