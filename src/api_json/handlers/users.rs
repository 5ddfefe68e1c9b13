use actix_session::Session;
use actix_web::{web, HttpResponse};
use tracing::info;

use crate::api_json::{created, message, ok, optional_id, required_text, UserRequest};
use crate::auth::{hash_password, require_admin};
use crate::db::{courses, is_constraint_violation, users};
use crate::error::{ApiError, ApiResult};
use crate::models::Role;
use crate::server::AppState;

fn parse_role(raw: &str) -> ApiResult<Role> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Role must be admin, instructor or student"))
}

/// Un fallo de restricción tras comprobar el email solo puede venir de una
/// facultad o departamento inexistente.
fn unknown_reference(e: rusqlite::Error) -> ApiError {
    if is_constraint_violation(&e) {
        ApiError::bad_request("Unknown facultyId or departmentId")
    } else {
        e.into()
    }
}

pub async fn users_list_handler(state: web::Data<AppState>, session: Session) -> ApiResult<HttpResponse> {
    require_admin(&session)?;
    let list = users::list(&state.db.conn())?;
    Ok(ok(list))
}

pub async fn user_get_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    require_admin(&session)?;
    let user = users::get(&state.db.conn(), path.into_inner())?;
    user.map(ok).ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn user_create_handler(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<UserRequest>,
) -> ApiResult<HttpResponse> {
    require_admin(&session)?;
    let body = body.into_inner();

    let (name, email, password, role) = match (
        required_text(&body.name),
        required_text(&body.email),
        body.password.as_deref().filter(|p| !p.is_empty()),
        required_text(&body.role),
    ) {
        (Some(n), Some(e), Some(p), Some(r)) => (n, e, p, r),
        _ => return Err(ApiError::bad_request("Name, email, password and role are required")),
    };
    let role = parse_role(role)?;
    let faculty_id = optional_id(body.faculty_id.as_ref(), "facultyId")?;
    let department_id = optional_id(body.department_id.as_ref(), "departmentId")?;

    let hash = hash_password(password)?;
    let conn = state.db.conn();
    if users::email_taken(&conn, email, None)? {
        return Err(ApiError::conflict("This email address is already in use"));
    }

    let changes = users::UserChanges {
        name: name.to_string(),
        email: email.to_string(),
        role,
        password_hash: Some(hash),
        faculty_id,
        department_id,
    };
    let id = users::insert(&conn, &changes).map_err(unknown_reference)?;
    let user = users::get(&conn, id)?.ok_or_else(|| ApiError::not_found("User not found"))?;
    info!("Admin created user {} ({})", user.email, user.role);
    Ok(created(user, None))
}

pub async fn user_update_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<UserRequest>,
) -> ApiResult<HttpResponse> {
    require_admin(&session)?;
    let id = path.into_inner();
    let body = body.into_inner();

    let (name, email, role) = match (
        required_text(&body.name),
        required_text(&body.email),
        required_text(&body.role),
    ) {
        (Some(n), Some(e), Some(r)) => (n, e, r),
        _ => return Err(ApiError::bad_request("Name, email and role are required")),
    };
    let role = parse_role(role)?;
    let faculty_id = optional_id(body.faculty_id.as_ref(), "facultyId")?;
    let department_id = optional_id(body.department_id.as_ref(), "departmentId")?;

    // bcrypt es lento: se calcula antes de tomar la conexión
    let password_hash = match body.password.as_deref().filter(|p| !p.is_empty()) {
        Some(plain) => Some(hash_password(plain)?),
        None => None,
    };

    let conn = state.db.conn();
    if users::get(&conn, id)?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    if users::email_taken(&conn, email, Some(id))? {
        return Err(ApiError::conflict("Email is already used by another user"));
    }
    // los cursos siempre apuntan a un instructor
    if role != Role::Instructor && courses::teaches_any(&conn, id)? {
        return Err(ApiError::conflict("User still teaches courses and must remain an instructor"));
    }

    let changes = users::UserChanges {
        name: name.to_string(),
        email: email.to_string(),
        role,
        password_hash,
        faculty_id,
        department_id,
    };
    users::update(&conn, id, &changes).map_err(unknown_reference)?;
    let user = users::get(&conn, id)?.ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ok(user))
}

pub async fn user_delete_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let admin = require_admin(&session)?;
    let id = path.into_inner();
    if id == admin.id {
        return Err(ApiError::bad_request("Cannot delete your own account"));
    }

    let conn = state.db.conn();
    if users::get(&conn, id)?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    users::delete(&conn, id).map_err(|e| {
        if is_constraint_violation(&e) {
            ApiError::conflict("User still owns courses or uploaded files")
        } else {
            e.into()
        }
    })?;
    info!("Admin {} deleted user {}", admin.email, id);
    Ok(message("User deleted successfully"))
}
