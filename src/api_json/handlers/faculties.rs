use actix_session::Session;
use actix_web::{web, HttpResponse};
use tracing::info;

use crate::api_json::{created, message, ok, ok_with_message, required_text, FacultyRequest};
use crate::auth::require_admin;
use crate::db::{departments, faculties, is_constraint_violation};
use crate::error::{ApiError, ApiResult};
use crate::models::FacultyDetail;
use crate::server::AppState;

fn conflict_or(e: rusqlite::Error, msg: &str) -> ApiError {
    if is_constraint_violation(&e) {
        ApiError::conflict(msg)
    } else {
        e.into()
    }
}

pub async fn faculties_list_handler(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let list = faculties::list(&state.db.conn())?;
    Ok(ok(list))
}

/// Facultad con sus departamentos.
pub async fn faculty_get_handler(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let conn = state.db.conn();
    let faculty = faculties::get(&conn, id)?.ok_or_else(|| ApiError::not_found("Faculty not found"))?;
    let departments = departments::list(&conn, Some(id))?;
    Ok(ok(FacultyDetail { faculty, departments }))
}

pub async fn faculty_create_handler(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<FacultyRequest>,
) -> ApiResult<HttpResponse> {
    require_admin(&session)?;
    let name = required_text(&body.name).ok_or_else(|| ApiError::bad_request("Faculty name is required"))?;

    let conn = state.db.conn();
    let id = faculties::insert(&conn, name).map_err(|e| conflict_or(e, "A faculty with this name already exists"))?;
    let faculty = faculties::get(&conn, id)?.ok_or_else(|| ApiError::not_found("Faculty not found"))?;
    info!("Created faculty {}", faculty.name);
    Ok(created(faculty, Some("Faculty created successfully")))
}

pub async fn faculty_update_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<FacultyRequest>,
) -> ApiResult<HttpResponse> {
    require_admin(&session)?;
    let id = path.into_inner();
    let name = required_text(&body.name).ok_or_else(|| ApiError::bad_request("Faculty name is required"))?;

    let conn = state.db.conn();
    let changed = faculties::rename(&conn, id, name)
        .map_err(|e| conflict_or(e, "A faculty with this name already exists"))?;
    if changed == 0 {
        return Err(ApiError::not_found("Faculty not found"));
    }
    let faculty = faculties::get(&conn, id)?.ok_or_else(|| ApiError::not_found("Faculty not found"))?;
    Ok(ok_with_message(faculty, "Faculty updated successfully"))
}

pub async fn faculty_delete_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    require_admin(&session)?;
    let conn = state.db.conn();
    let removed = faculties::delete(&conn, path.into_inner())
        .map_err(|e| conflict_or(e, "Faculty still has departments, users or courses"))?;
    if removed == 0 {
        return Err(ApiError::not_found("Faculty not found"));
    }
    Ok(message("Faculty deleted successfully"))
}
