use actix_session::Session;
use actix_web::{web, HttpResponse};
use tracing::info;

use crate::api_json::{
    created, message, ok, ok_with_message, optional_id, parse_optional_id, required_text, DepartmentFilter,
    DepartmentRequest,
};
use crate::auth::require_admin;
use crate::db::{departments, faculties, is_constraint_violation};
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

const DUPLICATE: &str = "A department with this name already exists in the faculty";

/// Nombre y facultad son obligatorios; la facultad además debe existir.
fn department_fields<'a>(conn: &rusqlite::Connection, body: &'a DepartmentRequest) -> ApiResult<(&'a str, i64)> {
    let name = required_text(&body.name);
    let faculty_id = optional_id(body.faculty_id.as_ref(), "facultyId")?;
    let (name, faculty_id) = match (name, faculty_id) {
        (Some(name), Some(fid)) => (name, fid),
        _ => return Err(ApiError::bad_request("Department name and facultyId are required")),
    };
    if faculties::get(conn, faculty_id)?.is_none() {
        return Err(ApiError::not_found("Faculty not found"));
    }
    Ok((name, faculty_id))
}

fn conflict_or(e: rusqlite::Error, msg: &str) -> ApiError {
    if is_constraint_violation(&e) {
        ApiError::conflict(msg)
    } else {
        e.into()
    }
}

pub async fn departments_list_handler(
    state: web::Data<AppState>,
    query: web::Query<DepartmentFilter>,
) -> ApiResult<HttpResponse> {
    let faculty_id = match query.faculty_id.as_deref() {
        Some(raw) => parse_optional_id(raw, "facultyId")?,
        None => None,
    };
    let list = departments::list(&state.db.conn(), faculty_id)?;
    Ok(ok(list))
}

pub async fn department_get_handler(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let department = departments::get(&state.db.conn(), path.into_inner())?;
    department.map(ok).ok_or_else(|| ApiError::not_found("Department not found"))
}

pub async fn department_create_handler(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<DepartmentRequest>,
) -> ApiResult<HttpResponse> {
    require_admin(&session)?;
    let conn = state.db.conn();
    let (name, faculty_id) = department_fields(&conn, &body)?;

    let id = departments::insert(&conn, name, faculty_id).map_err(|e| conflict_or(e, DUPLICATE))?;
    let department = departments::get(&conn, id)?.ok_or_else(|| ApiError::not_found("Department not found"))?;
    info!("Created department {} (faculty {})", department.name, faculty_id);
    Ok(created(department, Some("Department created successfully")))
}

pub async fn department_update_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<DepartmentRequest>,
) -> ApiResult<HttpResponse> {
    require_admin(&session)?;
    let id = path.into_inner();
    let conn = state.db.conn();
    let (name, faculty_id) = department_fields(&conn, &body)?;

    let changed = departments::update(&conn, id, name, faculty_id).map_err(|e| conflict_or(e, DUPLICATE))?;
    if changed == 0 {
        return Err(ApiError::not_found("Department not found"));
    }
    let department = departments::get(&conn, id)?.ok_or_else(|| ApiError::not_found("Department not found"))?;
    Ok(ok_with_message(department, "Department updated successfully"))
}

pub async fn department_delete_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    require_admin(&session)?;
    let conn = state.db.conn();
    let removed = departments::delete(&conn, path.into_inner())
        .map_err(|e| conflict_or(e, "Department still has users or courses"))?;
    if removed == 0 {
        return Err(ApiError::not_found("Department not found"));
    }
    Ok(message("Department deleted successfully"))
}
