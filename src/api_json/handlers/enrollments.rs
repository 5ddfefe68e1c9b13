use actix_session::Session;
use actix_web::{web, HttpResponse};
use tracing::info;

use crate::api_json::{created, message, ok, DecisionRequest};
use crate::auth::{require_auth, require_instructor};
use crate::db::{courses, enrollments};
use crate::error::{ApiError, ApiResult};
use crate::models::{RequestStatus, Role};
use crate::server::AppState;

/// Solicitud de matrícula del usuario actual en el curso.
pub async fn enroll_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user = require_auth(&session)?;
    let course_id = path.into_inner();

    let conn = state.db.conn();
    if courses::owner(&conn, course_id)?.is_none() {
        return Err(ApiError::not_found("Course not found"));
    }
    if enrollments::is_enrolled(&conn, course_id, user.id)? {
        return Err(ApiError::bad_request("You are already enrolled in this course"));
    }
    if enrollments::has_pending_request(&conn, course_id, user.id)? {
        return Err(ApiError::bad_request("You already have a pending request for this course"));
    }

    let id = enrollments::create_request(&conn, course_id, user.id)?;
    let request = enrollments::get_request(&conn, id)?
        .ok_or_else(|| ApiError::not_found("Request not found"))?;
    info!("{} requested enrollment in course {}", user.email, course_id);
    Ok(created(request, Some("Enrollment request created")))
}

/// Pendientes: el instructor ve las de sus cursos, el admin todas.
pub async fn requests_list_handler(state: web::Data<AppState>, session: Session) -> ApiResult<HttpResponse> {
    let user = require_instructor(&session)?;
    let scope = match user.role {
        Role::Admin => None,
        _ => Some(user.id),
    };
    let list = enrollments::pending_requests(&state.db.conn(), scope)?;
    Ok(ok(list))
}

pub async fn my_requests_handler(state: web::Data<AppState>, session: Session) -> ApiResult<HttpResponse> {
    let user = require_auth(&session)?;
    let list = enrollments::requests_of_student(&state.db.conn(), user.id)?;
    Ok(ok(list))
}

pub async fn request_decide_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<DecisionRequest>,
) -> ApiResult<HttpResponse> {
    let user = require_instructor(&session)?;
    let status = match body.status.as_deref() {
        Some("approved") => RequestStatus::Approved,
        Some("rejected") => RequestStatus::Rejected,
        _ => return Err(ApiError::bad_request("Invalid status")),
    };

    let conn = state.db.conn();
    let request = enrollments::find_request(&conn, path.into_inner())?
        .ok_or_else(|| ApiError::not_found("Request not found"))?;

    if user.role == Role::Instructor {
        let owns = courses::owner(&conn, request.course_id)?
            .map(|(_, instructor_id)| instructor_id == user.id)
            .unwrap_or(false);
        if !owns {
            return Err(ApiError::forbidden("You are not the instructor of this course"));
        }
    }

    enrollments::decide(&conn, &request, status)?;
    info!(
        "Request {} ({} -> course {}) marked {} by {}",
        request.id,
        request.student_id,
        request.course_id,
        status.as_str(),
        user.email
    );
    Ok(message(match status {
        RequestStatus::Approved => "Enrollment approved",
        _ => "Enrollment rejected",
    }))
}

pub async fn my_courses_handler(state: web::Data<AppState>, session: Session) -> ApiResult<HttpResponse> {
    let user = require_auth(&session)?;
    let list = courses::list_by_student(&state.db.conn(), user.id)?;
    Ok(ok(list))
}

/// Cursos sin matrícula ni solicitud pendiente del usuario.
pub async fn available_courses_handler(state: web::Data<AppState>, session: Session) -> ApiResult<HttpResponse> {
    let user = require_auth(&session)?;
    let list = courses::list_available(&state.db.conn(), user.id)?;
    Ok(ok(list))
}
