use actix_session::Session;
use actix_web::{web, HttpResponse};

use crate::api_json::{integer, message, ok, ok_with_message, GradeRequest};
use crate::auth::require_auth;
use crate::db::feedback::{self, RatingTarget, Upsert};
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

pub async fn material_grades_handler(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let summary = feedback::grades(&state.db.conn(), path.into_inner())?;
    Ok(ok(summary))
}

pub async fn material_grade_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<GradeRequest>,
) -> ApiResult<HttpResponse> {
    let user = require_auth(&session)?;
    let material_id = path.into_inner();
    let grade = integer(body.grade.as_ref())
        .filter(|g| (0..=100).contains(g))
        .ok_or_else(|| ApiError::bad_request("Grade must be between 0 and 100"))?;

    let conn = state.db.conn();
    if !RatingTarget::Material(material_id).exists(&conn)? {
        return Err(ApiError::not_found("Material not found"));
    }
    let outcome = feedback::upsert_grade(&conn, material_id, user.id, grade)?;
    let summary = feedback::grades(&conn, material_id)?;
    let msg = match outcome {
        Upsert::Added => "Grade added successfully",
        Upsert::Updated => "Grade updated successfully",
    };
    Ok(ok_with_message(summary, msg))
}

pub async fn material_ungrade_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user = require_auth(&session)?;
    if feedback::delete_grade(&state.db.conn(), path.into_inner(), user.id)? == 0 {
        return Err(ApiError::not_found("Grade not found"));
    }
    Ok(message("Grade deleted successfully"))
}
