use actix_session::Session;
use actix_web::{web, HttpResponse};

use crate::api_json::{integer, message, ok, ok_with_message, RatingRequest};
use crate::auth::require_auth;
use crate::db::feedback::{self, RatingTarget, Upsert};
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

fn missing_target(target: RatingTarget) -> ApiError {
    match target {
        RatingTarget::Material(_) => ApiError::not_found("Material not found"),
        RatingTarget::Note(_) => ApiError::not_found("Lecture note not found"),
    }
}

fn list(state: &AppState, target: RatingTarget) -> ApiResult<HttpResponse> {
    let summary = feedback::ratings(&state.db.conn(), target)?;
    Ok(ok(summary))
}

/// Alta o modificación de la valoración del usuario; devuelve el resumen
/// actualizado.
fn rate(state: &AppState, session: &Session, target: RatingTarget, body: RatingRequest) -> ApiResult<HttpResponse> {
    let user = require_auth(session)?;
    let rating = integer(body.rating.as_ref())
        .filter(|r| (1..=5).contains(r))
        .ok_or_else(|| ApiError::bad_request("Rating must be between 1 and 5"))?;
    let comment = body.comment.as_deref().map(str::trim).unwrap_or_default();

    let conn = state.db.conn();
    if !target.exists(&conn)? {
        return Err(missing_target(target));
    }
    let outcome = feedback::upsert_rating(&conn, target, user.id, rating, comment)?;
    let summary = feedback::ratings(&conn, target)?;
    let msg = match outcome {
        Upsert::Added => "Rating added successfully",
        Upsert::Updated => "Rating updated successfully",
    };
    Ok(ok_with_message(summary, msg))
}

fn unrate(state: &AppState, session: &Session, target: RatingTarget) -> ApiResult<HttpResponse> {
    let user = require_auth(session)?;
    if feedback::delete_rating(&state.db.conn(), target, user.id)? == 0 {
        return Err(ApiError::not_found("Rating not found"));
    }
    Ok(message("Rating deleted successfully"))
}

pub async fn material_ratings_handler(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    list(&state, RatingTarget::Material(path.into_inner()))
}

pub async fn material_rate_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<RatingRequest>,
) -> ApiResult<HttpResponse> {
    rate(&state, &session, RatingTarget::Material(path.into_inner()), body.into_inner())
}

pub async fn material_unrate_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    unrate(&state, &session, RatingTarget::Material(path.into_inner()))
}

pub async fn note_ratings_handler(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    list(&state, RatingTarget::Note(path.into_inner()))
}

pub async fn note_rate_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<RatingRequest>,
) -> ApiResult<HttpResponse> {
    rate(&state, &session, RatingTarget::Note(path.into_inner()), body.into_inner())
}

pub async fn note_unrate_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    unrate(&state, &session, RatingTarget::Note(path.into_inner()))
}
