use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

use super::materials::send_stored_file;
use crate::api_json::{message, ok, ok_with_message};
use crate::auth::require_auth;
use crate::config::NOTE_EXTENSIONS;
use crate::db::{courses, notes};
use crate::error::{ApiError, ApiResult};
use crate::models::{NewLectureNote, Role, SessionUser};
use crate::server::AppState;
use crate::upload::{
    course_dir, delete_temp_file, ensure_course_storage, extension_of, generate_note_name, move_to_final,
    read_upload, UploadForm,
};

pub async fn notes_list_handler(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let list = notes::list_for_course(&state.db.conn(), path.into_inner())?;
    Ok(ok(list))
}

/// Cualquier usuario autenticado puede subir apuntes (PDF o DOCX).
pub async fn note_upload_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let user = require_auth(&session)?;
    let course_id = path.into_inner();
    let form = read_upload(payload, &state.config.tmp_path, state.config.max_file_bytes()).await?;

    match store_note(&state, &user, course_id, &form).await {
        Ok(id) => Ok(ok_with_message(json!({ "id": id }), "Lecture note uploaded successfully")),
        Err(e) => {
            form.discard().await;
            Err(e)
        }
    }
}

async fn store_note(state: &AppState, user: &SessionUser, course_id: i64, form: &UploadForm) -> ApiResult<i64> {
    let file = form.file.as_ref().ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    if !NOTE_EXTENSIONS.contains(&extension_of(&file.original_name).as_str()) {
        return Err(ApiError::bad_request("Only PDF and DOCX files are allowed for lecture notes"));
    }
    if file.size_bytes > state.config.max_file_bytes() {
        return Err(ApiError::bad_request(format!(
            "File too large. Maximum size is {}MB",
            state.config.max_file_size_mb
        )));
    }
    if courses::owner(&state.db.conn(), course_id)?.is_none() {
        return Err(ApiError::not_found("Course not found"));
    }

    let stored_name = generate_note_name(&file.original_name);
    let dir = ensure_course_storage(&state.config.storage_path, course_id)
        .await
        .map_err(|e| ApiError::internal("Failed to upload lecture note", e))?;
    let final_path = dir.join(&stored_name);
    move_to_final(&file.temp_path, &final_path)
        .await
        .map_err(|e| ApiError::internal("Failed to upload lecture note", e))?;

    let note = NewLectureNote {
        course_id,
        uploader_id: user.id,
        original_name: file.original_name.clone(),
        stored_name: stored_name.clone(),
        description: form.field("description").unwrap_or_default().to_string(),
        mime_type: file.mime_type.clone(),
        size_bytes: file.size_bytes as i64,
    };
    let saved = notes::insert(&state.db.conn(), &note);
    match saved {
        Ok(id) => {
            info!("{} uploaded lecture note {} to course {}", user.email, stored_name, course_id);
            Ok(id)
        }
        Err(e) => {
            delete_temp_file(&final_path).await;
            Err(e.into())
        }
    }
}

pub async fn note_download_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    require_auth(&session)?;
    let note = notes::get(&state.db.conn(), path.into_inner())?
        .ok_or_else(|| ApiError::not_found("Lecture note not found"))?;
    let file = course_dir(&state.config.storage_path, note.course_id).join(&note.stored_name);
    send_stored_file(&file, &note.original_name, &note.mime_type).await
}

/// Solo quien lo subió o un admin.
pub async fn note_delete_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user = require_auth(&session)?;
    let id = path.into_inner();

    let note = {
        let conn = state.db.conn();
        let note = notes::get(&conn, id)?.ok_or_else(|| ApiError::not_found("Lecture note not found"))?;
        if note.uploader_id != user.id && user.role != Role::Admin {
            return Err(ApiError::forbidden("Not authorized to delete this note"));
        }
        notes::delete(&conn, id)?;
        note
    };

    let file = course_dir(&state.config.storage_path, note.course_id).join(&note.stored_name);
    delete_temp_file(&file).await;
    Ok(message("Lecture note deleted successfully"))
}
