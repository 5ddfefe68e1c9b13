use std::io::ErrorKind;
use std::path::Path;

use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::http::header::CONTENT_DISPOSITION;
use actix_web::{web, HttpResponse};
use tracing::{info, warn};

use crate::api_json::{message, ok, ok_with_message, UploadResult};
use crate::auth::{require_auth, require_instructor};
use crate::db::{courses, materials};
use crate::error::{ApiError, ApiResult};
use crate::models::{NewMaterial, Role, SessionUser};
use crate::server::AppState;
use crate::upload::{
    course_dir, delete_temp_file, ensure_course_storage, generate_stored_name, mock_virus_scan, move_to_final,
    read_upload, resolve_version, send_notifications, validate_file_name, validate_file_size, validate_file_type,
    DuplicatePolicy, UploadForm,
};

const STORAGE_FAILURE: &str = "Failed to save file. Storage error occurred.";

/// Lee un archivo guardado y lo devuelve como descarga con su nombre original.
pub(crate) async fn send_stored_file(path: &Path, original_name: &str, mime: &str) -> ApiResult<HttpResponse> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(ApiError::not_found("File not found on disk")),
        Err(e) => return Err(ApiError::internal("Failed to read file", e)),
    };
    let safe_name: String = original_name
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    Ok(HttpResponse::Ok()
        .content_type(mime)
        .append_header((CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", safe_name)))
        .body(bytes))
}

pub async fn materials_list_handler(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let list = materials::list_for_course(&state.db.conn(), path.into_inner())?;
    Ok(ok(list))
}

/// Subida de material: valida, resuelve la versión y mueve el temporal a la
/// carpeta del curso. El temporal se borra en cualquier rechazo.
pub async fn material_upload_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let user = require_instructor(&session)?;
    let course_id = path.into_inner();
    let form = read_upload(payload, &state.config.tmp_path, state.config.max_file_bytes()).await?;

    match store_material(&state, &user, course_id, &form).await {
        Ok(result) => {
            match send_notifications(&state.db, state.config.notifications_enabled, course_id, &result.original_name) {
                Ok(n) if n > 0 => info!("Notified {} student(s) about {}", n, result.original_name),
                Ok(_) => {}
                Err(e) => warn!("Failed to send notifications for course {}: {}", course_id, e),
            }
            Ok(ok_with_message(result, "File uploaded successfully."))
        }
        Err(e) => {
            form.discard().await;
            Err(e)
        }
    }
}

async fn store_material(
    state: &AppState,
    user: &SessionUser,
    course_id: i64,
    form: &UploadForm,
) -> ApiResult<UploadResult> {
    let file = form.file.as_ref().ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    validate_file_name(&file.original_name)?;
    validate_file_type(&file.original_name, &file.mime_type)?;
    validate_file_size(file.size_bytes, state.config.max_file_size_mb)?;
    mock_virus_scan(&file.original_name)?;

    let policy = match form.field("duplicatePolicy") {
        None => DuplicatePolicy::default(),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::bad_request("Invalid duplicate policy. Use overwrite, version, or cancel."))?,
    };

    let (owner_id, existing, version, stored_name) = {
        let conn = state.db.conn();
        let (_, owner_id) = courses::owner(&conn, course_id)?.ok_or_else(|| ApiError::not_found("Course not found"))?;
        if user.role == Role::Instructor && owner_id != user.id {
            return Err(ApiError::forbidden("You are not the instructor of this course"));
        }
        let existing = materials::latest_version(&conn, course_id, &file.original_name)?;
        let version = resolve_version(existing.map(|(_, v)| v), policy)?;
        let stored_name = generate_stored_name(&file.original_name, version);

        // `week1__v2.pdf` puede ser la v2 de `week1.pdf` o un archivo propio
        let replaced = match (existing, policy) {
            (Some((id, _)), DuplicatePolicy::Overwrite) => Some(id),
            _ => None,
        };
        if materials::stored_name_taken(&conn, course_id, &stored_name, replaced)? {
            return Err(ApiError::conflict(format!(
                "Another material is already stored as {}. Please rename the file and try again.",
                stored_name
            )));
        }
        (owner_id, existing, version, stored_name)
    };

    let dir = ensure_course_storage(&state.config.storage_path, course_id)
        .await
        .map_err(|e| ApiError::internal(STORAGE_FAILURE, e))?;
    let final_path = dir.join(&stored_name);
    move_to_final(&file.temp_path, &final_path)
        .await
        .map_err(|e| ApiError::internal(STORAGE_FAILURE, e))?;

    let record = NewMaterial {
        course_id,
        instructor_id: owner_id,
        original_name: file.original_name.clone(),
        stored_name: stored_name.clone(),
        description: form.field("description").unwrap_or_default().to_string(),
        mime_type: file.mime_type.clone(),
        size_bytes: file.size_bytes as i64,
        version,
    };

    let saved = {
        let conn = state.db.conn();
        match (existing, policy) {
            (Some((id, _)), DuplicatePolicy::Overwrite) => materials::overwrite(&conn, id, &record).map(|_| id),
            _ => materials::insert(&conn, &record),
        }
    };
    let id = match saved {
        Ok(id) => id,
        Err(e) => {
            if policy != DuplicatePolicy::Overwrite {
                delete_temp_file(&final_path).await;
            }
            return Err(e.into());
        }
    };

    info!(
        "{} uploaded {} to course {} as {} (v{})",
        user.email, file.original_name, course_id, stored_name, version
    );
    Ok(UploadResult {
        id,
        original_name: file.original_name.clone(),
        stored_name,
        version,
    })
}

pub async fn material_download_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    require_auth(&session)?;
    let material = materials::get(&state.db.conn(), path.into_inner())?
        .ok_or_else(|| ApiError::not_found("Material not found"))?;
    let file = course_dir(&state.config.storage_path, material.course_id).join(&material.stored_name);
    send_stored_file(&file, &material.original_name, &material.mime_type).await
}

/// Solo el instructor del curso o un admin.
pub async fn material_delete_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user = require_instructor(&session)?;
    let id = path.into_inner();

    let material = {
        let conn = state.db.conn();
        let material = materials::get(&conn, id)?.ok_or_else(|| ApiError::not_found("Material not found"))?;
        if user.role == Role::Instructor && material.instructor_id != user.id {
            return Err(ApiError::forbidden("You are not the instructor of this course"));
        }
        materials::delete(&conn, id)?;
        material
    };

    let file = course_dir(&state.config.storage_path, material.course_id).join(&material.stored_name);
    delete_temp_file(&file).await;
    info!("{} deleted material {} ({})", user.email, id, material.stored_name);
    Ok(message("Material deleted successfully"))
}
