//! Pipeline de subida de archivos.
//!
//! Validaciones en orden: nombre, tipo (extensión + MIME), tamaño y un
//! escaneo de virus simulado. Después se resuelve la versión según la
//! política de duplicados y el archivo pasa de `tmp` a `course_{id}`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{error, info, warn};

use crate::config::{ALLOWED_EXTENSIONS, ALLOWED_MIME_TYPES, MAX_FILE_NAME_LENGTH};
use crate::db::{courses, enrollments, Database};
use crate::error::{ApiError, ApiResult};

pub mod intake;

pub use intake::{read_upload, UploadForm, UploadedFile};

const UNSUPPORTED_TYPE: &str = "Unsupported file type. Allowed formats: PDF, DOCX, PPTX, XLSX, ZIP.";
const NOTE_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Qué hacer cuando ya existe un material con el mismo nombre en el curso.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    #[default]
    Cancel,
    Overwrite,
    Version,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cancel" => Ok(DuplicatePolicy::Cancel),
            "overwrite" => Ok(DuplicatePolicy::Overwrite),
            "version" => Ok(DuplicatePolicy::Version),
            other => Err(format!("unknown duplicate policy '{}'", other)),
        }
    }
}

/// Separa `nombre.ext` en (`nombre`, `.ext`). Un punto inicial o final no
/// cuenta como extensión.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Extensión en minúsculas con el punto, o cadena vacía.
pub fn extension_of(name: &str) -> String {
    split_extension(name).1.to_lowercase()
}

pub fn validate_file_name(name: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("File name cannot be empty."));
    }

    if name.chars().count() > MAX_FILE_NAME_LENGTH {
        return Err(ApiError::bad_request(format!(
            "File name too long. Maximum allowed length is {} characters.",
            MAX_FILE_NAME_LENGTH
        )));
    }

    let survives_normalization = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    if name.contains("..") || name.contains('/') || name.contains('\\') || !survives_normalization {
        return Err(ApiError::bad_request(
            "Invalid file name. Path traversal characters are not allowed.",
        ));
    }
    Ok(())
}

pub fn validate_file_type(name: &str, mime_type: &str) -> ApiResult<()> {
    let ext = extension_of(name);
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) || !ALLOWED_MIME_TYPES.contains(&mime_type) {
        return Err(ApiError::bad_request(UNSUPPORTED_TYPE));
    }
    Ok(())
}

pub fn validate_file_size(size_bytes: u64, max_mb: u64) -> ApiResult<()> {
    if size_bytes > max_mb.saturating_mul(1024 * 1024) {
        return Err(ApiError::bad_request(format!(
            "File too large. Maximum allowed size is {}MB.",
            max_mb
        )));
    }
    Ok(())
}

/// Escaneo simulado: cualquier nombre que contenga "virus" está infectado.
pub fn mock_virus_scan(name: &str) -> ApiResult<()> {
    if name.to_lowercase().contains("virus") {
        return Err(ApiError::forbidden("Upload blocked: File failed virus scan."));
    }
    Ok(())
}

/// Versión con la que se guarda la subida, dada la versión más alta ya
/// existente para ese nombre.
pub fn resolve_version(latest: Option<i64>, policy: DuplicatePolicy) -> ApiResult<i64> {
    match (latest, policy) {
        (None, _) => Ok(1),
        (Some(_), DuplicatePolicy::Cancel) => Err(ApiError::Conflict {
            message: "A file with this name already exists. Please choose a policy: overwrite, version, or cancel."
                .to_string(),
            duplicate_exists: true,
        }),
        (Some(v), DuplicatePolicy::Version) => Ok(v + 1),
        (Some(v), DuplicatePolicy::Overwrite) => Ok(v),
    }
}

/// `apunte.pdf` v1 -> `apunte.pdf`; v3 -> `apunte__v3.pdf`.
pub fn generate_stored_name(original: &str, version: i64) -> String {
    if version == 1 {
        return original.to_string();
    }
    let (base, ext) = split_extension(original);
    format!("{}__v{}{}", base, version, ext)
}

/// Nombre único para apuntes: base saneada, milisegundos y 6 caracteres
/// aleatorios en base 36.
pub fn generate_note_name(original: &str) -> String {
    let (base, ext) = split_extension(original);
    let safe: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| NOTE_SUFFIX_ALPHABET[rng.gen_range(0..NOTE_SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{}_{}_{}{}", safe, Utc::now().timestamp_millis(), suffix, ext)
}

pub fn course_dir(root: &Path, course_id: i64) -> PathBuf {
    root.join(format!("course_{}", course_id))
}

pub async fn ensure_course_storage(root: &Path, course_id: i64) -> std::io::Result<PathBuf> {
    let dir = course_dir(root, course_id);
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir)
}

pub async fn ensure_temp_storage(tmp: &Path) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(tmp).await?;
    Ok(tmp.to_path_buf())
}

/// Mueve el archivo temporal a su destino. Si `rename` falla (p. ej. otro
/// sistema de archivos) se copia y se borra el original.
pub async fn move_to_final(temp: &Path, dest: &Path) -> std::io::Result<()> {
    if tokio::fs::rename(temp, dest).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(temp, dest).await?;
    tokio::fs::remove_file(temp).await
}

/// Borra un archivo si existe; los errores solo se registran.
pub async fn delete_temp_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to delete temp file {}: {}", path.display(), e),
    }
}

/// Borra los archivos de `tmp` más viejos que `max_age`. Devuelve cuántos.
pub fn cleanup_temp_files(tmp: &Path, max_age: chrono::Duration) -> std::io::Result<usize> {
    let entries = match std::fs::read_dir(tmp) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let cutoff = Utc::now() - max_age;
    let mut cleaned = 0;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let outcome = entry.metadata().and_then(|meta| {
            if !meta.is_file() {
                return Ok(false);
            }
            let modified: DateTime<Utc> = meta.modified()?.into();
            if modified < cutoff {
                std::fs::remove_file(&path)?;
                return Ok(true);
            }
            Ok(false)
        });
        match outcome {
            Ok(true) => cleaned += 1,
            Ok(false) => {}
            Err(e) => error!("Error deleting temp file {}: {}", path.display(), e),
        }
    }

    if cleaned > 0 {
        info!("Cleaned up {} orphaned temp file(s)", cleaned);
    }
    Ok(cleaned)
}

/// Notificación simulada: registra en el log a los alumnos matriculados.
/// Devuelve el número de alumnos notificados.
pub fn send_notifications(db: &Database, enabled: bool, course_id: i64, material_name: &str) -> rusqlite::Result<usize> {
    if !enabled {
        return Ok(0);
    }

    let conn = db.conn();
    let students = enrollments::enrolled_students(&conn, course_id)?;
    let title = courses::owner(&conn, course_id)?
        .map(|(title, _)| title)
        .unwrap_or_else(|| "Unknown".to_string());

    info!("=== NOTIFICATION: New material uploaded ===");
    info!("Course: {} (ID: {})", title, course_id);
    info!("Material: {}", material_name);
    info!("Notifying {} student(s):", students.len());
    for (name, email) in &students {
        info!("  - {} ({})", name, email);
    }
    Ok(students.len())
}
