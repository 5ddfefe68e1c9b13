// Lectura de `multipart/form-data`: el campo `file` se vuelca a un archivo
// temporal contando bytes; el resto de campos se guardan como texto.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use chrono::Utc;
use futures_util::stream::StreamExt;
use rand::Rng;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{delete_temp_file, ensure_temp_storage};
use crate::error::{ApiError, ApiResult};

const FILE_FIELD: &str = "file";
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub temp_path: PathBuf,
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Valor de un campo de texto, recortado; `None` si falta o está vacío.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Borra el temporal si la subida no se va a guardar.
    pub async fn discard(&self) {
        if let Some(file) = &self.file {
            delete_temp_file(&file.temp_path).await;
        }
    }
}

fn temp_name() -> String {
    let n: u32 = rand::thread_rng().r#gen();
    format!("upload-{}-{:08x}", Utc::now().timestamp_millis(), n)
}

/// Consume el multipart. Deja de escribir a disco cuando se supera
/// `max_bytes` pero sigue contando, para que la validación de tamaño
/// pueda informar el error.
pub async fn read_upload(mut payload: Multipart, tmp_dir: &Path, max_bytes: u64) -> ApiResult<UploadForm> {
    let tmp_dir = ensure_temp_storage(tmp_dir).await?;
    let mut form = UploadForm::default();

    while let Some(field_res) = payload.next().await {
        let mut field = match field_res {
            Ok(field) => field,
            Err(e) => {
                form.discard().await;
                return Err(ApiError::bad_request(format!("Malformed upload: {}", e)));
            }
        };

        let name = field.content_disposition().get_name().unwrap_or_default().to_string();
        let filename = field.content_disposition().get_filename().map(|s| s.to_string());

        match filename {
            Some(original_name) if name == FILE_FIELD && form.file.is_none() => {
                let temp_path = tmp_dir.join(temp_name());
                let mime_type = field.content_type().essence_str().to_string();
                // se registra antes de escribir para que `discard` lo limpie
                form.file = Some(UploadedFile {
                    original_name,
                    mime_type,
                    size_bytes: 0,
                    temp_path: temp_path.clone(),
                });

                let mut out = match tokio::fs::File::create(&temp_path).await {
                    Ok(f) => f,
                    Err(e) => {
                        form.discard().await;
                        return Err(ApiError::internal("Failed to save file. Storage error occurred.", e));
                    }
                };

                let mut size: u64 = 0;
                while let Some(chunk) = field.next().await {
                    let bytes = match chunk {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            form.discard().await;
                            return Err(ApiError::bad_request(format!("Malformed upload: {}", e)));
                        }
                    };
                    size += bytes.len() as u64;
                    if size <= max_bytes {
                        if let Err(e) = out.write_all(&bytes).await {
                            form.discard().await;
                            return Err(ApiError::internal("Failed to save file. Storage error occurred.", e));
                        }
                    }
                }
                if let Err(e) = out.flush().await {
                    form.discard().await;
                    return Err(ApiError::internal("Failed to save file. Storage error occurred.", e));
                }

                if let Some(file) = form.file.as_mut() {
                    file.size_bytes = size;
                    debug!("Received upload {} ({} bytes)", file.original_name, size);
                }
            }
            Some(other) => {
                warn!("Ignoring extra file field '{}' ({})", name, other);
                while let Some(chunk) = field.next().await {
                    if chunk.is_err() {
                        break;
                    }
                }
            }
            None => {
                let mut value: Vec<u8> = Vec::new();
                while let Some(chunk) = field.next().await {
                    match chunk {
                        Ok(bytes) => {
                            if value.len() + bytes.len() > MAX_TEXT_FIELD_BYTES {
                                form.discard().await;
                                return Err(ApiError::bad_request(format!("Field '{}' is too large", name)));
                            }
                            value.extend_from_slice(&bytes);
                        }
                        Err(e) => {
                            form.discard().await;
                            return Err(ApiError::bad_request(format!("Malformed upload: {}", e)));
                        }
                    }
                }
                form.fields.insert(name, String::from_utf8_lossy(&value).into_owned());
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_read_as_missing() {
        let mut form = UploadForm::default();
        form.fields.insert("description".to_string(), "  Hafta 1  ".to_string());
        form.fields.insert("duplicatePolicy".to_string(), "   ".to_string());
        assert_eq!(form.field("description"), Some("Hafta 1"));
        assert_eq!(form.field("duplicatePolicy"), None);
        assert_eq!(form.field("instructorId"), None);
    }

    #[test]
    fn temp_names_differ() {
        assert_ne!(temp_name(), temp_name());
    }
}
