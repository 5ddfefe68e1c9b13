//! Formato JSON de la API: envoltorio de respuesta y cuerpos de petición.
//!
//! Toda respuesta exitosa tiene la forma
//! ```json
//! { "success": true, "data": { ... }, "message": "..." }
//! ```
//! donde `data` y `message` se omiten cuando no aplican. Los errores los
//! genera `ApiError` con `{ "success": false, "error": "..." }`.
//!
//! Los ids que llegan en cuerpos o query strings se aceptan como número o
//! como texto numérico, igual que los formularios del cliente web.

use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub mod handlers;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 200 con datos.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope { success: true, data: Some(data), message: None })
}

/// 200 con datos y mensaje.
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(Envelope { success: true, data: Some(data), message: Some(message.into()) })
}

/// 201 con el recurso creado.
pub fn created<T: Serialize>(data: T, message: Option<&str>) -> HttpResponse {
    HttpResponse::Created().json(Envelope {
        success: true,
        data: Some(data),
        message: message.map(str::to_string),
    })
}

/// 200 solo con mensaje (borrados, logout...).
pub fn message(message: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(Envelope::<()> { success: true, data: None, message: Some(message.into()) })
}

/// Id opcional: `null`, `""` y `0` cuentan como ausentes; cualquier otra
/// cosa que no sea un entero es un 400.
pub fn optional_id(value: Option<&Value>, field: &str) -> ApiResult<Option<i64>> {
    let invalid = || ApiError::bad_request(format!("Invalid {}", field));
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(None),
            Some(id) => Ok(Some(id)),
            None => Err(invalid()),
        },
        Some(Value::String(s)) => parse_optional_id(s, field),
        Some(_) => Err(invalid()),
    }
}

/// Igual que `optional_id` pero para valores de query string.
pub fn parse_optional_id(raw: &str, field: &str) -> ApiResult<Option<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<i64>() {
        Ok(0) => Ok(None),
        Ok(id) => Ok(Some(id)),
        Err(_) => Err(ApiError::bad_request(format!("Invalid {}", field))),
    }
}

/// Entero de un cuerpo JSON (`4` o `"4"`); `None` si falta o no es entero.
pub fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Texto no vacío (tras recortar).
pub fn required_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub faculty_id: Option<Value>,
    pub department_id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FacultyRequest {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRequest {
    pub name: Option<String>,
    pub faculty_id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub title: Option<String>,
    pub instructor_id: Option<Value>,
    pub faculty_id: Option<Value>,
    pub department_id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFilter {
    pub instructor_id: Option<String>,
    pub student_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentFilter {
    pub faculty_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DecisionRequest {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RatingRequest {
    pub rating: Option<Value>,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GradeRequest {
    pub grade: Option<Value>,
}

/// Respuesta de una subida de material.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub id: i64,
    pub original_name: String,
    pub stored_name: String,
    pub version: i64,
}
