use actix_web::{HttpResponse, Responder};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

pub async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
