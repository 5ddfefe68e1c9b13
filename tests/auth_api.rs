#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::json;

use common::*;

#[actix_web::test]
async fn health_reports_ok() {
    let (state, _dir) = test_state();
    let app = init_app!(state);

    let (status, body) = call_json!(app, TestRequest::get().uri("/api/health"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[actix_web::test]
async fn unknown_api_route_is_json_404() {
    let (state, _dir) = test_state();
    let app = init_app!(state);

    let (status, body) = call_json!(app, TestRequest::get().uri("/api/does-not-exist"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "API endpoint not found"}));
}

#[actix_web::test]
async fn login_validates_credentials() {
    let (state, _dir) = test_state();
    let app = init_app!(state);

    let (status, body) = call_json!(
        app,
        TestRequest::post().uri("/api/auth/login").set_json(json!({"email": "admin@atu.edu.tr"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email and password are required");

    let (status, body) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "admin@atu.edu.tr", "password": "wrong"}))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, _) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "nobody@atu.edu.tr", "password": "admin123"}))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn session_round_trip() {
    let (state, _dir) = test_state();
    let app = init_app!(state);

    let (status, body) = call_json!(app, TestRequest::get().uri("/api/auth/me"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authenticated");

    let cookie = login!(app, ADMIN);
    let (status, body) = call_json!(app, TestRequest::get().uri("/api/auth/me").cookie(cookie.clone()));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "admin@atu.edu.tr");
    assert_eq!(body["data"]["role"], "admin");
    assert!(body["data"].get("password").is_none());

    let (status, body) = call_json!(app, TestRequest::post().uri("/api/auth/logout").cookie(cookie));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
}

#[actix_web::test]
async fn student_self_registration() {
    let (state, _dir) = test_state();
    let app = init_app!(state);

    let (status, _) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"name": "Zeynep", "email": "zeynep@ogr.atu.edu.tr"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"name": "Zeynep", "email": "zeynep@gmail.com", "password": "pw"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("@ogr.atu.edu.tr"));

    let resp = actix_web::test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"name": "Zeynep Aydın", "email": "zeynep@ogr.atu.edu.tr", "password": "pw"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == courseshare::server::SESSION_COOKIE)
        .expect("El registro debe iniciar sesión")
        .into_owned();
    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body["data"]["role"], "student");

    let (_, me) = call_json!(app, TestRequest::get().uri("/api/auth/me").cookie(cookie));
    assert_eq!(me["data"]["name"], "Zeynep Aydın");

    let (status, _) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"name": "Otra", "email": "zeynep@ogr.atu.edu.tr", "password": "x"}))
    );
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn malformed_json_uses_error_envelope() {
    let (state, _dir) = test_state();
    let app = init_app!(state);

    let (status, body) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/auth/login")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
