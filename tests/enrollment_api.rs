#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::json;

use common::*;

#[actix_web::test]
async fn request_and_approve_enrollment() {
    let (state, _dir) = test_state();
    let app = init_app!(state);
    let course = course_id(&state, "Veri Yapıları");

    let student = login!(app, STUDENT);
    let (status, body) =
        call_json!(app, TestRequest::get().uri("/api/enrollments/courses/available").cookie(student.clone()));
    assert_eq!(status, StatusCode::OK);
    let available = body["data"].as_array().unwrap();
    assert_eq!(available.len(), 3);
    assert!(available.iter().all(|c| c["enrollmentCount"].is_i64()));

    let (status, body) = call_json!(
        app,
        TestRequest::post()
            .uri(&format!("/api/enrollments/courses/{course}/enroll"))
            .cookie(student.clone())
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["courseTitle"], "Veri Yapıları");
    assert_eq!(body["data"]["studentName"], "Test Student");
    let request = body["data"]["id"].as_i64().unwrap();

    let (status, body) = call_json!(
        app,
        TestRequest::post()
            .uri(&format!("/api/enrollments/courses/{course}/enroll"))
            .cookie(student.clone())
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You already have a pending request for this course");

    let (_, body) =
        call_json!(app, TestRequest::get().uri("/api/enrollments/courses/available").cookie(student.clone()));
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // solo instructores y admins ven solicitudes
    let (status, _) = call_json!(app, TestRequest::get().uri("/api/enrollments/requests").cookie(student.clone()));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let ayse = login!(app, AYSE);
    let (_, body) = call_json!(app, TestRequest::get().uri("/api/enrollments/requests").cookie(ayse.clone()));
    assert!(body["data"].as_array().unwrap().is_empty());
    let (status, body) = call_json!(
        app,
        TestRequest::put()
            .uri(&format!("/api/enrollments/requests/{request}"))
            .cookie(ayse)
            .set_json(json!({"status": "approved"}))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You are not the instructor of this course");

    let ahmet = login!(app, AHMET);
    let (_, body) = call_json!(app, TestRequest::get().uri("/api/enrollments/requests").cookie(ahmet.clone()));
    let pending = body["data"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["studentEmail"], "student@ogr.atu.edu.tr");

    let (status, body) = call_json!(
        app,
        TestRequest::put()
            .uri(&format!("/api/enrollments/requests/{request}"))
            .cookie(ahmet.clone())
            .set_json(json!({"status": "maybe"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status");

    let (status, body) = call_json!(
        app,
        TestRequest::put()
            .uri(&format!("/api/enrollments/requests/{request}"))
            .cookie(ahmet.clone())
            .set_json(json!({"status": "approved"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Enrollment approved");

    let (_, body) = call_json!(app, TestRequest::get().uri("/api/enrollments/my-courses").cookie(student.clone()));
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Veri Yapıları"]);

    let (_, body) = call_json!(app, TestRequest::get().uri("/api/enrollments/my-requests").cookie(student.clone()));
    assert_eq!(body["data"][0]["status"], "approved");
    assert_eq!(body["data"][0]["instructorName"], "Dr. Ahmet Yılmaz");

    let (status, body) = call_json!(
        app,
        TestRequest::post()
            .uri(&format!("/api/enrollments/courses/{course}/enroll"))
            .cookie(student)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You are already enrolled in this course");

    let (_, body) = call_json!(app, TestRequest::get().uri(&format!("/api/courses?studentId={}", user_id(&state, STUDENT.0))));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn rejected_request_can_be_renewed() {
    let (state, _dir) = test_state();
    let app = init_app!(state);
    let course = course_id(&state, "İşletme Yönetimi");

    let student = login!(app, STUDENT);
    let (_, body) = call_json!(
        app,
        TestRequest::post()
            .uri(&format!("/api/enrollments/courses/{course}/enroll"))
            .cookie(student.clone())
    );
    let request = body["data"]["id"].as_i64().unwrap();

    let admin = login!(app, ADMIN);
    let (_, body) = call_json!(app, TestRequest::get().uri("/api/enrollments/requests").cookie(admin.clone()));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (status, body) = call_json!(
        app,
        TestRequest::put()
            .uri(&format!("/api/enrollments/requests/{request}"))
            .cookie(admin.clone())
            .set_json(json!({"status": "rejected"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Enrollment rejected");

    let (status, body) = call_json!(
        app,
        TestRequest::post()
            .uri(&format!("/api/enrollments/courses/{course}/enroll"))
            .cookie(student)
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], request);
    assert_eq!(body["data"]["status"], "pending");

    let (status, body) = call_json!(
        app,
        TestRequest::put()
            .uri("/api/enrollments/requests/99999")
            .cookie(admin)
            .set_json(json!({"status": "approved"}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Request not found");
}

#[actix_web::test]
async fn enrolling_in_missing_course_is_404() {
    let (state, _dir) = test_state();
    let app = init_app!(state);
    let student = login!(app, STUDENT);

    let (status, body) = call_json!(
        app,
        TestRequest::post().uri("/api/enrollments/courses/99999/enroll").cookie(student)
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Course not found");

    let (status, _) = call_json!(app, TestRequest::post().uri("/api/enrollments/courses/1/enroll"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
