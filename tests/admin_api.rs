#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::json;

use common::*;

#[actix_web::test]
async fn users_require_admin() {
    let (state, _dir) = test_state();
    let app = init_app!(state);

    let (status, body) = call_json!(app, TestRequest::get().uri("/api/users"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");

    let student = login!(app, STUDENT);
    let (status, body) = call_json!(app, TestRequest::get().uri("/api/users").cookie(student));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");

    let admin = login!(app, ADMIN);
    let (status, body) = call_json!(app, TestRequest::get().uri("/api/users").cookie(admin));
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 8);
    // ordenados por rol: admin, instructor, student
    assert_eq!(users[0]["role"], "admin");
    assert_eq!(users[7]["role"], "student");
}

#[actix_web::test]
async fn user_crud() {
    let (state, _dir) = test_state();
    let app = init_app!(state);
    let admin = login!(app, ADMIN);

    let (status, _) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/users")
            .cookie(admin.clone())
            .set_json(json!({"name": "X", "email": "x@atu.edu.tr", "password": "pw", "role": "dean"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/users")
            .cookie(admin.clone())
            .set_json(json!({"name": "X", "email": "ahmet.yilmaz@atu.edu.tr", "password": "pw", "role": "instructor"}))
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call_json!(
        app,
        TestRequest::post().uri("/api/users").cookie(admin.clone()).set_json(json!({
            "name": "Dr. Can Öztürk",
            "email": "can.ozturk@atu.edu.tr",
            "password": "secret",
            "role": "instructor",
            "facultyId": "1",
            "departmentId": ""
        }))
    );
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["facultyId"], 1);
    assert!(body["data"]["departmentId"].is_null());
    assert!(body["data"]["facultyName"].is_string());

    // actualización sin contraseña conserva la anterior
    let (status, body) = call_json!(
        app,
        TestRequest::put().uri(&format!("/api/users/{id}")).cookie(admin.clone()).set_json(json!({
            "name": "Prof. Can Öztürk",
            "email": "can.ozturk@atu.edu.tr",
            "role": "instructor"
        }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Prof. Can Öztürk");
    login!(app, ("can.ozturk@atu.edu.tr", "secret"));

    let (status, _) = call_json!(
        app,
        TestRequest::put().uri(&format!("/api/users/{id}")).cookie(admin.clone()).set_json(json!({
            "name": "Prof. Can Öztürk",
            "email": "admin@atu.edu.tr",
            "role": "instructor"
        }))
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let admin_id = user_id(&state, "admin@atu.edu.tr");
    let (status, body) =
        call_json!(app, TestRequest::delete().uri(&format!("/api/users/{admin_id}")).cookie(admin.clone()));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot delete your own account");

    let (status, body) = call_json!(app, TestRequest::delete().uri(&format!("/api/users/{id}")).cookie(admin.clone()));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, body) = call_json!(app, TestRequest::get().uri(&format!("/api/users/{id}")).cookie(admin));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[actix_web::test]
async fn faculties_and_departments() {
    let (state, _dir) = test_state();
    let app = init_app!(state);
    let admin = login!(app, ADMIN);

    let (_, body) = call_json!(app, TestRequest::get().uri("/api/faculties"));
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    let (status, _) = call_json!(
        app,
        TestRequest::post().uri("/api/faculties").set_json(json!({"name": "Tıp Fakültesi"}))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call_json!(
        app,
        TestRequest::post().uri("/api/faculties").cookie(admin.clone()).set_json(json!({"name": "  "}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Faculty name is required");

    let (status, body) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/faculties")
            .cookie(admin.clone())
            .set_json(json!({"name": "Tıp Fakültesi"}))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Faculty created successfully");
    let faculty = body["data"]["id"].as_i64().unwrap();

    let (status, _) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/faculties")
            .cookie(admin.clone())
            .set_json(json!({"name": "Tıp Fakültesi"}))
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/departments")
            .cookie(admin.clone())
            .set_json(json!({"name": "Temel Tıp Bilimleri", "facultyId": faculty}))
    );
    assert_eq!(status, StatusCode::CREATED);
    let department = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["facultyName"], "Tıp Fakültesi");

    let (status, _) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/departments")
            .cookie(admin.clone())
            .set_json(json!({"name": "Temel Tıp Bilimleri", "facultyId": faculty}))
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = call_json!(app, TestRequest::get().uri(&format!("/api/faculties/{faculty}")));
    assert_eq!(body["data"]["name"], "Tıp Fakültesi");
    assert_eq!(body["data"]["departments"][0]["name"], "Temel Tıp Bilimleri");

    let (_, body) = call_json!(app, TestRequest::get().uri(&format!("/api/departments?facultyId={faculty}")));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = call_json!(app, TestRequest::get().uri("/api/departments?facultyId=abc"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid facultyId");

    // con departamentos dentro la facultad no se puede borrar
    let (status, _) =
        call_json!(app, TestRequest::delete().uri(&format!("/api/faculties/{faculty}")).cookie(admin.clone()));
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call_json!(
        app,
        TestRequest::put()
            .uri(&format!("/api/faculties/{faculty}"))
            .cookie(admin.clone())
            .set_json(json!({"name": "Sağlık Bilimleri Fakültesi"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Sağlık Bilimleri Fakültesi");

    let (status, _) =
        call_json!(app, TestRequest::delete().uri(&format!("/api/departments/{department}")).cookie(admin.clone()));
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
        call_json!(app, TestRequest::delete().uri(&format!("/api/faculties/{faculty}")).cookie(admin.clone()));
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call_json!(app, TestRequest::get().uri(&format!("/api/faculties/{faculty}")));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Faculty not found");
}

#[actix_web::test]
async fn course_lifecycle() {
    let (state, _dir) = test_state();
    let app = init_app!(state);
    let admin = login!(app, ADMIN);

    let ahmet = user_id(&state, "ahmet.yilmaz@atu.edu.tr");
    let (_, body) = call_json!(app, TestRequest::get().uri(&format!("/api/courses?instructorId={ahmet}")));
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = call_json!(app, TestRequest::get().uri("/api/courses?studentId=x"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Valid studentId is required");

    let (status, body) = call_json!(
        app,
        TestRequest::post()
            .uri("/api/courses")
            .cookie(admin.clone())
            .set_json(json!({"title": "Algoritmalar"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title, instructorId, facultyId, and departmentId are required");

    let student = user_id(&state, "student@ogr.atu.edu.tr");
    let (status, body) = call_json!(
        app,
        TestRequest::post().uri("/api/courses").cookie(admin.clone()).set_json(json!({
            "title": "Algoritmalar", "instructorId": student, "facultyId": 1, "departmentId": 1
        }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User is not an instructor");

    let (status, body) = call_json!(
        app,
        TestRequest::post().uri("/api/courses").cookie(admin.clone()).set_json(json!({
            "title": "Algoritmalar", "instructorId": ahmet, "facultyId": 1, "departmentId": 99999
        }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Department not found");

    let (status, body) = call_json!(
        app,
        TestRequest::post().uri("/api/courses").cookie(admin.clone()).set_json(json!({
            "title": "Algoritmalar", "instructorId": ahmet.to_string(), "facultyId": 1, "departmentId": 1
        }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["instructorName"], "Dr. Ahmet Yılmaz");
    assert_eq!(body["data"]["instructorEmail"], "ahmet.yilmaz@atu.edu.tr");
    let course = body["data"]["id"].as_i64().unwrap();

    let (status, _) = call_json!(app, TestRequest::delete().uri(&format!("/api/courses/{course}")));
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        call_json!(app, TestRequest::delete().uri(&format!("/api/courses/{course}")).cookie(admin.clone()));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Course deleted successfully");

    let (status, body) = call_json!(app, TestRequest::get().uri(&format!("/api/courses/{course}")));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Course not found");

    // un curso con matrículas también se puede borrar
    let seeded = course_id(&state, "Yazılım Mühendisliği");
    let (status, _) =
        call_json!(app, TestRequest::delete().uri(&format!("/api/courses/{seeded}")).cookie(admin));
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn instructor_with_courses_keeps_role() {
    let (state, _dir) = test_state();
    let app = init_app!(state);
    let admin = login!(app, ADMIN);
    let ahmet = user_id(&state, AHMET.0);

    let (status, body) = call_json!(
        app,
        TestRequest::put().uri(&format!("/api/users/{ahmet}")).cookie(admin.clone()).set_json(json!({
            "name": "Dr. Ahmet Yılmaz",
            "email": AHMET.0,
            "role": "student"
        }))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User still teaches courses and must remain an instructor");

    let (_, body) = call_json!(app, TestRequest::get().uri(&format!("/api/users/{ahmet}")).cookie(admin.clone()));
    assert_eq!(body["data"]["role"], "instructor");

    // sin cursos a su cargo el cambio de rol se permite
    let test_instructor = user_id(&state, "instructor@atu.edu.tr");
    let (status, body) = call_json!(
        app,
        TestRequest::put().uri(&format!("/api/users/{test_instructor}")).cookie(admin).set_json(json!({
            "name": "Test Instructor",
            "email": "instructor@atu.edu.tr",
            "role": "admin"
        }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");
}
