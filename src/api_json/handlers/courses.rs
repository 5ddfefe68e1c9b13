use std::io::ErrorKind;

use actix_session::Session;
use actix_web::{web, HttpResponse};
use tracing::{info, warn};

use crate::api_json::{created, message, ok, optional_id, required_text, CourseFilter, CourseRequest};
use crate::auth::require_admin;
use crate::db::{courses, departments, faculties, users};
use crate::error::{ApiError, ApiResult};
use crate::models::Role;
use crate::server::AppState;
use crate::upload::course_dir;

/// Un filtro vacío cuenta como ausente; uno no numérico es un 400.
fn filter_id(raw: Option<&str>, field: &str) -> ApiResult<Option<i64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Valid {} is required", field))),
    }
}

/// `?instructorId=` cursos que dicta, `?studentId=` cursos en los que está
/// matriculado, sin filtro todos.
pub async fn courses_list_handler(
    state: web::Data<AppState>,
    query: web::Query<CourseFilter>,
) -> ApiResult<HttpResponse> {
    let instructor_id = filter_id(query.instructor_id.as_deref(), "instructorId")?;
    let student_id = if instructor_id.is_none() {
        filter_id(query.student_id.as_deref(), "studentId")?
    } else {
        None
    };

    let conn = state.db.conn();
    let list = match (instructor_id, student_id) {
        (Some(iid), _) => courses::list_by_instructor(&conn, iid)?,
        (None, Some(sid)) => courses::list_by_student(&conn, sid)?,
        (None, None) => courses::list_all(&conn)?,
    };
    Ok(ok(list))
}

pub async fn course_get_handler(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let course = courses::get(&state.db.conn(), path.into_inner())?;
    course.map(ok).ok_or_else(|| ApiError::not_found("Course not found"))
}

pub async fn course_create_handler(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<CourseRequest>,
) -> ApiResult<HttpResponse> {
    require_admin(&session)?;
    let body = body.into_inner();

    let missing = || ApiError::bad_request("Title, instructorId, facultyId, and departmentId are required");
    let title = required_text(&body.title).ok_or_else(missing)?;
    let instructor_id = optional_id(body.instructor_id.as_ref(), "instructorId")?.ok_or_else(missing)?;
    let faculty_id = optional_id(body.faculty_id.as_ref(), "facultyId")?.ok_or_else(missing)?;
    let department_id = optional_id(body.department_id.as_ref(), "departmentId")?.ok_or_else(missing)?;

    let conn = state.db.conn();
    match users::role_of(&conn, instructor_id)? {
        None => return Err(ApiError::not_found("Instructor not found")),
        Some(Role::Instructor) => {}
        Some(_) => return Err(ApiError::bad_request("User is not an instructor")),
    }
    if faculties::get(&conn, faculty_id)?.is_none() {
        return Err(ApiError::not_found("Faculty not found"));
    }
    if departments::get(&conn, department_id)?.is_none() {
        return Err(ApiError::not_found("Department not found"));
    }

    let id = courses::insert(
        &conn,
        &courses::NewCourse {
            title: title.to_string(),
            instructor_id,
            faculty_id,
            department_id,
        },
    )?;
    let course = courses::get(&conn, id)?.ok_or_else(|| ApiError::not_found("Course not found"))?;
    info!("Created course {} for instructor {}", course.title, course.instructor_name);
    Ok(created(course, None))
}

/// Borra el curso con sus filas dependientes y su carpeta de archivos.
pub async fn course_delete_handler(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    require_admin(&session)?;
    let id = path.into_inner();

    {
        let conn = state.db.conn();
        if courses::owner(&conn, id)?.is_none() {
            return Err(ApiError::not_found("Course not found"));
        }
        courses::delete(&conn, id)?;
    }

    let dir = course_dir(&state.config.storage_path, id);
    match tokio::fs::remove_dir_all(&dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", dir.display(), e),
    }
    info!("Deleted course {}", id);
    Ok(message("Course deleted successfully"))
}
