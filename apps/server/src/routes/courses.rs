//! Course listing/creation and per-course lecture routes.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use lectern_shared::LectureMaterials;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CourseSummary {
    pub course_id: String,
    pub course_name: String,
}

#[derive(Debug, Serialize)]
pub struct CoursesResponse {
    pub courses: Vec<CourseSummary>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub course_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateCourseResponse {
    pub course_id: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LectureSummary {
    pub lecture_id: String,
    pub lecture_name: String,
}

#[derive(Debug, Serialize)]
pub struct LecturesResponse {
    pub lectures: Vec<LectureSummary>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLectureRequest {
    pub title: String,
    #[serde(default)]
    pub user_note: Option<String>,
    #[serde(default)]
    pub recording: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateLectureResponse {
    pub lecture_id: String,
}

/// `GET /courses/`
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<CoursesResponse>, ApiError> {
    let courses = state
        .storage
        .list_courses(&auth.user_id)
        .await?
        .into_iter()
        .map(|c| CourseSummary {
            course_id: c.id,
            course_name: c.name,
        })
        .collect();

    Ok(Json(CoursesResponse { courses }))
}

/// `POST /courses`
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CreateCourseResponse>), ApiError> {
    if body.course_name.trim().is_empty() {
        return Err(ApiError::BadRequest("course_name is required".into()));
    }

    let course_id = state
        .storage
        .insert_course(body.course_name.trim(), &auth.user_id)
        .await?;

    info!(%course_id, "course created");

    Ok((
        StatusCode::CREATED,
        Json(CreateCourseResponse {
            course_id,
            message: "Course created successfully",
        }),
    ))
}

/// `GET /courses/{course_id}` — list the course's lectures.
pub async fn list_lectures(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(course_id): Path<String>,
) -> Result<Json<LecturesResponse>, ApiError> {
    state
        .storage
        .get_course(&course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("course not found: {course_id}")))?;

    let lectures = state
        .storage
        .list_lectures_by_course(&course_id)
        .await?
        .into_iter()
        .map(|(lecture_id, lecture_name)| LectureSummary {
            lecture_id,
            lecture_name,
        })
        .collect();

    Ok(Json(LecturesResponse { lectures }))
}

/// `POST /courses/{course_id}` — create a lecture in the course.
pub async fn create_lecture(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(course_id): Path<String>,
    Json(body): Json<CreateLectureRequest>,
) -> Result<(StatusCode, Json<CreateLectureResponse>), ApiError> {
    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".into()));
    }

    state
        .storage
        .get_course(&course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("course not found: {course_id}")))?;

    let materials = LectureMaterials {
        note: body.user_note,
        recording: body.recording,
        transcript: body.transcript,
        ..Default::default()
    };

    let lecture_id = state
        .storage
        .insert_lecture(&course_id, body.title.trim(), &materials)
        .await?;

    info!(%course_id, %lecture_id, "lecture created");

    Ok((StatusCode::CREATED, Json(CreateLectureResponse { lecture_id })))
}
