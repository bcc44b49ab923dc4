//! Lecture material read/update routes.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use lectern_shared::{Lecture, LectureMaterials};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LectureResponse {
    pub lecture_id: String,
    pub title: String,
    #[serde(flatten)]
    pub materials: LectureMaterials,
}

/// Partial materials update. Absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateLectureRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub slides: Option<String>,
    #[serde(default)]
    pub recording: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub transcript_vtt: Option<String>,
    #[serde(default)]
    pub ai_note: Option<String>,
}

impl From<Lecture> for LectureResponse {
    fn from(lecture: Lecture) -> Self {
        Self {
            lecture_id: lecture.id,
            title: lecture.name,
            materials: lecture.materials,
        }
    }
}

/// Fetch a lecture, checking it belongs to the course in the path.
async fn lecture_in_course(
    state: &AppState,
    course_id: &str,
    lecture_id: &str,
) -> Result<Lecture, ApiError> {
    let lecture = state
        .storage
        .get_lecture(lecture_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("lecture not found: {lecture_id}")))?;

    if lecture.course_id != course_id {
        return Err(ApiError::NotFound(format!(
            "lecture not found in course: {lecture_id}"
        )));
    }

    Ok(lecture)
}

/// `GET /courses/{course_id}/lectures/{lecture_id}`
pub async fn get_lecture(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path((course_id, lecture_id)): Path<(String, String)>,
) -> Result<Json<LectureResponse>, ApiError> {
    let lecture = lecture_in_course(&state, &course_id, &lecture_id).await?;
    Ok(Json(lecture.into()))
}

/// `PUT /courses/{course_id}/lectures/{lecture_id}` — partial update.
pub async fn update_lecture(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path((course_id, lecture_id)): Path<(String, String)>,
    Json(body): Json<UpdateLectureRequest>,
) -> Result<Json<LectureResponse>, ApiError> {
    lecture_in_course(&state, &course_id, &lecture_id).await?;

    if let Some(title) = &body.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("title cannot be empty".into()));
        }
        state.storage.rename_lecture(&lecture_id, title.trim()).await?;
    }

    let patch = LectureMaterials {
        note: body.note,
        slides: body.slides,
        recording: body.recording,
        transcript: body.transcript,
        transcript_vtt: body.transcript_vtt,
        ai_note: body.ai_note,
    };
    state
        .storage
        .update_lecture_materials(&lecture_id, &patch)
        .await?;

    info!(%lecture_id, "lecture updated");

    let updated = lecture_in_course(&state, &course_id, &lecture_id).await?;
    Ok(Json(updated.into()))
}
