//! Multipart lecture-save and per-course file listing routes.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use tracing::info;

use lectern_shared::{LectureMaterials, UploadKind, UploadRecord};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::uploads::store_file;

#[derive(Debug, Serialize)]
pub struct SaveLectureResponse {
    pub message: &'static str,
    pub lecture_id: String,
    /// Served paths of the stored files.
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub file_name: String,
    pub file_path: String,
    pub upload_date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesResponse {
    pub audio_files: Vec<FileInfo>,
    pub pdf_files: Vec<FileInfo>,
}

impl From<UploadRecord> for FileInfo {
    fn from(record: UploadRecord) -> Self {
        Self {
            file_name: record.file_name,
            file_path: record.path,
            upload_date: record.uploaded_at.to_rfc3339(),
        }
    }
}

/// One parsed file part.
struct FilePart {
    kind: UploadKind,
    original_name: Option<String>,
    bytes: Vec<u8>,
}

/// `POST /api/lectures/save` — multipart upload of lecture files.
///
/// Accepts optional `audio` and `slides` file parts plus `title`,
/// `transcript`, `courseId`, and `lectureId` text fields. A missing
/// `lectureId` creates a fresh lecture in the course.
pub async fn save_lecture(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SaveLectureResponse>), ApiError> {
    let mut title = None;
    let mut transcript = None;
    let mut course_id = None;
    let mut lecture_id = None;
    let mut file_parts: Vec<FilePart> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" | "slides" => {
                let kind = if name == "audio" {
                    UploadKind::Audio
                } else {
                    UploadKind::Slides
                };
                let original_name = field.file_name().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read {name}: {e}")))?
                    .to_vec();
                file_parts.push(FilePart {
                    kind,
                    original_name,
                    bytes,
                });
            }
            "title" => title = Some(read_text_field(field).await?),
            "transcript" => transcript = Some(read_text_field(field).await?),
            "courseId" => course_id = Some(read_text_field(field).await?),
            "lectureId" => lecture_id = Some(read_text_field(field).await?),
            _ => {}
        }
    }

    let course_id =
        course_id.ok_or_else(|| ApiError::BadRequest("courseId field is required".into()))?;

    state
        .storage
        .get_course(&course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("course not found: {course_id}")))?;

    // Attach to the given lecture, or start a fresh one.
    let lecture_id = match lecture_id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => {
            let name = title.clone().unwrap_or_else(|| "Untitled lecture".into());
            state
                .storage
                .insert_lecture(&course_id, &name, &LectureMaterials::default())
                .await?
        }
    };

    let mut stored_paths = Vec::new();
    let mut patch = LectureMaterials {
        transcript: transcript.filter(|t| !t.is_empty()),
        ..Default::default()
    };

    for part in file_parts {
        let record = store_file(
            &state.uploads_dir,
            &course_id,
            &lecture_id,
            part.kind,
            part.original_name.as_deref(),
            &part.bytes,
        )?;
        state.storage.insert_upload(&record).await?;

        match part.kind {
            UploadKind::Audio => patch.recording = Some(record.path.clone()),
            UploadKind::Slides => patch.slides = Some(record.path.clone()),
        }
        stored_paths.push(record.path);
    }

    state
        .storage
        .update_lecture_materials(&lecture_id, &patch)
        .await?;

    info!(%course_id, %lecture_id, files = stored_paths.len(), "lecture saved");

    Ok((
        StatusCode::CREATED,
        Json(SaveLectureResponse {
            message: "Lecture saved successfully",
            lecture_id,
            files: stored_paths,
        }),
    ))
}

/// `GET /api/files/{course_id}` — list a course's uploaded files.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(course_id): Path<String>,
) -> Result<Json<FilesResponse>, ApiError> {
    let audio_files = state
        .storage
        .list_uploads_by_course(&course_id, Some(UploadKind::Audio))
        .await?
        .into_iter()
        .map(FileInfo::from)
        .collect();

    let pdf_files = state
        .storage
        .list_uploads_by_course(&course_id, Some(UploadKind::Slides))
        .await?
        .into_iter()
        .map(FileInfo::from)
        .collect();

    Ok(Json(FilesResponse {
        audio_files,
        pdf_files,
    }))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart field: {e}")))
}
