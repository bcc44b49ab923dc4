//! Core domain types for Lectern.
//!
//! Records are plain serde structs; persistence enforces nothing beyond
//! field presence (plus the unique email constraint on users).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a new time-sortable record identifier (UUID v7).
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

// ---------------------------------------------------------------------------
// UserRecord
// ---------------------------------------------------------------------------

/// A registered user as stored in the database.
///
/// `password_hash` is an Argon2id PHC string; the plaintext password never
/// leaves the registration/login handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Course
// ---------------------------------------------------------------------------

/// A course owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    /// Owning user.
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Lecture & materials
// ---------------------------------------------------------------------------

/// The set of artifacts attached to a lecture.
///
/// Each field holds either inline text (notes, transcripts) or a served URL
/// (recordings, slides). All fields are optional; a partial update touches
/// only the fields it supplies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LectureMaterials {
    /// The user's own note text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Served URL of the uploaded slide deck.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slides: Option<String>,
    /// Served URL of the uploaded audio recording.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<String>,
    /// Raw transcript text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    /// Timestamped VTT capture of the recording.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_vtt: Option<String>,
    /// Pipeline-generated HTML notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_note: Option<String>,
}

/// A lecture within a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lecture {
    pub id: String,
    pub course_id: String,
    pub name: String,
    #[serde(flatten)]
    pub materials: LectureMaterials,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// The kind of an uploaded lecture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    Audio,
    Slides,
}

impl UploadKind {
    /// Subdirectory under the uploads root where files of this kind land.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Slides => "slides",
        }
    }
}

impl std::str::FromStr for UploadKind {
    type Err = crate::error::LecternError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "audio" => Ok(Self::Audio),
            "slides" => Ok(Self::Slides),
            other => Err(crate::error::LecternError::validation(format!(
                "unknown upload kind: {other}"
            ))),
        }
    }
}

/// Metadata for a stored upload, kept alongside the file on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: String,
    pub course_id: String,
    pub lecture_id: String,
    /// Unique on-disk file name (timestamp-based).
    pub file_name: String,
    /// Served path, e.g. `/uploads/audio/<file_name>`.
    pub path: String,
    pub kind: UploadKind,
    /// SHA-256 of the file contents.
    pub content_hash: String,
    pub uploaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn materials_default_is_all_none() {
        let m = LectureMaterials::default();
        assert!(m.note.is_none());
        assert!(m.ai_note.is_none());
        let json = serde_json::to_string(&m).expect("serialize");
        assert_eq!(json, "{}");
    }

    #[test]
    fn lecture_serializes_materials_flat() {
        let lecture = Lecture {
            id: new_id(),
            course_id: new_id(),
            name: "Week 3: Sorting".into(),
            materials: LectureMaterials {
                transcript: Some("merge sort splits the input".into()),
                ..Default::default()
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&lecture).expect("serialize");
        assert_eq!(json["name"], "Week 3: Sorting");
        // Flattened: transcript at the top level, not nested under "materials".
        assert_eq!(json["transcript"], "merge sort splits the input");
        assert!(json.get("materials").is_none());
    }

    #[test]
    fn upload_kind_roundtrip() {
        assert_eq!("audio".parse::<UploadKind>().unwrap(), UploadKind::Audio);
        assert_eq!("slides".parse::<UploadKind>().unwrap(), UploadKind::Slides);
        assert!("video".parse::<UploadKind>().is_err());
        assert_eq!(UploadKind::Audio.as_str(), "audio");
    }
}
