//! libSQL storage layer for Lectern.
//!
//! The [`Storage`] struct wraps an embedded libSQL database holding users,
//! courses, lectures, and upload metadata. The server owns a single handle
//! and shares it through its application state; the CLI never touches it.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use uuid::Uuid;

use lectern_shared::{
    Course, Lecture, LectureMaterials, LecternError, Result, UploadKind, UploadRecord, UserRecord,
};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LecternError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| LecternError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| LecternError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    LecternError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // User operations
    // -----------------------------------------------------------------------

    /// Insert a new user. A duplicate email surfaces as a storage error
    /// with a stable "email already registered" message.
    pub async fn insert_user(&self, user: &UserRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO users (id, full_name, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.id.as_str(),
                    user.full_name.as_str(),
                    user.email.as_str(),
                    user.password_hash.as_str(),
                    user.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("UNIQUE") {
                    LecternError::Storage("email already registered".into())
                } else {
                    LecternError::Storage(msg)
                }
            })?;
        Ok(())
    }

    /// Find a user by email address.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, full_name, email, password_hash, created_at
                 FROM users WHERE email = ?1",
                params![email],
            )
            .await
            .map_err(|e| LecternError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_user(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(LecternError::Storage(e.to_string())),
        }
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<UserRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, full_name, email, password_hash, created_at
                 FROM users WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| LecternError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_user(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(LecternError::Storage(e.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Course operations
    // -----------------------------------------------------------------------

    /// Insert a new course. Returns the generated course ID.
    pub async fn insert_course(&self, name: &str, owner_id: &str) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO courses (id, name, owner_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id.as_str(), name, owner_id, now.as_str()],
            )
            .await
            .map_err(|e| LecternError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// List all courses owned by a user.
    pub async fn list_courses(&self, owner_id: &str) -> Result<Vec<Course>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, owner_id, created_at FROM courses
                 WHERE owner_id = ?1 ORDER BY created_at",
                params![owner_id],
            )
            .await
            .map_err(|e| LecternError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(Course {
                id: get_text(&row, 0)?,
                name: get_text(&row, 1)?,
                owner_id: get_text(&row, 2)?,
                created_at: get_datetime(&row, 3)?,
            });
        }
        Ok(results)
    }

    /// Get a course by ID.
    pub async fn get_course(&self, id: &str) -> Result<Option<Course>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, owner_id, created_at FROM courses WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| LecternError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(Course {
                id: get_text(&row, 0)?,
                name: get_text(&row, 1)?,
                owner_id: get_text(&row, 2)?,
                created_at: get_datetime(&row, 3)?,
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(LecternError::Storage(e.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Lecture operations
    // -----------------------------------------------------------------------

    /// Insert a new lecture with its initial materials. Returns the lecture ID.
    pub async fn insert_lecture(
        &self,
        course_id: &str,
        name: &str,
        materials: &LectureMaterials,
    ) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO lectures
                   (id, course_id, name, note, slides, recording, transcript,
                    transcript_vtt, ai_note, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    id.as_str(),
                    course_id,
                    name,
                    materials.note.as_deref(),
                    materials.slides.as_deref(),
                    materials.recording.as_deref(),
                    materials.transcript.as_deref(),
                    materials.transcript_vtt.as_deref(),
                    materials.ai_note.as_deref(),
                    now.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| LecternError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// List lectures in a course (id + name only, for listings).
    pub async fn list_lectures_by_course(&self, course_id: &str) -> Result<Vec<(String, String)>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name FROM lectures WHERE course_id = ?1 ORDER BY created_at",
                params![course_id],
            )
            .await
            .map_err(|e| LecternError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push((get_text(&row, 0)?, get_text(&row, 1)?));
        }
        Ok(results)
    }

    /// Get a full lecture record by ID.
    pub async fn get_lecture(&self, id: &str) -> Result<Option<Lecture>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, course_id, name, note, slides, recording, transcript,
                        transcript_vtt, ai_note, created_at, updated_at
                 FROM lectures WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| LecternError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_lecture(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(LecternError::Storage(e.to_string())),
        }
    }

    /// Apply a partial materials update: only fields present in `patch`
    /// change; absent fields keep their stored value. Bumps `updated_at`.
    pub async fn update_lecture_materials(
        &self,
        id: &str,
        patch: &LectureMaterials,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let affected = self
            .conn
            .execute(
                "UPDATE lectures SET
                   note           = COALESCE(?1, note),
                   slides         = COALESCE(?2, slides),
                   recording      = COALESCE(?3, recording),
                   transcript     = COALESCE(?4, transcript),
                   transcript_vtt = COALESCE(?5, transcript_vtt),
                   ai_note        = COALESCE(?6, ai_note),
                   updated_at     = ?7
                 WHERE id = ?8",
                params![
                    patch.note.as_deref(),
                    patch.slides.as_deref(),
                    patch.recording.as_deref(),
                    patch.transcript.as_deref(),
                    patch.transcript_vtt.as_deref(),
                    patch.ai_note.as_deref(),
                    now.as_str(),
                    id,
                ],
            )
            .await
            .map_err(|e| LecternError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(LecternError::Storage(format!("lecture not found: {id}")));
        }
        Ok(())
    }

    /// Rename a lecture.
    pub async fn rename_lecture(&self, id: &str, name: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE lectures SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, now.as_str(), id],
            )
            .await
            .map_err(|e| LecternError::Storage(e.to_string()))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Upload operations
    // -----------------------------------------------------------------------

    /// Record an uploaded file's metadata.
    pub async fn insert_upload(&self, upload: &UploadRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO uploads
                   (id, course_id, lecture_id, file_name, path, kind, content_hash, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    upload.id.as_str(),
                    upload.course_id.as_str(),
                    upload.lecture_id.as_str(),
                    upload.file_name.as_str(),
                    upload.path.as_str(),
                    upload.kind.as_str(),
                    upload.content_hash.as_str(),
                    upload.uploaded_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| LecternError::Storage(e.to_string()))?;
        Ok(())
    }

    /// List uploads for a course, optionally filtered by kind.
    pub async fn list_uploads_by_course(
        &self,
        course_id: &str,
        kind: Option<UploadKind>,
    ) -> Result<Vec<UploadRecord>> {
        let mut rows = match kind {
            Some(k) => self
                .conn
                .query(
                    "SELECT id, course_id, lecture_id, file_name, path, kind, content_hash, uploaded_at
                     FROM uploads WHERE course_id = ?1 AND kind = ?2 ORDER BY uploaded_at",
                    params![course_id, k.as_str()],
                )
                .await,
            None => self
                .conn
                .query(
                    "SELECT id, course_id, lecture_id, file_name, path, kind, content_hash, uploaded_at
                     FROM uploads WHERE course_id = ?1 ORDER BY uploaded_at",
                    params![course_id],
                )
                .await,
        }
        .map_err(|e| LecternError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_upload(&row)?);
        }
        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// Row conversion helpers
// ---------------------------------------------------------------------------

fn get_text(row: &libsql::Row, idx: i32) -> Result<String> {
    row.get::<String>(idx)
        .map_err(|e| LecternError::Storage(e.to_string()))
}

fn get_datetime(row: &libsql::Row, idx: i32) -> Result<DateTime<Utc>> {
    let s: String = row
        .get(idx)
        .map_err(|e| LecternError::Storage(e.to_string()))?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LecternError::Storage(format!("invalid date: {e}")))
}

fn row_to_user(row: &libsql::Row) -> Result<UserRecord> {
    Ok(UserRecord {
        id: get_text(row, 0)?,
        full_name: get_text(row, 1)?,
        email: get_text(row, 2)?,
        password_hash: get_text(row, 3)?,
        created_at: get_datetime(row, 4)?,
    })
}

fn row_to_lecture(row: &libsql::Row) -> Result<Lecture> {
    Ok(Lecture {
        id: get_text(row, 0)?,
        course_id: get_text(row, 1)?,
        name: get_text(row, 2)?,
        materials: LectureMaterials {
            note: row.get::<String>(3).ok(),
            slides: row.get::<String>(4).ok(),
            recording: row.get::<String>(5).ok(),
            transcript: row.get::<String>(6).ok(),
            transcript_vtt: row.get::<String>(7).ok(),
            ai_note: row.get::<String>(8).ok(),
        },
        created_at: get_datetime(row, 9)?,
        updated_at: get_datetime(row, 10)?,
    })
}

fn row_to_upload(row: &libsql::Row) -> Result<UploadRecord> {
    Ok(UploadRecord {
        id: get_text(row, 0)?,
        course_id: get_text(row, 1)?,
        lecture_id: get_text(row, 2)?,
        file_name: get_text(row, 3)?,
        path: get_text(row, 4)?,
        kind: get_text(row, 5)?.parse()?,
        content_hash: get_text(row, 6)?,
        uploaded_at: get_datetime(row, 7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lectern_shared::new_id;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("lectern_test_{}.db", new_id()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn test_user(email: &str) -> UserRecord {
        UserRecord {
            id: new_id(),
            full_name: "Ada Lovelace".into(),
            email: email.into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        assert_eq!(storage.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("lectern_test_{}.db", new_id()));
        let s1 = Storage::open(&tmp).await.expect("first open");
        drop(s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let storage = test_storage().await;

        storage
            .insert_user(&test_user("ada@example.edu"))
            .await
            .expect("first insert");

        // Same email, different id: must be rejected and the original kept.
        let err = storage
            .insert_user(&test_user("ada@example.edu"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("email already registered"));

        let found = storage
            .find_user_by_email("ada@example.edu")
            .await
            .expect("lookup")
            .expect("user exists");
        assert_eq!(found.full_name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn user_lookup_by_email_and_id() {
        let storage = test_storage().await;
        let user = test_user("grace@example.edu");
        storage.insert_user(&user).await.unwrap();

        let by_email = storage
            .find_user_by_email("grace@example.edu")
            .await
            .unwrap()
            .expect("found");
        assert_eq!(by_email.id, user.id);

        let by_id = storage.get_user(&user.id).await.unwrap().expect("found");
        assert_eq!(by_id.email, "grace@example.edu");

        let missing = storage.find_user_by_email("nobody@example.edu").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn course_crud() {
        let storage = test_storage().await;
        let user = test_user("owner@example.edu");
        storage.insert_user(&user).await.unwrap();

        let course_id = storage
            .insert_course("Operating Systems", &user.id)
            .await
            .expect("insert course");

        let course = storage
            .get_course(&course_id)
            .await
            .unwrap()
            .expect("course exists");
        assert_eq!(course.name, "Operating Systems");
        assert_eq!(course.owner_id, user.id);

        storage.insert_course("Databases", &user.id).await.unwrap();
        let courses = storage.list_courses(&user.id).await.unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].name, "Operating Systems");
    }

    #[tokio::test]
    async fn lecture_insert_and_list() {
        let storage = test_storage().await;
        let user = test_user("prof@example.edu");
        storage.insert_user(&user).await.unwrap();
        let course_id = storage.insert_course("Algorithms", &user.id).await.unwrap();

        let materials = LectureMaterials {
            note: Some("intro notes".into()),
            transcript: Some("welcome to lecture one".into()),
            ..Default::default()
        };
        let lecture_id = storage
            .insert_lecture(&course_id, "Lecture 1", &materials)
            .await
            .expect("insert lecture");

        let listing = storage.list_lectures_by_course(&course_id).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].0, lecture_id);
        assert_eq!(listing[0].1, "Lecture 1");

        let lecture = storage
            .get_lecture(&lecture_id)
            .await
            .unwrap()
            .expect("lecture exists");
        assert_eq!(lecture.materials.note.as_deref(), Some("intro notes"));
        assert!(lecture.materials.ai_note.is_none());
    }

    #[tokio::test]
    async fn partial_update_leaves_untouched_fields() {
        let storage = test_storage().await;
        let user = test_user("prof2@example.edu");
        storage.insert_user(&user).await.unwrap();
        let course_id = storage.insert_course("Compilers", &user.id).await.unwrap();

        let initial = LectureMaterials {
            note: Some("hand-written notes".into()),
            transcript: Some("full transcript text".into()),
            recording: Some("/uploads/audio/rec.webm".into()),
            ..Default::default()
        };
        let lecture_id = storage
            .insert_lecture(&course_id, "Parsing", &initial)
            .await
            .unwrap();

        // Patch only ai_note; everything else must round-trip unchanged.
        let patch = LectureMaterials {
            ai_note: Some("<h1>[00:00:00] 1. Parsing</h1>".into()),
            ..Default::default()
        };
        storage
            .update_lecture_materials(&lecture_id, &patch)
            .await
            .expect("update");

        let after = storage
            .get_lecture(&lecture_id)
            .await
            .unwrap()
            .expect("lecture exists");
        assert_eq!(after.materials.note.as_deref(), Some("hand-written notes"));
        assert_eq!(
            after.materials.transcript.as_deref(),
            Some("full transcript text")
        );
        assert_eq!(
            after.materials.recording.as_deref(),
            Some("/uploads/audio/rec.webm")
        );
        assert_eq!(
            after.materials.ai_note.as_deref(),
            Some("<h1>[00:00:00] 1. Parsing</h1>")
        );
    }

    #[tokio::test]
    async fn update_missing_lecture_errors() {
        let storage = test_storage().await;
        let err = storage
            .update_lecture_materials("no-such-id", &LectureMaterials::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("lecture not found"));
    }

    #[tokio::test]
    async fn upload_roundtrip_and_kind_filter() {
        let storage = test_storage().await;
        let upload = UploadRecord {
            id: new_id(),
            course_id: "course-1".into(),
            lecture_id: "lecture-1".into(),
            file_name: "lecture_course-1_audio_1714489200123.webm".into(),
            path: "/uploads/audio/lecture_course-1_audio_1714489200123.webm".into(),
            kind: UploadKind::Audio,
            content_hash: "abc123".into(),
            uploaded_at: Utc::now(),
        };
        storage.insert_upload(&upload).await.expect("insert upload");

        let audio = storage
            .list_uploads_by_course("course-1", Some(UploadKind::Audio))
            .await
            .unwrap();
        assert_eq!(audio.len(), 1);
        assert_eq!(audio[0].file_name, upload.file_name);

        let slides = storage
            .list_uploads_by_course("course-1", Some(UploadKind::Slides))
            .await
            .unwrap();
        assert!(slides.is_empty());

        let all = storage.list_uploads_by_course("course-1", None).await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
