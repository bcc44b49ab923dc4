//! Upload storage: timestamp-based unique file names and on-disk writes.

use std::path::Path;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::info;

use lectern_shared::{LecternError, Result, UploadKind, UploadRecord, new_id};

/// Build a timestamp-based unique file name for an upload.
///
/// The `now_ms` epoch-millisecond stamp guarantees uniqueness per course
/// and kind; the extension is carried over from the client's file name,
/// with a per-kind fallback.
pub fn timestamped_file_name(
    course_id: &str,
    kind: UploadKind,
    original_name: Option<&str>,
    now_ms: i64,
) -> String {
    let fallback = match kind {
        UploadKind::Audio => "webm",
        UploadKind::Slides => "pdf",
    };
    let ext = original_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or(fallback);

    format!("lecture_{course_id}_{}_{now_ms}.{ext}", kind.as_str())
}

/// Write uploaded bytes under `{uploads_dir}/{kind}/` and build the
/// metadata record (served path + SHA-256 content hash).
pub fn store_file(
    uploads_dir: &Path,
    course_id: &str,
    lecture_id: &str,
    kind: UploadKind,
    original_name: Option<&str>,
    bytes: &[u8],
) -> Result<UploadRecord> {
    let now = Utc::now();
    let file_name = timestamped_file_name(course_id, kind, original_name, now.timestamp_millis());

    let kind_dir = uploads_dir.join(kind.as_str());
    std::fs::create_dir_all(&kind_dir).map_err(|e| LecternError::io(&kind_dir, e))?;

    let target = kind_dir.join(&file_name);
    std::fs::write(&target, bytes).map_err(|e| LecternError::io(&target, e))?;

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let content_hash = format!("{:x}", hasher.finalize());

    info!(
        file = %file_name,
        kind = kind.as_str(),
        size = bytes.len(),
        "stored upload"
    );

    Ok(UploadRecord {
        id: new_id(),
        course_id: course_id.to_string(),
        lecture_id: lecture_id.to_string(),
        path: format!("/uploads/{}/{file_name}", kind.as_str()),
        file_name,
        kind,
        content_hash,
        uploaded_at: now,
    })
}
