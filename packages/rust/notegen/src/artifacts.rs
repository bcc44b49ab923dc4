//! Stage artifact files in the pipeline workdir.
//!
//! Every pipeline stage writes its output to a plain text/HTML file so a
//! run can be inspected or resumed stage by stage. Writes are atomic
//! (temp file + rename).

use std::path::{Path, PathBuf};

use tracing::debug;

use lectern_shared::{LecternError, Result};

/// Input: raw transcript text.
pub const TRANSCRIPT_FILE: &str = "transcript.txt";
/// Input: timestamped VTT capture.
pub const TRANSCRIPT_VTT_FILE: &str = "transcript.vtt";
/// Stage 1 output.
pub const OUTLINE_FILE: &str = "outline.txt";
/// Stage 2 output.
pub const TIMESTAMPED_OUTLINE_FILE: &str = "time_stamped_outline.txt";
/// Stage 3 output.
pub const TIMESTAMPED_NOTES_FILE: &str = "time_stamped_notes.txt";
/// Stage 4 output.
pub const KEY_TERMS_FILE: &str = "key_terms.txt";
/// Research stage output (one section appended per key term).
pub const WEB_NOTES_FILE: &str = "web_notes.txt";
/// Image-enrichment output.
pub const ILLUSTRATED_NOTES_FILE: &str = "illustrated_notes.txt";

/// Read a stage file from the workdir.
pub fn read_stage(workdir: &Path, name: &str) -> Result<String> {
    let path = workdir.join(name);
    std::fs::read_to_string(&path).map_err(|e| LecternError::io(&path, e))
}

/// Atomically write a stage file, creating the workdir if needed.
/// Returns the final path.
pub fn write_stage(workdir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(workdir).map_err(|e| LecternError::io(workdir, e))?;

    let target = workdir.join(name);
    let temp = workdir.join(format!(".{name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| LecternError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| LecternError::io(&target, e))?;

    debug!(path = %target.display(), size = content.len(), "wrote stage artifact");
    Ok(target)
}

/// Append a section to a stage file (plus a trailing newline), creating it
/// if absent.
pub fn append_stage(workdir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    use std::io::Write;

    std::fs::create_dir_all(workdir).map_err(|e| LecternError::io(workdir, e))?;

    let target = workdir.join(name);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&target)
        .map_err(|e| LecternError::io(&target, e))?;

    file.write_all(content.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .map_err(|e| LecternError::io(&target, e))?;

    debug!(path = %target.display(), size = content.len(), "appended stage artifact");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_workdir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lectern-artifacts-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn write_then_read_roundtrip() {
        let dir = temp_workdir();
        write_stage(&dir, OUTLINE_FILE, "<h1>1. Intro</h1>").unwrap();
        let content = read_stage(&dir, OUTLINE_FILE).unwrap();
        assert_eq!(content, "<h1>1. Intro</h1>");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_overwrites_previous_content() {
        let dir = temp_workdir();
        write_stage(&dir, KEY_TERMS_FILE, "old").unwrap();
        write_stage(&dir, KEY_TERMS_FILE, "new").unwrap();
        assert_eq!(read_stage(&dir, KEY_TERMS_FILE).unwrap(), "new");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_leaves_no_temp_files() {
        let dir = temp_workdir();
        write_stage(&dir, WEB_NOTES_FILE, "content").unwrap();

        for entry in std::fs::read_dir(&dir).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn append_accumulates_sections() {
        let dir = temp_workdir();
        write_stage(&dir, WEB_NOTES_FILE, "<h1>1 Term A</h1>\n").unwrap();
        append_stage(&dir, WEB_NOTES_FILE, "<h1>2 Term B</h1>").unwrap();

        let content = read_stage(&dir, WEB_NOTES_FILE).unwrap();
        assert!(content.contains("Term A"));
        assert!(content.contains("Term B"));
        assert!(content.find("Term A").unwrap() < content.find("Term B").unwrap());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_missing_stage_errors() {
        let dir = temp_workdir();
        let err = read_stage(&dir, TRANSCRIPT_FILE).unwrap_err();
        assert!(err.to_string().contains("transcript.txt"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
