//! Image enrichment for researched notes.
//!
//! Looks up one best-guess diagram per key term and injects an `<img>` tag
//! after the term's heading in the web notes. Lookup failures are logged
//! and skipped; enrichment never fails the run over a single image.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use lectern_shared::Result;
use lectern_websearch::SearchClient;

use crate::artifacts::{self, ILLUSTRATED_NOTES_FILE, KEY_TERMS_FILE, WEB_NOTES_FILE};
use crate::pipeline::{NotegenConfig, ProgressReporter};
use crate::research::parse_key_terms;

/// Result of an `illustrate_notes` run.
#[derive(Debug)]
pub struct IllustrateResult {
    /// Number of terms that received an image.
    pub images_added: usize,
    /// Path to the illustrated notes file.
    pub notes_path: PathBuf,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Enrich the researched notes with one diagram image per key term.
///
/// Reads `key_terms.txt` and `web_notes.txt`, writes
/// `illustrated_notes.txt`. Terms without a usable image keep their section
/// untouched.
#[instrument(skip_all, fields(workdir = %config.workdir.display()))]
pub async fn illustrate_notes(
    search: &SearchClient,
    config: &NotegenConfig,
    progress: &dyn ProgressReporter,
) -> Result<IllustrateResult> {
    let start = Instant::now();

    let raw_terms = artifacts::read_stage(&config.workdir, KEY_TERMS_FILE)?;
    let terms = parse_key_terms(&raw_terms);
    let mut notes = artifacts::read_stage(&config.workdir, WEB_NOTES_FILE)?;

    let mut images_added = 0;
    let total = terms.len();

    for (idx, term) in terms.iter().enumerate() {
        progress.task_progress(idx + 1, total, &format!("Illustrating: {term}"));

        match search.image_search(term).await {
            Ok(Some(url)) => {
                if let Some(updated) = inject_image(&notes, term, &url) {
                    notes = updated;
                    images_added += 1;
                    info!(term = %term, %url, "image injected");
                } else {
                    warn!(term = %term, "no matching heading in web notes");
                }
            }
            Ok(None) => info!(term = %term, "no usable image found"),
            Err(e) => warn!(term = %term, error = %e, "image search failed, skipping term"),
        }
    }

    let notes_path = artifacts::write_stage(&config.workdir, ILLUSTRATED_NOTES_FILE, &notes)?;

    let result = IllustrateResult {
        images_added,
        notes_path,
        elapsed: start.elapsed(),
    };

    info!(
        images = result.images_added,
        terms = total,
        elapsed_ms = result.elapsed.as_millis(),
        "image enrichment complete"
    );

    Ok(result)
}

/// Insert an `<img>` tag on the line after the `<h1>` heading mentioning
/// `term`. Returns `None` when no heading matches.
pub fn inject_image(notes: &str, term: &str, image_url: &str) -> Option<String> {
    let term_lower = term.to_lowercase();
    let mut out = Vec::new();
    let mut injected = false;

    for line in notes.lines() {
        out.push(line.to_string());
        if !injected
            && line.to_lowercase().contains("<h1>")
            && line.to_lowercase().contains(&term_lower)
        {
            out.push(format!(r#"<img src="{image_url}" alt="{term}">"#));
            injected = true;
        }
    }

    injected.then(|| out.join("\n"))
}
