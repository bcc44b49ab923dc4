//! Transcript → notes pipeline.
//!
//! Chains four model calls, each feeding the next, with every stage's
//! output written to the workdir: outline, timestamped outline,
//! timestamped notes, key terms.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use lectern_genai::{GenAiClient, Part};
use lectern_shared::{AppConfig, Result};

use crate::artifacts::{
    self, KEY_TERMS_FILE, OUTLINE_FILE, TIMESTAMPED_NOTES_FILE, TIMESTAMPED_OUTLINE_FILE,
    TRANSCRIPT_FILE, TRANSCRIPT_VTT_FILE,
};
use crate::prompts;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Runtime configuration for the note-generation pipeline.
#[derive(Debug, Clone)]
pub struct NotegenConfig {
    /// Directory holding transcripts and stage artifacts.
    pub workdir: PathBuf,
    /// Model for the initial outline pass.
    pub outline_model: String,
    /// Model for the remaining passes.
    pub notes_model: String,
    /// Scraped sites per key term during research.
    pub num_results: usize,
    /// Maximum characters per summarization chunk.
    pub max_chunk_chars: usize,
}

impl From<&AppConfig> for NotegenConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            workdir: PathBuf::from(&config.pipeline.workdir),
            outline_model: config.genai.outline_model.clone(),
            notes_model: config.genai.notes_model.clone(),
            num_results: config.search.num_results,
            max_chunk_chars: config.pipeline.max_chunk_chars,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for pipeline runs.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Task-level progress within the current phase.
    fn task_progress(&self, current: usize, total: usize, detail: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn task_progress(&self, _current: usize, _total: usize, _detail: &str) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Result of a `generate_notes` run.
#[derive(Debug)]
pub struct GenerateResult {
    /// Stage artifacts written, in order.
    pub artifacts: Vec<PathBuf>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Run the transcript → notes stages.
///
/// Reads `transcript.txt` and `transcript.vtt` from the workdir, then:
/// 1. outline
/// 2. timestamped outline (against the VTT)
/// 3. timestamped notes
/// 4. key terms
///
/// Each stage strips an outer code fence from the model output before
/// writing its artifact.
#[instrument(skip_all, fields(workdir = %config.workdir.display()))]
pub async fn generate_notes(
    client: &GenAiClient,
    config: &NotegenConfig,
    progress: &dyn ProgressReporter,
) -> Result<GenerateResult> {
    let start = Instant::now();
    let mut written = Vec::new();

    // --- Inputs ---
    progress.phase("Uploading transcript");
    let transcript = artifacts::read_stage(&config.workdir, TRANSCRIPT_FILE)?;
    let transcript_file = client
        .upload_file(TRANSCRIPT_FILE, "text/plain", transcript.into_bytes())
        .await?;

    // --- Stage 1: outline ---
    progress.phase("Generating outline");
    let outline = client
        .generate(
            &config.outline_model,
            &[
                Part::text(prompts::outline_prompt()),
                Part::File(transcript_file),
            ],
        )
        .await?;
    let outline = prompts::strip_outer_fence(&outline);
    written.push(artifacts::write_stage(
        &config.workdir,
        OUTLINE_FILE,
        &outline,
    )?);
    info!("finished initial outline");

    // --- Stage 2: timestamped outline ---
    progress.phase("Timestamping outline");
    let vtt = artifacts::read_stage(&config.workdir, TRANSCRIPT_VTT_FILE)?;
    let vtt_file = client
        .upload_file(TRANSCRIPT_VTT_FILE, "text/vtt", vtt.into_bytes())
        .await?;

    let timestamped_outline = client
        .generate(
            &config.notes_model,
            &[
                Part::text(prompts::timestamped_outline_prompt()),
                Part::text(outline),
                Part::File(vtt_file.clone()),
            ],
        )
        .await?;
    let timestamped_outline = prompts::strip_outer_fence(&timestamped_outline);
    written.push(artifacts::write_stage(
        &config.workdir,
        TIMESTAMPED_OUTLINE_FILE,
        &timestamped_outline,
    )?);
    info!("finished timestamped outline");

    // --- Stage 3: timestamped notes ---
    progress.phase("Writing detailed notes");
    let timestamped_notes = client
        .generate(
            &config.notes_model,
            &[
                Part::text(prompts::timestamped_notes_prompt()),
                Part::text(timestamped_outline),
                Part::File(vtt_file),
            ],
        )
        .await?;
    let timestamped_notes = prompts::strip_outer_fence(&timestamped_notes);
    written.push(artifacts::write_stage(
        &config.workdir,
        TIMESTAMPED_NOTES_FILE,
        &timestamped_notes,
    )?);
    info!("finished timestamped notes");

    // --- Stage 4: key terms ---
    progress.phase("Extracting key terms");
    let key_terms = client
        .generate(
            &config.notes_model,
            &[
                Part::text(prompts::key_terms_prompt()),
                Part::text(timestamped_notes),
            ],
        )
        .await?;
    let key_terms = prompts::strip_outer_fence(&key_terms);
    written.push(artifacts::write_stage(
        &config.workdir,
        KEY_TERMS_FILE,
        &key_terms,
    )?);
    info!("finished keyterm extraction");

    let result = GenerateResult {
        artifacts: written,
        elapsed: start.elapsed(),
    };

    info!(
        artifacts = result.artifacts.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "note generation complete"
    );

    Ok(result)
}
