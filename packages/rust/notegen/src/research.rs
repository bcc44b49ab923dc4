//! Key-term web research.
//!
//! For each extracted key term: search the web for academic sources, scrape
//! them, summarize the combined text chunk by chunk, then merge the chunk
//! summaries into a final set of sourced notes appended to `web_notes.txt`.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::{info, instrument};

use lectern_genai::{GenAiClient, Part};
use lectern_shared::Result;
use lectern_websearch::SearchClient;

use crate::artifacts::{self, KEY_TERMS_FILE, WEB_NOTES_FILE};
use crate::pipeline::{NotegenConfig, ProgressReporter};
use crate::prompts;

/// Result of a `research_notes` run.
#[derive(Debug)]
pub struct ResearchResult {
    /// Key terms researched.
    pub terms: Vec<String>,
    /// Path to the written notes file.
    pub notes_path: PathBuf,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Run web research for every key term in `key_terms.txt`.
///
/// The first term overwrites `web_notes.txt`; later terms append.
#[instrument(skip_all, fields(workdir = %config.workdir.display()))]
pub async fn research_notes(
    genai: &GenAiClient,
    search: &SearchClient,
    config: &NotegenConfig,
    progress: &dyn ProgressReporter,
) -> Result<ResearchResult> {
    let start = Instant::now();

    let raw_terms = artifacts::read_stage(&config.workdir, KEY_TERMS_FILE)?;
    let terms = parse_key_terms(&raw_terms);
    info!(terms = terms.len(), "starting key-term research");

    let mut notes_path = config.workdir.join(WEB_NOTES_FILE);
    let total = terms.len();

    for (idx, term) in terms.iter().enumerate() {
        let ordinal = idx + 1;
        progress.task_progress(ordinal, total, &format!("Researching: {term}"));

        let hits = search.search_web(term, config.num_results).await?;
        let mut combined = String::new();
        for hit in &hits {
            info!(url = %hit.url, term = %term, "scanned source");
            combined.push_str(&hit.url);
            combined.push_str(": ");
            combined.push_str(&hit.text);
            combined.push('\n');
        }

        // Summarize chunk by chunk, then merge.
        let mut summaries = Vec::new();
        for chunk in chunk_text(&combined, config.max_chunk_chars) {
            let summary = genai
                .generate(
                    &config.notes_model,
                    &[Part::text(prompts::chunk_summary_prompt(term, &chunk))],
                )
                .await?;
            summaries.push(prompts::strip_outer_fence(&summary));
        }
        let combined_summary = summaries.join("\n");

        let final_notes = genai
            .generate(
                &config.notes_model,
                &[Part::text(prompts::combine_summaries_prompt(
                    ordinal,
                    term,
                    &combined_summary,
                ))],
            )
            .await?;
        let final_notes = prompts::strip_outer_fence(&final_notes);

        // First term starts a fresh file; later terms accumulate.
        notes_path = if idx == 0 {
            artifacts::write_stage(&config.workdir, WEB_NOTES_FILE, &format!("{final_notes}\n"))?
        } else {
            artifacts::append_stage(&config.workdir, WEB_NOTES_FILE, &final_notes)?
        };

        info!(term = %term, sources = hits.len(), "term research complete");
    }

    let result = ResearchResult {
        terms,
        notes_path,
        elapsed: start.elapsed(),
    };

    info!(
        terms = result.terms.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "web research complete"
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// Parsing & chunking
// ---------------------------------------------------------------------------

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid regex"));
static NUMBERING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.?\s*").expect("valid regex"));

/// Parse the key-terms artifact into clean search queries.
///
/// Each line holds one `<h1>` heading; tags, timestamp markers, and leading
/// numbering are stripped, and empty lines are skipped.
pub fn parse_key_terms(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| {
            let line = TAG_RE.replace_all(line, "");
            let line = MARKER_RE.replace_all(&line, "");
            let line = NUMBERING_RE.replace(&line, "");
            line.trim().to_string()
        })
        .filter(|term| !term.is_empty())
        .collect()
}

/// Split text into chunks of at most `max_chars` characters, respecting
/// UTF-8 boundaries.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() || max_chars == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
