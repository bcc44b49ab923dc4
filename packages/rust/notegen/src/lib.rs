//! Note-generation pipeline orchestration.
//!
//! This crate ties the generative-language client and web search together
//! into the offline workflows:
//! - [`pipeline::generate_notes`] — transcript → outline → timestamped
//!   outline → timestamped notes → key terms
//! - [`research::research_notes`] — key terms → scraped sources → sourced
//!   web notes
//! - [`images::illustrate_notes`] — key terms → diagram images → illustrated
//!   notes

pub mod artifacts;
pub mod images;
pub mod pipeline;
pub mod prompts;
pub mod research;
pub mod timestamps;

pub use images::{IllustrateResult, illustrate_notes, inject_image};
pub use pipeline::{
    GenerateResult, NotegenConfig, ProgressReporter, SilentProgress, generate_notes,
};
pub use research::{ResearchResult, chunk_text, parse_key_terms, research_notes};
pub use timestamps::{TimestampedHeading, decode_headings, parse_timestamp};
