//! Shared types, error model, and configuration for Lectern.
//!
//! This crate is the foundation depended on by all other Lectern crates.
//! It provides:
//! - [`LecternError`] — the unified error type
//! - Domain records ([`UserRecord`], [`Course`], [`Lecture`], [`UploadRecord`])
//! - Configuration ([`AppConfig`], config loading, secret lookup)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GenAiConfig, PipelineConfig, SearchConfig, ServerConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, secret_from_env,
    validate_api_key,
};
pub use error::{LecternError, Result};
pub use types::{Course, Lecture, LectureMaterials, UploadKind, UploadRecord, UserRecord, new_id};
