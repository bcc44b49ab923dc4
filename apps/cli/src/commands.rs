//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use lectern_genai::GenAiClient;
use lectern_notegen::{NotegenConfig, ProgressReporter};
use lectern_shared::{
    AppConfig, init_config, load_config, secret_from_env, validate_api_key,
};
use lectern_websearch::{SearchClient, SearchOptions};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Lectern — turn lecture transcripts into structured study notes.
#[derive(Parser)]
#[command(
    name = "lectern",
    version,
    about = "Generate timestamped lecture notes and enrich them from the web.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the transcript → notes stages (outline, timestamps, key terms).
    Generate {
        /// Working directory with transcript.txt and transcript.vtt.
        #[arg(short, long)]
        workdir: Option<String>,
    },

    /// Research each key term on the web and write sourced notes.
    Research {
        /// Working directory with key_terms.txt.
        #[arg(short, long)]
        workdir: Option<String>,

        /// Scraped sites per key term.
        #[arg(short, long)]
        num_results: Option<usize>,
    },

    /// Attach one diagram image per key term to the web notes.
    Illustrate {
        /// Working directory with key_terms.txt and web_notes.txt.
        #[arg(short, long)]
        workdir: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "lectern=info",
        1 => "lectern=debug",
        _ => "lectern=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate { workdir } => cmd_generate(workdir.as_deref()).await,
        Command::Research {
            workdir,
            num_results,
        } => cmd_research(workdir.as_deref(), num_results).await,
        Command::Illustrate { workdir } => cmd_illustrate(workdir.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Merge config-file pipeline settings with CLI overrides.
fn pipeline_config(
    config: &AppConfig,
    workdir: Option<&str>,
    num_results: Option<usize>,
) -> NotegenConfig {
    let mut notegen = NotegenConfig::from(config);
    if let Some(dir) = workdir {
        notegen.workdir = PathBuf::from(dir);
    }
    if let Some(n) = num_results {
        notegen.num_results = n;
    }
    notegen
}

fn genai_client(config: &AppConfig) -> Result<GenAiClient> {
    let api_key = secret_from_env(&config.genai.api_key_env)?;
    Ok(GenAiClient::new(api_key)?)
}

fn search_client(config: &AppConfig) -> Result<SearchClient> {
    let api_key = secret_from_env(&config.search.api_key_env)?;
    let engine_id = secret_from_env(&config.search.engine_id_env)?;
    Ok(SearchClient::new(api_key, engine_id)?
        .with_options(SearchOptions::from(&config.search)))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(workdir: Option<&str>) -> Result<()> {
    let config = load_config()?;
    validate_api_key(&config)?;

    let notegen = pipeline_config(&config, workdir, None);
    let client = genai_client(&config)?;

    info!(workdir = %notegen.workdir.display(), "generating notes");

    let reporter = CliProgress::new();
    let result = lectern_notegen::generate_notes(&client, &notegen, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Notes generated!");
    for artifact in &result.artifacts {
        println!("  Wrote:  {}", artifact.display());
    }
    println!("  Time:   {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_research(workdir: Option<&str>, num_results: Option<usize>) -> Result<()> {
    let config = load_config()?;
    validate_api_key(&config)?;

    let notegen = pipeline_config(&config, workdir, num_results);
    let genai = genai_client(&config)?;
    let search = search_client(&config)?;

    info!(
        workdir = %notegen.workdir.display(),
        num_results = notegen.num_results,
        "researching key terms"
    );

    let reporter = CliProgress::new();
    let result = lectern_notegen::research_notes(&genai, &search, &notegen, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Web research complete!");
    println!("  Terms:  {}", result.terms.len());
    println!("  Wrote:  {}", result.notes_path.display());
    println!("  Time:   {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_illustrate(workdir: Option<&str>) -> Result<()> {
    let config = load_config()?;

    let notegen = pipeline_config(&config, workdir, None);
    let search = search_client(&config)?;

    info!(workdir = %notegen.workdir.display(), "illustrating notes");

    let reporter = CliProgress::new();
    let result = lectern_notegen::illustrate_notes(&search, &notegen, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Image enrichment complete!");
    println!("  Images: {}", result.images_added);
    println!("  Wrote:  {}", result.notes_path.display());
    println!("  Time:   {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner-based progress reporter for pipeline runs.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn task_progress(&self, current: usize, total: usize, detail: &str) {
        self.spinner
            .set_message(format!("[{current}/{total}] {detail}"));
    }
}
