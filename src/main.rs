//! RPA Workflow Generator
//!
//! Turns a recorded screen session (video plus interaction log) into
//! human-readable, editable RPA workflow commands.

use rpa_workflow_gen::app::cli::{self, Cli, Commands, ConfigAction};
use rpa_workflow_gen::app::config::Config;
use rpa_workflow_gen::gemini::{GeminiClient, GenerateOptions};
use rpa_workflow_gen::session::InteractionLog;
use rpa_workflow_gen::validation::{Validator, VideoMetadata};
use rpa_workflow_gen::workflow::generator::{GeneratorConfig, WorkflowGenerator};
use rpa_workflow_gen::Error;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Generate {
            video,
            log,
            output,
            name,
        } => {
            run_generate(&video, &log, output, name, &config)?;
        }
        Commands::Validate {
            video,
            log,
            duration,
        } => {
            run_validate(&video, &log, duration, &config)?;
        }
        Commands::List { detailed } => {
            run_list(detailed, &config)?;
        }
        Commands::Init { force } => {
            run_init(force, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

/// Read the declared session duration from the interaction log.
fn declared_duration(log_path: &Path) -> anyhow::Result<f64> {
    let log = InteractionLog::load(log_path)?;
    log.session_info
        .duration
        .ok_or_else(|| Error::MalformedInput("session_info.duration missing".to_string()).into())
}

fn build_generator(config: &Config) -> WorkflowGenerator<GeminiClient> {
    let model = GeminiClient::new(&config.generation.model);
    let validator = Validator::new(config.validation.clone());
    let generator_config = GeneratorConfig {
        fps: config.sampling.fps,
        max_retries: config.generation.max_retries,
        options: GenerateOptions {
            fps: config.sampling.fps,
            temperature: config.generation.temperature,
            top_k: config.generation.top_k,
            top_p: config.generation.top_p,
            max_output_tokens: config.generation.max_output_tokens,
            timeout: std::time::Duration::from_secs(config.generation.api_timeout_secs),
        },
    };
    WorkflowGenerator::new(model, validator, generator_config)
}

fn default_output_path(video: &Path, name: Option<&str>, config: &Config) -> PathBuf {
    let stem = name
        .map(str::to_string)
        .or_else(|| {
            video
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "session".to_string());
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    config
        .paths
        .output_dir
        .join(format!("{}_workflow_{}.txt", stem, timestamp))
}

fn run_generate(
    video_path: &Path,
    log_path: &Path,
    output: Option<PathBuf>,
    name: Option<String>,
    config: &Config,
) -> anyhow::Result<()> {
    let duration = declared_duration(log_path)?;
    let video = VideoMetadata::probe(video_path, duration)?;
    let output_path = output.unwrap_or_else(|| default_output_path(video_path, name.as_deref(), config));

    let generator = build_generator(config);
    info!(
        "Generating workflow for {} ({}s at {} fps)",
        video_path.display(),
        duration,
        config.sampling.fps
    );

    let runtime = tokio::runtime::Runtime::new()?;
    match runtime.block_on(generator.generate(&video, log_path, &output_path)) {
        Ok(outcome) => {
            if outcome.malformed_records > 0 {
                warn!("{} malformed record(s) skipped", outcome.malformed_records);
            }
            println!("Workflow written to {}", outcome.output_path.display());
            println!(
                "  {} interaction(s), {} model attempt(s), {} warning(s)",
                outcome.total_interactions,
                outcome.attempts,
                outcome.warnings.len()
            );
            Ok(())
        }
        Err(Error::ValidationFailed {
            report,
            error_count,
        }) => {
            println!("Validation FAILED:");
            print!("{}", report);
            anyhow::bail!("validation failed with {} error(s)", error_count)
        }
        Err(e) => Err(e.into()),
    }
}

fn run_validate(
    video_path: &Path,
    log_path: &Path,
    duration: Option<f64>,
    config: &Config,
) -> anyhow::Result<()> {
    let duration = match duration {
        Some(d) => d,
        None => declared_duration(log_path)?,
    };
    let video = VideoMetadata::probe(video_path, duration)?;
    let generator = build_generator(config);

    let (session, report) = generator.validate_inputs(&video, log_path)?;
    println!(
        "Session: {} event(s) over {:.1}s ({} malformed record(s) skipped)",
        session.len(),
        session.duration,
        session.malformed_records
    );
    print!("{}", report);

    if report.is_valid() {
        println!("Validation PASSED");
        Ok(())
    } else {
        anyhow::bail!("validation failed with {} error(s)", report.error_count())
    }
}

fn run_list(detailed: bool, config: &Config) -> anyhow::Result<()> {
    let records_dir = &config.paths.records_dir;

    if !records_dir.exists() {
        println!("No recordings found in {}", records_dir.display());
        println!("Record a session, then place the video and its _interactions.json here.");
        return Ok(());
    }

    let pairs = cli::discover_sessions(records_dir)?;
    if pairs.is_empty() {
        println!("No recordings found in {}", records_dir.display());
        return Ok(());
    }

    println!("Recordings in {}:", records_dir.display());
    for pair in &pairs {
        let video_name = pair
            .video
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        if detailed {
            let size = std::fs::metadata(&pair.video).map(|m| m.len()).unwrap_or(0);
            let log_state = match &pair.log {
                Some(log) => format!("log: {}", log.file_name().unwrap_or_default().to_string_lossy()),
                None => "log: MISSING".to_string(),
            };
            println!("  {}  ({:.1} MB, {})", video_name, size as f64 / (1024.0 * 1024.0), log_state);
        } else {
            println!("  {}", video_name);
        }
    }
    Ok(())
}

fn run_init(force: bool, config: &Config) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    config.save(&config_path)?;
    println!("Created config at {}", config_path.display());
    println!("\nConfig content:\n{}", config.to_toml()?);

    std::fs::create_dir_all(&config.paths.records_dir)?;
    std::fs::create_dir_all(&config.paths.output_dir)?;

    println!("Created directories:");
    println!("  Records: {}", config.paths.records_dir.display());
    println!("  Output: {}", config.paths.output_dir.display());
    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", config.to_toml()?);
        }
    }
    Ok(())
}
