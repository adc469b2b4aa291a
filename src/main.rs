//! dockergen - Generate a best-practice Dockerfile with an LLM.
//!
//! Asks either the Gemini API or a local Ollama daemon for an ideal Dockerfile
//! for a programming language, prints it, and optionally saves it.

mod config;
mod error;
mod llm;
mod persist;
mod prompt;
mod responder;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{BackendConfig, BackendKind, Config, Overrides};
use error::Error;
use llm::Respond;
use responder::PromptResponder;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::{Command as ProcessCommand, ExitCode};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dockergen")]
#[command(author, version, about = "Generate a best-practice Dockerfile with an LLM")]
#[command(long_about = "Asks a cloud (Gemini) or local (Ollama) model for an ideal Dockerfile.\n\nThe Dockerfile is printed to stdout; prompts and status go to stderr.")]
struct Cli {
    /// Programming language to target (prompted for when omitted)
    #[arg(value_name = "LANGUAGE")]
    language: Option<String>,

    /// Backend to use (overrides config)
    #[arg(short = 'b', long, value_enum, global = true)]
    backend: Option<BackendKind>,

    /// Override model
    #[arg(short = 'm', long, value_name = "MODEL", global = true)]
    model: Option<String>,

    /// Ollama host URL
    #[arg(long, value_name = "URL", global = true)]
    host: Option<String>,

    /// Where to save the Dockerfile
    #[arg(short = 'o', long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Save without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Use this config file instead of ~/.config/dockergen/config.toml
    #[arg(short = 'c', long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the configured backend is reachable
    Check,
    /// List models available on the local Ollama daemon
    Models,
    /// Open configuration file in $EDITOR
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Some(Commands::Check) => handle_check(&cli).await,
        Some(Commands::Models) => handle_models(&cli).await,
        Some(Commands::Config) => handle_config(&cli),
        None => return run_generator(&cli).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_directives = if verbose {
        "dockergen=debug,reqwest=warn"
    } else {
        "dockergen=warn,reqwest=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Load the config file and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply(Overrides {
        backend: cli.backend,
        model: cli.model.clone(),
        host: cli.host.clone(),
        output: cli.output.clone(),
    });
    Ok(config)
}

/// Run the interactive generator and always finish with the exiting message.
async fn run_generator(cli: &Cli) -> ExitCode {
    let code = match generate(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if matches!(e.downcast_ref::<Error>(), Some(Error::Backend(_))) {
                eprintln!("\nFailed to generate Dockerfile due to an error.");
            }
            ExitCode::FAILURE
        }
    };
    eprintln!("\nExiting Dockerfile generator.");
    code
}

async fn generate(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let backend = llm::create_backend(&config.backend)?;
    info!(
        "Using backend: {} (model: {})",
        backend.name(),
        backend.model()
    );

    let language = match &cli.language {
        Some(language) => language.clone(),
        None => read_line("Enter the programming language: ")?,
    };
    let language = language.trim();
    if language.is_empty() {
        return Err(Error::EmptyLanguage.into());
    }

    eprintln!(
        "\nGenerating Dockerfile for {} using model '{}'...",
        language,
        backend.model()
    );
    let responder = PromptResponder::new(backend, &config.generation);
    let content = responder.generate(language).await?;

    eprintln!("\nGenerated Dockerfile:\n");
    println!("{}", content);
    io::stdout().flush()?;

    let save = cli.yes || is_yes(&read_line("\nDo you want to save this Dockerfile? (y/N): ")?);
    if !save {
        eprintln!("Dockerfile not saved.");
        return Ok(());
    }

    let output = &config.generation.output;
    match persist::save(&content, output) {
        Ok(()) => eprintln!("\nDockerfile saved to '{}'", output.display()),
        // The Dockerfile is already on stdout; report and carry on.
        Err(e) => eprintln!("{}", e),
    }
    Ok(())
}

/// Print `prompt` to stderr and read one line from stdin. EOF yields an empty string.
fn read_line(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Only `y` (any case) confirms.
fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Handle the check subcommand.
async fn handle_check(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let backend = llm::create_backend(&config.backend)?;

    backend
        .health_check()
        .await
        .with_context(|| format!("{} backend is not reachable", backend.name()))?;

    println!("Backend: {}", backend.name());
    println!("Model: {}", backend.model());
    println!("Status: reachable");
    Ok(())
}

/// Handle the models subcommand (Ollama only).
async fn handle_models(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    // Use the default Ollama host even if Ollama is not the active backend
    let (model, host) = match config.backend {
        BackendConfig::Ollama { model, host } => (model, host),
        BackendConfig::Gemini { .. } => (
            config::default_ollama_model(),
            config::default_ollama_host(),
        ),
    };

    let backend = llm::ollama::OllamaBackend::new(model, host)?;
    let models = backend
        .list_models()
        .await
        .context("Failed to list models. Is Ollama running?")?;

    println!("Available Models");
    println!("================\n");

    if models.is_empty() {
        println!("No models installed.");
        println!("\nPull a model with: ollama pull {}", backend.model());
        return Ok(());
    }

    for model in models {
        let size = model.size.map(format_size).unwrap_or_else(|| "?".to_string());
        let modified = model
            .modified_at
            .as_deref()
            .map(|s| s.split('T').next().unwrap_or(s))
            .unwrap_or("?");
        let marker = if model.name == backend.model() { " (configured)" } else { "" };
        println!("  {}{} ({}) - {}", model.name, marker, size, modified);
    }

    Ok(())
}

/// Format bytes to human-readable size.
fn format_size(bytes: u64) -> String {
    const GB: u64 = 1024 * 1024 * 1024;
    const MB: u64 = 1024 * 1024;

    if bytes >= GB {
        format!("{:.1}GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.0}MB", bytes as f64 / MB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Handle the config command.
fn handle_config(cli: &Cli) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    // Create default config if it doesn't exist
    if !config_path.exists() {
        Config::default().save(&config_path)?;
        println!("Created default config at {}", config_path.display());
    }

    // Open in editor
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = ProcessCommand::new(&editor)
        .arg(&config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        eprintln!("Editor exited with non-zero status");
    }

    Ok(())
}
