//! Configuration management for dockergen.
//!
//! Configuration is loaded from `~/.config/dockergen/config.toml` unless a
//! path is given on the command line. A missing file means defaults.

use crate::error::Error;
use crate::prompt::{self, PROMPT_TEMPLATE};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GOOGLE_AI_STUDIO_API_KEY";

/// Environment variable pointing at the Ollama daemon.
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Prompt and output settings.
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Backend configuration for LLM providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Ollama local backend.
    Ollama {
        /// Model name (default: llama3.2:1b).
        #[serde(default = "default_ollama_model")]
        model: String,
        /// Ollama host URL (default: $OLLAMA_HOST or http://localhost:11434).
        #[serde(default = "default_ollama_host")]
        host: String,
    },
    /// Google Gemini API.
    Gemini {
        /// Model name (default: gemini-2.0-flash).
        #[serde(default = "default_gemini_model")]
        model: String,
        /// API key (prefer GOOGLE_AI_STUDIO_API_KEY env var).
        #[serde(default)]
        api_key: Option<String>,
        /// Base URL of the Generative Language API.
        #[serde(default = "default_gemini_api_url")]
        api_url: String,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::for_kind(BackendKind::Ollama)
    }
}

/// Backend selector used on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Google Gemini (cloud).
    Gemini,
    /// Ollama (local).
    Ollama,
}

impl BackendConfig {
    /// Default configuration for a backend kind.
    pub fn for_kind(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Ollama => BackendConfig::Ollama {
                model: default_ollama_model(),
                host: default_ollama_host(),
            },
            BackendKind::Gemini => BackendConfig::Gemini {
                model: default_gemini_model(),
                api_key: None,
                api_url: default_gemini_api_url(),
            },
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            BackendConfig::Ollama { .. } => BackendKind::Ollama,
            BackendConfig::Gemini { .. } => BackendKind::Gemini,
        }
    }
}

pub(crate) fn default_ollama_model() -> String {
    "llama3.2:1b".to_string()
}

pub(crate) fn default_ollama_host() -> String {
    std::env::var(OLLAMA_HOST_ENV)
        .ok()
        .filter(|h| !h.trim().is_empty())
        .map(|h| normalize_host(&h))
        .unwrap_or_else(|| "http://localhost:11434".to_string())
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

/// Add a scheme to bare `host:port` values and drop trailing slashes.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

/// Pick the configured key, falling back to the environment. Blank keys count as missing.
pub fn resolve_api_key(configured: Option<&str>, from_env: Option<String>) -> Result<String, Error> {
    configured
        .map(str::to_string)
        .filter(|k| !k.trim().is_empty())
        .or_else(|| from_env.filter(|k| !k.trim().is_empty()))
        .ok_or_else(|| {
            Error::Configuration(format!(
                "{} environment variable not set.",
                GEMINI_API_KEY_ENV
            ))
        })
}

/// Prompt and output settings handed to the responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Prompt template containing a `{language}` placeholder.
    #[serde(default = "default_template")]
    pub template: String,
    /// Where the Dockerfile is saved.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            output: default_output(),
        }
    }
}

fn default_template() -> String {
    PROMPT_TEMPLATE.to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("Dockerfile")
}

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<BackendKind>,
    pub model: Option<String>,
    pub host: Option<String>,
    pub output: Option<PathBuf>,
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("dockergen"))
            .context("Could not determine config directory")
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from `path` (or the default location), using defaults if not found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        let config: Config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };
        prompt::validate_template(&config.generation.template)?;
        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply command-line overrides.
    ///
    /// Switching backend kind starts from that kind's defaults; `host` only
    /// applies to Ollama.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(kind) = overrides.backend {
            if kind != self.backend.kind() {
                self.backend = BackendConfig::for_kind(kind);
            }
        }
        if let Some(new_model) = overrides.model {
            match &mut self.backend {
                BackendConfig::Ollama { model, .. } | BackendConfig::Gemini { model, .. } => {
                    *model = new_model;
                }
            }
        }
        if let Some(new_host) = overrides.host {
            match &mut self.backend {
                BackendConfig::Ollama { host, .. } => *host = normalize_host(&new_host),
                BackendConfig::Gemini { .. } => {
                    tracing::warn!("--host is ignored for the gemini backend");
                }
            }
        }
        if let Some(output) = overrides.output {
            self.generation.output = output;
        }
    }
}
