//! Configuration loading and the responder factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use fashionbench_core::engine::EngineConfig;
use fashionbench_core::scorer::ScoringConfig;
use fashionbench_core::traits::Responder;

use crate::anthropic::AnthropicResponder;
use crate::ollama::OllamaResponder;
use crate::openai::OpenAiResponder;
use crate::simulated::SimulatedResponder;

/// Name of the built-in offline responder.
pub const SIMULATED: &str = "simulated";

/// Configuration for a single live provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Anthropic {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Anthropic {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Anthropic")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Ollama { base_url } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

/// Top-level fashionbench configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FashionbenchConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used when a model spec names none.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Model evaluated when `--model` is not given.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Default temperature (0.0 for deterministic evals).
    #[serde(default)]
    pub default_temperature: f64,
    /// Max retries on transient responder errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max concurrent responder calls.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory holding `<task>.jsonl` datasets.
    #[serde(default = "default_datasets_dir")]
    pub datasets_dir: PathBuf,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

fn default_provider() -> String {
    SIMULATED.to_string()
}
fn default_model() -> String {
    SIMULATED.to_string()
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./fashionbench-results")
}
fn default_datasets_dir() -> PathBuf {
    PathBuf::from("./datasets")
}

impl Default for FashionbenchConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: 0.0,
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            datasets_dir: default_datasets_dir(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl FashionbenchConfig {
    /// Engine settings for evaluating `model`.
    pub fn engine_config(&self, model: &str) -> EngineConfig {
        EngineConfig {
            model: model.to_string(),
            parallelism: self.parallelism,
            temperature: self.default_temperature,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            scoring: self.scoring.clone(),
            ..EngineConfig::default()
        }
    }
}

/// Which responder and model to evaluate, parsed from `provider/model`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    /// Provider name (e.g. "anthropic").
    pub provider: String,
    /// Model identifier (e.g. "claude-sonnet-4-20250514").
    pub model: String,
}

impl ModelSpec {
    /// Parse `provider/model`, or a bare model using `default_provider`.
    /// A bare `simulated` always selects the offline responder.
    pub fn parse(spec: &str, default_provider: &str) -> Self {
        let spec = spec.trim();
        match spec.split_once('/') {
            Some((provider, model)) => Self {
                provider: provider.to_string(),
                model: model.to_string(),
            },
            None if spec == SIMULATED => Self {
                provider: SIMULATED.to_string(),
                model: SIMULATED.to_string(),
            },
            None => Self {
                provider: default_provider.to_string(),
                model: spec.to_string(),
            },
        }
    }
}

impl std::fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.provider == SIMULATED && self.model == SIMULATED {
            f.write_str(SIMULATED)
        } else {
            write!(f, "{}/{}", self.provider, self.model)
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
        ProviderConfig::Anthropic { api_key, base_url } => ProviderConfig::Anthropic {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::Ollama { base_url } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `fashionbench.toml` in the current directory
/// 2. `~/.config/fashionbench/config.toml`
///
/// Environment variable overrides: `FASHIONBENCH_OPENAI_KEY`, `FASHIONBENCH_ANTHROPIC_KEY`.
pub fn load_config() -> Result<FashionbenchConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<FashionbenchConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("fashionbench.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => FashionbenchConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("FASHIONBENCH_ANTHROPIC_KEY") {
        let entry = config
            .providers
            .entry("anthropic".into())
            .or_insert(ProviderConfig::Anthropic {
                api_key: String::new(),
                base_url: None,
            });
        if let ProviderConfig::Anthropic { api_key, .. } = entry {
            *api_key = key;
        }
    }

    if let Ok(key) = std::env::var("FASHIONBENCH_OPENAI_KEY") {
        let entry = config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let ProviderConfig::OpenAI { api_key, .. } = entry {
            *api_key = key;
        }
    }

    // Resolve env vars in all provider configs
    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

/// Parse and validate a config file's contents.
pub fn parse_config_str(content: &str) -> Result<FashionbenchConfig> {
    let config: FashionbenchConfig = toml::from_str(content)?;
    anyhow::ensure!(config.parallelism >= 1, "parallelism must be at least 1");
    config.scoring.validate()?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("fashionbench"))
}

/// Create a live responder from its provider configuration.
pub fn create_responder(config: &ProviderConfig) -> Result<Box<dyn Responder>> {
    match config {
        ProviderConfig::Anthropic { api_key, base_url } => {
            Ok(Box::new(AnthropicResponder::new(api_key, base_url.clone())))
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Ok(Box::new(OpenAiResponder::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
        ))),
        ProviderConfig::Ollama { base_url } => Ok(Box::new(OllamaResponder::new(base_url))),
    }
}

/// The responder a model spec refers to.
pub fn resolve_responder(
    config: &FashionbenchConfig,
    spec: &ModelSpec,
) -> Result<Arc<dyn Responder>> {
    if spec.provider == SIMULATED {
        return Ok(Arc::new(SimulatedResponder::new()));
    }
    let provider = config.providers.get(&spec.provider).with_context(|| {
        let mut available: Vec<&String> = config.providers.keys().collect();
        available.sort();
        format!(
            "provider '{}' not found in config. Available: {:?}",
            spec.provider, available
        )
    })?;
    Ok(Arc::from(create_responder(provider)?))
}
