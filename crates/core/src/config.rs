//! Configuration management for the FSC Q&A service.
//!
//! Configuration is merged from, in increasing precedence:
//! - Built-in defaults
//! - The YAML config file (`config/gemini_config.yaml` under the root)
//! - Environment variables
//! - Command-line flags
//!
//! Every relative path (config file, store metadata) is resolved against the
//! package root, so the binary behaves the same regardless of the directory
//! it is launched from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default config file location, relative to the root.
pub const DEFAULT_CONFIG_FILE: &str = "config/gemini_config.yaml";

/// Default store metadata location, relative to the root.
pub const DEFAULT_STORE_INFO: &str = "data/gemini_corpus/store_info.json";

/// Default base URL of the Generative Language API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Package root; relative paths are resolved against it
    pub root: PathBuf,

    /// Explicit config file path (None means the default location)
    pub config_file: Option<PathBuf>,

    /// Whether a config file was found and merged. Set by `load_from`;
    /// reported by the caller once logging is up.
    #[serde(skip)]
    pub config_loaded: bool,

    /// Model parameters sent with every query
    pub generation: GenerationConfig,

    /// Per-token prices used for the cost heuristic
    pub pricing: PricingConfig,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Base URL of the external API
    pub endpoint: String,

    /// Store metadata file (as written in config; see `store_info_path`)
    pub store_info: PathBuf,

    /// Optional deadline for a single external call
    pub request_timeout_secs: Option<u64>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Model parameters for the grounded generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub system_instruction: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.1,
            max_output_tokens: 2000,
            system_instruction: None,
        }
    }
}

/// Prices in USD per one million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_input_price")]
    pub input_price: f64,
    #[serde(default = "default_output_price")]
    pub output_price: f64,
}

fn default_input_price() -> f64 {
    0.075
}

fn default_output_price() -> f64 {
    0.30
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_price: default_input_price(),
            output_price: default_output_price(),
        }
    }
}

/// On-disk YAML layout. Every key is optional; absent keys keep defaults.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    model: Option<String>,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
    system_instruction: Option<String>,
    /// Older layout nested the sampling parameters under `generation`
    generation: Option<GenerationSection>,
    api_key_env: Option<String>,
    endpoint: Option<String>,
    store_info: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
    pricing: Option<PricingConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GenerationSection {
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
    system_instruction: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

/// API credential. Never printed, never serialized.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the raw key for placing it in a request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            config_loaded: false,
            generation: GenerationConfig::default(),
            pricing: PricingConfig::default(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            store_info: PathBuf::from(DEFAULT_STORE_INFO),
            request_timeout_secs: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration using `FSC_ROOT` / `FSC_CONFIG` from the environment.
    ///
    /// # Example
    /// ```no_run
    /// use fsc_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Root: {:?}", config.root);
    /// ```
    pub fn load() -> AppResult<Self> {
        let root = std::env::var("FSC_ROOT").ok().map(PathBuf::from);
        let config_file = std::env::var("FSC_CONFIG").ok().map(PathBuf::from);
        Self::load_from(root, config_file)
    }

    /// Load configuration for an explicit root and config file.
    ///
    /// A missing file at the default location is tolerated (defaults apply,
    /// and `config_loaded` stays false); a missing file that was explicitly
    /// requested is a configuration error.
    ///
    /// # Arguments
    /// * `root` - Package root; `None` means the current directory
    /// * `config_file` - Config file, relative to the root unless absolute
    ///
    /// # Returns
    /// The merged configuration, before CLI overrides.
    pub fn load_from(root: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(root) = root {
            config.root = root;
        }

        if !config.root.is_dir() {
            return Err(AppError::Config(format!(
                "Root directory does not exist: {:?}",
                config.root
            )));
        }

        let explicit = config_file.is_some();
        config.config_file = config_file;
        let config_path = config.config_path();

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
            config.config_loaded = true;
        } else if explicit {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(model) = std::env::var("FSC_MODEL") {
            config.generation.model = model;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        // An empty file is valid YAML for "all defaults"
        let file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(&contents).map_err(|e| {
                AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };

        if let Some(section) = file.generation {
            if let Some(t) = section.temperature {
                self.generation.temperature = t;
            }
            if let Some(n) = section.max_output_tokens {
                self.generation.max_output_tokens = n;
            }
            if section.system_instruction.is_some() {
                self.generation.system_instruction = section.system_instruction;
            }
        }

        if let Some(model) = file.model {
            self.generation.model = model;
        }
        if let Some(t) = file.temperature {
            self.generation.temperature = t;
        }
        if let Some(n) = file.max_output_tokens {
            self.generation.max_output_tokens = n;
        }
        if file.system_instruction.is_some() {
            self.generation.system_instruction = file.system_instruction;
        }

        if let Some(env) = file.api_key_env {
            self.api_key_env = env;
        }
        if let Some(endpoint) = file.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(store_info) = file.store_info {
            self.store_info = store_info;
        }
        if file.request_timeout_secs.is_some() {
            self.request_timeout_secs = file.request_timeout_secs;
        }
        if let Some(pricing) = file.pricing {
            self.pricing = pricing;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over both the YAML file and the environment.
    pub fn with_overrides(
        mut self,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(model) = model {
            self.generation.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve a path against the root unless it is already absolute.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Effective config file path.
    pub fn config_path(&self) -> PathBuf {
        match self.config_file {
            Some(ref cf) => self.resolve_path(cf),
            None => self.root.join(DEFAULT_CONFIG_FILE),
        }
    }

    /// Effective store metadata path.
    pub fn store_info_path(&self) -> PathBuf {
        self.resolve_path(&self.store_info)
    }

    /// Read the API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> AppResult<ApiKey> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(ApiKey::new(key.trim())),
            _ => Err(AppError::Config(format!(
                "API key not set. Set the environment variable {} (or add it to .env)",
                self.api_key_env
            ))),
        }
    }

    /// Validate value ranges.
    pub fn validate(&self) -> AppResult<()> {
        if self.generation.model.trim().is_empty() {
            return Err(AppError::Config("Model name must not be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(AppError::Config(format!(
                "temperature must be within 0.0-2.0, got {}",
                self.generation.temperature
            )));
        }

        if self.generation.max_output_tokens == 0 {
            return Err(AppError::Config(
                "max_output_tokens must be greater than zero".to_string(),
            ));
        }

        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "endpoint must be an http(s) URL, got {}",
                self.endpoint
            )));
        }

        if self.pricing.input_price < 0.0 || self.pricing.output_price < 0.0 {
            return Err(AppError::Config("pricing must not be negative".to_string()));
        }

        Ok(())
    }
}
