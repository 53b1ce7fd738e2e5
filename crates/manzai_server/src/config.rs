//! Service configuration.
//!
//! Sources are layered, later ones overriding earlier ones:
//! 1. Bundled defaults (`manzai.toml` at the workspace root)
//! 2. `~/.config/manzai/manzai.toml`
//! 3. `./manzai.toml`, or the file passed with `--config`
//! 4. `MANZAI_<SECTION>__<KEY>` environment variables
//!
//! The API key may also come from `OPENAI_API_KEY`.

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use manzai_core::{CountingPolicy, LengthPolicy, LengthRules, MeteringPolicy, OutOfRange};
use manzai_error::{ConfigError, ManzaiResult};
use manzai_models::ModelConfig;
use manzai_prompt::{FallbackSizes, PromptSettings, TechniqueCatalog};
use manzai_script::{
    DEFAULT_DEFICIT_THRESHOLD, DEFAULT_SOFT_CUT_RATIO, EnforcerConfig, ScriptShaper,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../manzai.toml");

/// Fallback environment variable for the provider key.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Listener and logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to listen on
    pub bind: String,
    /// Hide provider error bodies from clients
    pub production: bool,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines
    pub json_logs: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            production: false,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Provider name; `local` needs no key
    pub provider: String,
    /// API root including the version segment
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Bound on each generation call
    pub timeout_secs: u64,
    /// Completion tokens per character of the maximum length
    pub max_tokens_per_char: f32,
    /// Completion tokens added for title and formatting
    pub max_tokens_overhead: u32,
    /// Upper bound on completion tokens
    pub max_tokens_cap: u32,
    /// Bearer token
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let client = ModelConfig::default();
        Self {
            provider: client.provider,
            base_url: client.base_url,
            model: client.model,
            temperature: client.temperature,
            timeout_secs: client.timeout_secs,
            max_tokens_per_char: 2.0,
            max_tokens_overhead: 256,
            max_tokens_cap: 4096,
            api_key: None,
        }
    }
}

impl ModelSettings {
    /// Connection settings for the generation client.
    pub fn client_config(&self) -> ModelConfig {
        ModelConfig {
            provider: self.provider.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
            api_key: self.api_key.clone(),
        }
    }
}

/// Which length interpretation applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPolicyKind {
    /// `target ± band_percent`
    #[default]
    StrictBand,
    /// `[1, target]`
    Ceiling,
}

/// Length contract settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LengthSettings {
    /// Band or ceiling
    pub policy: LengthPolicyKind,
    /// Half-width of the strict band, in percent
    pub band_percent: u32,
    /// Longest script ever produced
    pub hard_ceiling: u32,
    /// Target when the caller sends nothing usable
    pub default_target: u32,
    /// Clamp or reject lengths above the ceiling
    pub out_of_range: OutOfRange,
    /// Share of the maximum a soft cut must keep
    pub soft_cut_ratio: f64,
    /// Minimum deficit that earns a continuation call
    pub deficit_threshold: u32,
    /// Counting unit and newline handling
    pub counting: CountingPolicy,
}

impl Default for LengthSettings {
    fn default() -> Self {
        let rules = LengthRules::default();
        Self {
            policy: LengthPolicyKind::StrictBand,
            band_percent: 10,
            hard_ceiling: rules.ceiling,
            default_target: rules.default_target,
            out_of_range: rules.out_of_range,
            soft_cut_ratio: DEFAULT_SOFT_CUT_RATIO,
            deficit_threshold: DEFAULT_DEFICIT_THRESHOLD,
            counting: CountingPolicy::default(),
        }
    }
}

impl LengthSettings {
    /// Interval policy.
    pub fn length_policy(&self) -> LengthPolicy {
        match self.policy {
            LengthPolicyKind::StrictBand => LengthPolicy::StrictBand {
                percent: self.band_percent,
            },
            LengthPolicyKind::Ceiling => LengthPolicy::Ceiling,
        }
    }

    /// Rules for resolving the caller's length.
    pub fn rules(&self) -> LengthRules {
        LengthRules {
            default_target: self.default_target,
            ceiling: self.hard_ceiling,
            out_of_range: self.out_of_range,
        }
    }

    /// Truncation tuning.
    pub fn enforcer(&self) -> EnforcerConfig {
        EnforcerConfig {
            soft_cut_ratio: self.soft_cut_ratio,
        }
    }
}

/// Whether requests are metered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeteringKind {
    /// Free quota, then paid credits
    #[default]
    Metered,
    /// No bookkeeping
    Unmetered,
}

/// Where usage records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Process memory; lost on restart
    Memory,
    /// One JSON document per user
    #[default]
    Filesystem,
}

/// Usage metering settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MeteringSettings {
    /// Metered or unmetered
    pub policy: MeteringKind,
    /// Free generations per user
    pub free_quota: u32,
    /// Backing store
    pub store: StoreKind,
    /// Base directory of the filesystem store
    pub store_path: PathBuf,
}

impl Default for MeteringSettings {
    fn default() -> Self {
        Self {
            policy: MeteringKind::Metered,
            free_quota: 20,
            store: StoreKind::Filesystem,
            store_path: PathBuf::from("data/usage"),
        }
    }
}

impl MeteringSettings {
    /// Ledger policy.
    pub fn metering_policy(&self) -> MeteringPolicy {
        match self.policy {
            MeteringKind::Metered => MeteringPolicy::Metered {
                free_quota: self.free_quota,
            },
            MeteringKind::Unmetered => MeteringPolicy::Unmetered,
        }
    }
}

/// Technique catalog settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TechniqueSettings {
    /// Boke techniques drawn when the caller picks none
    pub fallback_boke: usize,
    /// Tsukkomi techniques drawn when the caller picks none
    pub fallback_tsukkomi: usize,
    /// Structural techniques drawn when the caller picks none
    pub fallback_general: usize,
    /// Replacement catalog; the bundled one is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
}

impl Default for TechniqueSettings {
    fn default() -> Self {
        let sizes = FallbackSizes::default();
        Self {
            fallback_boke: sizes.boke,
            fallback_tsukkomi: sizes.tsukkomi,
            fallback_general: sizes.general,
            catalog_path: None,
        }
    }
}

impl TechniqueSettings {
    /// Random fallback sizes.
    pub fn fallback(&self) -> FallbackSizes {
        FallbackSizes {
            boke: self.fallback_boke,
            tsukkomi: self.fallback_tsukkomi,
            general: self.fallback_general,
        }
    }

    /// Load the configured catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog file cannot be read or parsed.
    pub fn catalog(&self) -> Result<TechniqueCatalog, ConfigError> {
        match &self.catalog_path {
            Some(path) => {
                let source = std::fs::read_to_string(path).map_err(|e| {
                    ConfigError::new(format!(
                        "Failed to read technique catalog {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                TechniqueCatalog::from_toml_str(&source)
            }
            None => TechniqueCatalog::bundled(),
        }
    }
}

/// Complete service configuration.
///
/// # Examples
///
/// ```
/// use manzai_server::ManzaiConfig;
///
/// let config = ManzaiConfig::default();
/// assert_eq!(config.length.hard_ceiling, 2000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ManzaiConfig {
    /// Listener and logging
    pub server: ServerSettings,
    /// Generation backend
    pub model: ModelSettings,
    /// Length contract
    pub length: LengthSettings,
    /// Usage metering
    pub metering: MeteringSettings,
    /// Technique catalog
    pub techniques: TechniqueSettings,
}

impl ManzaiConfig {
    /// Load every configuration layer.
    ///
    /// `path` replaces `./manzai.toml` and must exist when given.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result is invalid.
    #[instrument(skip_all)]
    pub fn load(path: Option<&Path>) -> ManzaiResult<Self> {
        debug!("Loading configuration: environment > local file > home dir > bundled defaults");

        let mut builder = Self::defaults();

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/manzai/manzai.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = match path {
            Some(path) => builder.add_source(File::from(path.to_path_buf()).required(true)),
            None => builder.add_source(File::with_name("manzai").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("MANZAI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config = Self::finish(builder)?;
        if config.model.api_key.as_deref().is_none_or(str::is_empty) {
            config.model.api_key = std::env::var(OPENAI_API_KEY_VAR)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
        config.validate()?;
        Ok(config)
    }

    /// Bundled defaults overridden by a single file. No other layer applies.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the result is invalid.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> ManzaiResult<Self> {
        debug!("Loading configuration from file");
        let builder = Self::defaults().add_source(File::from(path.as_ref()).required(true));
        let config = Self::finish(builder)?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        let length = &self.length;
        if length.hard_ceiling == 0 {
            return Err(ConfigError::new("length.hard_ceiling must be positive"));
        }
        if length.default_target == 0 || length.default_target > length.hard_ceiling {
            return Err(ConfigError::new(format!(
                "length.default_target must be within [1, {}]",
                length.hard_ceiling
            )));
        }
        if length.band_percent > 100 {
            return Err(ConfigError::new("length.band_percent must not exceed 100"));
        }
        if !length.soft_cut_ratio.is_finite() {
            return Err(ConfigError::new("length.soft_cut_ratio must be a number"));
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::new("model.timeout_secs must be positive"));
        }
        if self.model.max_tokens_cap == 0 {
            return Err(ConfigError::new("model.max_tokens_cap must be positive"));
        }
        if !(self.model.max_tokens_per_char.is_finite() && self.model.max_tokens_per_char > 0.0) {
            return Err(ConfigError::new("model.max_tokens_per_char must be positive"));
        }
        if self.model.base_url.trim().is_empty() {
            return Err(ConfigError::new("model.base_url must not be empty"));
        }
        Ok(())
    }

    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns an error if `server.bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.bind.parse().map_err(|e| {
            ConfigError::new(format!("Invalid server.bind '{}': {}", self.server.bind, e))
        })
    }

    /// Prompt assembly knobs.
    pub fn prompt_settings(&self) -> PromptSettings {
        PromptSettings {
            length_policy: self.length.length_policy(),
            ceiling: self.length.hard_ceiling,
            max_tokens_per_char: self.model.max_tokens_per_char,
            max_tokens_overhead: self.model.max_tokens_overhead,
            max_tokens_cap: self.model.max_tokens_cap,
            fallback: self.techniques.fallback(),
        }
    }

    /// Text shaping stages sharing the configured counting policy.
    pub fn shaper(&self) -> ScriptShaper {
        ScriptShaper::new(
            self.length.counting,
            self.length.enforcer(),
            self.length.deficit_threshold,
        )
    }
}
