//! Batch Prover Configuration
//!
//! Handles loading configuration from:
//! 1. BP_CONFIG env var (explicit path)
//! 2. ./batch-prover.toml (current directory)
//! 3. ~/.batch-prover/config.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{env, fs};

/// Global config instance for convenience access
static GLOBAL_CONFIG: OnceLock<BatchProverConfig> = OnceLock::new();

const LOCAL_CONFIG_FILE: &str = "batch-prover.toml";
const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".batch-prover";

const DEFAULT_PROVING_KEY: &str = "./keys/proving.key";
const DEFAULT_VERIFYING_KEY: &str = "./keys/verifying.key";
const DEFAULT_WITNESS_OUT: &str = "./batch.witness";
const DEFAULT_PROOF: &str = "./batch.proof";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchProverConfig {
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub witness: WitnessConfig,
}

/// Groth16 key locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeysConfig {
    #[serde(default = "default_proving_key")]
    pub proving_key_path: String,
    #[serde(default = "default_verifying_key")]
    pub verifying_key_path: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            proving_key_path: DEFAULT_PROVING_KEY.into(),
            verifying_key_path: DEFAULT_VERIFYING_KEY.into(),
        }
    }
}

fn default_proving_key() -> String {
    DEFAULT_PROVING_KEY.into()
}
fn default_verifying_key() -> String {
    DEFAULT_VERIFYING_KEY.into()
}

/// Witness input and output locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WitnessConfig {
    /// Input document; no default, must come from config, env or the command line
    #[serde(default)]
    pub input_path: Option<String>,
    #[serde(default = "default_witness_out")]
    pub output_path: String,
    #[serde(default = "default_proof")]
    pub proof_path: String,
}

impl Default for WitnessConfig {
    fn default() -> Self {
        Self {
            input_path: None,
            output_path: DEFAULT_WITNESS_OUT.into(),
            proof_path: DEFAULT_PROOF.into(),
        }
    }
}

fn default_witness_out() -> String {
    DEFAULT_WITNESS_OUT.into()
}
fn default_proof() -> String {
    DEFAULT_PROOF.into()
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Set Option<String> from env var if present
fn env_option_string(key: &str, field: &mut Option<String>) {
    if let Ok(v) = env::var(key) {
        *field = Some(v);
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl BatchProverConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check BP_CONFIG env var
        if let Ok(path) = env::var("BP_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            log::warn!("BP_CONFIG points to missing file: {}", path.display());
        }

        // 2. Check ./batch-prover.toml (current directory)
        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.batch-prover/config.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        env_string("BP_PROVING_KEY", &mut self.keys.proving_key_path);
        env_string("BP_VERIFYING_KEY", &mut self.keys.verifying_key_path);

        env_option_string("BP_INPUT", &mut self.witness.input_path);
        env_string("BP_WITNESS_OUT", &mut self.witness.output_path);
        env_string("BP_PROOF", &mut self.witness.proof_path);
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.witness.input_path = Some("./batch.json".into());
        toml::to_string_pretty(&sample).unwrap_or_default()
    }

    /// Get the global config instance, initializing it if necessary.
    ///
    /// Falls back to defaults if loading fails.
    pub fn global() -> &'static BatchProverConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                log::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            })
        })
    }
}
