//! Config file handling
//!
//! ```toml
//! [defaults]
//! schemes = ["digest", "basic"]
//! max_redirects = 10
//! timeout = 30.0
//! user_agent = "authpulse"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::manager::DEFAULT_MAX_REDIRECTS;
use crate::auth::{AuthScheme, SchemeRegistry};
use crate::client::USER_AGENT_STRING;
use crate::errors::{AuthError, Result};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "AUTHPULSE_CONFIG_DIR";

/// authpulse configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub config_dir: PathBuf,
    /// Scheme names in order of preference
    pub schemes: Vec<String>,
    pub max_redirects: u32,
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: Self::default_config_dir(),
            schemes: vec!["digest".to_string(), "basic".to_string()],
            max_redirects: DEFAULT_MAX_REDIRECTS,
            timeout: None,
            user_agent: USER_AGENT_STRING.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `config.toml` in the config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_config_dir())
    }

    /// Load configuration from `config.toml` in `config_dir`. A missing
    /// file yields the defaults.
    pub fn load_from(config_dir: &Path) -> Result<Self> {
        let config_file = config_dir.join("config.toml");
        if !config_file.exists() {
            return Ok(Self {
                config_dir: config_dir.to_path_buf(),
                ..Self::default()
            });
        }

        let content = std::fs::read_to_string(&config_file)
            .map_err(|e| AuthError::Config(format!("Failed to read config: {}", e)))?;
        let mut config = Self::parse(&content)?;
        config.config_dir = config_dir.to_path_buf();
        Ok(config)
    }

    /// Parse config file contents
    pub fn parse(content: &str) -> Result<Self> {
        let toml_value: toml::Value = toml::from_str(content)
            .map_err(|e| AuthError::Config(format!("Invalid config TOML: {}", e)))?;
        let defaults = toml_value.get("defaults");
        let mut config = Self::default();

        if let Some(schemes) = defaults.and_then(|d| d.get("schemes")) {
            let arr = schemes
                .as_array()
                .ok_or_else(|| AuthError::Config("defaults.schemes must be an array".to_string()))?;
            config.schemes = arr
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(String::from)
                        .ok_or_else(|| AuthError::Config("defaults.schemes entries must be strings".to_string()))
                })
                .collect::<Result<Vec<_>>>()?;
            // Fail early rather than on first use
            config.build_schemes()?;
        }

        if let Some(value) = defaults.and_then(|d| d.get("max_redirects")) {
            config.max_redirects = value
                .as_integer()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| AuthError::Config("defaults.max_redirects must be a non-negative integer".to_string()))?;
        }

        if let Some(value) = defaults.and_then(|d| d.get("timeout")) {
            let secs = value
                .as_float()
                .or_else(|| value.as_integer().map(|n| n as f64))
                .filter(|s| s.is_finite() && *s > 0.0)
                .ok_or_else(|| AuthError::Config("defaults.timeout must be a positive number".to_string()))?;
            config.timeout = Some(Duration::from_secs_f64(secs));
        }

        if let Some(ua) = defaults
            .and_then(|d| d.get("user_agent"))
            .and_then(|v| v.as_str())
        {
            config.user_agent = ua.to_string();
        }

        Ok(config)
    }

    /// Instantiate the configured schemes in preference order
    pub fn build_schemes(&self) -> Result<Vec<Arc<dyn AuthScheme>>> {
        resolve_schemes(&self.schemes)
    }

    /// Get the default config directory
    pub fn default_config_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return PathBuf::from(dir);
        }
        dirs::config_dir()
            .map(|p| p.join("authpulse"))
            .unwrap_or_else(|| PathBuf::from(".authpulse"))
    }
}

/// Look up built-in schemes by (case-insensitive) name
pub fn resolve_schemes<S: AsRef<str>>(names: &[S]) -> Result<Vec<Arc<dyn AuthScheme>>> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            SchemeRegistry::builtin(name)
                .ok_or_else(|| AuthError::Config(format!("Unknown auth scheme: {}", name)))
        })
        .collect()
}
