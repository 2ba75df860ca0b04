//! Backend configuration
//!
//! Loaded from a file (TOML, JSON, YAML) or from `SV_SIGNER_*` environment
//! variables. Missing fields fall back to [`PluginConfig::default`].

use crate::error::{Result, SignerError};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which reference backend to instantiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Signs on the caller thread inside `sign_hash`
    Software,
    /// Signs on a dedicated worker thread; results are polled
    Threaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub backend: BackendKind,

    /// Accepted requests whose signature has not been retrieved yet
    pub max_pending: usize,

    /// Largest buffer `allocate` hands out (bytes)
    pub max_allocation: usize,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Threaded,
            max_pending: 16,
            max_allocation: 64 * 1024,
        }
    }
}

/// Load backend configuration from a file
///
/// # Example
/// ```no_run
/// use signing_plugin::config::load_config;
///
/// let config = load_config("signer.toml").expect("Failed to load config");
/// println!("Backend: {:?}", config.backend);
/// ```
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<PluginConfig> {
    let config = Config::builder()
        .add_source(File::from(config_path.as_ref()))
        .build()
        .map_err(|e| SignerError::Config(format!("Failed to load config file: {}", e)))?;

    let plugin_config: PluginConfig = config
        .try_deserialize()
        .map_err(|e| SignerError::Config(format!("Failed to parse config: {}", e)))?;

    validate_config(&plugin_config)?;

    Ok(plugin_config)
}

/// Load configuration from environment variables
///
/// Prefix: `SV_SIGNER_`, e.g. `SV_SIGNER_BACKEND=software`,
/// `SV_SIGNER_MAX_PENDING=4`
pub fn load_config_from_env() -> Result<PluginConfig> {
    let config = Config::builder()
        .add_source(Environment::with_prefix("SV_SIGNER").try_parsing(true))
        .build()
        .map_err(|e| SignerError::Config(format!("Failed to load env vars: {}", e)))?;

    let plugin_config: PluginConfig = config
        .try_deserialize()
        .map_err(|e| SignerError::Config(format!("Failed to parse env config: {}", e)))?;

    validate_config(&plugin_config)?;

    Ok(plugin_config)
}

pub fn validate_config(config: &PluginConfig) -> Result<()> {
    if config.max_pending == 0 {
        return Err(SignerError::Config(
            "max_pending must be greater than 0".to_string(),
        ));
    }

    if config.max_allocation == 0 {
        return Err(SignerError::Config(
            "max_allocation must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Serializes tests that touch the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 3] = [
        "SV_SIGNER_BACKEND",
        "SV_SIGNER_MAX_PENDING",
        "SV_SIGNER_MAX_ALLOCATION",
    ];

    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
        for (name, value) in vars {
            std::env::set_var(name, value);
        }

        let result = f();

        for name in ENV_VARS {
            std::env::remove_var(name);
        }
        result
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&PluginConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_max_pending() {
        let config = PluginConfig {
            max_pending: 0,
            ..PluginConfig::default()
        };
        assert!(matches!(validate_config(&config), Err(SignerError::Config(_))));
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config("backend = \"software\"\nmax_pending = 4\n");

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.backend, BackendKind::Software);
        assert_eq!(config.max_pending, 4);
        assert_eq!(config.max_allocation, PluginConfig::default().max_allocation);
    }

    #[test]
    fn test_load_rejects_unknown_backend() {
        let file = write_config("backend = \"hsm\"\n");
        assert!(matches!(load_config(file.path()), Err(SignerError::Config(_))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let file = write_config("max_allocation = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_from_env() {
        let config = with_env(
            &[("SV_SIGNER_BACKEND", "software"), ("SV_SIGNER_MAX_PENDING", "4")],
            load_config_from_env,
        )
        .unwrap();

        assert_eq!(config.backend, BackendKind::Software);
        assert_eq!(config.max_pending, 4);
        assert_eq!(config.max_allocation, PluginConfig::default().max_allocation);
    }

    #[test]
    fn test_load_from_empty_env_uses_defaults() {
        let config = with_env(&[], load_config_from_env).unwrap();
        assert_eq!(config, PluginConfig::default());
    }

    #[test]
    fn test_env_values_are_validated() {
        let result = with_env(&[("SV_SIGNER_MAX_PENDING", "0")], load_config_from_env);
        assert!(matches!(result, Err(SignerError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/signer.toml");
        assert!(matches!(result, Err(SignerError::Config(_))));
    }
}
