//! Configuration loading and validation for the crypto layer.
//!
//! All values are read from environment variables at startup. Loading fails
//! with a clear error message if a variable cannot be parsed or the
//! combination of settings is unsafe.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use keywheel_common::Algorithm;

/// Validated crypto configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CryptoConfig {
    /// Algorithm used for new encryptions (decryption always honours what
    /// the stored envelope says).
    #[serde(default = "default_active_algorithm")]
    pub active_algorithm: Algorithm,

    /// Whether AES-256-CBC may be registered at all. Off by default; only
    /// enable to read ciphertext from systems that predate the AEAD suites.
    #[serde(default)]
    pub allow_legacy_cbc: bool,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_active_algorithm() -> Algorithm {
    Algorithm::Aes256Gcm
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            active_algorithm: default_active_algorithm(),
            allow_legacy_cbc: false,
            log_level: default_log_level(),
        }
    }
}

impl CryptoConfig {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or validation fails.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: CryptoConfig = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate the settings, returning a descriptive error on the first
    /// failure.
    fn validate(&self) -> Result<()> {
        if self.active_algorithm == Algorithm::Aes256Cbc && !self.allow_legacy_cbc {
            anyhow::bail!(
                "ACTIVE_ALGORITHM is aes-256-cbc but ALLOW_LEGACY_CBC is not set; \
                 refusing to encrypt new data with an unauthenticated cipher"
            );
        }
        if !self.active_algorithm.is_recommended() {
            warn!(
                algorithm = %self.active_algorithm,
                "active algorithm is not on the recommended list"
            );
        }
        Ok(())
    }
}
