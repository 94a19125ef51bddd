//! Runtime configuration
//!
//! Values come from environment variables, falling back to defaults under the
//! user's config directory.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

// Environment variable names
pub const ENV_DB_PATH: &str = "CONTACTDESK_DB";
pub const ENV_MAX_UPLOAD_MB: &str = "CONTACTDESK_MAX_UPLOAD_MB";

pub const DEFAULT_MAX_UPLOAD_MB: u64 = 5;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub max_upload_mb: u64,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = match non_empty(lookup(ENV_DB_PATH)) {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        let max_upload_mb = match non_empty(lookup(ENV_MAX_UPLOAD_MB)) {
            Some(raw) => {
                let mb: u64 = raw
                    .parse()
                    .with_context(|| format!("{} must be a whole number, got {:?}", ENV_MAX_UPLOAD_MB, raw))?;
                if mb == 0 {
                    return Err(anyhow!("{} must be greater than zero", ENV_MAX_UPLOAD_MB));
                }
                mb
            }
            None => DEFAULT_MAX_UPLOAD_MB,
        };

        Ok(Self {
            database_path,
            max_upload_mb,
        })
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn default_database_path() -> Result<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
    Ok(config_dir.join("contactdesk").join("contacts.db"))
}
