//! Storage runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the
//! service. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in
//! multi-threaded runtimes and test harnesses.

use crate::constants::{DEFAULT_BASE_DIR, DEFAULT_DEV_ORIGIN, PRODUCTION_ORIGIN};
use crate::{StorageError, StorageResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Deployment environment tag.
///
/// Production pins the public origin to a fixed HTTPS value; every other
/// environment uses the configured origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = StorageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(StorageError::Config(format!(
                "unrecognised environment value: {other}"
            ))),
        }
    }
}

/// Storage configuration resolved at startup.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    base_dir: PathBuf,
    public_origin: String,
    environment: Environment,
}

impl StorageConfig {
    /// Create a new `StorageConfig` from explicit parts.
    ///
    /// `public_origin` is trimmed and stripped of any trailing slash so URL
    /// assembly never produces a double slash.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the origin is empty.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        public_origin: impl Into<String>,
        environment: Environment,
    ) -> StorageResult<Self> {
        let public_origin = public_origin.into();
        let trimmed = public_origin.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(StorageError::Config("public origin cannot be empty".into()));
        }

        Ok(Self {
            base_dir: base_dir.into(),
            public_origin: trimmed.to_owned(),
            environment,
        })
    }

    /// Resolve configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `UPLOAD_BASE_DIR`: base storage directory (default: "uploads")
    /// - `PUBLIC_ORIGIN`: public origin outside production (default: "http://localhost:5000")
    /// - `APP_ENV`: "production" or "development" (default: "development")
    ///
    /// Empty or whitespace-only values fall back to the defaults.
    pub fn from_env() -> StorageResult<Self> {
        let base_dir = std::env::var("UPLOAD_BASE_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_DIR.to_owned());

        let public_origin = std::env::var("PUBLIC_ORIGIN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DEV_ORIGIN.to_owned());

        let environment = match std::env::var("APP_ENV") {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => Environment::Development,
        };

        Self::new(base_dir, public_origin, environment)
    }

    /// Root of all managed storage on disk. Relative paths are resolved
    /// against the process working directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The origin used to build public URLs.
    ///
    /// In production this is always the fixed HTTPS origin; the configured
    /// value only applies elsewhere.
    pub fn origin(&self) -> &str {
        match self.environment {
            Environment::Production => PRODUCTION_ORIGIN,
            Environment::Development => &self.public_origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_fixed_in_production() {
        let config =
            StorageConfig::new("uploads", "http://localhost:9999", Environment::Production)
                .unwrap();
        assert_eq!(config.origin(), "https://tendra.app");
    }

    #[test]
    fn test_origin_configurable_in_development() {
        let config =
            StorageConfig::new("uploads", "http://localhost:9999", Environment::Development)
                .unwrap();
        assert_eq!(config.origin(), "http://localhost:9999");
    }

    #[test]
    fn test_origin_trailing_slash_stripped() {
        let config =
            StorageConfig::new("uploads", "http://localhost:5000/", Environment::Development)
                .unwrap();
        assert_eq!(config.origin(), "http://localhost:5000");
    }

    #[test]
    fn test_empty_origin_rejected() {
        let result = StorageConfig::new("uploads", "   ", Environment::Development);
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "Prod".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "dev".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert!(matches!(
            "staging".parse::<Environment>(),
            Err(StorageError::Config(_))
        ));
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(Environment::Development.to_string(), "development");
    }
}
