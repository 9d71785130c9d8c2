//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Largest accepted upload body: 10 GiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 << 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Timeout for JSON routes; uploads are bounded by size instead
    pub request_timeout: Duration,
    /// Max upload body size
    pub max_upload_bytes: u64,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 secret for access tokens
    pub jwt_secret: String,
    /// Directory for staged and remuxed files
    pub upload_tmp_dir: PathBuf,
}

impl ApiConfig {
    /// Defaults for everything except the JWT secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8091,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            environment: "development".to_string(),
            jwt_secret: jwt_secret.into(),
            upload_tmp_dir: std::env::temp_dir(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let defaults = Self::with_secret(jwt_secret);

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            request_timeout: std::env::var("REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            jwt_secret: defaults.jwt_secret,
            upload_tmp_dir: std::env::var("UPLOAD_TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_tmp_dir),
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Upload limit as a body-limit layer argument.
    pub fn max_upload_bytes_usize(&self) -> usize {
        usize::try_from(self.max_upload_bytes).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::with_secret("secret");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024 * 1024);
        assert!(!config.is_production());
        assert_eq!(config.jwt_secret, "secret");
    }
}
