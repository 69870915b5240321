//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication configuration.
///
/// Access and refresh tokens are signed with two distinct secrets so that a
/// refresh token can never pass for an access token (or vice versa). Each
/// secret may be given literally or as `env:VAR_NAME` to read it from the
/// environment at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret for signing access tokens (HS256).
    pub access_secret: Option<String>,

    /// Secret for signing refresh tokens (HS256).
    pub refresh_secret: Option<String>,

    /// Access token lifetime in seconds.
    pub access_ttl_secs: i64,

    /// Refresh token lifetime in seconds.
    pub refresh_ttl_secs: i64,
}

/// 15 minutes.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;
/// 7 days.
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // No default secrets - must be explicitly configured
            access_secret: None,
            refresh_secret: None,
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
        }
    }
}

impl AuthConfig {
    /// Resolve a configured secret, expanding `env:VAR_NAME` syntax.
    fn resolve(value: &Option<String>) -> Result<Option<String>, ConfigValidationError> {
        match value {
            None => Ok(None),
            Some(value) => {
                if let Some(var_name) = value.strip_prefix("env:") {
                    match std::env::var(var_name) {
                        Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                        Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                        Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                    }
                } else {
                    Ok(Some(value.clone()))
                }
            }
        }
    }

    /// Resolve the access token secret.
    pub fn resolve_access_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        Self::resolve(&self.access_secret)
    }

    /// Resolve the refresh token secret.
    pub fn resolve_refresh_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        Self::resolve(&self.refresh_secret)
    }

    /// Validate the configuration.
    ///
    /// Both secrets are required, must meet the minimum length for
    /// HMAC-SHA256, and must differ from each other.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let access = self
            .resolve_access_secret()?
            .ok_or(ConfigValidationError::MissingSecret("access_secret"))?;
        let refresh = self
            .resolve_refresh_secret()?
            .ok_or(ConfigValidationError::MissingSecret("refresh_secret"))?;

        if access.len() < 32 {
            return Err(ConfigValidationError::SecretTooShort("access_secret"));
        }
        if refresh.len() < 32 {
            return Err(ConfigValidationError::SecretTooShort("refresh_secret"));
        }
        if access == refresh {
            return Err(ConfigValidationError::SecretsNotDistinct);
        }

        if self.access_ttl_secs <= 0 || self.refresh_ttl_secs <= 0 {
            return Err(ConfigValidationError::InvalidTtl);
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    /// A required signing secret is not configured.
    #[error(
        "{0} is required. Set it in the config file or via env: indirection."
    )]
    MissingSecret(&'static str),

    /// A signing secret is too short (minimum 32 characters).
    #[error("{0} must be at least 32 characters long for HMAC-SHA256.")]
    SecretTooShort(&'static str),

    /// Access and refresh secrets are identical.
    #[error("access_secret and refresh_secret must be distinct.")]
    SecretsNotDistinct,

    /// Token lifetime must be positive.
    #[error("token lifetimes must be positive.")]
    InvalidTtl,

    /// Environment variable not found (for `env:VAR_NAME` syntax).
    #[error("environment variable '{0}' not found (referenced via env:{0} in config).")]
    EnvVarNotFound(String),

    /// Environment variable is empty (for `env:VAR_NAME` syntax).
    #[error("environment variable '{0}' is empty (referenced via env:{0} in config).")]
    EnvVarEmpty(String),
}
