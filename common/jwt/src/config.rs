use std::env;
use std::time::Duration;

use crate::error::ConfigError;
use crate::keys::Algorithm;

pub const LIFE_ENV: &str = "LTI_JWT_LIFE_SECONDS";
pub const LEEWAY_ENV: &str = "LTI_JWT_LEEWAY_SECONDS";
pub const ALLOW_JKU_ENV: &str = "LTI_JWT_ALLOW_JKU_HEADER";
pub const JWKS_TIMEOUT_ENV: &str = "LTI_JWKS_TIMEOUT_MS";
pub const JWKS_MIN_REFRESH_ENV: &str = "LTI_JWKS_MIN_REFRESH_MS";

/// Runtime configuration read by every token operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtSettings {
    /// Upper bound on how far in the future `exp` is set when issuing.
    pub life_seconds: u64,
    /// Allowable clock skew in seconds when validating exp/nbf/iat.
    pub leeway_seconds: u64,
    /// Honour the `jku` header during verification.
    pub allow_jku_header: bool,
    /// Timeout applied to remote key set fetches.
    pub jwks_timeout: Duration,
    /// Minimum time between refetches of a key set triggered by an unknown `kid`.
    pub jwks_min_refresh: Duration,
    /// Algorithms a verified token may declare.
    pub allowed_algorithms: Vec<Algorithm>,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            life_seconds: 60,
            leeway_seconds: 180,
            allow_jku_header: false,
            jwks_timeout: Duration::from_secs(5),
            jwks_min_refresh: Duration::from_secs(30),
            allowed_algorithms: vec![Algorithm::RS256, Algorithm::RS384, Algorithm::RS512],
        }
    }
}

impl JwtSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_life(mut self, seconds: u64) -> Self {
        self.life_seconds = seconds;
        self
    }

    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn with_jku_header(mut self, allow: bool) -> Self {
        self.allow_jku_header = allow;
        self
    }

    pub fn with_jwks_timeout(mut self, timeout: Duration) -> Self {
        self.jwks_timeout = timeout;
        self
    }

    pub fn with_jwks_min_refresh(mut self, interval: Duration) -> Self {
        self.jwks_min_refresh = interval;
        self
    }

    pub fn with_algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        self.allowed_algorithms = algorithms.into_iter().collect();
        self
    }

    pub fn allows(&self, algorithm: Algorithm) -> bool {
        self.allowed_algorithms.contains(&algorithm)
    }

    /// Defaults overridden by any `LTI_JWT_*` / `LTI_JWKS_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(value) = lookup(LIFE_ENV) {
            settings.life_seconds = parse_u64(LIFE_ENV, &value)?;
        }
        if let Some(value) = lookup(LEEWAY_ENV) {
            settings.leeway_seconds = parse_u64(LEEWAY_ENV, &value)?;
        }
        if let Some(value) = lookup(ALLOW_JKU_ENV) {
            settings.allow_jku_header = parse_bool(ALLOW_JKU_ENV, &value)?;
        }
        if let Some(value) = lookup(JWKS_TIMEOUT_ENV) {
            let millis = parse_u64(JWKS_TIMEOUT_ENV, &value)?;
            settings.jwks_timeout = Duration::from_millis(millis);
        }
        if let Some(value) = lookup(JWKS_MIN_REFRESH_ENV) {
            let millis = parse_u64(JWKS_MIN_REFRESH_ENV, &value)?;
            settings.jwks_min_refresh = Duration::from_millis(millis);
        }
        Ok(settings)
    }
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|err| ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: err.to_string(),
        })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
