//! Connection settings for the infra API.
//!
//! A `Config` is built once at startup and handed to `ApiClient::new`; the
//! client only ever reads it.

use crate::error::ConfigError;

pub const BASE_URL_VAR: &str = "INFRA_API_BASE_URL";
pub const TOKEN_VAR: &str = "INFRA_API_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub auth_token: Option<String>,
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
        }
    }

    /// Attach a bearer token. An empty token counts as no token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = (!token.is_empty()).then_some(token);
        self
    }

    /// Read `INFRA_API_BASE_URL` and the optional `INFRA_API_TOKEN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_VAR).ok_or(ConfigError::MissingVar(BASE_URL_VAR))?;
        let config = Self::new(base_url);
        Ok(match lookup(TOKEN_VAR) {
            Some(token) => config.with_token(token),
            None => config,
        })
    }
}
