use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::StkError;

/// Service hosts. Paths are fixed by the protocol; only the origins move.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct Endpoints {
    #[validate(url)]
    pub stk_host: String,
    #[validate(url)]
    pub firs_host: String,
    #[validate(url)]
    pub auth_host: String,
    #[validate(url)]
    pub signin_url: String,
    #[validate(url)]
    pub return_to: String,
}

/// How this client presents itself to the service.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ClientIdentity {
    #[validate(length(min = 1))]
    pub user_agent: String,
    #[validate(length(min = 1))]
    pub accept_language: String,
    #[validate(length(min = 1))]
    pub app_name: String,
    #[validate(length(min = 1))]
    pub app_version: String,
    #[validate(length(min = 1))]
    pub os: String,
    #[validate(length(min = 1))]
    pub os_architecture: String,
    #[validate(length(min = 1))]
    pub device_model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub endpoints: Endpoints,
    #[validate(nested)]
    pub client: ClientIdentity,
}

impl Settings {
    /// Loads the embedded defaults merged with `STK_CLIENT__*` environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`StkError::Configuration`] if the merged configuration does not
    /// deserialize or fails validation.
    pub fn new() -> Result<Self, Report<StkError>> {
        let toml_str = include_str!("../../../stk-client.toml");

        Self::from_toml(toml_str)
    }

    /// Parses settings from a TOML string and applies environment overrides.
    ///
    /// Variables use the `STK_CLIENT` prefix and `__` as the nesting separator,
    /// e.g. `STK_CLIENT__ENDPOINTS__STK_HOST`.
    ///
    /// # Errors
    ///
    /// Returns [`StkError::Configuration`] if the merged configuration does not
    /// deserialize or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<StkError>> {
        let environment = Environment::default()
            .prefix("STK_CLIENT")
            .separator("__");

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(StkError::Configuration {
                message: "Failed to build configuration".into(),
            })?;

        let settings: Self =
            config
                .try_deserialize()
                .change_context(StkError::Configuration {
                    message: "Failed to deserialize configuration".into(),
                })?;

        settings.validate().map_err(|e| {
            Report::new(StkError::Configuration {
                message: format!("Settings validation failed: {e}"),
            })
        })?;

        Ok(settings)
    }

    /// Full URL for `path` on the delivery service host.
    #[must_use]
    pub fn stk_url(&self, path: &str) -> String {
        join_url(&self.endpoints.stk_host, path)
    }

    /// Full URL for `path` on the device registration host.
    #[must_use]
    pub fn firs_url(&self, path: &str) -> String {
        join_url(&self.endpoints.firs_host, path)
    }

    /// Full URL for `path` on the token exchange host.
    #[must_use]
    pub fn auth_url(&self, path: &str) -> String {
        join_url(&self.endpoints.auth_host, path)
    }
}

fn join_url(host: &str, path: &str) -> String {
    format!("{}{}", host.trim_end_matches('/'), path)
}
