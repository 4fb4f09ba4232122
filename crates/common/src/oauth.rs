//! OAuth2 sign-in with PKCE for device registration.
//!
//! The browser part of the flow happens outside this crate: the user opens
//! [`PkceSession::signin_url`], signs in, and hands back the URL the browser
//! was finally redirected to.

use base64::{engine::general_purpose, Engine};
use error_stack::{Report, ResultExt};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use url::Url;

use crate::constants::OAUTH_CLIENT_ID;
use crate::error::StkError;
use crate::settings::Settings;

const AUTHORIZATION_CODE_PARAM: &str = "openid.oa2.authorization_code";

/// Holds the code verifier between building the sign-in URL and exchanging
/// the authorization code.
pub struct PkceSession {
    verifier: String,
}

impl PkceSession {
    /// Starts a session with a fresh 32-byte verifier from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self::from_random_bytes(&bytes)
    }

    #[must_use]
    pub fn from_random_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            verifier: general_purpose::URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    #[must_use]
    pub fn code_verifier(&self) -> &str {
        &self.verifier
    }

    /// `base64url(sha256(verifier))`, unpadded.
    #[must_use]
    pub fn code_challenge(&self) -> String {
        general_purpose::URL_SAFE_NO_PAD.encode(Sha256::digest(self.verifier.as_bytes()))
    }

    /// Sign-in page URL carrying this session's challenge.
    ///
    /// # Errors
    ///
    /// Returns [`StkError::Configuration`] if the configured sign-in URL does
    /// not parse.
    pub fn signin_url(&self, settings: &Settings) -> Result<String, Report<StkError>> {
        let challenge = self.code_challenge();
        let client_id = format!("device:{OAUTH_CLIENT_ID}");
        let params = [
            (
                "openid.claimed_id",
                "http://specs.openid.net/auth/2.0/identifier_select",
            ),
            ("openid.ns.oa2", "http://www.amazon.com/ap/ext/oauth/2"),
            ("openid.ns", "http://specs.openid.net/auth/2.0"),
            (
                "openid.identity",
                "http://specs.openid.net/auth/2.0/identifier_select",
            ),
            ("openid.oa2.client_id", client_id.as_str()),
            ("openid.mode", "checkid_setup"),
            ("openid.oa2.scope", "device_auth_access"),
            ("openid.oa2.response_type", "code"),
            ("openid.oa2.code_challenge", challenge.as_str()),
            ("openid.oa2.code_challenge_method", "S256"),
            ("openid.return_to", settings.endpoints.return_to.as_str()),
            (
                "openid.ns.pape",
                "http://specs.openid.net/extensions/pape/1.0",
            ),
            ("openid.pape.max_auth_age", "0"),
            ("accountStatusPolicy", "P1"),
            ("openid.assoc_handle", "amzn_device_na"),
            ("pageId", "amzn_device_common_dark"),
            ("disableLoginPrepopulate", "1"),
        ];

        let url = Url::parse_with_params(&settings.endpoints.signin_url, params).change_context(
            StkError::Configuration {
                message: "Invalid sign-in URL".into(),
            },
        )?;
        Ok(url.into())
    }
}

/// Extracts the authorization code from the final redirect URL.
///
/// # Errors
///
/// Returns [`StkError::OAuth`] if the URL does not parse or carries no
/// `openid.oa2.authorization_code` parameter.
pub fn parse_authorization_code(redirect_url: &str) -> Result<String, Report<StkError>> {
    let url = Url::parse(redirect_url.trim()).change_context(StkError::OAuth {
        message: "Redirect URL does not parse".into(),
    })?;

    url.query_pairs()
        .find(|(name, _)| name == AUTHORIZATION_CODE_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| {
            Report::new(StkError::OAuth {
                message: format!("Redirect URL has no `{AUTHORIZATION_CODE_PARAM}` parameter"),
            })
        })
}
