//! Client configuration.
//!
//! [`ClientConfig`] names the client and the authorization server it talks
//! to. Endpoint paths are resolved against `site` when a request is made, so
//! a configuration can be built (or deserialized) without touching the
//! network.

use bon::Builder;
use http::{Uri, uri::InvalidUri};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// Default token endpoint path.
pub const DEFAULT_TOKEN_PATH: &str = "/oauth/token";
/// Default revocation endpoint path.
pub const DEFAULT_REVOCATION_PATH: &str = "/oauth/revoke";
/// Default authorization endpoint path.
pub const DEFAULT_AUTHORIZATION_PATH: &str = "/oauth/authorize";

/// How the client authenticates itself to the token and revocation endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// HTTP Basic authentication (RFC 6749 §2.3.1).
    #[default]
    Basic,
    /// `client_id` and `client_secret` sent as form fields.
    RequestBody,
}

/// Configuration for a single OAuth2 client.
#[derive(Debug, Clone, Builder, Deserialize)]
pub struct ClientConfig {
    /// The client identifier issued by the authorization server.
    #[builder(into)]
    client_id: String,

    /// The client secret, if the client is confidential.
    #[builder(into)]
    #[serde(default)]
    client_secret: Option<SecretString>,

    /// Base URL of the authorization server, e.g. `https://auth.example.com`.
    #[builder(into)]
    site: String,

    /// Path (or absolute URL) of the token endpoint.
    #[builder(into, default = DEFAULT_TOKEN_PATH.to_owned())]
    #[serde(default = "default_token_path")]
    token_path: String,

    /// Path (or absolute URL) of the revocation endpoint.
    #[builder(into, default = DEFAULT_REVOCATION_PATH.to_owned())]
    #[serde(default = "default_revocation_path")]
    revocation_path: String,

    /// Path (or absolute URL) of the authorization endpoint.
    #[builder(into, default = DEFAULT_AUTHORIZATION_PATH.to_owned())]
    #[serde(default = "default_authorization_path")]
    authorization_path: String,

    /// Client authentication method.
    #[builder(default)]
    #[serde(default)]
    auth_method: ClientAuthMethod,
}

impl ClientConfig {
    /// The client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The client secret, if any.
    #[must_use]
    pub fn client_secret(&self) -> Option<&SecretString> {
        self.client_secret.as_ref()
    }

    /// The configured base URL.
    #[must_use]
    pub fn site(&self) -> &str {
        &self.site
    }

    /// The configured token path.
    #[must_use]
    pub fn token_path(&self) -> &str {
        &self.token_path
    }

    /// The configured revocation path.
    #[must_use]
    pub fn revocation_path(&self) -> &str {
        &self.revocation_path
    }

    /// The configured authorization path.
    #[must_use]
    pub fn authorization_path(&self) -> &str {
        &self.authorization_path
    }

    /// The client authentication method.
    #[must_use]
    pub fn auth_method(&self) -> ClientAuthMethod {
        self.auth_method
    }

    /// Resolves `path` into an absolute endpoint URI.
    ///
    /// Absolute `http://` and `https://` URLs are used unchanged; anything
    /// else is appended to `site` with exactly one `/` in between.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] if the result does not parse,
    /// or [`ConfigError::RelativeEndpoint`] if it lacks a scheme or host.
    pub fn endpoint(&self, path: &str) -> Result<Uri, ConfigError> {
        let url = if is_absolute(path) {
            path.to_owned()
        } else {
            format!(
                "{}/{}",
                self.site.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };

        let uri = url
            .parse::<Uri>()
            .context(InvalidEndpointSnafu { url: &url })?;

        ensure!(
            uri.scheme().is_some() && uri.authority().is_some(),
            RelativeEndpointSnafu { url }
        );

        Ok(uri)
    }

    /// The resolved token endpoint.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::endpoint`].
    pub fn token_endpoint(&self) -> Result<Uri, ConfigError> {
        self.endpoint(&self.token_path)
    }

    /// The resolved revocation endpoint.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::endpoint`].
    pub fn revocation_endpoint(&self) -> Result<Uri, ConfigError> {
        self.endpoint(&self.revocation_path)
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

fn default_token_path() -> String {
    DEFAULT_TOKEN_PATH.to_owned()
}

fn default_revocation_path() -> String {
    DEFAULT_REVOCATION_PATH.to_owned()
}

fn default_authorization_path() -> String {
    DEFAULT_AUTHORIZATION_PATH.to_owned()
}

/// Errors raised while resolving configured endpoints.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    /// The endpoint URL could not be parsed.
    #[snafu(display("Invalid endpoint URL: {url}"))]
    InvalidEndpoint {
        /// The URL that failed to parse.
        url: String,
        /// The underlying error.
        source: InvalidUri,
    },
    /// The endpoint URL has no scheme or host; `site` is probably missing.
    #[snafu(display("Endpoint URL is not absolute: {url}"))]
    RelativeEndpoint {
        /// The offending URL.
        url: String,
    },
    /// The authorization URL could not be built.
    #[snafu(display("Invalid authorization URL"))]
    InvalidAuthorizationUrl {
        /// The underlying error.
        source: url::ParseError,
    },
}

impl crate::Error for ConfigError {
    fn is_retryable(&self) -> bool {
        false
    }
}
