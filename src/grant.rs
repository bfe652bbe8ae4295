//! Obtaining the first token.
//!
//! The authorization code grant (RFC 6749 §4.1) starts by sending the user to
//! [`ApiClient::authorize_url`] and finishes with
//! [`ApiClient::exchange_code`]. The resource owner password (§4.3) and client
//! credentials (§4.4) grants are a single token request each. Every exchange
//! produces an [`AccessToken`] ready for refresh and revocation.

use bon::Builder;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use snafu::prelude::*;
use url::Url;

use crate::{
    api::{ApiClient, ApiErrorFor},
    config::{ConfigError, InvalidAuthorizationUrlSnafu},
    http::HttpClient,
    token::{AccessToken, TokenPayload},
};

/// Joins scopes into a space-separated scope string, dropping blank entries.
pub(crate) fn mk_scopes(scopes: impl IntoIterator<Item = impl Into<String>>) -> Option<String> {
    let scopes = scopes
        .into_iter()
        .filter_map(|s| {
            let s = s.into();
            (!s.trim().is_empty()).then_some(s)
        })
        .collect::<Vec<_>>();

    (!scopes.is_empty()).then(|| scopes.join(" "))
}

/// Parameters of the authorization request.
#[derive(Debug, Clone, Builder)]
pub struct AuthorizeParams {
    /// Extra query parameters, in insertion order.
    #[builder(field)]
    extra: Vec<(String, String)>,

    /// Where the authorization server sends the user back to.
    #[builder(into)]
    redirect_uri: String,

    /// Requested scopes.
    #[builder(required, default, name = "scopes", with = |scopes: impl IntoIterator<Item = impl Into<String>>| mk_scopes(scopes))]
    scope: Option<String>,

    /// Opaque value echoed back on the redirect, for CSRF protection.
    #[builder(into)]
    state: Option<String>,
}

impl<S: authorize_params_builder::State> AuthorizeParamsBuilder<S> {
    /// Adds an extra query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }
}

#[derive(Debug, Serialize)]
struct AuthorizationCodeForm<'a> {
    grant_type: &'static str,
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Debug, Serialize)]
struct PasswordForm<'a> {
    grant_type: &'static str,
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClientCredentialsForm {
    grant_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

impl<C: HttpClient> ApiClient<C> {
    /// Builds the URL the user is sent to for the authorization code grant.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the authorization endpoint cannot be
    /// resolved.
    pub fn authorize_url(&self, params: &AuthorizeParams) -> Result<Url, ConfigError> {
        let endpoint = self
            .config()
            .endpoint(self.config().authorization_path())?;
        let mut url = Url::parse(&endpoint.to_string()).context(InvalidAuthorizationUrlSnafu)?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", self.config().client_id())
                .append_pair("redirect_uri", &params.redirect_uri);
            if let Some(scope) = &params.scope {
                query.append_pair("scope", scope);
            }
            if let Some(state) = &params.state {
                query.append_pair("state", state);
            }
            for (key, value) in &params.extra {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Exchanges an authorization code for a token.
    ///
    /// `redirect_uri` must match the one used in the authorization request.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`](crate::api::ApiError) of the token request.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken, ApiErrorFor<C>> {
        let form = AuthorizationCodeForm {
            grant_type: "authorization_code",
            code,
            redirect_uri,
        };

        self.request_token(&form, form.grant_type).await
    }

    /// Exchanges the resource owner's credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`](crate::api::ApiError) of the token request.
    pub async fn exchange_password(
        &self,
        username: &str,
        password: &SecretString,
        scopes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<AccessToken, ApiErrorFor<C>> {
        let form = PasswordForm {
            grant_type: "password",
            username,
            password: password.expose_secret(),
            scope: mk_scopes(scopes),
        };

        self.request_token(&form, form.grant_type).await
    }

    /// Obtains a token for the client itself.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`](crate::api::ApiError) of the token request.
    pub async fn exchange_client_credentials(
        &self,
        scopes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<AccessToken, ApiErrorFor<C>> {
        let form = ClientCredentialsForm {
            grant_type: "client_credentials",
            scope: mk_scopes(scopes),
        };

        self.request_token(&form, form.grant_type).await
    }

    async fn request_token<F: Serialize>(
        &self,
        form: &F,
        grant_type: &'static str,
    ) -> Result<AccessToken, ApiErrorFor<C>> {
        let payload: TokenPayload = self.post_form(self.config().token_path(), form).await?;

        tracing::info!(grant_type, "access token obtained");

        Ok(AccessToken::new(payload))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        config::{ClientAuthMethod, ClientConfig},
        http::mock::MockHttpClient,
    };

    fn client(http: MockHttpClient) -> ApiClient<MockHttpClient> {
        let config = ClientConfig::builder()
            .client_id("client-1")
            .client_secret("secret")
            .site("https://auth.example.com")
            .auth_method(ClientAuthMethod::RequestBody)
            .build();
        ApiClient::new(config, http)
    }

    fn form(client: &ApiClient<MockHttpClient>) -> HashMap<String, String> {
        client.http_client().form(0).into_iter().collect()
    }

    #[test]
    fn test_mk_scopes() {
        assert_eq!(mk_scopes(["a", " ", "b"]), Some("a b".to_owned()));
        assert_eq!(mk_scopes(Vec::<String>::new()), None);
        assert_eq!(mk_scopes([""]), None);
    }

    #[test]
    fn test_authorize_url() {
        let client = client(MockHttpClient::new());
        let params = AuthorizeParams::builder()
            .redirect_uri("https://app.example.com/callback")
            .scopes(["read", "write"])
            .state("xyz")
            .param("prompt", "consent")
            .build();

        let url = client.authorize_url(&params).unwrap();

        assert_eq!(url.host_str(), Some("auth.example.com"));
        assert_eq!(url.path(), "/oauth/authorize");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            [
                ("response_type", "code"),
                ("client_id", "client-1"),
                ("redirect_uri", "https://app.example.com/callback"),
                ("scope", "read write"),
                ("state", "xyz"),
                ("prompt", "consent"),
            ]
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
        );
        assert_eq!(client.http_client().request_count(), 0);
    }

    #[test]
    fn test_authorize_url_minimal() {
        let client = client(MockHttpClient::new());
        let params = AuthorizeParams::builder()
            .redirect_uri("http://localhost/cb")
            .build();

        let url = client.authorize_url(&params).unwrap();

        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(query.len(), 3);
        assert!(!query.contains_key("scope"));
        assert!(!query.contains_key("state"));
    }

    #[test]
    fn test_authorize_url_with_invalid_endpoint() {
        let params = AuthorizeParams::builder()
            .redirect_uri("http://localhost/cb")
            .build();
        let client_with = |authorization_path: &str| {
            let config = ClientConfig::builder()
                .client_id("client-1")
                .site("https://auth.example.com")
                .authorization_path(authorization_path)
                .build();
            ApiClient::new(config, MockHttpClient::new())
        };

        assert!(matches!(
            client_with("/oauth/author ize").authorize_url(&params),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        // Accepted as a URI, but the port is out of range for a URL.
        assert!(matches!(
            client_with("https://auth.example.com:99999/authorize").authorize_url(&params),
            Err(ConfigError::InvalidAuthorizationUrl {
                source: url::ParseError::InvalidPort
            })
        ));
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let client = client(MockHttpClient::new().respond_json(
            200,
            r#"{"access_token": "A", "refresh_token": "B", "expires_in": 3600, "token_type": "Bearer"}"#,
        ));

        let token = client
            .exchange_code("the-code", "http://localhost/cb")
            .await
            .unwrap();

        assert_eq!(token.access_token().expose_token(), "A");
        assert!(!token.expired());

        let form = form(&client);
        assert_eq!(form["grant_type"], "authorization_code");
        assert_eq!(form["code"], "the-code");
        assert_eq!(form["redirect_uri"], "http://localhost/cb");
        assert_eq!(form["client_id"], "client-1");
        assert_eq!(form["client_secret"], "secret");
    }

    #[tokio::test]
    async fn test_exchange_password() {
        let client = client(MockHttpClient::new().respond_json(200, r#"{"access_token": "A"}"#));

        client
            .exchange_password("alice", &SecretString::from("pa&ss"), ["profile"])
            .await
            .unwrap();

        let form = form(&client);
        assert_eq!(form["grant_type"], "password");
        assert_eq!(form["username"], "alice");
        assert_eq!(form["password"], "pa&ss");
        assert_eq!(form["scope"], "profile");
    }

    #[tokio::test]
    async fn test_exchange_client_credentials() {
        let client = client(MockHttpClient::new().respond_json(200, r#"{"access_token": "A"}"#));

        let token = client
            .exchange_client_credentials(Vec::<String>::new())
            .await
            .unwrap();

        assert!(token.refresh_token().is_none());
        let form = form(&client);
        assert_eq!(form["grant_type"], "client_credentials");
        assert!(!form.contains_key("scope"));
    }

    #[tokio::test]
    async fn test_exchange_error_is_returned() {
        let client = client(
            MockHttpClient::new().respond_json(401, r#"{"error": "invalid_client"}"#),
        );

        let err = client
            .exchange_client_credentials(["x"])
            .await
            .unwrap_err();

        assert_eq!(err.oauth2_error().unwrap().error, "invalid_client");
    }
}
