//! Refresh token grant (RFC 6749 §6).

use bon::Builder;
use snafu::prelude::*;

use crate::{
    api::{ApiClient, ApiError},
    grant::mk_scopes,
    http::{HttpClient, HttpResponse},
    token::{AccessToken, TokenPayload},
};

/// Form fields that are always set by the refresh request itself.
const RESERVED_FIELDS: &[&str] = &["grant_type", "refresh_token"];

/// Additional parameters for a refresh request.
#[derive(Debug, Clone, Default, Builder)]
pub struct RefreshParams {
    /// Extra form fields, in insertion order.
    #[builder(field)]
    extra: Vec<(String, String)>,

    /// Scopes for downscoping (must be previously granted scopes).
    #[builder(required, default, name = "scopes", with = |scopes: impl IntoIterator<Item = impl Into<String>>| mk_scopes(scopes))]
    scope: Option<String>,
}

impl<S: refresh_params_builder::State> RefreshParamsBuilder<S> {
    /// Adds an extra form field.
    ///
    /// `grant_type` and `refresh_token` cannot be overridden and are
    /// silently dropped.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }
}

impl RefreshParams {
    fn form<'a>(&'a self, refresh_token: &'a str) -> Vec<(&'a str, &'a str)> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        if let Some(scope) = &self.scope {
            form.push(("scope", scope.as_str()));
        }

        form.extend(
            self.extra
                .iter()
                .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
                .filter(|(key, _)| self.scope.is_none() || key != "scope")
                .map(|(key, value)| (key.as_str(), value.as_str())),
        );

        form
    }
}

/// The [`RefreshError`] produced by a given [`HttpClient`].
pub type RefreshErrorFor<C> =
    RefreshError<<C as HttpClient>::Error, <<C as HttpClient>::Response as HttpResponse>::Error>;

impl AccessToken {
    /// Exchanges the refresh token for a new access token.
    ///
    /// Sends exactly one request to the token endpoint. The returned token
    /// wraps the server's response as-is: if the server does not rotate the
    /// refresh token, the new token has none. `self` is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::MissingRefreshToken`] without sending anything
    /// if no refresh token is held, or [`RefreshError::Refresh`] with the
    /// unmodified [`ApiError`] if the request fails.
    pub async fn refresh<C: HttpClient>(
        &self,
        client: &ApiClient<C>,
        params: &RefreshParams,
    ) -> Result<AccessToken, RefreshErrorFor<C>> {
        let refresh_token = self.refresh_token().context(MissingRefreshTokenSnafu)?;
        let form = params.form(refresh_token.expose_token());

        let payload: TokenPayload = client
            .post_form(client.config().token_path(), &form)
            .await
            .context(RefreshSnafu)?;

        let token = AccessToken::new(payload);
        tracing::info!(
            expires_in = token.payload().expires_in,
            rotated = token.refresh_token().is_some(),
            "access token refreshed"
        );

        Ok(token)
    }
}

/// Errors that can occur when refreshing a token.
#[derive(Debug, Snafu)]
pub enum RefreshError<HttpReqErr: crate::Error, HttpRespErr: crate::Error> {
    /// The token has no refresh token.
    #[snafu(display("No refresh token is available"))]
    MissingRefreshToken,
    /// The refresh request failed.
    #[snafu(display("Failed to refresh access token"))]
    Refresh {
        /// The underlying error.
        source: ApiError<HttpReqErr, HttpRespErr>,
    },
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> crate::Error
    for RefreshError<HttpReqErr, HttpRespErr>
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::MissingRefreshToken => false,
            Self::Refresh { source } => source.is_retryable(),
        }
    }
}
