//! Token revocation (RFC 7009).

use serde::Serialize;
use snafu::prelude::*;

use crate::{
    api::{ApiClient, ApiError},
    http::{HttpClient, HttpResponse},
    token::{AccessToken, TokenKind},
};

/// The [`RevocationError`] produced by a given [`HttpClient`].
pub type RevocationErrorFor<C> =
    RevocationError<<C as HttpClient>::Error, <<C as HttpClient>::Response as HttpResponse>::Error>;

#[derive(Debug, Serialize)]
struct RevocationForm<'a> {
    token: &'a str,
    token_type_hint: &'static str,
}

impl AccessToken {
    /// Revokes one of the held tokens at the revocation endpoint.
    ///
    /// The response body is ignored. Local state is not modified: the
    /// wrapper keeps reporting the token as valid until it expires, so the
    /// caller should stop using it. [`AccessToken::revoke_all`] consumes the
    /// wrapper instead.
    ///
    /// # Errors
    ///
    /// Returns [`RevocationError::MissingRefreshToken`] without sending
    /// anything if `kind` is [`TokenKind::RefreshToken`] and none is held,
    /// or [`RevocationError::Revocation`] if the request fails.
    pub async fn revoke<C: HttpClient>(
        &self,
        client: &ApiClient<C>,
        kind: TokenKind,
    ) -> Result<(), RevocationErrorFor<C>> {
        let token = match kind {
            TokenKind::AccessToken => self.access_token(),
            TokenKind::RefreshToken => self.refresh_token().context(MissingRefreshTokenSnafu)?,
        };

        let form = RevocationForm {
            token: token.expose_token(),
            token_type_hint: kind.as_str(),
        };

        client
            .post_form_empty(client.config().revocation_path(), &form)
            .await
            .context(RevocationSnafu)?;

        tracing::info!(token_type_hint = kind.as_str(), "token revoked");

        Ok(())
    }

    /// Revokes the refresh token (if held) and then the access token,
    /// consuming the wrapper.
    ///
    /// The wrapper is gone whether or not revocation succeeds; on failure
    /// the server-side state of the remaining token is unknown.
    ///
    /// # Errors
    ///
    /// Returns the first [`RevocationError::Revocation`] encountered; the
    /// access token is not revoked if revoking the refresh token failed.
    pub async fn revoke_all<C: HttpClient>(
        self,
        client: &ApiClient<C>,
    ) -> Result<(), RevocationErrorFor<C>> {
        if self.refresh_token().is_some() {
            self.revoke(client, TokenKind::RefreshToken).await?;
        }
        self.revoke(client, TokenKind::AccessToken).await
    }
}

/// Errors that can occur when revoking a token.
#[derive(Debug, Snafu)]
pub enum RevocationError<HttpReqErr: crate::Error, HttpRespErr: crate::Error> {
    /// A refresh token revocation was requested, but none is held.
    #[snafu(display("No refresh token is available to revoke"))]
    MissingRefreshToken,
    /// The revocation request failed.
    #[snafu(display("Failed to revoke token"))]
    Revocation {
        /// The underlying error.
        source: ApiError<HttpReqErr, HttpRespErr>,
    },
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> crate::Error
    for RevocationError<HttpReqErr, HttpRespErr>
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::MissingRefreshToken => false,
            Self::Revocation { source } => source.is_retryable(),
        }
    }
}
