use serde_json::Value;

use crate::{
    platform::{self, Duration, SystemTime},
    token::{PayloadError, SecretToken, TokenPayload},
};

/// An access token together with its expiry.
///
/// The expiry is computed once, when the token is constructed, as the
/// construction time plus `expires_in`. A payload without `expires_in`
/// never expires.
///
/// [`AccessToken::refresh`] does not modify the token it is called on; it
/// returns a new one, and the caller decides whether to replace the old
/// value. Use [`SharedAccessToken`](crate::token::SharedAccessToken) when
/// several tasks share a token and refreshes should be coalesced.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    payload: TokenPayload,
    expires_at: Option<SystemTime>,
}

impl AccessToken {
    /// Wraps a payload received now.
    #[must_use]
    pub fn new(payload: TokenPayload) -> Self {
        Self::issued_at(payload, platform::now())
    }

    /// Wraps a payload received at `issued_at`.
    ///
    /// If `issued_at + expires_in` is not representable the token is treated
    /// as never expiring.
    #[must_use]
    pub fn issued_at(payload: TokenPayload, issued_at: SystemTime) -> Self {
        let expires_at = payload
            .expires_in
            .and_then(|secs| issued_at.checked_add(Duration::from_secs(secs)));

        Self {
            payload,
            expires_at,
        }
    }

    /// Wraps a raw JSON token response received now.
    ///
    /// # Errors
    ///
    /// See [`TokenPayload::from_json`].
    pub fn from_json(bytes: &[u8]) -> Result<Self, PayloadError> {
        TokenPayload::from_json(bytes).map(Self::new)
    }

    /// Wraps a parsed JSON token response received now.
    ///
    /// # Errors
    ///
    /// See [`TokenPayload::from_value`].
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        TokenPayload::from_value(value).map(Self::new)
    }

    /// The wrapped payload, as received.
    #[must_use]
    pub fn payload(&self) -> &TokenPayload {
        &self.payload
    }

    /// Consumes the wrapper, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> TokenPayload {
        self.payload
    }

    /// The access token.
    #[must_use]
    pub fn access_token(&self) -> &SecretToken {
        &self.payload.access_token
    }

    /// The refresh token, if one was issued.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&SecretToken> {
        self.payload.refresh_token.as_ref()
    }

    /// The token type, if the server reported one.
    #[must_use]
    pub fn token_type(&self) -> Option<&str> {
        self.payload.token_type.as_deref()
    }

    /// The granted scope, if the server reported one.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.payload.scope.as_deref()
    }

    /// When the access token expires, or `None` if it never does.
    #[must_use]
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    /// Returns `true` if the access token has expired.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.is_expired_at(platform::now())
    }

    /// Returns `true` if the access token is expired at `now`.
    ///
    /// A token is still valid at exactly its expiry time, and expired
    /// strictly after it.
    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    /// Keeps `previous`'s refresh token if this one was issued without any.
    pub(crate) fn inherit_refresh_token(mut self, previous: &AccessToken) -> Self {
        if self.payload.refresh_token.is_none() {
            self.payload.refresh_token = previous.payload.refresh_token.clone();
        }
        self
    }

    /// Returns `true` if the access token will have expired `margin` from now.
    #[must_use]
    pub fn expires_within(&self, margin: Duration) -> bool {
        platform::now()
            .checked_add(margin)
            .map_or(self.expires_at.is_some(), |later| self.is_expired_at(later))
    }
}

impl From<TokenPayload> for AccessToken {
    fn from(payload: TokenPayload) -> Self {
        Self::new(payload)
    }
}
