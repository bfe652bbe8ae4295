use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::{
    api::ApiClient,
    http::HttpClient,
    platform::Duration,
    token::{AccessToken, RefreshErrorFor, RefreshParams},
};

/// An [`AccessToken`] shared between tasks, with single-flight refresh.
///
/// Refreshes are serialized. A caller that asks for a refresh while another
/// one is in flight waits for it and receives its result instead of sending
/// a second request.
///
/// Unlike [`AccessToken::refresh`], the installed token keeps the previous
/// refresh token when the server does not rotate it, so the shared token can
/// be refreshed again.
#[derive(Debug)]
pub struct SharedAccessToken {
    token: Mutex<AccessToken>,
    // Bumped (under the lock) every time the held token is replaced.
    generation: AtomicU64,
}

impl SharedAccessToken {
    /// Shares `token`.
    #[must_use]
    pub fn new(token: AccessToken) -> Self {
        Self {
            token: Mutex::new(token),
            generation: AtomicU64::new(0),
        }
    }

    /// A copy of the currently held token.
    pub async fn current(&self) -> AccessToken {
        self.token.lock().await.clone()
    }

    /// How many times the held token has been replaced.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Installs a token obtained elsewhere.
    pub async fn replace(&self, token: AccessToken) {
        let mut held = self.token.lock().await;
        *held = token;
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Refreshes the held token, or joins a refresh already in flight.
    ///
    /// A caller that joins an in-flight refresh gets that refresh's result;
    /// its own `params` are not sent.
    ///
    /// # Errors
    ///
    /// Returns the [`RefreshError`](crate::token::RefreshError) of the
    /// refresh performed by this call. The held token is unchanged on error.
    pub async fn refresh<C: HttpClient>(
        &self,
        client: &ApiClient<C>,
        params: &RefreshParams,
    ) -> Result<AccessToken, RefreshErrorFor<C>> {
        let seen = self.generation();
        let mut held = self.token.lock().await;

        if self.generation() != seen {
            tracing::debug!("joined a concurrent refresh");
            return Ok(held.clone());
        }

        self.refresh_held(&mut held, client, params).await
    }

    /// Returns the held token, refreshing it first if it expires within
    /// `margin`.
    ///
    /// # Errors
    ///
    /// See [`SharedAccessToken::refresh`].
    pub async fn fresh<C: HttpClient>(
        &self,
        client: &ApiClient<C>,
        margin: Duration,
    ) -> Result<AccessToken, RefreshErrorFor<C>> {
        let mut held = self.token.lock().await;

        if !held.expires_within(margin) {
            return Ok(held.clone());
        }

        tracing::debug!("access token expiring, refreshing");
        self.refresh_held(&mut held, client, &RefreshParams::default())
            .await
    }

    // Callers hold the lock for `held`.
    async fn refresh_held<C: HttpClient>(
        &self,
        held: &mut AccessToken,
        client: &ApiClient<C>,
        params: &RefreshParams,
    ) -> Result<AccessToken, RefreshErrorFor<C>> {
        let refreshed = held
            .refresh(client, params)
            .await?
            .inherit_refresh_token(held);
        *held = refreshed.clone();
        self.generation.fetch_add(1, Ordering::AcqRel);

        Ok(refreshed)
    }
}
