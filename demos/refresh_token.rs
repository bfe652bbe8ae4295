use oauth2_lifecycle::{
    ApiClient, ClientConfig, RefreshParams, TokenKind, prelude::*, secrecy::SecretString,
};
use snafu::prelude::*;

#[snafu::report]
#[tokio::main]
pub async fn main() -> Result<(), snafu::Whatever> {
    let site = std::env::var("SITE").whatever_context("Failed to get SITE")?;
    let client_id = std::env::var("CLIENT_ID").whatever_context("Failed to get CLIENT_ID")?;
    let client_secret = std::env::var("CLIENT_SECRET")
        .map(SecretString::from)
        .whatever_context("Failed to get CLIENT_SECRET")?;
    let username = std::env::var("USERNAME").whatever_context("Failed to get USERNAME")?;
    let password = std::env::var("PASSWORD")
        .map(SecretString::from)
        .whatever_context("Failed to get PASSWORD")?;

    let config = ClientConfig::builder()
        .client_id(client_id)
        .client_secret(client_secret)
        .site(site)
        .build();
    let client = ApiClient::new(config, reqwest::Client::new());

    let token = client
        .exchange_password(&username, &password, ["offline_access"])
        .await
        .whatever_context("Failed to get token")?;
    println!("Token expires at: {:?}", token.expires_at());

    let token = match token.refresh(&client, &RefreshParams::default()).await {
        Ok(refreshed) => refreshed,
        Err(e) if e.is_retryable() => {
            whatever!("Refresh failed, try again later: {e}")
        }
        Err(e) => return Err(e).whatever_context("Failed to refresh token"),
    };
    println!("Refreshed, expires at: {:?}", token.expires_at());

    token
        .revoke(&client, TokenKind::RefreshToken)
        .await
        .whatever_context("Failed to revoke refresh token")?;
    println!("Refresh token revoked");

    Ok(())
}
