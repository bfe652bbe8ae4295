//! A small `OAuth2` client: authorization URLs, grant exchange, and an
//! access token wrapper that tracks expiry and can refresh or revoke itself.

#![forbid(unsafe_code)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod config;
mod error;
pub mod grant;
pub mod http;
pub mod platform;
pub mod prelude;
pub mod token;

pub use api::{ApiClient, ApiError};
pub use config::{ClientAuthMethod, ClientConfig};
pub use error::Error;
pub use grant::AuthorizeParams;
pub use token::{AccessToken, RefreshParams, SharedAccessToken, TokenKind, TokenPayload};

/// Documentation
pub mod _documentation {
    #[doc = include_str!("../README.md")]
    mod readme {}
    #[doc = include_str!("../CHANGELOG.md")]
    pub mod changelog {}
}

/// Re-export of parts of the `secrecy` crate.
pub mod secrecy {
    pub use ::secrecy::{ExposeSecret, SecretString};
}
