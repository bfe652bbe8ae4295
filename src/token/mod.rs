//! Access tokens and their lifecycle.
//!
//! [`AccessToken`] wraps the [`TokenPayload`] returned by the token endpoint
//! and tracks its expiry. It can refresh itself (producing a new
//! [`AccessToken`]) and revoke the tokens it holds. [`SharedAccessToken`]
//! adds single-flight refresh for tokens shared between tasks.

mod access_token;
mod kind;
mod payload;
mod refresh;
mod revocation;
mod secret;
mod shared;

pub use access_token::AccessToken;
pub use kind::{TokenKind, UnknownTokenKind};
pub use payload::{PayloadError, TokenPayload};
pub use refresh::{RefreshError, RefreshErrorFor, RefreshParams, RefreshParamsBuilder};
pub use revocation::{RevocationError, RevocationErrorFor};
pub use secret::SecretToken;
pub use shared::SharedAccessToken;
