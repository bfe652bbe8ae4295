use secrecy::{ExposeSecret, SecretString, zeroize::Zeroize};
use serde::{Deserialize, Serialize};

/// An opaque token string (access or refresh token).
///
/// `Debug` output is redacted; use [`SecretToken::expose_token`] to read the
/// value.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretToken(SecretString);

impl SecretToken {
    /// Exposes the token as a string.
    #[must_use]
    pub fn expose_token(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Serialize for SecretToken {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.expose_token())
    }
}

impl PartialEq for SecretToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose_token() == other.expose_token()
    }
}

impl Eq for SecretToken {}

impl Zeroize for SecretToken {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl From<&str> for SecretToken {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for SecretToken {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl From<SecretString> for SecretToken {
    fn from(value: SecretString) -> Self {
        Self(value)
    }
}
