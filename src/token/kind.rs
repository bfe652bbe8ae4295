use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// Which of the held tokens an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// The access token.
    AccessToken,
    /// The refresh token.
    RefreshToken,
}

impl TokenKind {
    /// The `token_type_hint` value defined in RFC 7009 §2.1.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = UnknownTokenKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access_token" => Ok(Self::AccessToken),
            "refresh_token" => Ok(Self::RefreshToken),
            other => UnknownTokenKindSnafu { hint: other }.fail(),
        }
    }
}

/// A token type hint other than `access_token` or `refresh_token`.
#[derive(Debug, Snafu)]
#[snafu(display("Unknown token type hint: {hint:?}"))]
pub struct UnknownTokenKind {
    hint: String,
}

impl crate::Error for UnknownTokenKind {
    fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_hints() {
        assert_eq!(
            "access_token".parse::<TokenKind>().unwrap(),
            TokenKind::AccessToken
        );
        assert_eq!(
            "refresh_token".parse::<TokenKind>().unwrap(),
            TokenKind::RefreshToken
        );
    }

    #[test]
    fn test_unknown_hint_is_an_error() {
        let err = "anything-else".parse::<TokenKind>().unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Unknown token type hint: "anything-else""#
        );
        assert!("".parse::<TokenKind>().is_err());
        assert!("Access_Token".parse::<TokenKind>().is_err());
    }

    #[test]
    fn test_display_matches_hint() {
        assert_eq!(TokenKind::AccessToken.to_string(), "access_token");
        assert_eq!(TokenKind::RefreshToken.to_string(), "refresh_token");
    }
}
