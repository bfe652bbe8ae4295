use std::fmt;

use bon::Builder;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use snafu::prelude::*;

use crate::token::SecretToken;

/// The token payload returned by the token endpoint (RFC 6749 §5.1).
///
/// Only `access_token` is required. Fields this type does not model are kept
/// and can be read with [`TokenPayload::get_extra`].
#[derive(Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct TokenPayload {
    /// The access token.
    #[builder(into)]
    pub access_token: SecretToken,
    /// The token type, usually `Bearer`.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Lifetime of the access token in seconds.
    ///
    /// Numeric strings are accepted. Zero is treated as absent, meaning the
    /// token never expires.
    #[serde(
        default,
        deserialize_with = "deserialize_expires_in",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_in: Option<u64>,
    /// The refresh token.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<SecretToken>,
    /// The granted scope, if the server reports it.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Other fields received from the token endpoint.
    #[builder(default)]
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TokenPayload {
    /// Parses a payload from raw JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::InvalidJson`] if `bytes` is not JSON, and the
    /// errors of [`TokenPayload::from_value`] otherwise.
    pub fn from_json(bytes: &[u8]) -> Result<Self, PayloadError> {
        let value = serde_json::from_slice::<Value>(bytes).context(InvalidJsonSnafu)?;
        Self::from_value(value)
    }

    /// Interprets an already-parsed JSON value as a payload.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::NotAnObject`] if `value` is not a JSON object,
    /// [`PayloadError::MissingAccessToken`] if it has no (non-null)
    /// `access_token`, and [`PayloadError::Malformed`] if any known field
    /// has the wrong shape.
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return NotAnObjectSnafu {
                    found: json_kind(&other),
                }
                .fail();
            }
        };

        ensure!(
            map.get("access_token").is_some_and(|v| !v.is_null()),
            MissingAccessTokenSnafu
        );

        serde_json::from_value(Value::Object(map)).context(MalformedSnafu)
    }

    /// Gets a value from the fields this type does not model.
    #[must_use]
    pub fn get_extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

impl fmt::Debug for TokenPayload {
    // Extra fields may carry credentials such as `id_token`, so only their
    // names are shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPayload")
            .field("access_token", &self.access_token)
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token)
            .field("scope", &self.scope)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Seconds {
    Integer(u64),
    Float(f64),
    Text(String),
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn deserialize_expires_in<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    use serde::de::Error as _;

    let seconds = match Option::<Seconds>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Seconds::Integer(seconds)) => seconds,
        Some(Seconds::Float(seconds)) if seconds.is_finite() && seconds >= 0.0 => seconds as u64,
        Some(Seconds::Float(seconds)) => {
            return Err(D::Error::custom(format!(
                "expires_in must be a non-negative number of seconds, got {seconds}"
            )));
        }
        Some(Seconds::Text(text)) => text.trim().parse::<u64>().map_err(|_| {
            D::Error::custom(format!(
                "expires_in must be a non-negative number of seconds, got {text:?}"
            ))
        })?,
    };

    Ok((seconds > 0).then_some(seconds))
}

/// Errors interpreting raw input as a [`TokenPayload`].
#[derive(Debug, Snafu)]
pub enum PayloadError {
    /// The input was not valid JSON.
    #[snafu(display("Token payload is not valid JSON"))]
    InvalidJson {
        /// The underlying error.
        source: serde_json::Error,
    },
    /// The input was JSON, but not an object.
    #[snafu(display("Token payload must be a JSON object, found {found}"))]
    NotAnObject {
        /// The JSON type that was found instead.
        found: &'static str,
    },
    /// The object has no `access_token`.
    #[snafu(display("Token payload has no access_token"))]
    MissingAccessToken,
    /// A known field had the wrong type.
    #[snafu(display("Token payload is malformed"))]
    Malformed {
        /// The underlying error.
        source: serde_json::Error,
    },
}

impl crate::Error for PayloadError {
    fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_minimal_payload() {
        let payload = TokenPayload::from_value(json!({"access_token": "A"})).unwrap();

        assert_eq!(payload.access_token.expose_token(), "A");
        assert!(payload.refresh_token.is_none());
        assert!(payload.expires_in.is_none());
        assert!(payload.token_type.is_none());
    }

    #[test]
    fn test_full_payload_keeps_extra_fields() {
        let payload = TokenPayload::from_json(
            br#"{
                "access_token": "A",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "B",
                "scope": "read write",
                "id_token": "eyJ..."
            }"#,
        )
        .unwrap();

        assert_eq!(payload.token_type.as_deref(), Some("Bearer"));
        assert_eq!(payload.expires_in, Some(3600));
        assert_eq!(
            payload.refresh_token.as_ref().map(SecretToken::expose_token),
            Some("B")
        );
        assert_eq!(payload.scope.as_deref(), Some("read write"));
        assert_eq!(payload.get_extra("id_token"), Some(&json!("eyJ...")));
        assert_eq!(payload.get_extra("expires_in"), None);
    }

    #[test]
    fn test_expires_in_variants() {
        let parse = |v: Value| {
            TokenPayload::from_value(json!({"access_token": "A", "expires_in": v}))
                .map(|p| p.expires_in)
        };

        assert_eq!(parse(json!("120")).unwrap(), Some(120));
        assert_eq!(parse(json!(59.9)).unwrap(), Some(59));
        assert_eq!(parse(json!(0)).unwrap(), None);
        assert_eq!(parse(Value::Null).unwrap(), None);
        assert!(matches!(parse(json!(-5)), Err(PayloadError::Malformed { .. })));
        assert!(matches!(parse(json!("soon")), Err(PayloadError::Malformed { .. })));
    }

    #[test]
    fn test_non_object_inputs_are_rejected() {
        for (value, kind) in [
            (Value::Null, "null"),
            (json!("A"), "string"),
            (json!(["A"]), "array"),
            (json!(42), "number"),
        ] {
            assert!(matches!(
                TokenPayload::from_value(value),
                Err(PayloadError::NotAnObject { found }) if found == kind
            ));
        }
    }

    #[test]
    fn test_missing_access_token() {
        assert!(matches!(
            TokenPayload::from_value(json!({"refresh_token": "B"})),
            Err(PayloadError::MissingAccessToken)
        ));
        assert!(matches!(
            TokenPayload::from_value(json!({"access_token": null})),
            Err(PayloadError::MissingAccessToken)
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            TokenPayload::from_json(b"{nope"),
            Err(PayloadError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_serialize_exposes_token_values() {
        let payload = TokenPayload::builder()
            .access_token("A")
            .refresh_token("B")
            .expires_in(60)
            .build();

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"access_token": "A", "refresh_token": "B", "expires_in": 60})
        );
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let payload = TokenPayload::builder().access_token("super-secret").build();

        assert!(!format!("{payload:?}").contains("super-secret"));
    }

    #[test]
    fn test_debug_shows_only_extra_field_names() {
        let payload = TokenPayload::from_value(json!({
            "access_token": "A",
            "id_token": "eyJhbGciOiJSUzI1NiJ9.secret"
        }))
        .unwrap();

        let debug = format!("{payload:?}");
        assert!(debug.contains("id_token"));
        assert!(!debug.contains("eyJhbGciOiJSUzI1NiJ9.secret"));
    }
}
