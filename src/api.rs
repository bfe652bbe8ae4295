//! The authorization server API client.
//!
//! [`ApiClient`] pairs a [`ClientConfig`] with an [`HttpClient`] and knows
//! how to send an authenticated, form-encoded POST to one of the configured
//! endpoints and interpret the `OAuth2` response.

use base64::prelude::*;
use bytes::Bytes;
use http::{
    HeaderValue, Method, Request, StatusCode, Uri,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use secrecy::ExposeSecret as _;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use snafu::prelude::*;

use crate::{
    config::{ClientAuthMethod, ClientConfig, ConfigError},
    http::{HttpClient, HttpResponse},
};

/// The [`ApiError`] produced by a given [`HttpClient`].
pub type ApiErrorFor<C> =
    ApiError<<C as HttpClient>::Error, <<C as HttpClient>::Response as HttpResponse>::Error>;

/// Sends requests to the configured authorization server.
#[derive(Debug, Clone)]
pub struct ApiClient<C: HttpClient> {
    config: ClientConfig,
    http_client: C,
}

impl<C: HttpClient> ApiClient<C> {
    /// Creates a client for `config` that sends requests through `http_client`.
    pub fn new(config: ClientConfig, http_client: C) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying HTTP client.
    pub fn http_client(&self) -> &C {
        &self.http_client
    }

    /// POSTs `form` to `path` and parses the JSON success body as `R`.
    ///
    /// `path` is resolved with [`ClientConfig::endpoint`].
    ///
    /// # Errors
    ///
    /// Fails if the endpoint cannot be resolved, the request cannot be built
    /// or sent, the server answers with a non-success status, or the success
    /// body does not parse as `R`.
    pub async fn post_form<F: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        form: &F,
    ) -> Result<R, ApiErrorFor<C>> {
        let (status, body) = self.send(path, form).await?;

        let parsed: Result<R, HandleResponseError> =
            serde_json::from_slice(&body).context(UnparseableSuccessResponseSnafu {
                status,
                body: String::from_utf8_lossy(&body),
            });

        parsed.context(ResponseSnafu)
    }

    /// POSTs `form` to `path`, discarding the success body.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::post_form`], except the success body is never parsed.
    pub async fn post_form_empty<F: Serialize>(
        &self,
        path: &str,
        form: &F,
    ) -> Result<(), ApiErrorFor<C>> {
        self.send(path, form).await.map(|_| ())
    }

    async fn send<F: Serialize>(
        &self,
        path: &str,
        form: &F,
    ) -> Result<(StatusCode, Bytes), ApiErrorFor<C>> {
        let uri = self.config.endpoint(path).context(EndpointSnafu)?;
        let request = self.build_request(uri, form)?;

        tracing::debug!(method = %request.method(), uri = %request.uri(), "sending OAuth2 request");

        let response = self
            .http_client
            .execute(request)
            .await
            .context(RequestSnafu)?;
        let status = response.status();
        let content_type = if status.is_success() {
            None
        } else {
            response.headers().get(CONTENT_TYPE).cloned()
        };
        let body = response.body().await.context(ResponseBodyReadSnafu)?;

        tracing::debug!(%status, "received OAuth2 response");

        if status.is_success() {
            Ok((status, body))
        } else {
            Err(error_response(status, content_type, &body)).context(ResponseSnafu)
        }
    }

    fn build_request<F: Serialize>(
        &self,
        uri: Uri,
        form: &F,
    ) -> Result<Request<Bytes>, ApiErrorFor<C>> {
        let mut body = serde_html_form::to_string(form).context(SerializeSnafu)?;

        let (mut parts, ()) = Request::new(()).into_parts();
        parts.method = Method::POST;
        parts.uri = uri;
        parts.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        parts
            .headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));

        match self.config.auth_method() {
            ClientAuthMethod::Basic => {
                let header = basic_authorization(
                    self.config.client_id(),
                    self.config.client_secret().map(|s| s.expose_secret()),
                );
                parts.headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&header).context(BadHeaderSnafu)?,
                );
            }
            ClientAuthMethod::RequestBody => {
                let credentials = BodyCredentials {
                    client_id: self.config.client_id(),
                    client_secret: self.config.client_secret().map(|s| s.expose_secret()),
                };
                if !body.is_empty() {
                    body.push('&');
                }
                serde_html_form::push_to_string(&mut body, &credentials)
                    .context(SerializeSnafu)?;
            }
        }

        Ok(Request::from_parts(parts, body.into()))
    }
}

#[derive(Serialize)]
struct BodyCredentials<'a> {
    client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret: Option<&'a str>,
}

/// `Basic` credentials per RFC 6749 §2.3.1: both parts are form-urlencoded
/// before being joined and base64 encoded.
fn basic_authorization(client_id: &str, client_secret: Option<&str>) -> String {
    use url::form_urlencoded::byte_serialize;

    let client_id: String = byte_serialize(client_id.as_bytes()).collect();
    let client_secret: String =
        byte_serialize(client_secret.unwrap_or_default().as_bytes()).collect();
    let credentials = format!("{client_id}:{client_secret}");

    format!("Basic {}", BASE64_STANDARD.encode(credentials.as_bytes()))
}

fn error_response(
    status: StatusCode,
    content_type: Option<HeaderValue>,
    body: &Bytes,
) -> HandleResponseError {
    match serde_json::from_slice::<OAuth2ErrorBody>(body) {
        Ok(error_body) => {
            tracing::warn!(%status, error = %error_body.error, "authorization server returned an OAuth2 error");
            HandleResponseError::OAuth2 {
                body: error_body,
                status,
                content_type,
            }
        }
        Err(source) => {
            tracing::warn!(%status, "authorization server returned an unparseable error response");
            HandleResponseError::UnparseableErrorResponse {
                body: String::from_utf8_lossy(body).into_owned(),
                status,
                content_type,
                source,
            }
        }
    }
}

/// Errors from a call to the authorization server.
#[derive(Debug, Snafu)]
pub enum ApiError<HttpReqErr: crate::Error, HttpRespErr: crate::Error> {
    /// The endpoint could not be resolved from the configuration.
    #[snafu(display("Failed to resolve endpoint"))]
    Endpoint {
        /// The underlying error.
        source: ConfigError,
    },
    /// The form could not be serialized.
    #[snafu(display("Failed to serialize request form"))]
    Serialize {
        /// The underlying error.
        source: serde_html_form::ser::Error,
    },
    /// A computed header value was invalid.
    #[snafu(display("Invalid header value"))]
    BadHeader {
        /// The underlying error.
        source: http::header::InvalidHeaderValue,
    },
    /// The HTTP request failed.
    #[snafu(display("Failed to make HTTP request"))]
    Request {
        /// The transport error.
        source: HttpReqErr,
    },
    /// The response body could not be read.
    #[snafu(display("Failed to read response body"))]
    ResponseBodyRead {
        /// The transport error.
        source: HttpRespErr,
    },
    /// The server responded, but not with a usable success response.
    #[snafu(display("Unexpected response from authorization server"))]
    Response {
        /// The underlying error.
        source: HandleResponseError,
    },
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> ApiError<HttpReqErr, HttpRespErr> {
    /// The `OAuth2` error body, if the server returned one.
    #[must_use]
    pub fn oauth2_error(&self) -> Option<&OAuth2ErrorBody> {
        match self {
            Self::Response {
                source: HandleResponseError::OAuth2 { body, .. },
            } => Some(body),
            _ => None,
        }
    }

    /// The HTTP status of the response, if one was received.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Response { source } => Some(source.status()),
            _ => None,
        }
    }
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> crate::Error
    for ApiError<HttpReqErr, HttpRespErr>
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::Endpoint { .. } | Self::Serialize { .. } | Self::BadHeader { .. } => false,
            Self::Request { source } => source.is_retryable(),
            Self::ResponseBodyRead { source } => source.is_retryable(),
            Self::Response { source } => source.is_retryable(),
        }
    }
}

/// Errors interpreting a response from the authorization server.
#[derive(Debug, Snafu)]
pub enum HandleResponseError {
    /// A non-success status whose body is not an `OAuth2` error.
    #[snafu(display(
        "Failed to parse error response as OAuth2 error: status={status}, content-type={}",
        content_type.as_ref().and_then(|v| v.to_str().ok()).unwrap_or_default()
    ))]
    UnparseableErrorResponse {
        /// The response body.
        body: String,
        /// The response status.
        status: StatusCode,
        /// The response content type.
        content_type: Option<HeaderValue>,
        /// The underlying error.
        source: serde_json::Error,
    },
    /// A success status whose body could not be parsed.
    #[snafu(display("Failed to parse successful response: status={status}"))]
    UnparseableSuccessResponse {
        /// The response body.
        body: String,
        /// The response status.
        status: StatusCode,
        /// The underlying error.
        source: serde_json::Error,
    },
    /// The server returned an `OAuth2` error.
    #[snafu(display("OAuth2 request failed: {} (status={status})", body.error))]
    OAuth2 {
        /// The error body.
        body: OAuth2ErrorBody,
        /// The response status.
        status: StatusCode,
        /// The response content type.
        content_type: Option<HeaderValue>,
    },
}

impl HandleResponseError {
    /// The HTTP status of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnparseableErrorResponse { status, .. }
            | Self::UnparseableSuccessResponse { status, .. }
            | Self::OAuth2 { status, .. } => *status,
        }
    }
}

impl crate::Error for HandleResponseError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::UnparseableErrorResponse { status, .. } | Self::OAuth2 { status, .. } => {
                status.is_server_error()
            }
            Self::UnparseableSuccessResponse { .. } => false,
        }
    }
}

/// An `OAuth2` error response (RFC 6749 §5.2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuth2ErrorBody {
    /// The error code, e.g. `invalid_grant`.
    pub error: String,
    /// Human-readable detail.
    pub error_description: Option<String>,
    /// A page describing the error.
    pub error_uri: Option<String>,
}
