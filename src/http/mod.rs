//! The transport seam.
//!
//! The library never talks to the network directly. Every call to the
//! authorization server is an [`http::Request`] handed to a user-supplied
//! [`HttpClient`], so any HTTP stack (or a test double) can sit underneath.

#[cfg(test)]
pub(crate) mod mock;
#[cfg(all(not(target_arch = "wasm32"), feature = "http-client-reqwest"))]
mod reqwest_0_13;

use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode};

use crate::platform::{MaybeSend, MaybeSendSync};

/// Executes requests against the authorization server.
pub trait HttpClient: MaybeSendSync {
    /// The error returned when a request could not be completed.
    type Error: crate::Error;

    /// The response produced by a completed request.
    type Response: HttpResponse;

    /// Sends `request` and resolves to the server's response.
    ///
    /// Timeouts and cancellation are the implementation's concern.
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + MaybeSend;
}

/// A response returned by an [`HttpClient`].
pub trait HttpResponse: MaybeSendSync {
    /// The error returned when the body could not be read.
    type Error: crate::Error;

    /// The HTTP status code.
    fn status(&self) -> StatusCode;

    /// The response headers.
    fn headers(&self) -> HeaderMap;

    /// Consumes the response, reading the full body.
    fn body(self) -> impl Future<Output = Result<Bytes, Self::Error>> + MaybeSend;
}
