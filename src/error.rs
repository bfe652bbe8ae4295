//! The crate-wide [`Error`] trait.
//!
//! Every error returned by this crate implements [`Error`], which adds a
//! retryability hint on top of [`std::error::Error`]. The crate itself never
//! retries; the hint is for callers that want to layer their own policy.

use std::convert::Infallible;

use snafu::AsErrorSource;

use crate::platform::MaybeSendSync;

/// Errors that may occur in the library.
pub trait Error: std::error::Error + AsErrorSource + MaybeSendSync + 'static {
    /// If true, the same request may succeed when issued again.
    fn is_retryable(&self) -> bool;
}

impl Error for Infallible {
    fn is_retryable(&self) -> bool {
        false
    }
}
