//! Platform shims.
//!
//! Time comes from `std` on native targets and from `web-time` in the
//! browser, and the `MaybeSend*` marker traits drop their `Send`/`Sync`
//! bounds where the platform is single-threaded.

#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
mod imp {
    pub use std::time::{Duration, SystemTime};

    /// Marker trait for types that may be `Send`, depending on platform.
    pub trait MaybeSend: Send {}
    impl<T: Send> MaybeSend for T {}

    /// Marker trait for types that may be `Send + Sync`, depending on platform.
    pub trait MaybeSendSync: Send + Sync {}
    impl<T: Send + Sync> MaybeSendSync for T {}
}

#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
mod imp {
    pub use web_time::{Duration, SystemTime};

    /// Marker trait for types that may be `Send`, depending on platform.
    pub trait MaybeSend {}
    impl<T> MaybeSend for T {}

    /// Marker trait for types that may be `Send + Sync`, depending on platform.
    pub trait MaybeSendSync {}
    impl<T> MaybeSendSync for T {}
}

pub use imp::{Duration, MaybeSend, MaybeSendSync, SystemTime};

/// The current wall-clock time.
#[must_use]
pub fn now() -> SystemTime {
    SystemTime::now()
}
