//! Imports for syntax extensions.

pub use crate::Error as _;
