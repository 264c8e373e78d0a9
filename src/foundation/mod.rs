//! Shared value types, the error taxonomy and small pixel-math helpers.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
