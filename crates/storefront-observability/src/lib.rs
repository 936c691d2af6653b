//! Observability for the storefront.
//!
//! Library crates log through `tracing` macros; binaries call [`init`] once
//! at startup to choose the format and level.

mod logging;

pub use logging::*;
