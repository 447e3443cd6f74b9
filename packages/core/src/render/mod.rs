//! Render Abstraction
//!
//! Corresponds to packages/core/src/render/

pub mod api;

pub use api::*;
