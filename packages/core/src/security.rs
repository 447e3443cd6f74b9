//! Security
//!
//! Corresponds to packages/core/src/security.ts

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A SecurityContext marks a location that has dangerous security implications.
/// Bindings into such a location must be sanitized before they reach the
/// renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, PartialOrd, Ord)]
#[repr(u8)]
pub enum SecurityContext {
    None = 0,
    Html = 1,
    Style = 2,
    Script = 3,
    Url = 4,
    ResourceUrl = 5,
}

/// Sanitizer used by the view engine for element property bindings that carry
/// a `SecurityContext`. The root data owns one shared instance.
pub trait Sanitizer {
    fn sanitize(&self, context: SecurityContext, value: &Value) -> Value;
}

/// Sanitizer that passes every value through unchanged. Useful for tests and
/// trusted render targets (e.g. server side rendering into a string buffer).
#[derive(Debug, Default)]
pub struct NoopSanitizer;

impl Sanitizer for NoopSanitizer {
    fn sanitize(&self, _context: SecurityContext, value: &Value) -> Value {
        value.clone()
    }
}
