//! View Metadata
//!
//! Corresponds to packages/core/src/metadata/view.ts

use serde::{Deserialize, Serialize};

/// Defines how the styles of a component view are applied by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ViewEncapsulation {
    Emulated = 0,
    Native = 1,
    None = 2,
}
