//! Change Detection
//!
//! Corresponds to packages/core/src/change_detection/change_detection.ts

use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Describes when change detection runs for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChangeDetectionStrategy {
    OnPush = 0,
    Default = 1,
}

/// Represents a basic change from a previous to a new value for a single
/// directive input.
#[derive(Debug, Clone)]
pub struct SimpleChange {
    pub previous_value: Value,
    pub current_value: Value,
    pub first_change: bool,
}

impl SimpleChange {
    pub fn new(previous_value: Value, current_value: Value, first_change: bool) -> Self {
        Self {
            previous_value,
            current_value,
            first_change,
        }
    }

    pub fn is_first_change(&self) -> bool {
        self.first_change
    }
}

/// Map of changed input names (non-minified) to their change records,
/// accumulated over one check pass and handed to `ng_on_changes` at most once.
pub type SimpleChanges = IndexMap<String, SimpleChange>;

/// A pipe transforms input values to output values, for rendering inside a
/// pure expression. Pure pipe calls are memoized by the pure-expression node
/// hosting them and only re-run when one of the arguments changes.
pub trait PipeTransform {
    fn transform(&self, args: &[Value]) -> Value;
}
