//! Directive Instance Contract
//!
//! Corresponds to packages/core/src/metadata/lifecycle_hooks.ts, folded into a
//! single runtime trait: where TypeScript dispatches on dynamically attached
//! `ngOnInit`/`ngOnChanges`/... methods and assigns inputs by property name,
//! the Rust runtime goes through this trait. Which hooks are actually invoked
//! is driven by the definition's `NodeFlags`, not by trait inspection, so the
//! default no-op bodies are never a correctness hazard.

use crate::change_detection::SimpleChanges;
use crate::event_emitter::EventEmitter;
use crate::value::Value;
use std::any::Any;

/// Runtime contract for directive, component and class-provider instances.
///
/// `set_input` replaces the dynamic `instance[propName] = value` assignment of
/// the original; `output` replaces the `instance[propName].subscribe(...)`
/// lookup for declared outputs.
pub trait Directive: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Write a bound input. Called only when the dirty check reported a change.
    fn set_input(&mut self, _name: &str, _value: &Value) {}

    /// Look up a declared output by property name.
    fn output(&self, _name: &str) -> Option<EventEmitter> {
        None
    }

    fn ng_on_changes(&mut self, _changes: &SimpleChanges) {}
    fn ng_on_init(&mut self) {}
    fn ng_do_check(&mut self) {}
    fn ng_after_content_init(&mut self) {}
    fn ng_after_content_checked(&mut self) {}
    fn ng_after_view_init(&mut self) {}
    fn ng_after_view_checked(&mut self) {}
    fn ng_on_destroy(&mut self) {}
}
