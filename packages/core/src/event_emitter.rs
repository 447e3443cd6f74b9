//! EventEmitter
//!
//! Corresponds to packages/core/src/event_emitter.ts
//!
//! Synchronous-only: the view engine is single-threaded and every emission is
//! delivered on the calling thread before `emit` returns.

use crate::value::Value;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener = Rc<dyn Fn(&Value)>;

#[derive(Default)]
struct EmitterState {
    next_id: usize,
    listeners: Vec<(usize, Listener)>,
}

/// Use by directives to emit custom events. Directive outputs declared in a
/// `directive_def` are subscribed by the view instantiator; the resulting
/// unsubscribe closures are owned by the view's disposables.
#[derive(Clone, Default)]
pub struct EventEmitter {
    state: Rc<RefCell<EmitterState>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: &Value) {
        // Snapshot so listeners may unsubscribe re-entrantly.
        let listeners: Vec<Listener> = self
            .state
            .borrow()
            .listeners
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&Value) + 'static) -> Subscription {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push((id, Rc::new(listener)));
        Subscription {
            emitter: Rc::downgrade(&self.state),
            id,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

/// Handle returned by `subscribe`; dropping it does nothing, unsubscription is
/// always explicit (the view stores it as a disposable).
pub struct Subscription {
    emitter: Weak<RefCell<EmitterState>>,
    id: usize,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if let Some(state) = self.emitter.upgrade() {
            state.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
