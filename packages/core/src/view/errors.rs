//! View Engine Errors
//!
//! Corresponds to packages/core/src/view/errors.ts

use std::fmt;

pub type Result<T> = std::result::Result<T, ViewError>;

/// Every failure the view engine can surface. All of them are synchronous and
/// propagate to the immediate caller; there are no retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// A malformed view definition: structural constraints violated at build
    /// time. Never recoverable; meant to be caught during development.
    IllegalDefinition { message: String },
    /// A binding changed during a check-no-changes pass. Marks the owning
    /// view as errored at the detection site.
    ExpressionChanged {
        node_index: usize,
        binding_index: usize,
        old_value: String,
        new_value: String,
        first_check: bool,
    },
    /// No provider anywhere up the view chain and the root injector did not
    /// resolve the token either.
    DependencyNotFound { token: String },
    /// Change detection or event dispatch was entered on a destroyed view.
    /// Distinct from destruction itself, which is an idempotent no-op.
    ViewDestroyed { action: String },
}

impl ViewError {
    pub fn illegal_definition(message: impl Into<String>) -> Self {
        ViewError::IllegalDefinition {
            message: message.into(),
        }
    }

    pub fn is_expression_changed(&self) -> bool {
        matches!(self, ViewError::ExpressionChanged { .. })
    }
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::IllegalDefinition { message } => {
                write!(f, "Illegal State: {}", message)
            }
            ViewError::ExpressionChanged {
                node_index,
                binding_index,
                old_value,
                new_value,
                first_check,
            } => {
                write!(
                    f,
                    "ExpressionChangedAfterItHasBeenCheckedError: Expression at node {} \
                     (binding {}) has changed after it was checked. Previous value: '{}'. \
                     Current value: '{}'.",
                    node_index, binding_index, old_value, new_value
                )?;
                if *first_check {
                    write!(
                        f,
                        " It seems like the view has been created after its parent and its \
                         children have been dirty checked."
                    )?;
                }
                Ok(())
            }
            ViewError::DependencyNotFound { token } => {
                write!(f, "No provider for {}!", token)
            }
            ViewError::ViewDestroyed { action } => {
                write!(
                    f,
                    "ViewDestroyedError: Attempt to use a destroyed view: {}",
                    action
                )
            }
        }
    }
}

impl std::error::Error for ViewError {}
