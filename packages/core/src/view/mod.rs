//! View Engine
//!
//! Corresponds to packages/core/src/view/index.ts
//!
//! The runtime half of the framework: compiled view definitions are built
//! with the `*_def` constructors, instantiated into live views, change
//! detected in a fixed two-phase order and destroyed in reverse.

pub mod element;
pub mod errors;
pub mod ng_content;
pub mod provider;
pub mod pure_expression;
pub mod query;
pub mod refs;
pub mod text;
pub mod types;
pub mod util;
pub mod view;
pub mod view_attach;

pub use element::{anchor_def, element_def};
pub use errors::{Result, ViewError};
pub use ng_content::ng_content_def;
pub use provider::{directive_def, pipe_def, provider_def, resolve_dep};
pub use pure_expression::{pure_array_def, pure_object_def, pure_pipe_def};
pub use query::{query_def, QueryList};
pub use refs::{ElementRef, TemplateRef, ViewContainerRef, ViewInjector, ViewRef};
pub use text::text_def;
pub use types::*;
pub use util::{root_render_nodes, visit_root_render_nodes};
pub use view::{
    check_and_update_view, check_no_changes_view, create_embedded_view, create_root_data,
    create_root_view, destroy_view, view_def,
};
pub use view_attach::{attach_embedded_view, detach_embedded_view, move_embedded_view};
