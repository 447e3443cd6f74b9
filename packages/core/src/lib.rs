//! Runtime view engine: compiled template definitions, view instantiation,
//! hierarchical dependency resolution, two-phase change detection, lifecycle
//! hook scheduling and view destruction.

pub mod change_detection;
pub mod di;
pub mod directive;
pub mod event_emitter;
pub mod metadata;
pub mod render;
pub mod security;
pub mod value;
pub mod view;

pub use change_detection::{
    ChangeDetectionStrategy, PipeTransform, SimpleChange, SimpleChanges,
};
pub use di::{DepDef, DepFlags, Injector, NullInjector, Token};
pub use directive::Directive;
pub use event_emitter::{EventEmitter, Subscription};
pub use metadata::ViewEncapsulation;
pub use render::api::{
    DisposableFn, EventCallback, RenderNode, Renderer, RendererFactory, RendererType,
};
pub use security::{NoopSanitizer, Sanitizer, SecurityContext};
pub use value::{loose_identical, Value};
