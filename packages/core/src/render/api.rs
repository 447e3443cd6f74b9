//! Renderer API
//!
//! Corresponds to packages/core/src/render/api.ts
//!
//! The view engine never touches a display surface directly; every create,
//! attach, attribute, style and listener operation goes through this fixed
//! synchronous primitive set. Browser DOM, server-side string rendering and
//! web-worker proxies are all implementations of this trait.

use crate::metadata::ViewEncapsulation;
use crate::value::Value;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Opaque handle to a node owned by a renderer. Compared by identity.
#[derive(Clone)]
pub struct RenderNode(Rc<dyn Any>);

impl RenderNode {
    pub fn new(node: Rc<dyn Any>) -> Self {
        RenderNode(node)
    }

    pub fn as_any(&self) -> &dyn Any {
        &*self.0
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &RenderNode) -> bool {
        // Compare the data pointers only; `Rc<dyn Any>` fat-pointer equality
        // would also compare vtables.
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const u8,
            Rc::as_ptr(&other.0) as *const u8,
        )
    }
}

impl fmt::Debug for RenderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderNode({:p})", Rc::as_ptr(&self.0))
    }
}

/// Callback invoked by the renderer when a listened event fires. Returning
/// `false` requests `preventDefault`.
pub type EventCallback = Box<dyn Fn(&Value) -> bool>;

/// Cleanup closure registered with a view; all of a view's disposables run
/// exactly once during destruction.
pub type DisposableFn = Box<dyn FnMut()>;

/// Describes a renderer configuration scoped to one component type
/// (its styles and encapsulation mode).
#[derive(Debug, Clone)]
pub struct RendererType {
    pub id: String,
    pub encapsulation: ViewEncapsulation,
    pub styles: Vec<String>,
}

pub trait Renderer {
    fn create_element(&self, name: &str) -> RenderNode;
    fn create_comment(&self, value: &str) -> RenderNode;
    fn create_text(&self, value: &str) -> RenderNode;

    fn append_child(&self, parent: &RenderNode, new_child: &RenderNode);
    fn insert_before(&self, parent: &RenderNode, new_child: &RenderNode, ref_child: &RenderNode);
    fn remove_child(&self, parent: &RenderNode, old_child: &RenderNode);
    fn select_root_element(&self, selector: &str) -> RenderNode;

    fn parent_node(&self, node: &RenderNode) -> Option<RenderNode>;
    fn next_sibling(&self, node: &RenderNode) -> Option<RenderNode>;

    fn set_attribute(&self, el: &RenderNode, name: &str, value: &str);
    fn remove_attribute(&self, el: &RenderNode, name: &str);
    fn add_class(&self, el: &RenderNode, name: &str);
    fn remove_class(&self, el: &RenderNode, name: &str);
    fn set_style(&self, el: &RenderNode, style: &str, value: &str);
    fn remove_style(&self, el: &RenderNode, style: &str);
    fn set_property(&self, el: &RenderNode, name: &str, value: &Value);
    /// Update the text of a text or comment node.
    fn set_value(&self, node: &RenderNode, value: &str);

    fn listen(&self, target: &RenderNode, event_name: &str, callback: EventCallback)
        -> DisposableFn;
    /// Listen on a named global target ("window", "document", "body").
    fn listen_global(&self, target: &str, event_name: &str, callback: EventCallback)
        -> DisposableFn;

    /// Whether this renderer wants per-node destruction. When `false`, the
    /// destruction coordinator relies on subtree removal instead of walking
    /// every element/text node.
    fn supports_destroy_node(&self) -> bool {
        false
    }
    fn destroy_node(&self, _node: &RenderNode) {}

    /// Release view-scoped resources (component styles, shadow roots).
    fn destroy(&self) {}
}

pub trait RendererFactory {
    fn create_renderer(
        &self,
        host_element: Option<&RenderNode>,
        renderer_type: Option<&RendererType>,
    ) -> Rc<dyn Renderer>;
}
