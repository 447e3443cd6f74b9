//! View Refs
//!
//! Corresponds to packages/core/src/view/refs.ts
//!
//! The user-facing handles handed out by the dependency resolver and by
//! queries. All of them hold the view weakly: a ref kept alive after its view
//! tree is gone degrades to a no-op instead of keeping the tree alive.

use crate::di::{DepDef, Injector, Token};
use crate::render::api::RenderNode;
use crate::value::Value;
use crate::view::errors::{Result, ViewError};
use crate::view::provider::resolve_dep;
use crate::view::types::{as_element_data, View, ViewData, ViewState};
use crate::view::util::mark_parent_views_for_check;
use crate::view::view::{check_and_update_view, check_no_changes_view, destroy_view};
use crate::view::view_attach::{attach_embedded_view, detach_embedded_view, move_embedded_view};
use std::rc::{Rc, Weak};

/// Handle to the render element backing an element node.
#[derive(Clone)]
pub struct ElementRef {
    native_element: RenderNode,
}

impl ElementRef {
    pub fn new(native_element: RenderNode) -> Self {
        ElementRef { native_element }
    }

    pub fn native_element(&self) -> &RenderNode {
        &self.native_element
    }

    pub fn loose_eq(&self, other: &ElementRef) -> bool {
        self.native_element.ptr_eq(&other.native_element)
    }
}

/// Handle to an anchor node carrying a template, from which embedded views
/// can be stamped out.
#[derive(Clone)]
pub struct TemplateRef {
    view: Weak<ViewData>,
    anchor_index: usize,
}

pub fn create_template_ref(view: &View, anchor_index: usize) -> TemplateRef {
    TemplateRef {
        view: Rc::downgrade(view),
        anchor_index,
    }
}

impl TemplateRef {
    /// Instantiates the template into a detached embedded view; attachment is
    /// the view container's job. The returned ref owns the view until a
    /// container takes it.
    pub fn create_embedded_view(&self, context: Value) -> Result<ViewRef> {
        let view = self.upgrade()?;
        let def = &view.def.nodes[self.anchor_index];
        let embedded =
            crate::view::view::create_embedded_view(&view, self.anchor_index, def, context)?;
        Ok(ViewRef::owning(embedded))
    }

    pub fn element_ref(&self) -> Option<ElementRef> {
        let view = self.view.upgrade()?;
        let anchor = as_element_data(&view, self.anchor_index).render_element.clone();
        Some(ElementRef::new(anchor))
    }

    fn upgrade(&self) -> Result<View> {
        self.view.upgrade().ok_or_else(|| ViewError::ViewDestroyed {
            action: "createEmbeddedView".to_string(),
        })
    }

    pub fn loose_eq(&self, other: &TemplateRef) -> bool {
        Weak::ptr_eq(&self.view, &other.view) && self.anchor_index == other.anchor_index
    }
}

/// Handle to the embedded-view container anchored at an element node.
#[derive(Clone)]
pub struct ViewContainerRef {
    view: Weak<ViewData>,
    anchor_index: usize,
}

pub fn create_view_container_ref(view: &View, anchor_index: usize) -> ViewContainerRef {
    ViewContainerRef {
        view: Rc::downgrade(view),
        anchor_index,
    }
}

impl ViewContainerRef {
    pub fn element(&self) -> Option<ElementRef> {
        let view = self.view.upgrade()?;
        let anchor = as_element_data(&view, self.anchor_index).render_element.clone();
        Some(ElementRef::new(anchor))
    }

    pub fn len(&self) -> usize {
        match self.view.upgrade() {
            Some(view) => as_element_data(&view, self.anchor_index).embedded_views.len(),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<ViewRef> {
        let view = self.view.upgrade()?;
        let embedded = as_element_data(&view, self.anchor_index)
            .embedded_views
            .get(index)
            .cloned()?;
        Some(ViewRef::new(&embedded))
    }

    /// Stamps out `template` and inserts the new view at `index` (or at the
    /// end).
    pub fn create_embedded_view(
        &self,
        template: &TemplateRef,
        context: Value,
        index: Option<usize>,
    ) -> Result<ViewRef> {
        let view_ref = template.create_embedded_view(context)?;
        self.insert(&view_ref, index)?;
        Ok(view_ref)
    }

    pub fn insert(&self, view_ref: &ViewRef, index: Option<usize>) -> Result<()> {
        let view = self.upgrade("insert")?;
        let embedded = view_ref.upgrade("insert")?;
        attach_embedded_view(&view, self.anchor_index, index, &embedded);
        Ok(())
    }

    /// Detaches the view at `index` (or the last one) without destroying it.
    /// Ownership moves from the container to the returned ref.
    pub fn detach(&self, index: Option<usize>) -> Result<Option<ViewRef>> {
        let view = self.upgrade("detach")?;
        Ok(detach_embedded_view(&view, self.anchor_index, index).map(ViewRef::owning))
    }

    pub fn move_view(&self, view_ref: &ViewRef, new_index: usize) -> Result<()> {
        let view = self.upgrade("move")?;
        let embedded = view_ref.upgrade("move")?;
        let old_index = {
            as_element_data(&view, self.anchor_index)
                .embedded_views
                .iter()
                .position(|v| Rc::ptr_eq(v, &embedded))
        };
        match old_index {
            Some(old_index) => {
                move_embedded_view(&view, self.anchor_index, old_index, new_index);
                Ok(())
            }
            None => Err(ViewError::illegal_definition(
                "view to move is not attached to this container",
            )),
        }
    }

    pub fn index_of(&self, view_ref: &ViewRef) -> Option<usize> {
        let view = self.view.upgrade()?;
        let embedded = view_ref.view()?;
        let views: Vec<View> = as_element_data(&view, self.anchor_index).embedded_views.clone();
        views.iter().position(|v| Rc::ptr_eq(v, &embedded))
    }

    /// Detaches and destroys the view at `index` (or the last one).
    pub fn remove(&self, index: Option<usize>) -> Result<()> {
        let view = self.upgrade("remove")?;
        if let Some(detached) = detach_embedded_view(&view, self.anchor_index, index) {
            destroy_view(&detached);
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let view = self.upgrade("clear")?;
        loop {
            let len = as_element_data(&view, self.anchor_index).embedded_views.len();
            if len == 0 {
                break;
            }
            if let Some(detached) = detach_embedded_view(&view, self.anchor_index, Some(len - 1)) {
                destroy_view(&detached);
            }
        }
        Ok(())
    }

    fn upgrade(&self, action: &str) -> Result<View> {
        self.view.upgrade().ok_or_else(|| ViewError::ViewDestroyed {
            action: action.to_string(),
        })
    }

    pub fn loose_eq(&self, other: &ViewContainerRef) -> bool {
        Weak::ptr_eq(&self.view, &other.view) && self.anchor_index == other.anchor_index
    }
}

/// The view behind a `ViewRef`. Ownership of a view lives either in its
/// parent's node data (component views), in an anchor's container (attached
/// embedded views) or in an owning ref (freshly created or detached embedded
/// views); change-detector refs handed out through DI stay weak so directive
/// instances never keep their own view tree alive.
#[derive(Clone)]
enum ViewHandle {
    Strong(View),
    Weak(Weak<ViewData>),
}

/// Handle to a view; doubles as its change detector.
#[derive(Clone)]
pub struct ViewRef {
    handle: ViewHandle,
}

impl ViewRef {
    pub fn new(view: &View) -> Self {
        ViewRef {
            handle: ViewHandle::Weak(Rc::downgrade(view)),
        }
    }

    /// Ref that owns the view. Used for views no container holds yet.
    pub fn owning(view: View) -> Self {
        ViewRef {
            handle: ViewHandle::Strong(view),
        }
    }

    fn view(&self) -> Option<View> {
        match &self.handle {
            ViewHandle::Strong(view) => Some(view.clone()),
            ViewHandle::Weak(weak) => weak.upgrade(),
        }
    }

    /// Re-arms checks on every `OnPush` ancestor so the next detection pass
    /// descends into this view.
    pub fn mark_for_check(&self) {
        if let Some(view) = self.view() {
            mark_parent_views_for_check(&view);
        }
    }

    /// Takes the view out of regular detection passes until `reattach`.
    pub fn detach(&self) {
        if let Some(view) = self.view() {
            view.clear_state(ViewState::CHECKS_ENABLED);
        }
    }

    pub fn reattach(&self) {
        if let Some(view) = self.view() {
            view.set_state(ViewState::CHECKS_ENABLED);
        }
    }

    pub fn detect_changes(&self) -> Result<()> {
        let view = self.upgrade("detectChanges")?;
        check_and_update_view(&view)
    }

    pub fn check_no_changes(&self) -> Result<()> {
        let view = self.upgrade("checkNoChanges")?;
        check_no_changes_view(&view)
    }

    pub fn destroy(&self) {
        if let Some(view) = self.view() {
            destroy_view(&view);
        }
    }

    pub fn destroyed(&self) -> bool {
        match self.view() {
            Some(view) => view.state().contains(ViewState::DESTROYED),
            None => true,
        }
    }

    /// Registers a callback to run during destruction, after the view's own
    /// disposables.
    pub fn on_destroy(&self, callback: Box<dyn FnMut()>) {
        if let Some(view) = self.view() {
            view.disposables.borrow_mut().push(Some(callback));
        }
    }

    pub(crate) fn upgrade(&self, action: &str) -> Result<View> {
        self.view().ok_or_else(|| ViewError::ViewDestroyed {
            action: action.to_string(),
        })
    }

    fn as_ptr(&self) -> *const ViewData {
        match &self.handle {
            ViewHandle::Strong(view) => Rc::as_ptr(view),
            ViewHandle::Weak(weak) => weak.as_ptr(),
        }
    }

    pub fn loose_eq(&self, other: &ViewRef) -> bool {
        std::ptr::eq(self.as_ptr(), other.as_ptr())
    }
}

/// Injector view of one element: resolves tokens through the element's
/// provider chain the same way constructor dependencies do.
#[derive(Clone)]
pub struct ViewInjector {
    view: Weak<ViewData>,
    el_index: usize,
}

pub fn create_injector(view: &View, el_index: usize) -> ViewInjector {
    ViewInjector {
        view: Rc::downgrade(view),
        el_index,
    }
}

impl ViewInjector {
    pub fn loose_eq(&self, other: &ViewInjector) -> bool {
        Weak::ptr_eq(&self.view, &other.view) && self.el_index == other.el_index
    }
}

impl Injector for ViewInjector {
    fn get(&self, token: &Token) -> Option<Value> {
        let view = self.view.upgrade()?;
        resolve_dep(
            &view,
            Some(self.el_index),
            true,
            &DepDef::new(token.clone()),
            None,
        )
        .ok()
    }
}
