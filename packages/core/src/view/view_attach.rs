//! Embedded View Attachment
//!
//! Corresponds to packages/core/src/view/view_attach.ts
//!
//! Attach/detach/move of embedded views inside an anchor's container, plus
//! the render-level splicing that keeps the document order in sync: a view's
//! root nodes always sit after the previous view in the container, or right
//! after the anchor when it is first.

use crate::view::query::dirty_parent_queries;
use crate::view::types::{as_element_data, as_element_data_mut, View};
use crate::view::util::{render_node, root_render_nodes, visit_root_render_nodes};

/// Inserts `view` into the container anchored at `el_index` of `parent_view`,
/// at `view_index` (or at the end), and splices its render nodes in.
pub fn attach_embedded_view(
    parent_view: &View,
    el_index: usize,
    view_index: Option<usize>,
    view: &View,
) {
    let view_index = {
        let mut element_data = as_element_data_mut(parent_view, el_index);
        let view_index = view_index.unwrap_or(element_data.embedded_views.len());
        element_data.embedded_views.insert(view_index, view.clone());
        view_index
    };
    dirty_parent_queries(view);
    let prev_view = if view_index > 0 {
        as_element_data(parent_view, el_index)
            .embedded_views
            .get(view_index - 1)
            .cloned()
    } else {
        None
    };
    render_attach_embedded_view(parent_view, el_index, prev_view.as_ref(), view);
}

/// Removes the view at `view_index` (or the last one) from the container
/// without destroying it. Its render nodes leave the document.
pub fn detach_embedded_view(
    parent_view: &View,
    el_index: usize,
    view_index: Option<usize>,
) -> Option<View> {
    let view = {
        let mut element_data = as_element_data_mut(parent_view, el_index);
        let len = element_data.embedded_views.len();
        let view_index = match view_index {
            Some(i) if i < len => i,
            _ if len > 0 => len - 1,
            _ => return None,
        };
        element_data.embedded_views.remove(view_index)
    };
    dirty_parent_queries(&view);
    render_detach_view(&view);
    Some(view)
}

/// Moves a view to `new_index` within its container, re-splicing its render
/// nodes.
pub fn move_embedded_view(
    parent_view: &View,
    el_index: usize,
    old_view_index: usize,
    new_view_index: usize,
) -> View {
    let view = {
        let mut element_data = as_element_data_mut(parent_view, el_index);
        let view = element_data.embedded_views.remove(old_view_index);
        element_data.embedded_views.insert(new_view_index, view.clone());
        view
    };
    dirty_parent_queries(&view);
    render_detach_view(&view);
    let prev_view = if new_view_index > 0 {
        as_element_data(parent_view, el_index)
            .embedded_views
            .get(new_view_index - 1)
            .cloned()
    } else {
        None
    };
    render_attach_embedded_view(parent_view, el_index, prev_view.as_ref(), &view);
    view
}

fn render_attach_embedded_view(
    parent_view: &View,
    el_index: usize,
    prev_view: Option<&View>,
    view: &View,
) {
    // Anchor point: the last root render node of the previous view, or the
    // container's own anchor comment.
    let prev_render_node = match prev_view {
        Some(prev) => match prev.def.last_root_node {
            Some(last) => render_node(prev, &prev.def.nodes[last]),
            None => as_element_data(parent_view, el_index).render_element.clone(),
        },
        None => as_element_data(parent_view, el_index).render_element.clone(),
    };
    let renderer = view.renderer.clone();
    let parent_node = renderer.parent_node(&prev_render_node);
    let next_sibling = renderer.next_sibling(&prev_render_node);
    if let Some(parent_node) = parent_node {
        visit_root_render_nodes(view, &mut |node| match &next_sibling {
            Some(next) => renderer.insert_before(&parent_node, node, next),
            None => renderer.append_child(&parent_node, node),
        });
    }
}

/// Takes a view's root render nodes out of the document.
pub fn render_detach_view(view: &View) {
    let renderer = view.renderer.clone();
    for node in root_render_nodes(view) {
        if let Some(parent) = renderer.parent_node(&node) {
            renderer.remove_child(&parent, &node);
        }
    }
}
