//! Content Projection
//!
//! Corresponds to packages/core/src/view/ng_content.ts

use crate::render::api::RenderNode;
use crate::view::types::{NgContentDef, NodeDef, NodeFlags, NodePayload, NodeType, View};
use crate::view::util::{get_parent_render_element, visit_projected_render_nodes};

/// Builds the descriptor for an `<ng-content>` slot. `ng_content_index` is
/// set when the slot itself is re-projected into an outer component.
pub fn ng_content_def(ng_content_index: Option<usize>, index: usize) -> NodeDef {
    NodeDef {
        node_type: NodeType::NgContent,
        // Set by view_def.
        index: 0,
        reverse_child_index: 0,
        render_parent: None,
        binding_index: 0,
        disposable_index: 0,
        parent: None,
        child_flags: NodeFlags::NONE,
        child_matched_queries: 0,
        // Regular values.
        flags: NodeFlags::NONE,
        ng_content_index,
        child_count: 0,
        matched_query_ids: 0,
        matched_queries: Vec::new(),
        bindings: Vec::new(),
        disposable_count: 0,
        payload: NodePayload::NgContent(NgContentDef { index }),
    }
}

/// Moves the render nodes projected into this slot under the slot's parent
/// element.
pub fn append_ng_content(view: &View, render_host: Option<&RenderNode>, def: &NodeDef) {
    let parent_el = match get_parent_render_element(view, render_host, def) {
        Some(el) => el,
        // Nothing to project into.
        None => return,
    };
    let ng_content_index = match def.ng_content() {
        Some(c) => c.index,
        None => panic!("Illegal State: node {} is not an ng-content", def.index),
    };
    let renderer = view.renderer.clone();
    visit_projected_render_nodes(view, ng_content_index, &mut |node| {
        renderer.append_child(&parent_el, node);
    });
}
