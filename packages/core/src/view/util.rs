//! View Engine Utilities
//!
//! Corresponds to packages/core/src/view/util.ts

use crate::render::api::RenderNode;
use crate::value::{loose_identical, Value};
use crate::view::errors::{Result, ViewError};
use crate::view::types::{
    as_element_data, as_text_data, NodeDef, NodeFlags, NodePayload, QueryId, QueryValueType, View,
    ViewData, ViewFlags, ViewState,
};

/// Maps a query id onto its filter bit. Ids beyond 32 alias; the filter is a
/// pruning heuristic, the id itself stays the source of truth for matching.
pub fn filter_query_id(query_id: QueryId) -> u32 {
    1 << (query_id % 32)
}

/// OR of the filter bits for all matched queries of a node.
pub fn matched_query_ids(matched: &[(QueryId, QueryValueType)]) -> u32 {
    matched
        .iter()
        .fold(0, |ids, (id, _)| ids | filter_query_id(*id))
}

/// Dirty-checks one binding slot; stores and reports a change on the first
/// check or whenever the value is not loosely identical to the stored one.
pub fn check_and_update_binding(
    view: &ViewData,
    def: &NodeDef,
    binding_index: usize,
    value: &Value,
) -> bool {
    let global_index = def.binding_index + binding_index;
    let mut old_values = view.old_values.borrow_mut();
    if view.state().contains(ViewState::FIRST_CHECK)
        || !loose_identical(&old_values[global_index], value)
    {
        old_values[global_index] = value.clone();
        true
    } else {
        false
    }
}

/// The check-no-changes counterpart: never writes, fails on any difference.
/// Marks the owning view errored so parents skip it on later passes while
/// sibling subtrees keep being checked.
pub fn check_binding_no_changes(
    view: &ViewData,
    def: &NodeDef,
    binding_index: usize,
    value: &Value,
) -> Result<()> {
    let global_index = def.binding_index + binding_index;
    let old_values = view.old_values.borrow();
    let first_check = view.state().contains(ViewState::FIRST_CHECK);
    if first_check || !loose_identical(&old_values[global_index], value) {
        let old_value = old_values[global_index].render_string();
        drop(old_values);
        view.set_state(ViewState::ERRORED);
        return Err(ViewError::ExpressionChanged {
            node_index: def.index,
            binding_index,
            old_value,
            new_value: value.render_string(),
            first_check,
        });
    }
    Ok(())
}

/// A component view renders the template of the directive node that declared
/// it; an embedded view is declared by an anchor element instead.
pub fn is_component_view(view: &ViewData) -> bool {
    match (view.parent(), view.parent_node_index) {
        (Some(parent), Some(index)) => parent.def.nodes[index]
            .flags
            .contains(NodeFlags::HAS_COMPONENT),
        _ => false,
    }
}

pub fn is_embedded_view(view: &ViewData) -> bool {
    view.parent().is_some() && !is_component_view(view)
}

/// The element in the parent view this view hangs off: the host element of a
/// component view, or the anchor's parent for an embedded view (embedded
/// views are siblings of their anchor).
pub fn view_parent_el(view: &ViewData) -> Option<usize> {
    let parent = view.parent()?;
    let index = view.parent_node_index?;
    parent.def.nodes[index].parent
}

/// The render node backing an element or text node.
pub fn render_node(view: &ViewData, def: &NodeDef) -> RenderNode {
    match &def.payload {
        NodePayload::Element(_) => as_element_data(view, def.index).render_element.clone(),
        NodePayload::Text(_) => as_text_data(view, def.index).render_text.clone(),
        _ => panic!(
            "Illegal State: node at index {} has no render node",
            def.index
        ),
    }
}

/// Re-arms checks on every `OnPush` view from `view` to the root. Called on
/// event dispatch so a detection pass reaches the view the event fired in.
pub fn mark_parent_views_for_check(view: &View) {
    let mut current = Some(view.clone());
    while let Some(v) = current {
        if v.def.flags.contains(ViewFlags::ON_PUSH) {
            v.set_state(ViewState::CHECKS_ENABLED);
        }
        current = v.parent();
    }
}

/// Event dispatch entry point used by output subscriptions and render
/// listeners.
pub fn dispatch_event(
    view: &View,
    node_index: usize,
    event_name: &str,
    event: &Value,
) -> Result<bool> {
    if view.state().contains(ViewState::DESTROYED) {
        return Err(ViewError::ViewDestroyed {
            action: "handleEvent".to_string(),
        });
    }
    mark_parent_views_for_check(view);
    let handle_event = view.def.handle_event.clone();
    (*handle_event)(view, node_index, event_name, event)
}

/// Resolves the render element children of `def` attach under: the nearest
/// named ancestor element, or the component host for root nodes.
pub fn get_parent_render_element(
    view: &ViewData,
    render_host: Option<&RenderNode>,
    def: &NodeDef,
) -> Option<RenderNode> {
    match def.render_parent {
        Some(parent_index) => Some(
            as_element_data(view, parent_index)
                .render_element
                .clone(),
        ),
        None => render_host.cloned(),
    }
}

// -------------------------------------
// Render node traversal
// -------------------------------------

/// Visits the render nodes a view contributes at its root level, in document
/// order: elements/texts without a render parent, the contents of projected
/// slots, and the root nodes of attached embedded views.
pub fn visit_root_render_nodes(view: &View, visitor: &mut dyn FnMut(&RenderNode)) {
    let len = view.def.nodes.len();
    let mut i = 0;
    while i < len {
        let def = &view.def.nodes[i];
        if def.render_parent.is_none() && is_render_node_type(def) {
            visit_render_node(view, i, visitor);
        }
        i += def.child_count + 1;
    }
}

fn is_render_node_type(def: &NodeDef) -> bool {
    matches!(
        def.payload,
        NodePayload::Element(_) | NodePayload::Text(_) | NodePayload::NgContent(_)
    )
}

fn visit_render_node(view: &View, node_index: usize, visitor: &mut dyn FnMut(&RenderNode)) {
    let def = &view.def.nodes[node_index];
    if let NodePayload::NgContent(ng_content) = &def.payload {
        visit_projected_render_nodes(view, ng_content.index, visitor);
        return;
    }
    visitor(&render_node(view, def));
    if def.flags.contains(NodeFlags::HAS_EMBEDDED_VIEWS) {
        let embedded: Vec<View> = as_element_data(view, node_index).embedded_views.clone();
        for embedded_view in &embedded {
            visit_root_render_nodes(embedded_view, visitor);
        }
    }
    // Children of a transparent container render as siblings of its anchor.
    if let NodePayload::Element(element) = &def.payload {
        if element.name.is_none() {
            visit_sibling_render_nodes(view, node_index + 1, node_index + def.child_count, visitor);
        }
    }
}

fn visit_sibling_render_nodes(
    view: &View,
    start: usize,
    end: usize,
    visitor: &mut dyn FnMut(&RenderNode),
) {
    let mut i = start;
    while i <= end {
        let def = &view.def.nodes[i];
        if is_render_node_type(def) {
            visit_render_node(view, i, visitor);
        }
        i += def.child_count + 1;
    }
}

/// Visits the render nodes projected into an ng-content slot: the matching
/// children of the host element, or the root data's projectable nodes when
/// the projecting view sits directly under the root.
pub fn visit_projected_render_nodes(
    view: &View,
    ng_content_index: usize,
    visitor: &mut dyn FnMut(&RenderNode),
) {
    let mut comp_view = view.clone();
    while !is_component_view(&comp_view) {
        match comp_view.parent() {
            Some(parent) => comp_view = parent,
            None => break,
        }
    }
    let host_view = comp_view.parent();
    let host_el = view_parent_el(&comp_view);
    match (host_view, host_el) {
        (Some(host_view), Some(host_el)) => {
            let child_count = host_view.def.nodes[host_el].child_count;
            let mut i = host_el + 1;
            while i <= host_el + child_count {
                let def = &host_view.def.nodes[i];
                if def.ng_content_index == Some(ng_content_index) && is_render_node_type(def) {
                    visit_render_node(&host_view, i, visitor);
                }
                i += def.child_count + 1;
            }
        }
        _ => {
            // A root view: projected content comes from the outside.
            if let Some(nodes) = view.root.projectable_nodes.get(ng_content_index) {
                for node in nodes {
                    visitor(node);
                }
            }
        }
    }
}

/// All render nodes a view contributes at its root level, in order.
pub fn root_render_nodes(view: &View) -> Vec<RenderNode> {
    let mut nodes = Vec::new();
    visit_root_render_nodes(view, &mut |n| nodes.push(n.clone()));
    nodes
}
