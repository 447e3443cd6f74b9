//! View Definition Builder and View Runtime
//!
//! Corresponds to packages/core/src/view/view.ts
//!
//! `view_def` turns a flat depth-first node list into a validated, fully
//! linked `ViewDefinition`. The rest of the module drives the lifetime of a
//! live view: node instantiation, the two-phase detection pass, the
//! check-no-changes pass and destruction.

use crate::render::api::RenderNode;
use crate::value::Value;
use crate::view::element::create_element;
use crate::view::errors::{Result, ViewError};
use crate::view::ng_content::append_ng_content;
use crate::view::provider::{
    call_lifecycle_hooks_children_first, check_and_update_directive, create_directive_instance,
    create_provider_instance,
};
use crate::view::pure_expression::check_and_update_pure_expression;
use crate::view::query::{check_and_update_query, check_no_changes_query, create_query};
use crate::view::text::{check_and_update_text, create_text};
use crate::view::types::{
    as_element_data, as_provider_data, as_provider_data_mut, as_pure_expression_data, NodeData,
    NodeDef, NodeFlags, NodeType, ProviderData, ProviderMap, PureExpressionData, RootData, View,
    ViewData, ViewDefinition, ViewFlags, ViewHandleEventFn, ViewState, ViewUpdateFn,
};
use crate::view::util::{check_binding_no_changes, is_component_view, view_parent_el};
use std::rc::Rc;

/// Links, validates and aggregates a flat depth-first node list into a view
/// definition. Nodes arrive with their local data set; indices, parent
/// links, reverse child order, binding/disposable offsets, aggregated flags
/// and the provider visibility maps are computed here.
pub fn view_def(
    flags: ViewFlags,
    mut nodes: Vec<NodeDef>,
    update_directives: Option<ViewUpdateFn>,
    update_renderer: Option<ViewUpdateFn>,
    handle_event: Option<ViewHandleEventFn>,
) -> Result<Rc<ViewDefinition>> {
    if nodes.is_empty() {
        return Err(ViewError::illegal_definition("empty node list"));
    }
    let node_count = nodes.len();
    let mut view_binding_count = 0;
    let mut view_disposable_count = 0;
    let mut view_node_flags = NodeFlags::NONE;
    let mut view_matched_queries = 0u32;
    let mut current_parent: Option<usize> = None;
    let mut last_root_node: Option<usize> = None;
    let mut current_element_has_public_providers = false;
    let mut current_element_has_private_providers = false;

    for i in 0..node_count {
        // Close finished parents.
        while let Some(parent) = current_parent {
            if i <= nodes[parent].index + nodes[parent].child_count {
                break;
            }
            let new_parent = nodes[parent].parent;
            if let Some(new_parent) = new_parent {
                let child_flags = nodes[parent].child_flags;
                let child_queries =
                    nodes[parent].child_matched_queries | nodes[parent].matched_query_ids;
                nodes[new_parent].child_flags |= child_flags;
                nodes[new_parent].child_matched_queries |= child_queries;
            }
            current_parent = new_parent;
        }

        nodes[i].index = i;
        nodes[i].parent = current_parent;
        nodes[i].binding_index = view_binding_count;
        nodes[i].disposable_index = view_disposable_count;
        nodes[i].reverse_child_index =
            calculate_reverse_child_index(&nodes, current_parent, i, node_count);
        nodes[i].render_parent = match current_parent {
            Some(parent) => {
                let transparent = nodes[parent]
                    .element()
                    .map(|e| e.name.is_none())
                    .unwrap_or(true);
                if transparent {
                    nodes[parent].render_parent
                } else {
                    Some(parent)
                }
            }
            None => None,
        };

        view_node_flags |= nodes[i].flags;
        view_matched_queries |= nodes[i].matched_query_ids;
        if let Some(template) = nodes[i].element().and_then(|e| e.template.as_ref()) {
            view_matched_queries |= template.node_matched_queries;
        }

        if nodes[i].node_type == NodeType::Element {
            // All providers of an element come before any child element.
            let inherited = match current_parent {
                Some(parent) => match &nodes[parent].element() {
                    Some(e) => e.public_providers.clone(),
                    None => None,
                },
                None => None,
            };
            let public = inherited.unwrap_or_else(ProviderMap::root);
            if let Some(element) = element_mut(&mut nodes[i]) {
                element.public_providers = Some(public.clone());
                element.all_providers = Some(public);
            }
            current_element_has_public_providers = false;
            current_element_has_private_providers = false;
        }

        validate_node(&nodes, current_parent, i, node_count)?;

        view_binding_count += nodes[i].bindings.len();
        view_disposable_count += nodes[i].disposable_count;

        if let Some(parent) = current_parent {
            let flags = nodes[i].flags;
            let queries = nodes[i].matched_query_ids;
            let template_queries = nodes[i]
                .element()
                .and_then(|e| e.template.as_ref())
                .map(|t| t.node_matched_queries)
                .unwrap_or(0);
            nodes[parent].child_flags |= flags;
            nodes[parent].child_matched_queries |= queries | template_queries;
        }

        if nodes[i].is_provider_like() {
            let parent = match nodes[i].parent {
                Some(parent) => parent,
                None => {
                    return Err(ViewError::illegal_definition(format!(
                        "provider nodes need to be children of elements or anchors, at index {}",
                        i
                    )))
                }
            };
            let token = match nodes[i].provider() {
                Some(provider) => provider.token.clone(),
                None => {
                    return Err(ViewError::illegal_definition(format!(
                        "provider node without provider payload, at index {}",
                        i
                    )))
                }
            };
            let is_private = nodes[i].flags.contains(NodeFlags::PRIVATE_PROVIDER);
            let is_component = nodes[i].flags.contains(NodeFlags::HAS_COMPONENT);
            if !current_element_has_public_providers {
                current_element_has_public_providers = true;
                // Fork on first write so sibling elements keep seeing only the
                // inherited entries.
                if let Some(element) = element_mut(&mut nodes[parent]) {
                    let forked = ProviderMap::fork(
                        element.public_providers.as_ref().unwrap_or(&ProviderMap::root()),
                    );
                    element.public_providers = Some(forked.clone());
                    element.all_providers = Some(forked);
                }
            }
            if !is_private || is_component {
                if let Some(map) = nodes[parent].element().and_then(|e| e.public_providers.clone())
                {
                    map.insert(token, i);
                }
            } else {
                if !current_element_has_private_providers {
                    current_element_has_private_providers = true;
                    // Private entries shadow public ones on the same element;
                    // later public inserts stay visible through the parent
                    // link.
                    if let Some(element) = element_mut(&mut nodes[parent]) {
                        let public = element.public_providers.clone();
                        if let Some(public) = public {
                            element.all_providers = Some(ProviderMap::fork(&public));
                        }
                    }
                }
                if let Some(map) = nodes[parent].element().and_then(|e| e.all_providers.clone()) {
                    map.insert(token, i);
                }
            }
            if is_component {
                if let Some(element) = element_mut(&mut nodes[parent]) {
                    element.component_index = Some(i);
                }
            }
        }

        if nodes[i].render_parent.is_none()
            && matches!(nodes[i].node_type, NodeType::Element | NodeType::Text)
        {
            last_root_node = Some(i);
        }

        if nodes[i].child_count > 0 {
            current_parent = Some(i);
        }
    }

    // Close parents still open at the end.
    let mut current = current_parent;
    while let Some(parent) = current {
        let new_parent = nodes[parent].parent;
        if let Some(new_parent) = new_parent {
            let child_flags = nodes[parent].child_flags;
            let child_queries =
                nodes[parent].child_matched_queries | nodes[parent].matched_query_ids;
            nodes[new_parent].child_flags |= child_flags;
            nodes[new_parent].child_matched_queries |= child_queries;
        }
        current = new_parent;
    }

    let mut reverse_child_nodes = vec![0usize; node_count];
    for node in &nodes {
        reverse_child_nodes[node.reverse_child_index] = node.index;
    }

    Ok(Rc::new(ViewDefinition {
        flags,
        node_flags: view_node_flags,
        node_matched_queries: view_matched_queries,
        reverse_child_nodes,
        last_root_node,
        binding_count: view_binding_count,
        disposable_count: view_disposable_count,
        update_directives: update_directives.unwrap_or_else(noop_update),
        update_renderer: update_renderer.unwrap_or_else(noop_update),
        handle_event: handle_event.unwrap_or_else(noop_handle_event),
        nodes,
    }))
}

fn noop_update() -> ViewUpdateFn {
    Rc::new(|_, _| Ok(()))
}

fn noop_handle_event() -> ViewHandleEventFn {
    Rc::new(|_, _, _, _| Ok(true))
}

fn element_mut(node: &mut NodeDef) -> Option<&mut crate::view::types::ElementDef> {
    match &mut node.payload {
        crate::view::types::NodePayload::Element(e) => Some(e),
        _ => None,
    }
}

/// In reverse child order the range of each child (plus its transitive
/// children) is mirrored around its position inside the parent, so iterating
/// the result visits every node after all of its descendants.
fn calculate_reverse_child_index(
    nodes: &[NodeDef],
    current_parent: Option<usize>,
    i: usize,
    node_count: usize,
) -> usize {
    let child_count = nodes[i].child_count;
    let last_child_index = i + child_count;
    let last_child_offset = match current_parent {
        Some(parent) => last_child_index - (nodes[parent].index + 1),
        None => last_child_index,
    };
    let parent_end = match current_parent {
        Some(parent) => nodes[parent].reverse_child_index + nodes[parent].child_count,
        None => node_count - 1,
    };
    parent_end - last_child_offset
}

fn validate_node(
    nodes: &[NodeDef],
    parent: Option<usize>,
    i: usize,
    node_count: usize,
) -> Result<()> {
    let node = &nodes[i];
    if let Some(template) = node.element().and_then(|e| e.template.as_ref()) {
        if let Some(last) = template.last_root_node {
            if template.nodes[last].flags.contains(NodeFlags::HAS_EMBEDDED_VIEWS) {
                return Err(ViewError::illegal_definition(format!(
                    "last root node of a template can't have embedded views, at index {}",
                    i
                )));
            }
        }
    }
    if node.is_provider_like() {
        let parent_is_element = parent
            .map(|p| nodes[p].node_type == NodeType::Element)
            .unwrap_or(false);
        if !parent_is_element {
            return Err(ViewError::illegal_definition(format!(
                "provider nodes need to be children of elements or anchors, at index {}",
                i
            )));
        }
    }
    if node.node_type == NodeType::Query {
        if node.flags.contains(NodeFlags::HAS_CONTENT_QUERY) {
            let parent_is_directive = parent
                .map(|p| nodes[p].node_type == NodeType::Directive)
                .unwrap_or(false);
            if !parent_is_directive {
                return Err(ViewError::illegal_definition(format!(
                    "content query nodes need to be children of directives, at index {}",
                    i
                )));
            }
        }
        if node.flags.contains(NodeFlags::HAS_VIEW_QUERY) && parent.is_some() {
            return Err(ViewError::illegal_definition(format!(
                "view query nodes have to be top level nodes, at index {}",
                i
            )));
        }
    }
    if node.child_count > 0 {
        let parent_end = match parent {
            Some(p) => nodes[p].index + nodes[p].child_count,
            None => node_count - 1,
        };
        if i <= parent_end && i + node.child_count > parent_end {
            return Err(ViewError::illegal_definition(format!(
                "childCount of node leads outside of its parent, at index {}",
                i
            )));
        }
    }
    Ok(())
}

// -------------------------------------
// View creation
// -------------------------------------

/// Bundles the per-tree collaborators; one `RootData` is shared by every view
/// under the root.
pub fn create_root_data(
    injector: Rc<dyn crate::di::Injector>,
    projectable_nodes: Vec<Vec<RenderNode>>,
    selector_or_node: Option<String>,
    renderer_factory: Rc<dyn crate::render::api::RendererFactory>,
    sanitizer: Rc<dyn crate::security::Sanitizer>,
) -> Rc<RootData> {
    let renderer = renderer_factory.create_renderer(None, None);
    Rc::new(RootData {
        injector,
        projectable_nodes,
        selector_or_node,
        renderer_factory,
        renderer,
        sanitizer,
    })
}

pub fn create_root_view(
    root: Rc<RootData>,
    def: Rc<ViewDefinition>,
    context: Value,
) -> Result<View> {
    let renderer = root.renderer.clone();
    let view = ViewData::new(def, root, renderer, None, None);
    init_view(&view, Value::Undefined, context);
    create_view_nodes(&view)?;
    Ok(view)
}

/// Instantiates the template of an anchor node into a detached embedded view.
pub fn create_embedded_view(
    parent: &View,
    anchor_index: usize,
    anchor: &NodeDef,
    context: Value,
) -> Result<View> {
    let template = anchor
        .element()
        .and_then(|e| e.template.clone())
        .ok_or_else(|| {
            ViewError::illegal_definition(format!(
                "node {} carries no template to create an embedded view from",
                anchor_index
            ))
        })?;
    let view = ViewData::new(
        template,
        parent.root.clone(),
        parent.renderer.clone(),
        Some(parent),
        Some(anchor_index),
    );
    init_view(&view, parent.component.borrow().clone(), context);
    create_view_nodes(&view)?;
    Ok(view)
}

fn init_view(view: &View, component: Value, context: Value) {
    *view.component.borrow_mut() = component;
    *view.context.borrow_mut() = context;
}

fn create_view_nodes(view: &View) -> Result<()> {
    let render_host: Option<RenderNode> = if is_component_view(view) {
        match (view.parent(), view_parent_el(view)) {
            (Some(parent), Some(host_el)) => {
                Some(as_element_data(&parent, host_el).render_element.clone())
            }
            _ => None,
        }
    } else {
        None
    };

    let def = view.def.clone();
    for i in 0..def.nodes.len() {
        let node_def = &def.nodes[i];
        match node_def.node_type {
            NodeType::Element => {
                let data = create_element(view, render_host.as_ref(), node_def);
                *view.node_data(i).borrow_mut() = NodeData::Element(data);
            }
            NodeType::Text => {
                let data = create_text(view, render_host.as_ref(), node_def);
                *view.node_data(i).borrow_mut() = NodeData::Text(data);
            }
            NodeType::Provider | NodeType::Pipe => {
                *view.node_data(i).borrow_mut() = NodeData::Provider(ProviderData {
                    instance: None,
                    component_view: None,
                });
                let instance = create_provider_instance(view, node_def)?;
                as_provider_data_mut(view, i).instance = instance;
            }
            NodeType::Directive => {
                // The component view exists before the directive instance so
                // the constructor can inject its own ChangeDetectorRef.
                let component_view = if node_def.flags.contains(NodeFlags::HAS_COMPONENT) {
                    let component = match node_def.provider().and_then(|p| p.component.clone()) {
                        Some(component) => component,
                        None => {
                            return Err(ViewError::illegal_definition(format!(
                                "component directive without a component def, at index {}",
                                i
                            )))
                        }
                    };
                    let component_def = component.view_def_factory.resolve();
                    let host_el = match node_def.parent {
                        Some(parent) => {
                            Some(as_element_data(view, parent).render_element.clone())
                        }
                        None => None,
                    };
                    let component_renderer = view.root.renderer_factory.create_renderer(
                        host_el.as_ref(),
                        component.renderer_type.as_deref(),
                    );
                    Some(ViewData::new(
                        component_def,
                        view.root.clone(),
                        component_renderer,
                        Some(view),
                        Some(i),
                    ))
                } else {
                    None
                };
                *view.node_data(i).borrow_mut() = NodeData::Provider(ProviderData {
                    instance: None,
                    component_view: component_view.clone(),
                });
                let instance = create_directive_instance(view, node_def)?;
                as_provider_data_mut(view, i).instance = Some(instance.clone());
                if let Some(component_view) = component_view {
                    init_view(&component_view, instance.clone(), instance);
                }
            }
            NodeType::PureExpression => {
                *view.node_data(i).borrow_mut() =
                    NodeData::PureExpression(PureExpressionData {
                        value: Value::Undefined,
                    });
            }
            NodeType::Query => {
                *view.node_data(i).borrow_mut() = NodeData::Query(create_query());
            }
            NodeType::NgContent => {
                append_ng_content(view, render_host.as_ref(), node_def);
            }
        }
    }
    // Component view nodes are created after everything else in this view so
    // content projection finds its sources in place.
    exec_component_views_action(view, ViewAction::CreateViewNodes)?;
    // Queries are filled before the first detection pass; owning directives
    // never observe an unpopulated result list.
    exec_queries_action(
        view,
        NodeFlags::HAS_CONTENT_QUERY | NodeFlags::HAS_VIEW_QUERY,
        CheckType::CheckAndUpdate,
    )?;
    Ok(())
}

// -------------------------------------
// Change detection
// -------------------------------------

/// One full detection pass over a view and everything below it, in the fixed
/// phase order: directive inputs, embedded views, content queries, content
/// hooks, render bindings, component views, view queries, view hooks.
pub fn check_and_update_view(view: &View) -> Result<()> {
    if view.state().contains(ViewState::DESTROYED) {
        return Err(ViewError::ViewDestroyed {
            action: "detectChanges".to_string(),
        });
    }
    let first_check = view.state().contains(ViewState::FIRST_CHECK);

    let update_directives = view.def.update_directives.clone();
    (*update_directives)(check_and_update_node, view)?;

    exec_embedded_views_action(view, ViewAction::CheckAndUpdate)?;
    exec_queries_action(view, NodeFlags::HAS_CONTENT_QUERY, CheckType::CheckAndUpdate)?;
    call_lifecycle_hooks_children_first(
        view,
        NodeFlags::AFTER_CONTENT_CHECKED
            | if first_check {
                NodeFlags::AFTER_CONTENT_INIT
            } else {
                NodeFlags::NONE
            },
    );

    let update_renderer = view.def.update_renderer.clone();
    (*update_renderer)(check_and_update_node, view)?;

    exec_component_views_action(view, ViewAction::CheckAndUpdate)?;
    exec_queries_action(view, NodeFlags::HAS_VIEW_QUERY, CheckType::CheckAndUpdate)?;
    call_lifecycle_hooks_children_first(
        view,
        NodeFlags::AFTER_VIEW_CHECKED
            | if first_check {
                NodeFlags::AFTER_VIEW_INIT
            } else {
                NodeFlags::NONE
            },
    );

    if view.def.flags.contains(ViewFlags::ON_PUSH) {
        view.clear_state(ViewState::CHECKS_ENABLED);
    }
    view.clear_state(ViewState::FIRST_CHECK);
    Ok(())
}

/// Runs the same traversal as a detection pass but fails on the first binding
/// that would change; nothing is written.
pub fn check_no_changes_view(view: &View) -> Result<()> {
    if view.state().contains(ViewState::DESTROYED) {
        return Err(ViewError::ViewDestroyed {
            action: "checkNoChanges".to_string(),
        });
    }
    let update_directives = view.def.update_directives.clone();
    (*update_directives)(check_no_changes_node, view)?;

    exec_embedded_views_action(view, ViewAction::CheckNoChanges)?;
    exec_queries_action(view, NodeFlags::HAS_CONTENT_QUERY, CheckType::CheckNoChanges)?;

    let update_renderer = view.def.update_renderer.clone();
    (*update_renderer)(check_no_changes_node, view)?;

    exec_component_views_action(view, ViewAction::CheckNoChanges)?;
    exec_queries_action(view, NodeFlags::HAS_VIEW_QUERY, CheckType::CheckNoChanges)?;
    Ok(())
}

/// The per-node check callback for detection passes; dispatches on node type.
pub fn check_and_update_node(
    view: &View,
    node_index: usize,
    values: &[Value],
) -> Result<Option<Value>> {
    let def = &view.def.nodes[node_index];
    match def.node_type {
        NodeType::Element => {
            crate::view::element::check_and_update_element(view, def, values)?;
            Ok(None)
        }
        NodeType::Text => {
            check_and_update_text(view, def, values)?;
            Ok(None)
        }
        NodeType::Directive => check_and_update_directive(view, def, values),
        NodeType::PureExpression => check_and_update_pure_expression(view, def, values),
        _ => Ok(None),
    }
}

/// The per-node check callback for check-no-changes passes. Pure expressions
/// still report their memoized value so chained expressions can be rechecked.
pub fn check_no_changes_node(
    view: &View,
    node_index: usize,
    values: &[Value],
) -> Result<Option<Value>> {
    let def = &view.def.nodes[node_index];
    for (i, value) in values.iter().enumerate() {
        check_binding_no_changes(view, def, i, value)?;
    }
    if def.node_type == NodeType::PureExpression {
        Ok(Some(as_pure_expression_data(view, node_index).value.clone()))
    } else {
        Ok(None)
    }
}

// -------------------------------------
// Destruction
// -------------------------------------

/// Tears a view down: embedded views first, then component views, then
/// `OnDestroy` hooks children-first, then disposables, then render cleanup.
/// Idempotent.
pub fn destroy_view(view: &View) {
    if view.state().contains(ViewState::DESTROYED) {
        return;
    }
    let _ = exec_embedded_views_action(view, ViewAction::Destroy);
    let _ = exec_component_views_action(view, ViewAction::Destroy);
    call_lifecycle_hooks_children_first(view, NodeFlags::ON_DESTROY);
    let disposables: Vec<_> = view.disposables.borrow_mut().drain(..).collect();
    for disposable in disposables {
        if let Some(mut dispose) = disposable {
            dispose();
        }
    }
    if view.renderer.supports_destroy_node() {
        destroy_view_nodes(view);
    }
    if is_component_view(view) {
        view.renderer.destroy();
    }
    view.set_state(ViewState::DESTROYED);
}

fn destroy_view_nodes(view: &View) {
    for (i, def) in view.def.nodes.iter().enumerate() {
        match def.node_type {
            NodeType::Element => {
                let node = as_element_data(view, i).render_element.clone();
                view.renderer.destroy_node(&node);
            }
            NodeType::Text => {
                let node = crate::view::types::as_text_data(view, i).render_text.clone();
                view.renderer.destroy_node(&node);
            }
            _ => {}
        }
    }
}

// -------------------------------------
// Child view traversal
// -------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewAction {
    CreateViewNodes,
    CheckAndUpdate,
    CheckNoChanges,
    Destroy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckType {
    CheckAndUpdate,
    CheckNoChanges,
}

fn exec_component_views_action(view: &View, action: ViewAction) -> Result<()> {
    if !view.def.node_flags.contains(NodeFlags::HAS_COMPONENT) {
        return Ok(());
    }
    let len = view.def.nodes.len();
    let mut i = 0;
    while i < len {
        let def = &view.def.nodes[i];
        if def.flags.contains(NodeFlags::HAS_COMPONENT) {
            let component_view = as_provider_data(view, i).component_view.clone();
            if let Some(component_view) = component_view {
                call_view_action(&component_view, action)?;
            }
        } else if !def.child_flags.contains(NodeFlags::HAS_COMPONENT) {
            i += def.child_count;
        }
        i += 1;
    }
    Ok(())
}

fn exec_embedded_views_action(view: &View, action: ViewAction) -> Result<()> {
    if !view.def.node_flags.contains(NodeFlags::HAS_EMBEDDED_VIEWS) {
        return Ok(());
    }
    let len = view.def.nodes.len();
    let mut i = 0;
    while i < len {
        let def = &view.def.nodes[i];
        if def.flags.contains(NodeFlags::HAS_EMBEDDED_VIEWS) {
            let embedded: Vec<View> = as_element_data(view, i).embedded_views.clone();
            for embedded_view in &embedded {
                call_view_action(embedded_view, action)?;
            }
        } else if !def.child_flags.contains(NodeFlags::HAS_EMBEDDED_VIEWS) {
            i += def.child_count;
        }
        i += 1;
    }
    Ok(())
}

fn call_view_action(view: &View, action: ViewAction) -> Result<()> {
    let state = view.state();
    match action {
        ViewAction::CheckAndUpdate => {
            if state.contains(ViewState::CHECKS_ENABLED)
                && !state.intersects(ViewState::ERRORED | ViewState::DESTROYED)
            {
                check_and_update_view(view)?;
            }
            Ok(())
        }
        ViewAction::CheckNoChanges => {
            if state.contains(ViewState::CHECKS_ENABLED)
                && !state.intersects(ViewState::ERRORED | ViewState::DESTROYED)
            {
                check_no_changes_view(view)?;
            }
            Ok(())
        }
        ViewAction::CreateViewNodes => create_view_nodes(view),
        ViewAction::Destroy => {
            destroy_view(view);
            Ok(())
        }
    }
}

fn exec_queries_action(view: &View, query_flags: NodeFlags, check_type: CheckType) -> Result<()> {
    if !view.def.node_flags.intersects(query_flags) {
        return Ok(());
    }
    let len = view.def.nodes.len();
    let mut i = 0;
    while i < len {
        let def = &view.def.nodes[i];
        if def.flags.intersects(query_flags) {
            match check_type {
                CheckType::CheckAndUpdate => check_and_update_query(view, def)?,
                CheckType::CheckNoChanges => check_no_changes_query(view, def)?,
            }
        } else if !def.child_flags.intersects(query_flags) {
            i += def.child_count;
        }
        i += 1;
    }
    Ok(())
}
