//! Element Nodes
//!
//! Corresponds to packages/core/src/view/element.ts

use crate::render::api::RenderNode;
use crate::value::Value;
use crate::view::errors::Result;
use crate::view::types::{
    BindingDef, BindingType, ElementData, ElementDef, ElementOutputDef, NodeDef, NodeFlags,
    NodePayload, NodeType, QueryId, QueryValueType, View, ViewDefinition,
};
use crate::view::util::{dispatch_event, get_parent_render_element, matched_query_ids};
use std::rc::{Rc, Weak};

/// Builds the descriptor for an embedded-view anchor or a transparent
/// container: an element without a tag name, backed by a comment node.
pub fn anchor_def(
    flags: NodeFlags,
    matched_queries: &[(QueryId, QueryValueType)],
    ng_content_index: Option<usize>,
    child_count: usize,
    template: Option<Rc<ViewDefinition>>,
) -> NodeDef {
    let flags = if template.is_some() {
        flags | NodeFlags::HAS_EMBEDDED_VIEWS
    } else {
        flags
    };
    element_node(
        flags,
        matched_queries,
        ng_content_index,
        child_count,
        None,
        &[],
        Vec::new(),
        &[],
        template,
    )
}

/// Builds the descriptor for a named element.
#[allow(clippy::too_many_arguments)]
pub fn element_def(
    flags: NodeFlags,
    matched_queries: &[(QueryId, QueryValueType)],
    ng_content_index: Option<usize>,
    child_count: usize,
    name: &str,
    fixed_attrs: &[(&str, &str)],
    bindings: Vec<BindingDef>,
    outputs: &[(Option<&str>, &str)],
) -> NodeDef {
    element_node(
        flags,
        matched_queries,
        ng_content_index,
        child_count,
        Some(name.to_string()),
        fixed_attrs,
        bindings,
        outputs,
        None,
    )
}

#[allow(clippy::too_many_arguments)]
fn element_node(
    flags: NodeFlags,
    matched_queries: &[(QueryId, QueryValueType)],
    ng_content_index: Option<usize>,
    child_count: usize,
    name: Option<String>,
    fixed_attrs: &[(&str, &str)],
    bindings: Vec<BindingDef>,
    outputs: &[(Option<&str>, &str)],
    template: Option<Rc<ViewDefinition>>,
) -> NodeDef {
    let outputs: Vec<ElementOutputDef> = outputs
        .iter()
        .map(|(target, event_name)| ElementOutputDef {
            target: target.map(str::to_string),
            event_name: event_name.to_string(),
        })
        .collect();
    NodeDef {
        node_type: NodeType::Element,
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
        flags,
        ng_content_index,
        child_count,
        matched_query_ids: matched_query_ids(matched_queries),
        matched_queries: matched_queries.to_vec(),
        bindings,
        disposable_count: outputs.len(),
        payload: NodePayload::Element(ElementDef {
            name,
            attrs: fixed_attrs
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            outputs,
            template,
            public_providers: None,
            all_providers: None,
            component_index: None,
        }),
    }
}

/// Creates the render primitive for an element node: a real element for named
/// defs, a comment anchor otherwise. Static attributes are applied and
/// declared output listeners registered immediately.
pub fn create_element(view: &View, render_host: Option<&RenderNode>, def: &NodeDef) -> ElementData {
    let el_def = match def.element() {
        Some(e) => e,
        None => panic!("Illegal State: node {} is not an element", def.index),
    };
    let parent_el = get_parent_render_element(view, render_host, def);
    let renderer = &view.renderer;
    let el = match &el_def.name {
        Some(name) => {
            if view.parent().is_none() && parent_el.is_none() {
                if let Some(selector) = &view.root.selector_or_node {
                    // A root view rendering into an existing host element.
                    let el = renderer.select_root_element(selector);
                    apply_element_statics(view, el_def, &el, def);
                    return ElementData {
                        render_element: el,
                        embedded_views: Vec::new(),
                    };
                }
            }
            renderer.create_element(name)
        }
        None => renderer.create_comment(""),
    };
    if let Some(parent) = &parent_el {
        renderer.append_child(parent, &el);
    }
    apply_element_statics(view, el_def, &el, def);
    ElementData {
        render_element: el,
        embedded_views: Vec::new(),
    }
}

fn apply_element_statics(view: &View, el_def: &ElementDef, el: &RenderNode, def: &NodeDef) {
    for (name, value) in &el_def.attrs {
        view.renderer.set_attribute(el, name, value);
    }
    for (i, output) in el_def.outputs.iter().enumerate() {
        let weak: Weak<_> = Rc::downgrade(view);
        let node_index = def.index;
        let full_name = element_event_full_name(output.target.as_deref(), &output.event_name);
        let callback = Box::new(move |event: &Value| -> bool {
            match weak.upgrade() {
                Some(view) => dispatch_event(&view, node_index, &full_name, event)
                    .unwrap_or(true),
                None => true,
            }
        });
        let disposable = match &output.target {
            Some(target) => view
                .renderer
                .listen_global(target, &output.event_name, callback),
            None => view.renderer.listen(el, &output.event_name, callback),
        };
        view.disposables.borrow_mut()[def.disposable_index + i] = Some(disposable);
    }
}

/// "window:resize"-style composite names for globally targeted outputs.
pub fn element_event_full_name(target: Option<&str>, name: &str) -> String {
    match target {
        Some(target) => format!("{}:{}", target, name),
        None => name.to_string(),
    }
}

/// Dirty-checks the render bindings of an element and pushes changed values
/// to the renderer.
pub fn check_and_update_element(view: &View, def: &NodeDef, values: &[Value]) -> Result<bool> {
    let mut changed = false;
    for (i, value) in values.iter().enumerate() {
        if crate::view::util::check_and_update_binding(view, def, i, value) {
            changed = true;
            check_and_update_element_value(view, def, i, value);
        }
    }
    Ok(changed)
}

fn check_and_update_element_value(view: &View, def: &NodeDef, binding_index: usize, value: &Value) {
    let binding = &def.bindings[binding_index];
    let render_node = crate::view::types::as_element_data(view, def.index)
        .render_element
        .clone();
    let renderer = &view.renderer;
    let name = &binding.name;
    match binding.binding_type {
        BindingType::ElementAttribute => {
            let value = sanitized(view, binding, value);
            if value.is_nullish() {
                renderer.remove_attribute(&render_node, name);
            } else {
                renderer.set_attribute(&render_node, name, &value.render_string());
            }
        }
        BindingType::ElementClass => {
            if value.is_truthy() {
                renderer.add_class(&render_node, name);
            } else {
                renderer.remove_class(&render_node, name);
            }
        }
        BindingType::ElementStyle => {
            if value.is_nullish() {
                renderer.remove_style(&render_node, name);
            } else {
                let mut style = value.render_string();
                if let Some(suffix) = &binding.suffix {
                    style.push_str(suffix);
                }
                renderer.set_style(&render_node, name, &style);
            }
        }
        BindingType::ElementProperty => {
            let value = sanitized(view, binding, value);
            renderer.set_property(&render_node, name, &value);
        }
        _ => panic!(
            "Illegal State: binding {} of node {} is not an element binding",
            binding_index, def.index
        ),
    }
}

fn sanitized(view: &View, binding: &BindingDef, value: &Value) -> Value {
    match binding.security_context {
        Some(context) => view.root.sanitizer.sanitize(context, value),
        None => value.clone(),
    }
}
