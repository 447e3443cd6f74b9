//! Text Nodes
//!
//! Corresponds to packages/core/src/view/text.ts

use crate::render::api::RenderNode;
use crate::value::Value;
use crate::view::errors::Result;
use crate::view::types::{
    as_text_data, BindingDef, NodeDef, NodeFlags, NodePayload, NodeType, TextData, TextDef, View,
};
use crate::view::util::{check_and_update_binding, get_parent_render_element};

/// Builds the descriptor for a text node. `static_text` holds the literal
/// segments around the interpolated values: one more entry than there are
/// bindings, first entry being the prefix.
pub fn text_def(ng_content_index: Option<usize>, static_text: &[&str]) -> NodeDef {
    let bindings: Vec<BindingDef> = static_text[1..]
        .iter()
        .map(|suffix| BindingDef::interpolation(suffix))
        .collect();
    NodeDef {
        node_type: NodeType::Text,
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
        bindings,
        disposable_count: 0,
        payload: NodePayload::Text(TextDef {
            prefix: static_text[0].to_string(),
        }),
    }
}

pub fn create_text(view: &View, render_host: Option<&RenderNode>, def: &NodeDef) -> TextData {
    let text_def = match def.text() {
        Some(t) => t,
        None => panic!("Illegal State: node {} is not a text node", def.index),
    };
    let render_text = view.renderer.create_text(&text_def.prefix);
    if let Some(parent) = get_parent_render_element(view, render_host, def) {
        view.renderer.append_child(&parent, &render_text);
    }
    TextData { render_text }
}

/// Dirty-checks the interpolated values of a text node and rewrites the full
/// rendered string when any of them changed.
pub fn check_and_update_text(view: &View, def: &NodeDef, values: &[Value]) -> Result<bool> {
    let mut changed = false;
    for (i, value) in values.iter().enumerate() {
        if check_and_update_binding(view, def, i, value) {
            changed = true;
        }
    }
    if changed {
        let text = interpolate(def, values);
        let render_node = as_text_data(view, def.index).render_text.clone();
        view.renderer.set_value(&render_node, &text);
    }
    Ok(changed)
}

fn interpolate(def: &NodeDef, values: &[Value]) -> String {
    let text_def = match def.text() {
        Some(t) => t,
        None => panic!("Illegal State: node {} is not a text node", def.index),
    };
    let mut out = text_def.prefix.clone();
    for (i, value) in values.iter().enumerate() {
        out.push_str(&value.render_string());
        if let Some(suffix) = &def.bindings[i].suffix {
            out.push_str(suffix);
        }
    }
    out
}
