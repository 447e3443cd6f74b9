//! Pure Expressions
//!
//! Corresponds to packages/core/src/view/pure_expression.ts
//!
//! Memoized array/object literals and pure pipe applications: the node's
//! value is rebuilt only when one of its arguments changed, so downstream
//! identity-based dirty checks stay quiet for structurally stable data.

use crate::value::Value;
use crate::view::errors::Result;
use crate::view::types::{
    as_pure_expression_data, as_pure_expression_data_mut, BindingDef, NodeDef, NodeFlags,
    NodePayload, NodeType, PureExpressionDef, PureExpressionType, View,
};
use crate::view::util::check_and_update_binding;
use indexmap::IndexMap;

pub fn pure_array_def(arg_count: usize) -> NodeDef {
    let bindings = (0..arg_count)
        .map(|_| BindingDef::pure_expression_property(""))
        .collect();
    pure_expression_node(PureExpressionType::Array, Vec::new(), bindings)
}

pub fn pure_object_def(prop_names: &[&str]) -> NodeDef {
    let bindings = prop_names
        .iter()
        .map(|name| BindingDef::pure_expression_property(name))
        .collect();
    pure_expression_node(
        PureExpressionType::Object,
        prop_names.iter().map(|n| n.to_string()).collect(),
        bindings,
    )
}

/// A pure pipe application with `arg_count` arguments. At check time the
/// first value is the pipe instance (resolved from the sibling pipe node),
/// the rest are the transform arguments.
pub fn pure_pipe_def(arg_count: usize) -> NodeDef {
    let bindings = (0..=arg_count)
        .map(|_| BindingDef::pure_expression_property(""))
        .collect();
    pure_expression_node(PureExpressionType::Pipe, Vec::new(), bindings)
}

fn pure_expression_node(
    kind: PureExpressionType,
    prop_names: Vec<String>,
    bindings: Vec<BindingDef>,
) -> NodeDef {
    NodeDef {
        node_type: NodeType::PureExpression,
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
        ng_content_index: None,
        child_count: 0,
        matched_query_ids: 0,
        matched_queries: Vec::new(),
        bindings,
        disposable_count: 0,
        payload: NodePayload::PureExpression(PureExpressionDef { kind, prop_names }),
    }
}

/// Dirty-checks the arguments; rebuilds and memoizes the value when any
/// changed, otherwise returns the memoized one untouched (identity
/// preserved).
pub fn check_and_update_pure_expression(
    view: &View,
    def: &NodeDef,
    values: &[Value],
) -> Result<Option<Value>> {
    let mut changed = false;
    for (i, value) in values.iter().enumerate() {
        if check_and_update_binding(view, def, i, value) {
            changed = true;
        }
    }
    if changed {
        let pure_def = match def.pure_expression() {
            Some(p) => p,
            None => panic!("Illegal State: node {} is not a pure expression", def.index),
        };
        let value = match pure_def.kind {
            PureExpressionType::Array => Value::list(values.to_vec()),
            PureExpressionType::Object => {
                let mut entries = IndexMap::new();
                for (name, value) in pure_def.prop_names.iter().zip(values.iter()) {
                    entries.insert(name.clone(), value.clone());
                }
                Value::map(entries)
            }
            PureExpressionType::Pipe => {
                let pipe = match values[0].as_pipe() {
                    Some(pipe) => pipe,
                    None => {
                        panic!("Illegal State: node {} has no pipe instance", def.index)
                    }
                };
                pipe.transform(&values[1..])
            }
        };
        as_pure_expression_data_mut(view, def.index).value = value.clone();
        Ok(Some(value))
    } else {
        Ok(Some(as_pure_expression_data(view, def.index).value.clone()))
    }
}
