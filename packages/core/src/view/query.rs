//! Queries
//!
//! Corresponds to packages/core/src/view/query.ts
//!
//! Content and view queries recompute lazily: results are collected only when
//! the query is dirty, and structural changes (embedded view attach/detach/
//! move) dirty exactly the queries whose filter bits reach the mutation site.

use crate::value::Value;
use crate::view::errors::{Result, ViewError};
use crate::view::refs::{create_template_ref, create_view_container_ref, ElementRef};
use crate::view::types::{
    as_element_data, as_provider_data, as_query_list, as_query_list_mut, NodeDef, NodeFlags,
    NodePayload, NodeType, QueryBindingDef, QueryBindingType, QueryDef, QueryId, QueryValueType,
    View, ViewState,
};
use crate::view::util::{filter_query_id, is_embedded_view};

/// Live result list of one query node. Starts dirty; view creation runs the
/// first fill.
pub struct QueryList {
    values: Vec<Value>,
    dirty: bool,
}

impl Default for QueryList {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryList {
    pub fn new() -> Self {
        QueryList {
            values: Vec::new(),
            dirty: true,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn reset(&mut self, values: Vec<Value>) {
        self.values = values;
        self.dirty = false;
    }

    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Builds the descriptor for a query node. Flags carry `HAS_CONTENT_QUERY`
/// or `HAS_VIEW_QUERY`.
pub fn query_def(
    flags: NodeFlags,
    id: QueryId,
    bindings: &[(&str, QueryBindingType)],
) -> NodeDef {
    NodeDef {
        node_type: NodeType::Query,
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
        ng_content_index: None,
        child_count: 0,
        matched_query_ids: 0,
        matched_queries: Vec::new(),
        bindings: Vec::new(),
        disposable_count: 0,
        payload: NodePayload::Query(QueryDef {
            id,
            filter_id: filter_query_id(id),
            bindings: bindings
                .iter()
                .map(|(prop_name, binding_type)| QueryBindingDef {
                    prop_name: prop_name.to_string(),
                    binding_type: *binding_type,
                })
                .collect(),
        }),
    }
}

pub fn create_query() -> QueryList {
    QueryList::new()
}

/// Dirties every query an embedded view attach/detach/move can influence:
/// content queries on the parent chain of each traversed anchor, plus view
/// queries of the component/root view the chain ends in.
pub fn dirty_parent_queries(view: &View) {
    let mut view = view.clone();
    let mut query_ids = view.def.node_matched_queries;
    loop {
        let parent = match view.parent() {
            Some(parent) if is_embedded_view(&view) => parent,
            _ => break,
        };
        let anchor_index = match view.parent_node_index {
            Some(i) => i,
            None => break,
        };
        query_ids |= parent.def.nodes[anchor_index].matched_query_ids;
        let end = match parent.def.nodes[anchor_index].parent {
            Some(p) => p + parent.def.nodes[p].child_count,
            None => parent.def.nodes.len() - 1,
        };
        let mut i = 0;
        while i <= end {
            let def = &parent.def.nodes[i];
            if def.flags.contains(NodeFlags::HAS_CONTENT_QUERY) {
                if let Some(query) = def.query() {
                    if query.filter_id & query_ids == query.filter_id {
                        as_query_list_mut(&parent, i).set_dirty();
                    }
                }
            }
            // Skip elements that end before the anchor and subtrees without
            // content queries.
            let closed_before_anchor =
                def.node_type == NodeType::Element && i + def.child_count < anchor_index;
            if closed_before_anchor || !def.child_flags.contains(NodeFlags::HAS_CONTENT_QUERY) {
                i += def.child_count;
            }
            i += 1;
        }
        view = parent;
    }
    if view.def.node_flags.contains(NodeFlags::HAS_VIEW_QUERY) {
        let len = view.def.nodes.len();
        let mut i = 0;
        while i < len {
            let def = &view.def.nodes[i];
            if def.flags.contains(NodeFlags::HAS_VIEW_QUERY) {
                as_query_list_mut(&view, i).set_dirty();
            }
            // Only root nodes carry view queries.
            i += def.child_count + 1;
        }
    }
}

/// Recomputes a dirty query and pushes the result to the owning directive
/// (the query node's parent for content queries, the view's component for
/// view queries).
pub fn check_and_update_query(view: &View, def: &NodeDef) -> Result<()> {
    if !as_query_list(view, def.index).is_dirty() {
        return Ok(());
    }
    let query = match def.query() {
        Some(q) => q,
        None => panic!("Illegal State: node {} is not a query", def.index),
    };
    let (new_values, owner) = if def.flags.contains(NodeFlags::HAS_CONTENT_QUERY) {
        // Query node is a child of the directive node, which in turn sits on
        // the host element.
        let directive_index = match def.parent {
            Some(i) => i,
            None => panic!("Illegal State: content query {} without a parent", def.index),
        };
        let element_index = match view.def.nodes[directive_index].parent {
            Some(i) => i,
            None => {
                panic!(
                    "Illegal State: content query {} without a host element",
                    def.index
                )
            }
        };
        let element_def = &view.def.nodes[element_index];
        let mut values = Vec::new();
        calc_query_values(
            view,
            element_index,
            element_index + element_def.child_count,
            query,
            &mut values,
        );
        let owner = as_provider_data(view, directive_index)
            .instance
            .clone()
            .and_then(|v| v.as_instance());
        (values, owner)
    } else {
        let mut values = Vec::new();
        if !view.def.nodes.is_empty() {
            calc_query_values(view, 0, view.def.nodes.len() - 1, query, &mut values);
        }
        let owner = view.component.borrow().as_instance();
        (values, owner)
    };
    as_query_list_mut(view, def.index).reset(new_values.clone());
    if let Some(owner) = owner {
        for binding in &query.bindings {
            let bound_value = match binding.binding_type {
                QueryBindingType::First => {
                    new_values.first().cloned().unwrap_or(Value::Null)
                }
                QueryBindingType::All => Value::list(new_values.clone()),
            };
            owner.borrow_mut().set_input(&binding.prop_name, &bound_value);
        }
    }
    Ok(())
}

/// A query that is still dirty during a check-no-changes pass means a
/// detection pass changed results after they were checked.
pub fn check_no_changes_query(view: &View, def: &NodeDef) -> Result<()> {
    if as_query_list(view, def.index).is_dirty() {
        view.set_state(ViewState::ERRORED);
        return Err(ViewError::ExpressionChanged {
            node_index: def.index,
            binding_index: 0,
            old_value: "Query not dirty".to_string(),
            new_value: "Query dirty".to_string(),
            first_check: view.state().contains(ViewState::FIRST_CHECK),
        });
    }
    Ok(())
}

fn calc_query_values(
    view: &View,
    start_index: usize,
    end_index: usize,
    query: &QueryDef,
    values: &mut Vec<Value>,
) {
    let mut i = start_index;
    while i <= end_index {
        let def = &view.def.nodes[i];
        for (query_id, value_type) in &def.matched_queries {
            if *query_id == query.id {
                values.push(query_value(view, def, *value_type));
            }
        }
        let template_matches = def
            .element()
            .and_then(|e| e.template.as_ref())
            .map(|t| t.node_matched_queries & query.filter_id == query.filter_id)
            .unwrap_or(false);
        if template_matches && def.flags.contains(NodeFlags::HAS_EMBEDDED_VIEWS) {
            // Embedded views attached at the place of their template
            // contribute their matches in order.
            let embedded: Vec<View> = as_element_data(view, i).embedded_views.clone();
            for embedded_view in &embedded {
                if embedded_view.def.node_matched_queries & query.filter_id == query.filter_id {
                    let len = embedded_view.def.nodes.len();
                    if len > 0 {
                        calc_query_values(embedded_view, 0, len - 1, query, values);
                    }
                }
            }
        }
        if def.child_matched_queries & query.filter_id != query.filter_id {
            // No descendant can match; skip the subtree.
            i += def.child_count;
        }
        i += 1;
    }
}

fn query_value(view: &View, def: &NodeDef, value_type: QueryValueType) -> Value {
    match value_type {
        QueryValueType::ElementRef => Value::ElementRef(ElementRef::new(
            as_element_data(view, def.index).render_element.clone(),
        )),
        QueryValueType::TemplateRef => Value::TemplateRef(create_template_ref(view, def.index)),
        QueryValueType::ViewContainerRef => {
            Value::ViewContainerRef(create_view_container_ref(view, def.index))
        }
        QueryValueType::Provider => as_provider_data(view, def.index)
            .instance
            .clone()
            .unwrap_or(Value::Undefined),
    }
}
