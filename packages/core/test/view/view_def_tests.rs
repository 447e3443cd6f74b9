//! View Definition Builder Tests
//!
//! Corresponds to packages/core/test/view/view_def_spec.ts

use angular_core::di::Token;
use angular_core::view::element::{anchor_def, element_def};
use angular_core::view::provider::{directive_def, provider_def};
use angular_core::view::query::query_def;
use angular_core::view::text::text_def;
use angular_core::view::types::{NodeFlags, ProviderSource, ViewFlags};
use angular_core::view::view::view_def;
use angular_core::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

#[path = "helper.rs"]
mod helper;
use helper::test_directive_ctor;

fn log() -> Rc<RefCell<Vec<String>>> {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn should_set_indices_and_parent_links() {
    let def = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 2, "div", &[], Vec::new(), &[]),
            text_def(None, &["a"]),
            text_def(None, &["b"]),
            text_def(None, &["c"]),
        ],
        None,
        None,
        None,
    )
    .unwrap();
    assert_eq!(def.nodes[0].index, 0);
    assert_eq!(def.nodes[1].index, 1);
    assert_eq!(def.nodes[0].parent, None);
    assert_eq!(def.nodes[1].parent, Some(0));
    assert_eq!(def.nodes[2].parent, Some(0));
    assert_eq!(def.nodes[3].parent, None);
}

#[test]
fn should_calculate_reverse_child_order() {
    // Tree: n0 { n1 { n2, n3 }, n4 { n5, n6 } }
    let def = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 6, "a", &[], Vec::new(), &[]),
            element_def(NodeFlags::NONE, &[], None, 2, "b", &[], Vec::new(), &[]),
            text_def(None, &["1"]),
            text_def(None, &["2"]),
            element_def(NodeFlags::NONE, &[], None, 2, "c", &[], Vec::new(), &[]),
            text_def(None, &["3"]),
            text_def(None, &["4"]),
        ],
        None,
        None,
        None,
    )
    .unwrap();
    let reverse: Vec<usize> = def
        .nodes
        .iter()
        .map(|node| node.reverse_child_index)
        .collect();
    assert_eq!(reverse, vec![0, 4, 6, 5, 1, 3, 2]);
    for (position, &node_index) in def.reverse_child_nodes.iter().enumerate() {
        assert_eq!(def.nodes[node_index].reverse_child_index, position);
    }
}

#[test]
fn should_visit_provider_nodes_of_children_before_parents_in_reverse_order() {
    // el0 { dir1, el2 { dir3 } }: the inner directive must be visited before
    // the outer one when iterating reverse child order.
    let log = log();
    let def = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 3, "outer", &[], Vec::new(), &[]),
            directive_def(
                NodeFlags::NONE,
                &[],
                0,
                Token::new("Outer"),
                test_directive_ctor("outer", log.clone()),
                Vec::new(),
                &[],
                &[],
                None,
            ),
            element_def(NodeFlags::NONE, &[], None, 1, "inner", &[], Vec::new(), &[]),
            directive_def(
                NodeFlags::NONE,
                &[],
                0,
                Token::new("Inner"),
                test_directive_ctor("inner", log),
                Vec::new(),
                &[],
                &[],
                None,
            ),
        ],
        None,
        None,
        None,
    )
    .unwrap();
    let inner_position = def.nodes[3].reverse_child_index;
    let outer_position = def.nodes[1].reverse_child_index;
    assert!(inner_position < outer_position);
}

#[test]
fn should_aggregate_child_flags_upward() {
    let def = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 2, "div", &[], Vec::new(), &[]),
            element_def(NodeFlags::NONE, &[], None, 1, "span", &[], Vec::new(), &[]),
            directive_def(
                NodeFlags::ON_INIT | NodeFlags::ON_DESTROY,
                &[],
                0,
                Token::new("D"),
                test_directive_ctor("d", log()),
                Vec::new(),
                &[],
                &[],
                None,
            ),
        ],
        None,
        None,
        None,
    )
    .unwrap();
    assert!(def.nodes[0].child_flags.contains(NodeFlags::ON_INIT));
    assert!(def.nodes[1].child_flags.contains(NodeFlags::ON_DESTROY));
    assert!(def.node_flags.contains(NodeFlags::ON_INIT | NodeFlags::ON_DESTROY));
}

#[test]
fn should_assign_binding_and_disposable_offsets() {
    let def = view_def(
        ViewFlags::NONE,
        vec![
            element_def(
                NodeFlags::NONE,
                &[],
                None,
                2,
                "div",
                &[],
                Vec::new(),
                &[(None, "click")],
            ),
            text_def(None, &["a", "b"]),
            text_def(None, &["c", "-", "-"]),
        ],
        None,
        None,
        None,
    )
    .unwrap();
    assert_eq!(def.nodes[1].binding_index, 0);
    assert_eq!(def.nodes[2].binding_index, 1);
    assert_eq!(def.binding_count, 3);
    assert_eq!(def.nodes[0].disposable_index, 0);
    assert_eq!(def.disposable_count, 1);
}

#[test]
fn should_track_the_component_on_the_host_element() {
    let log = log();
    let component_view = view_def(
        ViewFlags::NONE,
        vec![text_def(None, &["t"])],
        None,
        None,
        None,
    )
    .unwrap();
    let factory = angular_core::view::types::ViewDefinitionFactory::new(move || {
        component_view.clone()
    });
    let def = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 1, "comp", &[], Vec::new(), &[]),
            directive_def(
                NodeFlags::NONE,
                &[],
                0,
                Token::new("Comp"),
                test_directive_ctor("comp", log),
                Vec::new(),
                &[],
                &[],
                Some(angular_core::view::types::ComponentDef {
                    view_def_factory: factory,
                    renderer_type: None,
                }),
            ),
        ],
        None,
        None,
        None,
    )
    .unwrap();
    assert!(def.nodes[1].flags.contains(NodeFlags::HAS_COMPONENT));
    assert_eq!(def.nodes[0].element().unwrap().component_index, Some(1));
}

#[test]
fn should_record_the_last_root_render_node() {
    let def = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 1, "div", &[], Vec::new(), &[]),
            text_def(None, &["in"]),
            text_def(None, &["out"]),
        ],
        None,
        None,
        None,
    )
    .unwrap();
    assert_eq!(def.last_root_node, Some(2));
}

#[test]
fn should_reject_an_empty_node_list() {
    let result = view_def(ViewFlags::NONE, vec![], None, None, None);
    assert!(result.is_err());
    let message = format!("{}", result.unwrap_err());
    assert!(message.contains("empty node list"));
}

#[test]
fn should_reject_providers_outside_of_elements() {
    let result = view_def(
        ViewFlags::NONE,
        vec![provider_def(
            NodeFlags::NONE,
            &[],
            Token::new("Service"),
            ProviderSource::Value(Value::number(1.0)),
            Vec::new(),
        )],
        None,
        None,
        None,
    );
    assert!(result.is_err());
}

#[test]
fn should_reject_content_queries_outside_of_directives() {
    let result = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 1, "div", &[], Vec::new(), &[]),
            query_def(NodeFlags::HAS_CONTENT_QUERY, 1, &[]),
        ],
        None,
        None,
        None,
    );
    assert!(result.is_err());
}

#[test]
fn should_reject_nested_view_queries() {
    let result = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 1, "div", &[], Vec::new(), &[]),
            query_def(NodeFlags::HAS_VIEW_QUERY, 1, &[]),
        ],
        None,
        None,
        None,
    );
    assert!(result.is_err());
}

#[test]
fn should_reject_child_counts_that_leave_the_parent() {
    let result = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 1, "div", &[], Vec::new(), &[]),
            element_def(NodeFlags::NONE, &[], None, 3, "span", &[], Vec::new(), &[]),
            text_def(None, &["a"]),
        ],
        None,
        None,
        None,
    );
    assert!(result.is_err());
}

#[test]
fn should_mark_anchor_defs_with_templates_as_containers() {
    let template = view_def(
        ViewFlags::NONE,
        vec![text_def(None, &["t"])],
        None,
        None,
        None,
    )
    .unwrap();
    let def = view_def(
        ViewFlags::NONE,
        vec![anchor_def(NodeFlags::NONE, &[], None, 0, Some(template))],
        None,
        None,
        None,
    )
    .unwrap();
    assert!(def.nodes[0].flags.contains(NodeFlags::HAS_EMBEDDED_VIEWS));
    assert!(def.node_flags.contains(NodeFlags::HAS_EMBEDDED_VIEWS));
}
