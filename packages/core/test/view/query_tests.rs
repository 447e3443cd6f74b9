//! Query Tests
//!
//! Corresponds to packages/core/test/view/query_spec.ts

use angular_core::di::Token;
use angular_core::value::{loose_identical, Value};
use angular_core::view::element::{anchor_def, element_def};
use angular_core::view::provider::directive_def;
use angular_core::view::query::query_def;
use angular_core::view::refs::{create_template_ref, create_view_container_ref};
use angular_core::view::text::text_def;
use angular_core::view::types::{
    as_element_data, as_provider_data, as_query_list, NodeFlags, QueryBindingType,
    QueryValueType, ViewFlags,
};
use angular_core::view::view::{check_and_update_view, check_no_changes_view, view_def};
use angular_core::view::ViewError;
use std::cell::RefCell;
use std::rc::Rc;

#[path = "helper.rs"]
mod helper;
use helper::{create_test_view, test_directive_ctor};

fn log() -> Rc<RefCell<Vec<String>>> {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn should_fill_view_queries_at_view_creation() {
    let def = view_def(
        ViewFlags::NONE,
        vec![
            query_def(NodeFlags::HAS_VIEW_QUERY, 1, &[]),
            element_def(
                NodeFlags::NONE,
                &[(1, QueryValueType::ElementRef)],
                None,
                0,
                "div",
                &[],
                Vec::new(),
                &[],
            ),
        ],
        None,
        None,
        None,
    )
    .unwrap();
    let (view, _root) = create_test_view(def);
    {
        let results = as_query_list(&view, 0);
        assert!(!results.is_dirty(), "view creation fills the query");
        assert_eq!(results.len(), 1);
        match results.first() {
            Some(Value::ElementRef(element_ref)) => {
                let el = as_element_data(&view, 1).render_element.clone();
                assert!(element_ref.native_element().ptr_eq(&el));
            }
            other => panic!("expected an ElementRef, got {:?}", other),
        }
    }

    // A detection pass leaves the settled query untouched.
    check_and_update_view(&view).unwrap();
    assert!(!as_query_list(&view, 0).is_dirty());
    assert_eq!(as_query_list(&view, 0).len(), 1);
}

#[test]
fn should_report_template_and_container_refs_for_matched_anchors() {
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
        vec![
            query_def(NodeFlags::HAS_VIEW_QUERY, 4, &[]),
            anchor_def(
                NodeFlags::NONE,
                &[
                    (4, QueryValueType::TemplateRef),
                    (4, QueryValueType::ViewContainerRef),
                ],
                None,
                0,
                Some(template),
            ),
        ],
        None,
        None,
        None,
    )
    .unwrap();
    let (view, _root) = create_test_view(def);
    check_and_update_view(&view).unwrap();
    let results = as_query_list(&view, 0);
    assert_eq!(results.len(), 2);
    assert!(matches!(results.values()[0], Value::TemplateRef(_)));
    assert!(matches!(results.values()[1], Value::ViewContainerRef(_)));
}

#[test]
fn should_report_directive_instances_as_provider_values() {
    let def = view_def(
        ViewFlags::NONE,
        vec![
            query_def(NodeFlags::HAS_VIEW_QUERY, 5, &[]),
            element_def(NodeFlags::NONE, &[], None, 1, "div", &[], Vec::new(), &[]),
            directive_def(
                NodeFlags::NONE,
                &[(5, QueryValueType::Provider)],
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
    let (view, _root) = create_test_view(def);
    check_and_update_view(&view).unwrap();
    let instance = as_provider_data(&view, 2)
        .instance
        .clone()
        .unwrap_or(Value::Undefined);
    let results = as_query_list(&view, 0);
    assert_eq!(results.len(), 1);
    assert!(loose_identical(results.first().unwrap(), &instance));
}

#[test]
fn should_push_content_query_results_to_the_owning_directive() {
    let log = log();
    let def = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 3, "parent", &[], Vec::new(), &[]),
            directive_def(
                NodeFlags::NONE,
                &[],
                1,
                Token::new("WithQuery"),
                test_directive_ctor("wq", log.clone()),
                Vec::new(),
                &[],
                &[],
                None,
            ),
            query_def(
                NodeFlags::HAS_CONTENT_QUERY,
                2,
                &[
                    ("first", QueryBindingType::First),
                    ("all", QueryBindingType::All),
                ],
            ),
            element_def(
                NodeFlags::NONE,
                &[(2, QueryValueType::ElementRef)],
                None,
                0,
                "child",
                &[],
                Vec::new(),
                &[],
            ),
        ],
        None,
        None,
        None,
    )
    .unwrap();
    let (view, _root) = create_test_view(def);
    assert_eq!(
        log.borrow().clone(),
        vec!["wq.set(first=ElementRef)", "wq.set(all=List(len=1))"],
        "the owning directive sees its results right after creation"
    );

    // A pass without structural changes leaves the query alone.
    log.borrow_mut().clear();
    check_and_update_view(&view).unwrap();
    assert!(log.borrow().is_empty());
}

fn container_view_def() -> (Rc<angular_core::view::types::ViewDefinition>, Rc<RefCell<Vec<String>>>) {
    let log = log();
    let template = view_def(
        ViewFlags::NONE,
        vec![element_def(
            NodeFlags::NONE,
            &[(3, QueryValueType::ElementRef)],
            None,
            0,
            "item",
            &[],
            Vec::new(),
            &[],
        )],
        None,
        None,
        None,
    )
    .unwrap();
    let def = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 3, "parent", &[], Vec::new(), &[]),
            directive_def(
                NodeFlags::NONE,
                &[],
                1,
                Token::new("WithQuery"),
                test_directive_ctor("wq", log.clone()),
                Vec::new(),
                &[],
                &[],
                None,
            ),
            query_def(
                NodeFlags::HAS_CONTENT_QUERY,
                3,
                &[("items", QueryBindingType::All)],
            ),
            anchor_def(NodeFlags::NONE, &[], None, 0, Some(template)),
        ],
        None,
        None,
        None,
    )
    .unwrap();
    (def, log)
}

#[test]
fn should_track_embedded_views_through_structural_changes() {
    let (def, log) = container_view_def();
    let (view, _root) = create_test_view(def);
    assert_eq!(log.borrow().clone(), vec!["wq.set(items=List(len=0))"]);
    check_and_update_view(&view).unwrap();

    let template_ref = create_template_ref(&view, 3);
    let container = create_view_container_ref(&view, 3);
    let view_ref = template_ref.create_embedded_view(Value::Undefined).unwrap();
    container.insert(&view_ref, None).unwrap();
    assert!(
        as_query_list(&view, 2).is_dirty(),
        "attaching a view dirties the queries above the anchor"
    );

    log.borrow_mut().clear();
    check_and_update_view(&view).unwrap();
    assert_eq!(log.borrow().clone(), vec!["wq.set(items=List(len=1))"]);

    container.detach(Some(0)).unwrap();
    log.borrow_mut().clear();
    check_and_update_view(&view).unwrap();
    assert_eq!(log.borrow().clone(), vec!["wq.set(items=List(len=0))"]);
}

#[test]
fn should_fail_check_no_changes_when_a_structural_change_was_not_detected() {
    let (def, _log) = container_view_def();
    let (view, _root) = create_test_view(def);
    check_and_update_view(&view).unwrap();
    check_no_changes_view(&view).unwrap();

    let template_ref = create_template_ref(&view, 3);
    let container = create_view_container_ref(&view, 3);
    let view_ref = template_ref.create_embedded_view(Value::Undefined).unwrap();
    container.insert(&view_ref, None).unwrap();

    let err = check_no_changes_view(&view).unwrap_err();
    assert!(matches!(err, ViewError::ExpressionChanged { .. }));
}
