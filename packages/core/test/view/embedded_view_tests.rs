//! Embedded View and View Container Tests
//!
//! Corresponds to packages/core/test/view/embedded_view_spec.ts

use angular_core::di::Token;
use angular_core::value::Value;
use angular_core::view::element::{anchor_def, element_def};
use angular_core::view::provider::directive_def;
use angular_core::view::refs::{create_template_ref, create_view_container_ref};
use angular_core::view::text::text_def;
use angular_core::view::types::{
    as_element_data, NodeFlags, ViewDefinition, ViewFlags, ViewUpdateFn,
};
use angular_core::view::view::{check_and_update_view, view_def};
use std::cell::RefCell;
use std::rc::Rc;

#[path = "helper.rs"]
mod helper;
use helper::{create_test_view, mock_data, test_directive_ctor, MockKind};

/// A container under a named element: the anchor comment is the only static
/// child, embedded views render one text node showing their context.
fn container_def() -> Rc<ViewDefinition> {
    let update_renderer: ViewUpdateFn = Rc::new(|check, view| {
        let context = view.context.borrow().clone();
        check(view, 0, &[context])?;
        Ok(())
    });
    let template = view_def(
        ViewFlags::NONE,
        vec![text_def(None, &["", ""])],
        None,
        Some(update_renderer),
        None,
    )
    .unwrap();
    view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 1, "div", &[], Vec::new(), &[]),
            anchor_def(NodeFlags::NONE, &[], None, 0, Some(template)),
        ],
        None,
        None,
        None,
    )
    .unwrap()
}

fn child_snapshot(view: &angular_core::view::types::View) -> Vec<(MockKind, String)> {
    let div = as_element_data(view, 0).render_element.clone();
    let children = mock_data(&div).children.borrow().clone();
    children
        .iter()
        .map(|child| {
            let data = mock_data(child);
            (data.kind.clone(), data.value.borrow().clone())
        })
        .collect()
}

#[test]
fn should_splice_embedded_views_after_the_anchor_in_container_order() {
    let (view, _root) = create_test_view(container_def());
    let template_ref = create_template_ref(&view, 1);
    let container = create_view_container_ref(&view, 1);
    assert!(container.is_empty());

    let view_a = template_ref.create_embedded_view(Value::str("A")).unwrap();
    container.insert(&view_a, None).unwrap();
    let view_b = template_ref.create_embedded_view(Value::str("B")).unwrap();
    container.insert(&view_b, None).unwrap();
    check_and_update_view(&view).unwrap();
    assert_eq!(
        child_snapshot(&view),
        vec![
            (MockKind::Comment, "".to_string()),
            (MockKind::Text, "A".to_string()),
            (MockKind::Text, "B".to_string()),
        ]
    );

    // Insertion at an index splices right after the anchor.
    let view_c = template_ref.create_embedded_view(Value::str("C")).unwrap();
    container.insert(&view_c, Some(0)).unwrap();
    check_and_update_view(&view).unwrap();
    assert_eq!(
        child_snapshot(&view),
        vec![
            (MockKind::Comment, "".to_string()),
            (MockKind::Text, "C".to_string()),
            (MockKind::Text, "A".to_string()),
            (MockKind::Text, "B".to_string()),
        ]
    );

    assert_eq!(container.len(), 3);
    assert_eq!(container.index_of(&view_c), Some(0));
    assert_eq!(container.index_of(&view_b), Some(2));
    assert!(container.get(2).is_some());
    assert!(container.get(3).is_none());
}

#[test]
fn should_move_views_within_their_container() {
    let (view, _root) = create_test_view(container_def());
    let template_ref = create_template_ref(&view, 1);
    let container = create_view_container_ref(&view, 1);
    let view_a = template_ref.create_embedded_view(Value::str("A")).unwrap();
    let view_b = template_ref.create_embedded_view(Value::str("B")).unwrap();
    let view_c = template_ref.create_embedded_view(Value::str("C")).unwrap();
    container.insert(&view_a, None).unwrap();
    container.insert(&view_b, None).unwrap();
    container.insert(&view_c, None).unwrap();
    check_and_update_view(&view).unwrap();

    container.move_view(&view_a, 2).unwrap();
    assert_eq!(container.index_of(&view_a), Some(2));
    assert_eq!(
        child_snapshot(&view),
        vec![
            (MockKind::Comment, "".to_string()),
            (MockKind::Text, "B".to_string()),
            (MockKind::Text, "C".to_string()),
            (MockKind::Text, "A".to_string()),
        ]
    );

    let unattached = template_ref.create_embedded_view(Value::str("X")).unwrap();
    assert!(container.move_view(&unattached, 0).is_err());
}

#[test]
fn should_detach_views_without_destroying_them() {
    let (view, _root) = create_test_view(container_def());
    let template_ref = create_template_ref(&view, 1);
    let container = create_view_container_ref(&view, 1);
    let view_a = template_ref.create_embedded_view(Value::str("A")).unwrap();
    container.insert(&view_a, None).unwrap();
    check_and_update_view(&view).unwrap();

    let detached = container.detach(Some(0)).unwrap();
    assert!(detached.is_some());
    assert_eq!(container.len(), 0);
    assert_eq!(
        child_snapshot(&view),
        vec![(MockKind::Comment, "".to_string())]
    );
    assert!(!view_a.destroyed(), "detach keeps the view alive");

    // A detached view can be re-inserted.
    container.insert(&view_a, None).unwrap();
    assert_eq!(container.len(), 1);
    assert_eq!(
        child_snapshot(&view),
        vec![
            (MockKind::Comment, "".to_string()),
            (MockKind::Text, "A".to_string()),
        ]
    );
}

fn container_with_directive_def(log: Rc<RefCell<Vec<String>>>) -> Rc<ViewDefinition> {
    let template = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 1, "item", &[], Vec::new(), &[]),
            directive_def(
                NodeFlags::ON_DESTROY,
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
    view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 1, "div", &[], Vec::new(), &[]),
            anchor_def(NodeFlags::NONE, &[], None, 0, Some(template)),
        ],
        None,
        None,
        None,
    )
    .unwrap()
}

#[test]
fn should_destroy_removed_views() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let (view, _root) = create_test_view(container_with_directive_def(log.clone()));
    let template_ref = create_template_ref(&view, 1);
    let container = create_view_container_ref(&view, 1);
    let view_ref = template_ref.create_embedded_view(Value::Undefined).unwrap();
    container.insert(&view_ref, None).unwrap();
    assert!(log.borrow().is_empty());

    container.remove(Some(0)).unwrap();
    assert_eq!(container.len(), 0);
    assert_eq!(log.borrow().clone(), vec!["inner.ngOnDestroy"]);
    assert!(view_ref.destroyed());
}

#[test]
fn should_clear_all_views_from_a_container() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let (view, _root) = create_test_view(container_with_directive_def(log.clone()));
    let template_ref = create_template_ref(&view, 1);
    let container = create_view_container_ref(&view, 1);
    for _ in 0..3 {
        let view_ref = template_ref.create_embedded_view(Value::Undefined).unwrap();
        container.insert(&view_ref, None).unwrap();
    }
    assert_eq!(container.len(), 3);

    container.clear().unwrap();
    assert_eq!(container.len(), 0);
    assert_eq!(log.borrow().len(), 3);
    assert_eq!(
        child_snapshot(&view),
        vec![(MockKind::Comment, "".to_string())]
    );
}

#[test]
fn should_expose_the_anchor_through_template_and_container_refs() {
    let (view, _root) = create_test_view(container_def());
    let template_ref = create_template_ref(&view, 1);
    let container = create_view_container_ref(&view, 1);
    let anchor = as_element_data(&view, 1).render_element.clone();
    let from_template = template_ref.element_ref().unwrap();
    let from_container = container.element().unwrap();
    assert!(from_template.native_element().ptr_eq(&anchor));
    assert!(from_container.native_element().ptr_eq(&anchor));
    assert_eq!(mock_data(&anchor).kind, MockKind::Comment);
}
