//! Pure Expression Tests
//!
//! Corresponds to packages/core/test/view/pure_expression_spec.ts

use angular_core::change_detection::PipeTransform;
use angular_core::di::Token;
use angular_core::value::{loose_identical, Value};
use angular_core::view::element::element_def;
use angular_core::view::provider::pipe_def;
use angular_core::view::pure_expression::{pure_array_def, pure_object_def, pure_pipe_def};
use angular_core::view::types::{as_provider_data, NodeFlags, PipeCtor, ViewFlags, ViewUpdateFn};
use angular_core::view::view::{check_and_update_view, check_no_changes_view, view_def};
use angular_core::view::ViewError;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[path = "helper.rs"]
mod helper;
use helper::{binding_source, create_test_view, set_binding_values, BindingSource};

type Results = Rc<RefCell<Vec<Value>>>;

/// Update function that records the value each checked node reports.
fn capture_update(source: BindingSource, results: Results) -> ViewUpdateFn {
    Rc::new(move |check, view| {
        let entries = source.borrow().clone();
        for (node_index, values) in entries {
            if let Some(value) = check(view, node_index, &values)? {
                results.borrow_mut().push(value);
            }
        }
        Ok(())
    })
}

#[test]
fn should_memoize_array_literals_across_unchanged_passes() {
    let source = binding_source(vec![(0, vec![Value::number(1.0), Value::str("a")])]);
    let results: Results = Rc::new(RefCell::new(Vec::new()));
    let def = view_def(
        ViewFlags::NONE,
        vec![pure_array_def(2)],
        Some(capture_update(source.clone(), results.clone())),
        None,
        None,
    )
    .unwrap();
    let (view, _root) = create_test_view(def);

    check_and_update_view(&view).unwrap();
    check_and_update_view(&view).unwrap();
    let first = results.borrow()[0].clone();
    let second = results.borrow()[1].clone();
    assert!(
        loose_identical(&first, &second),
        "unchanged arguments keep the memoized list identity"
    );

    set_binding_values(&source, 0, vec![Value::number(2.0), Value::str("a")]);
    check_and_update_view(&view).unwrap();
    let third = results.borrow()[2].clone();
    assert!(!loose_identical(&first, &third));
    match &third {
        Value::List(values) => {
            assert_eq!(*values.borrow(), vec![Value::number(2.0), Value::str("a")]);
        }
        other => panic!("expected a list, got {:?}", other),
    }
}

#[test]
fn should_build_object_literals_with_declared_prop_names() {
    let source = binding_source(vec![(0, vec![Value::str("x"), Value::number(7.0)])]);
    let results: Results = Rc::new(RefCell::new(Vec::new()));
    let def = view_def(
        ViewFlags::NONE,
        vec![pure_object_def(&["name", "count"])],
        Some(capture_update(source.clone(), results.clone())),
        None,
        None,
    )
    .unwrap();
    let (view, _root) = create_test_view(def);

    check_and_update_view(&view).unwrap();
    match &results.borrow()[0] {
        Value::Map(entries) => {
            let entries = entries.borrow();
            assert_eq!(entries.get("name"), Some(&Value::str("x")));
            assert_eq!(entries.get("count"), Some(&Value::number(7.0)));
        }
        other => panic!("expected a map, got {:?}", other),
    }

    check_and_update_view(&view).unwrap();
    let first = results.borrow()[0].clone();
    let second = results.borrow()[1].clone();
    assert!(loose_identical(&first, &second));
}

struct UpperPipe {
    calls: Rc<Cell<usize>>,
}

impl PipeTransform for UpperPipe {
    fn transform(&self, args: &[Value]) -> Value {
        self.calls.set(self.calls.get() + 1);
        Value::str(args[0].render_string().to_uppercase())
    }
}

#[test]
fn should_run_pure_pipes_only_when_an_argument_changes() {
    let calls = Rc::new(Cell::new(0));
    let calls_for_ctor = calls.clone();
    let ctor: PipeCtor = Rc::new(move |_deps| {
        Rc::new(UpperPipe {
            calls: calls_for_ctor.clone(),
        }) as Rc<dyn PipeTransform>
    });
    let arg = Rc::new(RefCell::new(Value::str("hello")));
    let results: Results = Rc::new(RefCell::new(Vec::new()));
    let arg_for_update = arg.clone();
    let results_for_update = results.clone();
    let update: ViewUpdateFn = Rc::new(move |check, view| {
        let pipe = as_provider_data(view, 1)
            .instance
            .clone()
            .unwrap_or(Value::Undefined);
        let values = [pipe, arg_for_update.borrow().clone()];
        if let Some(value) = check(view, 2, &values)? {
            results_for_update.borrow_mut().push(value);
        }
        Ok(())
    });
    let def = view_def(
        ViewFlags::NONE,
        vec![
            element_def(NodeFlags::NONE, &[], None, 2, "div", &[], Vec::new(), &[]),
            pipe_def(NodeFlags::NONE, Token::new("upper"), ctor, Vec::new()),
            pure_pipe_def(1),
        ],
        Some(update),
        None,
        None,
    )
    .unwrap();
    let (view, _root) = create_test_view(def);

    check_and_update_view(&view).unwrap();
    assert_eq!(results.borrow()[0], Value::str("HELLO"));
    assert_eq!(calls.get(), 1);

    check_and_update_view(&view).unwrap();
    assert_eq!(calls.get(), 1, "same argument, the memoized value is reused");

    *arg.borrow_mut() = Value::str("bye");
    check_and_update_view(&view).unwrap();
    assert_eq!(calls.get(), 2);
    assert_eq!(results.borrow().last(), Some(&Value::str("BYE")));
}

#[test]
fn should_pass_check_no_changes_while_arguments_are_stable() {
    let source = binding_source(vec![(0, vec![Value::number(1.0)])]);
    let results: Results = Rc::new(RefCell::new(Vec::new()));
    let def = view_def(
        ViewFlags::NONE,
        vec![pure_array_def(1)],
        Some(capture_update(source.clone(), results)),
        None,
        None,
    )
    .unwrap();
    let (view, _root) = create_test_view(def);

    check_and_update_view(&view).unwrap();
    check_no_changes_view(&view).unwrap();

    set_binding_values(&source, 0, vec![Value::number(2.0)]);
    let err = check_no_changes_view(&view).unwrap_err();
    assert!(matches!(err, ViewError::ExpressionChanged { .. }));
}
