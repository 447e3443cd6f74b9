//! Binding Values
//!
//! The original runtime passes `any` everywhere; bindings, contexts, provider
//! instances and injected refs all travel through the same dynamically typed
//! slots. This module is the Rust rendition: a single `Value` union with the
//! JavaScript-flavored identity semantics change detection depends on
//! (`loose_identical`, see packages/core/src/facade/lang.ts#looseIdentical).

use crate::change_detection::PipeTransform;
use crate::directive::Directive;
use crate::render::api::Renderer;
use crate::view::refs::{ElementRef, TemplateRef, ViewContainerRef, ViewInjector, ViewRef};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A dynamically typed binding/DI value.
///
/// Aggregates (`List`, `Map`) and instances compare by `Rc` identity, exactly
/// like object identity in the source runtime; primitives compare by value
/// with both-NaN treated as unchanged.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<IndexMap<String, Value>>>),
    /// A directive/component/class-provider instance.
    Instance(Rc<RefCell<dyn Directive>>),
    /// A pipe instance, resolvable as the first argument of a pure pipe
    /// expression.
    Pipe(Rc<dyn PipeTransform>),
    /// A raw render node, as produced by query value type `ElementRef`.
    ElementRef(ElementRef),
    TemplateRef(TemplateRef),
    ViewContainerRef(ViewContainerRef),
    ChangeDetectorRef(ViewRef),
    Injector(ViewInjector),
    Renderer(Rc<dyn Renderer>),
}

impl Value {
    pub fn number(n: f64) -> Value {
        Value::Number(n)
    }

    pub fn str(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn list(values: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(values)))
    }

    pub fn map(entries: IndexMap<String, Value>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn instance(instance: Rc<RefCell<dyn Directive>>) -> Value {
        Value::Instance(instance)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// JavaScript truthiness, used for class bindings.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_instance(&self) -> Option<Rc<RefCell<dyn Directive>>> {
        match self {
            Value::Instance(i) => Some(i.clone()),
            _ => None,
        }
    }

    pub fn as_pipe(&self) -> Option<Rc<dyn PipeTransform>> {
        match self {
            Value::Pipe(p) => Some(p.clone()),
            _ => None,
        }
    }

    /// Stringification for interpolations and attribute values. Nullish
    /// values render as the empty string, matching the original's
    /// `value != null ? value.toString() : ''`.
    pub fn render_string(&self) -> String {
        match self {
            Value::Undefined | Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => js_number_to_string(*n),
            Value::Str(s) => s.to_string(),
            Value::List(values) => values
                .borrow()
                .iter()
                .map(Value::render_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) => "[object Object]".to_string(),
            Value::Instance(_) => "[object Object]".to_string(),
            Value::Pipe(_) => "[object Object]".to_string(),
            Value::ElementRef(_) => "[object ElementRef]".to_string(),
            Value::TemplateRef(_) => "[object TemplateRef]".to_string(),
            Value::ViewContainerRef(_) => "[object ViewContainerRef]".to_string(),
            Value::ChangeDetectorRef(_) => "[object ChangeDetectorRef]".to_string(),
            Value::Injector(_) => "[object Injector]".to_string(),
            Value::Renderer(_) => "[object Renderer]".to_string(),
        }
    }
}

/// The dirty-check comparison: `===` except that two NaNs count as unchanged.
pub fn loose_identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => true,
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
        (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
        (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
        (Value::Pipe(a), Value::Pipe(b)) => Rc::ptr_eq(a, b),
        (Value::ElementRef(a), Value::ElementRef(b)) => a.loose_eq(b),
        (Value::TemplateRef(a), Value::TemplateRef(b)) => a.loose_eq(b),
        (Value::ViewContainerRef(a), Value::ViewContainerRef(b)) => a.loose_eq(b),
        (Value::ChangeDetectorRef(a), Value::ChangeDetectorRef(b)) => a.loose_eq(b),
        (Value::Injector(a), Value::Injector(b)) => a.loose_eq(b),
        (Value::Renderer(a), Value::Renderer(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        loose_identical(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", js_number_to_string(*n)),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(values) => write!(f, "List(len={})", values.borrow().len()),
            Value::Map(entries) => write!(f, "Map(len={})", entries.borrow().len()),
            Value::Instance(_) => write!(f, "Instance"),
            Value::Pipe(_) => write!(f, "Pipe"),
            Value::ElementRef(_) => write!(f, "ElementRef"),
            Value::TemplateRef(_) => write!(f, "TemplateRef"),
            Value::ViewContainerRef(_) => write!(f, "ViewContainerRef"),
            Value::ChangeDetectorRef(_) => write!(f, "ChangeDetectorRef"),
            Value::Injector(_) => write!(f, "Injector"),
            Value::Renderer(_) => write!(f, "Renderer"),
        }
    }
}

/// Number-to-string following the JavaScript rules observable in rendered
/// output: integral doubles print without a fractional part.
fn js_number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
