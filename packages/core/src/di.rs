//! Dependency Injection Primitives
//!
//! Corresponds to packages/core/src/di/injector.ts plus the token-key scheme
//! of packages/core/src/view/util.ts. Tokens are interned strings; the
//! original's `tokenKey(token)` reference-to-string mapping collapses to the
//! string itself.

use crate::value::Value;
use bitflags::bitflags;
use std::fmt;
use std::rc::Rc;

/// An injection token. Compared and hashed by key content.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(Rc<str>);

impl Token {
    pub fn new(key: impl AsRef<str>) -> Self {
        Token(Rc::from(key.as_ref()))
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token keys for the fixed set of framework-special values the dependency
/// resolver can synthesize from the current element/view, without any provider
/// being declared for them.
pub mod tokens {
    pub const RENDERER: &str = "Renderer";
    pub const ELEMENT_REF: &str = "ElementRef";
    pub const VIEW_CONTAINER_REF: &str = "ViewContainerRef";
    pub const TEMPLATE_REF: &str = "TemplateRef";
    pub const CHANGE_DETECTOR_REF: &str = "ChangeDetectorRef";
    pub const INJECTOR: &str = "Injector";
}

bitflags! {
    /// Bitmask for DI flags on a single dependency.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DepFlags: u32 {
        const NONE = 0;
        /// Start resolution at the parent element and never see private
        /// providers of the requesting element.
        const SKIP_SELF = 1 << 0;
        /// Resolve to `Value::Null` instead of failing when nothing matches.
        const OPTIONAL = 1 << 1;
        /// The dependency is a literal value carried on the `DepDef` itself.
        const VALUE = 1 << 2;
    }
}

/// A single constructor/factory dependency of a provider node.
#[derive(Clone, Debug)]
pub struct DepDef {
    pub flags: DepFlags,
    pub token: Token,
    /// Only set for `DepFlags::VALUE` dependencies.
    pub value: Option<Value>,
}

impl DepDef {
    pub fn new(token: Token) -> Self {
        Self {
            flags: DepFlags::NONE,
            token,
            value: None,
        }
    }

    pub fn with_flags(flags: DepFlags, token: Token) -> Self {
        Self {
            flags,
            token,
            value: None,
        }
    }

    pub fn value_literal(value: Value) -> Self {
        Self {
            flags: DepFlags::VALUE,
            token: Token::new("<literal>"),
            value: Some(value),
        }
    }
}

/// The root injector is an opaque collaborator: the per-view provider chain
/// falls back to it when a token is not declared anywhere up the view tree.
pub trait Injector {
    fn get(&self, token: &Token) -> Option<Value>;
}

/// Injector that never resolves anything. The default root for tests and
/// detached view trees.
#[derive(Debug, Default)]
pub struct NullInjector;

impl Injector for NullInjector {
    fn get(&self, _token: &Token) -> Option<Value> {
        None
    }
}
