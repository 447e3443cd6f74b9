//! View Engine Types
//!
//! Corresponds to packages/core/src/view/types.ts
//!
//! A view definition is the compiled, immutable description of one template:
//! a flat, depth-first node array plus derived metadata computed once by
//! `view_def`. View data is one live instantiation of such a definition.
//!
//! The original keeps every node definition monomorphic by giving `NodeDef`
//! one field per possible payload; in Rust the payload is a proper tagged
//! union and the runtime node slots are too, with access funneled through the
//! `as_*_data` accessors so every usage site dispatches on the definition's
//! node type first.

use crate::change_detection::PipeTransform;
use crate::di::{DepDef, Injector, Token};
use crate::directive::Directive;
use crate::render::api::{
    DisposableFn, RenderNode, Renderer, RendererFactory, RendererType,
};
use crate::security::{Sanitizer, SecurityContext};
use crate::value::Value;
use crate::view::errors::Result;
use crate::view::query::QueryList;
use bitflags::bitflags;
use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

// -------------------------------------
// Defs
// -------------------------------------

/// One compiled template. Shared (via `Rc`) across all of its instantiations.
pub struct ViewDefinition {
    pub flags: ViewFlags,
    /// Order: depth first; providers before child elements/anchors.
    pub nodes: Vec<NodeDef>,
    /// Aggregated `NodeFlags` for all nodes.
    pub node_flags: NodeFlags,
    /// Filter bits of all queries matched by any node, including queries from
    /// nested templates.
    pub node_matched_queries: u32,
    /// Node indices ordered parents-before-children with children reversed:
    /// iterating yields every node only after all of its descendants.
    pub reverse_child_nodes: Vec<usize>,
    /// The last node without a render parent; insertion point bookkeeping for
    /// embedded view attachment.
    pub last_root_node: Option<usize>,
    pub binding_count: usize,
    pub disposable_count: usize,
    pub update_directives: ViewUpdateFn,
    pub update_renderer: ViewUpdateFn,
    pub handle_event: ViewHandleEventFn,
}

impl std::fmt::Debug for ViewDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewDefinition")
            .field("flags", &self.flags)
            .field("node_flags", &self.node_flags)
            .field("node_matched_queries", &self.node_matched_queries)
            .field("reverse_child_nodes", &self.reverse_child_nodes)
            .field("last_root_node", &self.last_root_node)
            .field("binding_count", &self.binding_count)
            .field("disposable_count", &self.disposable_count)
            .finish_non_exhaustive()
    }
}

/// The generic per-binding check callback handed to generated update
/// functions. Values always travel as one ordered slice; the memoized value of
/// a pure-expression node is returned so call sites can chain results.
pub type NodeCheckFn = fn(&View, usize, &[Value]) -> Result<Option<Value>>;

/// A generated per-view update function ("update directives" or "update
/// renderer"); calls `check` once per bound node, in node order.
pub type ViewUpdateFn = Rc<dyn Fn(NodeCheckFn, &View) -> Result<()>>;

/// Generated event dispatch function. Returns `true` when the default action
/// should proceed (i.e. `preventDefault` was not requested).
pub type ViewHandleEventFn = Rc<dyn Fn(&View, usize, &str, &Value) -> Result<bool>>;

/// Lazily invoked, memoized factory for a component's view definition.
/// The indirection allows mutually recursive components (a component whose
/// template includes itself).
#[derive(Clone)]
pub struct ViewDefinitionFactory {
    cell: Rc<OnceCell<Rc<ViewDefinition>>>,
    factory: Rc<dyn Fn() -> Rc<ViewDefinition>>,
}

impl ViewDefinitionFactory {
    pub fn new(factory: impl Fn() -> Rc<ViewDefinition> + 'static) -> Self {
        Self {
            cell: Rc::new(OnceCell::new()),
            factory: Rc::new(factory),
        }
    }

    pub fn resolve(&self) -> Rc<ViewDefinition> {
        self.cell.get_or_init(|| (self.factory)()).clone()
    }
}

bitflags! {
    /// Bitmask for `ViewDefinition::flags`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ViewFlags: u32 {
        const NONE = 0;
        /// Checks are skipped after the first pass until explicitly re-armed
        /// by an observed input change or an event fired within the view.
        const ON_PUSH = 1 << 1;
    }
}

bitflags! {
    /// Bitmask for `NodeDef::flags`. The hook bits double as the request mask
    /// for children-first lifecycle scheduling; the aggregate OR over subtrees
    /// is what makes subtree skipping sound.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u32 {
        const NONE = 0;
        const ON_INIT = 1 << 0;
        const ON_DESTROY = 1 << 1;
        const DO_CHECK = 1 << 2;
        const ON_CHANGES = 1 << 3;
        const AFTER_CONTENT_INIT = 1 << 4;
        const AFTER_CONTENT_CHECKED = 1 << 5;
        const AFTER_VIEW_INIT = 1 << 6;
        const AFTER_VIEW_CHECKED = 1 << 7;
        const HAS_EMBEDDED_VIEWS = 1 << 8;
        const HAS_COMPONENT = 1 << 9;
        const HAS_CONTENT_QUERY = 1 << 10;
        const HAS_VIEW_QUERY = 1 << 11;
        /// Instantiated on first resolution instead of at view creation.
        const LAZY_PROVIDER = 1 << 12;
        /// Visible only behind private-allowed lookups (component boundary).
        const PRIVATE_PROVIDER = 1 << 13;
    }
}

/// Discriminates node descriptors. Kept separate from the payload so hot loops
/// can branch on a plain enum before touching payload data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Element,
    Text,
    Provider,
    Directive,
    Pipe,
    PureExpression,
    Query,
    NgContent,
}

pub type QueryId = u32;

/// One static template construct.
pub struct NodeDef {
    pub node_type: NodeType,
    /// Set by `view_def`.
    pub index: usize,
    /// Slot of this node in reverse child order. Set by `view_def`.
    pub reverse_child_index: usize,
    pub flags: NodeFlags,
    pub parent: Option<usize>,
    /// Nearest ancestor element that emits a real render node (transparent
    /// containers are skipped). Set by `view_def`.
    pub render_parent: Option<usize>,
    /// Checked against `NgContentDef::index` to find projected nodes.
    pub ng_content_index: Option<usize>,
    /// Number of transitive children, contiguous after this node in DFS order.
    pub child_count: usize,
    /// Aggregated flags of all transitive children. Set by `view_def`.
    pub child_flags: NodeFlags,
    /// Aggregated query filter bits of all transitive children.
    pub child_matched_queries: u32,
    /// Offset of this node's first binding in the view's old-values array.
    pub binding_index: usize,
    pub bindings: Vec<BindingDef>,
    pub disposable_index: usize,
    pub disposable_count: usize,
    /// Queries this node is a result of, with the value kind to report.
    pub matched_queries: Vec<(QueryId, QueryValueType)>,
    pub matched_query_ids: u32,
    pub payload: NodePayload,
}

pub enum NodePayload {
    Element(ElementDef),
    Text(TextDef),
    Provider(ProviderDef),
    PureExpression(PureExpressionDef),
    Query(QueryDef),
    NgContent(NgContentDef),
}

impl NodeDef {
    pub fn element(&self) -> Option<&ElementDef> {
        match &self.payload {
            NodePayload::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn provider(&self) -> Option<&ProviderDef> {
        match &self.payload {
            NodePayload::Provider(p) => Some(p),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&TextDef> {
        match &self.payload {
            NodePayload::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn pure_expression(&self) -> Option<&PureExpressionDef> {
        match &self.payload {
            NodePayload::PureExpression(p) => Some(p),
            _ => None,
        }
    }

    pub fn query(&self) -> Option<&QueryDef> {
        match &self.payload {
            NodePayload::Query(q) => Some(q),
            _ => None,
        }
    }

    pub fn ng_content(&self) -> Option<&NgContentDef> {
        match &self.payload {
            NodePayload::NgContent(c) => Some(c),
            _ => None,
        }
    }

    /// Whether this node declares something injectable (provider, directive
    /// or pipe).
    pub fn is_provider_like(&self) -> bool {
        matches!(
            self.node_type,
            NodeType::Provider | NodeType::Directive | NodeType::Pipe
        )
    }
}

#[derive(Debug, Clone)]
pub struct BindingDef {
    pub binding_type: BindingType,
    pub name: String,
    /// For directive inputs: the pre-minification property name reported in
    /// `SimpleChanges`.
    pub non_minified_name: String,
    pub security_context: Option<SecurityContext>,
    /// Static text following the value (interpolations, style units).
    pub suffix: Option<String>,
}

impl BindingDef {
    pub fn element_attribute(name: &str, security_context: Option<SecurityContext>) -> Self {
        Self {
            binding_type: BindingType::ElementAttribute,
            name: name.to_string(),
            non_minified_name: name.to_string(),
            security_context,
            suffix: None,
        }
    }

    pub fn element_class(name: &str) -> Self {
        Self {
            binding_type: BindingType::ElementClass,
            name: name.to_string(),
            non_minified_name: name.to_string(),
            security_context: None,
            suffix: None,
        }
    }

    pub fn element_style(name: &str, suffix: Option<&str>) -> Self {
        Self {
            binding_type: BindingType::ElementStyle,
            name: name.to_string(),
            non_minified_name: name.to_string(),
            security_context: None,
            suffix: suffix.map(str::to_string),
        }
    }

    pub fn element_property(name: &str, security_context: Option<SecurityContext>) -> Self {
        Self {
            binding_type: BindingType::ElementProperty,
            name: name.to_string(),
            non_minified_name: name.to_string(),
            security_context,
            suffix: None,
        }
    }

    pub fn directive_property(name: &str, non_minified_name: &str) -> Self {
        Self {
            binding_type: BindingType::DirectiveProperty,
            name: name.to_string(),
            non_minified_name: non_minified_name.to_string(),
            security_context: None,
            suffix: None,
        }
    }

    pub fn interpolation(suffix: &str) -> Self {
        Self {
            binding_type: BindingType::Interpolation,
            name: String::new(),
            non_minified_name: String::new(),
            security_context: None,
            suffix: Some(suffix.to_string()),
        }
    }

    pub fn pure_expression_property(name: &str) -> Self {
        Self {
            binding_type: BindingType::PureExpressionProperty,
            name: name.to_string(),
            non_minified_name: name.to_string(),
            security_context: None,
            suffix: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    ElementAttribute,
    ElementClass,
    ElementStyle,
    ElementProperty,
    DirectiveProperty,
    Interpolation,
    PureExpressionProperty,
}

/// What a query reports for a matched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryValueType {
    ElementRef,
    TemplateRef,
    ViewContainerRef,
    Provider,
}

pub struct ElementDef {
    /// `None` for transparent containers and embedded-view anchors, which are
    /// backed by comment nodes.
    pub name: Option<String>,
    pub attrs: Vec<(String, String)>,
    pub outputs: Vec<ElementOutputDef>,
    pub template: Option<Rc<ViewDefinition>>,
    /// Providers visible for DI as seen from this element. Filled by
    /// `view_def` via copy-on-write forking; `None` until then.
    pub public_providers: Option<Rc<ProviderMap>>,
    /// Public plus private providers. Shares the public map until the first
    /// private provider forks it, so private entries shadow public ones.
    pub all_providers: Option<Rc<ProviderMap>>,
    /// Index of the component directive hosted on this element.
    pub component_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ElementOutputDef {
    /// `None` targets the element itself; otherwise "window", "document" or
    /// "body".
    pub target: Option<String>,
    pub event_name: String,
}

/// Token→node-index lookup table with parent delegation. Forked
/// copy-on-write by the definition builder so elements without providers
/// share their parent's table.
#[derive(Default)]
pub struct ProviderMap {
    parent: Option<Rc<ProviderMap>>,
    entries: RefCell<IndexMap<Token, usize>>,
}

impl ProviderMap {
    pub fn root() -> Rc<ProviderMap> {
        Rc::new(ProviderMap::default())
    }

    pub fn fork(parent: &Rc<ProviderMap>) -> Rc<ProviderMap> {
        Rc::new(ProviderMap {
            parent: Some(parent.clone()),
            entries: RefCell::new(IndexMap::new()),
        })
    }

    pub fn insert(&self, token: Token, node_index: usize) {
        self.entries.borrow_mut().insert(token, node_index);
    }

    /// Own entries shadow parent entries for the same token.
    pub fn get(&self, token: &Token) -> Option<usize> {
        if let Some(index) = self.entries.borrow().get(token) {
            return Some(*index);
        }
        self.parent.as_ref().and_then(|p| p.get(token))
    }
}

pub type DirectiveCtor = Rc<dyn Fn(&[Value]) -> Rc<RefCell<dyn Directive>>>;
pub type FactoryFn = Rc<dyn Fn(&[Value]) -> Value>;
pub type PipeCtor = Rc<dyn Fn(&[Value]) -> Rc<dyn PipeTransform>>;

/// How a provider node produces its value.
#[derive(Clone)]
pub enum ProviderSource {
    Class(DirectiveCtor),
    Factory(FactoryFn),
    /// Alias: resolves `deps[0]` instead of constructing anything.
    UseExisting,
    Value(Value),
    Pipe(PipeCtor),
}

pub struct ProviderDef {
    pub token: Token,
    pub provide: ProviderSource,
    pub deps: Vec<DepDef>,
    pub outputs: Vec<DirectiveOutputDef>,
    pub component: Option<ComponentDef>,
}

#[derive(Debug, Clone)]
pub struct DirectiveOutputDef {
    pub prop_name: String,
    pub event_name: String,
}

/// Component payload of a directive node: the factory for its own view
/// definition and an optional type-scoped renderer configuration.
#[derive(Clone)]
pub struct ComponentDef {
    pub view_def_factory: ViewDefinitionFactory,
    pub renderer_type: Option<Rc<RendererType>>,
}

pub struct TextDef {
    /// Static text before the first interpolated value; the static segments
    /// between/after values live in the bindings' suffixes.
    pub prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PureExpressionType {
    Array,
    Object,
    Pipe,
}

pub struct PureExpressionDef {
    pub kind: PureExpressionType,
    /// Property names for `Object` literals, in binding order.
    pub prop_names: Vec<String>,
}

pub struct QueryDef {
    pub id: QueryId,
    pub filter_id: u32,
    pub bindings: Vec<QueryBindingDef>,
}

#[derive(Debug, Clone)]
pub struct QueryBindingDef {
    pub prop_name: String,
    pub binding_type: QueryBindingType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryBindingType {
    First,
    All,
}

pub struct NgContentDef {
    /// Checked against `NodeDef::ng_content_index` to find the nodes projected
    /// into this slot. A node carrying an ng-content payload can itself be
    /// re-projected.
    pub index: usize,
}

// -------------------------------------
// Data
// -------------------------------------

/// Live view instance. One per component view / embedded view instantiation.
///
/// Interior mutability is per-field so traversals never hold a long-lived
/// borrow of the whole view while calling user code.
pub struct ViewData {
    pub def: Rc<ViewDefinition>,
    pub root: Rc<RootData>,
    pub renderer: Rc<dyn Renderer>,
    /// Owner: child views never outlive their parent, so the back pointer is
    /// weak while the parent holds the strong reference in its node data.
    parent: Option<Weak<ViewData>>,
    /// Index of the node in the parent view that declared this view (the
    /// component's directive node, or the embedded view's anchor element).
    pub parent_node_index: Option<usize>,
    pub component: RefCell<Value>,
    pub context: RefCell<Value>,
    /// Never iterate this directly: dispatch on `def.nodes[i]` and go through
    /// the `as_*_data` accessors.
    nodes: Vec<RefCell<NodeData>>,
    state: Cell<ViewState>,
    pub old_values: RefCell<Vec<Value>>,
    pub disposables: RefCell<Vec<Option<DisposableFn>>>,
}

pub type View = Rc<ViewData>;

impl ViewData {
    pub(crate) fn new(
        def: Rc<ViewDefinition>,
        root: Rc<RootData>,
        renderer: Rc<dyn Renderer>,
        parent: Option<&View>,
        parent_node_index: Option<usize>,
    ) -> View {
        let node_count = def.nodes.len();
        let binding_count = def.binding_count;
        let disposable_count = def.disposable_count;
        let mut nodes = Vec::with_capacity(node_count);
        nodes.resize_with(node_count, || RefCell::new(NodeData::None));
        let mut disposables = Vec::new();
        disposables.resize_with(disposable_count, || None);
        Rc::new(ViewData {
            def,
            root,
            renderer,
            parent: parent.map(Rc::downgrade),
            parent_node_index,
            component: RefCell::new(Value::Undefined),
            context: RefCell::new(Value::Undefined),
            nodes,
            state: Cell::new(ViewState::FIRST_CHECK | ViewState::CHECKS_ENABLED),
            old_values: RefCell::new(vec![Value::Undefined; binding_count]),
            disposables: RefCell::new(disposables),
        })
    }

    pub fn parent(&self) -> Option<View> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn state(&self) -> ViewState {
        self.state.get()
    }

    pub fn set_state(&self, flags: ViewState) {
        self.state.set(self.state.get() | flags);
    }

    pub fn clear_state(&self, flags: ViewState) {
        self.state.set(self.state.get() - flags);
    }

    pub(crate) fn node_data(&self, index: usize) -> &RefCell<NodeData> {
        &self.nodes[index]
    }
}

bitflags! {
    /// Bitmask of per-view runtime states.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ViewState: u32 {
        const FIRST_CHECK = 1 << 0;
        const CHECKS_ENABLED = 1 << 1;
        const ERRORED = 1 << 2;
        const DESTROYED = 1 << 3;
    }
}

/// Runtime data of one instantiated node. Slot `None` is used for nodes
/// without live state (ng-content, and every slot before population).
pub enum NodeData {
    None,
    Element(ElementData),
    Text(TextData),
    Provider(ProviderData),
    PureExpression(PureExpressionData),
    Query(QueryList),
}

pub struct ElementData {
    /// The element, or the comment backing an anchor/container.
    pub render_element: RenderNode,
    pub embedded_views: Vec<View>,
}

pub struct TextData {
    pub render_text: RenderNode,
}

pub struct ProviderData {
    /// `None` while a lazy provider has not been resolved yet.
    pub instance: Option<Value>,
    /// Only set for component directive nodes.
    pub component_view: Option<View>,
}

pub struct PureExpressionData {
    pub value: Value,
}

fn node_type_mismatch(index: usize, expected: &str) -> ! {
    panic!(
        "Illegal State: node data at index {} is not {}; dispatch on the definition's node type first",
        index, expected
    );
}

/// Accessor for element node data, enforcing that usage sites dispatched on
/// the definition's node type.
pub fn as_element_data(view: &ViewData, index: usize) -> Ref<'_, ElementData> {
    Ref::map(view.node_data(index).borrow(), |n| match n {
        NodeData::Element(e) => e,
        _ => node_type_mismatch(index, "element data"),
    })
}

pub fn as_element_data_mut(view: &ViewData, index: usize) -> RefMut<'_, ElementData> {
    RefMut::map(view.node_data(index).borrow_mut(), |n| match n {
        NodeData::Element(e) => e,
        _ => node_type_mismatch(index, "element data"),
    })
}

pub fn as_text_data(view: &ViewData, index: usize) -> Ref<'_, TextData> {
    Ref::map(view.node_data(index).borrow(), |n| match n {
        NodeData::Text(t) => t,
        _ => node_type_mismatch(index, "text data"),
    })
}

pub fn as_provider_data(view: &ViewData, index: usize) -> Ref<'_, ProviderData> {
    Ref::map(view.node_data(index).borrow(), |n| match n {
        NodeData::Provider(p) => p,
        _ => node_type_mismatch(index, "provider data"),
    })
}

pub fn as_provider_data_mut(view: &ViewData, index: usize) -> RefMut<'_, ProviderData> {
    RefMut::map(view.node_data(index).borrow_mut(), |n| match n {
        NodeData::Provider(p) => p,
        _ => node_type_mismatch(index, "provider data"),
    })
}

pub fn as_pure_expression_data(view: &ViewData, index: usize) -> Ref<'_, PureExpressionData> {
    Ref::map(view.node_data(index).borrow(), |n| match n {
        NodeData::PureExpression(p) => p,
        _ => node_type_mismatch(index, "pure expression data"),
    })
}

pub fn as_pure_expression_data_mut(
    view: &ViewData,
    index: usize,
) -> RefMut<'_, PureExpressionData> {
    RefMut::map(view.node_data(index).borrow_mut(), |n| match n {
        NodeData::PureExpression(p) => p,
        _ => node_type_mismatch(index, "pure expression data"),
    })
}

pub fn as_query_list(view: &ViewData, index: usize) -> Ref<'_, QueryList> {
    Ref::map(view.node_data(index).borrow(), |n| match n {
        NodeData::Query(q) => q,
        _ => node_type_mismatch(index, "a query list"),
    })
}

pub fn as_query_list_mut(view: &ViewData, index: usize) -> RefMut<'_, QueryList> {
    RefMut::map(view.node_data(index).borrow_mut(), |n| match n {
        NodeData::Query(q) => q,
        _ => node_type_mismatch(index, "a query list"),
    })
}

/// Per-tree collaborators shared by every view under one root.
pub struct RootData {
    pub injector: Rc<dyn Injector>,
    /// Nodes projected into the root component, by ng-content index.
    pub projectable_nodes: Vec<Vec<RenderNode>>,
    /// Selector the root element is resolved from, when rendering into an
    /// existing host.
    pub selector_or_node: Option<String>,
    pub renderer_factory: Rc<dyn RendererFactory>,
    pub renderer: Rc<dyn Renderer>,
    pub sanitizer: Rc<dyn Sanitizer>,
}
