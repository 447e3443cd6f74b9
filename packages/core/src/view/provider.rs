//! Providers, Directives and Pipes
//!
//! Corresponds to packages/core/src/view/provider.ts
//!
//! Covers instantiation of provider-like nodes, the hierarchical dependency
//! walk, directive input checking with `SimpleChanges` accumulation, and
//! children-first lifecycle scheduling.

use crate::change_detection::{SimpleChange, SimpleChanges};
use crate::di::{tokens, DepDef, DepFlags, Token};
use crate::value::Value;
use crate::view::errors::{Result, ViewError};
use crate::view::refs::{
    create_injector, create_template_ref, create_view_container_ref, ElementRef, ViewRef,
};
use crate::view::types::{
    as_element_data, as_provider_data, as_provider_data_mut, ComponentDef, DirectiveCtor,
    DirectiveOutputDef, NodeDef, NodeFlags, NodePayload, NodeType, PipeCtor, ProviderDef,
    ProviderSource, QueryId, QueryValueType, View, ViewFlags, ViewState,
};
use crate::view::util::{
    dispatch_event, is_component_view, matched_query_ids, view_parent_el,
};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::rc::Rc;

/// Builds the descriptor for a directive node. Components additionally carry
/// a `ComponentDef` and the `HAS_COMPONENT` flag.
#[allow(clippy::too_many_arguments)]
pub fn directive_def(
    flags: NodeFlags,
    matched_queries: &[(QueryId, QueryValueType)],
    child_count: usize,
    token: Token,
    ctor: DirectiveCtor,
    deps: Vec<DepDef>,
    props: &[(&str, &str)],
    outputs: &[(&str, &str)],
    component: Option<ComponentDef>,
) -> NodeDef {
    let bindings = props
        .iter()
        .map(|(prop, non_minified)| {
            crate::view::types::BindingDef::directive_property(prop, non_minified)
        })
        .collect();
    let outputs = outputs
        .iter()
        .map(|(prop_name, event_name)| DirectiveOutputDef {
            prop_name: prop_name.to_string(),
            event_name: event_name.to_string(),
        })
        .collect();
    let flags = if component.is_some() {
        flags | NodeFlags::HAS_COMPONENT
    } else {
        flags
    };
    provider_node(
        NodeType::Directive,
        flags,
        matched_queries,
        child_count,
        token,
        ProviderSource::Class(ctor),
        deps,
        bindings,
        outputs,
        component,
    )
}

/// Builds the descriptor for a plain provider node.
pub fn provider_def(
    flags: NodeFlags,
    matched_queries: &[(QueryId, QueryValueType)],
    token: Token,
    provide: ProviderSource,
    deps: Vec<DepDef>,
) -> NodeDef {
    provider_node(
        NodeType::Provider,
        flags,
        matched_queries,
        0,
        token,
        provide,
        deps,
        Vec::new(),
        Vec::new(),
        None,
    )
}

/// Builds the descriptor for a pipe node. Pipes instantiate against their
/// declaring component's injection context, not the embedded view they sit in.
pub fn pipe_def(flags: NodeFlags, token: Token, ctor: PipeCtor, deps: Vec<DepDef>) -> NodeDef {
    provider_node(
        NodeType::Pipe,
        flags,
        &[],
        0,
        token,
        ProviderSource::Pipe(ctor),
        deps,
        Vec::new(),
        Vec::new(),
        None,
    )
}

#[allow(clippy::too_many_arguments)]
fn provider_node(
    node_type: NodeType,
    flags: NodeFlags,
    matched_queries: &[(QueryId, QueryValueType)],
    child_count: usize,
    token: Token,
    provide: ProviderSource,
    deps: Vec<DepDef>,
    bindings: Vec<crate::view::types::BindingDef>,
    outputs: Vec<DirectiveOutputDef>,
    component: Option<ComponentDef>,
) -> NodeDef {
    NodeDef {
        node_type,
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
        child_count,
        matched_query_ids: matched_query_ids(matched_queries),
        matched_queries: matched_queries.to_vec(),
        bindings,
        disposable_count: outputs.len(),
        payload: NodePayload::Provider(ProviderDef {
            token,
            provide,
            deps,
            outputs,
            component,
        }),
    }
}

/// Instantiates a plain provider node, unless it is lazy.
pub fn create_provider_instance(view: &View, def: &NodeDef) -> Result<Option<Value>> {
    if def.flags.contains(NodeFlags::LAZY_PROVIDER) {
        Ok(None)
    } else {
        instantiate_provider(view, def).map(Some)
    }
}

fn instantiate_provider(view: &View, def: &NodeDef) -> Result<Value> {
    let provider = match def.provider() {
        Some(p) => p,
        None => panic!("Illegal State: node {} is not a provider", def.index),
    };
    // A private provider is allowed to see the other private providers on its
    // element.
    let allow_private = def.flags.contains(NodeFlags::PRIVATE_PROVIDER);
    match &provider.provide {
        ProviderSource::Class(ctor) => {
            let deps = resolve_deps(view, def.parent, allow_private, &provider.deps)?;
            Ok(Value::Instance(ctor(&deps)))
        }
        ProviderSource::Factory(factory) => {
            let deps = resolve_deps(view, def.parent, allow_private, &provider.deps)?;
            Ok(factory(&deps))
        }
        ProviderSource::UseExisting => {
            resolve_dep(view, def.parent, allow_private, &provider.deps[0], None)
        }
        ProviderSource::Value(value) => Ok(value.clone()),
        ProviderSource::Pipe(_) => create_pipe_instance(view, def),
    }
}

/// Instantiates a directive node and wires its declared outputs to the event
/// dispatcher, keyed by the host element's node index.
pub fn create_directive_instance(view: &View, def: &NodeDef) -> Result<Value> {
    let provider = match def.provider() {
        Some(p) => p,
        None => panic!("Illegal State: node {} is not a directive", def.index),
    };
    let ctor = match &provider.provide {
        ProviderSource::Class(ctor) => ctor.clone(),
        _ => panic!("Illegal State: directive node {} without a class", def.index),
    };
    // Components see the private providers on their own element.
    let allow_private = def.flags.contains(NodeFlags::HAS_COMPONENT);
    let deps = resolve_deps(view, def.parent, allow_private, &provider.deps)?;
    let instance = ctor(&deps);
    for (i, output) in provider.outputs.iter().enumerate() {
        let emitter = instance.borrow().output(&output.prop_name).ok_or_else(|| {
            ViewError::illegal_definition(format!(
                "directive at node {} has no output named '{}'",
                def.index, output.prop_name
            ))
        })?;
        let weak = Rc::downgrade(view);
        let el_index = match def.parent {
            Some(parent) => parent,
            None => def.index,
        };
        let event_name = output.event_name.clone();
        let subscription = emitter.subscribe(move |event: &Value| {
            if let Some(view) = weak.upgrade() {
                let _ = dispatch_event(&view, el_index, &event_name, event);
            }
        });
        view.disposables.borrow_mut()[def.disposable_index + i] = Some(Box::new(move || {
            subscription.unsubscribe();
        }));
    }
    Ok(Value::Instance(instance))
}

/// Pipes inject against the view of their declaring component, so a pipe in
/// an embedded view shares the component's injection context.
fn create_pipe_instance(view: &View, def: &NodeDef) -> Result<Value> {
    let provider = match def.provider() {
        Some(p) => p,
        None => panic!("Illegal State: node {} is not a pipe", def.index),
    };
    let ctor = match &provider.provide {
        ProviderSource::Pipe(ctor) => ctor.clone(),
        _ => panic!("Illegal State: pipe node {} without a factory", def.index),
    };
    let mut comp_view = view.clone();
    while comp_view.parent().is_some() && !is_component_view(&comp_view) {
        match comp_view.parent() {
            Some(parent) => comp_view = parent,
            None => break,
        }
    }
    let (dep_view, dep_el, allow_private) = match comp_view.parent() {
        // The component's hook into its parent: private deps are in reach.
        Some(host_view) => (host_view, view_parent_el(&comp_view), true),
        None => (view.clone(), def.parent, false),
    };
    let deps = resolve_deps(&dep_view, dep_el, allow_private, &provider.deps)?;
    Ok(Value::Pipe(ctor(&deps)))
}

fn resolve_deps(
    view: &View,
    el_index: Option<usize>,
    allow_private: bool,
    deps: &[DepDef],
) -> Result<SmallVec<[Value; 10]>> {
    deps.iter()
        .map(|dep| resolve_dep(view, el_index, allow_private, dep, None))
        .collect()
}

/// The hierarchical dependency walk: element providers, then up through parent
/// elements and parent views, with the root injector as the final fallback.
///
/// Framework tokens resolve positionally against the element the walk is
/// currently standing on.
pub fn resolve_dep(
    view: &View,
    el_index: Option<usize>,
    allow_private: bool,
    dep: &DepDef,
    not_found_value: Option<Value>,
) -> Result<Value> {
    if dep.flags.contains(DepFlags::VALUE) {
        return Ok(dep.value.clone().unwrap_or(Value::Undefined));
    }
    let mut not_found_value = not_found_value;
    if dep.flags.contains(DepFlags::OPTIONAL) {
        not_found_value = Some(Value::Null);
    }
    let mut view = view.clone();
    let mut el_index = el_index;
    let mut allow_private = allow_private;
    if dep.flags.contains(DepFlags::SKIP_SELF) {
        allow_private = false;
        el_index = el_index.and_then(|i| view.def.nodes[i].parent);
    }
    loop {
        if let Some(el) = el_index {
            match dep.token.key() {
                tokens::RENDERER => {
                    let comp_view = find_comp_view(&view, el, allow_private);
                    return Ok(Value::Renderer(comp_view.renderer.clone()));
                }
                tokens::ELEMENT_REF => {
                    return Ok(Value::ElementRef(ElementRef::new(
                        as_element_data(&view, el).render_element.clone(),
                    )));
                }
                tokens::VIEW_CONTAINER_REF => {
                    return Ok(Value::ViewContainerRef(create_view_container_ref(&view, el)));
                }
                tokens::TEMPLATE_REF => {
                    let has_template = view.def.nodes[el]
                        .element()
                        .map(|e| e.template.is_some())
                        .unwrap_or(false);
                    if has_template {
                        return Ok(Value::TemplateRef(create_template_ref(&view, el)));
                    }
                }
                tokens::CHANGE_DETECTOR_REF => {
                    let cd_view = find_comp_view(&view, el, allow_private);
                    return Ok(Value::ChangeDetectorRef(ViewRef::new(&cd_view)));
                }
                tokens::INJECTOR => {
                    return Ok(Value::Injector(create_injector(&view, el)));
                }
                _ => {
                    let el_def = &view.def.nodes[el];
                    let providers = el_def.element().and_then(|e| {
                        if allow_private {
                            e.all_providers.clone()
                        } else {
                            e.public_providers.clone()
                        }
                    });
                    if let Some(providers) = providers {
                        if let Some(provider_index) = providers.get(&dep.token) {
                            let existing =
                                as_provider_data(&view, provider_index).instance.clone();
                            let value = match existing {
                                Some(value) => value,
                                None => {
                                    // Lazy provider, first resolution.
                                    let value = instantiate_provider(
                                        &view,
                                        &view.def.nodes[provider_index],
                                    )?;
                                    as_provider_data_mut(&view, provider_index).instance =
                                        Some(value.clone());
                                    value
                                }
                            };
                            return Ok(value);
                        }
                    }
                }
            }
        }
        // Crossing a component boundary upward re-opens private providers on
        // the host element.
        allow_private = is_component_view(&view);
        el_index = view_parent_el(&view);
        match view.parent() {
            Some(parent) => view = parent,
            None => break,
        }
    }
    if let Some(value) = view.root.injector.get(&dep.token) {
        return Ok(value);
    }
    if let Some(value) = not_found_value {
        return Ok(value);
    }
    Err(ViewError::DependencyNotFound {
        token: dep.token.key().to_string(),
    })
}

/// The component view an element's `Renderer` and `ChangeDetectorRef` belong
/// to: the hosted component's own view when private lookups are allowed,
/// otherwise the view the element lives in.
fn find_comp_view(view: &View, el_index: usize, allow_private: bool) -> View {
    if allow_private {
        let component_index = view.def.nodes[el_index]
            .element()
            .and_then(|e| e.component_index);
        if let Some(component_index) = component_index {
            let component_view = as_provider_data(view, component_index).component_view.clone();
            if let Some(component_view) = component_view {
                return component_view;
            }
        }
    }
    let mut comp_view = view.clone();
    while comp_view.parent().is_some() && !is_component_view(&comp_view) {
        match comp_view.parent() {
            Some(parent) => comp_view = parent,
            None => break,
        }
    }
    comp_view
}

/// Dirty-checks a directive's inputs, pushes changed ones through
/// `set_input`, then runs `OnChanges`/`OnInit`/`DoCheck` as flagged.
pub fn check_and_update_directive(
    view: &View,
    def: &NodeDef,
    values: &[Value],
) -> Result<Option<Value>> {
    let instance = {
        as_provider_data(view, def.index)
            .instance
            .clone()
            .and_then(|v| v.as_instance())
    };
    let instance = match instance {
        Some(instance) => instance,
        None => panic!("Illegal State: directive at node {} not created", def.index),
    };
    let mut changes: Option<SimpleChanges> = None;
    for (i, value) in values.iter().enumerate() {
        changes = check_and_update_prop(view, def, &instance, i, value, changes);
    }
    if let Some(changes) = changes {
        instance.borrow_mut().ng_on_changes(&changes);
    }
    let first_check = view.state().contains(ViewState::FIRST_CHECK);
    if first_check && def.flags.contains(NodeFlags::ON_INIT) {
        instance.borrow_mut().ng_on_init();
    }
    if def.flags.contains(NodeFlags::DO_CHECK) {
        instance.borrow_mut().ng_do_check();
    }
    Ok(None)
}

fn check_and_update_prop(
    view: &View,
    def: &NodeDef,
    instance: &Rc<std::cell::RefCell<dyn crate::directive::Directive>>,
    binding_index: usize,
    value: &Value,
    mut changes: Option<SimpleChanges>,
) -> Option<SimpleChanges> {
    let mut change: Option<SimpleChange> = None;
    let changed = if def.flags.contains(NodeFlags::ON_CHANGES) {
        let old_value = view.old_values.borrow()[def.binding_index + binding_index].clone();
        let changed = crate::view::util::check_and_update_binding(view, def, binding_index, value);
        if changed {
            change = Some(SimpleChange::new(
                old_value,
                value.clone(),
                view.state().contains(ViewState::FIRST_CHECK),
            ));
        }
        changed
    } else {
        crate::view::util::check_and_update_binding(view, def, binding_index, value)
    };
    if changed {
        // An observed input change re-arms an OnPush component view.
        if def.flags.contains(NodeFlags::HAS_COMPONENT) {
            let component_view = as_provider_data(view, def.index).component_view.clone();
            if let Some(component_view) = component_view {
                if component_view.def.flags.contains(ViewFlags::ON_PUSH) {
                    component_view.set_state(ViewState::CHECKS_ENABLED);
                }
            }
        }
        let binding = &def.bindings[binding_index];
        instance.borrow_mut().set_input(&binding.name, value);
        if let Some(change) = change {
            changes
                .get_or_insert_with(IndexMap::new)
                .insert(binding.non_minified_name.clone(), change);
        }
    }
    changes
}

/// Runs the requested lifecycle hooks over one view in reverse child order,
/// so every node's hooks run after all of its descendants'. Subtrees whose
/// aggregated child flags carry none of the requested hooks are skipped
/// wholesale.
pub fn call_lifecycle_hooks_children_first(view: &View, lifecycles: NodeFlags) {
    if !view.def.node_flags.intersects(lifecycles) {
        return;
    }
    let len = view.def.nodes.len();
    let mut i = 0;
    while i < len {
        let node_index = view.def.reverse_child_nodes[i];
        let def = &view.def.nodes[node_index];
        if def.flags.intersects(lifecycles) {
            let instance = {
                as_provider_data(view, node_index)
                    .instance
                    .clone()
                    .and_then(|v| v.as_instance())
            };
            if let Some(instance) = instance {
                call_provider_lifecycles(&instance, def.flags & lifecycles);
            }
        } else if !def.child_flags.intersects(lifecycles) {
            // Hooks are aggregated upward, so this subtree has none of them.
            i += def.child_count;
        }
        i += 1;
    }
}

fn call_provider_lifecycles(
    instance: &Rc<std::cell::RefCell<dyn crate::directive::Directive>>,
    lifecycles: NodeFlags,
) {
    if lifecycles.contains(NodeFlags::AFTER_CONTENT_INIT) {
        instance.borrow_mut().ng_after_content_init();
    }
    if lifecycles.contains(NodeFlags::AFTER_CONTENT_CHECKED) {
        instance.borrow_mut().ng_after_content_checked();
    }
    if lifecycles.contains(NodeFlags::AFTER_VIEW_INIT) {
        instance.borrow_mut().ng_after_view_init();
    }
    if lifecycles.contains(NodeFlags::AFTER_VIEW_CHECKED) {
        instance.borrow_mut().ng_after_view_checked();
    }
    if lifecycles.contains(NodeFlags::ON_DESTROY) {
        instance.borrow_mut().ng_on_destroy();
    }
}
