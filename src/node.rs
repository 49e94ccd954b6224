//! Renderable nodes and node collections.
//!
//! Nodes are shared through [`NodeRef`] (an `Rc<dyn Node>`). Every node keeps a
//! non-owning link to the collection it was appended to, and every collection keeps
//! a non-owning link to the node that owns it, so the tree never forms strong cycles.

use crate::action::Jq;
use crate::error::{RenderError, RenderResult};
use crate::nodes::Text;
use crate::param::Converter;
use crate::renderer::Renderer;
use crate::value::Value;
use indexmap::IndexMap;
use serde_json::json;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// A unit of the component tree that knows how to emit itself into a [`Renderer`].
pub trait Node: Any {
    fn base(&self) -> &NodeBase;

    /// Emit markup, script and CSS for this node. Must not assume any parent.
    fn render(&self, renderer: &mut Renderer) -> RenderResult<()>;

    fn as_any(&self) -> &dyn Any;

    /// Child collection that `+=` appends to, for nodes that have one
    fn items(&self) -> Option<&NodeCollection> {
        None
    }
}

/// Returns the next number for generated ids of `type_name`, starting at 1.
pub(crate) fn next_object_number(type_name: &'static str) -> usize {
    static COUNTERS: OnceLock<Mutex<HashMap<&'static str, Arc<AtomicUsize>>>> = OnceLock::new();
    let counter = {
        let mut counters = COUNTERS
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(counters.entry(type_name).or_default())
    };
    counter.fetch_add(1, Ordering::Relaxed) + 1
}

pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

/// Slot filled with the node's own weak reference once it is wrapped in a [`NodeRef`].
///
/// Conversions run before the node exists behind an `Rc`; collections created then keep
/// the slot and see their owner as soon as it is filled.
pub(crate) type OwnerSlot = Rc<RefCell<Option<Weak<dyn Node>>>>;

#[derive(Clone)]
enum ParentLink {
    Node(Weak<dyn Node>),
    Collection(Weak<CollectionInner>),
}

/// The structural parent of a node
#[derive(Debug, Clone)]
pub enum Parent {
    Node(NodeRef),
    Collection(NodeCollection),
}

/// Constructor keyword arguments: an optional explicit id plus plain attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs {
    id: Option<String>,
    attributes: Vec<(String, String)>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Adds an attribute. Surrounding underscores are stripped so `_class` becomes `class`.
    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attributes
            .push((key.trim_matches('_').to_string(), value.to_string()));
        self
    }

    pub fn class(self, class_names: &str) -> Self {
        self.attr("class", class_names)
    }

    pub fn style(self, style: &str) -> Self {
        self.attr("style", style)
    }
}

/// State shared by every node: identity, attributes, parent link and captured variables.
pub struct NodeBase {
    type_name: &'static str,
    id: RefCell<Option<String>>,
    attributes: RefCell<IndexMap<String, String>>,
    parent: RefCell<Option<ParentLink>>,
    variables: RefCell<IndexMap<String, NodeCollection>>,
    this: OwnerSlot,
}

impl NodeBase {
    /// Creates the base for a node of type `T`; generated ids use `T`'s short name.
    pub fn new<T: Node>(attrs: Attrs) -> Self {
        Self::named(short_type_name::<T>(), attrs)
    }

    pub fn named(type_name: &'static str, attrs: Attrs) -> Self {
        let mut attributes = IndexMap::new();
        for (key, value) in attrs.attributes {
            attributes.insert(key, value);
        }
        Self {
            type_name,
            id: RefCell::new(attrs.id.filter(|id| !id.is_empty())),
            attributes: RefCell::new(attributes),
            parent: RefCell::new(None),
            variables: RefCell::new(IndexMap::new()),
            this: Rc::new(RefCell::new(None)),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The html id, generated as `<TypeName>_<N>` the first time it is requested.
    pub fn id(&self) -> String {
        let mut id = self.id.borrow_mut();
        id.get_or_insert_with(|| {
            format!("{}_{}", self.type_name, next_object_number(self.type_name))
        })
        .clone()
    }

    /// The id if one was supplied or already generated; never generates one.
    pub fn explicit_id(&self) -> Option<String> {
        self.id.borrow().clone()
    }

    pub fn id_needed(&self) {
        self.id();
    }

    pub fn attribute(&self, key: &str) -> Option<String> {
        self.attributes.borrow().get(key).cloned()
    }

    pub fn attributes(&self) -> IndexMap<String, String> {
        self.attributes.borrow().clone()
    }

    pub fn add_class(&self, class_names: &str) {
        let mut attributes = self.attributes.borrow_mut();
        let classes = attributes.entry("class".to_string()).or_default();
        for class_name in class_names.split_whitespace() {
            if !has_class(classes, class_name) {
                classes.push(' ');
                classes.push_str(class_name);
            }
        }
        *classes = classes.trim().to_string();
    }

    pub fn add_style(&self, style: &str) {
        let mut attributes = self.attributes.borrow_mut();
        let current = attributes.entry("style".to_string()).or_default();
        if !current.is_empty() && !current.ends_with(';') {
            current.push(';');
        }
        current.push_str(style);
    }

    /// Sets an attribute; overwriting an existing one is allowed but logged.
    pub fn add_attribute(&self, key: &str, value: &str) {
        let mut attributes = self.attributes.borrow_mut();
        if attributes.contains_key(key) {
            tracing::warn!("\"{}\" attribute already set, overridden", key);
        }
        attributes.insert(key.to_string(), value.to_string());
    }

    pub fn remove_attribute(&self, key: &str) -> Option<String> {
        self.attributes.borrow_mut().shift_remove(key)
    }

    /// ` id="…"` (only once an id exists) followed by every attribute.
    pub fn base_attributes(&self) -> String {
        let mut output = Vec::new();
        if let Some(id) = self.explicit_id() {
            output.push(format!("id=\"{}\"", id));
        }
        for (key, value) in self.attributes.borrow().iter() {
            output.push(format!("{}=\"{}\"", key, value));
        }
        if output.is_empty() {
            String::new()
        } else {
            format!(" {}", output.join(" "))
        }
    }

    pub fn parent(&self) -> Option<Parent> {
        match self.parent.borrow().as_ref()? {
            ParentLink::Node(weak) => weak.upgrade().map(|rc| Parent::Node(NodeRef(rc))),
            ParentLink::Collection(weak) => weak
                .upgrade()
                .map(|inner| Parent::Collection(NodeCollection(inner))),
        }
    }

    fn set_parent_collection(&self, collection: &NodeCollection) {
        *self.parent.borrow_mut() = Some(ParentLink::Collection(Rc::downgrade(&collection.0)));
    }

    /// Puts back a link previously read with [`NodeBase::parent`].
    pub(crate) fn restore_parent(&self, parent: Option<Parent>) {
        *self.parent.borrow_mut() = parent.map(|parent| match parent {
            Parent::Node(node) => ParentLink::Node(Rc::downgrade(&node.0)),
            Parent::Collection(collection) => {
                ParentLink::Collection(Rc::downgrade(&collection.0))
            }
        });
    }

    /// The [`NodeRef`] wrapping this base, once the node has been wrapped
    pub fn handle(&self) -> Option<NodeRef> {
        self.this.borrow().as_ref()?.upgrade().map(NodeRef)
    }

    pub(crate) fn owner_slot(&self) -> OwnerSlot {
        Rc::clone(&self.this)
    }

    /// Captures `value` for deferred rendering and returns the variable name.
    pub fn add_variable(&self, value: impl Into<Value>) -> String {
        let mut variables = self.variables.borrow_mut();
        let name = format!("{}_{}", self.id().to_lowercase(), variables.len() + 1);
        variables.insert(name.clone(), NodeCollection::from_value(value));
        name
    }

    /// Drains the variables captured with [`NodeBase::add_variable`].
    pub fn take_variables(&self) -> IndexMap<String, NodeCollection> {
        std::mem::take(&mut *self.variables.borrow_mut())
    }

    /// Converts a constructor argument. The `Default` marker is replaced by `default`;
    /// a `Default` default converts as `None`.
    pub fn param<C: Converter>(&self, value: Value, default: Value, converter: &C) -> RenderResult<C::Output> {
        let value = match value {
            Value::Default => match default {
                Value::Default => Value::None,
                other => other,
            },
            other => other,
        };
        converter.convert(value, self)
    }

    /// Like [`NodeBase::param`], but yields `None` when neither a value nor a default was given.
    pub fn optional_param<C: Converter>(
        &self,
        value: Value,
        default: Value,
        converter: &C,
    ) -> RenderResult<Option<C::Output>> {
        if value.is_default() && default.is_default() {
            return Ok(None);
        }
        self.param(value, default, converter).map(Some)
    }
}

fn has_class(classes: &str, class_name: &str) -> bool {
    classes.split_whitespace().any(|c| c == class_name)
}

impl fmt::Debug for NodeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeBase")
            .field("type_name", &self.type_name)
            .field("id", &self.id.borrow())
            .field("attributes", &self.attributes.borrow())
            .finish()
    }
}

/// Shared handle to a node
#[derive(Clone)]
pub struct NodeRef(Rc<dyn Node>);

impl NodeRef {
    pub fn new<T: Node>(node: T) -> Self {
        let rc: Rc<dyn Node> = Rc::new(node);
        *rc.base().this.borrow_mut() = Some(Rc::downgrade(&rc));
        NodeRef(rc)
    }

    pub fn base(&self) -> &NodeBase {
        self.0.base()
    }

    pub fn id(&self) -> String {
        self.base().id()
    }

    pub fn type_name(&self) -> &'static str {
        self.base().type_name()
    }

    pub fn downcast_ref<T: Node>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Node>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    pub fn ptr_eq(&self, other: &NodeRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn parent(&self) -> Option<Parent> {
        self.base().parent()
    }

    /// `self + other`: a new collection holding both, or `self` alone when `other` is empty.
    pub fn concat(&self, other: impl Into<Value>) -> Value {
        let other = other.into();
        if other.is_default() || other.is_none() {
            return Value::Node(self.clone());
        }
        let collection = NodeCollection::new();
        collection.append(self);
        collection.append(other);
        Value::Nodes(collection)
    }

    /// `other + self`
    pub fn rconcat(&self, other: impl Into<Value>) -> Value {
        let other = other.into();
        if other.is_default() || other.is_none() {
            return Value::Node(self.clone());
        }
        let collection = NodeCollection::new();
        collection.append(other);
        collection.append(self);
        Value::Nodes(collection)
    }

    /// `self += other`: appends to the node's items.
    pub fn push_item(&self, other: impl Into<Value>) -> RenderResult<()> {
        let other = other.into();
        if other.is_default() || other.is_none() {
            return Ok(());
        }
        match self.0.items() {
            Some(items) => {
                items.append(other);
                Ok(())
            }
            None => Err(RenderError::TypeConflict {
                operation: "push_item",
                reason: format!("{} does not have 'items'", self.type_name()),
            }),
        }
    }

    /// jQuery selector for this node, assigning an id if needed
    pub fn jq(&self) -> Jq {
        Jq::by_id(&self.id())
    }

    /// Record that lets a later partial-update request refer back to this node
    pub fn serialize(&self) -> serde_json::Value {
        json!({ "class_name": self.type_name(), "id": self.id() })
    }

    pub(crate) fn render_self(&self, renderer: &mut Renderer) -> RenderResult<()> {
        self.0.render(renderer)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base().explicit_id() {
            Some(id) => write!(f, "<{} - {}>", self.type_name(), id),
            None => write!(f, "<{} - None>", self.type_name()),
        }
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[derive(Default)]
struct CollectionInner {
    items: RefCell<Vec<NodeRef>>,
    owner: RefCell<Option<OwnerSlot>>,
}

/// Ordered, flattening sequence of nodes. Clones share the same underlying list.
#[derive(Clone, Default)]
pub struct NodeCollection(Rc<CollectionInner>);

impl NodeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `value` in a collection; an existing collection is returned as is.
    pub fn from_value(value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Nodes(nodes) => nodes,
            other => {
                let collection = Self::new();
                collection.append(other);
                collection
            }
        }
    }

    /// Appends nodes, flattening lists and collections and wrapping scalars in [`Text`].
    /// `None`, the `Default` marker and empty strings are skipped.
    pub fn append(&self, value: impl Into<Value>) {
        match value.into() {
            Value::Default | Value::None => {}
            Value::Str(s) if s.is_empty() => {}
            Value::List(items) => {
                for item in items {
                    self.append(item);
                }
            }
            Value::Nodes(nodes) => {
                if nodes.ptr_eq(self) {
                    return;
                }
                for node in nodes.nodes() {
                    self.push_node(node);
                }
            }
            Value::Node(node) => self.push_node(node),
            other => self.push_node(Text::from_display(&other)),
        }
    }

    /// Inserts at `index` (clamped to the length), with the same flattening as `append`.
    pub fn insert(&self, index: usize, value: impl Into<Value>) {
        let staged = NodeCollection::new();
        staged.append(value);
        let staged_nodes = staged.nodes();
        for node in &staged_nodes {
            node.base().set_parent_collection(self);
        }
        let mut items = self.0.items.borrow_mut();
        let index = index.min(items.len());
        items.splice(index..index, staged_nodes);
    }

    /// `self + other`: appends in place. Adding two collections is a type conflict.
    pub fn concat(&self, other: impl Into<Value>) -> RenderResult<NodeCollection> {
        match other.into() {
            Value::Nodes(_) => Err(RenderError::TypeConflict {
                operation: "concat",
                reason: "cannot add two node collections; use append to merge them".to_string(),
            }),
            other => {
                self.append(other);
                Ok(self.clone())
            }
        }
    }

    fn push_node(&self, node: NodeRef) {
        node.base().set_parent_collection(self);
        self.0.items.borrow_mut().push(node);
    }

    /// Snapshot of the contained nodes
    pub fn nodes(&self) -> Vec<NodeRef> {
        self.0.items.borrow().clone()
    }

    pub fn get(&self, index: usize) -> Option<NodeRef> {
        self.0.items.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.borrow().is_empty()
    }

    pub fn ptr_eq(&self, other: &NodeCollection) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The node that owns this collection as one of its fields
    pub fn owner(&self) -> Option<NodeRef> {
        let owner = self.0.owner.borrow();
        let weak = owner.as_ref()?.borrow().clone()?;
        weak.upgrade().map(NodeRef)
    }

    pub fn set_owner(&self, owner: &NodeBase) {
        *self.0.owner.borrow_mut() = Some(owner.owner_slot());
    }
}

impl<T: Into<Value>> std::ops::AddAssign<T> for NodeCollection {
    fn add_assign(&mut self, other: T) {
        self.append(other);
    }
}

impl fmt::Display for NodeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.nodes().iter().map(ToString::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

impl fmt::Debug for NodeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeCollection({})", self)
    }
}

/// Something the [`Renderer`] can walk: a single node or a collection.
pub trait Renderable {
    fn is_blank(&self) -> bool;

    /// Base whose inline style may be hoisted before rendering
    fn hoist_target(&self) -> Option<&NodeBase>;

    /// Structural ancestor pushed while this item renders
    fn structural_parent(&self) -> Option<NodeRef>;

    fn emit(&self, renderer: &mut Renderer) -> RenderResult<()>;
}

impl Renderable for NodeRef {
    fn is_blank(&self) -> bool {
        false
    }

    fn hoist_target(&self) -> Option<&NodeBase> {
        Some(self.base())
    }

    fn structural_parent(&self) -> Option<NodeRef> {
        match self.parent()? {
            Parent::Node(node) => Some(node),
            Parent::Collection(_) => None,
        }
    }

    fn emit(&self, renderer: &mut Renderer) -> RenderResult<()> {
        self.render_self(renderer)
    }
}

impl Renderable for NodeCollection {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }

    fn hoist_target(&self) -> Option<&NodeBase> {
        None
    }

    fn structural_parent(&self) -> Option<NodeRef> {
        None
    }

    fn emit(&self, renderer: &mut Renderer) -> RenderResult<()> {
        let owner = self.owner();
        if let Some(owner) = &owner {
            renderer.push_ancestor(owner.clone());
        }
        let mut result = Ok(());
        for node in self.nodes() {
            result = renderer.render("", &node);
            if result.is_err() {
                break;
            }
        }
        if owner.is_some() {
            renderer.pop_ancestor();
        }
        result
    }
}

impl<R: Renderable> Renderable for Option<R> {
    fn is_blank(&self) -> bool {
        self.as_ref().map_or(true, Renderable::is_blank)
    }

    fn hoist_target(&self) -> Option<&NodeBase> {
        self.as_ref().and_then(Renderable::hoist_target)
    }

    fn structural_parent(&self) -> Option<NodeRef> {
        self.as_ref().and_then(Renderable::structural_parent)
    }

    fn emit(&self, renderer: &mut Renderer) -> RenderResult<()> {
        match self {
            Some(inner) => inner.emit(renderer),
            None => Ok(()),
        }
    }
}
