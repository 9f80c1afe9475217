//! The immutable input tree.
//!
//! [`Node`]s are reference-counted and cheap to clone. Patching relies on reference identity:
//! a [`Node`], [`Props`], [`Attributes`], [`Style`] or [`Context`] that is passed in again unchanged
//! (as the same allocation) is treated as unchanged without looking inside it.
//! Clients that rebuild equal values every render still get correct output, just less reuse.

use crate::{
	component::{ClassRef, ComponentClass, FunctionComponent, FunctionRef},
	context::Context,
	error::ConfigError,
	selector::Selector,
};
use bitflags::bitflags;
use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashSet;
use std::{borrow::Cow, rc::Rc};

bitflags! {
	/// Node kind and children shape, computed once at construction.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct NodeFlags: u16 {
		const TEXT = 1;
		const ELEMENT = 1 << 1;
		const COMPONENT_FUNCTION = 1 << 2;
		const COMPONENT_CLASS = 1 << 3;
		const CHILDREN_VALUE = 1 << 4;
		const CHILDREN_NODE = 1 << 5;
		const CHILDREN_LIST = 1 << 6;
		const KEYED = 1 << 7;
		const SELECTOR = 1 << 8;
		const CONTEXT = 1 << 9;

		const COMPONENT = Self::COMPONENT_FUNCTION.bits() | Self::COMPONENT_CLASS.bits();
		const CHILDREN = Self::CHILDREN_VALUE.bits() | Self::CHILDREN_NODE.bits() | Self::CHILDREN_LIST.bits();
		/// Two nodes can only be synced if they agree on these.
		const SYNCABLE = Self::TEXT.bits() | Self::ELEMENT.bits() | Self::COMPONENT.bits() | Self::KEYED.bits() | Self::SELECTOR.bits() | Self::CONTEXT.bits();
	}
}

/// An explicit identity key among siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
	Int(i64),
	Str(Rc<str>),
}
impl From<i64> for Key {
	fn from(key: i64) -> Self {
		Self::Int(key)
	}
}
impl From<i32> for Key {
	fn from(key: i32) -> Self {
		Self::Int(key.into())
	}
}
impl From<u32> for Key {
	fn from(key: u32) -> Self {
		Self::Int(key.into())
	}
}
impl From<&str> for Key {
	fn from(key: &str) -> Self {
		Self::Str(key.into())
	}
}
impl From<String> for Key {
	fn from(key: String) -> Self {
		Self::Str(key.into())
	}
}

/// A list entry's identity: its explicit key, or its argument slot and its index within that slot.
///
/// Growing or shrinking a list argument doesn't move the positions of later siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SlotKey {
	Explicit(Key),
	Position(usize, usize),
}
impl SlotKey {
	/// The slot key a single (non-list) child is matched under.
	pub fn of_single(node: &Node) -> Self {
		node.explicit_key().cloned().map_or(Self::Position(0, 0), Self::Explicit)
	}
}

/// A scalar: text content, or an attribute or style value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// Omitted as an attribute, empty as text.
	Null,
	/// Renders as a bare attribute name if `true`, omitted if `false`.
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(Rc<str>),
}
impl Value {
	/// The unescaped text form.
	#[must_use]
	pub fn as_text(&self) -> Cow<'_, str> {
		match self {
			Value::Null => Cow::Borrowed(""),
			Value::Bool(value) => Cow::Borrowed(if *value { "true" } else { "false" }),
			Value::Int(value) => Cow::Owned(value.to_string()),
			Value::Float(value) => Cow::Owned(value.to_string()),
			Value::Str(value) => Cow::Borrowed(value),
		}
	}
}
impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::Str(value.into())
	}
}
impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::Str(value.into())
	}
}
impl From<Rc<str>> for Value {
	fn from(value: Rc<str>) -> Self {
		Self::Str(value)
	}
}
impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Int(value.into())
	}
}
impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}
impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// Opaque component or selector props, compared by reference.
#[derive(Clone, Default)]
pub struct Props(Option<Rc<dyn Any>>);
impl Props {
	#[must_use]
	pub fn new(value: impl Any) -> Self {
		Self(Some(Rc::new(value)))
	}

	#[must_use]
	pub fn none() -> Self {
		Self(None)
	}

	#[must_use]
	pub fn from_rc(value: Rc<dyn Any>) -> Self {
		Self(Some(value))
	}

	#[must_use]
	pub fn get<T: Any>(&self) -> Option<&T> {
		self.0.as_ref().and_then(|value| value.downcast_ref())
	}

	#[must_use]
	pub fn is_none(&self) -> bool {
		self.0.is_none()
	}

	/// Reference equality. Two absent props are equal.
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		match (&self.0, &other.0) {
			(None, None) => true,
			(Some(a), Some(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}
impl Debug for Props {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.0 {
			None => f.write_str("Props(None)"),
			Some(value) => write!(f, "Props({:p})", Rc::as_ptr(value)),
		}
	}
}

/// Element attributes in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<(Cow<'static, str>, Value)>);
impl Attributes {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
		self.0.push((name.into(), value.into()));
		self
	}

	#[must_use]
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().map(|(name, value)| (name.as_ref(), value))
	}

	fn validate(&self) -> Result<(), ConfigError> {
		match self.iter().find(|(name, _)| !is_valid_name(name)) {
			Some((name, _)) => Err(ConfigError::InvalidAttributeName(name.to_owned())),
			None => Ok(()),
		}
	}
}

/// Inline style declarations in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style(Vec<(Cow<'static, str>, Value)>);
impl Style {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, property: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
		self.0.push((property.into(), value.into()));
		self
	}

	#[must_use]
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().map(|(property, value)| (property.as_ref(), value))
	}
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
	Text(Value),
	Element {
		tag: Rc<str>,
		class_name: Option<Rc<str>>,
		attributes: Option<Rc<Attributes>>,
		style: Option<Rc<Style>>,
	},
	Function {
		component: FunctionRef,
		props: Props,
	},
	Class {
		component: ClassRef,
		props: Props,
	},
	Selector {
		selector: Rc<Selector>,
		props: Props,
	},
	/// The single child is stored in [`Children::Single`].
	Context {
		values: Context,
	},
}
impl NodeKind {
	/// Element tag names, component types and selector descriptors must match.
	pub fn same_tag(&self, other: &Self) -> bool {
		match (self, other) {
			(NodeKind::Text(_), NodeKind::Text(_)) | (NodeKind::Context { .. }, NodeKind::Context { .. }) => true,
			(NodeKind::Element { tag: t_1, .. }, NodeKind::Element { tag: t_2, .. }) => t_1 == t_2,
			(NodeKind::Function { component: c_1, .. }, NodeKind::Function { component: c_2, .. }) => c_1 == c_2,
			(NodeKind::Class { component: c_1, .. }, NodeKind::Class { component: c_2, .. }) => c_1 == c_2,
			(NodeKind::Selector { selector: s_1, .. }, NodeKind::Selector { selector: s_2, .. }) => Rc::ptr_eq(s_1, s_2),
			_ => false,
		}
	}
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
	pub key: SlotKey,
	pub node: Node,
}

#[derive(Debug, Clone)]
pub(crate) enum Children {
	None,
	Value(Value),
	Single(Node),
	List(Vec<Entry>),
}
impl Children {
	fn shape(&self) -> NodeFlags {
		match self {
			Children::None => NodeFlags::empty(),
			Children::Value(_) => NodeFlags::CHILDREN_VALUE,
			Children::Single(_) => NodeFlags::CHILDREN_NODE,
			Children::List(_) => NodeFlags::CHILDREN_LIST,
		}
	}
}

#[derive(Debug, Clone)]
struct NodeData {
	flags: NodeFlags,
	key: Option<Key>,
	kind: NodeKind,
	children: Children,
}

/// An immutable node description.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);
impl Node {
	fn new(flags: NodeFlags, kind: NodeKind, children: Children) -> Self {
		Self(Rc::new(NodeData {
			flags: flags | children.shape(),
			key: None,
			kind,
			children,
		}))
	}

	/// A [`FunctionComponent`] node.
	#[must_use]
	pub fn function<F: FunctionComponent>(props: Props) -> Self {
		Self::new(
			NodeFlags::COMPONENT_FUNCTION,
			NodeKind::Function {
				component: FunctionRef::of::<F>(),
				props,
			},
			Children::None,
		)
	}

	/// A [`ComponentClass`] node. A new instance is created whenever its props need an update.
	#[must_use]
	pub fn class<C: ComponentClass>(props: Props) -> Self {
		Self::new(
			NodeFlags::COMPONENT_CLASS,
			NodeKind::Class {
				component: ClassRef::of::<C>(),
				props,
			},
			Children::None,
		)
	}

	/// A context scope: `child` and its descendants see `values` merged over the inherited [`Context`].
	#[must_use]
	pub fn context(values: Context, child: impl Into<Node>) -> Self {
		Self::new(NodeFlags::CONTEXT, NodeKind::Context { values }, Children::Single(child.into()))
	}

	pub(crate) fn selector(selector: Rc<Selector>, props: Props) -> Self {
		Self::new(NodeFlags::SELECTOR, NodeKind::Selector { selector, props }, Children::None)
	}

	/// Sets an explicit key.
	///
	/// If this [`Node`] is already shared, the keyed one is a new [`Node`] and the other handles are unaffected.
	#[must_use]
	pub fn key(mut self, key: impl Into<Key>) -> Self {
		let data = Rc::make_mut(&mut self.0);
		data.key = Some(key.into());
		data.flags |= NodeFlags::KEYED;
		self
	}

	#[must_use]
	pub fn flags(&self) -> NodeFlags {
		self.0.flags
	}

	#[must_use]
	pub fn explicit_key(&self) -> Option<&Key> {
		self.0.key.as_ref()
	}

	/// Whether both handles refer to the same node.
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	pub(crate) fn kind(&self) -> &NodeKind {
		&self.0.kind
	}

	pub(crate) fn children(&self) -> &Children {
		&self.0.children
	}

	/// The child of a context scope.
	pub(crate) fn single_child(&self) -> Option<&Node> {
		match &self.0.children {
			Children::Single(child) => Some(child),
			_ => None,
		}
	}

	/// Same syncable flags, same tag and same explicit key.
	pub(crate) fn can_sync(&self, other: &Self) -> bool {
		((self.flags() ^ other.flags()) & NodeFlags::SYNCABLE).is_empty() && self.kind().same_tag(other.kind()) && self.0.key == other.0.key
	}
}
impl Debug for Node {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// A text node.
#[must_use]
pub fn text(value: impl Into<Value>) -> Node {
	Node::new(NodeFlags::TEXT, NodeKind::Text(value.into()), Children::None)
}

/// Creates an [`Element`] builder.
///
/// # Panics
///
/// Iff `tag` is not a valid tag name. See [`try_h`] for a fallible version.
#[must_use]
pub fn h(tag: &str) -> Element {
	try_h(tag).unwrap_or_else(|error| panic!("{}", error))
}

/// Creates an [`Element`] builder.
///
/// # Errors
///
/// Iff `tag` is empty or contains whitespace, quotes, `/`, `<`, `>`, `=` or control characters.
pub fn try_h(tag: &str) -> Result<Element, ConfigError> {
	if is_valid_name(tag) {
		Ok(Element {
			tag: tag.into(),
			class_name: None,
			attributes: None,
			style: None,
			key: None,
			children: Children::None,
		})
	} else {
		Err(ConfigError::InvalidTagName(tag.to_owned()))
	}
}

fn is_valid_name(name: &str) -> bool {
	!name.is_empty() && !name.chars().any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '/' | '<' | '>' | '='))
}

/// Builder for element [`Node`]s. Convert it with [`Into<Node>`] when done.
#[derive(Debug, Clone)]
#[must_use]
pub struct Element {
	tag: Rc<str>,
	class_name: Option<Rc<str>>,
	attributes: Option<Rc<Attributes>>,
	style: Option<Rc<Style>>,
	key: Option<Key>,
	children: Children,
}
impl Element {
	pub fn class(mut self, class_name: impl Into<Rc<str>>) -> Self {
		self.class_name = Some(class_name.into());
		self
	}

	/// # Panics
	///
	/// Iff an attribute name is invalid. See [`Element::try_attrs`] for a fallible version.
	pub fn attrs(self, attributes: impl Into<Rc<Attributes>>) -> Self {
		self.try_attrs(attributes).unwrap_or_else(|error| panic!("{}", error))
	}

	/// # Errors
	///
	/// Iff an attribute name is invalid.
	pub fn try_attrs(mut self, attributes: impl Into<Rc<Attributes>>) -> Result<Self, ConfigError> {
		let attributes = attributes.into();
		attributes.validate()?;
		self.attributes = Some(attributes);
		Ok(self)
	}

	pub fn style(mut self, style: impl Into<Rc<Style>>) -> Self {
		self.style = Some(style.into());
		self
	}

	pub fn key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Sets the children, replacing any set before.
	///
	/// # Panics
	///
	/// Iff two children share an explicit key. See [`Element::try_children`] for a fallible version.
	pub fn children<I>(self, children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Child>,
	{
		self.try_children(children).unwrap_or_else(|error| panic!("{}", error))
	}

	/// Sets the children, replacing any set before.
	///
	/// Empty slots are skipped. A lone scalar becomes plain text content,
	/// a lone node a single child and anything else a flattened list with scalars wrapped in text nodes.
	///
	/// # Errors
	///
	/// Iff two children share an explicit key.
	pub fn try_children<I>(mut self, children: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator,
		I::Item: Into<Child>,
	{
		self.children = classify(children.into_iter().map(Into::into).collect())?;
		Ok(self)
	}
}
impl From<Element> for Node {
	fn from(element: Element) -> Self {
		let Element {
			tag,
			class_name,
			attributes,
			style,
			key,
			children,
		} = element;
		let node = Node::new(
			NodeFlags::ELEMENT,
			NodeKind::Element {
				tag,
				class_name,
				attributes,
				style,
			},
			children,
		);
		match key {
			Some(key) => node.key(key),
			None => node,
		}
	}
}

/// One argument slot of [`Element::children`].
#[derive(Debug, Clone)]
pub enum Child {
	Empty,
	Value(Value),
	Node(Node),
	List(Vec<Node>),
}
impl Child {
	fn len(&self) -> usize {
		match self {
			Child::Empty => 0,
			Child::Value(_) | Child::Node(_) => 1,
			Child::List(nodes) => nodes.len(),
		}
	}

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl From<Node> for Child {
	fn from(node: Node) -> Self {
		Self::Node(node)
	}
}
impl From<Element> for Child {
	fn from(element: Element) -> Self {
		Self::Node(element.into())
	}
}
impl From<Vec<Node>> for Child {
	fn from(nodes: Vec<Node>) -> Self {
		Self::List(nodes)
	}
}
impl From<Value> for Child {
	fn from(value: Value) -> Self {
		match value {
			Value::Null => Self::Empty,
			value => Self::Value(value),
		}
	}
}
impl From<&str> for Child {
	fn from(value: &str) -> Self {
		Self::Value(value.into())
	}
}
impl From<String> for Child {
	fn from(value: String) -> Self {
		Self::Value(value.into())
	}
}
impl From<Rc<str>> for Child {
	fn from(value: Rc<str>) -> Self {
		Self::Value(value.into())
	}
}
impl From<i32> for Child {
	fn from(value: i32) -> Self {
		Self::Value(value.into())
	}
}
impl From<i64> for Child {
	fn from(value: i64) -> Self {
		Self::Value(value.into())
	}
}
impl From<f64> for Child {
	fn from(value: f64) -> Self {
		Self::Value(value.into())
	}
}
impl<T: Into<Child>> From<Option<T>> for Child {
	fn from(child: Option<T>) -> Self {
		child.map_or(Self::Empty, Into::into)
	}
}

fn classify(slots: Vec<Child>) -> Result<Children, ConfigError> {
	let total: usize = slots.iter().map(Child::len).sum();
	if total == 0 {
		return Ok(Children::None);
	}
	if total == 1 {
		return Ok(match slots.into_iter().find(|slot| !slot.is_empty()) {
			Some(Child::Value(value)) => Children::Value(value),
			Some(Child::Node(node)) => Children::Single(node),
			Some(Child::List(mut nodes)) => nodes.pop().map_or(Children::None, Children::Single),
			Some(Child::Empty) | None => Children::None,
		});
	}

	let mut explicit_keys = HashSet::new();
	let mut entries = Vec::with_capacity(total);
	let mut push = |node: Node, slot: usize, index: usize| {
		let key = match node.explicit_key() {
			Some(key) => {
				if !explicit_keys.insert(key.clone()) {
					return Err(ConfigError::DuplicateKey(key.clone()));
				}
				SlotKey::Explicit(key.clone())
			}
			None => SlotKey::Position(slot, index),
		};
		entries.push(Entry { key, node });
		Ok(())
	};
	for (slot, child) in slots.into_iter().enumerate() {
		match child {
			Child::Empty => (),
			Child::Value(value) => push(text(value), slot, 0)?,
			Child::Node(node) => push(node, slot, 0)?,
			Child::List(nodes) => {
				for (index, node) in nodes.into_iter().enumerate() {
					push(node, slot, index)?;
				}
			}
		}
	}
	Ok(Children::List(entries))
}
