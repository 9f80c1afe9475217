//! Blueprints: cache trees mirroring a rendered [`Node`] tree.

use crate::{
	component::Component,
	context::Context,
	error::RenderError,
	markup::{text_fragment, write_open_tag},
	node::{Children, Key, Node, NodeKind, SlotKey, Value},
	optimize,
	render::Renderer,
	selector::Selection,
};
use core::fmt::{self, Debug, Formatter};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{instrument, trace_span};

/// An opaque cache of a previously rendered tree, to be passed to [`Renderer::patch`] and [`Renderer::render`].
///
/// Patching never updates a [`Blueprint`]. Every patch diffs against the tree it was built from,
/// so rebuild it with [`Renderer::build_blueprint`] if the baseline should move.
///
/// [`Blueprint`]s are not [`Send`] or [`Sync`]. Each thread needs its own.
#[derive(Debug)]
pub struct Blueprint {
	pub(crate) root: BlueprintNode,
}
impl Blueprint {
	/// Whether the tree contains any component or selector node below a component boundary.
	///
	/// If this is `false` for a component root, patching it against an unchanged root just copies a cached string.
	#[must_use]
	pub fn is_deep_dynamic(&self) -> bool {
		self.root.deep_dynamic
	}

	/// Reruns the static optimizer. This is idempotent, and [`Renderer::build_blueprint`] already runs it once.
	pub fn optimize(&mut self) {
		optimize::optimize(&mut self.root)
	}
}

pub(crate) struct BlueprintNode {
	/// The originating node, which also provides its flags, tag, key and payloads by reference.
	pub node: Node,
	/// Open tag for elements, escaped text for text nodes, hoisted static markup for component boundaries.
	pub open: String,
	pub close: Option<Rc<str>>,
	pub children: BlueprintChildren,
	pub data: BlueprintData,
	/// Conservatively `true` for component, selector and context nodes until optimized.
	pub deep_dynamic: bool,
}
impl BlueprintNode {
	/// The rendered root of a component, selector or context node.
	pub fn root(&self) -> Option<&BlueprintNode> {
		match &self.children {
			BlueprintChildren::Single(root) => Some(root),
			_ => None,
		}
	}

	fn boundary(node: &Node, root: Option<BlueprintNode>, data: BlueprintData) -> Self {
		Self {
			node: node.clone(),
			open: String::new(),
			close: None,
			children: root.map_or(BlueprintChildren::None, |root| BlueprintChildren::Single(Box::new(root))),
			data,
			deep_dynamic: true,
		}
	}
}
impl Debug for BlueprintNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("BlueprintNode")
			.field("flags", &self.node.flags())
			.field("open", &self.open)
			.field("close", &self.close)
			.field("children", &self.children)
			.field("data", &self.data)
			.field("deep_dynamic", &self.deep_dynamic)
			.finish()
	}
}

#[derive(Debug)]
pub(crate) enum BlueprintChildren {
	None,
	Value { value: Value, fragment: String },
	Single(Box<BlueprintNode>),
	List(BlueprintList),
}

#[derive(Debug)]
pub(crate) struct BlueprintEntry {
	pub key: SlotKey,
	pub blueprint: BlueprintNode,
}

#[derive(Debug)]
pub(crate) struct BlueprintList {
	pub entries: Vec<BlueprintEntry>,
	key_index: HashMap<Key, usize>,
	pos_index: HashMap<(usize, usize), usize>,
}
impl BlueprintList {
	fn new(entries: Vec<BlueprintEntry>) -> Self {
		let mut key_index = HashMap::new();
		let mut pos_index = HashMap::new();
		for (i, entry) in entries.iter().enumerate() {
			match &entry.key {
				SlotKey::Explicit(key) => {
					key_index.insert(key.clone(), i);
				}
				SlotKey::Position(slot, index) => {
					pos_index.insert((*slot, *index), i);
				}
			}
		}
		Self { entries, key_index, pos_index }
	}

	pub fn get(&self, key: &SlotKey) -> Option<&BlueprintNode> {
		let i = match key {
			SlotKey::Explicit(key) => self.key_index.get(key),
			SlotKey::Position(slot, index) => self.pos_index.get(&(*slot, *index)),
		}?;
		self.entries.get(*i).map(|entry| &entry.blueprint)
	}
}

pub(crate) enum BlueprintData {
	None,
	Instance(Box<dyn Component>),
	Selection(Rc<Selection>),
	Context(Context),
}
impl Debug for BlueprintData {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			BlueprintData::None => f.write_str("None"),
			BlueprintData::Instance(_) => f.write_str("Instance(..)"),
			BlueprintData::Selection(selection) => f.debug_tuple("Selection").field(selection).finish(),
			BlueprintData::Context(context) => f.debug_tuple("Context").field(context).finish(),
		}
	}
}

impl Renderer {
	/// Fully renders `node` into a new, optimized [`Blueprint`].
	///
	/// # Errors
	///
	/// Iff the tree is deeper than the configured depth limit.
	#[instrument(skip_all)]
	pub fn build_blueprint(&self, node: &Node) -> Result<Blueprint, RenderError> {
		let mut root = self.build_node(node, &Context::new(), self.depth_limit())?;
		optimize::optimize(&mut root);
		Ok(Blueprint { root })
	}

	pub(crate) fn build_node(&self, node: &Node, context: &Context, depth_limit: usize) -> Result<BlueprintNode, RenderError> {
		if depth_limit == 0 {
			return Err(self.depth_limit_exceeded());
		}

		Ok(match node.kind() {
			NodeKind::Text(value) => BlueprintNode {
				node: node.clone(),
				open: text_fragment(value),
				close: None,
				children: BlueprintChildren::None,
				data: BlueprintData::None,
				deep_dynamic: false,
			},

			NodeKind::Element {
				tag,
				class_name,
				attributes,
				style,
			} => {
				let span = trace_span!("Building element", tag = &**tag);
				let _enter = span.enter();
				let mut open = String::new();
				write_open_tag(&mut open, tag, class_name.as_deref(), attributes.as_deref(), style.as_deref());
				BlueprintNode {
					node: node.clone(),
					open,
					close: Some(self.close_tag_cache().get(tag)),
					children: self.build_children(node.children(), context, depth_limit - 1)?,
					data: BlueprintData::None,
					deep_dynamic: false,
				}
			}

			NodeKind::Class { component, props } => {
				let span = trace_span!("Building component class", ?component);
				let _enter = span.enter();
				let instance = (component.create)(props);
				let root = self.build_node(&instance.render(), context, depth_limit - 1)?;
				BlueprintNode::boundary(node, Some(root), BlueprintData::Instance(instance))
			}

			NodeKind::Function { component, props } => {
				let span = trace_span!("Building function component", ?component);
				let _enter = span.enter();
				let root = self.build_node(&(component.render)(props), context, depth_limit - 1)?;
				BlueprintNode::boundary(node, Some(root), BlueprintData::None)
			}

			NodeKind::Selector { selector, props } => {
				let span = trace_span!("Building selector", ?selector);
				let _enter = span.enter();
				let selection = selector.select(None, props, context);
				let root = self.build_node(&selector.render(&selection), context, depth_limit - 1)?;
				BlueprintNode::boundary(node, Some(root), BlueprintData::Selection(selection))
			}

			NodeKind::Context { values } => {
				let span = trace_span!("Building context scope", ?values);
				let _enter = span.enter();
				let context = context.merge(values);
				let root = match node.single_child() {
					Some(child) => Some(self.build_node(child, &context, depth_limit - 1)?),
					None => None,
				};
				BlueprintNode::boundary(node, root, BlueprintData::Context(context))
			}
		})
	}

	fn build_children(&self, children: &Children, context: &Context, depth_limit: usize) -> Result<BlueprintChildren, RenderError> {
		Ok(match children {
			Children::None => BlueprintChildren::None,
			Children::Value(value) => BlueprintChildren::Value {
				value: value.clone(),
				fragment: text_fragment(value),
			},
			Children::Single(child) => BlueprintChildren::Single(Box::new(self.build_node(child, context, depth_limit)?)),
			Children::List(entries) => BlueprintChildren::List(BlueprintList::new(
				entries
					.iter()
					.map(|entry| {
						Ok(BlueprintEntry {
							key: entry.key.clone(),
							blueprint: self.build_node(&entry.node, context, depth_limit)?,
						})
					})
					.collect::<Result<_, RenderError>>()?,
			)),
		})
	}
}
