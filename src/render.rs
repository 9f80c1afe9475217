use crate::{
	blueprint::Blueprint,
	context::Context,
	error::RenderError,
	markup::{write_open_tag, write_text, CloseTagCache},
	node::{Children, Node, NodeKind},
	patch::SyncFlags,
};
use std::rc::Rc;
use tracing::{error, instrument, trace_span};

/// How deep [`Renderer::new`] lets a tree nest before giving up.
///
/// Rendering and patching recurse once per level, so this fits a default 2 MiB thread stack even in debug builds.
/// Raise it with [`Renderer::with_depth_limit`] only on a correspondingly larger stack.
pub const DEFAULT_DEPTH_LIMIT: usize = 128;

/// Output accumulator for [`Renderer::render`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderState {
	pub result: String,
}
impl RenderState {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

/// Renders [`Node`] trees to markup, from scratch or by patching against a [`Blueprint`].
///
/// A [`Renderer`] holds only configuration and the [`CloseTagCache`], so it can be reused freely.
#[derive(Debug, Clone)]
pub struct Renderer {
	depth_limit: usize,
	close_tags: Rc<CloseTagCache>,
}
impl Default for Renderer {
	fn default() -> Self {
		Self::new()
	}
}
impl Renderer {
	#[must_use]
	pub fn new() -> Self {
		Self {
			depth_limit: DEFAULT_DEPTH_LIMIT,
			close_tags: Rc::new(CloseTagCache::new()),
		}
	}

	/// Limits how many nodes deep a tree may nest. Each element, component, selector and context scope counts as one level.
	///
	/// Each level costs a few KiB of stack in debug builds. A limit beyond [`DEFAULT_DEPTH_LIMIT`] needs a thread
	/// with a larger stack (see [`std::thread::Builder::stack_size`]), or the process aborts before the limit is reached.
	#[must_use]
	pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
		self.depth_limit = depth_limit;
		self
	}

	/// Shares a [`CloseTagCache`] with other [`Renderer`]s.
	#[must_use]
	pub fn with_close_tag_cache(mut self, close_tags: Rc<CloseTagCache>) -> Self {
		self.close_tags = close_tags;
		self
	}

	#[must_use]
	pub fn depth_limit(&self) -> usize {
		self.depth_limit
	}

	#[must_use]
	pub fn close_tag_cache(&self) -> &Rc<CloseTagCache> {
		&self.close_tags
	}

	/// Appends the markup for `node` to `state.result`.
	///
	/// Without a `blueprint` this renders from scratch, otherwise it patches against it.
	/// The output is the same either way.
	///
	/// # Errors
	///
	/// Iff the tree is deeper than the configured depth limit, in which case `state.result` is left unchanged.
	#[instrument(skip_all, fields(patch = blueprint.is_some()))]
	pub fn render(&self, state: &mut RenderState, node: &Node, blueprint: Option<&Blueprint>) -> Result<(), RenderError> {
		let start = state.result.len();
		let result = match blueprint {
			None => self.render_node(&mut state.result, node, &Context::new(), self.depth_limit),
			Some(blueprint) => self.patch_node(&mut state.result, &blueprint.root, node, &Context::new(), SyncFlags::empty(), self.depth_limit),
		};
		if result.is_err() {
			state.result.truncate(start);
		}
		result
	}

	/// Renders `node` from scratch.
	///
	/// # Errors
	///
	/// Iff the tree is deeper than the configured depth limit.
	pub fn render_fresh(&self, node: &Node) -> Result<String, RenderError> {
		let mut state = RenderState::new();
		self.render(&mut state, node, None)?;
		Ok(state.result)
	}

	/// Renders `node` by reusing whatever `blueprint` has cached for unchanged subtrees.
	///
	/// # Errors
	///
	/// Iff the tree is deeper than the configured depth limit.
	pub fn patch(&self, blueprint: &Blueprint, node: &Node) -> Result<String, RenderError> {
		let mut state = RenderState::new();
		self.render(&mut state, node, Some(blueprint))?;
		Ok(state.result)
	}

	pub(crate) fn depth_limit_exceeded(&self) -> RenderError {
		error!(limit = self.depth_limit, "Depth limit reached");
		RenderError::DepthLimitExceeded { limit: self.depth_limit }
	}

	pub(crate) fn render_node(&self, out: &mut String, node: &Node, context: &Context, depth_limit: usize) -> Result<(), RenderError> {
		if depth_limit == 0 {
			return Err(self.depth_limit_exceeded());
		}

		match node.kind() {
			NodeKind::Text(value) => write_text(out, value),

			NodeKind::Element {
				tag,
				class_name,
				attributes,
				style,
			} => {
				write_open_tag(out, tag, class_name.as_deref(), attributes.as_deref(), style.as_deref());
				self.render_children(out, node.children(), context, depth_limit - 1)?;
				out.push_str(&self.close_tags.get(tag));
			}

			NodeKind::Class { component, props } => {
				let span = trace_span!("Rendering component class", ?component);
				let _enter = span.enter();
				self.render_node(out, &(component.create)(props).render(), context, depth_limit - 1)?;
			}

			NodeKind::Function { component, props } => {
				let span = trace_span!("Rendering function component", ?component);
				let _enter = span.enter();
				self.render_node(out, &(component.render)(props), context, depth_limit - 1)?;
			}

			NodeKind::Selector { selector, props } => {
				let span = trace_span!("Rendering selector", ?selector);
				let _enter = span.enter();
				let selection = selector.select(None, props, context);
				self.render_node(out, &selector.render(&selection), context, depth_limit - 1)?;
			}

			NodeKind::Context { values } => {
				if let Some(child) = node.single_child() {
					self.render_node(out, child, &context.merge(values), depth_limit - 1)?;
				}
			}
		}
		Ok(())
	}

	pub(crate) fn render_children(&self, out: &mut String, children: &Children, context: &Context, depth_limit: usize) -> Result<(), RenderError> {
		match children {
			Children::None => (),
			Children::Value(value) => write_text(out, value),
			Children::Single(child) => self.render_node(out, child, context, depth_limit)?,
			Children::List(entries) => {
				for entry in entries {
					self.render_node(out, &entry.node, context, depth_limit)?;
				}
			}
		}
		Ok(())
	}
}
