//! The diff/patch engine.
//!
//! Walks a [`Blueprint`](`crate::Blueprint`) and a new [`Node`] tree together, copying cached fragments
//! where inputs are unchanged by reference and falling back to a fresh render wherever the two can't be matched.
//! Blueprints are only read here.

use crate::{
	blueprint::{BlueprintChildren, BlueprintData, BlueprintNode},
	context::Context,
	error::RenderError,
	markup::{write_open_tag, write_text},
	node::{Node, NodeKind, Props},
	render::Renderer,
	selector::Selector,
};
use bitflags::bitflags;
use std::rc::Rc;
use tracing::{trace, trace_span};

bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub(crate) struct SyncFlags: u8 {
		/// A context scope above changed, so captured contexts below are stale.
		const DIRTY_CONTEXT = 1;
	}
}

fn opt_ptr_eq<T>(a: &Option<Rc<T>>, b: &Option<Rc<T>>) -> bool {
	match (a, b) {
		(None, None) => true,
		(Some(a), Some(b)) => Rc::ptr_eq(a, b),
		_ => false,
	}
}

impl Renderer {
	#[allow(clippy::too_many_lines)]
	pub(crate) fn patch_node(&self, out: &mut String, a: &BlueprintNode, b: &Node, context: &Context, sync: SyncFlags, depth_limit: usize) -> Result<(), RenderError> {
		if depth_limit == 0 {
			return Err(self.depth_limit_exceeded());
		}

		if a.node.ptr_eq(b) {
			trace!("Identical node. Checking for deep changes only.");
			return self.check_deep_changes(out, a, context, sync, depth_limit);
		}

		if !a.node.can_sync(b) {
			let span = trace_span!("Replacing mismatching node", flags_a = ?a.node.flags(), flags_b = ?b.flags());
			let _enter = span.enter();
			return self.render_node(out, b, context, depth_limit);
		}

		match (a.node.kind(), b.kind()) {
			(NodeKind::Text(v_1), NodeKind::Text(v_2)) => {
				if v_1 == v_2 {
					out.push_str(&a.open);
				} else {
					#[cfg(feature = "dangerous-logging")]
					trace!(?v_1, ?v_2, "Text changed.");
					write_text(out, v_2);
				}
			}

			(
				NodeKind::Element {
					class_name: c_1,
					attributes: a_1,
					style: s_1,
					..
				},
				NodeKind::Element {
					tag,
					class_name: c_2,
					attributes: a_2,
					style: s_2,
				},
			) => {
				let span = trace_span!("Patching element", tag = &**tag);
				let _enter = span.enter();
				if c_1 == c_2 && opt_ptr_eq(a_1, a_2) && opt_ptr_eq(s_1, s_2) {
					out.push_str(&a.open);
				} else {
					#[cfg(feature = "dangerous-logging")]
					trace!(?c_2, ?a_2, ?s_2, "Attributes changed.");
					#[cfg(not(feature = "dangerous-logging"))]
					trace!("Attributes changed.");
					write_open_tag(out, tag, c_2.as_deref(), a_2.as_deref(), s_2.as_deref());
				}
				self.patch_children(out, &a.children, b.children(), context, sync, depth_limit - 1)?;
				match &a.close {
					Some(close) => out.push_str(close),
					None => out.push_str(&self.close_tag_cache().get(tag)),
				}
			}

			(NodeKind::Class { props: p_1, .. }, NodeKind::Class { component, props: p_2 }) => {
				let span = trace_span!("Patching component class", ?component);
				let _enter = span.enter();
				let stale = match &a.data {
					BlueprintData::Instance(instance) => instance.should_update(p_1, p_2),
					_ => true,
				};
				if stale {
					let instance = (component.create)(p_2);
					self.patch_root(out, a, &instance.render(), context, sync, depth_limit)?;
				} else {
					self.reuse_boundary(out, a, context, sync, depth_limit)?;
				}
			}

			(NodeKind::Function { props: p_1, .. }, NodeKind::Function { component, props: p_2 }) => {
				let span = trace_span!("Patching function component", ?component);
				let _enter = span.enter();
				if (component.should_update)(p_1, p_2) {
					self.patch_root(out, a, &(component.render)(p_2), context, sync, depth_limit)?;
				} else {
					self.reuse_boundary(out, a, context, sync, depth_limit)?;
				}
			}

			(NodeKind::Selector { .. }, NodeKind::Selector { selector, props }) => {
				self.patch_selector(out, a, selector, props, context, sync, depth_limit)?;
			}

			(NodeKind::Context { values: v_1 }, NodeKind::Context { values: v_2 }) => {
				let span = trace_span!("Patching context scope", ?v_2);
				let _enter = span.enter();
				let (context, sync) = match &a.data {
					BlueprintData::Context(captured) if !sync.contains(SyncFlags::DIRTY_CONTEXT) && v_1.ptr_eq(v_2) => (captured.clone(), sync),
					_ => (context.merge(v_2), sync | SyncFlags::DIRTY_CONTEXT),
				};
				match (a.root(), b.single_child()) {
					(Some(root), Some(child)) => self.patch_node(out, root, child, &context, sync, depth_limit - 1)?,
					(None, Some(child)) => self.render_node(out, child, &context, depth_limit - 1)?,
					(_, None) => (),
				}
			}

			_ => self.render_node(out, b, context, depth_limit)?,
		}
		Ok(())
	}

	/// Re-emits `a` as cached, except that selectors are asked again whether their selection changed,
	/// since the [`Context`] they read can change without any node changing.
	pub(crate) fn check_deep_changes(&self, out: &mut String, a: &BlueprintNode, context: &Context, sync: SyncFlags, depth_limit: usize) -> Result<(), RenderError> {
		if depth_limit == 0 {
			return Err(self.depth_limit_exceeded());
		}

		match a.node.kind() {
			NodeKind::Text(_) => out.push_str(&a.open),

			NodeKind::Element { .. } => {
				out.push_str(&a.open);
				match &a.children {
					BlueprintChildren::None => (),
					BlueprintChildren::Value { fragment, .. } => out.push_str(fragment),
					BlueprintChildren::Single(child) => self.check_deep_changes(out, child, context, sync, depth_limit - 1)?,
					BlueprintChildren::List(list) => {
						for entry in &list.entries {
							self.check_deep_changes(out, &entry.blueprint, context, sync, depth_limit - 1)?;
						}
					}
				}
				if let Some(close) = &a.close {
					out.push_str(close);
				}
			}

			NodeKind::Class { .. } | NodeKind::Function { .. } => self.reuse_boundary(out, a, context, sync, depth_limit)?,

			NodeKind::Selector { selector, props } => self.patch_selector(out, a, selector, props, context, sync, depth_limit)?,

			NodeKind::Context { values } => {
				let context = match &a.data {
					BlueprintData::Context(captured) if !sync.contains(SyncFlags::DIRTY_CONTEXT) => captured.clone(),
					_ => context.merge(values),
				};
				if let Some(root) = a.root() {
					self.check_deep_changes(out, root, &context, sync, depth_limit - 1)?;
				}
			}
		}
		Ok(())
	}

	/// Emits a component boundary whose own inputs are unchanged.
	fn reuse_boundary(&self, out: &mut String, a: &BlueprintNode, context: &Context, sync: SyncFlags, depth_limit: usize) -> Result<(), RenderError> {
		match a.root() {
			Some(root) if a.deep_dynamic => self.check_deep_changes(out, root, context, sync, depth_limit - 1),
			_ => {
				trace!("Reusing hoisted markup.");
				out.push_str(&a.open);
				Ok(())
			}
		}
	}

	/// Patches a boundary's cached root against a newly rendered one.
	fn patch_root(&self, out: &mut String, a: &BlueprintNode, root: &Node, context: &Context, sync: SyncFlags, depth_limit: usize) -> Result<(), RenderError> {
		match a.root() {
			Some(previous) => self.patch_node(out, previous, root, context, sync, depth_limit - 1),
			None => self.render_node(out, root, context, depth_limit - 1),
		}
	}

	#[allow(clippy::too_many_arguments)]
	fn patch_selector(&self, out: &mut String, a: &BlueprintNode, selector: &Selector, props: &Props, context: &Context, sync: SyncFlags, depth_limit: usize) -> Result<(), RenderError> {
		let span = trace_span!("Patching selector", ?selector);
		let _enter = span.enter();
		let previous = match &a.data {
			BlueprintData::Selection(previous) => Some(previous),
			_ => None,
		};
		let selection = selector.select(previous, props, context);
		if previous.map_or(false, |previous| Rc::ptr_eq(previous, &selection)) {
			trace!("Selection unchanged.");
			self.reuse_boundary(out, a, context, sync, depth_limit)
		} else {
			self.patch_root(out, a, &selector.render(&selection), context, sync, depth_limit)
		}
	}
}
