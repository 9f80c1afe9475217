//! Children diffing, including keyed reconciliation of lists.
//!
//! Output is text, so there's nothing to remove or move: blueprint children without a counterpart
//! are simply not emitted, and new children without one are rendered from scratch.

use crate::{
	blueprint::{BlueprintChildren, BlueprintList},
	context::Context,
	error::RenderError,
	markup::write_text,
	node::{Children, Entry, SlotKey},
	patch::SyncFlags,
	render::Renderer,
};
use tracing::{trace, trace_span};

impl Renderer {
	pub(crate) fn patch_children(&self, out: &mut String, a: &BlueprintChildren, b: &Children, context: &Context, sync: SyncFlags, depth_limit: usize) -> Result<(), RenderError> {
		match (a, b) {
			(_, Children::None) => Ok(()),

			(BlueprintChildren::None, b) => self.render_children(out, b, context, depth_limit),

			(a, Children::Value(value)) => {
				match a {
					BlueprintChildren::Value { value: previous, fragment } if previous == value => out.push_str(fragment),
					_ => write_text(out, value),
				}
				Ok(())
			}

			(BlueprintChildren::Value { .. }, b) => self.render_children(out, b, context, depth_limit),

			(BlueprintChildren::List(list), Children::List(entries)) => self.patch_keyed(out, list, entries, context, sync, depth_limit),

			(BlueprintChildren::List(list), Children::Single(node)) => {
				let span = trace_span!("Patching list to single child", "list.entries.len()" = list.entries.len());
				let _enter = span.enter();
				match list.get(&SlotKey::of_single(node)) {
					Some(previous) => self.patch_node(out, previous, node, context, sync, depth_limit),
					None => self.render_node(out, node, context, depth_limit),
				}
			}

			(BlueprintChildren::Single(previous), Children::List(entries)) => {
				let span = trace_span!("Patching single child to list", "entries.len()" = entries.len());
				let _enter = span.enter();
				let key = SlotKey::of_single(&previous.node);
				for entry in entries {
					if entry.key == key {
						self.patch_node(out, previous, &entry.node, context, sync, depth_limit)?;
					} else {
						self.render_node(out, &entry.node, context, depth_limit)?;
					}
				}
				Ok(())
			}

			(BlueprintChildren::Single(previous), Children::Single(node)) => self.patch_node(out, previous, node, context, sync, depth_limit),
		}
	}

	/// Matches entries by key in order as long as the keys line up, then looks up the rest by key or position.
	fn patch_keyed(&self, out: &mut String, a: &BlueprintList, b: &[Entry], context: &Context, sync: SyncFlags, depth_limit: usize) -> Result<(), RenderError> {
		let span = trace_span!("Patching list", "a.entries.len()" = a.entries.len(), "b.len()" = b.len());
		let _enter = span.enter();

		let mut aligned = 0;
		for (previous, entry) in a.entries.iter().zip(b) {
			if previous.key != entry.key {
				break;
			}
			self.patch_node(out, &previous.blueprint, &entry.node, context, sync, depth_limit)?;
			aligned += 1;
		}

		let rest = &b[aligned..];
		if !rest.is_empty() {
			trace!(aligned, rest = rest.len(), "Keys misaligned. Switching to index lookup.");
		}
		for entry in rest {
			match a.get(&entry.key) {
				Some(previous) => self.patch_node(out, previous, &entry.node, context, sync, depth_limit)?,
				None => {
					let span = trace_span!("Rendering unmatched entry", key = ?entry.key);
					let _enter = span.enter();
					self.render_node(out, &entry.node, context, depth_limit)?
				}
			}
		}
		Ok(())
	}
}
