//! Static hoisting.
//!
//! A single bottom-up fold over a fresh blueprint. Every node appends its static markup to the
//! accumulator of the nearest enclosing component boundary (component or selector node) and reports
//! whether it contains a dynamic node. Boundaries without dynamic descendants keep their whole
//! subtree's markup as one string; the others drop it and stay live for patching.
//! Context scopes are transparent: they pass the accumulator through.

use crate::{
	blueprint::{BlueprintChildren, BlueprintNode},
	node::NodeFlags,
};
use tracing::trace;

pub(crate) fn optimize(root: &mut BlueprintNode) {
	let mut discarded = String::new();
	let dynamic = fold(root, &mut discarded);
	trace!(dynamic, "Optimized blueprint.");
}

/// Appends `node`'s static markup to `hoisted` and returns whether it is or contains a dynamic node.
fn fold(node: &mut BlueprintNode, hoisted: &mut String) -> bool {
	let flags = node.node.flags();
	if flags.contains(NodeFlags::TEXT) {
		hoisted.push_str(&node.open);
		false
	} else if flags.contains(NodeFlags::ELEMENT) {
		hoisted.push_str(&node.open);
		let dynamic = fold_children(&mut node.children, hoisted);
		if let Some(close) = &node.close {
			hoisted.push_str(close);
		}
		node.deep_dynamic = dynamic;
		dynamic
	} else if flags.contains(NodeFlags::CONTEXT) {
		let dynamic = fold_children(&mut node.children, hoisted);
		node.deep_dynamic = dynamic;
		dynamic
	} else {
		let mut own = String::new();
		let dynamic = fold_children(&mut node.children, &mut own);
		node.deep_dynamic = dynamic;
		if dynamic {
			node.open.clear();
		} else {
			hoisted.push_str(&own);
			node.open = own;
		}
		dynamic || flags.contains(NodeFlags::SELECTOR)
	}
}

fn fold_children(children: &mut BlueprintChildren, hoisted: &mut String) -> bool {
	match children {
		BlueprintChildren::None => false,
		BlueprintChildren::Value { fragment, .. } => {
			hoisted.push_str(fragment);
			false
		}
		BlueprintChildren::Single(child) => fold(child, hoisted),
		BlueprintChildren::List(list) => list.entries.iter_mut().fold(false, |dynamic, entry| fold(&mut entry.blueprint, hoisted) | dynamic),
	}
}
