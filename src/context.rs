use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::rc::Rc;

/// An ambient name → value mapping inherited down the node tree.
///
/// Context-scope nodes ([`Node::context`](`crate::Node::context`)) carry a [`Context`] as payload,
/// which is shallow-merged over the inherited one for their subtree only.
///
/// Cloning is cheap and preserves identity, which is what patching compares.
#[derive(Clone, Default)]
pub struct Context(Rc<HashMap<Rc<str>, Rc<dyn Any>>>);
impl Context {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces an entry.
	///
	/// Clones the underlying map first if this [`Context`] is shared, so other handles are unaffected.
	#[must_use]
	pub fn with(mut self, name: &str, value: impl Any) -> Self {
		Rc::make_mut(&mut self.0).insert(name.into(), Rc::new(value));
		self
	}

	#[must_use]
	pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
		self.0.get(name).and_then(|value| value.downcast_ref())
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Whether both handles refer to the same mapping.
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Creates a new mapping with `overrides` shallow-merged over `self`.
	#[must_use]
	pub fn merge(&self, overrides: &Self) -> Self {
		let mut merged = HashMap::with_capacity(self.0.len() + overrides.0.len());
		merged.extend(self.0.iter().map(|(k, v)| (k.clone(), v.clone())));
		merged.extend(overrides.0.iter().map(|(k, v)| (k.clone(), v.clone())));
		Self(Rc::new(merged))
	}
}
impl Debug for Context {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.0.keys()).finish()
	}
}
