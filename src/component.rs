//! Component traits.
//!
//! Components are plain types, so whether something can render is decided by the compiler.
//! Nodes only store type-erased references to them, compared by [`TypeId`].

use crate::node::{Node, Props};
use core::{
	any::{type_name, TypeId},
	fmt::{self, Debug, Formatter},
};

/// A stateless component: a function from props to a root [`Node`].
///
/// ```
/// use blueprint_dom::{h, FunctionComponent, Node, Props};
///
/// struct Greeting;
/// impl FunctionComponent for Greeting {
/// 	fn render(props: &Props) -> Node {
/// 		let name = props.get::<&str>().copied().unwrap_or("world");
/// 		h("p").children([format!("Hello {}!", name)]).into()
/// 	}
/// }
///
/// let node = Node::function::<Greeting>(Props::new("Ferris"));
/// ```
pub trait FunctionComponent: 'static {
	fn render(props: &Props) -> Node;

	/// Whether a change from `old` to `new` props requires calling [`render`](`FunctionComponent::render`) again.
	///
	/// Defaults to reference inequality.
	fn should_update(old: &Props, new: &Props) -> bool {
		!old.ptr_eq(new)
	}
}

/// A component instance, kept alive inside a blueprint between patches.
pub trait Component {
	fn render(&self) -> Node;

	/// Whether a change from `old` to `new` props requires constructing a new instance.
	///
	/// Defaults to reference inequality.
	fn should_update(&self, old: &Props, new: &Props) -> bool {
		!old.ptr_eq(new)
	}
}

/// A [`Component`] that can be constructed from props.
pub trait ComponentClass: Component + Sized + 'static {
	fn create(props: &Props) -> Self;
}

#[derive(Clone, Copy)]
pub(crate) struct FunctionRef {
	type_id: TypeId,
	name: &'static str,
	pub render: fn(&Props) -> Node,
	pub should_update: fn(&Props, &Props) -> bool,
}
impl FunctionRef {
	pub fn of<F: FunctionComponent>() -> Self {
		Self {
			type_id: TypeId::of::<F>(),
			name: type_name::<F>(),
			render: F::render,
			should_update: F::should_update,
		}
	}
}
impl PartialEq for FunctionRef {
	fn eq(&self, other: &Self) -> bool {
		self.type_id == other.type_id
	}
}
impl Debug for FunctionRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

#[derive(Clone, Copy)]
pub(crate) struct ClassRef {
	type_id: TypeId,
	name: &'static str,
	pub create: fn(&Props) -> Box<dyn Component>,
}
impl ClassRef {
	pub fn of<C: ComponentClass>() -> Self {
		Self {
			type_id: TypeId::of::<C>(),
			name: type_name::<C>(),
			create: create_instance::<C>,
		}
	}
}
impl PartialEq for ClassRef {
	fn eq(&self, other: &Self) -> bool {
		self.type_id == other.type_id
	}
}
impl Debug for ClassRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

fn create_instance<C: ComponentClass>(props: &Props) -> Box<dyn Component> {
	Box::new(C::create(props))
}
