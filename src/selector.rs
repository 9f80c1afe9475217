//! Memoized selectors.
//!
//! A selector derives a [`Selection`] from props and [`Context`]. Returning the previous
//! [`Selection`] (the same [`Rc`]) tells the patcher that nothing changed, so the subtree is reused
//! without calling the render function.

use crate::{
	component::ComponentClass,
	context::Context,
	node::{Node, Props},
};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;

/// The input/output pair a selector produced.
#[derive(Debug, Clone)]
pub struct Selection {
	input: Props,
	output: Props,
}
impl Selection {
	/// A selection whose output is its input.
	#[must_use]
	pub fn new(input: impl core::any::Any) -> Rc<Self> {
		let input = Props::new(input);
		Rc::new(Self {
			output: input.clone(),
			input,
		})
	}

	#[must_use]
	pub fn with_output(input: impl core::any::Any, output: impl core::any::Any) -> Rc<Self> {
		Rc::new(Self {
			input: Props::new(input),
			output: Props::new(output),
		})
	}

	#[must_use]
	pub fn input(&self) -> &Props {
		&self.input
	}

	/// What the render function receives.
	#[must_use]
	pub fn output(&self) -> &Props {
		&self.output
	}
}

type SelectFn = dyn Fn(Option<&Rc<Selection>>, &Props, &Context) -> Rc<Selection>;
type RenderFn = dyn Fn(&Props) -> Node;

/// A selector descriptor. Create nodes for it with [`Selector::node`].
///
/// Descriptors are compared by reference, so create each once and reuse it.
pub struct Selector {
	select: Box<SelectFn>,
	render: Box<RenderFn>,
}
impl Selector {
	/// A selector node with the given props.
	#[must_use]
	pub fn node(self: &Rc<Self>, props: Props) -> Node {
		Node::selector(self.clone(), props)
	}

	pub(crate) fn select(&self, previous: Option<&Rc<Selection>>, props: &Props, context: &Context) -> Rc<Selection> {
		(self.select)(previous, props, context)
	}

	pub(crate) fn render(&self, selection: &Selection) -> Node {
		(self.render)(selection.output())
	}
}
impl Debug for Selector {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Selector({:p})", self)
	}
}

/// Creates a selector that renders through `render`.
///
/// `select` receives the previous [`Selection`] (`None` when building or rendering from scratch),
/// the node's props and the inherited [`Context`].
#[must_use]
pub fn connect<S, R>(select: S, render: R) -> Rc<Selector>
where
	S: Fn(Option<&Rc<Selection>>, &Props, &Context) -> Rc<Selection> + 'static,
	R: Fn(&Props) -> Node + 'static,
{
	Rc::new(Selector {
		select: Box::new(select),
		render: Box::new(render),
	})
}

/// Creates a selector that renders a `C` with the selected output as props.
#[must_use]
pub fn connect_class<C, S>(select: S) -> Rc<Selector>
where
	C: ComponentClass,
	S: Fn(Option<&Rc<Selection>>, &Props, &Context) -> Rc<Selection> + 'static,
{
	connect(select, |props| Node::class::<C>(props.clone()))
}
