#![doc(html_root_url = "https://docs.rs/blueprint-dom/0.0.1")]
#![warn(clippy::pedantic)]

//! Renders [`Node`] trees to escaped markup strings, and re-renders them incrementally.
//!
//! [`Renderer::build_blueprint`] renders a tree once and keeps the result as a [`Blueprint`]:
//! precomputed tag fragments, with every static subtree below a component collapsed into a single string.
//! [`Renderer::patch`] then renders a new tree against it, reusing cached markup wherever inputs are
//! unchanged *by reference* and only recomputing what changed.
//!
//! Patching produces exactly the same output as [`Renderer::render_fresh`].
//!
//! # Threading
//!
//! Everything here is single-threaded ([`Node`]s and [`Blueprint`]s are reference-counted with [`Rc`](`std::rc::Rc`)).
//! Give each thread its own [`Renderer`] and [`Blueprint`].

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod blueprint;
mod component;
mod context;
mod error;
mod escape;
mod markup;
mod node;
mod optimize;
mod patch;
mod reconcile;
mod render;
mod selector;

pub use blueprint::Blueprint;
pub use component::{Component, ComponentClass, FunctionComponent};
pub use context::Context;
pub use error::{ConfigError, RenderError};
pub use escape::{escape_attribute, escape_text};
pub use markup::CloseTagCache;
pub use node::{h, text, try_h, Attributes, Child, Element, Key, Node, NodeFlags, Props, Style, Value};
pub use render::{RenderState, Renderer, DEFAULT_DEPTH_LIMIT};
pub use selector::{connect, connect_class, Selection, Selector};
