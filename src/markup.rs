use crate::{
	escape::{escape_attribute, escape_text},
	node::{Attributes, Style, Value},
};
use core::cell::RefCell;
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Memoizes closing tags by tag name.
///
/// Entries never change once inserted, so one cache can be shared by any number of
/// [`Renderer`](`crate::Renderer`)s on the same thread via [`Renderer::with_close_tag_cache`](`crate::Renderer::with_close_tag_cache`).
#[derive(Debug, Default)]
pub struct CloseTagCache(RefCell<HashMap<Rc<str>, Rc<str>>>);
impl CloseTagCache {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// `</tag>`
	#[must_use]
	pub fn get(&self, tag: &Rc<str>) -> Rc<str> {
		if let Some(close) = self.0.borrow().get(tag) {
			return close.clone();
		}
		trace!(tag = &**tag, "Caching close tag.");
		let close: Rc<str> = format!("</{}>", tag).into();
		self.0.borrow_mut().insert(tag.clone(), close.clone());
		close
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.borrow().is_empty()
	}
}

/// Translates property-style names into their markup attribute names.
pub(crate) fn attribute_name(name: &str) -> &str {
	match name {
		"acceptCharset" => "accept-charset",
		"htmlFor" => "for",
		name => name,
	}
}

pub(crate) fn write_open_tag(out: &mut String, tag: &str, class_name: Option<&str>, attributes: Option<&Attributes>, style: Option<&Style>) {
	out.push('<');
	out.push_str(tag);
	if let Some(class_name) = class_name {
		out.push_str(" class=\"");
		out.push_str(&escape_attribute(class_name));
		out.push('"');
	}
	if let Some(attributes) = attributes {
		write_attributes(out, attributes);
	}
	if let Some(style) = style {
		write_style(out, style);
	}
	out.push('>');
}

fn write_attributes(out: &mut String, attributes: &Attributes) {
	for (name, value) in attributes.iter() {
		match value {
			Value::Null | Value::Bool(false) => (),
			Value::Bool(true) => {
				out.push(' ');
				out.push_str(attribute_name(name));
			}
			value => {
				out.push(' ');
				out.push_str(attribute_name(name));
				out.push_str("=\"");
				out.push_str(&escape_attribute(&value.as_text()));
				out.push('"');
			}
		}
	}
}

fn write_style(out: &mut String, style: &Style) {
	let mut declarations = style.iter().filter(|(_, value)| *value != &Value::Null);
	let (property, value) = match declarations.next() {
		Some(first) => first,
		None => return,
	};
	out.push_str(" style=\"");
	write_declaration(out, property, value);
	for (property, value) in declarations {
		out.push(';');
		write_declaration(out, property, value);
	}
	out.push('"');
}

fn write_declaration(out: &mut String, property: &str, value: &Value) {
	out.push_str(property);
	out.push(':');
	out.push_str(&escape_attribute(&value.as_text()));
}

pub(crate) fn write_text(out: &mut String, value: &Value) {
	out.push_str(&escape_text(&value.as_text()));
}

pub(crate) fn text_fragment(value: &Value) -> String {
	escape_text(&value.as_text()).into_owned()
}
