//! Markup escaping.
//!
//! Both escapers borrow their input unchanged if nothing needs to be replaced.

use std::borrow::Cow;

/// Escapes `&`, `<` and `>` for use as text content.
///
/// ```
/// assert_eq!(blueprint_dom::escape_text("a&b<c>d"), "a&amp;b&lt;c&gt;d");
/// ```
#[must_use]
pub fn escape_text(text: &str) -> Cow<'_, str> {
	escape_with(text, |c| match c {
		'&' => Some("&amp;"),
		'<' => Some("&lt;"),
		'>' => Some("&gt;"),
		_ => None,
	})
}

/// Escapes `&` and `"` for use inside a double-quoted attribute or style value.
///
/// `<` and `>` are left alone.
///
/// ```
/// assert_eq!(blueprint_dom::escape_attribute("a\"b&c"), "a&quot;b&amp;c");
/// ```
#[must_use]
pub fn escape_attribute(text: &str) -> Cow<'_, str> {
	escape_with(text, |c| match c {
		'"' => Some("&quot;"),
		'&' => Some("&amp;"),
		_ => None,
	})
}

fn escape_with(text: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
	let mut result = String::new();
	let mut start = 0;
	for (i, c) in text.char_indices() {
		if let Some(escape) = replacement(c) {
			if result.is_empty() {
				result.reserve(text.len() + escape.len());
			}
			result.push_str(&text[start..i]);
			result.push_str(escape);
			start = i + c.len_utf8();
		}
	}

	if start == 0 {
		Cow::Borrowed(text)
	} else {
		result.push_str(&text[start..]);
		Cow::Owned(result)
	}
}
