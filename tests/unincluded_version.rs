#[test]
fn html_root_url() {
	version_sync::assert_html_root_url_updated!("src/lib.rs");
}

#[test]
fn readme_badges() {
	version_sync::assert_contains_regex!("README.md", r"/blueprint-dom/{version}\)");
}
