use blueprint_dom::{connect, h, text, Attributes, Child, Component, ComponentClass, Context, FunctionComponent, Node, Props, RenderError, RenderState, Renderer, Selection, Selector, DEFAULT_DEPTH_LIMIT};
use std::{any::Any, cell::Cell, rc::Rc};


/// Patches `after` against a blueprint of `before` and checks the result against a fresh render.
fn assert_patch_matches_fresh(before: &Node, after: &Node) -> String {
	logging_::init();
	let renderer = Renderer::new();
	let blueprint = renderer.build_blueprint(before).unwrap();
	let patched = renderer.patch(&blueprint, after).unwrap();
	assert_eq!(patched, renderer.render_fresh(after).unwrap());
	patched
}

struct ItemProps {
	id: u32,
	renders: Cell<usize>,
}

struct Item;
impl FunctionComponent for Item {
	fn render(props: &Props) -> Node {
		let props = props.get::<ItemProps>().unwrap();
		props.renders.set(props.renders.get() + 1);
		h("li").children([i64::from(props.id)]).into()
	}
}

fn item_props(id: u32) -> Props {
	Props::new(ItemProps { id, renders: Cell::new(0) })
}

fn renders(props: &Props) -> usize {
	props.get::<ItemProps>().unwrap().renders.get()
}

fn keyed_list(props: &[Props]) -> Node {
	h("ul")
		.children(props.iter().map(|props| Node::function::<Item>(props.clone()).key(props.get::<ItemProps>().unwrap().id)))
		.into()
}

#[test]
fn keyed_reordering_reuses_items() {
	logging_::init();
	let props: Vec<Props> = (1..=3).map(item_props).collect();
	let renderer = Renderer::new();

	let blueprint = renderer.build_blueprint(&keyed_list(&props)).unwrap();
	assert!(props.iter().all(|props| renders(props) == 1));

	let reordered = keyed_list(&[props[2].clone(), props[0].clone(), props[1].clone()]);
	let patched = renderer.patch(&blueprint, &reordered).unwrap();
	assert_eq!(patched, "<ul><li>3</li><li>1</li><li>2</li></ul>");
	assert!(props.iter().all(|props| renders(props) == 1));

	assert_eq!(patched, renderer.render_fresh(&reordered).unwrap());
}

#[test]
fn keyed_insertion_and_removal() {
	logging_::init();
	let props: Vec<Props> = (1..=4).map(item_props).collect();
	let renderer = Renderer::new();

	let blueprint = renderer.build_blueprint(&keyed_list(&props[..3])).unwrap();
	let changed = keyed_list(&[props[0].clone(), props[3].clone(), props[2].clone()]);
	let patched = renderer.patch(&blueprint, &changed).unwrap();
	assert_eq!(patched, "<ul><li>1</li><li>4</li><li>3</li></ul>");
	assert_eq!(props.iter().map(renders).collect::<Vec<_>>(), [1, 1, 1, 1]);
}

#[test]
fn positional_keys_survive_optional_siblings() {
	logging_::init();
	let props: Vec<Props> = (1..=3).map(item_props).collect();
	let item = |i: usize| Node::function::<Item>(props[i].clone());
	let renderer = Renderer::new();

	let before: Node = h("ul").children([item(0).into(), Child::Empty, item(2).into()]).into();
	let blueprint = renderer.build_blueprint(&before).unwrap();

	let after: Node = h("ul").children([item(0), item(1), item(2)]).into();
	let patched = renderer.patch(&blueprint, &after).unwrap();
	assert_eq!(patched, "<ul><li>1</li><li>2</li><li>3</li></ul>");
	assert_eq!(props.iter().map(renders).collect::<Vec<_>>(), [1, 1, 1]);
}

#[test]
fn growing_list_argument_keeps_later_siblings() {
	logging_::init();
	let footer = item_props(99);
	let page = |items: usize| -> Node {
		let items: Vec<Node> = (0..items).map(|i| text(format!("item {}", i))).collect();
		h("main")
			.children([Child::from(h("header")), items.into(), Node::function::<Item>(footer.clone()).into()])
			.into()
	};
	let renderer = Renderer::new();
	let blueprint = renderer.build_blueprint(&page(2)).unwrap();
	assert_eq!(renders(&footer), 1);

	for items in [3, 1, 0, 2] {
		let before = renders(&footer);
		let patched = renderer.patch(&blueprint, &page(items)).unwrap();
		assert_eq!(renders(&footer), before);
		assert_eq!(patched, renderer.render_fresh(&page(items)).unwrap());
	}
}

#[test]
fn props_sharing_an_allocation_are_unchanged() {
	logging_::init();
	let shared: Rc<dyn Any> = Rc::new(ItemProps { id: 7, renders: Cell::new(0) });
	let count = || shared.downcast_ref::<ItemProps>().unwrap().renders.get();
	let renderer = Renderer::new();

	let blueprint = renderer.build_blueprint(&Node::function::<Item>(Props::from_rc(shared.clone()))).unwrap();
	let patched = renderer.patch(&blueprint, &Node::function::<Item>(Props::from_rc(shared.clone()))).unwrap();
	assert_eq!(patched, "<li>7</li>");
	assert_eq!(count(), 1);

	renderer.patch(&blueprint, &Node::function::<Item>(item_props(7))).unwrap();
	assert_eq!(count(), 1);
}

#[test]
fn changed_props_rerender() {
	logging_::init();
	let props: Vec<Props> = (1..=2).map(item_props).collect();
	let renderer = Renderer::new();
	let blueprint = renderer.build_blueprint(&keyed_list(&props)).unwrap();

	let replacement = Props::new(ItemProps { id: 2, renders: Cell::new(0) });
	let patched = renderer.patch(&blueprint, &keyed_list(&[props[0].clone(), replacement.clone()])).unwrap();
	assert_eq!(patched, "<ul><li>1</li><li>2</li></ul>");
	assert_eq!(renders(&props[0]), 1);
	assert_eq!(renders(&replacement), 1);
}

#[test]
fn text_and_attributes() {
	let title = Rc::new(Attributes::new().with("title", "same"));
	let before: Node = h("p").attrs(title.clone()).children(["old", " text"]).into();
	let after: Node = h("p").attrs(title).children(["new", " text"]).into();
	assert_eq!(assert_patch_matches_fresh(&before, &after), r#"<p title="same">new text</p>"#);

	let before: Node = h("p").class("a").attrs(Attributes::new().with("hidden", true)).into();
	let after: Node = h("p").class("b").attrs(Attributes::new().with("hidden", false)).into();
	assert_eq!(assert_patch_matches_fresh(&before, &after), r#"<p class="b"></p>"#);
}

#[test]
fn children_shape_changes() {
	let shapes: Vec<Node> = vec![
		h("div").into(),
		h("div").children(["value"]).into(),
		h("div").children(["other value"]).into(),
		h("div").children([h("b").children(["single"])]).into(),
		h("div").children([h("i").children(["single"])]).into(),
		h("div").children([h("b").children(["first"]).into(), text("second")]).into(),
		h("div").children([text("first"), h("b").children(["second"]).into()]).into(),
		h("div").children([text("x").key("k"), text("y")]).into(),
		h("div").children([text("z").key("k")]).into(),
	];
	for before in &shapes {
		for after in &shapes {
			assert_patch_matches_fresh(before, after);
		}
	}
}

struct Wrapper;
impl FunctionComponent for Wrapper {
	fn render(props: &Props) -> Node {
		h("div").children([*props.get::<&str>().unwrap()]).into()
	}
}

struct OtherWrapper;
impl FunctionComponent for OtherWrapper {
	fn render(props: &Props) -> Node {
		h("div").children([*props.get::<&str>().unwrap()]).into()
	}
}

#[test]
fn kind_and_tag_changes() {
	let shapes: Vec<Node> = vec![
		text("text"),
		h("div").children(["element"]).into(),
		h("span").children(["element"]).into(),
		Node::function::<Wrapper>(Props::new("wrapped")),
		Node::function::<OtherWrapper>(Props::new("wrapped")),
		Node::function::<Wrapper>(Props::new("wrapped")).key(1),
		Node::context(Context::new(), text("scoped")),
	];
	for before in &shapes {
		for after in &shapes {
			assert_patch_matches_fresh(before, after);
		}
	}
}

#[test]
fn identical_node_is_reused() {
	let shared: Node = h("main").children([h("p").children(["static"]).into(), Node::function::<Wrapper>(Props::new("x"))]).into();
	assert_patch_matches_fresh(&shared, &shared);
	assert_patch_matches_fresh(&shared, &h("body").children([shared.clone()]).into());
}

fn counted_title(render_count: Rc<Cell<usize>>) -> Rc<Selector> {
	connect(
		|previous, _, context| {
			let title = context.get::<String>("title").cloned().unwrap_or_default();
			match previous {
				Some(previous) if previous.input().get::<String>() == Some(&title) => previous.clone(),
				_ => Selection::new(title),
			}
		},
		move |title| {
			render_count.set(render_count.get() + 1);
			h("h1").children([title.get::<String>().unwrap().clone()]).into()
		},
	)
}

fn titled_page(selector: &Rc<Selector>, title: &str) -> Node {
	Node::context(
		Context::new().with("title", title.to_owned()),
		h("main").children([h("p").children(["static"]).into(), selector.node(Props::none())]),
	)
}

#[test]
fn unchanged_selection_skips_render() {
	logging_::init();
	let render_count = Rc::new(Cell::new(0));
	let selector = counted_title(render_count.clone());
	let renderer = Renderer::new();

	let blueprint = renderer.build_blueprint(&titled_page(&selector, "Draft")).unwrap();
	assert_eq!(render_count.get(), 1);

	let first = renderer.patch(&blueprint, &titled_page(&selector, "Draft")).unwrap();
	let second = renderer.patch(&blueprint, &titled_page(&selector, "Draft")).unwrap();
	assert_eq!(render_count.get(), 1);
	assert_eq!(first, "<main><p>static</p><h1>Draft</h1></main>");
	assert_eq!(first, second);

	let changed = renderer.patch(&blueprint, &titled_page(&selector, "Published")).unwrap();
	assert_eq!(render_count.get(), 2);
	assert_eq!(changed, "<main><p>static</p><h1>Published</h1></main>");
}

#[test]
fn blueprint_is_a_fixed_baseline() {
	logging_::init();
	let selector = counted_title(Rc::new(Cell::new(0)));
	let renderer = Renderer::new();
	let blueprint = renderer.build_blueprint(&titled_page(&selector, "A")).unwrap();

	let mut state = RenderState::new();
	renderer.render(&mut state, &titled_page(&selector, "B"), Some(&blueprint)).unwrap();
	assert_eq!(state.result, "<main><p>static</p><h1>B</h1></main>");
	state.result.clear();
	renderer.render(&mut state, &titled_page(&selector, "A"), Some(&blueprint)).unwrap();
	assert_eq!(state.result, "<main><p>static</p><h1>A</h1></main>");
}

#[test]
fn context_change_reaches_selectors_below_unchanged_components() {
	struct Shell {
		content: Node,
	}
	impl Component for Shell {
		fn render(&self) -> Node {
			h("div").class("shell").children([self.content.clone()]).into()
		}
	}
	impl ComponentClass for Shell {
		fn create(props: &Props) -> Self {
			Self {
				content: props.get::<Node>().unwrap().clone(),
			}
		}
	}

	logging_::init();
	let selector = counted_title(Rc::new(Cell::new(0)));
	let shell_props = Props::new(selector.node(Props::none()));
	let page = |title: &str| Node::context(Context::new().with("title", title.to_owned()), Node::class::<Shell>(shell_props.clone()));

	let renderer = Renderer::new();
	let blueprint = renderer.build_blueprint(&page("before")).unwrap();
	assert!(blueprint.is_deep_dynamic());
	assert_eq!(renderer.patch(&blueprint, &page("after")).unwrap(), r#"<div class="shell"><h1>after</h1></div>"#);
	assert_eq!(renderer.patch(&blueprint, &page("before")).unwrap(), r#"<div class="shell"><h1>before</h1></div>"#);
}

#[test]
fn nested_context_scopes_see_outer_changes() {
	logging_::init();
	let selector = counted_title(Rc::new(Cell::new(0)));
	let inner = Context::new().with("unrelated", 1);
	let page = |title: &str| {
		Node::context(
			Context::new().with("title", title.to_owned()),
			Node::context(inner.clone(), selector.node(Props::none())),
		)
	};
	assert_patch_matches_fresh(&page("outer before"), &page("outer after"));
}

struct Frozen {
	label: &'static str,
}
impl Component for Frozen {
	fn render(&self) -> Node {
		text(self.label)
	}

	fn should_update(&self, _: &Props, _: &Props) -> bool {
		false
	}
}
impl ComponentClass for Frozen {
	fn create(props: &Props) -> Self {
		Self {
			label: props.get::<&str>().copied().unwrap(),
		}
	}
}

#[test]
fn class_should_update_is_honored() {
	logging_::init();
	let renderer = Renderer::new();
	let blueprint = renderer.build_blueprint(&Node::class::<Frozen>(Props::new("first"))).unwrap();
	assert_eq!(renderer.patch(&blueprint, &Node::class::<Frozen>(Props::new("second"))).unwrap(), "first");
}

struct AlwaysFresh;
impl FunctionComponent for AlwaysFresh {
	fn render(props: &Props) -> Node {
		text(*props.get::<&str>().unwrap())
	}

	fn should_update(_: &Props, _: &Props) -> bool {
		true
	}
}

#[test]
fn function_should_update_is_honored() {
	let props = Props::new("same");
	assert_patch_matches_fresh(&Node::function::<AlwaysFresh>(Props::new("old")), &Node::function::<AlwaysFresh>(props.clone()));
	assert_patch_matches_fresh(&Node::function::<AlwaysFresh>(props.clone()), &Node::function::<AlwaysFresh>(props));
}

#[test]
fn reoptimizing_is_harmless() {
	let before: Node = h("div").children([Node::function::<Wrapper>(Props::new("a"))]).into();
	let renderer = Renderer::new();
	let mut blueprint = renderer.build_blueprint(&before).unwrap();
	blueprint.optimize();
	blueprint.optimize();
	let after: Node = h("div").children([Node::function::<Wrapper>(Props::new("b"))]).into();
	assert_eq!(renderer.patch(&blueprint, &after).unwrap(), renderer.render_fresh(&after).unwrap());
	assert_eq!(renderer.patch(&blueprint, &before).unwrap(), renderer.render_fresh(&before).unwrap());
}

#[test]
fn shared_subtree_sees_context_changes() {
	logging_::init();
	let selector = counted_title(Rc::new(Cell::new(0)));
	let body: Node = h("main").children([selector.node(Props::none())]).into();
	let page = |title: &str| Node::context(Context::new().with("title", title.to_owned()), body.clone());

	let renderer = Renderer::new();
	let blueprint = renderer.build_blueprint(&page("one")).unwrap();
	assert_eq!(renderer.patch(&blueprint, &page("two")).unwrap(), "<main><h1>two</h1></main>");
	assert_eq!(renderer.patch(&blueprint, &page("one")).unwrap(), "<main><h1>one</h1></main>");
}

#[test]
fn depth_limit() {
	logging_::init();
	let shallow: Node = h("a").into();
	let deep: Node = h("a").children([h("b").children([h("c").children([h("d")])])]).into();
	let blueprint = Renderer::new().build_blueprint(&shallow).unwrap();

	let limited = Renderer::new().with_depth_limit(3);
	assert_eq!(limited.patch(&blueprint, &deep), Err(RenderError::DepthLimitExceeded { limit: 3 }));
	assert_eq!(limited.patch(&blueprint, &shallow).unwrap(), "<a></a>");
	assert_eq!(limited.build_blueprint(&deep).map(|_| ()), Err(RenderError::DepthLimitExceeded { limit: 3 }));
}

fn nested(depth: usize) -> Node {
	(1..depth).fold(h("i").into(), |node, _| h("b").children([node]).into())
}

#[test]
fn default_depth_limit() {
	logging_::init();
	let renderer = Renderer::new();
	let blueprint = renderer.build_blueprint(&nested(DEFAULT_DEPTH_LIMIT - 8)).unwrap();
	assert_eq!(
		renderer.patch(&blueprint, &nested(DEFAULT_DEPTH_LIMIT + 8)),
		Err(RenderError::DepthLimitExceeded { limit: DEFAULT_DEPTH_LIMIT })
	);
	let within = nested(DEFAULT_DEPTH_LIMIT);
	assert_eq!(renderer.patch(&blueprint, &within).unwrap(), renderer.render_fresh(&within).unwrap());
}
