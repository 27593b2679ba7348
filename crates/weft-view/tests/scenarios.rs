use std::cell::Cell;
use std::rc::Rc;

use weft_dom::{DomEdit, ListenerFlags};
use weft_reactive::{Observable, ObservableList, ObservableRecord, Value};
use weft_view::{
    Child, El, Handlers, Mapped, Params, Part, RenderConfig, RenderRoot, Switched, ViewError,
    compile, html,
};

#[test]
fn realize_shorthand_descriptor() {
    let root = RenderRoot::new();
    let node = root.realize(&El::new("div#id.cls[data-x=1]"));
    let doc = root.document();

    assert_eq!(doc.tag_name(node).as_deref(), Some("div"));
    assert_eq!(doc.attribute(node, "id").as_deref(), Some("id"));
    assert_eq!(doc.class_list(node), vec!["cls".to_owned()]);
    assert_eq!(doc.attribute(node, "data-x").as_deref(), Some("1"));
}

#[test]
fn realize_is_idempotent_after_reconfiguration() {
    let root = RenderRoot::new();
    let el = El::new("section").params(Params::new().attrs([("title", "a")]));
    let first = root.realize(&el);

    el.set_params(Params::new().attrs([("title", "b")]));
    el.set_selector("article");

    assert_eq!(root.realize(&el), first);
    assert_eq!(root.document().tag_name(first).as_deref(), Some("section"));
    assert_eq!(root.document().attribute(first, "title").as_deref(), Some("a"));
}

#[test]
fn template_text_child() {
    let root = RenderRoot::new();
    let node = html!(root; "<div>" {"hi"} "</div>");
    let doc = root.document();

    assert_eq!(doc.tag_name(node).as_deref(), Some("div"));
    let children = doc.child_nodes(node);
    assert_eq!(children.len(), 1);
    assert_eq!(doc.text(children[0]).as_deref(), Some("hi"));
}

#[test]
fn template_list_child_is_projected() {
    let root = RenderRoot::new();
    let node = html!(root; "<div>" {vec![1, 2, 3]} "</div>");
    let doc = root.document();

    // One host fragment holding the three projected text nodes.
    let host = doc.child_nodes(node)[0];
    assert_eq!(doc.child_count(host), 3);
    assert_eq!(doc.text_content(node), "123");
    assert_eq!(doc.flat_children(node).len(), 3);
}

#[test]
fn template_list_child_stays_live() {
    let root = RenderRoot::new();
    let items: ObservableList<Value> = ObservableList::new(vec![Value::from("a")]);
    let node = html!(root; "<ul>" {items.clone()} "</ul>");

    items.push(Value::from("b"));
    root.flush();
    assert_eq!(root.document().text_content(node), "ab");

    items.delete(0);
    root.flush();
    assert_eq!(root.document().text_content(node), "b");
}

#[test]
fn template_iterate_with_projection() {
    let root = RenderRoot::new();
    let rows: ObservableList<Value> = ObservableList::new(vec![Value::from("x"), Value::from("y")]);
    let project = Part::func(|item| {
        Child::El(El::new("li").child(item.as_text().unwrap_or_default()))
    });
    let node = html!(root; "<ul iterate=" {rows.clone()} ">" {project} "</ul>");
    let doc = root.document();

    assert_eq!(doc.inner_html(node), "<li>x</li><li>y</li>");
    assert!(!doc.has_attribute(node, "iterate"));

    rows.push(Value::from("z"));
    root.flush();
    assert_eq!(doc.inner_html(node), "<li>x</li><li>y</li><li>z</li>");
}

#[test]
fn template_events_and_props() {
    let root = RenderRoot::new();
    let clicks = Rc::new(Cell::new(0));
    let sink = Rc::clone(&clicks);
    let on_click = Handlers::from(move |_: &weft_dom::Event| sink.set(sink.get() + 1));
    let node = compile(
        &root,
        &["<button @click=", " prop:value=", ">go</button>"],
        vec![Part::from(on_click), Part::from(7)],
    );
    let doc = root.document();

    assert!(!doc.has_attribute(node, "@click"));
    assert_eq!(
        doc.property(node, "value"),
        Some(weft_dom::PropValue::Number(7.0))
    );
    doc.dispatch(node, "click");
    assert_eq!(clicks.get(), 1);
}

#[test]
fn template_record_bags() {
    let root = RenderRoot::new();
    let style = ObservableRecord::default();
    style.set("color", Value::from("red"));
    let data = ObservableRecord::default();
    data.set("userId", Value::from(5));
    let node = html!(root; "<p style=" {style.clone()} " dataset=" {data.clone()} ">x</p>");
    let doc = root.document();

    assert_eq!(doc.style(node, "color").as_deref(), Some("red"));
    assert_eq!(doc.attribute(node, "data-user-id").as_deref(), Some("5"));
    style.set("color", Value::from("blue"));
    assert_eq!(doc.style(node, "color").as_deref(), Some("blue"));
}

#[test]
fn template_children_remain_editable() {
    let root = RenderRoot::new();
    let node = html!(root; "<ol><li>a</li></ol>");
    let doc = root.document();

    assert_eq!(doc.child_count(node), 1);
    assert_eq!(doc.text_content(node), "a");
}

#[test]
fn switch_replaces_in_place() {
    let root = RenderRoot::new();
    let index = Observable::new(0_i64);
    let a = El::new("span.a");
    let b = El::new("span.b");
    let switched = Switched::new(index.clone(), vec![a.clone(), b.clone()]);

    assert_eq!(switched.element(&root), Some(root.realize(&a)));

    let doc = root.document();
    let _ = doc.take_edits();
    index.set(1);

    let structural: Vec<DomEdit> = doc
        .take_edits()
        .into_iter()
        .filter(DomEdit::is_structural)
        .collect();
    assert_eq!(structural.len(), 1);
    assert!(matches!(structural[0], DomEdit::Replace { .. }));
    assert_eq!(switched.element(&root), Some(root.realize(&b)));
    assert_eq!(doc.parent(root.realize(&a)), None);
}

#[test]
fn switch_inside_a_child_list() {
    let root = RenderRoot::new();
    let index = Observable::new(-1_i64);
    let switched = Switched::new(index.clone(), vec![El::new("em").child("on")]);
    let node = root.realize(&El::new("p").child(switched));
    let doc = root.document();

    assert_eq!(doc.text_content(node), "");
    index.set(0);
    assert_eq!(doc.text_content(node), "on");
    index.set(5);
    assert_eq!(doc.text_content(node), "");
}

#[test]
fn attribute_round_trip() {
    let root = RenderRoot::new();
    let attrs: ObservableRecord<Value> = ObservableRecord::default();
    let node = root.realize(&El::new("div").params(Params::new().attrs(attrs.clone())));
    let doc = root.document();

    for (value, expected) in [
        (Value::from("s"), Some("s")),
        (Value::from(42), Some("42")),
        (Value::from(1.5), Some("1.5")),
        (Value::Bool(true), Some("true")),
        (Value::Bool(false), None),
        (Value::from(0), Some("0")),
        (Value::Null, None),
    ] {
        attrs.set("x", value);
        assert_eq!(doc.attribute(node, "x").as_deref(), expected);
    }
}

#[test]
fn two_way_attribute_converges_without_echo() {
    let root = RenderRoot::new();
    let attrs = ObservableRecord::default();
    attrs.set("value", Value::from("a"));
    let node = root.realize(&El::new("input").params(Params::new().attrs(attrs.clone())));
    let doc = root.document();
    root.flush();

    let record_writes = Rc::new(Cell::new(0));
    let sink = Rc::clone(&record_writes);
    let _watch = attrs.subscribe(move |_| sink.set(sink.get() + 1));

    // External change.
    doc.set_attribute(node, "value", "b");
    let _ = doc.take_edits();
    root.flush();

    assert_eq!(record_writes.get(), 1);
    assert_eq!(attrs.get("value"), Some(Value::from("b")));
    // The record write produced no node write.
    assert_eq!(doc.edit_count(), 0);

    // Writing the same value again is silent on the node too.
    attrs.set("value", Value::from("b"));
    root.flush();
    assert_eq!(doc.edit_count(), 0);
}

#[test]
fn two_way_can_be_disabled() {
    let root = RenderRoot::with_config(RenderConfig::default().with_two_way_attributes(false));
    let attrs = ObservableRecord::default();
    attrs.set("value", Value::from("a"));
    let node = root.realize(&El::new("input").params(Params::new().attrs(attrs.clone())));

    root.document().set_attribute(node, "value", "b");
    root.flush();
    assert_eq!(attrs.get("value"), Some(Value::from("a")));
}

#[test]
fn text_set_preserves_node_identity() {
    let root = RenderRoot::new();
    let items: ObservableList<Child> =
        ObservableList::new(vec![Child::text("one"), Child::text("two")]);
    let node = root.realize(&El::new("p").children(items.clone()));
    let doc = root.document();
    let before = doc.child_at(node, 1);

    items.set(1, Child::text("new"));
    root.flush();

    assert_eq!(doc.child_at(node, 1), before);
    assert_eq!(doc.text_content(node), "onenew");
}

#[test]
fn burst_of_ops_flushes_once_in_order() {
    let root = RenderRoot::new();
    let items: ObservableList<Child> = ObservableList::default();
    let node = root.realize(&El::new("ul").children(items.clone()));
    let doc = root.document();

    items.push(Child::text("a"));
    items.push(Child::text("b"));
    items.splice(0, 1, vec![Child::text("c")]);
    items.pop();
    items.push(Child::text("d"));
    assert_eq!(doc.child_count(node), 0);

    root.flush();
    assert_eq!(doc.text_content(node), "cd");
}

#[test]
fn moved_el_keeps_its_node() {
    let root = RenderRoot::new();
    let a = El::new("li.a");
    let b = El::new("li.b");
    let items: ObservableList<Child> =
        ObservableList::new(vec![Child::El(a.clone()), Child::El(b.clone())]);
    let node = root.realize(&El::new("ul").children(items.clone()));
    let doc = root.document();
    let (na, nb) = (root.realize(&a), root.realize(&b));

    items.replace_all(vec![Child::El(b), Child::El(a)]);
    root.flush();

    assert_eq!(doc.child_nodes(node), vec![nb, na]);
}

#[test]
fn mapped_caches_items_by_identity() {
    let root = RenderRoot::new();
    let inner: ObservableRecord<Value> = ObservableRecord::default();
    let source: ObservableList<Value> = ObservableList::new(vec![
        Value::Record(inner.clone()),
        Value::from("tail"),
    ]);
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let mapped = Mapped::new(source.clone(), move |_| {
        counter.set(counter.get() + 1);
        Child::El(El::new("div"))
    });
    mapped.element(&root);
    assert_eq!(calls.get(), 2);

    source.push(Value::from("more"));
    root.flush();
    assert_eq!(calls.get(), 3);
}

#[test]
fn mount_without_parent_is_an_error() {
    let root = RenderRoot::new();
    assert_eq!(root.mount(None, "x"), Err(ViewError::MissingNode("mount")));
    assert!(root.require(None, "drag handle").is_err());
}

#[test]
fn listeners_from_params_keep_their_flags() {
    let root = RenderRoot::new();
    let hits = Rc::new(Cell::new(0));
    let sink = Rc::clone(&hits);
    let params = Params::new().on(
        "tap",
        Handlers::new().with(move |_| sink.set(sink.get() + 1), ListenerFlags::ONCE),
    );
    let node = root.realize(&El::new("button").params(params));
    let doc = root.document();

    doc.dispatch(node, "tap");
    doc.dispatch(node, "tap");
    assert_eq!(hits.get(), 1);
}

#[test]
fn popped_children_release_their_bindings() {
    let root = RenderRoot::new();
    let cell = Observable::new(Value::from("x"));
    let items: ObservableList<Child> = (0..20)
        .map(|_| Child::El(El::new("li").child(Child::Cell(cell.clone()))))
        .collect();
    let node = root.realize(&El::new("ul").children(items.clone()));
    assert_eq!(cell.subscriber_count(), 20);
    assert_eq!(root.scope_count(), 21);

    while items.pop().is_some() {}
    root.flush();

    assert_eq!(root.document().child_count(node), 0);
    assert_eq!(cell.subscriber_count(), 0);
    assert_eq!(root.scope_count(), 1);

    // Writes after the release no longer reach anything.
    let _ = root.document().take_edits();
    cell.set(Value::from("y"));
    assert_eq!(root.document().edit_count(), 0);
}
