#![forbid(unsafe_code)]

//! Tagged-template compilation.
//!
//! [`compile`] takes literal markup segments and the values interpolated
//! between them (what [`html!`](crate::html) produces) and returns a
//! realized, live-bound subtree.
//!
//! 1. Each interpolation is classified by the markup before it: tag name,
//!    attribute value (`name=`), text inside a quoted attribute, or child
//!    content. Attribute values become `#i` markers, child content becomes
//!    an `<!--o:i-->` comment.
//! 2. The markup is parsed once (html5ever, through `scraper`) and copied
//!    into the document. Attributes are sorted into concern bags while
//!    copying; only plain literal attributes reach the node directly.
//! 3. Child markers are resolved: a function under an `iterate` element
//!    becomes that element's projection, `Null`/`false` disappear, lists
//!    are projected one-to-one, anything else is resolved and put in place.
//! 4. Every element is wrapped in an [`El`] over the existing node, with
//!    its bags as params and its current children as a live list (or the
//!    projection for `iterate` elements), and realized.
//!
//! | attribute            | goes to                                  |
//! |----------------------|------------------------------------------|
//! | `style`              | style bag (record, or `k: v; ...` text)  |
//! | `class` (record)     | class list bag                           |
//! | `dataset`            | dataset bag (record)                     |
//! | `properties`         | property bag (record)                    |
//! | `aria`               | ARIA bag (record)                        |
//! | `iterate`            | projection source (list)                 |
//! | `@name`, `on:name`   | listeners for `name`                     |
//! | `prop:name`          | property `name`                          |
//! | anything else        | attribute                                |
//!
//! The parser lower-cases attribute names, so `prop:innerHTML` sets the
//! property `innerhtml`.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::LazyLock;

use ahash::AHashMap;
use regex::Regex;
use scraper::Html;
use weft_dom::NodeId;
use weft_reactive::{Observable, ObservableList, ObservableRecord, Value};

use crate::child::Child;
use crate::descriptor::{Children, El};
use crate::mapped::{Mapped, Projection};
use crate::params::{Bag, Handlers, Params};
use crate::root::RenderRoot;
use crate::switched::Switched;

static TAG_POSITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?\s*$").expect("tag position regex is valid"));
static ATTR_POSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\s"'<>/=]+\s*=\s*(["']?)$"#).expect("attribute position regex is valid")
});
static ATTR_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(\d+)$").expect("attribute marker regex is valid"));
static CHILD_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^o:(\d+)$").expect("child marker regex is valid"));
static TAG_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("tag name regex is valid"));

/// One interpolated value.
#[derive(Clone)]
pub enum Part {
    Value(Value),
    Child(Child),
    /// A projection: under an `iterate` element it maps each item;
    /// elsewhere it is called once with `Null`.
    Func(Projection),
    Handlers(Handlers),
}

impl Part {
    #[must_use]
    pub fn func(f: impl Fn(&Value) -> Child + 'static) -> Self {
        Self::Func(Rc::new(f))
    }

    /// Listener(s) for an `@event` / `on:event` attribute.
    #[must_use]
    pub fn on(handlers: impl Into<Handlers>) -> Self {
        Self::Handlers(handlers.into())
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Value(v) => v.kind(),
            Self::Child(c) => c.kind(),
            Self::Func(_) => "function",
            Self::Handlers(_) => "handlers",
        }
    }
}

impl std::fmt::Debug for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Child(c) => f.debug_tuple("Child").field(c).finish(),
            Self::Func(_) => f.write_str("Func"),
            Self::Handlers(h) => f.debug_tuple("Handlers").field(&h.len()).finish(),
        }
    }
}

macro_rules! part_from_value {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Part {
            fn from(v: $ty) -> Self {
                Self::Value(Value::from(v))
            }
        })*
    };
}

part_from_value!(
    Value,
    (),
    bool,
    i32,
    i64,
    u32,
    u64,
    usize,
    f64,
    &str,
    String,
    &String,
    ObservableList<Value>,
    ObservableRecord<Value>,
    Observable<Value>,
    BTreeMap<String, Value>,
    HashMap<String, Value>
);

impl<T: Into<Value>> From<Vec<T>> for Part {
    fn from(items: Vec<T>) -> Self {
        Self::Value(Value::from(items))
    }
}

macro_rules! part_from_child {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Part {
            fn from(c: $ty) -> Self {
                Self::Child(Child::from(c))
            }
        })*
    };
}

part_from_child!(Child, El, Mapped, Switched, NodeId, ObservableList<Child>);

impl From<Handlers> for Part {
    fn from(handlers: Handlers) -> Self {
        Self::Handlers(handlers)
    }
}

// ── Markup scanning ─────────────────────────────────────────────────

/// Where the markup written so far ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Scan {
    in_tag: bool,
    quote: Option<char>,
    in_comment: bool,
}

impl Scan {
    fn feed(&mut self, text: &str) {
        let mut chars = text.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if self.in_comment {
                if text[i..].starts_with("-->") {
                    self.in_comment = false;
                    chars.next();
                    chars.next();
                }
            } else if self.in_tag {
                match (self.quote, c) {
                    (Some(q), c) if c == q => self.quote = None,
                    (Some(_), _) => {}
                    (None, '"' | '\'') => self.quote = Some(c),
                    (None, '>') => self.in_tag = false,
                    (None, _) => {}
                }
            } else if c == '<' {
                if text[i..].starts_with("<!--") {
                    self.in_comment = true;
                    chars.next();
                    chars.next();
                    chars.next();
                } else {
                    // `<` opens a tag before a letter, a `/`, or an
                    // interpolated tag name.
                    match chars.peek() {
                        Some((_, next)) => {
                            self.in_tag = next.is_ascii_alphabetic() || *next == '/';
                        }
                        None => self.in_tag = true,
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Tag,
    Attr { quoted: bool },
    AttrText,
    Child,
    /// Inside a tag but not after `name=`.
    Bare,
    Comment,
}

fn push(markup: &mut String, scan: &mut Scan, text: &str) {
    markup.push_str(text);
    scan.feed(text);
}

fn classify(markup: &str, scan: Scan) -> Position {
    if scan.in_comment {
        return Position::Comment;
    }
    if !scan.in_tag {
        return Position::Child;
    }
    if scan.quote.is_some() {
        return match ATTR_POSITION_RE.captures(markup) {
            Some(caps) if !caps[1].is_empty() => Position::Attr { quoted: true },
            _ => Position::AttrText,
        };
    }
    if TAG_POSITION_RE.is_match(markup) {
        Position::Tag
    } else if ATTR_POSITION_RE.is_match(markup) {
        Position::Attr { quoted: false }
    } else {
        Position::Bare
    }
}

fn part_text(part: &Part) -> Option<String> {
    match part {
        Part::Value(v) => v.resolved().as_text(),
        Part::Child(Child::Text(s)) => Some(s.clone()),
        _ => None,
    }
}

// ── Compilation ─────────────────────────────────────────────────────

enum Iterate {
    List(ObservableList<Value>),
    Mapped(Mapped),
}

struct PendingElement {
    node: NodeId,
    params: Params,
    attrs: BTreeMap<String, Value>,
    props: BTreeMap<String, Value>,
    iterate: Option<Iterate>,
    iterate_flag: bool,
    projection: Option<Projection>,
}

struct Compiler<'r> {
    root: &'r RenderRoot,
    attr_parts: AHashMap<usize, Part>,
    child_parts: AHashMap<usize, Part>,
    elements: Vec<PendingElement>,
    markers: Vec<(NodeId, usize)>,
}

/// Compile a template into a realized node.
///
/// `strings` are the literal segments around `parts`; there should be one
/// more segment than parts (missing segments count as empty). More than
/// one top-level node yields a fragment.
pub fn compile(root: &RenderRoot, strings: &[&str], parts: Vec<Part>) -> NodeId {
    let mut compiler = Compiler {
        root,
        attr_parts: AHashMap::new(),
        child_parts: AHashMap::new(),
        elements: Vec::new(),
        markers: Vec::new(),
    };
    let part_count = parts.len();
    let markup = compiler.assemble(strings, parts);
    let fragment = compiler.parse(markup.trim());
    compiler.resolve_markers();
    compiler.realize_elements();

    let doc = root.document();
    let top = doc.child_nodes(fragment);
    tracing::debug!(
        target: "weft_view::template",
        parts = part_count,
        elements = compiler.elements.len(),
        top_level = top.len(),
        "compiled template"
    );
    match top.as_slice() {
        [single] => {
            doc.remove_child(fragment, *single);
            *single
        }
        _ => fragment,
    }
}

impl Compiler<'_> {
    fn assemble(&mut self, strings: &[&str], parts: Vec<Part>) -> String {
        let root = self.root;
        let mut markup = String::new();
        let mut scan = Scan::default();

        let count = parts.len();
        for (i, part) in parts.into_iter().enumerate() {
            push(&mut markup, &mut scan, strings.get(i).copied().unwrap_or(""));
            let mut position = classify(&markup, scan);
            if position == (Position::Attr { quoted: true }) {
                // A marker only stands for a whole quoted value.
                let closes = match (scan.quote, strings.get(i + 1)) {
                    (Some(q), Some(next)) => next.starts_with(q),
                    _ => false,
                };
                if !closes {
                    position = Position::AttrText;
                }
            }
            match position {
                Position::Tag => {
                    let name = part_text(&part)
                        .filter(|t| TAG_NAME_RE.is_match(t))
                        .unwrap_or_else(|| {
                            tracing::warn!(
                                target: "weft_view::template",
                                kind = part.kind(),
                                "invalid interpolated tag name; using the default tag"
                            );
                            root.config().default_tag.clone()
                        });
                    push(&mut markup, &mut scan, &name);
                }
                Position::Attr { quoted } => {
                    let marker = if quoted {
                        format!("#{i}")
                    } else {
                        format!("\"#{i}\"")
                    };
                    push(&mut markup, &mut scan, &marker);
                    self.attr_parts.insert(i, part);
                }
                Position::AttrText | Position::Comment => {
                    let text = part_text(&part).unwrap_or_default();
                    let escaped = v_htmlescape::escape(&text).to_string();
                    push(&mut markup, &mut scan, &escaped);
                }
                Position::Child => {
                    push(&mut markup, &mut scan, &format!("<!--o:{i}-->"));
                    self.child_parts.insert(i, part);
                }
                Position::Bare => {
                    tracing::warn!(
                        target: "weft_view::template",
                        index = i,
                        "interpolation inside a tag must follow `name=`; skipping"
                    );
                }
            }
        }
        for literal in strings.iter().skip(count) {
            push(&mut markup, &mut scan, literal);
        }
        markup
    }

    /// Copy the parsed markup into a fresh fragment.
    fn parse(&mut self, markup: &str) -> NodeId {
        let root = self.root;
        let doc = root.document();
        let fragment = doc.create_fragment();
        let html = Html::parse_fragment(markup);
        let top = html.root_element();

        let mut stack: Vec<_> = top.children().rev().map(|n| (n, fragment)).collect();
        while let Some((source, parent)) = stack.pop() {
            let node = match source.value() {
                scraper::Node::Text(text) => {
                    let content: &str = text;
                    doc.create_text(content)
                }
                scraper::Node::Comment(comment) => {
                    let content: &str = comment;
                    let node = doc.create_comment(content);
                    if let Some(caps) = CHILD_MARKER_RE.captures(content) {
                        if let Ok(index) = caps[1].parse::<usize>() {
                            self.markers.push((node, index));
                        }
                    }
                    node
                }
                scraper::Node::Element(element) => {
                    let node = doc.create_element(element.name());
                    let attrs: Vec<(String, String)> = element
                        .attrs()
                        .map(|(n, v)| (n.to_owned(), v.to_owned()))
                        .collect();
                    self.plan_element(node, attrs);
                    stack.extend(source.children().rev().map(|n| (n, node)));
                    node
                }
                _ => continue,
            };
            doc.append_child(parent, node);
        }
        fragment
    }

    fn take_attr_part(&mut self, raw: &str) -> Option<Part> {
        let caps = ATTR_MARKER_RE.captures(raw)?;
        let index = caps[1].parse::<usize>().ok()?;
        self.attr_parts.remove(&index)
    }

    fn plan_element(&mut self, node: NodeId, attrs: Vec<(String, String)>) {
        let root = self.root;
        let doc = root.document();
        let mut pending = PendingElement {
            node,
            params: Params::new(),
            attrs: BTreeMap::new(),
            props: BTreeMap::new(),
            iterate: None,
            iterate_flag: false,
            projection: None,
        };

        for (name, raw) in attrs {
            let part = self.take_attr_part(&raw);
            let event = name
                .strip_prefix('@')
                .or_else(|| name.strip_prefix("on:"))
                .map(str::to_owned);
            if let Some(event) = event {
                match part {
                    Some(Part::Handlers(handlers)) => pending.params.on.push((event, handlers)),
                    other => warn_attr(&name, other.as_ref(), "expects handlers"),
                }
                continue;
            }
            if let Some(prop) = name.strip_prefix("prop:") {
                let value = match part {
                    Some(Part::Value(v)) => v,
                    None => Value::Text(raw),
                    Some(other) => {
                        warn_attr(&name, Some(&other), "expects a value");
                        continue;
                    }
                };
                pending.props.insert(prop.to_owned(), value);
                continue;
            }
            match (name.as_str(), part) {
                ("style", Some(Part::Value(Value::Record(record)))) => {
                    pending.params.style = Some(Bag::Live(record));
                }
                ("style", Some(Part::Value(Value::Text(text)))) => {
                    pending.params.style = Some(Bag::Plain(parse_style_text(&text)));
                }
                ("style", None) => {
                    pending.params.style = Some(Bag::Plain(parse_style_text(&raw)));
                }
                ("class", Some(Part::Value(Value::Record(record)))) => {
                    pending.params.class_list = Some(Bag::Live(record));
                }
                ("dataset" | "properties" | "aria", Some(Part::Value(Value::Record(record)))) => {
                    let bag = Some(Bag::Live(record));
                    match name.as_str() {
                        "dataset" => pending.params.dataset = bag,
                        "properties" => pending.params.props = bag,
                        _ => pending.params.aria = bag,
                    }
                }
                ("iterate", part) => {
                    pending.iterate_flag = true;
                    pending.iterate = match part {
                        Some(Part::Value(Value::List(list))) => Some(Iterate::List(list)),
                        Some(Part::Child(Child::Mapped(mapped))) => Some(Iterate::Mapped(mapped)),
                        other => {
                            warn_attr(&name, other.as_ref(), "expects a list");
                            None
                        }
                    };
                }
                ("dataset" | "properties" | "aria", other) => {
                    warn_attr(&name, other.as_ref(), "expects a record");
                }
                (_, None) => doc.set_attribute(node, &name, &raw),
                (_, Some(Part::Value(value))) => {
                    pending.attrs.insert(name.clone(), value);
                }
                (_, Some(other)) => warn_attr(&name, Some(&other), "expects a value"),
            }
        }
        self.elements.push(pending);
    }

    fn resolve_markers(&mut self) {
        let root = self.root;
        let doc = root.document();
        let markers = std::mem::take(&mut self.markers);
        for (marker, index) in markers {
            let Some(part) = self.child_parts.remove(&index) else {
                continue;
            };
            let Some(parent) = doc.parent(marker) else {
                continue;
            };
            let replacement = match part {
                Part::Func(f) => {
                    if let Some(pending) = self
                        .elements
                        .iter_mut()
                        .find(|e| e.node == parent && e.iterate_flag)
                    {
                        pending.projection = Some(f);
                        None
                    } else {
                        Some(f(&Value::Null))
                    }
                }
                Part::Value(Value::Null | Value::Bool(false)) => None,
                Part::Value(Value::List(list)) => Some(Child::Mapped(Mapped::identity(list))),
                Part::Value(value) => Some(Child::from_value(&value)),
                Part::Child(child) => Some(child),
                Part::Handlers(_) => {
                    tracing::warn!(
                        target: "weft_view::template",
                        index,
                        "handlers in child position; skipping"
                    );
                    None
                }
            };
            match replacement {
                Some(child) => {
                    let node = root.resolve(&child);
                    doc.replace_child(parent, node, marker);
                }
                None => {
                    doc.remove_child(parent, marker);
                }
            }
        }
    }

    fn realize_elements(&mut self) {
        let root = self.root;
        let doc = root.document();
        for pending in &mut self.elements {
            if !pending.attrs.is_empty() {
                pending.params.attrs = Some(Bag::Plain(std::mem::take(&mut pending.attrs)));
            }
            if !pending.props.is_empty() {
                let props = std::mem::take(&mut pending.props);
                match &mut pending.params.props {
                    Some(Bag::Live(record)) => {
                        for (key, value) in props {
                            record.set(key, value);
                        }
                    }
                    _ => pending.params.props = Some(Bag::Plain(props)),
                }
            }
            let children = match pending.iterate.take() {
                Some(Iterate::List(list)) => {
                    let mapped = match pending.projection.take() {
                        Some(f) => Mapped::with_projection(list, f),
                        None => Mapped::identity(list),
                    };
                    vec![Child::Mapped(mapped)]
                }
                Some(Iterate::Mapped(mapped)) => vec![Child::Mapped(mapped)],
                None => doc
                    .child_nodes(pending.node)
                    .into_iter()
                    .map(Child::Node)
                    .collect(),
            };
            let el = El::new(pending.node)
                .params(std::mem::take(&mut pending.params))
                .children(Children::Live(children.into_iter().collect()));
            root.realize(&el);
            root.retain(pending.node, el);
        }
    }
}

fn warn_attr(name: &str, part: Option<&Part>, problem: &str) {
    tracing::warn!(
        target: "weft_view::template",
        attribute = name,
        kind = part.map_or("literal", Part::kind),
        problem,
        "unusable template attribute; skipping"
    );
}

/// `color: red; width: 2px` as a style bag.
fn parse_style_text(text: &str) -> BTreeMap<String, Value> {
    text.split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(k, v)| (k.trim().to_owned(), Value::text(v.trim())))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// Compile a template against a [`RenderRoot`].
///
/// Literal segments and `{expr}` interpolations must alternate, starting
/// and ending with a literal. Each expression is converted with
/// [`Part::from`].
///
/// ```ignore
/// let node = html!(root; "<li class=" {cls} ">" {label} "</li>");
/// ```
#[macro_export]
macro_rules! html {
    ($root:expr; $first:literal $({ $val:expr } $lit:literal)*) => {
        $crate::compile(
            &$root,
            &[$first $(, $lit)*],
            ::std::vec![$($crate::Part::from($val)),*],
        )
    };
}
