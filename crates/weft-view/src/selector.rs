#![forbid(unsafe_code)]

//! Selector shorthand: `tag#id.class.class[attr=value]`.
//!
//! Parsing is a sequence of anchored regex matches over the remaining
//! input. It never fails: the first piece that does not match ends the
//! parse, what was accumulated so far is kept, and the unparsed remainder
//! is reported in [`SelectorSpec::rest`].

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]*").expect("tag regex is valid"));
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([A-Za-z0-9_-]+)").expect("id regex is valid"));
static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.([A-Za-z0-9_-]+)").expect("class regex is valid"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\[\s*([^\s=\]"']+)\s*(?:=\s*(?:"([^"]*)"|'([^']*)'|([^\]"']*?)))?\s*\]"#)
        .expect("attribute regex is valid")
});

/// The pieces of a parsed shorthand.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorSpec {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// `[name=value]` pairs in order; a bare `[name]` has an empty value.
    pub attrs: Vec<(String, String)>,
    /// Input left over after the first failed match.
    pub rest: String,
}

impl SelectorSpec {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rest.is_empty()
    }
}

/// Parse `input`, using `default_tag` when it names no tag.
#[must_use]
pub fn parse_selector(input: &str, default_tag: &str) -> SelectorSpec {
    let mut rest = input.trim();
    let mut spec = SelectorSpec::default();

    match TAG_RE.find(rest) {
        Some(m) => {
            spec.tag = m.as_str().to_ascii_lowercase();
            rest = &rest[m.end()..];
        }
        None => spec.tag = default_tag.to_owned(),
    }

    loop {
        if rest.is_empty() {
            break;
        }
        if let Some(caps) = ID_RE.captures(rest) {
            spec.id = Some(caps[1].to_owned());
            rest = &rest[caps[0].len()..];
        } else if let Some(caps) = CLASS_RE.captures(rest) {
            spec.classes.push(caps[1].to_owned());
            rest = &rest[caps[0].len()..];
        } else if let Some(caps) = ATTR_RE.captures(rest) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str().trim());
            spec.attrs.push((caps[1].to_owned(), value.to_owned()));
            rest = &rest[caps[0].len()..];
        } else {
            break;
        }
    }

    if !rest.is_empty() {
        tracing::debug!(
            target: "weft_view::selector",
            input,
            rest,
            "selector shorthand only partially parsed"
        );
    }
    spec.rest = rest.to_owned();
    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_shorthand() {
        let spec = parse_selector("div#id.cls[data-x=1]", "div");
        assert_eq!(spec.tag, "div");
        assert_eq!(spec.id.as_deref(), Some("id"));
        assert_eq!(spec.classes, vec!["cls".to_owned()]);
        assert_eq!(spec.attrs, vec![("data-x".to_owned(), "1".to_owned())]);
        assert!(spec.is_complete());
    }

    #[test]
    fn missing_tag_uses_default() {
        let spec = parse_selector(".a.b", "section");
        assert_eq!(spec.tag, "section");
        assert_eq!(spec.classes, vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn quoted_and_bare_attributes() {
        let spec = parse_selector(r#"input[type="text"][name='q'][disabled]"#, "div");
        assert_eq!(
            spec.attrs,
            vec![
                ("type".to_owned(), "text".to_owned()),
                ("name".to_owned(), "q".to_owned()),
                ("disabled".to_owned(), String::new()),
            ]
        );
    }

    #[test]
    fn stops_at_first_failure_and_keeps_prefix() {
        let spec = parse_selector("span.ok!bad.ignored", "div");
        assert_eq!(spec.tag, "span");
        assert_eq!(spec.classes, vec!["ok".to_owned()]);
        assert_eq!(spec.rest, "!bad.ignored");
    }

    #[test]
    fn empty_input() {
        let spec = parse_selector("", "div");
        assert_eq!(spec.tag, "div");
        assert!(spec.is_complete());
    }

    #[test]
    fn later_id_wins() {
        let spec = parse_selector("#a#b", "div");
        assert_eq!(spec.id.as_deref(), Some("b"));
    }
}
