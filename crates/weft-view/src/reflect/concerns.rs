#![forbid(unsafe_code)]

//! The per-concern mappings from [`Value`] to node state.

use weft_dom::{Document, NodeId, PropValue, aria_attribute_name, data_attribute_name};
use weft_reactive::Value;

use super::{Coerced, Concern};

/// Attribute-like coercion: `Null`/`false` remove, primitives stringify.
fn attribute_text(value: &Value) -> Coerced<String> {
    match value {
        Value::Null | Value::Bool(false) => Coerced::Remove,
        Value::Bool(true) | Value::Number(_) | Value::Text(_) => {
            value.as_text().map_or(Coerced::Invalid, Coerced::Write)
        }
        Value::List(_) | Value::Record(_) | Value::Cell(_) => Coerced::Invalid,
    }
}

pub(crate) struct Attr;

impl Concern for Attr {
    type Out = String;
    const NAME: &'static str = "attribute";

    fn coerce(value: &Value) -> Coerced<String> {
        attribute_text(value)
    }

    fn read(doc: &Document, node: NodeId, name: &str) -> Option<String> {
        doc.attribute(node, name)
    }

    fn write(doc: &Document, node: NodeId, name: &str, value: &String) {
        doc.set_attribute(node, name, value);
    }

    fn remove(doc: &Document, node: NodeId, name: &str) {
        doc.remove_attribute(node, name);
    }
}

pub(crate) struct Style;

impl Concern for Style {
    type Out = String;
    const NAME: &'static str = "style";

    fn coerce(value: &Value) -> Coerced<String> {
        attribute_text(value)
    }

    fn read(doc: &Document, node: NodeId, name: &str) -> Option<String> {
        doc.style(node, name)
    }

    fn write(doc: &Document, node: NodeId, name: &str, value: &String) {
        doc.set_style(node, name, value);
    }

    fn remove(doc: &Document, node: NodeId, name: &str) {
        doc.remove_style(node, name);
    }
}

/// Keys are class names; truthy values add, falsy values remove.
pub(crate) struct Class;

impl Concern for Class {
    type Out = bool;
    const NAME: &'static str = "class";

    fn coerce(value: &Value) -> Coerced<bool> {
        let on = match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::List(_) | Value::Record(_) | Value::Cell(_) => return Coerced::Invalid,
        };
        if on {
            Coerced::Write(true)
        } else {
            Coerced::Remove
        }
    }

    fn read(doc: &Document, node: NodeId, name: &str) -> Option<bool> {
        doc.has_class(node, name).then_some(true)
    }

    fn write(doc: &Document, node: NodeId, name: &str, _value: &bool) {
        doc.add_class(node, name);
    }

    fn remove(doc: &Document, node: NodeId, name: &str) {
        doc.remove_class(node, name);
    }
}

pub(crate) struct Dataset;

impl Concern for Dataset {
    type Out = String;
    const NAME: &'static str = "dataset";

    fn key_name(key: &str) -> String {
        data_attribute_name(key)
    }

    fn coerce(value: &Value) -> Coerced<String> {
        attribute_text(value)
    }

    fn read(doc: &Document, node: NodeId, name: &str) -> Option<String> {
        doc.attribute(node, name)
    }

    fn write(doc: &Document, node: NodeId, name: &str, value: &String) {
        doc.set_attribute(node, name, value);
    }

    fn remove(doc: &Document, node: NodeId, name: &str) {
        doc.remove_attribute(node, name);
    }
}

/// Like attributes, but booleans are spelled out instead of removing.
pub(crate) struct Aria;

impl Concern for Aria {
    type Out = String;
    const NAME: &'static str = "aria";

    fn key_name(key: &str) -> String {
        aria_attribute_name(key)
    }

    fn coerce(value: &Value) -> Coerced<String> {
        match value {
            Value::Bool(b) => Coerced::Write(b.to_string()),
            other => attribute_text(other),
        }
    }

    fn read(doc: &Document, node: NodeId, name: &str) -> Option<String> {
        doc.attribute(node, name)
    }

    fn write(doc: &Document, node: NodeId, name: &str, value: &String) {
        doc.set_attribute(node, name, value);
    }

    fn remove(doc: &Document, node: NodeId, name: &str) {
        doc.remove_attribute(node, name);
    }
}

/// Typed properties; `false` is kept, only `Null` removes.
pub(crate) struct Prop;

impl Concern for Prop {
    type Out = PropValue;
    const NAME: &'static str = "property";

    fn coerce(value: &Value) -> Coerced<PropValue> {
        match value {
            Value::Null => Coerced::Remove,
            Value::Bool(b) => Coerced::Write(PropValue::Bool(*b)),
            Value::Number(n) => Coerced::Write(PropValue::Number(*n)),
            Value::Text(s) => Coerced::Write(PropValue::Text(s.clone())),
            Value::List(_) | Value::Record(_) | Value::Cell(_) => Coerced::Invalid,
        }
    }

    fn read(doc: &Document, node: NodeId, name: &str) -> Option<PropValue> {
        doc.property(node, name)
    }

    fn write(doc: &Document, node: NodeId, name: &str, value: &PropValue) {
        doc.set_property(node, name, value.clone());
    }

    fn remove(doc: &Document, node: NodeId, name: &str) {
        doc.remove_property(node, name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_coercion() {
        assert_eq!(Attr::coerce(&Value::from(1)), Coerced::Write("1".into()));
        assert_eq!(Attr::coerce(&Value::Bool(true)), Coerced::Write("true".into()));
        assert_eq!(Attr::coerce(&Value::Bool(false)), Coerced::Remove);
        assert_eq!(Attr::coerce(&Value::Null), Coerced::Remove);
        assert_eq!(Attr::coerce(&Value::from(vec![1])), Coerced::Invalid);
    }

    #[test]
    fn aria_spells_booleans() {
        assert_eq!(Aria::coerce(&Value::Bool(false)), Coerced::Write("false".into()));
        assert_eq!(Aria::key_name("expanded"), "aria-expanded");
    }

    #[test]
    fn props_keep_false() {
        assert_eq!(
            Prop::coerce(&Value::Bool(false)),
            Coerced::Write(PropValue::Bool(false))
        );
        assert_eq!(Prop::coerce(&Value::Null), Coerced::Remove);
    }

    #[test]
    fn class_truthiness() {
        assert_eq!(Class::coerce(&Value::from(0)), Coerced::Remove);
        assert_eq!(Class::coerce(&Value::text("y")), Coerced::Write(true));
    }

    #[test]
    fn dataset_keys_map_to_data_attributes() {
        assert_eq!(Dataset::key_name("userId"), "data-user-id");
    }
}
