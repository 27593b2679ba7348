#![forbid(unsafe_code)]

//! Everything that can appear in a child list.

use std::rc::Rc;

use weft_dom::NodeId;
use weft_reactive::{Observable, ObservableList, Value};

use crate::descriptor::El;
use crate::mapped::Mapped;
use crate::switched::Switched;

/// One entry of a child list. Each entry resolves to exactly one node
/// (see [`RenderRoot::resolve`](crate::RenderRoot::resolve)).
#[derive(Clone, Default)]
pub enum Child {
    /// Resolves to an empty fragment.
    #[default]
    Empty,
    Text(String),
    Node(NodeId),
    El(El),
    Mapped(Mapped),
    Switched(Switched),
    /// A plain sequence, written once into a fragment.
    Items(Vec<Child>),
    /// A nested live list, reconciled into a fragment.
    Live(ObservableList<Child>),
    /// A text node kept equal to the cell's value.
    Cell(Observable<Value>),
    /// Produced on resolution.
    Lazy(Rc<dyn Fn() -> Child>),
}

impl Child {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    #[must_use]
    pub fn lazy(f: impl Fn() -> Child + 'static) -> Self {
        Self::Lazy(Rc::new(f))
    }

    /// Map a dynamic value into child position: `Null`/`false` become
    /// [`Child::Empty`], lists are projected one-to-one, cells stay live,
    /// and other primitives become text. Records have no child form.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null | Value::Bool(false) => Self::Empty,
            Value::List(list) => Self::Mapped(Mapped::identity(list.clone())),
            Value::Cell(cell) => Self::Cell(cell.clone()),
            Value::Record(_) => {
                tracing::warn!(
                    target: "weft_view::child",
                    "a record cannot be placed in a child list; skipping"
                );
                Self::Empty
            }
            Value::Bool(true) | Value::Number(_) | Value::Text(_) => {
                Self::Text(value.as_text().unwrap_or_default())
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Text(_) => "text",
            Self::Node(_) => "node",
            Self::El(_) => "el",
            Self::Mapped(_) => "mapped",
            Self::Switched(_) => "switched",
            Self::Items(_) => "items",
            Self::Live(_) => "live",
            Self::Cell(_) => "cell",
            Self::Lazy(_) => "lazy",
        }
    }
}

impl std::fmt::Debug for Child {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Self::El(el) => f.debug_tuple("El").field(el).finish(),
            Self::Items(items) => f.debug_tuple("Items").field(items).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

macro_rules! child_from_number {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Child {
            fn from(n: $ty) -> Self {
                Self::Text(weft_reactive::format_number(n as f64))
            }
        })*
    };
}

child_from_number!(i32, i64, u32, u64, usize, f64);

impl From<NodeId> for Child {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<El> for Child {
    fn from(el: El) -> Self {
        Self::El(el)
    }
}

impl From<Mapped> for Child {
    fn from(mapped: Mapped) -> Self {
        Self::Mapped(mapped)
    }
}

impl From<Switched> for Child {
    fn from(switched: Switched) -> Self {
        Self::Switched(switched)
    }
}

impl From<Vec<Child>> for Child {
    fn from(items: Vec<Child>) -> Self {
        Self::Items(items)
    }
}

impl From<ObservableList<Child>> for Child {
    fn from(list: ObservableList<Child>) -> Self {
        Self::Live(list)
    }
}

impl From<Observable<Value>> for Child {
    fn from(cell: Observable<Value>) -> Self {
        Self::Cell(cell)
    }
}

impl From<Value> for Child {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_map_into_child_position() {
        assert!(matches!(Child::from(Value::Null), Child::Empty));
        assert!(matches!(Child::from(Value::Bool(false)), Child::Empty));
        assert!(matches!(Child::from(Value::from(2)), Child::Text(ref s) if s == "2"));
        assert!(matches!(Child::from(Value::from(vec![1])), Child::Mapped(_)));
        assert!(matches!(Child::from(Value::cell("x")), Child::Cell(_)));
    }

    #[test]
    fn numbers_become_text() {
        assert!(matches!(Child::from(1.5), Child::Text(ref s) if s == "1.5"));
    }
}
