#![forbid(unsafe_code)]

//! The dynamic value carried by parameter bags and data lists.
//!
//! Building a [`Value`] from a plain `Vec` or map wraps it in an observable
//! container, so deep mutation of nested data notifies like top-level
//! mutation does.

use std::collections::{BTreeMap, HashMap};

use crate::list::ObservableList;
use crate::observable::Observable;
use crate::record::ObservableRecord;

/// Maximum number of cell indirections followed by [`Value::resolved`].
const MAX_CELL_DEPTH: usize = 32;

/// A dynamically typed value.
///
/// Equality compares primitives by value and containers/cells by identity.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(ObservableList<Value>),
    Record(ObservableRecord<Value>),
    /// A boxed reference; consumers bind to it rather than read it once.
    Cell(Observable<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a.ptr_eq(b),
            (Self::Record(a), Self::Record(b)) => a.ptr_eq(b),
            (Self::Cell(a), Self::Cell(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Identity of a [`Value`]: primitives by value, containers by pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Bool(bool),
    /// IEEE bits, with `-0.0` folded into `0.0`.
    Number(u64),
    Text(String),
    Ptr(usize),
}

impl ValueKey {
    /// Whether the key names a container or cell rather than a primitive.
    #[must_use]
    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Ptr(_))
    }
}

impl Value {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Wrap `value` in a fresh cell.
    #[must_use]
    pub fn cell(value: impl Into<Value>) -> Self {
        Self::Cell(Observable::new(value.into()))
    }

    #[must_use]
    pub fn key(&self) -> ValueKey {
        match self {
            Self::Null => ValueKey::Null,
            Self::Bool(b) => ValueKey::Bool(*b),
            Self::Number(n) => {
                let n = if *n == 0.0 { 0.0 } else { *n };
                ValueKey::Number(n.to_bits())
            }
            Self::Text(s) => ValueKey::Text(s.clone()),
            Self::List(l) => ValueKey::Ptr(l.identity()),
            Self::Record(r) => ValueKey::Ptr(r.identity()),
            Self::Cell(c) => ValueKey::Ptr(c.identity()),
        }
    }

    /// Short name of the variant, for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Record(_) => "record",
            Self::Cell(_) => "cell",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `Null` or `false`: the values that remove an attribute.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Null | Self::Bool(false))
    }

    /// Follow cell indirections to the value they currently hold.
    #[must_use]
    pub fn resolved(&self) -> Value {
        let mut current = self.clone();
        for _ in 0..MAX_CELL_DEPTH {
            match current {
                Self::Cell(cell) => current = cell.get(),
                other => return other,
            }
        }
        tracing::warn!(
            target: "weft_reactive::value",
            depth = MAX_CELL_DEPTH,
            "cell chain too deep or cyclic; treating as null"
        );
        Self::Null
    }

    /// String form of a primitive. Containers and cells have none.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => Some(String::from("null")),
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(format_number(*n)),
            Self::Text(s) => Some(s.clone()),
            Self::List(_) | Self::Record(_) | Self::Cell(_) => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&ObservableList<Value>> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&ObservableRecord<Value>> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Append to a list value. Returns `false` (and does nothing) for any
    /// other variant.
    pub fn push(&self, item: impl Into<Value>) -> bool {
        match self {
            Self::List(list) => {
                list.push(item.into());
                true
            }
            _ => false,
        }
    }

    /// Store into a record value. Returns `false` for any other variant.
    pub fn insert(&self, key: impl Into<String>, item: impl Into<Value>) -> bool {
        match self {
            Self::Record(record) => {
                record.set(key, item.into());
                true
            }
            _ => false,
        }
    }
}

/// Render a number the way markup attributes expect: integers without a
/// fractional part, `NaN`/`Infinity` spelled out.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return String::from("NaN");
    }
    if n.is_infinite() {
        return String::from(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if n == 0.0 {
        return String::from("0");
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{n:.0}");
    }
    format!("{n}")
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.resolved() {
            Self::List(list) => write!(f, "[list; {}]", list.len()),
            Self::Record(record) => write!(f, "{{record; {}}}", record.len()),
            other => f.write_str(&other.as_text().unwrap_or_default()),
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────────

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(n: $ty) -> Self {
                Self::Number(n as f64)
            }
        })*
    };
}

number_from!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, T: Into<Value>> From<BTreeMap<K, T>> for Value {
    fn from(map: BTreeMap<K, T>) -> Self {
        Self::Record(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<K: Into<String>, T: Into<Value>, S> From<HashMap<K, T, S>> for Value {
    fn from(map: HashMap<K, T, S>) -> Self {
        Self::Record(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<ObservableList<Value>> for Value {
    fn from(list: ObservableList<Value>) -> Self {
        Self::List(list)
    }
}

impl From<ObservableRecord<Value>> for Value {
    fn from(record: ObservableRecord<Value>) -> Self {
        Self::Record(record)
    }
}

impl From<Observable<Value>> for Value {
    fn from(cell: Observable<Value>) -> Self {
        Self::Cell(cell)
    }
}
