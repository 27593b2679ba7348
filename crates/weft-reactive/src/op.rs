#![forbid(unsafe_code)]

//! Typed mutation notifications emitted by observable containers.

/// The closed set of notification tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpTag {
    Push,
    Pop,
    Splice,
    Set,
    Delete,
    Get,
}

impl OpTag {
    /// Lower-case tag name, as used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pop => "pop",
            Self::Splice => "splice",
            Self::Set => "set",
            Self::Delete => "delete",
            Self::Get => "get",
        }
    }
}

impl std::fmt::Display for OpTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sequence-container mutation, carrying the operation's raw arguments.
///
/// The container has already been mutated when a `ListOp` is delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum ListOp<T> {
    /// An element was appended.
    Push(T),
    /// The last element was removed.
    Pop(T),
    /// `removed` was taken out at `index` and `inserted` put in its place.
    Splice {
        index: usize,
        removed: Vec<T>,
        inserted: Vec<T>,
    },
    /// The element at `index` was replaced (or appended, when `index`
    /// equalled the old length).
    Set { index: usize, value: T },
    /// The element at `index` was removed.
    Delete { index: usize, value: T },
    /// A tracked read of `index`.
    Get { index: usize },
}

impl<T> ListOp<T> {
    #[must_use]
    pub fn tag(&self) -> OpTag {
        match self {
            Self::Push(_) => OpTag::Push,
            Self::Pop(_) => OpTag::Pop,
            Self::Splice { .. } => OpTag::Splice,
            Self::Set { .. } => OpTag::Set,
            Self::Delete { .. } => OpTag::Delete,
            Self::Get { .. } => OpTag::Get,
        }
    }

    /// Whether this op changed the container.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Get { .. })
    }
}

/// A keyed-container mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOp<V> {
    Set { key: String, value: V },
    /// `key` was removed; `value` is what it held.
    Delete { key: String, value: V },
    Get { key: String },
}

impl<V> RecordOp<V> {
    #[must_use]
    pub fn tag(&self) -> OpTag {
        match self {
            Self::Set { .. } => OpTag::Set,
            Self::Delete { .. } => OpTag::Delete,
            Self::Get { .. } => OpTag::Get,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Delete { key, .. } | Self::Get { key } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_variants() {
        assert_eq!(ListOp::Push(1).tag(), OpTag::Push);
        assert_eq!(ListOp::<u8>::Get { index: 0 }.tag(), OpTag::Get);
        assert!(!ListOp::<u8>::Get { index: 0 }.is_mutation());
        assert_eq!(
            RecordOp::Delete {
                key: "k".into(),
                value: 1
            }
            .tag(),
            OpTag::Delete
        );
        assert_eq!(OpTag::Splice.to_string(), "splice");
    }
}
