#![forbid(unsafe_code)]

//! The edit journal.
//!
//! Every write that reaches a [`Document`](crate::Document) is recorded,
//! including writes that leave the value unchanged. Callers that want to
//! verify minimal edits compare journal lengths before and after an
//! operation.

use crate::node::{NodeId, PropValue};

#[derive(Debug, Clone, PartialEq)]
pub enum DomEdit {
    Append {
        parent: NodeId,
        child: NodeId,
    },
    Insert {
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    },
    Remove {
        parent: NodeId,
        child: NodeId,
    },
    Replace {
        parent: NodeId,
        old: NodeId,
        new: NodeId,
    },
    SetAttribute {
        node: NodeId,
        name: String,
        value: String,
    },
    RemoveAttribute {
        node: NodeId,
        name: String,
    },
    SetText {
        node: NodeId,
        text: String,
    },
    SetStyle {
        node: NodeId,
        name: String,
        value: String,
    },
    RemoveStyle {
        node: NodeId,
        name: String,
    },
    SetProperty {
        node: NodeId,
        name: String,
        value: PropValue,
    },
    RemoveProperty {
        node: NodeId,
        name: String,
    },
    AddClass {
        node: NodeId,
        name: String,
    },
    RemoveClass {
        node: NodeId,
        name: String,
    },
}

impl DomEdit {
    /// Whether this edit changed the shape of the tree.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Append { .. } | Self::Insert { .. } | Self::Remove { .. } | Self::Replace { .. }
        )
    }

    /// The node whose own data (or child list) was written.
    #[must_use]
    pub fn subject(&self) -> NodeId {
        match self {
            Self::Append { parent, .. }
            | Self::Insert { parent, .. }
            | Self::Remove { parent, .. }
            | Self::Replace { parent, .. } => *parent,
            Self::SetAttribute { node, .. }
            | Self::RemoveAttribute { node, .. }
            | Self::SetText { node, .. }
            | Self::SetStyle { node, .. }
            | Self::RemoveStyle { node, .. }
            | Self::SetProperty { node, .. }
            | Self::RemoveProperty { node, .. }
            | Self::AddClass { node, .. }
            | Self::RemoveClass { node, .. } => *node,
        }
    }
}
