//! Property-based invariant tests for the node tree.
//!
//! 1. Parent and child links always agree.
//! 2. No node is its own ancestor.
//! 3. A structural call journals at most one edit, and none when refused.

use proptest::prelude::*;
use weft_dom::{Document, NodeId};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum TreeOp {
    Append(usize, usize),
    Insert(usize, usize, usize),
    Replace(usize, usize, usize),
    Remove(usize),
}

fn op_strategy() -> impl Strategy<Value = TreeOp> {
    prop_oneof![
        (0usize..8, 0usize..8).prop_map(|(p, c)| TreeOp::Append(p, c)),
        (0usize..8, 0usize..8, 0usize..8).prop_map(|(p, c, b)| TreeOp::Insert(p, c, b)),
        (0usize..8, 0usize..8, 0usize..8).prop_map(|(p, n, o)| TreeOp::Replace(p, n, o)),
        (0usize..8).prop_map(TreeOp::Remove),
    ]
}

fn links_agree(doc: &Document, nodes: &[NodeId]) -> bool {
    nodes.iter().all(|n| {
        let children_ok = doc
            .child_nodes(*n)
            .iter()
            .all(|c| doc.parent(*c) == Some(*n));
        let parent_ok = doc
            .parent(*n)
            .is_none_or(|p| doc.child_nodes(p).iter().filter(|c| **c == *n).count() == 1);
        children_ok && parent_ok
    })
}

proptest! {
    #[test]
    fn tree_stays_consistent(ops in proptest::collection::vec(op_strategy(), 0..50)) {
        let doc = Document::new();
        let nodes: Vec<NodeId> = (0..8)
            .map(|i| if i % 3 == 2 { doc.create_fragment() } else { doc.create_element("div") })
            .collect();
        for op in &ops {
            let ok = match *op {
                TreeOp::Append(p, c) => doc.append_child(nodes[p], nodes[c]),
                TreeOp::Insert(p, c, b) => doc.insert_before(nodes[p], nodes[c], Some(nodes[b])),
                TreeOp::Replace(p, n, o) => doc.replace_child(nodes[p], nodes[n], nodes[o]),
                TreeOp::Remove(n) => doc.remove(nodes[n]),
            };
            let journaled = doc.take_edits().len();
            prop_assert!(journaled <= 1);
            if !ok {
                prop_assert_eq!(journaled, 0);
            }
            prop_assert!(links_agree(&doc, &nodes));
            for n in &nodes {
                let mut seen = 0;
                let mut current = doc.parent(*n);
                while let Some(p) = current {
                    prop_assert_ne!(p, *n);
                    seen += 1;
                    prop_assert!(seen <= nodes.len());
                    current = doc.parent(p);
                }
            }
        }
    }
}
