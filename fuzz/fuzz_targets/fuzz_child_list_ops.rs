#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use weft_reactive::ObservableList;
use weft_view::{Child, El, RenderRoot};

const POOL: usize = 8;

#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Push(u8),
    Pop,
    Splice { index: u8, remove: u8, insert: Vec<u8> },
    Set { index: u8, value: u8 },
    Delete(u8),
    Flush,
}

fuzz_target!(|ops: Vec<FuzzOp>| {
    let root = RenderRoot::new();
    let doc = root.document();
    let pool: Vec<_> = (0..POOL).map(|i| doc.create_text(&i.to_string())).collect();
    let node = |b: u8| Child::Node(pool[usize::from(b) % POOL]);

    let list: ObservableList<Child> = ObservableList::default();
    let parent = root.realize(&El::new("div").children(list.clone()));
    let mut model: Vec<usize> = Vec::new();

    for op in &ops {
        match op {
            FuzzOp::Push(b) => {
                list.push(node(*b));
                model.push(usize::from(*b) % POOL);
            }
            FuzzOp::Pop => {
                list.pop();
                model.pop();
            }
            FuzzOp::Splice { index, remove, insert } => {
                let (index, remove) = (usize::from(*index), usize::from(*remove));
                list.splice(index, remove, insert.iter().map(|b| node(*b)).collect());
                let start = index.min(model.len());
                let end = start + remove.min(model.len() - start);
                model.splice(start..end, insert.iter().map(|b| usize::from(*b) % POOL));
            }
            FuzzOp::Set { index, value } => {
                let index = usize::from(*index);
                list.set(index, node(*value));
                if index < model.len() {
                    model[index] = usize::from(*value) % POOL;
                } else {
                    model.push(usize::from(*value) % POOL);
                }
            }
            FuzzOp::Delete(index) => {
                let index = usize::from(*index);
                list.delete(index);
                if index < model.len() {
                    model.remove(index);
                }
            }
            FuzzOp::Flush => {
                root.flush();
            }
        }
    }
    root.flush();

    let mut seen = HashSet::new();
    let expected: Vec<_> = model
        .into_iter()
        .filter(|i| seen.insert(*i))
        .map(|i| pool[i])
        .collect();
    assert_eq!(doc.child_nodes(parent), expected);
});
