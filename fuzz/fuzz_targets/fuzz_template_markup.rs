#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use weft_reactive::{ObservableList, ObservableRecord, Value};
use weft_view::{Part, RenderRoot, compile};

#[derive(Arbitrary, Debug)]
enum FuzzPart {
    Null,
    Flag(bool),
    Number(i32),
    Text(String),
    List(Vec<u8>),
    Record(Vec<(String, String)>),
}

impl FuzzPart {
    fn to_part(&self) -> Part {
        match self {
            FuzzPart::Null => Part::from(()),
            FuzzPart::Flag(b) => Part::from(*b),
            FuzzPart::Number(n) => Part::from(*n),
            FuzzPart::Text(s) => Part::from(s.as_str()),
            FuzzPart::List(items) => Part::from(
                items
                    .iter()
                    .map(|b| Value::from(*b))
                    .collect::<ObservableList<Value>>(),
            ),
            FuzzPart::Record(entries) => Part::from(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                    .collect::<ObservableRecord<Value>>(),
            ),
        }
    }
}

#[derive(Arbitrary, Debug)]
struct FuzzTemplate {
    first: String,
    rest: Vec<(FuzzPart, String)>,
}

fuzz_target!(|input: FuzzTemplate| {
    let root = RenderRoot::new();
    let mut strings: Vec<&str> = vec![input.first.as_str()];
    let mut parts = Vec::with_capacity(input.rest.len());
    for (part, literal) in &input.rest {
        parts.push(part.to_part());
        strings.push(literal.as_str());
    }
    let node = compile(&root, &strings, parts);
    let _ = root.document().to_html(node);
    root.flush();
});
