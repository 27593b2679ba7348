#![no_main]

use libfuzzer_sys::fuzz_target;
use weft_view::{El, RenderRoot, parse_selector};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let root = RenderRoot::new();
    let spec = parse_selector(&text, &root.config().default_tag);
    let node = root.realize(&El::new(&*text));
    assert_eq!(root.document().tag_name(node), Some(spec.tag.to_ascii_lowercase()));
});
