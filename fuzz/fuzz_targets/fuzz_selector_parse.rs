#![no_main]

use libfuzzer_sys::fuzz_target;
use modalkit_core::document::selector::SelectorList;
use modalkit_core::{Document, Size};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(selector) = SelectorList::parse(input) else {
        return;
    };
    assert!(!selector.is_empty());

    let doc = Document::new(Size::new(10, 10));
    let el = doc.create_element("button");
    doc.set_attribute(el, "tabindex", "0");
    doc.add_class(el, "primary");
    doc.append_child(doc.body(), el);
    let matched = doc.query_all(doc.body(), &selector);
    assert_eq!(matched.contains(&el), doc.matches(el, &selector));
});
