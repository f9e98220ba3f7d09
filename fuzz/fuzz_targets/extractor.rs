#![no_main]

use libfuzzer_sys::fuzz_target;

use macpicker::entities::RawFeedItem;
use macpicker::extractor::{assemble, normalize_text};
use macpicker::feed::parse_feed;

fuzz_target!(|data: &[u8]| {
    // Convert raw bytes to string, handling invalid UTF-8 gracefully
    let text = String::from_utf8_lossy(data).to_string();

    // Neither the envelope parser nor the assembler may panic on any input
    let _ = parse_feed(&text);

    let item = RawFeedItem {
        title: text.clone(),
        content_html: text,
        link: Some("https://example.com/product".to_string()),
        guid: None,
    };
    if let Some(record) = assemble(&item) {
        assert!(record.price_num > 0.0);
        assert_eq!(normalize_text(&record.display_title), record.display_title);
    }
});
