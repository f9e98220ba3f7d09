use std::fs;

use crate::entities::RawFeedItem;
use crate::extractor::{Rejection, assemble, try_assemble};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

fn create_test_item(title: &str, content_html: String, guid: Option<&str>) -> RawFeedItem {
    RawFeedItem {
        title: title.to_string(),
        content_html,
        link: Some("https://www.apple.com.cn/shop/product/refurb".to_string()),
        guid: guid.map(str::to_string),
    }
}

#[test]
fn test_assemble_macbook_pro() {
    let item = create_test_item(
        "翻新 MacBook Pro Apple M3 Pro 芯片 (配备 12 核中央处理器和 18 核图形处理器) - 深空黑色",
        fixture("macbook_pro.html"),
        Some("refurb-mbp-1"),
    );

    let record = assemble(&item).expect("record should be assembled");

    assert_eq!(record.id, "refurb-mbp-1");
    assert_eq!(record.display_title, "MacBook Pro - M3 Pro");
    assert_eq!(record.price_num, 14199.0);
    assert_eq!(record.color.as_deref(), Some("深空黑色"));
    assert_eq!(record.model_id, None);
    assert_eq!(
        record.image.as_deref(),
        Some("https://store.storeimages.cdn-apple.com/refurb/mbp14-spaceblack.jpg")
    );

    let specs = &record.specs;
    assert_eq!(specs.ram, Some(18));
    assert_eq!(specs.ssd_gb, Some(1024));
    assert_eq!(specs.cpu_cores, Some(12));
    assert_eq!(specs.gpu_cores, Some(18));
    assert_eq!(specs.chip_series.as_deref(), Some("M3"));
    assert_eq!(specs.chip_model.as_deref(), Some("M3 Pro"));
    assert_eq!(specs.screen_in, Some(14.2));
    assert!(specs.has_xdr);
    assert!(!specs.has_10gbe);

    assert_eq!(record.details.len(), 6);
    assert_eq!(record.details[0], "发布于 2023 年 11 月");
    assert_eq!(record.details[3], "18GB 统一内存");
    assert!(record.details.iter().all(|d| !d.contains('¥')));
    assert!(record.details.iter().all(|d| !d.contains("Product page")));
}

#[test]
fn test_assemble_cdata_wrapped_list() {
    let item = create_test_item("Mac Studio", fixture("mac_studio.html"), None);

    let record = assemble(&item).expect("record should be assembled");

    assert_eq!(record.display_title, "Mac Studio - M2 Ultra");
    assert_eq!(record.price_num, 29999.0);
    assert_eq!(record.model_id.as_deref(), Some("FQH73CH/A"));
    assert_eq!(record.color, None);
    assert_eq!(record.image, None);
    assert_eq!(record.specs.ram, Some(64));
    assert_eq!(record.specs.ssd_gb, Some(2048));
    assert_eq!(record.specs.cpu_cores, Some(24));
    assert_eq!(record.specs.gpu_cores, Some(60));
    assert_eq!(record.specs.screen_in, None);
    assert!(record.specs.has_10gbe);
    assert_eq!(
        record.details,
        vec![
            "Apple M2 Ultra 芯片，配备 24 核中央处理器、60 核图形处理器",
            "64GB 统一内存",
            "2TB 固态硬盘",
            "10Gb 以太网",
        ]
    );

    // no guid: fallback id is a stable digest
    assert_eq!(record.id.len(), 32);
    assert_eq!(assemble(&item).unwrap().id, record.id);
}

#[test]
fn test_reject_item_without_price() {
    let item = create_test_item("Mac mini", fixture("no_price.html"), Some("mini"));
    assert_eq!(try_assemble(&item), Err(Rejection::MissingPrice));
    assert!(assemble(&item).is_none());
}

#[test]
fn test_reject_item_without_link() {
    let mut item = create_test_item("Mac mini ¥3,999.00", String::new(), Some("mini"));
    item.link = None;
    assert_eq!(try_assemble(&item), Err(Rejection::InvalidLink));

    item.link = Some("not a url".to_string());
    assert_eq!(try_assemble(&item), Err(Rejection::InvalidLink));
}

#[test]
fn test_display_title_falls_back_to_normalized_title() {
    let item = create_test_item(
        "  <b>翻新 iMac</b>&nbsp;24 英寸  ",
        "<p>¥9,499.00</p><p>8GB 统一内存</p>".to_string(),
        Some("imac"),
    );

    let record = assemble(&item).unwrap();
    assert_eq!(record.display_title, "翻新 iMac 24 英寸");
    assert_eq!(record.specs.chip_model, None);
    assert_eq!(record.specs.ssd_gb, None);
    assert_eq!(record.specs.screen_in, Some(24.0));
}

#[test]
fn test_price_precision_is_preserved() {
    let item = create_test_item(
        "MacBook Air M2",
        "<p>￥7,649.50</p>".to_string(),
        Some("air"),
    );
    assert_eq!(assemble(&item).unwrap().price_num, 7649.5);
}

#[test]
fn test_spec_example_content() {
    let item = create_test_item(
        "Mac mini",
        "16GB 统一内存 · 512GB 固态硬盘 · 10核中央处理器 · ¥4,499.00".to_string(),
        Some("spec"),
    );
    let record = assemble(&item).unwrap();
    assert_eq!(record.specs.ram, Some(16));
    assert_eq!(record.specs.ssd_gb, Some(512));
    assert_eq!(record.specs.cpu_cores, Some(10));
}

#[test]
fn test_malformed_html() {
    let item = create_test_item(
        "Broken",
        "<p>Unclosed <b>¥5,999.00<div>More content".to_string(),
        Some("broken"),
    );
    let record = assemble(&item).unwrap();
    assert_eq!(record.price_num, 5999.0);
    assert_eq!(record.display_title, "Broken");
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_assemble_never_panics(title in ".*", html in ".*") {
            let item = create_test_item(&title, html, None);
            let _ = assemble(&item);
        }

        #[test]
        fn test_well_formed_price_round_trips(yuan in 1u32..200_000, cents in 0u32..100) {
            let price = format!("¥{},{:03}.{:02}", yuan / 1000, yuan % 1000, cents);
            let price = price.replace("¥0,", "¥");
            let item = create_test_item("Mac", format!("<p>{price}</p>"), None);
            let record = assemble(&item).unwrap();
            let expected = yuan as f64 + cents as f64 / 100.0;
            prop_assert!((record.price_num - expected).abs() < 1e-6);
        }
    }
}
