#![allow(dead_code)]

use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// One `<item>` of a test feed.
pub struct FeedEntry<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub guid: Option<&'a str>,
    pub content: &'a str,
}

pub fn rss_document(entries: &[FeedEntry<'_>]) -> String {
    let items: String = entries
        .iter()
        .map(|entry| {
            let guid = entry
                .guid
                .map(|g| format!("<guid isPermaLink=\"false\">{g}</guid>"))
                .unwrap_or_default();
            format!(
                "<item><title>{}</title><link>{}</link>{}<content:encoded><![CDATA[{}]]></content:encoded></item>\n",
                entry.title, entry.link, guid, entry.content
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel>
<title>Refurbished Macs</title>
{items}</channel>
</rss>"#
    )
}

/// A small feed with two sellable machines and one item without a price.
pub fn sample_feed() -> String {
    rss_document(&[
        FeedEntry {
            title: "MacBook Pro Apple M3 Pro 芯片 - 深空黑色",
            link: "https://www.apple.com.cn/shop/product/FRX53CH/A",
            guid: Some("mbp-m3pro"),
            content: "<p>¥14,199.00</p><ul><li>14.2 英寸 Liquid 视网膜 XDR 显示屏</li><li>18GB 统一内存</li><li>1TB 固态硬盘</li></ul>",
        },
        FeedEntry {
            title: "Mac mini Apple M2 芯片",
            link: "https://www.apple.com.cn/shop/product/FMXY3CH/A",
            guid: Some("mini-m2"),
            content: "<p>¥3,599.00</p><ul><li>8GB 统一内存</li><li>256GB 固态硬盘</li></ul>",
        },
        FeedEntry {
            title: "Apple Store gift card",
            link: "https://www.apple.com.cn/shop/gift-cards",
            guid: Some("gift"),
            content: "<p>Product page</p>",
        },
    ])
}

pub async fn serve_feed(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body.into_bytes())
                .insert_header("Content-Type", "application/rss+xml; charset=utf-8"),
        )
        .mount(server)
        .await;
}
