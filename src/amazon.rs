use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};

use crate::adapter::{ReviewAdapter, browser_client, element_text};
use crate::domain::{ReviewQuery, ReviewSource, SourceRecord};
use crate::error::BookpostError;
use crate::progress::{ProgressEvent, ProgressSink};

const REVIEW_LIMIT: usize = 5;

/// Wait between the search-page hop and the product-page hop.
const HOP_PACING: Duration = Duration::from_secs(1);

/// Two-hop adapter: an ISBN search on amazon.co.jp locates the product page,
/// and the review blocks are lifted from that page.
pub struct AmazonAdapter {
    client: Client,
    base_url: String,
    limit: usize,
    hop_pacing: Duration,
}

impl AmazonAdapter {
    pub fn new() -> Result<Self, BookpostError> {
        Self::new_with_base_url("https://www.amazon.co.jp".to_string())
    }

    pub fn new_with_base_url(base_url: String) -> Result<Self, BookpostError> {
        Ok(Self {
            client: browser_client()?,
            base_url,
            limit: REVIEW_LIMIT,
            hop_pacing: HOP_PACING,
        })
    }

    #[cfg(test)]
    fn without_pacing(mut self) -> Self {
        self.hop_pacing = Duration::ZERO;
        self
    }

    fn get_text(&self, url: &str, label: &str, sink: &dyn ProgressSink) -> Option<String> {
        let response = match self.client.get(url).send() {
            Ok(response) => response,
            Err(err) => {
                sink.event(ProgressEvent::warn(format!("{label} failed: {err}")));
                return None;
            }
        };
        if !response.status().is_success() {
            sink.event(ProgressEvent::warn(format!(
                "{label} status {}",
                response.status().as_u16()
            )));
            return None;
        }
        match response.text() {
            Ok(body) => Some(body),
            Err(err) => {
                sink.event(ProgressEvent::warn(format!("{label} body unreadable: {err}")));
                None
            }
        }
    }
}

impl ReviewAdapter for AmazonAdapter {
    fn source(&self) -> ReviewSource {
        ReviewSource::AmazonReviews
    }

    fn fetch(&self, query: &ReviewQuery, sink: &dyn ProgressSink) -> Vec<SourceRecord> {
        let search_url = format!("{}/s?k={}", self.base_url, query.isbn);
        sink.event(ProgressEvent::info(format!("amazon.search {search_url}")));

        let Some(body) = self.get_text(&search_url, "amazon.search", sink) else {
            return Vec::new();
        };
        let Some(href) = find_product_link(&body) else {
            sink.event(ProgressEvent::info("amazon.search no product hit"));
            return Vec::new();
        };
        let product_url = if href.starts_with("http") {
            href
        } else {
            format!("{}{}", self.base_url, href)
        };
        sink.event(ProgressEvent::info(format!("amazon.product {product_url}")));

        thread::sleep(self.hop_pacing);

        let Some(body) = self.get_text(&product_url, "amazon.product", sink) else {
            return Vec::new();
        };
        let records = parse_product_reviews(&body, &product_url, self.limit);
        for record in &records {
            sink.event(ProgressEvent::info(format!("[amazon] {}", record.title)));
        }
        records
    }
}

/// First organic hit on the search results page.
pub fn find_product_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let link = Selector::parse("a.a-link-normal.s-no-outline").unwrap();
    document
        .select(&link)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(str::to_string)
}

/// Review blocks carry `data-hook` markers; a block missing both title and
/// body is dropped, anything else keeps whatever fields it has.
pub fn parse_product_reviews(html: &str, product_url: &str, limit: usize) -> Vec<SourceRecord> {
    let document = Html::parse_document(html);
    let block = Selector::parse(r#"div[data-hook="review"]"#).unwrap();
    let title = Selector::parse(r#"a[data-hook="review-title"]"#).unwrap();
    let rating = Selector::parse(r#"i[data-hook="review-star-rating"]"#).unwrap();
    let body = Selector::parse(r#"span[data-hook="review-body"]"#).unwrap();

    let mut records = Vec::new();
    for element in document.select(&block).take(limit) {
        let Some(record) = extract_review(element, product_url, &title, &rating, &body) else {
            continue;
        };
        records.push(record);
    }
    records
}

fn extract_review(
    element: ElementRef<'_>,
    product_url: &str,
    title: &Selector,
    rating: &Selector,
    body: &Selector,
) -> Option<SourceRecord> {
    let title = element
        .select(title)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let rating = element
        .select(rating)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let excerpt = element
        .select(body)
        .next()
        .map(element_text)
        .unwrap_or_default();

    if title.is_empty() && excerpt.is_empty() {
        return None;
    }
    Some(SourceRecord {
        title,
        url: product_url.to_string(),
        excerpt,
        rating,
    })
}
