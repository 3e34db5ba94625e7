use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};

use crate::adapter::{REVIEW_KEYWORDS, ReviewAdapter, browser_client, element_text};
use crate::domain::{ReviewQuery, ReviewSource, SourceRecord};
use crate::error::BookpostError;
use crate::progress::{ProgressEvent, ProgressSink};

const RESULT_LIMIT: usize = 10;

pub struct GoogleSearchAdapter {
    client: Client,
    base_url: String,
    limit: usize,
}

impl GoogleSearchAdapter {
    pub fn new() -> Result<Self, BookpostError> {
        Self::new_with_base_url("https://www.google.com".to_string())
    }

    pub fn new_with_base_url(base_url: String) -> Result<Self, BookpostError> {
        Ok(Self {
            client: browser_client()?,
            base_url,
            limit: RESULT_LIMIT,
        })
    }
}

impl ReviewAdapter for GoogleSearchAdapter {
    fn source(&self) -> ReviewSource {
        ReviewSource::GoogleSearch
    }

    fn fetch(&self, query: &ReviewQuery, sink: &dyn ProgressSink) -> Vec<SourceRecord> {
        let term = format!("{} {}", query.term, REVIEW_KEYWORDS);
        sink.event(ProgressEvent::info(format!("google.search term={term}")));

        let url = format!("{}/search", self.base_url);
        let response = match self
            .client
            .get(&url)
            .query(&[("q", term.as_str()), ("hl", "ja")])
            .send()
        {
            Ok(response) => response,
            Err(err) => {
                sink.event(ProgressEvent::warn(format!("google.search failed: {err}")));
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            sink.event(ProgressEvent::warn(format!(
                "google.search status {}",
                response.status().as_u16()
            )));
            return Vec::new();
        }
        let body = match response.text() {
            Ok(body) => body,
            Err(err) => {
                sink.event(ProgressEvent::warn(format!(
                    "google.search body unreadable: {err}"
                )));
                return Vec::new();
            }
        };

        let records = parse_search_results(&body, self.limit);
        sink.event(ProgressEvent::info(format!(
            "google.search {} results",
            records.len()
        )));
        for record in &records {
            sink.event(ProgressEvent::info(format!("[google] {}", record.title)));
        }
        records
    }
}

/// Organic results live in `div.g` blocks. The class names track Google's
/// current markup and will break when it changes; only this function needs
/// updating when they do.
pub fn parse_search_results(html: &str, limit: usize) -> Vec<SourceRecord> {
    let document = Html::parse_document(html);
    let block = Selector::parse("div.g").unwrap();
    let title = Selector::parse("h3").unwrap();
    let link = Selector::parse("a[href]").unwrap();
    let snippet = Selector::parse("div.VwiC3b").unwrap();
    let snippet_fallback = Selector::parse("span.aCOpRe").unwrap();

    let mut records = Vec::new();
    for element in document.select(&block).take(limit) {
        let Some(record) = extract_result(element, &title, &link, &snippet, &snippet_fallback)
        else {
            continue;
        };
        records.push(record);
    }
    records
}

fn extract_result(
    element: ElementRef<'_>,
    title: &Selector,
    link: &Selector,
    snippet: &Selector,
    snippet_fallback: &Selector,
) -> Option<SourceRecord> {
    let title = element.select(title).next().map(element_text)?;
    let url = element
        .select(link)
        .next()?
        .value()
        .attr("href")
        .unwrap_or_default()
        .to_string();
    let excerpt = element
        .select(snippet)
        .next()
        .or_else(|| element.select(snippet_fallback).next())
        .map(element_text)
        .unwrap_or_default();

    Some(SourceRecord {
        title,
        url,
        excerpt,
        rating: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_HTML: &str = r#"
        <html><body>
          <div class="g">
            <a href="https://example.com/review-1"><h3>とても良い本の書評</h3></a>
            <div class="VwiC3b">文章術の定番として紹介されることが多い一冊。</div>
          </div>
          <div class="g">
            <a href="https://example.com/review-2"><h3>読書ブログ</h3></a>
            <span class="aCOpRe">旧マークアップのスニペット。</span>
          </div>
          <div class="g">
            <div class="VwiC3b">タイトル要素のないブロックは読み飛ばす。</div>
          </div>
        </body></html>
    "#;

    #[test]
    fn parse_extracts_title_link_and_snippet() {
        let records = parse_search_results(RESULTS_HTML, 10);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "とても良い本の書評");
        assert_eq!(records[0].url, "https://example.com/review-1");
        assert_eq!(
            records[0].excerpt,
            "文章術の定番として紹介されることが多い一冊。"
        );
        // fallback snippet selector
        assert_eq!(records[1].excerpt, "旧マークアップのスニペット。");
        assert!(records[1].rating.is_empty());
    }

    #[test]
    fn parse_respects_limit() {
        let records = parse_search_results(RESULTS_HTML, 1);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn parse_of_garbage_is_empty() {
        assert!(parse_search_results("not html at all", 10).is_empty());
        assert!(parse_search_results("<html><body></body></html>", 10).is_empty());
    }

    #[test]
    fn fetch_degrades_to_empty_on_network_failure() {
        // port 9 (discard) refuses connections on loopback
        let adapter =
            GoogleSearchAdapter::new_with_base_url("http://127.0.0.1:9".to_string()).unwrap();
        let query = ReviewQuery {
            isbn: "9784295404811".parse().unwrap(),
            term: "伝わる文章の書き方教室".to_string(),
        };

        let records = adapter.fetch(&query, &crate::progress::SilentSink);
        assert!(records.is_empty());
    }
}
