use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};

use crate::adapter::{REVIEW_KEYWORDS, ReviewAdapter, browser_client, element_text};
use crate::domain::{ReviewQuery, ReviewSource, SourceRecord};
use crate::error::BookpostError;
use crate::progress::{ProgressEvent, ProgressSink};

const RESULT_LIMIT: usize = 10;

/// Fallback search engine used by the reduced source configuration.
pub struct BingAdapter {
    client: Client,
    base_url: String,
    limit: usize,
}

impl BingAdapter {
    pub fn new() -> Result<Self, BookpostError> {
        Self::new_with_base_url("https://www.bing.com".to_string())
    }

    pub fn new_with_base_url(base_url: String) -> Result<Self, BookpostError> {
        Ok(Self {
            client: browser_client()?,
            base_url,
            limit: RESULT_LIMIT,
        })
    }
}

impl ReviewAdapter for BingAdapter {
    fn source(&self) -> ReviewSource {
        ReviewSource::BingSearch
    }

    fn fetch(&self, query: &ReviewQuery, sink: &dyn ProgressSink) -> Vec<SourceRecord> {
        let term = format!("{} {}", query.term, REVIEW_KEYWORDS);
        sink.event(ProgressEvent::info(format!("bing.search term={term}")));

        let url = format!("{}/search", self.base_url);
        let response = match self.client.get(&url).query(&[("q", term.as_str())]).send() {
            Ok(response) => response,
            Err(err) => {
                sink.event(ProgressEvent::warn(format!("bing.search failed: {err}")));
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            sink.event(ProgressEvent::warn(format!(
                "bing.search status {}",
                response.status().as_u16()
            )));
            return Vec::new();
        }
        let body = match response.text() {
            Ok(body) => body,
            Err(err) => {
                sink.event(ProgressEvent::warn(format!(
                    "bing.search body unreadable: {err}"
                )));
                return Vec::new();
            }
        };

        let records = parse_search_results(&body, self.limit);
        sink.event(ProgressEvent::info(format!(
            "bing.search {} results",
            records.len()
        )));
        for record in &records {
            sink.event(ProgressEvent::info(format!("[bing] {}", record.title)));
        }
        records
    }
}

/// Results are `li.b_algo` blocks with the title link nested in an `h2`.
pub fn parse_search_results(html: &str, limit: usize) -> Vec<SourceRecord> {
    let document = Html::parse_document(html);
    let block = Selector::parse("li.b_algo").unwrap();
    let heading = Selector::parse("h2").unwrap();
    let link = Selector::parse("h2 > a").unwrap();
    let snippet = Selector::parse("p").unwrap();

    let mut records = Vec::new();
    for element in document.select(&block).take(limit) {
        let Some(record) = extract_result(element, &heading, &link, &snippet) else {
            continue;
        };
        records.push(record);
    }
    records
}

fn extract_result(
    element: ElementRef<'_>,
    heading: &Selector,
    link: &Selector,
    snippet: &Selector,
) -> Option<SourceRecord> {
    let title = element.select(heading).next().map(element_text)?;
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
        <html><body><ol>
          <li class="b_algo">
            <h2><a href="https://example.com/shohyo">書評まとめ</a></h2>
            <p>話題の一冊を読んだ感想。</p>
          </li>
          <li class="b_algo">
            <h2><a href="https://example.com/blog">ブログ記事</a></h2>
          </li>
          <li class="b_algo">
            <p>見出しのないブロックは読み飛ばす。</p>
          </li>
        </ol></body></html>
    "#;

    #[test]
    fn parse_extracts_title_link_and_snippet() {
        let records = parse_search_results(RESULTS_HTML, 10);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "書評まとめ");
        assert_eq!(records[0].url, "https://example.com/shohyo");
        assert_eq!(records[0].excerpt, "話題の一冊を読んだ感想。");
        assert_eq!(records[1].excerpt, "");
    }

    #[test]
    fn parse_respects_limit() {
        assert_eq!(parse_search_results(RESULTS_HTML, 1).len(), 1);
    }
}
