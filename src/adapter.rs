use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use scraper::ElementRef;

use crate::domain::{ReviewQuery, ReviewSource, SourceRecord};
use crate::error::BookpostError;
use crate::progress::ProgressSink;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// The search engines and the marketplace answer default client identifiers
// with a block page, so every adapter presents itself as a desktop browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "ja,en-US;q=0.9,en;q=0.8";

/// Keywords appended to every search term; the review sites being targeted
/// are Japanese.
pub const REVIEW_KEYWORDS: &str = "書評 レビュー";

/// One external review source. `fetch` never fails: network errors,
/// non-success statuses and parse failures degrade to an empty or partial
/// batch plus a warning event, so one broken source cannot abort a run.
pub trait ReviewAdapter: Send + Sync {
    fn source(&self) -> ReviewSource;
    fn fetch(&self, query: &ReviewQuery, sink: &dyn ProgressSink) -> Vec<SourceRecord>;
}

pub fn browser_client() -> Result<Client, BookpostError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
    );
    Client::builder()
        .default_headers(headers)
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|err| BookpostError::HttpClientInit(err.to_string()))
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
