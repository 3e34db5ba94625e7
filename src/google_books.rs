use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::domain::Isbn;
use crate::error::BookpostError;

/// Bibliographic metadata as persisted in the book cache file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookData {
    pub isbn: Isbn,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub language: String,
}

impl BookData {
    /// Free-text search term handed to the review sources: title plus authors,
    /// space-joined.
    pub fn search_term(&self) -> String {
        let mut term = self.title.clone();
        for author in &self.authors {
            term.push(' ');
            term.push_str(author);
        }
        term
    }
}

#[derive(Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<VolumeItem>,
}

#[derive(Deserialize)]
struct VolumeItem {
    #[serde(rename = "volumeInfo")]
    volume_info: VolumeInfo,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    published_date: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    page_count: u32,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    image_links: ImageLinks,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Deserialize, Default)]
struct ImageLinks {
    #[serde(default)]
    thumbnail: String,
}

pub trait GoogleBooksClient: Send + Sync {
    fn fetch(&self, isbn: &Isbn) -> Result<BookData, BookpostError>;
}

#[derive(Clone)]
pub struct GoogleBooksHttpClient {
    client: Client,
    base_url: String,
}

impl GoogleBooksHttpClient {
    pub fn new() -> Result<Self, BookpostError> {
        Self::new_with_base_url("https://www.googleapis.com/books/v1".to_string())
    }

    pub fn new_with_base_url(base_url: String) -> Result<Self, BookpostError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("bookpost/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| BookpostError::HttpClientInit(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| BookpostError::HttpClientInit(err.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn volumes_url(&self, isbn: &Isbn) -> String {
        format!("{}/volumes?q=isbn:{}", self.base_url, isbn)
    }
}

impl GoogleBooksClient for GoogleBooksHttpClient {
    fn fetch(&self, isbn: &Isbn) -> Result<BookData, BookpostError> {
        let url = self.volumes_url(isbn);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| BookpostError::GoogleBooksHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "Google Books request failed".to_string());
            return Err(BookpostError::GoogleBooksStatus { status, message });
        }
        let body = response
            .text()
            .map_err(|err| BookpostError::GoogleBooksHttp(err.to_string()))?;
        parse_volumes(isbn.clone(), &body)
    }
}

/// The volumes payload never echoes the queried ISBN back, so it is threaded
/// through from the caller.
pub fn parse_volumes(isbn: Isbn, body: &str) -> Result<BookData, BookpostError> {
    let response: VolumesResponse =
        serde_json::from_str(body).map_err(|err| BookpostError::GoogleBooksHttp(err.to_string()))?;
    let item = response
        .items
        .into_iter()
        .next()
        .ok_or_else(|| BookpostError::BookNotFound(isbn.to_string()))?;
    let info = item.volume_info;

    Ok(BookData {
        isbn,
        title: info.title,
        authors: info.authors,
        publisher: info.publisher,
        published_date: info.published_date,
        description: info.description,
        page_count: info.page_count,
        categories: info.categories,
        image_url: info.image_links.thumbnail,
        language: info.language.unwrap_or_else(|| "ja".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const VOLUMES_JSON: &str = r#"{
        "items": [
            {
                "volumeInfo": {
                    "title": "伝わる文章の書き方教室",
                    "authors": ["樋口裕一"],
                    "publisher": "インプレス",
                    "publishedDate": "2018-11-16",
                    "description": "書く力がつく",
                    "pageCount": 224,
                    "categories": ["Language Arts"],
                    "imageLinks": {"thumbnail": "http://books.google.com/thumb.jpg"}
                }
            }
        ]
    }"#;

    #[test]
    fn parse_volumes_maps_volume_info() {
        let isbn: Isbn = "9784295404811".parse().unwrap();
        let book = parse_volumes(isbn.clone(), VOLUMES_JSON).unwrap();

        assert_eq!(book.isbn, isbn);
        assert_eq!(book.title, "伝わる文章の書き方教室");
        assert_eq!(book.authors, vec!["樋口裕一".to_string()]);
        assert_eq!(book.page_count, 224);
        assert_eq!(book.image_url, "http://books.google.com/thumb.jpg");
        // language missing from the payload defaults to the catalog locale
        assert_eq!(book.language, "ja");
        assert_eq!(book.search_term(), "伝わる文章の書き方教室 樋口裕一");
    }

    #[test]
    fn parse_volumes_without_items_is_not_found() {
        let isbn: Isbn = "9784295404811".parse().unwrap();
        let result = parse_volumes(isbn, r#"{"kind": "books#volumes", "totalItems": 0}"#);
        assert_matches!(result, Err(BookpostError::BookNotFound(_)));
    }
}
