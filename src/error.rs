use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BookpostError {
    #[error("invalid ISBN: {0}")]
    InvalidIsbn(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClientInit(String),

    #[error("Google Books request failed: {0}")]
    GoogleBooksHttp(String),

    #[error("Google Books returned status {status}: {message}")]
    GoogleBooksStatus { status: u16, message: String },

    #[error("no catalog entry found for ISBN {0}")]
    BookNotFound(String),

    #[error("book metadata not fetched yet: {0}")]
    MissingBookData(Utf8PathBuf),

    #[error("article file not found: {0}")]
    MissingArticle(Utf8PathBuf),

    #[error("thumbnail image not found: {0}")]
    MissingThumbnail(Utf8PathBuf),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
