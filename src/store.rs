use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::Isbn;
use crate::error::BookpostError;

/// Path layout under the data directory. A report file that exists at its
/// computed path IS the cache signal; there is no index, freshness check or
/// lock. Writes are plain, so two concurrent runs for the same ISBN may both
/// fetch and the last writer wins.
#[derive(Debug, Clone)]
pub struct Store {
    data_root: Utf8PathBuf,
}

impl Store {
    pub fn new(data_root: Utf8PathBuf) -> Self {
        Self { data_root }
    }

    pub fn data_root(&self) -> &Utf8Path {
        &self.data_root
    }

    pub fn book_path(&self, isbn: &Isbn) -> Utf8PathBuf {
        self.data_root.join("books").join(format!("book_{isbn}.json"))
    }

    pub fn review_path(&self, isbn: &Isbn) -> Utf8PathBuf {
        self.data_root
            .join("reviews")
            .join(format!("review_{isbn}.txt"))
    }

    pub fn article_path(&self, isbn: &Isbn) -> Utf8PathBuf {
        self.data_root
            .join("outputs")
            .join(format!("article_{isbn}.md"))
    }

    pub fn thumbnail_path(&self, isbn: &Isbn) -> Utf8PathBuf {
        self.data_root
            .join("images")
            .join(format!("thumbnail_{isbn}.png"))
    }

    pub fn log_path(&self) -> Utf8PathBuf {
        self.data_root.join("logs").join("app.log")
    }

    pub fn exists(path: &Utf8Path) -> bool {
        path.as_std_path().exists()
    }

    pub fn write_text(path: &Utf8Path, content: &str) -> Result<(), BookpostError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| BookpostError::Filesystem(err.to_string()))?;
        }
        fs::write(path.as_std_path(), content)
            .map_err(|err| BookpostError::Filesystem(err.to_string()))
    }

    pub fn read_text(path: &Utf8Path) -> Result<String, BookpostError> {
        fs::read_to_string(path.as_std_path())
            .map_err(|err| BookpostError::Filesystem(err.to_string()))
    }
}
