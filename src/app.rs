use std::fs;

use camino::Utf8PathBuf;

use crate::collector::ReviewCollector;
use crate::domain::{Isbn, ReviewQuery};
use crate::error::BookpostError;
use crate::google_books::{BookData, GoogleBooksClient};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::report;
use crate::store::Store;

const THUMBNAIL_LIMIT_BYTES: u64 = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FetchReport {
    pub book: BookData,
    pub book_cached: bool,
    pub reviews: ReviewOutcome,
}

#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub path: Utf8PathBuf,
    /// Records written this run; `None` when the report came from cache.
    pub count: Option<usize>,
    pub cached: bool,
}

#[derive(Debug, Clone)]
pub struct PostCheck {
    pub book: BookData,
    pub article_path: Utf8PathBuf,
    pub article_chars: usize,
    pub thumbnail_path: Utf8PathBuf,
    pub thumbnail_bytes: u64,
    pub thumbnail_oversized: bool,
}

pub struct App<B: GoogleBooksClient, C: ReviewCollector> {
    store: Store,
    books: B,
    collector: C,
}

impl<B: GoogleBooksClient, C: ReviewCollector> App<B, C> {
    pub fn new(store: Store, books: B, collector: C) -> Self {
        Self {
            store,
            books,
            collector,
        }
    }

    pub fn fetch(&self, isbn: &Isbn, sink: &dyn ProgressSink) -> Result<FetchReport, BookpostError> {
        let (book, book_cached) = self.fetch_book(isbn, sink)?;
        let query = ReviewQuery {
            isbn: isbn.clone(),
            term: book.search_term(),
        };
        let reviews = self.collect_reviews(&query, sink)?;
        Ok(FetchReport {
            book,
            book_cached,
            reviews,
        })
    }

    pub fn fetch_book(
        &self,
        isbn: &Isbn,
        sink: &dyn ProgressSink,
    ) -> Result<(BookData, bool), BookpostError> {
        let path = self.store.book_path(isbn);
        if Store::exists(&path) {
            sink.event(ProgressEvent::info("phase=Book; using cached metadata"));
            let content = Store::read_text(&path)?;
            let book = serde_json::from_str(&content)
                .map_err(|err| BookpostError::Filesystem(format!("corrupt book cache: {err}")))?;
            return Ok((book, true));
        }

        sink.event(ProgressEvent::info("phase=Book; querying catalog"));
        let book = self.books.fetch(isbn)?;
        sink.event(ProgressEvent::info(format!("phase=Book; found {}", book.title)));
        let payload = serde_json::to_string_pretty(&book)
            .map_err(|err| BookpostError::Filesystem(err.to_string()))?;
        Store::write_text(&path, &payload)?;
        Ok((book, false))
    }

    /// The cache gate: existence of the report file at its computed path is
    /// the entire caching policy. On a hit the collector is never invoked.
    pub fn collect_reviews(
        &self,
        query: &ReviewQuery,
        sink: &dyn ProgressSink,
    ) -> Result<ReviewOutcome, BookpostError> {
        let path = self.store.review_path(&query.isbn);
        if Store::exists(&path) {
            sink.event(ProgressEvent::info("phase=Reviews; report already on disk"));
            return Ok(ReviewOutcome {
                path,
                count: None,
                cached: true,
            });
        }

        sink.event(ProgressEvent::info(format!(
            "phase=Reviews; collecting for {}",
            query.term
        )));
        let collection = self.collector.collect(query, sink);
        let collected_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let rendered = report::render(&query.isbn, &query.term, &collection, &collected_at);
        Store::write_text(&path, &rendered)?;
        sink.event(ProgressEvent::info(format!(
            "phase=Reviews; saved {} records to {path}",
            collection.total()
        )));
        Ok(ReviewOutcome {
            path,
            count: Some(collection.total()),
            cached: false,
        })
    }

    /// Publishing-preparation check. Verifies the inputs the posting step
    /// would need; the posting itself is not implemented.
    pub fn post_check(&self, isbn: &Isbn, sink: &dyn ProgressSink) -> Result<PostCheck, BookpostError> {
        let book_path = self.store.book_path(isbn);
        if !Store::exists(&book_path) {
            return Err(BookpostError::MissingBookData(book_path));
        }
        let content = Store::read_text(&book_path)?;
        let book: BookData = serde_json::from_str(&content)
            .map_err(|err| BookpostError::Filesystem(format!("corrupt book cache: {err}")))?;
        sink.event(ProgressEvent::info(format!("phase=Check; book {}", book.title)));

        let article_path = self.store.article_path(isbn);
        if !Store::exists(&article_path) {
            return Err(BookpostError::MissingArticle(article_path));
        }
        let article_chars = Store::read_text(&article_path)?.chars().count();

        let thumbnail_path = self.store.thumbnail_path(isbn);
        if !Store::exists(&thumbnail_path) {
            return Err(BookpostError::MissingThumbnail(thumbnail_path));
        }
        let thumbnail_bytes = fs::metadata(thumbnail_path.as_std_path())
            .map_err(|err| BookpostError::Filesystem(err.to_string()))?
            .len();
        let thumbnail_oversized = thumbnail_bytes > THUMBNAIL_LIMIT_BYTES;
        if thumbnail_oversized {
            sink.event(ProgressEvent::warn(format!(
                "phase=Check; thumbnail over 2MB ({thumbnail_bytes} bytes)"
            )));
        }

        Ok(PostCheck {
            book,
            article_path,
            article_chars,
            thumbnail_path,
            thumbnail_bytes,
            thumbnail_oversized,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use camino::Utf8PathBuf;

    use super::*;
    use crate::domain::{ReviewCollection, ReviewSource, SourceRecord};
    use crate::progress::SilentSink;

    struct MockBooks {
        calls: Mutex<usize>,
    }

    impl MockBooks {
        fn new() -> Self {
            Self {
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl GoogleBooksClient for MockBooks {
        fn fetch(&self, isbn: &Isbn) -> Result<BookData, BookpostError> {
            *self.calls.lock().unwrap() += 1;
            Ok(BookData {
                isbn: isbn.clone(),
                title: "伝わる文章の書き方教室".to_string(),
                authors: vec!["樋口裕一".to_string()],
                publisher: String::new(),
                published_date: String::new(),
                description: String::new(),
                page_count: 0,
                categories: Vec::new(),
                image_url: String::new(),
                language: "ja".to_string(),
            })
        }
    }

    struct MockCollector {
        calls: Mutex<usize>,
    }

    impl MockCollector {
        fn new() -> Self {
            Self {
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl ReviewCollector for MockCollector {
        fn collect(&self, _query: &ReviewQuery, _sink: &dyn ProgressSink) -> ReviewCollection {
            *self.calls.lock().unwrap() += 1;
            let mut collection = ReviewCollection::new();
            collection.extend_from(
                ReviewSource::GoogleSearch,
                vec![SourceRecord {
                    title: "書評".to_string(),
                    ..Default::default()
                }],
            );
            collection
        }
    }

    fn temp_store(temp: &tempfile::TempDir) -> Store {
        Store::new(Utf8PathBuf::from_path_buf(temp.path().join("data")).unwrap())
    }

    fn isbn() -> Isbn {
        "9784295404811".parse().unwrap()
    }

    #[test]
    fn collect_reviews_short_circuits_on_existing_report() {
        let temp = tempfile::tempdir().unwrap();
        let app = App::new(temp_store(&temp), MockBooks::new(), MockCollector::new());
        let query = ReviewQuery {
            isbn: isbn(),
            term: "query".to_string(),
        };

        let first = app.collect_reviews(&query, &SilentSink).unwrap();
        assert!(!first.cached);
        assert_eq!(first.count, Some(1));
        assert_eq!(app.collector.calls(), 1);

        let second = app.collect_reviews(&query, &SilentSink).unwrap();
        assert!(second.cached);
        assert_eq!(second.count, None);
        assert_eq!(second.path, first.path);
        // the collector was never touched the second time
        assert_eq!(app.collector.calls(), 1);
    }

    #[test]
    fn fetch_book_uses_cache_on_second_call() {
        let temp = tempfile::tempdir().unwrap();
        let app = App::new(temp_store(&temp), MockBooks::new(), MockCollector::new());

        let (_, cached) = app.fetch_book(&isbn(), &SilentSink).unwrap();
        assert!(!cached);
        let (book, cached) = app.fetch_book(&isbn(), &SilentSink).unwrap();
        assert!(cached);
        assert_eq!(book.title, "伝わる文章の書き方教室");
        assert_eq!(app.books.calls(), 1);
    }

    #[test]
    fn fetch_writes_report_and_metadata() {
        let temp = tempfile::tempdir().unwrap();
        let store = temp_store(&temp);
        let app = App::new(store.clone(), MockBooks::new(), MockCollector::new());

        let result = app.fetch(&isbn(), &SilentSink).unwrap();

        assert!(Store::exists(&store.book_path(&isbn())));
        assert!(Store::exists(&result.reviews.path));
        let rendered = Store::read_text(&result.reviews.path).unwrap();
        assert!(rendered.contains("伝わる文章の書き方教室 樋口裕一"));
    }

    #[test]
    fn post_check_reports_missing_inputs_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let store = temp_store(&temp);
        let app = App::new(store.clone(), MockBooks::new(), MockCollector::new());

        assert_matches!(
            app.post_check(&isbn(), &SilentSink),
            Err(BookpostError::MissingBookData(_))
        );

        app.fetch_book(&isbn(), &SilentSink).unwrap();
        assert_matches!(
            app.post_check(&isbn(), &SilentSink),
            Err(BookpostError::MissingArticle(_))
        );

        Store::write_text(&store.article_path(&isbn()), "# article").unwrap();
        assert_matches!(
            app.post_check(&isbn(), &SilentSink),
            Err(BookpostError::MissingThumbnail(_))
        );

        Store::write_text(&store.thumbnail_path(&isbn()), "png").unwrap();
        let check = app.post_check(&isbn(), &SilentSink).unwrap();
        assert_eq!(check.article_chars, "# article".chars().count());
        assert!(!check.thumbnail_oversized);
    }
}
