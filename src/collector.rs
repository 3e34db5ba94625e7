use std::thread;
use std::time::Duration;

use crate::adapter::ReviewAdapter;
use crate::amazon::AmazonAdapter;
use crate::bing::BingAdapter;
use crate::config::SourceMode;
use crate::domain::{ReviewCollection, ReviewQuery};
use crate::error::BookpostError;
use crate::google_search::GoogleSearchAdapter;
use crate::progress::{ProgressEvent, ProgressSink};

/// Wait between adapter invocations so the sources see paced, serialized
/// traffic rather than a burst.
pub const ADAPTER_PACING: Duration = Duration::from_secs(2);

pub trait ReviewCollector: Send + Sync {
    fn collect(&self, query: &ReviewQuery, sink: &dyn ProgressSink) -> ReviewCollection;
}

/// Runs the configured adapters one after another in a fixed priority order.
/// An empty collection is a defined outcome, not a failure; adapters cannot
/// abort the run.
pub struct SequentialCollector {
    adapters: Vec<Box<dyn ReviewAdapter>>,
    pacing: Duration,
}

impl SequentialCollector {
    pub fn new(mode: SourceMode) -> Result<Self, BookpostError> {
        let adapters: Vec<Box<dyn ReviewAdapter>> = match mode {
            SourceMode::Full => vec![
                Box::new(GoogleSearchAdapter::new()?),
                Box::new(AmazonAdapter::new()?),
            ],
            SourceMode::Reduced => vec![Box::new(BingAdapter::new()?)],
        };
        Ok(Self {
            adapters,
            pacing: ADAPTER_PACING,
        })
    }

    pub fn with_adapters(adapters: Vec<Box<dyn ReviewAdapter>>, pacing: Duration) -> Self {
        Self { adapters, pacing }
    }
}

impl ReviewCollector for SequentialCollector {
    fn collect(&self, query: &ReviewQuery, sink: &dyn ProgressSink) -> ReviewCollection {
        let mut collection = ReviewCollection::new();
        for (index, adapter) in self.adapters.iter().enumerate() {
            if index > 0 {
                thread::sleep(self.pacing);
            }
            let source = adapter.source();
            sink.event(ProgressEvent::info(format!(
                "phase={source}; querying source"
            )));
            let drafts = adapter.fetch(query, sink);
            let before = collection.total();
            collection.extend_from(source, drafts);
            sink.event(ProgressEvent::info(format!(
                "phase={source}; kept {} records",
                collection.total() - before
            )));
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReviewSource, SourceRecord};
    use crate::progress::SilentSink;

    struct FixedAdapter {
        source: ReviewSource,
        titles: Vec<&'static str>,
    }

    impl ReviewAdapter for FixedAdapter {
        fn source(&self) -> ReviewSource {
            self.source
        }

        fn fetch(&self, _query: &ReviewQuery, _sink: &dyn ProgressSink) -> Vec<SourceRecord> {
            self.titles
                .iter()
                .map(|title| SourceRecord {
                    title: title.to_string(),
                    ..Default::default()
                })
                .collect()
        }
    }

    /// Stands in for an adapter whose fetch failed and degraded to nothing.
    struct DeadAdapter;

    impl ReviewAdapter for DeadAdapter {
        fn source(&self) -> ReviewSource {
            ReviewSource::GoogleSearch
        }

        fn fetch(&self, _query: &ReviewQuery, _sink: &dyn ProgressSink) -> Vec<SourceRecord> {
            Vec::new()
        }
    }

    fn query() -> ReviewQuery {
        ReviewQuery {
            isbn: "9784295404811".parse().unwrap(),
            term: "伝わる文章の書き方教室".to_string(),
        }
    }

    #[test]
    fn collect_preserves_invocation_order_and_numbers_globally() {
        let collector = SequentialCollector::with_adapters(
            vec![
                Box::new(FixedAdapter {
                    source: ReviewSource::GoogleSearch,
                    titles: vec!["g1", "g2"],
                }),
                Box::new(FixedAdapter {
                    source: ReviewSource::AmazonReviews,
                    titles: vec!["a1", "a2", "a3"],
                }),
            ],
            Duration::ZERO,
        );

        let collection = collector.collect(&query(), &SilentSink);

        assert_eq!(collection.total(), 5);
        assert_eq!(
            collection.per_source_counts(),
            &[
                (ReviewSource::GoogleSearch, 2),
                (ReviewSource::AmazonReviews, 3),
            ]
        );
        let numbers: Vec<usize> = collection.records().iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(collection.records()[2].title, "a1");
        assert_eq!(collection.records()[2].source, ReviewSource::AmazonReviews);
    }

    #[test]
    fn collect_continues_past_an_empty_source() {
        let collector = SequentialCollector::with_adapters(
            vec![
                Box::new(DeadAdapter),
                Box::new(FixedAdapter {
                    source: ReviewSource::AmazonReviews,
                    titles: vec!["a1"],
                }),
            ],
            Duration::ZERO,
        );

        let collection = collector.collect(&query(), &SilentSink);

        assert_eq!(collection.total(), 1);
        assert_eq!(
            collection.per_source_counts(),
            &[
                (ReviewSource::GoogleSearch, 0),
                (ReviewSource::AmazonReviews, 1),
            ]
        );
        // numbering stays contiguous from 1 even when the first source is empty
        assert_eq!(collection.records()[0].number, 1);
    }

    #[test]
    fn collect_with_no_results_is_a_valid_empty_outcome() {
        let collector =
            SequentialCollector::with_adapters(vec![Box::new(DeadAdapter)], Duration::ZERO);

        let collection = collector.collect(&query(), &SilentSink);
        assert!(collection.is_empty());
        assert_eq!(collection.per_source_counts(), &[(ReviewSource::GoogleSearch, 0)]);
    }
}
