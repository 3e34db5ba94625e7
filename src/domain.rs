use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BookpostError;

/// Normalized 13-digit ISBN, no separators. Legacy 10-character forms are
/// converted on parse; the old check digit is dropped and a fresh one is
/// computed over the `978`-prefixed body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Isbn(String);

impl Isbn {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Isbn {
    type Err = BookpostError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let cleaned = value.trim().replace(['-', ' '], "").to_uppercase();
        let isbn13 = Regex::new(r"^\d{13}$").unwrap();
        let isbn10 = Regex::new(r"^\d{9}[\dX]$").unwrap();

        if isbn13.is_match(&cleaned) {
            return Ok(Self(cleaned));
        }
        if isbn10.is_match(&cleaned) {
            let mut digits = String::with_capacity(13);
            digits.push_str("978");
            digits.push_str(&cleaned[..9]);
            let check = check_digit_13(&digits);
            digits.push(char::from(b'0' + check as u8));
            return Ok(Self(digits));
        }
        Err(BookpostError::InvalidIsbn(value.to_string()))
    }
}

/// Check digit over a 12-digit body: alternating weights 1 and 3, weight 1 at
/// position 0.
fn check_digit_13(digits12: &str) -> u32 {
    let total: u32 = digits12
        .bytes()
        .enumerate()
        .map(|(i, byte)| {
            let digit = u32::from(byte - b'0');
            if i % 2 == 0 { digit } else { digit * 3 }
        })
        .sum();
    (10 - total % 10) % 10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSource {
    GoogleSearch,
    AmazonReviews,
    BingSearch,
}

impl ReviewSource {
    /// Short name used in count summaries.
    pub fn name(&self) -> &'static str {
        match self {
            ReviewSource::GoogleSearch => "Google",
            ReviewSource::AmazonReviews => "Amazon",
            ReviewSource::BingSearch => "Bing",
        }
    }

    /// Attribution line printed under each record block.
    pub fn label(&self) -> &'static str {
        match self {
            ReviewSource::GoogleSearch => "Google search result",
            ReviewSource::AmazonReviews => "Amazon customer review",
            ReviewSource::BingSearch => "Bing search result",
        }
    }

    pub fn is_marketplace(&self) -> bool {
        matches!(self, ReviewSource::AmazonReviews)
    }
}

impl fmt::Display for ReviewSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One extracted result in document order, before merge. Adapters leave
/// `rating` empty for plain search hits.
#[derive(Debug, Clone, Default)]
pub struct SourceRecord {
    pub title: String,
    pub url: String,
    pub excerpt: String,
    pub rating: String,
}

impl SourceRecord {
    pub fn has_content(&self) -> bool {
        !self.title.is_empty() || !self.excerpt.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub number: usize,
    pub source: ReviewSource,
    pub title: String,
    pub url: String,
    pub excerpt: String,
    pub rating: String,
}

/// Merged output of one aggregation run. Numbering is global across sources
/// and contiguous from 1; records with neither title nor excerpt never enter
/// the collection.
#[derive(Debug, Clone, Default)]
pub struct ReviewCollection {
    records: Vec<ReviewRecord>,
    per_source: Vec<(ReviewSource, usize)>,
}

impl ReviewCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend_from(&mut self, source: ReviewSource, drafts: Vec<SourceRecord>) {
        let mut count = 0;
        for draft in drafts {
            if !draft.has_content() {
                continue;
            }
            count += 1;
            let number = self.records.len() + 1;
            self.records.push(ReviewRecord {
                number,
                source,
                title: draft.title,
                url: draft.url,
                excerpt: draft.excerpt,
                rating: draft.rating,
            });
        }
        self.per_source.push((source, count));
    }

    pub fn records(&self) -> &[ReviewRecord] {
        &self.records
    }

    pub fn per_source_counts(&self) -> &[(ReviewSource, usize)] {
        &self.per_source
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ReviewQuery {
    pub isbn: Isbn,
    pub term: String,
}
