use std::fmt::Write;

use crate::domain::{Isbn, ReviewCollection, ReviewRecord};

/// Long-form review bodies are cut to this many characters; search snippets
/// are kept whole.
const BODY_LIMIT: usize = 200;

const RULE_WIDTH: usize = 70;

/// Renders the persisted report. Pure: the timestamp is passed in, nothing is
/// read or written here.
pub fn render(isbn: &Isbn, term: &str, collection: &ReviewCollection, collected_at: &str) -> String {
    if collection.is_empty() {
        render_empty(isbn, term, collected_at)
    } else {
        render_digest(isbn, term, collection, collected_at)
    }
}

fn render_empty(isbn: &Isbn, term: &str, collected_at: &str) -> String {
    let mut out = String::new();
    out.push_str("No reviews were found.\n\n");
    let _ = writeln!(out, "Book: {term}");
    let _ = writeln!(out, "ISBN: {isbn}");
    let _ = writeln!(out, "Collected: {collected_at}");
    out.push('\n');
    out.push_str("Manual follow-up:\n");
    out.push_str("1. Search Amazon or the usual review sites by hand and copy any reviews\n");
    out.push_str("2. Paste them into this file and save it\n");
    out.push_str("3. Use the file as source material for the article draft\n");
    out
}

fn render_digest(
    isbn: &Isbn,
    term: &str,
    collection: &ReviewCollection,
    collected_at: &str,
) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    let counts = collection
        .per_source_counts()
        .iter()
        .map(|(source, count)| format!("{source}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = String::new();
    out.push_str("Book review digest\n");
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "Book: {term}");
    let _ = writeln!(out, "ISBN: {isbn}");
    let _ = writeln!(out, "Collected: {collected_at}");
    let _ = writeln!(out, "Collected items: {} ({counts})", collection.total());
    let _ = writeln!(out, "{heavy}");
    out.push('\n');

    for record in collection.records() {
        render_record(&mut out, record);
        let _ = writeln!(out, "{light}");
        out.push('\n');
    }

    let _ = writeln!(out, "{heavy}");
    out.push_str("Compiled from web search results and customer reviews. Quoted text belongs to its authors.\n");
    out.push_str("Use this file as source material for the article draft, not for publication as-is.\n");
    out
}

fn render_record(out: &mut String, record: &ReviewRecord) {
    let _ = writeln!(out, "[{}] {}", record.number, record.title);
    let _ = writeln!(out, "Source: {}", record.source.label());
    if record.source.is_marketplace() {
        let _ = writeln!(out, "Rating: {}", record.rating);
        let _ = writeln!(out, "Body: {}", truncate_chars(&record.excerpt, BODY_LIMIT));
        let _ = writeln!(out, "URL: {}", record.url);
    } else {
        let _ = writeln!(out, "URL: {}", record.url);
        let _ = writeln!(out, "Snippet: {}", record.excerpt);
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push_str("...");
    cut
}
