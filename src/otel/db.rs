//! Database statement instrumentation.

use tracing::{field, span, Level, Span};

/// Longest `db.query.text` recorded on a span.
const MAX_QUERY_TEXT: usize = 2048;

/// Create a span for one statement execution.
///
/// # Arguments
///
/// * `system` - `db.system.name` value (`mysql`, `sqlite`)
/// * `query_text` - Statement text, truncated to a safe length
///
/// # Example
///
/// ```rust,ignore
/// let span = db_query_span("mysql", "SELECT COUNT(*) FROM customer_info");
/// let _guard = span.entered();
/// ```
pub fn db_query_span(system: &str, query_text: &str) -> Span {
    let operation = query_text
        .split_whitespace()
        .next()
        .unwrap_or("query")
        .to_ascii_uppercase();

    span!(
        Level::INFO,
        "db.query",
        otel.name = %operation,
        otel.kind = "client",
        db.system.name = system,
        db.operation.name = %operation,
        db.query.text = truncate(query_text, MAX_QUERY_TEXT),
        db.response.returned_rows = field::Empty,
    )
}

/// Record the returned row count on the current span.
pub fn record_db_metrics(rows_returned: usize) {
    Span::current().record("db.response.returned_rows", rows_returned);
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    &text[..cut]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate("SELECT 1", 6), "SELECT");
        assert_eq!(truncate("é", 1), "");
    }

    #[test]
    fn test_span_creation_without_subscriber() {
        let span = db_query_span("sqlite", "SELECT 1");
        let _guard = span.enter();
        record_db_metrics(1);
    }
}
