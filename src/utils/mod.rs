//! Utility functions and helpers.

use chrono::Local;

/// Timestamp format used throughout the persisted store.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time formatted for persistence.
pub fn now_stamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Extract plain text from a field that may arrive wrapped in markup.
///
/// The GHDB feed delivers the query text as an anchor tag
/// (`<a href="...">DORK</a>`). Takes the text between the first `>` and
/// the next `<`; if no delimiter is present, the raw field is returned
/// verbatim.
pub fn strip_markup(raw: &str) -> String {
    match raw.find('>') {
        Some(pos) => {
            let rest = &raw[pos + 1..];
            let end = rest.find('<').unwrap_or(rest.len());
            rest[..end].to_string()
        }
        None => raw.to_string(),
    }
}
