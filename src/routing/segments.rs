//! Request path segmentation and query-string splitting.
//!
//! Incoming request targets are never validated here: any bytes between
//! slashes form a segment. Validation applies only to declared templates.

use std::collections::HashMap;

/// Query-string key/value pairs. Last occurrence of a key wins.
pub type QueryParams = HashMap<String, String>;

/// Split a request path into its raw segments.
///
/// One leading and one trailing `/` are skipped; interior empty fragments
/// (`/a//b`) are kept as empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

/// Separate the query string from a request target.
///
/// Everything before the first `?` is the path. Pairs without `=` are
/// dropped; no percent-decoding is applied.
pub fn split_query(target: &str) -> (&str, QueryParams) {
    let Some((path, query)) = target.split_once('?') else {
        return (target, QueryParams::new());
    };
    let params = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    (path, params)
}

/// Percent-decoded rendering of a target's query string, for logs only.
pub fn decoded_query(target: &str) -> Option<String> {
    let (_, query) = target.split_once('?')?;
    let pairs: Vec<String> = url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    Some(pairs.join("&"))
}
