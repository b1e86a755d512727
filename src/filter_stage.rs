//! Downstream filter stage. Runs after normalization, so it
//! re-extracts `key=value` tokens from the already-prepended message
//! rather than needing a separate metadata channel. Predicate order is
//! fixed: time window, then database whitelist, then user blacklist, then
//! user whitelist, then application whitelist, then a plain substring
//! grep — cheapest/most-selective checks first so a rejected entry does as
//! little work as possible.

use crate::domain::{Filter, LogEntry};

/// Scans `message` for a `key=value` or `key:value` token, stripping a
/// surrounding pair of double quotes from the value if present. Tries `=`
/// before `:` since every normalizer-emitted token and PostgreSQL's own
/// `log_line_prefix` output use `=`; `:` is kept for oddball third-party
/// JSON re-exports that render metadata as `key: value`.
fn extract_value(message: &str, key: &str) -> Option<String> {
    for sep in ['=', ':'] {
        let needle = format!("{key}{sep}");
        if let Some(pos) = find_word_boundary(message, &needle) {
            let after = &message[pos + needle.len()..];
            let value = if let Some(rest) = after.strip_prefix('"') {
                rest.split('"').next().unwrap_or("")
            } else if let Some(rest) = after.strip_prefix('\'') {
                rest.split('\'').next().unwrap_or("")
            } else {
                let end = after
                    .find([' ', '\t', ',', '[', ']', '(', ')'])
                    .unwrap_or(after.len());
                &after[..end]
            };
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn find_word_boundary(haystack: &str, needle: &str) -> Option<usize> {
    let mut start = 0;
    while let Some(rel) = haystack[start..].find(needle) {
        let pos = start + rel;
        let preceded_by_boundary = pos == 0
            || !haystack.as_bytes()[pos - 1].is_ascii_alphanumeric() && haystack.as_bytes()[pos - 1] != b'_';
        if preceded_by_boundary {
            return Some(pos);
        }
        start = pos + needle.len();
    }
    None
}

/// Returns true if `entry` should be kept under `filter`.
pub fn passes(entry: &LogEntry, filter: &Filter) -> bool {
    if let Some(begin) = filter.begin {
        if entry.timestamp < begin {
            return false;
        }
    }
    if let Some(end) = filter.end {
        if entry.timestamp > end {
            return false;
        }
    }

    if !filter.db_whitelist.is_empty() {
        let db = extract_value(&entry.message, "db").or_else(|| extract_value(&entry.message, "database"));
        if !db.is_some_and(|d| filter.db_whitelist.contains(&d)) {
            return false;
        }
    }

    if !filter.user_blacklist.is_empty() {
        if let Some(user) = extract_value(&entry.message, "user") {
            if filter.user_blacklist.contains(&user) {
                return false;
            }
        }
    }

    if !filter.user_whitelist.is_empty() {
        let user = extract_value(&entry.message, "user");
        if !user.is_some_and(|u| filter.user_whitelist.contains(&u)) {
            return false;
        }
    }

    if !filter.app_whitelist.is_empty() {
        let app = extract_value(&entry.message, "app").or_else(|| extract_value(&entry.message, "application"));
        if !app.is_some_and(|a| filter.app_whitelist.contains(&a)) {
            return false;
        }
    }

    if !filter.grep_all.is_empty() && !filter.grep_all.iter().any(|pat| entry.message.contains(pat.as_str())) {
        return false;
    }

    true
}
