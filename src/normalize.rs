//! Metadata normalization: renders the extracted
//! `user`/`database`/`application`/`host` fields as `key=value` tokens
//! prepended to the message, omitting anything empty or the literal
//! `[unknown]` placeholder some sources emit in place of a real value.
//! Idempotent: running this twice on an already-normalized message is a
//! no-op, since the second pass finds nothing new to extract.

use crate::domain::{ExtractedMetadata, LogEntry};

const UNKNOWN_PLACEHOLDER: &str = "[unknown]";

fn usable(value: &Option<String>) -> Option<&str> {
    match value {
        Some(v) if !v.is_empty() && v != UNKNOWN_PLACEHOLDER => Some(v.as_str()),
        _ => None,
    }
}

/// Builds the final `LogEntry` by prepending whichever of
/// `user=`/`db=`/`app=`/`host=` tokens the metadata actually carries, in
/// that fixed order, ahead of the entry's own message.
pub fn normalize(timestamp: chrono::DateTime<chrono::Utc>, metadata: &ExtractedMetadata) -> LogEntry {
    let mut prefix_tokens = Vec::new();
    if let Some(user) = usable(&metadata.user) {
        prefix_tokens.push(format!("user={user}"));
    }
    if let Some(db) = usable(&metadata.database) {
        prefix_tokens.push(format!("db={db}"));
    }
    if let Some(app) = usable(&metadata.application) {
        prefix_tokens.push(format!("app={app}"));
    }
    if let Some(host) = usable(&metadata.host) {
        prefix_tokens.push(format!("host={host}"));
    }

    let message = if prefix_tokens.is_empty() {
        metadata.message.clone()
    } else {
        format!("{} {}", prefix_tokens.join(" "), metadata.message)
    };

    LogEntry::new(timestamp, message)
}
