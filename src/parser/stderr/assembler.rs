//! Mode A: generic multi-line assembly for the plain stderr log format. A
//! new logical record begins at a line whose leading bytes parse as a full
//! PostgreSQL timestamp; every line up to (but not including) the next
//! such head is a continuation and is appended, newline-joined, to the
//! current record's message.

use super::line::{classify, Head};
use chrono::{DateTime, Utc};

pub struct AssembledRecord {
    pub timestamp: DateTime<Utc>,
    pub raw: String,
}

#[derive(Default)]
pub struct Assembler {
    pending: Option<AssembledRecord>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one physical line, returning a completed record whenever this
    /// line turns out to be the head of the *next* one.
    pub fn feed(&mut self, line: &str, now: DateTime<Utc>) -> Option<AssembledRecord> {
        let line = &super::rewrite_tab_marker(line);
        match classify(line, now) {
            Some(Head::Plain { timestamp, rest }) => {
                let finished = self.pending.take();
                self.pending = Some(AssembledRecord { timestamp, raw: rest });
                finished
            }
            // A `Head::Syslog` classification in Mode A input would be
            // unusual (it implies a `name[pid]:` tag inside a plain
            // stderr-format log) — treat it as a continuation rather than
            // risk misclassifying ordinary message text containing a
            // bracketed number.
            Some(Head::Syslog { .. }) | None => {
                if let Some(rec) = self.pending.as_mut() {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        rec.raw.push(' ');
                        rec.raw.push_str(trimmed);
                    }
                }
                None
            }
        }
    }

    /// Call once input is exhausted to flush the last in-progress record.
    pub fn finish(&mut self) -> Option<AssembledRecord> {
        self.pending.take()
    }
}
