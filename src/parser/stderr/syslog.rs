//! Mode B: per-PID syslog assembly. Syslog transports one message per
//! line, so PostgreSQL re-emits the full header on every physical line of
//! a logical multi-line message; concurrent backends interleave their
//! lines in the file in arrival order. We key in-progress records by pid
//! so a continuation line reaches the right buffer even with other
//! backends' lines mixed in between, then emit records as each pid's
//! record closes (a later line from the same pid carries a fresh severity
//! marker) or at end of input, ordered by entry timestamp with a stable
//! tie-break on first-line index — two backends don't necessarily log in
//! timestamp order relative to each other once interleaved.

use super::line::{classify, Head};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub struct AssembledRecord {
    pub timestamp: DateTime<Utc>,
    pub raw: String,
}

struct PendingRecord {
    first_line_index: usize,
    record: AssembledRecord,
}

#[derive(Default)]
pub struct SyslogAssembler {
    pending: HashMap<String, PendingRecord>,
    line_index: usize,
    closed: Vec<(usize, AssembledRecord)>,
}

impl SyslogAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one physical line. Orphan continuation lines (a `name[pid]:`
    /// tag with no open record for that pid) are reported via the
    /// returned `orphan_pid`, which callers turn into a
    /// `RecordWarning::OrphanSyslogContinuation`.
    pub fn feed(&mut self, line: &str, now: DateTime<Utc>) -> Option<String> {
        let line = &super::rewrite_tab_marker(line);
        let idx = self.line_index;
        self.line_index += 1;

        match classify(line, now) {
            Some(Head::Syslog { timestamp, pid, rest }) => {
                if let Some(prev) = self.pending.remove(pid) {
                    self.closed.push((prev.first_line_index, prev.record));
                }
                self.pending.insert(
                    pid.to_string(),
                    PendingRecord {
                        first_line_index: idx,
                        record: AssembledRecord {
                            timestamp,
                            raw: rest.to_string(),
                        },
                    },
                );
                None
            }
            Some(Head::Plain { .. }) | None => self.feed_continuation(line),
        }
    }

    fn feed_continuation(&mut self, line: &str) -> Option<String> {
        if let Some((pid, after_tag)) = super::line::find_process_tag(line) {
            if let Some(entry) = self.pending.get_mut(pid) {
                let trimmed = line[after_tag..].trim();
                if !trimmed.is_empty() {
                    entry.record.raw.push(' ');
                    entry.record.raw.push_str(trimmed);
                }
                return None;
            }
            return Some(pid.to_string());
        }
        None
    }

    /// Drains every record that has closed so far, ordered by timestamp
    /// and tie-broken by first-line index.
    pub fn drain_closed(&mut self) -> Vec<AssembledRecord> {
        let mut closed = std::mem::take(&mut self.closed);
        closed.sort_by_key(|(idx, rec)| (rec.timestamp, *idx));
        closed.into_iter().map(|(_, rec)| rec).collect()
    }

    /// Flushes every still-open record at end of input, ordered by
    /// timestamp and tie-broken by first-line index.
    pub fn finish(mut self) -> Vec<AssembledRecord> {
        let mut all: Vec<(usize, AssembledRecord)> = self.closed.drain(..).collect();
        all.extend(
            self.pending
                .into_values()
                .map(|p| (p.first_line_index, p.record)),
        );
        all.sort_by_key(|(idx, rec)| (rec.timestamp, *idx));
        all.into_iter().map(|(_, rec)| rec).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn interleaved_pids_are_reassembled_independently() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut asm = SyslogAssembler::new();
        asm.feed("Jan  2 10:00:00 host postgres[1]: LOG:  a1", now);
        asm.feed("Jan  2 10:00:00 host postgres[2]: LOG:  b1", now);
        asm.feed("Jan  2 10:00:01 host postgres[1]: \tdetail for a", now);
        asm.feed("Jan  2 10:00:01 host postgres[2]: \tdetail for b", now);

        let records = asm.finish();
        assert_eq!(records.len(), 2);
        assert!(records[0].raw.contains("a1"));
        assert!(records[0].raw.contains("detail for a"));
        assert!(records[1].raw.contains("b1"));
        assert!(records[1].raw.contains("detail for b"));
    }

    #[test]
    fn emit_order_follows_timestamp_not_line_order_across_interleaved_pids() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut asm = SyslogAssembler::new();
        // PID 42's record is logged first in the file but stamped later;
        // PID 43 interleaves a line stamped earlier. File order alone
        // would emit 42 before 43; timestamp order must reverse that.
        asm.feed("Jan  2 10:00:05 host postgres[42]: LOG:  second in time", now);
        asm.feed("Jan  2 10:00:01 host postgres[43]: LOG:  first in time", now);

        let records = asm.finish();
        assert_eq!(records.len(), 2);
        assert!(records[0].raw.contains("first in time"));
        assert!(records[1].raw.contains("second in time"));
    }

    #[test]
    fn orphan_continuation_is_reported() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut asm = SyslogAssembler::new();
        let orphan = asm.feed("Jan  2 10:00:01 host postgres[99]: \tstray detail", now);
        assert_eq!(orphan.as_deref(), Some("99"));
    }
}
