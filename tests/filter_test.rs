use chrono::{TimeZone, Utc};
use pglogstream::{Filter, LogEntry};

fn entry(message: &str) -> LogEntry {
    LogEntry::new(Utc.with_ymd_and_hms(2025, 1, 2, 10, 0, 0).unwrap(), message)
}

#[test]
fn time_window_excludes_entries_outside_range() {
    let filter = Filter::new().with_time_window(
        Some(Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap()),
        Some(Utc.with_ymd_and_hms(2025, 1, 2, 9, 30, 0).unwrap()),
    );
    let e = entry("user=alice,db=shop LOG:  hi");
    assert!(!pglogstream::filter_stage::passes(&e, &filter));
}

#[test]
fn db_whitelist_requires_match() {
    let filter = Filter::new().with_db_whitelist(["shop".to_string()]);
    let matching = entry("user=alice,db=shop LOG:  hi");
    let other = entry("user=alice,db=billing LOG:  hi");
    assert!(pglogstream::filter_stage::passes(&matching, &filter));
    assert!(!pglogstream::filter_stage::passes(&other, &filter));
}

#[test]
fn user_blacklist_overrides_user_whitelist() {
    let filter = Filter::new()
        .with_user_whitelist(["alice".to_string()])
        .with_user_blacklist(["alice".to_string()]);
    let e = entry("user=alice,db=shop LOG:  hi");
    assert!(!pglogstream::filter_stage::passes(&e, &filter));
}

#[test]
fn grep_all_matches_substring_in_message() {
    let filter = Filter::new().with_grep_all(["syntax error".to_string()]);
    let matching = entry("user=alice,db=shop LOG:  syntax error at or near \"x\"");
    let other = entry("user=alice,db=shop LOG:  connection received");
    assert!(pglogstream::filter_stage::passes(&matching, &filter));
    assert!(!pglogstream::filter_stage::passes(&other, &filter));
}

#[test]
fn empty_filter_passes_everything() {
    let filter = Filter::new();
    assert!(pglogstream::filter_stage::passes(&entry("anything"), &filter));
}
