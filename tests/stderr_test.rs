use chrono::Utc;
use pglogstream::parser::stderr;

#[test]
fn assembles_plain_mode_continuation_lines() {
    let input = "2025-01-02 10:00:00.123 UTC [42]: LOG:  statement error\n\
                 \tDETAIL:  further detail on the next line\n\
                 2025-01-02 10:00:01.000 UTC [42]: LOG:  next statement\n";
    let outcome = stderr::parse(std::io::Cursor::new(input), Utc::now()).unwrap();
    assert_eq!(outcome.entries.len(), 2);
    assert!(outcome.entries[0].raw.contains("further detail"));
}

#[test]
fn assembles_syslog_mode_interleaved_backends_by_pid() {
    let input = "Jan  2 10:00:00 dbhost postgres[100]: [1-1] LOG:  backend 100 line 1\n\
                 Jan  2 10:00:00 dbhost postgres[200]: [1-1] LOG:  backend 200 line 1\n\
                 Jan  2 10:00:01 dbhost postgres[100]: [1-2]     continuation for 100\n";
    let outcome = stderr::parse(std::io::Cursor::new(input), Utc::now()).unwrap();
    assert_eq!(outcome.entries.len(), 2);
    let backend_100 = outcome
        .entries
        .iter()
        .find(|r| r.raw.contains("backend 100"))
        .unwrap();
    assert!(backend_100.raw.contains("continuation for 100"));
}
