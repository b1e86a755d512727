use pglogstream::detect::{detect, ParserKind};
use std::path::PathBuf;

#[test]
fn detects_json_from_content_without_extension() {
    let mut cursor = std::io::Cursor::new(
        br#"{"time":"2025-01-02 10:00:00 UTC","message":"hi"}"#.to_vec(),
    );
    let (kind, _) = detect(&PathBuf::from("stdin"), &mut cursor).unwrap();
    assert_eq!(kind, ParserKind::Json);
}

#[test]
fn detects_csv_from_extension_and_content_agreement() {
    let mut cursor = std::io::Cursor::new(
        b"\"2025-01-02 10:00:00 UTC\",\"alice\",\"shop\",42,,,,,,,,,\"LOG\",,\"hi\"\n".to_vec(),
    );
    let (kind, _) = detect(&PathBuf::from("postgresql.csv"), &mut cursor).unwrap();
    assert_eq!(kind, ParserKind::Csv);
}

#[test]
fn detects_stderr_from_content() {
    let mut cursor = std::io::Cursor::new(
        b"2025-01-02 10:00:00.123 UTC [42]: LOG:  connection received\n".to_vec(),
    );
    let (kind, _) = detect(&PathBuf::from("postgresql.log"), &mut cursor).unwrap();
    assert_eq!(kind, ParserKind::Stderr);
}

#[test]
fn rejects_binary_content() {
    let mut cursor = std::io::Cursor::new(b"\x00\x01\x02\x03garbage".to_vec());
    let err = detect(&PathBuf::from("stdin"), &mut cursor).unwrap_err();
    assert!(matches!(err, pglogstream::SourceError::Binary));
}
