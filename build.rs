// Build-time regex pattern validation for the detection/validator layer.
use regex::Regex;
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::Write;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");

    // Patterns used by `is_log` (spec.md §4.1) adopt the superset noted in
    // §9's Open Question: the source repeats this list with slight
    // variations across versions (RFC5424 and ISO-with-offset were added
    // later); we keep the union rather than picking one generation.
    let patterns = &[
        (
            r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(\.\d+)?( [A-Za-z]{2,5})? .*?(LOG|ERROR|WARNING|NOTICE|DEBUG[1-5]?|FATAL|PANIC|INFO|HINT|DETAIL|STATEMENT|CONTEXT):",
            "log_iso_severity",
        ),
        (
            r"^[A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}.*postgres(\[\d+\])?.*?(LOG|ERROR|WARNING|NOTICE|DEBUG[1-5]?|FATAL|PANIC):",
            "log_bsd_syslog_severity",
        ),
        (
            r"^\d{10,13}\b.*?(LOG|ERROR|WARNING|NOTICE|FATAL|PANIC):",
            "log_epoch_severity",
        ),
        (
            r"^\d{4}-\d{2}-\d{2}.*?(LOG|ERROR):",
            "log_minimal_iso_severity",
        ),
        (
            r"^<\d{1,3}>\d+\s+\S+\s+\S+\s+\S+",
            "log_rfc5424_header",
        ),
        (
            r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?[+-]\d{2}:\d{2}\s",
            "log_iso_offset_header",
        ),
        (
            r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(\.\d+)?( [A-Za-z]{2,5})?",
            "csv_timestamp_field",
        ),
    ];

    println!("cargo:info=Starting regex pattern validation...");

    let mut valid_patterns = Vec::new();
    let mut invalid_patterns = Vec::new();

    for &(pattern, name) in patterns {
        match Regex::new(pattern) {
            Ok(_) => valid_patterns.push((pattern, name)),
            Err(e) => invalid_patterns.push((pattern, name, e)),
        }
    }

    if !invalid_patterns.is_empty() {
        let mut error_msg = String::from("Build failed due to invalid regex patterns:\n");
        for (pattern, name, error) in &invalid_patterns {
            writeln!(error_msg, "  - '{name}': {error} (pattern: {pattern})").unwrap();
        }
        panic!("{error_msg}");
    }

    if let Err(e) = generate_validated_regexes(&valid_patterns) {
        panic!("Failed to generate regex patterns: {e}");
    }

    println!(
        "cargo:info=All {} regex patterns validated successfully",
        valid_patterns.len()
    );
}

fn generate_validated_regexes(patterns: &[(&str, &str)]) -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::var("OUT_DIR")?;
    let dest_path = std::path::Path::new(&out_dir).join("validated_regexes.rs");
    let mut file = File::create(dest_path)?;

    writeln!(file, "// Auto-generated regex patterns (validated by build.rs)")?;
    writeln!(file, "use crate::detect::patterns::StaticRegexSet;")?;
    writeln!(file)?;
    writeln!(file, "pub static VALIDATED_PATTERNS: StaticRegexSet = StaticRegexSet::new(&[")?;
    for (pattern, name) in patterns {
        if pattern.contains('"') {
            writeln!(file, "    (r#\"{pattern}\"#, \"{name}\"),")?;
        } else {
            writeln!(file, "    (r\"{pattern}\", \"{name}\"),")?;
        }
    }
    writeln!(file, "]);")?;
    writeln!(file)?;

    writeln!(file, "pub mod pattern_index {{")?;
    for (i, (_, name)) in patterns.iter().enumerate() {
        writeln!(file, "    pub const {}: usize = {i};", name.to_uppercase())?;
    }
    writeln!(file, "}}")?;

    Ok(())
}
