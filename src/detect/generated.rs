//! Pulls in the regex patterns validated by `build.rs` at compile time.

include!(concat!(env!("OUT_DIR"), "/validated_regexes.rs"));
