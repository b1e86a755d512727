//! Per-format parsers. Each produces the raw pieces the normalizer and
//! filter stage need; only the stderr/syslog path needs a separate
//! prefix-structure inference step, since CSV and JSON already carry
//! structured fields.

pub mod csv_parser;
pub mod json_parser;
pub mod stderr;
