//! Build-time-validated static regex patterns, shared by the content
//! validators (`is_log`, `is_csv`) and the RFC5424/ISO-offset syslog header
//! matchers. A `StaticRegexSet` compiles once behind a `OnceLock`, indexed
//! by a build-generated constant.

use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum RegexError {
    #[error("regex compilation failed for pattern '{pattern}' (name: {name}): {source}")]
    CompilationFailed {
        pattern: String,
        name: String,
        #[source]
        source: regex::Error,
    },
    #[error("regex index out of bounds: {index} >= {max}")]
    IndexOutOfBounds { index: usize, max: usize },
    #[error("regex pattern not found: {name}")]
    PatternNotFound { name: String },
}

pub struct StaticRegexSet {
    patterns: &'static [(&'static str, &'static str)],
    compiled: OnceLock<Result<Vec<regex::Regex>, RegexError>>,
}

impl StaticRegexSet {
    pub const fn new(patterns: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            patterns,
            compiled: OnceLock::new(),
        }
    }

    fn compiled(&self) -> &Result<Vec<regex::Regex>, RegexError> {
        self.compiled.get_or_init(|| {
            let mut regexes = Vec::with_capacity(self.patterns.len());
            for (pattern, name) in self.patterns {
                match regex::Regex::new(pattern) {
                    Ok(re) => regexes.push(re),
                    Err(source) => {
                        return Err(RegexError::CompilationFailed {
                            pattern: pattern.to_string(),
                            name: name.to_string(),
                            source,
                        });
                    }
                }
            }
            Ok(regexes)
        })
    }

    pub fn get(&self, index: usize) -> Result<&regex::Regex, RegexError> {
        match self.compiled() {
            Ok(regexes) => regexes.get(index).ok_or(RegexError::IndexOutOfBounds {
                index,
                max: regexes.len(),
            }),
            Err(e) => Err(e.clone()),
        }
    }

    pub fn get_by_name(&self, name: &str) -> Result<&regex::Regex, RegexError> {
        let index = self
            .patterns
            .iter()
            .position(|(_, pattern_name)| *pattern_name == name)
            .ok_or_else(|| RegexError::PatternNotFound {
                name: name.to_string(),
            })?;
        self.get(index)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_and_indexes() {
        static SET: StaticRegexSet =
            StaticRegexSet::new(&[(r"^\d{4}-\d{2}-\d{2}", "date"), (r"^LOG:", "log_marker")]);
        assert!(SET.get(0).unwrap().is_match("2025-01-02"));
        assert!(SET.get_by_name("log_marker").unwrap().is_match("LOG: hi"));
        assert!(SET.get_by_name("nope").is_err());
    }

    #[test]
    fn invalid_pattern_reports_compilation_error() {
        static SET: StaticRegexSet = StaticRegexSet::new(&[(r"[invalid", "broken")]);
        assert!(matches!(
            SET.get(0),
            Err(RegexError::CompilationFailed { .. })
        ));
    }
}
