use serde::{Deserialize, Serialize};

/// What a token in a `log_line_prefix` sample has been classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenClass {
    Unknown,
    Label,
    Value,
    Separator,
    TimestampYear,
    TimestampMonth,
    TimestampDay,
    TimestampHour,
    TimestampMinute,
    TimestampSecond,
    TimestampMillisecond,
    Pid,
    SessionId,
    LogLineNumber,
    User,
    Database,
    Application,
    Host,
}

impl TokenClass {
    pub fn is_timestamp(self) -> bool {
        matches!(
            self,
            TokenClass::TimestampYear
                | TokenClass::TimestampMonth
                | TokenClass::TimestampDay
                | TokenClass::TimestampHour
                | TokenClass::TimestampMinute
                | TokenClass::TimestampSecond
                | TokenClass::TimestampMillisecond
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Word,
    NonWord,
}

/// One lexical unit of a prefix sample: a run of word characters
/// (letters/digits/underscore) or a run of non-word characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenType,
    pub value: String,
    pub class: TokenClass,
}

impl Token {
    pub fn new(kind: TokenType, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            class: TokenClass::Unknown,
        }
    }
}

/// The learned description of `log_line_prefix`, built once from a sample
/// of up to 20 lines and immutable afterward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrefixStructure {
    pub tokens: Vec<Token>,
}

impl PrefixStructure {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn position_of(&self, class: TokenClass) -> Option<usize> {
        self.tokens.iter().position(|t| t.class == class)
    }

    pub fn all_positions_of(&self, class: TokenClass) -> Vec<usize> {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.class == class)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Per-line output of applying a `PrefixStructure` to a concrete line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetadata {
    pub user: Option<String>,
    pub database: Option<String>,
    pub application: Option<String>,
    pub host: Option<String>,
    /// The verbatim prefix text a line began with, before any metadata was
    /// pulled out of it. `None` for formats (CSV, JSON) that never had an
    /// inline prefix to begin with.
    pub prefix: Option<String>,
    pub message: String,
}
