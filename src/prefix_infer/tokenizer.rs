//! Splits a raw prefix sample into alternating word / non-word runs. A
//! "word" run is letters, digits, and underscore; everything else
//! (spaces, brackets, colons, `@`, `.`) is a separator run. This is the
//! same coarse tokenization a hand-rolled `log_line_prefix` scanner would
//! use — no regex, one pass over the bytes.

use crate::domain::{Token, TokenType};

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        let word = is_word_byte(bytes[i]);
        while i < bytes.len() && is_word_byte(bytes[i]) == word {
            i += 1;
        }
        let kind = if word { TokenType::Word } else { TokenType::NonWord };
        tokens.push(Token::new(kind, &line[start..i]));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_word_and_separator_runs() {
        let tokens = tokenize("2025-01-02 10:00:00.123 [4242] user=alice@shop");
        let rendered: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(
            rendered,
            vec![
                "2025", "-", "01", "-", "02", " ", "10", ":", "00", ":", "00", ".", "123", " ",
                "[", "4242", "]", " ", "user", "=", "alice", "@", "shop"
            ]
        );
    }
}
