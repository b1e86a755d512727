//! Reverse-engineers the operator's `log_line_prefix` setting from a
//! handful of sample lines, then applies the learned structure to pull
//! `user=`/`db=`/`app=`/`host=` metadata out of every subsequent
//! stderr/syslog line.

pub mod classifier;
pub mod dictionaries;
pub mod tokenizer;

use crate::domain::{ExtractedMetadata, PrefixStructure, TokenClass, TokenType};
use crate::parser::stderr::line::find_severity_marker;
use dictionaries::Dictionaries;

/// Learns a `PrefixStructure` from up to 20 sample prefix texts (the
/// portion of each line before its severity marker), using the built-in
/// known-application dictionary.
pub fn infer_structure(samples: &[String]) -> PrefixStructure {
    infer_structure_with_dictionaries(samples, &Dictionaries::default())
}

/// Same as `infer_structure`, but scores known-application tokens against a
/// caller-supplied `Dictionaries` instead of the built-in default.
pub fn infer_structure_with_dictionaries(
    samples: &[String],
    dictionaries: &Dictionaries,
) -> PrefixStructure {
    let prefix_texts: Vec<&str> = samples
        .iter()
        .map(|raw| match find_severity_marker(raw) {
            Some(idx) => &raw[..idx],
            None => raw.as_str(),
        })
        .collect();

    let token_streams: Vec<_> = prefix_texts.iter().map(|t| tokenizer::tokenize(t)).collect();
    if token_streams.is_empty() {
        return PrefixStructure::default();
    }

    PrefixStructure::new(classifier::classify_structure_with_dictionaries(
        &token_streams,
        dictionaries,
    ))
}

/// Splits a word on `_` and matches the parts against known dictionaries,
/// for prefixes that pack `user`/`database`/`application` into one
/// underscore-joined token (e.g. `%u_%d_%a` rendered as `alice_shop_psql`).
/// Unmatched parts fill the remaining essential slots in user, database,
/// application order. Used only as the last-resort fallback when normal
/// structure alignment found nothing, per a token's own underscore split —
/// not the structure the token was learned from, since a packed token
/// never tokenizes the same way twice (underscore is a word character, so
/// ordinary tokenization never splits it on its own).
fn classify_underscore_parts(word: &str, dictionaries: &Dictionaries) -> ExtractedMetadata {
    let parts: Vec<&str> = word.split('_').collect();
    let mut user = None;
    let mut database = None;
    let mut application = None;
    let mut leftover = Vec::new();

    for part in parts {
        let is_timestamp_noise = part.bytes().all(|b| b.is_ascii_digit())
            || (part.len() <= 5 && !part.is_empty() && part.bytes().all(|b| b.is_ascii_uppercase()));
        if is_timestamp_noise {
            continue;
        }
        if application.is_none() && dictionaries.looks_like_known_application(part) {
            application = Some(part.to_string());
        } else if user.is_none() && dictionaries.looks_like_known_user(part) {
            user = Some(part.to_string());
        } else if database.is_none() && dictionaries.looks_like_known_database(part) {
            database = Some(part.to_string());
        } else {
            leftover.push(part);
        }
    }

    let mut remaining = leftover.into_iter();
    if user.is_none() {
        user = remaining.next().map(str::to_string);
    }
    if database.is_none() {
        database = remaining.next().map(str::to_string);
    }
    if application.is_none() {
        application = remaining.next().map(str::to_string);
    }

    ExtractedMetadata {
        user,
        database,
        application,
        host: None,
        prefix: None,
        message: String::new(),
    }
}

/// Applies a learned `PrefixStructure` to one raw line (the post-timestamp
/// tail handed up by the stderr assembler), splitting it into the
/// extracted metadata and the message that follows the severity marker.
/// When the line's own prefix doesn't tokenize to at least as many tokens
/// as the structure, metadata extraction is skipped and the whole line
/// becomes the message — a conservative fallback rather than guessing
/// positions we have no evidence for. If any of user/database/application
/// is still missing after that, and the prefix holds an underscore-packed
/// word, `classify_underscore_parts` gets one more try at it.
pub fn apply(structure: &PrefixStructure, raw_line: &str) -> ExtractedMetadata {
    apply_with_dictionaries(structure, raw_line, &Dictionaries::default())
}

/// Same as `apply`, but scores the underscore-split fallback against a
/// caller-supplied `Dictionaries` instead of the built-in default.
pub fn apply_with_dictionaries(
    structure: &PrefixStructure,
    raw_line: &str,
    dictionaries: &Dictionaries,
) -> ExtractedMetadata {
    let (prefix_text, message) = match find_severity_marker(raw_line) {
        Some(idx) => (&raw_line[..idx], raw_line[idx..].to_string()),
        None => (raw_line, String::new()),
    };

    let tokens = tokenizer::tokenize(prefix_text);
    let width = structure.tokens.len();
    let aligned = !structure.tokens.is_empty() && tokens.len() >= width;

    let extract = |class: TokenClass| -> Option<String> {
        if !aligned {
            return None;
        }
        let mut out = String::new();
        let mut found = false;
        for i in 0..width {
            if structure.tokens[i].class == class {
                found = true;
                out.push_str(&tokens[i].value);
            }
        }
        found.then_some(out).filter(|s| !s.is_empty())
    };

    let mut meta = ExtractedMetadata {
        user: extract(TokenClass::User),
        database: extract(TokenClass::Database),
        application: extract(TokenClass::Application),
        host: extract(TokenClass::Host),
        prefix: Some(prefix_text.to_string()),
        message: if message.is_empty() {
            prefix_text.to_string()
        } else {
            message
        },
    };

    if meta.user.is_none() || meta.database.is_none() || meta.application.is_none() {
        if let Some(packed) = tokens
            .iter()
            .find(|t| t.kind == TokenType::Word && t.value.matches('_').count() >= 2)
        {
            // A position-aligned field that resolved to the packed token
            // itself (a single `Value` slot spanning the whole word, not a
            // precise sub-part) is no more informative than having found
            // nothing — let the split win in that case too.
            let unresolved = |field: &Option<String>| match field {
                None => true,
                Some(v) => v == &packed.value,
            };
            let fallback = classify_underscore_parts(&packed.value, dictionaries);
            if unresolved(&meta.user) {
                meta.user = fallback.user;
            }
            if unresolved(&meta.database) {
                meta.database = fallback.database;
            }
            if unresolved(&meta.application) {
                meta.application = fallback.application;
            }
        }
    }

    meta
}
