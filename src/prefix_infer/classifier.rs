//! Cross-sample token classification: given the
//! same prefix tokenized across several sample lines, decide which
//! positions are literal (`Label`) versus which vary line to line
//! (`Value`), then refine `Value` positions into concrete classes using
//! bracket context, known label words, and a couple of fixed shapes
//! (dotted-quad IPv4, `user@database`).
//!
//! Classification runs in two phases. First, a fixed pipeline of detectors
//! looks for shapes that identify themselves regardless of how the prefix
//! varies from line to line (a raw timestamp run, a bracketed PID, a
//! labeled `user=` pair, an IPv4 host, …). Only once that pipeline is done
//! does cross-sample comparison run over whatever positions are still
//! `Unknown`, followed by scoring for whatever it leaves as a bare `Value`.

use crate::domain::{Token, TokenClass, TokenType};
use crate::prefix_infer::dictionaries::Dictionaries;
use std::collections::HashSet;

/// Below this fraction of distinct values across samples, a word token is
/// treated as a fixed label rather than data that varies per line. Also
/// used to break a lone leftover `Value` position toward user vs. database
/// when no dictionary match resolves it.
const UNIQUENESS_THRESHOLD: f64 = 0.35;

fn label_class(word: &str) -> Option<TokenClass> {
    match word.to_ascii_lowercase().as_str() {
        "user" | "usr" | "u" => Some(TokenClass::User),
        "db" | "database" | "d" => Some(TokenClass::Database),
        "app" | "application" | "a" => Some(TokenClass::Application),
        "proc" | "process" | "pid" | "p" => Some(TokenClass::Pid),
        _ => None,
    }
}

fn uniqueness(values: &[&str]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&str> = values.iter().copied().collect();
    distinct.len() as f64 / values.len() as f64
}

fn is_ipv4_octet(s: &str) -> bool {
    !s.is_empty() && s.len() <= 3 && s.parse::<u16>().is_ok_and(|n| n <= 255)
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Builds a classified template from tokenized samples using the built-in
/// known-application dictionary. See `classify_structure_with_dictionaries`
/// to supply a custom one.
pub fn classify_structure(samples: &[Vec<Token>]) -> Vec<Token> {
    classify_structure_with_dictionaries(samples, &Dictionaries::default())
}

/// Builds a classified template from tokenized samples. Samples with a
/// different token count than the shortest sample are truncated to that
/// width — a wildly different token count usually means a line that broke
/// mid-record, not a genuine prefix variant.
///
/// Order matters: the positional detectors below run first and claim
/// whatever shapes identify themselves outright; cross-sample comparison
/// then resolves what's left, and the V=1..V≥4 scoring rules clean up
/// whatever cross-sample comparison leaves as a bare `Value`.
pub fn classify_structure_with_dictionaries(
    samples: &[Vec<Token>],
    dictionaries: &Dictionaries,
) -> Vec<Token> {
    let width = samples.iter().map(Vec::len).min().unwrap_or(0);
    if width == 0 || samples.is_empty() {
        return Vec::new();
    }

    let mut template: Vec<Token> = samples[0][..width].to_vec();
    for slot in template.iter_mut() {
        slot.class = TokenClass::Unknown;
    }

    annotate_timestamp(&mut template);
    annotate_bracketed_pid(&mut template);
    annotate_numeric_pid(&mut template);
    annotate_session_id(&mut template);
    annotate_log_line_number(&mut template);
    annotate_labeled_values(&mut template, width);
    annotate_known_applications(&mut template, samples, width, dictionaries);
    annotate_user_at_database(&mut template);
    annotate_ipv4_host(&mut template);

    classify_by_uniqueness(&mut template, samples, width);
    annotate_remaining_values(&mut template, samples, width, dictionaries);

    template
}

/// Finds the first 4-digit all-digit word and attempts to bind the five
/// words that follow it (ignoring intervening separators) to
/// month/day/hour/minute/second, each itself a 2-digit all-digit word. A
/// sixth word of exactly 3 digits right after is bound to milliseconds.
/// At least the year plus all five clock fields must match or nothing is
/// claimed — a bare 4-digit word elsewhere (a port number, a PID) must not
/// be mistaken for a timestamp.
fn annotate_timestamp(template: &mut [Token]) {
    let word_idxs: Vec<usize> = template
        .iter()
        .enumerate()
        .filter(|(_, t)| t.kind == TokenType::Word)
        .map(|(i, _)| i)
        .collect();

    for (pos, &year_idx) in word_idxs.iter().enumerate() {
        if template[year_idx].class != TokenClass::Unknown {
            continue;
        }
        if template[year_idx].value.len() != 4 || !is_all_digits(&template[year_idx].value) {
            continue;
        }
        let remaining = &word_idxs[pos + 1..];
        if remaining.len() < 5 {
            continue;
        }
        let is_two_digit =
            |i: usize| template[i].value.len() == 2 && is_all_digits(&template[i].value);
        if !remaining[..5].iter().all(|&i| is_two_digit(i)) {
            continue;
        }

        template[year_idx].class = TokenClass::TimestampYear;
        let classes = [
            TokenClass::TimestampMonth,
            TokenClass::TimestampDay,
            TokenClass::TimestampHour,
            TokenClass::TimestampMinute,
            TokenClass::TimestampSecond,
        ];
        for (&i, class) in remaining[..5].iter().zip(classes) {
            template[i].class = class;
        }
        if let Some(&ms_idx) = remaining.get(5) {
            if template[ms_idx].value.len() == 3 && is_all_digits(&template[ms_idx].value) {
                template[ms_idx].class = TokenClass::TimestampMillisecond;
            }
        }
        return;
    }
}

/// A bracketed 4-6 digit word (`[4242]`) is the canonical PID shape.
fn annotate_bracketed_pid(template: &mut [Token]) {
    for i in 1..template.len().saturating_sub(1) {
        let is_bracketed = template[i - 1].value == "["
            && template[i + 1].value == "]"
            && template[i].kind == TokenType::Word
            && is_all_digits(&template[i].value)
            && (4..=6).contains(&template[i].value.len());
        if is_bracketed && template[i].class == TokenClass::Unknown {
            template[i].class = TokenClass::Pid;
        }
    }
}

/// A pure numeric 4-6 digit word not already classified is a PID even
/// outside bracket context — PostgreSQL's default prefix renders it bare
/// (`%p` with no surrounding punctuation in some custom prefixes).
fn annotate_numeric_pid(template: &mut [Token]) {
    for slot in template.iter_mut() {
        if slot.kind == TokenType::Word
            && slot.class == TokenClass::Unknown
            && (4..=6).contains(&slot.value.len())
            && is_all_digits(&slot.value)
        {
            slot.class = TokenClass::Pid;
        }
    }
}

/// A ≥16-char pure-hex word not already classified is a session id.
fn annotate_session_id(template: &mut [Token]) {
    for slot in template.iter_mut() {
        if slot.kind == TokenType::Word
            && slot.class == TokenClass::Unknown
            && slot.value.len() >= 16
            && slot.value.bytes().all(|b| b.is_ascii_hexdigit())
        {
            slot.class = TokenClass::SessionId;
        }
    }
}

/// A 1-4 digit word not already a timestamp or PID is a log line number
/// (`%l`) — PostgreSQL resets this counter per session, so it stays short.
fn annotate_log_line_number(template: &mut [Token]) {
    for slot in template.iter_mut() {
        if slot.kind == TokenType::Word
            && slot.class == TokenClass::Unknown
            && (1..=4).contains(&slot.value.len())
            && is_all_digits(&slot.value)
        {
            slot.class = TokenClass::LogLineNumber;
        }
    }
}

/// A word equal to `user|usr|u`, `db|database|d`, `app|application|a`, or
/// `proc|process|pid|p` (case-insensitive), followed by a non-word token
/// of `=`, `:`, or `[`, is a label; the next word after that punctuation is
/// classified according to which label it followed. This is lexical — it
/// does not depend on whether the value varies across samples, because
/// the label word itself is expected to be constant and the value isn't
/// known to vary yet at this point in the pipeline.
fn annotate_labeled_values(template: &mut [Token], width: usize) {
    for i in 0..width {
        if template[i].kind != TokenType::Word {
            continue;
        }
        let Some(target_class) = label_class(&template[i].value) else {
            continue;
        };
        let Some(eq_idx) = (i + 1..width).find(|&j| template[j].kind == TokenType::NonWord) else {
            continue;
        };
        if !matches!(template[eq_idx].value.as_str(), "=" | ":" | "[") {
            continue;
        }
        let Some(value_idx) = (eq_idx + 1..width).find(|&j| template[j].kind == TokenType::Word)
        else {
            continue;
        };
        if template[value_idx].class == TokenClass::Unknown {
            template[i].class = TokenClass::Label;
            template[value_idx].class = target_class;
        }
    }
}

/// Four 1-3 digit all-digit words separated by three `.` non-word tokens,
/// none of them already claimed by a timestamp, are an IPv4 host —
/// regardless of what an earlier, looser detector (log line number) may
/// have guessed for those same positions.
fn annotate_ipv4_host(template: &mut [Token]) {
    let mut i = 0;
    while i + 6 < template.len() {
        let is_dotted_quad = template[i].kind == TokenType::Word
            && template[i + 1].value == "."
            && template[i + 2].kind == TokenType::Word
            && template[i + 3].value == "."
            && template[i + 4].kind == TokenType::Word
            && template[i + 5].value == "."
            && template[i + 6].kind == TokenType::Word
            && [i, i + 2, i + 4, i + 6]
                .iter()
                .all(|&idx| is_ipv4_octet(&template[idx].value));
        let already_timestamp = [i, i + 2, i + 4, i + 6]
            .iter()
            .any(|&idx| template[idx].class.is_timestamp());
        if is_dotted_quad && !already_timestamp {
            for slot in &mut template[i..=i + 6] {
                slot.class = TokenClass::Host;
            }
            i += 7;
        } else {
            i += 1;
        }
    }
}

/// Exactly one `@` non-word token in the whole prefix, with a word on each
/// side: the right-hand word is database unless it was already recognized
/// as an application (by the known-apps dictionary, which runs before
/// this), in which case the left-hand word is database instead.
fn annotate_user_at_database(template: &mut [Token]) {
    let at_positions: Vec<usize> = template
        .iter()
        .enumerate()
        .filter(|(_, t)| t.kind == TokenType::NonWord && t.value == "@")
        .map(|(i, _)| i)
        .collect();
    let [i] = at_positions[..] else { return };
    if i == 0 || i + 1 >= template.len() {
        return;
    }
    let (left, right) = (i - 1, i + 1);
    if template[left].kind != TokenType::Word || template[right].kind != TokenType::Word {
        return;
    }
    if template[right].class == TokenClass::Application {
        if template[left].class == TokenClass::Unknown {
            template[left].class = TokenClass::Database;
        }
    } else if template[left].class == TokenClass::Unknown
        && template[right].class == TokenClass::Unknown
    {
        template[left].class = TokenClass::User;
        template[right].class = TokenClass::Database;
    }
}

/// Any still-unclassified word whose lowercased form is in the built-in
/// known-application set, starts with `pg_`/`pg-`, or contains `psql`, is
/// an application — checked against every sample's value at that
/// position, since the application name itself can vary line to line.
fn annotate_known_applications(
    template: &mut [Token],
    samples: &[Vec<Token>],
    width: usize,
    dictionaries: &Dictionaries,
) {
    for i in 0..width {
        if template[i].class != TokenClass::Unknown {
            continue;
        }
        let any_known = samples
            .iter()
            .any(|s| dictionaries.looks_like_known_application(&s[i].value));
        if any_known {
            template[i].class = TokenClass::Application;
        }
    }
}

/// Runs once the detector pipeline above has claimed everything it
/// recognizes positionally. For each position still `Unknown`: a non-word
/// with a single value across every sample is a separator; a word that's
/// constant across every sample is a label; a word that varies is a
/// value, to be resolved by `annotate_remaining_values`.
fn classify_by_uniqueness(template: &mut [Token], samples: &[Vec<Token>], width: usize) {
    for i in 0..width {
        if template[i].class != TokenClass::Unknown {
            continue;
        }
        let values: Vec<&str> = samples.iter().map(|s| s[i].value.as_str()).collect();
        let distinct: HashSet<&str> = values.iter().copied().collect();
        template[i].class = if template[i].kind == TokenType::NonWord {
            if distinct.len() == 1 {
                TokenClass::Separator
            } else {
                continue;
            }
        } else if distinct.len() == 1 {
            TokenClass::Label
        } else {
            TokenClass::Value
        };
    }
}

/// Resolves whatever `Value` positions survive every other detector, per
/// the V=1..V≥4 scoring rules. `V=1` checks the known-user/-database/
/// -application dictionaries before falling back to the uniqueness-ratio
/// heuristic; `V=2` defaults to `[user, database]` but swaps when a
/// dictionary hit disagrees; `V=3` defaults to `[user, database,
/// application]` but reorders when dictionary lookups unambiguously place
/// app and db elsewhere; `V≥4` fixes the first two positions to user/
/// database and searches the rest for a known-app hit, else falls back to
/// the third position.
fn annotate_remaining_values(
    template: &mut [Token],
    samples: &[Vec<Token>],
    width: usize,
    dictionaries: &Dictionaries,
) {
    let value_positions: Vec<usize> = (0..width)
        .filter(|&i| template[i].class == TokenClass::Value)
        .collect();
    let values_at = |i: usize| -> Vec<&str> { samples.iter().map(|s| s[i].value.as_str()).collect() };
    let any_user = |i: usize| values_at(i).iter().any(|v| dictionaries.looks_like_known_user(v));
    let any_db = |i: usize| values_at(i).iter().any(|v| dictionaries.looks_like_known_database(v));
    let any_app =
        |i: usize| values_at(i).iter().any(|v| dictionaries.looks_like_known_application(v));

    if value_positions.is_empty() {
        return;
    }

    if value_positions.len() == 1 {
        let i = value_positions[0];
        template[i].class = if any_user(i) {
            TokenClass::User
        } else if any_db(i) {
            TokenClass::Database
        } else if any_app(i) {
            TokenClass::Application
        } else if uniqueness(&values_at(i)) >= UNIQUENESS_THRESHOLD {
            TokenClass::User
        } else {
            TokenClass::Database
        };
        return;
    }

    if value_positions.len() == 2 {
        let (a, b) = (value_positions[0], value_positions[1]);
        let swap = any_db(a) || any_user(b);
        if swap {
            template[a].class = TokenClass::Database;
            template[b].class = TokenClass::User;
        } else {
            template[a].class = TokenClass::User;
            template[b].class = TokenClass::Database;
        }
        return;
    }

    if value_positions.len() == 3 {
        let positions = [value_positions[0], value_positions[1], value_positions[2]];
        let app_idx = positions.iter().position(|&p| any_app(p));
        let db_idx = positions.iter().position(|&p| any_db(p));
        if let (Some(ai), Some(di)) = (app_idx, db_idx) {
            if ai != di {
                let user_idx = (0..3).find(|k| *k != ai && *k != di).unwrap();
                template[positions[ai]].class = TokenClass::Application;
                template[positions[di]].class = TokenClass::Database;
                template[positions[user_idx]].class = TokenClass::User;
                return;
            }
        }
        template[positions[0]].class = TokenClass::User;
        template[positions[1]].class = TokenClass::Database;
        template[positions[2]].class = TokenClass::Application;
        return;
    }

    template[value_positions[0]].class = TokenClass::User;
    template[value_positions[1]].class = TokenClass::Database;
    let rest = &value_positions[2..];
    let app_pos = rest.iter().copied().find(|&i| any_app(i));
    match app_pos {
        Some(i) => template[i].class = TokenClass::Application,
        None => template[value_positions[2]].class = TokenClass::Application,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix_infer::tokenizer::tokenize;

    #[test]
    fn classifies_bracketed_pid_and_label_value_pairs() {
        let samples: Vec<Vec<Token>> = vec![
            tokenize("[4242]: user=alice,db=shop "),
            tokenize("[4300]: user=bob,db=billing "),
            tokenize("[4301]: user=carol,db=shop "),
        ];
        let template = classify_structure(&samples);
        assert!(template.iter().any(|t| t.class == TokenClass::Pid));
        assert!(template.iter().any(|t| t.class == TokenClass::User));
        assert!(template.iter().any(|t| t.class == TokenClass::Database));
    }

    #[test]
    fn classifies_dotted_quad_as_host() {
        let samples: Vec<Vec<Token>> = vec![
            tokenize("[4242] host=10.0.0.1 "),
            tokenize("[4300] host=10.0.0.2 "),
        ];
        let template = classify_structure(&samples);
        let host_count = template.iter().filter(|t| t.class == TokenClass::Host).count();
        assert_eq!(host_count, 7);
    }

    #[test]
    fn classifies_positional_user_at_database() {
        let samples: Vec<Vec<Token>> = vec![tokenize("alice@shop "), tokenize("bob@billing ")];
        let template = classify_structure(&samples);
        assert_eq!(template[0].class, TokenClass::User);
        assert_eq!(template[2].class, TokenClass::Database);
    }

    #[test]
    fn recognizes_raw_timestamp_tokens_positionally() {
        let samples: Vec<Vec<Token>> = vec![
            tokenize("2025-01-02-10-05-30 [4242] "),
            tokenize("2025-03-04-11-06-31 [4300] "),
        ];
        let template = classify_structure(&samples);
        assert_eq!(template[0].class, TokenClass::TimestampYear);
        assert_eq!(template[2].class, TokenClass::TimestampMonth);
        assert_eq!(template[4].class, TokenClass::TimestampDay);
        assert_eq!(template[6].class, TokenClass::TimestampHour);
        assert_eq!(template[8].class, TokenClass::TimestampMinute);
        assert_eq!(template[10].class, TokenClass::TimestampSecond);
    }

    #[test]
    fn recognizes_session_id_and_log_line_number() {
        let samples: Vec<Vec<Token>> = vec![
            tokenize("[4242] 5b3f2a1c9d8e7f60 3 "),
            tokenize("[4300] a1b2c3d4e5f60718 4 "),
        ];
        let template = classify_structure(&samples);
        assert!(template.iter().any(|t| t.class == TokenClass::SessionId));
        assert!(template.iter().any(|t| t.class == TokenClass::LogLineNumber));
    }

    #[test]
    fn detector_pipeline_runs_before_uniqueness_split() {
        // A session id varies line to line just like an ordinary value
        // would; if cross-sample classification ran first, it would be
        // exposed to the uniqueness split and misread as a database name
        // instead of being claimed by the session-id detector.
        let samples: Vec<Vec<Token>> = vec![
            tokenize("[100] 0123456789abcdef0 "),
            tokenize("[101] fedcba9876543210f "),
        ];
        let template = classify_structure(&samples);
        assert!(template.iter().any(|t| t.class == TokenClass::SessionId));
        assert!(!template.iter().any(|t| t.class == TokenClass::Database));
    }
}
