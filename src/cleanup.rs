//! Post-recognition text cleanup
//!
//! Recognizers emit typographic characters and uneven whitespace that make
//! notes awkward to edit. Cleanup is pure and tolerates any input, including
//! the empty string.

use regex::Regex;
use std::sync::LazyLock;

/// Typographic characters replaced with their plain-text spelling
const REPLACEMENTS: &[(&str, &str)] = &[
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{201C}", "\""),
    ("\u{201D}", "\""),
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{2026}", "..."),
];

static RE_CRLF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n").unwrap());
static RE_BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Clean raw recognizer output.
///
/// Substitutes typographic characters, normalizes line endings, collapses
/// three or more newlines into one blank line and runs of spaces or tabs
/// into a single space, trims, then drops commas between digits
/// (`1,000` becomes `1000`).
pub fn fix_ocr_errors(text: &str) -> String {
    let text = replace_typographic(text);
    let text = normalize_whitespace(&text);
    strip_digit_separators(&text)
}

fn replace_typographic(text: &str) -> String {
    REPLACEMENTS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

fn normalize_whitespace(text: &str) -> String {
    let text = RE_CRLF.replace_all(text, "\n");
    let text = RE_BLANK_LINES.replace_all(&text, "\n\n");
    let text = RE_SPACE_RUNS.replace_all(&text, " ");
    text.trim().to_string()
}

/// Remove every comma with a digit on both sides
fn strip_digit_separators(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        let between_digits = c == ','
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
        if !between_digits {
            out.push(c);
        }
    }

    out
}
