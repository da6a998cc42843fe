// ABOUTME: Syntax highlighter for the REPL with ANSI color support
// Implements rustyline's Highlighter trait for Jyro syntax elements

use rustyline::highlight::{CmdKind, Highlighter};
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;

// 3-bit/4-bit colors for maximum terminal compatibility
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_KEYWORD: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_DATA: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)

const KEYWORDS: &[&str] = &[
    "var", "if", "then", "elseif", "else", "end", "switch", "do", "case", "default", "while",
    "foreach", "in", "return", "break", "continue", "and", "or", "not", "is", "true", "false",
    "null", "number", "string", "boolean", "object", "array",
];

/// rustyline helper providing color highlighting for the Jyro REPL.
#[derive(Completer, Helper, Hinter, Validator, Default)]
pub struct JyroHelper;

impl JyroHelper {
    pub fn new() -> Self {
        JyroHelper
    }
}

impl Highlighter for JyroHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let highlighted = highlight_line(line);
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn highlight_line(line: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '#' => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }
            quote @ ('"' | '\'') => {
                result.push_str(COLOR_STRING);
                result.push(quote);
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        result.push(chars[i]);
                        result.push(chars[i + 1]);
                        i += 2;
                    } else if chars[i] == quote {
                        result.push(quote);
                        i += 1;
                        break;
                    } else {
                        result.push(chars[i]);
                        i += 1;
                    }
                }
                result.push_str(COLOR_RESET);
            }
            c if c.is_ascii_digit() => {
                result.push_str(COLOR_NUMBER);
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if KEYWORDS.contains(&word.as_str()) {
                    result.push_str(COLOR_KEYWORD);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if word == "Data" {
                    result.push_str(COLOR_DATA);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&word);
                }
            }
            c => {
                result.push(c);
                i += 1;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_colored() {
        let out = highlight_line("var x = 1");
        assert!(out.starts_with(COLOR_KEYWORD));
        assert!(out.contains("var"));
    }

    #[test]
    fn test_plain_identifiers_untouched() {
        assert_eq!(highlight_line("alpha beta"), "alpha beta");
    }

    #[test]
    fn test_strings_keep_content() {
        let out = highlight_line("x = \"a # b\"");
        assert!(out.contains("a # b"));
        assert!(out.contains(COLOR_STRING));
    }
}
