// ABOUTME: Lexer turning Jyro source into spanned tokens using nom combinators

use crate::diagnostics::{Diagnostic, MessageCode, Span, Stage};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, hex_digit1},
    combinator::{opt, recognize, value},
    IResult, Parser,
};

/// Reserved words of the surface grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Var,
    If,
    Then,
    Elseif,
    Else,
    End,
    Switch,
    Do,
    Case,
    Default,
    While,
    Foreach,
    In,
    Return,
    Break,
    Continue,
    And,
    Or,
    Not,
    Is,
    True,
    False,
    Null,
    Number,
    String,
    Boolean,
    Object,
    Array,
}

impl Keyword {
    pub fn from_ident(text: &str) -> Option<Keyword> {
        let kw = match text {
            "var" => Keyword::Var,
            "if" => Keyword::If,
            "then" => Keyword::Then,
            "elseif" => Keyword::Elseif,
            "else" => Keyword::Else,
            "end" => Keyword::End,
            "switch" => Keyword::Switch,
            "do" => Keyword::Do,
            "case" => Keyword::Case,
            "default" => Keyword::Default,
            "while" => Keyword::While,
            "foreach" => Keyword::Foreach,
            "in" => Keyword::In,
            "return" => Keyword::Return,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "not" => Keyword::Not,
            "is" => Keyword::Is,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "number" => Keyword::Number,
            "string" => Keyword::String,
            "boolean" => Keyword::Boolean,
            "object" => Keyword::Object,
            "array" => Keyword::Array,
            _ => return None,
        };
        Some(kw)
    }

    pub fn text(self) -> &'static str {
        match self {
            Keyword::Var => "var",
            Keyword::If => "if",
            Keyword::Then => "then",
            Keyword::Elseif => "elseif",
            Keyword::Else => "else",
            Keyword::End => "end",
            Keyword::Switch => "switch",
            Keyword::Do => "do",
            Keyword::Case => "case",
            Keyword::Default => "default",
            Keyword::While => "while",
            Keyword::Foreach => "foreach",
            Keyword::In => "in",
            Keyword::Return => "return",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::And => "and",
            Keyword::Or => "or",
            Keyword::Not => "not",
            Keyword::Is => "is",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::Number => "number",
            Keyword::String => "string",
            Keyword::Boolean => "boolean",
            Keyword::Object => "object",
            Keyword::Array => "array",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Keyword(Keyword),
    Number(f64),
    Str(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Question,
    Colon,
    Dot,
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Eof,
}

impl TokenKind {
    /// Short description used in parser diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier '{}'", name),
            TokenKind::Keyword(kw) => format!("'{}'", kw.text()),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::Assign => "=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            _ => "?",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

// ============================================================================
// nom token parsers
// ============================================================================

/// Identifier: letter or underscore followed by alphanumerics/underscores.
fn lex_identifier(input: &str) -> IResult<&str, &str> {
    recognize((
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// Number literal: decimal with optional fraction, or `0x…` / `0b…`.
/// Unary minus is a separate token.
fn lex_number(input: &str) -> IResult<&str, f64> {
    alt((lex_hex, lex_binary, lex_decimal)).parse(input)
}

fn lex_hex(input: &str) -> IResult<&str, f64> {
    let (input, _) = tag("0x")(input)?;
    let (input, digits) = hex_digit1(input)?;
    let n = digits
        .chars()
        .fold(0.0, |acc, c| acc * 16.0 + c.to_digit(16).unwrap_or(0) as f64);
    Ok((input, n))
}

fn lex_binary(input: &str) -> IResult<&str, f64> {
    let (input, _) = tag("0b")(input)?;
    let (input, digits) = take_while1(|c| c == '0' || c == '1')(input)?;
    let n = digits
        .chars()
        .fold(0.0, |acc, c| acc * 2.0 + c.to_digit(2).unwrap_or(0) as f64);
    Ok((input, n))
}

fn lex_decimal(input: &str) -> IResult<&str, f64> {
    let (input, text) = recognize((digit1, opt((char('.'), digit1)))).parse(input)?;
    Ok((input, text.parse().unwrap_or(0.0)))
}

fn lex_operator(input: &str) -> IResult<&str, TokenKind> {
    alt((
        alt((
            value(TokenKind::EqEq, tag("==")),
            value(TokenKind::NotEq, tag("!=")),
            value(TokenKind::Le, tag("<=")),
            value(TokenKind::Ge, tag(">=")),
            value(TokenKind::PlusAssign, tag("+=")),
            value(TokenKind::MinusAssign, tag("-=")),
            value(TokenKind::StarAssign, tag("*=")),
            value(TokenKind::SlashAssign, tag("/=")),
            value(TokenKind::Assign, tag("=")),
            value(TokenKind::Lt, tag("<")),
            value(TokenKind::Gt, tag(">")),
        )),
        alt((
            value(TokenKind::Plus, tag("+")),
            value(TokenKind::Minus, tag("-")),
            value(TokenKind::Star, tag("*")),
            value(TokenKind::Slash, tag("/")),
            value(TokenKind::Percent, tag("%")),
            value(TokenKind::Question, tag("?")),
            value(TokenKind::Colon, tag(":")),
            value(TokenKind::Dot, tag(".")),
            value(TokenKind::Comma, tag(",")),
            value(TokenKind::Semicolon, tag(";")),
        )),
        alt((
            value(TokenKind::LParen, tag("(")),
            value(TokenKind::RParen, tag(")")),
            value(TokenKind::LBracket, tag("[")),
            value(TokenKind::RBracket, tag("]")),
            value(TokenKind::LBrace, tag("{")),
            value(TokenKind::RBrace, tag("}")),
        )),
    ))
    .parse(input)
}

// ============================================================================
// Lexer driver
// ============================================================================

struct Lexer<'a> {
    rest: &'a str,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Lexer {
            rest: source,
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> Span {
        Span::new(self.line, self.column)
    }

    /// Consumes `count` bytes from the front of `rest`, updating line/column.
    fn advance(&mut self, count: usize) {
        let consumed = &self.rest[..count];
        for c in consumed.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.rest = &self.rest[count..];
    }

    /// Skips whitespace and `#` line comments.
    fn skip_trivia(&mut self) {
        loop {
            let before = self.rest.len();
            let ws: usize = self
                .rest
                .chars()
                .take_while(|c| c.is_whitespace())
                .map(char::len_utf8)
                .sum();
            self.advance(ws);
            if self.rest.starts_with('#') {
                let comment: usize = self
                    .rest
                    .chars()
                    .take_while(|&c| c != '\n')
                    .map(char::len_utf8)
                    .sum();
                self.advance(comment);
            }
            if self.rest.len() == before {
                break;
            }
        }
    }

    fn error(&self, code: MessageCode, span: Span, args: Vec<String>) -> Diagnostic {
        Diagnostic::error(code, Stage::Lexing, span, args)
    }

    /// Decodes a quoted string starting at `rest[0]` (the opening quote).
    fn lex_string(&mut self, quote: char) -> Result<String, Diagnostic> {
        let start = self.position();
        let mut decoded = String::new();
        let source = self.rest;
        let mut chars = source.char_indices();
        chars.next(); // opening quote
        while let Some((offset, c)) = chars.next() {
            if c == quote {
                self.advance(offset + quote.len_utf8());
                return Ok(decoded);
            }
            if c == '\n' {
                return Err(self.error(MessageCode::UnterminatedString, start, vec![]));
            }
            if c != '\\' {
                decoded.push(c);
                continue;
            }
            match chars.next() {
                Some((_, 'n')) => decoded.push('\n'),
                Some((_, 'r')) => decoded.push('\r'),
                Some((_, 't')) => decoded.push('\t'),
                Some((_, 'b')) => decoded.push('\u{0008}'),
                Some((_, 'f')) => decoded.push('\u{000C}'),
                Some((_, '\\')) => decoded.push('\\'),
                Some((_, '/')) => decoded.push('/'),
                Some((_, '"')) => decoded.push('"'),
                Some((_, '\'')) => decoded.push('\''),
                Some((_, 'u')) => {
                    let mut code = 0u32;
                    for _ in 0..4 {
                        match chars.next().and_then(|(_, h)| h.to_digit(16)) {
                            Some(digit) => code = code * 16 + digit,
                            None => {
                                return Err(self.error(
                                    MessageCode::InvalidEscape,
                                    start,
                                    vec!["u".to_string()],
                                ));
                            }
                        }
                    }
                    match char::from_u32(code) {
                        Some(decoded_char) => decoded.push(decoded_char),
                        None => {
                            return Err(self.error(
                                MessageCode::InvalidEscape,
                                start,
                                vec!["u".to_string()],
                            ));
                        }
                    }
                }
                Some((_, other)) => {
                    return Err(self.error(
                        MessageCode::InvalidEscape,
                        start,
                        vec![other.to_string()],
                    ));
                }
                None => {
                    return Err(self.error(MessageCode::UnterminatedString, start, vec![]));
                }
            }
        }
        Err(self.error(MessageCode::UnterminatedString, start, vec![]))
    }

    fn next_token(&mut self) -> Result<Option<Token>, Diagnostic> {
        self.skip_trivia();
        let span = self.position();
        let Some(first) = self.rest.chars().next() else {
            return Ok(None);
        };

        if first == '"' || first == '\'' {
            let text = self.lex_string(first)?;
            return Ok(Some(Token {
                kind: TokenKind::Str(text),
                span,
            }));
        }

        if first.is_ascii_digit() {
            if let Ok((rest, n)) = lex_number(self.rest) {
                let consumed = self.rest.len() - rest.len();
                self.advance(consumed);
                return Ok(Some(Token {
                    kind: TokenKind::Number(n),
                    span,
                }));
            }
        }

        if first.is_ascii_alphabetic() || first == '_' {
            if let Ok((rest, text)) = lex_identifier(self.rest) {
                let consumed = self.rest.len() - rest.len();
                let kind = match Keyword::from_ident(text) {
                    Some(kw) => TokenKind::Keyword(kw),
                    None => TokenKind::Identifier(text.to_string()),
                };
                self.advance(consumed);
                return Ok(Some(Token { kind, span }));
            }
        }

        if let Ok((rest, kind)) = lex_operator(self.rest) {
            let consumed = self.rest.len() - rest.len();
            self.advance(consumed);
            return Ok(Some(Token { kind, span }));
        }

        Err(self.error(
            MessageCode::UnexpectedCharacter,
            span,
            vec![first.to_string()],
        ))
    }
}

/// Tokenizes a whole script. A trailing `Eof` token carries the position
/// just past the last character so the parser always has a span to report.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Diagnostic> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: lexer.position(),
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let toks = kinds("var total = Data");
        assert_eq!(
            toks,
            vec![
                TokenKind::Keyword(Keyword::Var),
                TokenKind::Identifier("total".into()),
                TokenKind::Assign,
                TokenKind::Identifier("Data".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 3.25 0x1F 0b101"),
            vec![
                TokenKind::Number(42.0),
                TokenKind::Number(3.25),
                TokenKind::Number(31.0),
                TokenKind::Number(5.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\nb\t\"c\" A""#),
            vec![TokenKind::Str("a\nb\t\"c\" A".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_single_quoted_string() {
        assert_eq!(
            kinds("'it\\'s'"),
            vec![TokenKind::Str("it's".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("\"abc").unwrap_err();
        assert_eq!(err.code, MessageCode::UnterminatedString);
        assert_eq!(err.stage, Stage::Lexing);
    }

    #[test]
    fn test_comments_and_positions() {
        let tokens = tokenize("# header\nx = 1").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier("x".into()));
        assert_eq!(tokens[0].span, Span::new(2, 1));
        assert_eq!(tokens[2].span, Span::new(2, 5));
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("== != <= >= += -="),
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::PlusAssign,
                TokenKind::MinusAssign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("a @ b").unwrap_err();
        assert_eq!(err.code, MessageCode::UnexpectedCharacter);
        assert_eq!(err.args, vec!["@".to_string()]);
    }

    #[test]
    fn test_minus_is_separate_from_number() {
        assert_eq!(
            kinds("-5"),
            vec![TokenKind::Minus, TokenKind::Number(5.0), TokenKind::Eof]
        );
    }
}
