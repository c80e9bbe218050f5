//! Token view of the statement text before the cursor.
//!
//! The `sqlparser` tokenizer handles the dialect details (escapes, dollar
//! quotes, national strings). When it rejects partial input, a small lexer
//! over the masked text takes over so the resolver always has tokens.

use sqlparser::tokenizer::{Token, Tokenizer};

use super::keywords::is_reserved;
use super::scanner::is_ident_char;
use crate::types::Dialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LexKind {
    /// Reserved word, text uppercased.
    Keyword,
    /// Identifier with quotes stripped. `*` used as a column wildcard is an identifier too.
    Ident,
    Literal,
    Comma,
    LParen,
    RParen,
    Period,
    DoubleColon,
    Comparison,
    Operator,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lexeme {
    pub kind: LexKind,
    pub text: String,
}

impl Lexeme {
    fn new(kind: LexKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub(crate) fn is_keyword(&self, word: &str) -> bool {
        self.kind == LexKind::Keyword && self.text == word
    }

    pub(crate) fn is_keyword_in(&self, words: &[&str]) -> bool {
        self.kind == LexKind::Keyword && words.contains(&self.text.as_str())
    }

    /// A complete operand: identifier, literal or closed group.
    pub(crate) fn is_operand(&self) -> bool {
        matches!(self.kind, LexKind::Ident | LexKind::Literal | LexKind::RParen)
    }

    /// Tokens after which a new operand starts.
    pub(crate) fn is_delimiter(&self) -> bool {
        matches!(
            self.kind,
            LexKind::Comma
                | LexKind::LParen
                | LexKind::Comparison
                | LexKind::Operator
                | LexKind::DoubleColon
        )
    }
}

/// Tokenizes `text`, falling back to [`lex_masked`] on `masked` (same
/// offsets, literals blanked) when the tokenizer fails.
pub(crate) fn lex(text: &str, masked: &str, dialect: Dialect) -> Vec<Lexeme> {
    let sql_dialect = dialect.to_sqlparser_dialect();
    let mut tokenizer = Tokenizer::new(sql_dialect.as_ref(), text);
    match tokenizer.tokenize() {
        Ok(tokens) => {
            let mut out: Vec<Lexeme> = Vec::with_capacity(tokens.len());
            for token in &tokens {
                if let Some(lexeme) = classify_token(token, out.last()) {
                    out.push(lexeme);
                }
            }
            out
        }
        Err(_) => lex_masked(masked),
    }
}

fn classify_token(token: &Token, previous: Option<&Lexeme>) -> Option<Lexeme> {
    let lexeme = match token {
        Token::Whitespace(_) => return None,
        Token::Word(word) => {
            if word.quote_style.is_none() && is_reserved(&word.value) {
                Lexeme::new(LexKind::Keyword, word.value.to_ascii_uppercase())
            } else {
                Lexeme::new(LexKind::Ident, word.value.clone())
            }
        }
        Token::Number(_, _)
        | Token::SingleQuotedString(_)
        | Token::NationalStringLiteral(_)
        | Token::EscapedStringLiteral(_)
        | Token::HexStringLiteral(_) => Lexeme::new(LexKind::Literal, token.to_string()),
        // MySQL reads "..." as a string literal.
        Token::DoubleQuotedString(_) => Lexeme::new(LexKind::Literal, token.to_string()),
        Token::Comma => Lexeme::new(LexKind::Comma, ","),
        Token::LParen => Lexeme::new(LexKind::LParen, "("),
        Token::RParen => Lexeme::new(LexKind::RParen, ")"),
        Token::Period => Lexeme::new(LexKind::Period, "."),
        Token::DoubleColon => Lexeme::new(LexKind::DoubleColon, "::"),
        Token::Eq | Token::Neq | Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => {
            Lexeme::new(LexKind::Comparison, token.to_string())
        }
        Token::Mul if is_wildcard_position(previous) => Lexeme::new(LexKind::Ident, "*"),
        Token::Plus | Token::Minus | Token::Mul | Token::Div | Token::Mod | Token::StringConcat => {
            Lexeme::new(LexKind::Operator, token.to_string())
        }
        other => Lexeme::new(LexKind::Other, other.to_string()),
    };
    Some(lexeme)
}

fn is_wildcard_position(previous: Option<&Lexeme>) -> bool {
    match previous {
        None => true,
        Some(lexeme) => {
            matches!(
                lexeme.kind,
                LexKind::Comma | LexKind::Period | LexKind::LParen
            ) || lexeme.is_keyword_in(&["SELECT", "DISTINCT", "ALL"])
        }
    }
}

/// Minimal lexer over masked text (string and comment bodies are spaces).
pub(crate) fn lex_masked(masked: &str) -> Vec<Lexeme> {
    let chars: Vec<char> = masked.chars().collect();
    let mut out: Vec<Lexeme> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        if ch.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                i += 1;
            }
            out.push(Lexeme::new(
                LexKind::Literal,
                chars[start..i].iter().collect::<String>(),
            ));
            continue;
        }

        if is_ident_char(ch) {
            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let kind = if is_reserved(&word) {
                LexKind::Keyword
            } else {
                LexKind::Ident
            };
            let text = if kind == LexKind::Keyword {
                word.to_ascii_uppercase()
            } else {
                word
            };
            out.push(Lexeme::new(kind, text));
            continue;
        }

        if let Some(close) = match ch {
            '"' => Some('"'),
            '`' => Some('`'),
            _ => None,
        } {
            let start = i + 1;
            let end = chars[start..]
                .iter()
                .position(|&c| c == close)
                .map_or(chars.len(), |pos| start + pos);
            out.push(Lexeme::new(
                LexKind::Ident,
                chars[start..end].iter().collect::<String>(),
            ));
            i = (end + 1).min(chars.len());
            continue;
        }

        let two: String = [Some(ch), next].iter().flatten().collect();
        let (kind, len) = match two.as_str() {
            "<=" | ">=" | "<>" | "!=" => (LexKind::Comparison, 2),
            "::" => (LexKind::DoubleColon, 2),
            "||" => (LexKind::Operator, 2),
            _ => match ch {
                '=' | '<' | '>' => (LexKind::Comparison, 1),
                ',' => (LexKind::Comma, 1),
                '(' => (LexKind::LParen, 1),
                ')' => (LexKind::RParen, 1),
                '.' => (LexKind::Period, 1),
                '*' if is_wildcard_position(out.last()) => (LexKind::Ident, 1),
                '+' | '-' | '*' | '/' | '%' => (LexKind::Operator, 1),
                _ => (LexKind::Other, 1),
            },
        };
        out.push(Lexeme::new(kind, chars[i..i + len].iter().collect::<String>()));
        i += len;
    }

    out
}

const CONDITION_BOUNDARIES: &[&str] = &[
    "AND", "OR", "WHERE", "FROM", "SELECT", "HAVING", "ON", "JOIN", "WHEN", "THEN", "ELSE", "SET",
];

/// Finds the identifier whose type governs the cursor position.
///
/// `age |` yields `age`; `age > |`, `status IN ('a', |` and `name LIKE |`
/// yield the identifier on the left of the operator. Walks back over balanced
/// parentheses and stops at boolean or clause boundaries.
pub(crate) fn previous_identifier(lexemes: &[Lexeme]) -> Option<String> {
    let last = lexemes.last()?;
    if last.kind == LexKind::Ident {
        return (last.text != "*").then(|| last.text.clone());
    }

    // Phase 1: find the operator at depth 0.
    let mut depth: i32 = 0;
    let mut idx = lexemes.len();
    let anchor = loop {
        if idx == 0 {
            return None;
        }
        idx -= 1;
        let lexeme = &lexemes[idx];
        match lexeme.kind {
            LexKind::RParen => depth += 1,
            LexKind::LParen => {
                if depth == 0 {
                    if idx > 0 && lexemes[idx - 1].is_keyword("IN") {
                        break idx - 1;
                    }
                    return None;
                }
                depth -= 1;
            }
            LexKind::Comparison if depth == 0 => break idx,
            LexKind::Keyword if depth == 0 && lexeme.is_keyword_in(&["LIKE", "ILIKE", "BETWEEN", "IS", "IN"]) => {
                break idx
            }
            LexKind::Keyword if depth == 0 && lexeme.is_keyword_in(CONDITION_BOUNDARIES) => {
                return None
            }
            _ => {}
        }
    };

    // Phase 2: the identifier left of the operator, skipping NOT and grouping parens.
    let mut depth: i32 = 0;
    for lexeme in lexemes[..anchor].iter().rev() {
        match lexeme.kind {
            LexKind::RParen => depth += 1,
            LexKind::LParen => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            LexKind::Keyword if lexeme.text == "NOT" => continue,
            LexKind::Keyword if depth == 0 => return None,
            LexKind::Ident if lexeme.text != "*" => return Some(lexeme.text.clone()),
            _ => {}
        }
    }
    None
}
