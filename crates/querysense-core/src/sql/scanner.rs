//! Lexical region scanning for SQL text.
//!
//! A single forward pass classifies string literals, quoted identifiers,
//! dollar-quoted bodies and comments. The result is used to decide whether
//! the cursor is in an opaque region and to build masked views of the text
//! in which keyword and punctuation searches cannot match inside literals.

use crate::types::{Dialect, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegionKind {
    StringLiteral,
    QuotedIdentifier,
    DollarString,
    LineComment,
    BlockComment,
}

impl RegionKind {
    pub(crate) fn is_comment(self) -> bool {
        matches!(self, RegionKind::LineComment | RegionKind::BlockComment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Region {
    pub kind: RegionKind,
    pub span: Span,
    /// The closing delimiter was found. Line comments are never closed: the
    /// newline that ends them is not part of the region.
    pub closed: bool,
}

impl Region {
    /// The cursor is strictly inside the region.
    ///
    /// A cursor right after the opening delimiter is inside; a cursor right
    /// after the closing delimiter is not.
    pub(crate) fn contains_cursor(&self, cursor: usize) -> bool {
        self.span.start < cursor
            && (cursor < self.span.end || (cursor == self.span.end && !self.closed))
    }
}

/// Output of [`scan`].
#[derive(Debug, Clone)]
pub(crate) struct ScannedText {
    pub regions: Vec<Region>,
    /// Strings and comments replaced by spaces; quoted identifiers intact.
    pub masked: String,
    /// Like `masked`, but quoted identifier bodies replaced by `_` so that no
    /// keyword or punctuation can match inside them.
    pub keywords: String,
}

impl ScannedText {
    pub(crate) fn region_at(&self, cursor: usize) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains_cursor(cursor))
    }

    /// Statement spans separated by `;`, ignoring semicolons in literals.
    pub(crate) fn statements(&self) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut start = 0;
        for (idx, byte) in self.keywords.bytes().enumerate() {
            if byte == b';' {
                spans.push(Span::new(start, idx));
                start = idx + 1;
            }
        }
        spans.push(Span::new(start, self.keywords.len()));
        spans
    }

    /// The statement containing `cursor`. A cursor on a `;` belongs to the
    /// statement it terminates.
    pub(crate) fn statement_at(&self, cursor: usize) -> Span {
        self.statements()
            .into_iter()
            .find(|span| span.start <= cursor && cursor <= span.end)
            .unwrap_or_else(|| Span::new(0, self.keywords.len()))
    }
}

pub(crate) fn scan(text: &str, dialect: Dialect) -> ScannedText {
    let regions = find_regions(text, dialect);

    let mut masked = String::with_capacity(text.len());
    let mut keywords = String::with_capacity(text.len());
    let mut regions_iter = regions.iter().peekable();

    for (idx, ch) in text.char_indices() {
        while regions_iter.peek().is_some_and(|r| r.span.end <= idx) {
            regions_iter.next();
        }
        let region = regions_iter
            .peek()
            .filter(|r| r.span.start <= idx && idx < r.span.end);
        match region.map(|r| r.kind) {
            Some(RegionKind::QuotedIdentifier) => {
                masked.push(ch);
                let region = region.copied();
                let is_delimiter = region.is_some_and(|r| {
                    idx == r.span.start || (r.closed && idx + ch.len_utf8() == r.span.end)
                });
                if is_delimiter {
                    keywords.push(ch);
                } else {
                    push_fill(&mut keywords, '_', ch.len_utf8());
                }
            }
            Some(_) => {
                let fill = if ch == '\n' { '\n' } else { ' ' };
                push_fill(&mut masked, fill, ch.len_utf8());
                push_fill(&mut keywords, fill, ch.len_utf8());
            }
            None => {
                masked.push(ch);
                keywords.push(ch);
            }
        }
    }

    ScannedText {
        regions,
        masked,
        keywords,
    }
}

fn push_fill(out: &mut String, fill: char, byte_len: usize) {
    if fill == '\n' {
        out.push('\n');
        return;
    }
    for _ in 0..byte_len {
        out.push(fill);
    }
}

fn find_regions(text: &str, dialect: Dialect) -> Vec<Region> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut regions = Vec::new();
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        let found = match b {
            b'\'' => Some(scan_quoted(bytes, i, b'\'', RegionKind::StringLiteral, dialect)),
            b'"' => Some(scan_quoted(bytes, i, b'"', RegionKind::QuotedIdentifier, dialect)),
            b'`' if dialect.supports_backtick_identifiers() => {
                Some(scan_quoted(bytes, i, b'`', RegionKind::QuotedIdentifier, dialect))
            }
            b'[' if dialect.supports_bracket_identifiers() => Some(scan_bracket(bytes, i)),
            b'-' if next == Some(b'-') => Some(scan_line_comment(bytes, i)),
            b'#' if dialect.supports_hash_comments() => Some(scan_line_comment(bytes, i)),
            b'/' if next == Some(b'*') => Some(scan_block_comment(bytes, i)),
            b'$' if dialect.supports_dollar_quotes() => scan_dollar(text, i),
            _ => None,
        };

        match found {
            Some(region) => {
                i = region.span.end.max(i + 1);
                regions.push(region);
            }
            None => i += 1,
        }
    }

    regions
}

fn scan_quoted(bytes: &[u8], start: usize, quote: u8, kind: RegionKind, dialect: Dialect) -> Region {
    let backslash_escapes = kind == RegionKind::StringLiteral
        && (matches!(dialect, Dialect::Mysql | Dialect::Mariadb) || has_escape_prefix(bytes, start));
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if backslash_escapes && b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            // Doubled quote is an escaped quote.
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return Region {
                kind,
                span: Span::new(start, i + 1),
                closed: true,
            };
        }
        i += 1;
    }
    Region {
        kind,
        span: Span::new(start, bytes.len()),
        closed: false,
    }
}

/// `E'...'` escape string constant: a backslash escapes the next byte.
fn has_escape_prefix(bytes: &[u8], quote: usize) -> bool {
    match quote.checked_sub(1).map(|i| bytes[i]) {
        Some(b'E' | b'e') => quote < 2 || !is_ident_byte(bytes[quote - 2]),
        _ => false,
    }
}

fn scan_bracket(bytes: &[u8], start: usize) -> Region {
    match bytes[start + 1..].iter().position(|&b| b == b']') {
        Some(pos) => Region {
            kind: RegionKind::QuotedIdentifier,
            span: Span::new(start, start + 1 + pos + 1),
            closed: true,
        },
        None => Region {
            kind: RegionKind::QuotedIdentifier,
            span: Span::new(start, bytes.len()),
            closed: false,
        },
    }
}

fn scan_line_comment(bytes: &[u8], start: usize) -> Region {
    let end = bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|pos| start + pos)
        .unwrap_or(bytes.len());
    Region {
        kind: RegionKind::LineComment,
        span: Span::new(start, end),
        closed: false,
    }
}

fn scan_block_comment(bytes: &[u8], start: usize) -> Region {
    let mut depth = 1usize;
    let mut i = start + 2;
    while i < bytes.len() {
        match (bytes[i], bytes.get(i + 1).copied()) {
            (b'/', Some(b'*')) => {
                depth += 1;
                i += 2;
            }
            (b'*', Some(b'/')) => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return Region {
                        kind: RegionKind::BlockComment,
                        span: Span::new(start, i),
                        closed: true,
                    };
                }
            }
            _ => i += 1,
        }
    }
    Region {
        kind: RegionKind::BlockComment,
        span: Span::new(start, bytes.len()),
        closed: false,
    }
}

/// `$tag$ ... $tag$` with an optional identifier tag. Returns `None` for
/// positional parameters like `$1` or a lone `$`.
fn scan_dollar(text: &str, start: usize) -> Option<Region> {
    let bytes = text.as_bytes();
    if start > 0 && is_ident_byte(bytes[start - 1]) {
        return None;
    }
    let mut i = start + 1;
    if i < bytes.len() && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
    }
    if bytes.get(i) != Some(&b'$') {
        return None;
    }
    let delimiter = &text[start..=i];
    let body_start = i + 1;
    match text[body_start..].find(delimiter) {
        Some(pos) => Some(Region {
            kind: RegionKind::DollarString,
            span: Span::new(start, body_start + pos + delimiter.len()),
            closed: true,
        }),
        None => Some(Region {
            kind: RegionKind::DollarString,
            span: Span::new(start, text.len()),
            closed: false,
        }),
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

pub(crate) fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// The partial identifier ending at `cursor`.
pub(crate) fn current_word(text: &str, cursor: usize) -> &str {
    let before = &text[..cursor];
    let start = before
        .char_indices()
        .rev()
        .take_while(|(_, ch)| is_ident_char(*ch))
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(cursor);
    &before[start..]
}

/// A `qualifier.` (or `schema.qualifier.`) ending at `end`.
///
/// Returns `(schema, qualifier)` with quotes stripped.
pub(crate) fn qualifier_before(text: &str, end: usize) -> Option<(Option<String>, String)> {
    let before = text.get(..end)?;
    let before = before.strip_suffix('.')?;
    let (qualifier, rest) = identifier_before(before)?;
    let schema = rest
        .strip_suffix('.')
        .and_then(identifier_before)
        .map(|(schema, _)| schema);
    Some((schema, qualifier))
}

/// Reads one identifier (bare or quoted) ending at the end of `text`.
fn identifier_before(text: &str) -> Option<(String, &str)> {
    let last = text.chars().next_back()?;
    let closing = match last {
        '"' => Some('"'),
        '`' => Some('`'),
        ']' => Some('['),
        _ => None,
    };
    if let Some(open) = closing {
        let inner = &text[..text.len() - 1];
        let start = inner.rfind(open)?;
        let name = &inner[start + 1..];
        if name.is_empty() {
            return None;
        }
        return Some((name.to_string(), &text[..start]));
    }
    let word = current_word(text, text.len());
    if word.is_empty() || word.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some((word.to_string(), &text[..text.len() - word.len()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(text: &str, cursor: usize, dialect: Dialect) -> Option<RegionKind> {
        scan(text, dialect).region_at(cursor).map(|r| r.kind)
    }

    #[test]
    fn test_cursor_inside_unterminated_string() {
        let sql = "SELECT * FROM t WHERE a = 'ab";
        assert_eq!(
            opaque(sql, sql.len(), Dialect::Postgres),
            Some(RegionKind::StringLiteral)
        );
    }

    #[test]
    fn test_cursor_after_closed_string_is_outside() {
        let sql = "SELECT 'a'";
        assert_eq!(opaque(sql, sql.len(), Dialect::Postgres), None);
        assert_eq!(
            opaque(sql, 8, Dialect::Postgres),
            Some(RegionKind::StringLiteral)
        );
    }

    #[test]
    fn test_doubled_quote_escape() {
        let sql = "SELECT 'it''s' ";
        let scanned = scan(sql, Dialect::Postgres);
        assert_eq!(scanned.regions.len(), 1);
        assert_eq!(scanned.regions[0].span, Span::new(7, 14));
        assert!(scanned.regions[0].closed);
    }

    #[test]
    fn test_escape_string_constant_honours_backslash() {
        let sql = r"SELECT * FROM t WHERE x = E'it\'s' AND ";
        let scanned = scan(sql, Dialect::Postgres);
        assert_eq!(scanned.regions.len(), 1);
        assert!(scanned.regions[0].closed);
        assert_eq!(scanned.regions[0].span, Span::new(27, 34));
        assert_eq!(scanned.region_at(sql.len()), None);

        // A plain literal ending in a backslash still closes at the quote.
        let sql = r"SELECT 'C:\' FROM t";
        let scanned = scan(sql, Dialect::Postgres);
        assert_eq!(scanned.regions[0].span, Span::new(7, 12));
        // `name'` is not an escape prefix.
        let sql = r"SELECT name'a\' ";
        assert!(scan(sql, Dialect::Postgres).regions[0].closed);
    }

    #[test]
    fn test_line_comment_to_end_of_line() {
        let sql = "SELECT 1 -- FR";
        assert_eq!(
            opaque(sql, sql.len(), Dialect::Postgres),
            Some(RegionKind::LineComment)
        );
        let sql = "SELECT 1 -- note\nFR";
        assert_eq!(opaque(sql, sql.len(), Dialect::Postgres), None);
    }

    #[test]
    fn test_hash_comment_only_for_mysql_family() {
        let sql = "SELECT 1 # note";
        assert_eq!(
            opaque(sql, sql.len(), Dialect::Mysql),
            Some(RegionKind::LineComment)
        );
        assert_eq!(opaque(sql, sql.len(), Dialect::Postgres), None);
    }

    #[test]
    fn test_nested_block_comment() {
        let sql = "/* a /* b */ still */ SELECT ";
        let scanned = scan(sql, Dialect::Postgres);
        assert_eq!(scanned.regions[0].span, Span::new(0, 21));
        assert_eq!(scanned.region_at(sql.len()), None);
        assert_eq!(
            scanned.region_at(14).map(|r| r.kind),
            Some(RegionKind::BlockComment)
        );
    }

    #[test]
    fn test_dollar_quoted_body() {
        let sql = "SELECT $fn$ FROM x $fn$, $1";
        let scanned = scan(sql, Dialect::Postgres);
        assert_eq!(scanned.regions.len(), 1);
        assert_eq!(scanned.regions[0].kind, RegionKind::DollarString);
        assert!(!scanned.keywords.contains("FROM"));
    }

    #[test]
    fn test_masks_preserve_byte_offsets() {
        let sql = "SELECT 'héllo', \"FROM\" FROM t";
        let scanned = scan(sql, Dialect::Postgres);
        assert_eq!(scanned.masked.len(), sql.len());
        assert_eq!(scanned.keywords.len(), sql.len());
        assert!(scanned.masked.contains("\"FROM\""));
        assert_eq!(scanned.keywords.matches("FROM").count(), 1);
    }

    #[test]
    fn test_statement_at_cursor() {
        let sql = "SELECT 1; SELECT ';' FROM t; ";
        let scanned = scan(sql, Dialect::Postgres);
        assert_eq!(scanned.statements().len(), 3);
        assert_eq!(scanned.statement_at(8), Span::new(0, 8));
        assert_eq!(scanned.statement_at(12), Span::new(9, 27));
    }

    #[test]
    fn test_current_word_and_qualifier() {
        let sql = "SELECT public.users.na";
        assert_eq!(current_word(sql, sql.len()), "na");
        let end = sql.len() - 2;
        assert_eq!(
            qualifier_before(sql, end),
            Some((Some("public".to_string()), "users".to_string()))
        );
        assert_eq!(qualifier_before("SELECT \"My T\".", 14), Some((None, "My T".to_string())));
        assert_eq!(qualifier_before("SELECT 1.", 9), None);
    }
}
