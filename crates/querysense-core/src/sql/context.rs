//! SQL structural context resolution.
//!
//! Works on the statement containing the cursor. Parenthesised groups that
//! do not contain the cursor are blanked first, so clause detection and
//! relation extraction only see the query level the cursor is on. The
//! expected token type is then derived in a fixed order: qualifier, window
//! specification, `CASE` expression, subquery opening, punctuation, and
//! finally the per-clause default.

use std::sync::LazyLock;

use regex::Regex;

use super::keywords::{clause_markers, is_reserved, is_upsert_update};
use super::scanner::{self, is_ident_char, ScannedText};
use super::tokens::{self, LexKind, Lexeme};
use crate::error::validate_request;
use crate::types::{
    CteRef, Dialect, ExpectedType, QualifierTarget, Span, SqlClause, SqlContext, TableRef,
};

static RELATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:FROM|JOIN|UPDATE|INTO|APPLY)\b").expect("Invalid relation regex")
});
static WITH_PROLOGUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*WITH(?:\s+RECURSIVE)?\b").expect("Invalid WITH regex")
});
static SUBQUERY_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:SELECT|WITH)\b").expect("Invalid subquery regex"));
static WINDOW_ORDERING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:PARTITION|ORDER)\s+BY\b").expect("Invalid window regex")
});
static WINDOW_FRAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:ROWS|RANGE|GROUPS)\b").expect("Invalid frame regex"));
static CASE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(CASE|END)\b").expect("Invalid CASE regex"));
static GROUP_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bGROUP\s+BY\b").expect("Invalid GROUP BY regex"));
static SELECT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bSELECT\b").expect("Invalid SELECT regex"));
static FROM_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bFROM\b").expect("Invalid FROM regex"));
static EXPLICIT_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bAS\s+("[^"]+"|`[^`]+`|[A-Za-z_][\w$]*)\s*$"#).expect("Invalid alias regex")
});
static COLUMN_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:[\w$]+\s*\.\s*)*("[^"]+"|[A-Za-z_][\w$]*)$"#).expect("Invalid column regex")
});
static IMPLICIT_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w)]\s+([A-Za-z_][\w$]*)$").expect("Invalid implicit alias regex")
});

const JOIN_MODIFIERS: &[&str] = &["LEFT", "RIGHT", "FULL", "INNER", "OUTER", "CROSS", "NATURAL"];
const SUBQUERY_OPENERS: &[&str] = &["IN", "EXISTS", "FROM", "JOIN", "AS", "ALL"];

/// Resolves the completion context at `cursor` (a byte offset).
///
/// Never fails: an invalid cursor yields an empty context and unclassifiable
/// text yields clause `Unknown` with expected type `Any`.
pub fn sql_context(text: &str, cursor: usize, dialect: Dialect) -> SqlContext {
    if validate_request(text, cursor).is_err() {
        return SqlContext::empty();
    }
    let scanned = scanner::scan(text, dialect);
    resolve(text, cursor, dialect, &scanned)
}

pub(crate) fn resolve(
    text: &str,
    cursor: usize,
    dialect: Dialect,
    scanned: &ScannedText,
) -> SqlContext {
    let mut ctx = SqlContext::empty();

    if let Some(region) = scanned.region_at(cursor) {
        if region.kind.is_comment() {
            ctx.in_comment = true;
        } else {
            ctx.in_string = true;
        }
    }

    let word = scanner::current_word(text, cursor);
    ctx.current_word = word.to_string();
    let word_start = cursor - word.len();

    let span = scanned.statement_at(cursor);
    ctx.statement_span = span;
    let statement = Statement::new(scanned, span, cursor, word_start);

    ctx.clause = statement.clause();
    ctx.depth = statement.containing.len();
    ctx.tables_in_scope = statement.tables_in_scope();
    ctx.ctes_in_scope = statement.ctes();
    ctx.has_group_by = statement.has_group_by();

    let qualifier = scanner::qualifier_before(text, word_start).filter(|_| !ctx.is_opaque());
    let lex_end = match &qualifier {
        Some(_) => qualifier_start(text, word_start),
        None => word_start,
    };
    let lexemes = tokens::lex(
        &text[span.start..lex_end.max(span.start)],
        &scanned.masked[span.start..lex_end.max(span.start)],
        dialect,
    );

    if let Some((schema, name)) = qualifier {
        ctx.qualifier_target = Some(resolve_qualifier(
            schema,
            &name,
            &ctx.tables_in_scope,
            &ctx.ctes_in_scope,
        ));
        ctx.current_qualifier = Some(name);
    }

    ctx.previous_token = lexemes.last().map(|l| l.text.clone());
    ctx.previous_keyword = previous_keyword(&lexemes);
    ctx.previous_identifier = tokens::previous_identifier(&lexemes);
    ctx.after_delimiter = lexemes.last().is_some_and(Lexeme::is_delimiter);

    let window = statement.window_group();
    ctx.in_window = window.is_some();
    ctx.in_case = statement.in_case();

    let next_char = text[cursor..].chars().next();
    ctx.expected = infer_expected(&ctx, &statement, &lexemes, window, next_char);
    ctx
}

/// Byte offset where the `qualifier.` (or `schema.qualifier.`) before the word starts.
fn qualifier_start(text: &str, word_start: usize) -> usize {
    let before = &text[..word_start];
    let mut start = word_start;
    let mut rest = before;
    while let Some(stripped) = rest.strip_suffix('.') {
        let ident_len = trailing_identifier_len(stripped);
        if ident_len == 0 {
            break;
        }
        start = stripped.len() - ident_len;
        rest = &stripped[..start];
    }
    start
}

fn trailing_identifier_len(text: &str) -> usize {
    if let Some(close) = text.chars().next_back() {
        let open = match close {
            '"' => Some('"'),
            '`' => Some('`'),
            ']' => Some('['),
            _ => None,
        };
        if let Some(open) = open {
            let inner = &text[..text.len() - 1];
            return inner.rfind(open).map_or(0, |start| text.len() - start);
        }
    }
    scanner::current_word(text, text.len()).len()
}

fn resolve_qualifier(
    schema: Option<String>,
    name: &str,
    tables: &[TableRef],
    ctes: &[CteRef],
) -> QualifierTarget {
    if let Some(schema) = schema {
        return QualifierTarget::Table {
            schema: Some(schema),
            table: name.to_string(),
        };
    }
    if let Some(cte) = ctes.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
        return QualifierTarget::Cte {
            name: cte.name.clone(),
        };
    }
    let by_alias = tables.iter().find(|t| {
        t.alias
            .as_deref()
            .is_some_and(|alias| alias.eq_ignore_ascii_case(name))
    });
    let by_table = || tables.iter().find(|t| t.table.eq_ignore_ascii_case(name));
    if let Some(table) = by_alias.or_else(by_table) {
        if ctes.iter().any(|c| c.name.eq_ignore_ascii_case(&table.table)) {
            return QualifierTarget::Cte {
                name: table.table.clone(),
            };
        }
        return QualifierTarget::Table {
            schema: table.schema.clone(),
            table: table.table.clone(),
        };
    }
    QualifierTarget::Schema {
        name: name.to_string(),
    }
}

fn previous_keyword(lexemes: &[Lexeme]) -> Option<String> {
    let idx = lexemes.iter().rposition(|l| l.kind == LexKind::Keyword)?;
    let keyword = &lexemes[idx].text;
    if keyword == "BY" && idx > 0 && lexemes[idx - 1].kind == LexKind::Keyword {
        return Some(format!("{} BY", lexemes[idx - 1].text));
    }
    Some(keyword.clone())
}

fn infer_expected(
    ctx: &SqlContext,
    statement: &Statement,
    lexemes: &[Lexeme],
    window: Option<Group>,
    next_char: Option<char>,
) -> ExpectedType {
    let clause = ctx.clause;
    let previous = lexemes.last();
    let before_previous = lexemes.len().checked_sub(2).map(|idx| &lexemes[idx]);

    // Qualifier
    if let Some(target) = &ctx.qualifier_target {
        return match target {
            QualifierTarget::Cte { .. } | QualifierTarget::Table { .. } => ExpectedType::Column,
            QualifierTarget::Schema { .. } => ExpectedType::TableOrSchema,
        };
    }

    // Window specification
    if let Some(group) = window {
        let spec = statement.flat_kw_between(group.open + 1, statement.word_start);
        let ordering_end = WINDOW_ORDERING.find_iter(spec).last().map(|m| m.end());
        return match ordering_end {
            Some(end) if !WINDOW_FRAME.is_match(&spec[end..]) => {
                if previous.is_some_and(Lexeme::is_operand) {
                    ExpectedType::Keyword
                } else {
                    ExpectedType::Column
                }
            }
            _ => ExpectedType::Keyword,
        };
    }

    // CASE expression
    if ctx.in_case {
        return match previous {
            Some(l) if l.kind == LexKind::Comparison => ExpectedType::Value,
            Some(l) if l.is_keyword_in(&["WHEN", "THEN", "ELSE", "AND", "OR", "NOT"]) => {
                ExpectedType::ColumnOrExpression
            }
            _ => ExpectedType::Keyword,
        };
    }

    // Subquery opening paren
    if previous.is_some_and(|l| l.kind == LexKind::LParen) {
        let opener = before_previous.is_some_and(|l| {
            l.is_keyword_in(SUBQUERY_OPENERS)
                || (l.kind == LexKind::Ident
                    && (l.text.eq_ignore_ascii_case("ANY") || l.text.eq_ignore_ascii_case("SOME")))
        });
        if opener {
            return ExpectedType::Keyword;
        }
    }

    // Punctuation and previous token
    if let Some(previous) = previous {
        let in_value_list = statement.innermost_group_preceded_by("IN");
        match previous.kind {
            LexKind::Comma if in_value_list => return ExpectedType::Value,
            LexKind::Comma => return after_comma(clause),
            LexKind::LParen => {
                return match clause {
                    SqlClause::Insert => ExpectedType::Column,
                    SqlClause::Create | SqlClause::Alter => ExpectedType::Keyword,
                    SqlClause::Values | SqlClause::Limit => ExpectedType::Value,
                    _ => ExpectedType::ColumnOrExpression,
                }
            }
            LexKind::Comparison => {
                return if clause == SqlClause::On {
                    ExpectedType::Column
                } else {
                    ExpectedType::Value
                }
            }
            LexKind::DoubleColon => return ExpectedType::DataType,
            LexKind::Operator => return ExpectedType::ColumnOrExpression,
            LexKind::Keyword => {
                if previous.text == "AS" && statement.innermost_group_preceded_by("CAST") {
                    return ExpectedType::DataType;
                }
                match previous.text.as_str() {
                    "AND" | "OR" if clause == SqlClause::On => return ExpectedType::JoinCondition,
                    "AND" | "OR" => return ExpectedType::Column,
                    "IS" | "LIKE" | "ILIKE" | "BETWEEN" => return ExpectedType::Value,
                    "NOT" if before_previous.is_some_and(|l| l.is_keyword("IS")) => {
                        return ExpectedType::Value
                    }
                    "NOT" => return ExpectedType::Column,
                    _ => {}
                }
            }
            _ => {}
        }

        if next_char == Some('(') {
            return ExpectedType::Function;
        }

        if previous.is_operand() {
            match clause {
                SqlClause::Select
                | SqlClause::Where
                | SqlClause::Having
                | SqlClause::On
                | SqlClause::GroupBy
                | SqlClause::OrderBy
                | SqlClause::Set
                | SqlClause::Returning
                | SqlClause::Limit => return ExpectedType::Keyword,
                SqlClause::Create
                    if previous.kind == LexKind::Ident
                        && statement.containing.len() == 1
                        && before_previous
                            .is_some_and(|l| matches!(l.kind, LexKind::LParen | LexKind::Comma)) =>
                {
                    return ExpectedType::DataType
                }
                _ => {}
            }
        }
    } else if next_char == Some('(') {
        return ExpectedType::Function;
    }

    // Clause default
    let after_relation = previous.is_some_and(|l| {
        l.is_operand() || l.is_keyword("AS") || l.is_keyword_in(JOIN_MODIFIERS)
    });
    match clause {
        SqlClause::Select => ExpectedType::ColumnOrExpression,
        SqlClause::From
        | SqlClause::Join
        | SqlClause::Insert
        | SqlClause::Update
        | SqlClause::Delete
        | SqlClause::Alter => {
            if after_relation {
                ExpectedType::Keyword
            } else {
                ExpectedType::TableOrSchema
            }
        }
        SqlClause::On => ExpectedType::JoinCondition,
        SqlClause::Where
        | SqlClause::Having
        | SqlClause::GroupBy
        | SqlClause::OrderBy
        | SqlClause::Set
        | SqlClause::Returning => ExpectedType::Column,
        SqlClause::Limit | SqlClause::Values => ExpectedType::Value,
        SqlClause::With | SqlClause::Create => ExpectedType::Keyword,
        SqlClause::Unknown => ExpectedType::Any,
    }
}

fn after_comma(clause: SqlClause) -> ExpectedType {
    match clause {
        SqlClause::Select => ExpectedType::ColumnOrExpression,
        SqlClause::From | SqlClause::Join | SqlClause::Update | SqlClause::Delete => {
            ExpectedType::TableOrSchema
        }
        SqlClause::Insert
        | SqlClause::Where
        | SqlClause::Having
        | SqlClause::On
        | SqlClause::GroupBy
        | SqlClause::OrderBy
        | SqlClause::Set
        | SqlClause::Returning => ExpectedType::Column,
        SqlClause::Values | SqlClause::Limit => ExpectedType::Value,
        SqlClause::Create | SqlClause::With | SqlClause::Alter => ExpectedType::Keyword,
        SqlClause::Unknown => ExpectedType::Any,
    }
}

/// A parenthesised group, offsets local to the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Group {
    open: usize,
    /// Offset of the matching `)`, if any.
    close: Option<usize>,
}

impl Group {
    fn contains(&self, pos: usize) -> bool {
        self.open < pos && self.close.is_none_or(|close| pos <= close)
    }

    fn end(&self, len: usize) -> usize {
        self.close.unwrap_or(len)
    }
}

fn paren_groups(text: &str) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut stack = Vec::new();
    for (idx, byte) in text.bytes().enumerate() {
        match byte {
            b'(' => {
                stack.push(groups.len());
                groups.push(Group {
                    open: idx,
                    close: None,
                });
            }
            b')' => {
                if let Some(group_idx) = stack.pop() {
                    let group: &mut Group = &mut groups[group_idx];
                    group.close = Some(idx);
                }
            }
            _ => {}
        }
    }
    groups
}

/// Replaces the interior of every group not containing `cursor` with spaces.
fn flatten(text: &str, groups: &[Group], cursor: usize) -> String {
    let mut delta = vec![0i32; text.len() + 1];
    for group in groups.iter().filter(|g| !g.contains(cursor)) {
        delta[group.open + 1] += 1;
        delta[group.end(text.len())] -= 1;
    }
    let mut out = String::with_capacity(text.len());
    let mut depth = 0;
    let mut last = 0;
    for (idx, ch) in text.char_indices() {
        for d in &delta[last..=idx] {
            depth += d;
        }
        last = idx + 1;
        if depth > 0 {
            for _ in 0..ch.len_utf8() {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// The statement under the cursor with its parenthesis structure.
struct Statement<'a> {
    base: usize,
    /// Keyword view (literals and quoted identifier bodies masked).
    kw: &'a str,
    /// Literal-masked text with quoted identifiers intact.
    masked: &'a str,
    flat_kw: String,
    flat_masked: String,
    /// Groups containing the cursor, outermost first.
    containing: Vec<Group>,
    groups: Vec<Group>,
    cursor: usize,
    word_start: usize,
}

impl<'a> Statement<'a> {
    fn new(scanned: &'a ScannedText, span: Span, cursor: usize, word_start: usize) -> Self {
        let kw = &scanned.keywords[span.start..span.end];
        let masked = &scanned.masked[span.start..span.end];
        let cursor = cursor - span.start;
        let word_start = word_start - span.start;
        let groups = paren_groups(kw);
        let containing = groups
            .iter()
            .copied()
            .filter(|g| g.contains(cursor))
            .collect();
        Self {
            base: span.start,
            kw,
            masked,
            flat_kw: flatten(kw, &groups, cursor),
            flat_masked: flatten(masked, &groups, cursor),
            containing,
            groups,
            cursor,
            word_start,
        }
    }

    fn flat_kw_between(&self, start: usize, end: usize) -> &str {
        self.flat_kw.get(start..end.max(start)).unwrap_or_default()
    }

    fn clause(&self) -> SqlClause {
        clause_markers(&self.flat_kw[..self.word_start])
            .last()
            .map_or(SqlClause::Unknown, |marker| marker.clause)
    }

    fn innermost(&self) -> Option<Group> {
        self.containing.last().copied()
    }

    /// The identifier right before `pos` in the keyword view, skipping whitespace.
    fn word_before(&self, pos: usize) -> &str {
        let trimmed = self.flat_kw[..pos].trim_end();
        scanner::current_word(trimmed, trimmed.len())
    }

    fn innermost_group_preceded_by(&self, keyword: &str) -> bool {
        self.innermost()
            .is_some_and(|group| self.word_before(group.open).eq_ignore_ascii_case(keyword))
    }

    fn window_group(&self) -> Option<Group> {
        self.containing
            .iter()
            .rev()
            .find(|group| self.word_before(group.open).eq_ignore_ascii_case("OVER"))
            .copied()
    }

    fn in_case(&self) -> bool {
        let start = self.innermost().map_or(0, |group| group.open + 1);
        let text = self.flat_kw_between(start, self.word_start);
        let depth = CASE_BOUNDARY
            .captures_iter(text)
            .fold(0i32, |depth, caps| {
                if caps[1].eq_ignore_ascii_case("CASE") {
                    depth + 1
                } else {
                    (depth - 1).max(0)
                }
            });
        depth > 0
    }

    /// Local range of the query level the cursor is on: the innermost
    /// enclosing subquery, or the whole statement.
    fn scope(&self) -> (usize, usize) {
        let len = self.flat_kw.len();
        self.containing
            .iter()
            .rev()
            .find(|group| SUBQUERY_START.is_match(&self.flat_kw[group.open + 1..group.end(len)]))
            .map_or((0, len), |group| (group.open + 1, group.end(len)))
    }

    fn has_group_by(&self) -> bool {
        let (start, end) = self.scope();
        GROUP_BY.is_match(&self.flat_kw[start..end])
    }

    fn tables_in_scope(&self) -> Vec<TableRef> {
        let (start, end) = self.scope();
        let nested: Vec<Group> = self
            .containing
            .iter()
            .copied()
            .filter(|group| group.open >= start)
            .collect();

        let mut relations: Vec<RawRelation> = Vec::new();
        for m in RELATION_REGEX.find_iter(&self.flat_kw[start..end]) {
            let pos = start + m.start();
            if self.flat_kw[..pos].ends_with(['.', '$']) {
                continue;
            }
            if nested.iter().any(|group| group.contains(pos + 1)) {
                continue;
            }
            if m.as_str().eq_ignore_ascii_case("UPDATE") && is_upsert_update(&self.flat_kw, pos) {
                continue;
            }
            let allow_list = m.as_str().eq_ignore_ascii_case("FROM");
            relations.extend(parse_relations(&self.flat_masked[..end], start + m.end(), allow_list));
        }

        let mut refs: Vec<TableRef> = Vec::new();
        for relation in relations {
            if relation.span.touches(self.cursor) {
                continue;
            }
            let alias = relation
                .alias
                .filter(|(_, span)| !span.touches(self.cursor))
                .map(|(alias, _)| alias);
            let table_ref = TableRef {
                schema: relation.schema,
                table: relation.table,
                alias,
                span: Span::new(self.base + relation.span.start, self.base + relation.span.end),
            };
            let duplicate = refs.iter().any(|existing| {
                existing.table == table_ref.table
                    && existing.schema == table_ref.schema
                    && existing.alias == table_ref.alias
            });
            if !duplicate {
                refs.push(table_ref);
            }
        }
        refs
    }

    /// CTEs declared by a leading `WITH` prologue.
    fn ctes(&self) -> Vec<CteRef> {
        let Some(prologue) = WITH_PROLOGUE.find(self.kw) else {
            return Vec::new();
        };
        let text = self.masked;
        let mut ctes = Vec::new();
        let mut pos = prologue.end();

        loop {
            pos = skip_ws(text, pos);
            let Some((name, name_span, quoted)) = read_identifier(text, pos) else {
                break;
            };
            if !quoted && is_reserved(&name) {
                break;
            }
            pos = skip_ws(text, name_span.end);

            let mut declared = Vec::new();
            if text[pos..].starts_with('(') {
                let close = self.close_of(pos).unwrap_or(text.len());
                declared = text[pos + 1..close]
                    .split(',')
                    .map(|col| unquote(col.trim()))
                    .filter(|col| !col.is_empty())
                    .collect();
                pos = skip_ws(text, (close + 1).min(text.len()));
            }

            let span = Span::new(self.base + name_span.start, self.base + name_span.end);
            let Some(after_as) = expect_word(text, pos, "AS") else {
                ctes.push(CteRef {
                    name,
                    columns: declared,
                    span,
                });
                break;
            };
            pos = skip_ws(text, after_as);
            if let Some(next) = expect_word(text, pos, "NOT") {
                pos = skip_ws(text, next);
            }
            if let Some(next) = expect_word(text, pos, "MATERIALIZED") {
                pos = skip_ws(text, next);
            }

            if !text[pos..].starts_with('(') {
                ctes.push(CteRef {
                    name,
                    columns: declared,
                    span,
                });
                break;
            }
            let close = self.close_of(pos);
            let body_end = close.unwrap_or(text.len());
            let columns = if declared.is_empty() {
                infer_select_columns(&text[pos + 1..body_end])
            } else {
                declared
            };
            ctes.push(CteRef {
                name,
                columns,
                span,
            });

            let Some(close) = close else {
                break;
            };
            pos = skip_ws(text, close + 1);
            if text[pos..].starts_with(',') {
                pos += 1;
            } else {
                break;
            }
        }
        ctes
    }

    fn close_of(&self, open: usize) -> Option<usize> {
        self.groups
            .iter()
            .find(|group| group.open == open)
            .and_then(|group| group.close)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RawRelation {
    schema: Option<String>,
    table: String,
    alias: Option<(String, Span)>,
    span: Span,
}

/// Parses `relation [AS] [alias] [, ...]` starting at `pos`.
fn parse_relations(text: &str, mut pos: usize, allow_list: bool) -> Vec<RawRelation> {
    let mut out = Vec::new();
    loop {
        pos = skip_ws(text, pos);
        for prefix in ["LATERAL", "ONLY"] {
            if let Some(next) = expect_word(text, pos, prefix) {
                pos = skip_ws(text, next);
            }
        }

        let relation = if text[pos..].starts_with('(') {
            // Derived table: only its alias names it.
            let close = text[pos..].find(')').map_or(text.len(), |off| pos + off + 1);
            let (alias, end) = read_alias(text, close);
            pos = end;
            alias.map(|(alias, span)| RawRelation {
                schema: None,
                table: alias.clone(),
                alias: Some((alias, span)),
                span,
            })
        } else {
            let Some((schema, table, span, quoted)) = read_qualified(text, pos) else {
                break;
            };
            if !quoted && is_reserved(&table) {
                break;
            }
            pos = span.end;
            // Table function arguments.
            let after = skip_ws(text, pos);
            if text[after..].starts_with('(') {
                pos = text[after..].find(')').map_or(text.len(), |off| after + off + 1);
            }
            let (alias, end) = read_alias(text, pos);
            pos = end;
            Some(RawRelation {
                schema,
                table,
                alias,
                span,
            })
        };

        out.extend(relation);

        if !allow_list {
            break;
        }
        let next = skip_ws(text, pos);
        if text[next..].starts_with(',') {
            pos = next + 1;
        } else {
            break;
        }
    }
    out
}

fn read_alias(text: &str, pos: usize) -> (Option<(String, Span)>, usize) {
    let start = skip_ws(text, pos);
    match read_identifier(text, start) {
        Some((word, span, false)) if word.eq_ignore_ascii_case("AS") => {
            let alias_start = skip_ws(text, span.end);
            match read_identifier(text, alias_start) {
                Some((alias, alias_span, quoted)) if quoted || !is_reserved(&alias) => {
                    (Some((alias, alias_span)), alias_span.end)
                }
                _ => (None, span.end),
            }
        }
        Some((alias, span, quoted)) if quoted || !is_reserved(&alias) => {
            (Some((alias, span)), span.end)
        }
        _ => (None, pos),
    }
}

fn read_qualified(text: &str, pos: usize) -> Option<(Option<String>, String, Span, bool)> {
    let (first, first_span, first_quoted) = read_identifier(text, pos)?;
    let mut parts = vec![(first, first_quoted)];
    let mut end = first_span.end;
    while text[end..].starts_with('.') {
        match read_identifier(text, end + 1) {
            Some((part, span, quoted)) => {
                parts.push((part, quoted));
                end = span.end;
            }
            None => {
                // `schema.` still being typed.
                end += 1;
                break;
            }
        }
    }
    let (table, quoted) = parts.pop()?;
    let schema = parts.pop().map(|(schema, _)| schema);
    Some((schema, table, Span::new(pos, end), quoted))
}

/// Reads a bare or quoted identifier at `pos`: `(name, span, quoted)`.
fn read_identifier(text: &str, pos: usize) -> Option<(String, Span, bool)> {
    let rest = text.get(pos..)?;
    let first = rest.chars().next()?;
    let close = match first {
        '"' => Some('"'),
        '`' => Some('`'),
        '[' => Some(']'),
        _ => None,
    };
    if let Some(close) = close {
        let len = rest[1..].find(close)?;
        if len == 0 {
            return None;
        }
        return Some((
            rest[1..1 + len].to_string(),
            Span::new(pos, pos + len + 2),
            true,
        ));
    }
    if !(first.is_alphabetic() || first == '_') {
        return None;
    }
    let len = rest
        .find(|c: char| !is_ident_char(c))
        .unwrap_or(rest.len());
    Some((rest[..len].to_string(), Span::new(pos, pos + len), false))
}

/// Position after `word` when it starts at `pos` as a whole word.
fn expect_word(text: &str, pos: usize, word: &str) -> Option<usize> {
    let (found, span, quoted) = read_identifier(text, pos)?;
    (!quoted && found.eq_ignore_ascii_case(word)).then_some(span.end)
}

fn skip_ws(text: &str, pos: usize) -> usize {
    let pos = pos.min(text.len());
    text[pos..]
        .find(|c: char| !c.is_whitespace())
        .map_or(text.len(), |offset| pos + offset)
}

fn unquote(name: &str) -> String {
    let trimmed = name.trim();
    for (open, close) in [('"', '"'), ('`', '`'), ('[', ']')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.to_string();
        }
    }
    trimmed.to_string()
}

/// Output column names of a simple `SELECT` body: `col`, `t.col`,
/// `expr AS name` and `expr name`. Other items are skipped.
fn infer_select_columns(body: &str) -> Vec<String> {
    let top = top_level(body);
    let Some(select) = SELECT_KEYWORD.find(&top) else {
        return Vec::new();
    };
    let list_end = FROM_KEYWORD
        .find_at(&top, select.end())
        .map_or(top.len(), |m| m.start());
    let mut list = top[select.end()..list_end].trim_start();
    if let Some(rest) = expect_word(list, 0, "DISTINCT") {
        list = &list[rest..];
    }

    list.split(',')
        .filter_map(|item| {
            let item = item.trim();
            if let Some(caps) = EXPLICIT_ALIAS.captures(item) {
                return Some(unquote(&caps[1]));
            }
            if let Some(caps) = COLUMN_REFERENCE.captures(item) {
                return Some(unquote(&caps[1]));
            }
            IMPLICIT_ALIAS
                .captures(item)
                .map(|caps| caps[1].to_string())
                .filter(|alias| !is_reserved(alias))
        })
        .collect()
}

/// Blanks everything nested inside parentheses, keeping the parens.
fn top_level(text: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' => {
                depth += 1;
                out.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                out.push(ch);
            }
            _ if depth > 0 => {
                for _ in 0..ch.len_utf8() {
                    out.push(' ');
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_at_end(sql: &str) -> SqlContext {
        sql_context(sql, sql.len(), Dialect::Postgres)
    }

    fn ctx_at_marker(sql: &str) -> SqlContext {
        let cursor = sql.find('|').expect("cursor marker");
        let text = sql.replacen('|', "", 1);
        sql_context(&text, cursor, Dialect::Postgres)
    }

    fn table_names(ctx: &SqlContext) -> Vec<(String, Option<String>)> {
        ctx.tables_in_scope
            .iter()
            .map(|t| (t.table.clone(), t.alias.clone()))
            .collect()
    }

    #[test]
    fn test_join_condition_context() {
        let ctx = ctx_at_end("SELECT id, FROM users u JOIN orders o ON ");
        assert_eq!(ctx.clause, SqlClause::On);
        assert_eq!(ctx.expected, ExpectedType::JoinCondition);
        assert_eq!(
            table_names(&ctx),
            vec![
                ("users".to_string(), Some("u".to_string())),
                ("orders".to_string(), Some("o".to_string())),
            ]
        );
    }

    #[test]
    fn test_from_expects_table() {
        let ctx = ctx_at_end("SELECT * FROM ");
        assert_eq!(ctx.clause, SqlClause::From);
        assert_eq!(ctx.expected, ExpectedType::TableOrSchema);

        let ctx = ctx_at_end("SELECT * FROM users ");
        assert_eq!(ctx.expected, ExpectedType::Keyword);
    }

    #[test]
    fn test_comma_separated_from_list() {
        let ctx = ctx_at_marker("SELECT | FROM a x, public.b AS y, c");
        assert_eq!(ctx.clause, SqlClause::Select);
        assert_eq!(ctx.expected, ExpectedType::ColumnOrExpression);
        assert_eq!(ctx.tables_in_scope.len(), 3);
        assert_eq!(ctx.tables_in_scope[1].schema.as_deref(), Some("public"));
        assert_eq!(ctx.tables_in_scope[1].alias.as_deref(), Some("y"));
        assert_eq!(ctx.tables_in_scope[2].alias, None);
    }

    #[test]
    fn test_keyword_alias_is_discarded() {
        let ctx = ctx_at_end("SELECT * FROM users WHERE ");
        assert_eq!(table_names(&ctx), vec![("users".to_string(), None)]);
        assert_eq!(ctx.clause, SqlClause::Where);
        assert_eq!(ctx.expected, ExpectedType::Column);
    }

    #[test]
    fn test_table_being_typed_is_not_in_scope() {
        let ctx = ctx_at_end("SELECT * FROM us");
        assert!(ctx.tables_in_scope.is_empty());
        assert_eq!(ctx.current_word, "us");
        assert_eq!(ctx.expected, ExpectedType::TableOrSchema);
    }

    #[test]
    fn test_qualifier_resolution_order() {
        let ctx = ctx_at_marker("WITH u AS (SELECT 1 AS n) SELECT u.| FROM users u");
        assert_eq!(ctx.qualifier_target, Some(QualifierTarget::Cte { name: "u".into() }));

        let ctx = ctx_at_marker("SELECT o.| FROM orders o");
        assert_eq!(
            ctx.qualifier_target,
            Some(QualifierTarget::Table {
                schema: None,
                table: "orders".into()
            })
        );
        assert_eq!(ctx.expected, ExpectedType::Column);

        let ctx = ctx_at_marker("SELECT * FROM analytics.|");
        assert_eq!(
            ctx.qualifier_target,
            Some(QualifierTarget::Schema {
                name: "analytics".into()
            })
        );
        assert_eq!(ctx.expected, ExpectedType::TableOrSchema);
    }

    #[test]
    fn test_cte_columns_declared_and_inferred() {
        let ctx = ctx_at_end(
            "WITH a (x, y) AS (SELECT 1, 2), b AS MATERIALIZED (SELECT id, t.name, count(*) AS total FROM t) SELECT ",
        );
        assert_eq!(ctx.ctes_in_scope.len(), 2);
        assert_eq!(ctx.ctes_in_scope[0].columns, vec!["x", "y"]);
        assert_eq!(ctx.ctes_in_scope[1].name, "b");
        assert_eq!(ctx.ctes_in_scope[1].columns, vec!["id", "name", "total"]);
    }

    #[test]
    fn test_subquery_scope() {
        let ctx = ctx_at_marker("SELECT * FROM users WHERE id IN (SELECT | FROM orders o)");
        assert_eq!(ctx.clause, SqlClause::Select);
        assert_eq!(ctx.depth, 1);
        assert_eq!(table_names(&ctx), vec![("orders".to_string(), Some("o".to_string()))]);
    }

    #[test]
    fn test_subquery_opening_paren_expects_keyword() {
        let ctx = ctx_at_end("SELECT * FROM users WHERE EXISTS (");
        assert_eq!(ctx.expected, ExpectedType::Keyword);
        let ctx = ctx_at_end("WITH recent AS (");
        assert_eq!(ctx.expected, ExpectedType::Keyword);
    }

    #[test]
    fn test_closed_groups_do_not_change_clause() {
        let ctx = ctx_at_end("SELECT * FROM (SELECT a FROM t WHERE b = 1) sub WHERE sub.a = 1 AND ");
        assert_eq!(ctx.clause, SqlClause::Where);
        assert_eq!(ctx.expected, ExpectedType::Column);
        assert_eq!(table_names(&ctx), vec![("sub".to_string(), Some("sub".to_string()))]);
    }

    #[test]
    fn test_window_specification() {
        let ctx = ctx_at_end("SELECT ROW_NUMBER() OVER (PARTITION BY ");
        assert!(ctx.in_window);
        assert_eq!(ctx.expected, ExpectedType::Column);

        let ctx = ctx_at_end("SELECT ROW_NUMBER() OVER (");
        assert_eq!(ctx.expected, ExpectedType::Keyword);
    }

    #[test]
    fn test_case_expression() {
        let ctx = ctx_at_end("SELECT CASE WHEN ");
        assert!(ctx.in_case);
        assert_eq!(ctx.expected, ExpectedType::ColumnOrExpression);

        let ctx = ctx_at_end("SELECT CASE WHEN status = ");
        assert_eq!(ctx.expected, ExpectedType::Value);

        let ctx = ctx_at_end("SELECT CASE WHEN a THEN 1 END, ");
        assert!(!ctx.in_case);
    }

    #[test]
    fn test_punctuation_layer() {
        assert_eq!(ctx_at_end("SELECT a FROM t WHERE a = ").expected, ExpectedType::Value);
        assert_eq!(ctx_at_end("SELECT a::").expected, ExpectedType::DataType);
        assert_eq!(ctx_at_end("SELECT CAST(a AS ").expected, ExpectedType::DataType);
        assert_eq!(ctx_at_end("SELECT a FROM t WHERE a ").expected, ExpectedType::Keyword);
        assert_eq!(ctx_at_end("INSERT INTO t (").expected, ExpectedType::Column);
        assert_eq!(ctx_at_end("INSERT INTO t (a) VALUES (").expected, ExpectedType::Value);
        assert_eq!(ctx_at_marker("SELECT coa|(x)").expected, ExpectedType::Function);
    }

    #[test]
    fn test_join_before_on() {
        let ctx = ctx_at_end("SELECT * FROM a JOIN ");
        assert_eq!(ctx.clause, SqlClause::Join);
        assert_eq!(ctx.expected, ExpectedType::TableOrSchema);

        let ctx = ctx_at_end("SELECT * FROM a JOIN b ");
        assert_eq!(ctx.expected, ExpectedType::Keyword);

        let ctx = ctx_at_end("SELECT * FROM a LEFT ");
        assert_eq!(ctx.expected, ExpectedType::Keyword);
    }

    #[test]
    fn test_upsert_clauses_keep_insert_target() {
        let ctx = ctx_at_end("INSERT INTO orders (id) VALUES (1) ON CONFLICT (");
        assert_eq!(ctx.clause, SqlClause::Insert);
        assert_eq!(ctx.expected, ExpectedType::Column);

        let ctx = ctx_at_end("INSERT INTO orders (id) VALUES (1) ON DUPLICATE KEY UPDATE ");
        assert_eq!(ctx.clause, SqlClause::Set);
        assert_eq!(ctx.expected, ExpectedType::Column);
        let tables: Vec<_> = ctx.tables_in_scope.iter().map(|t| t.table.as_str()).collect();
        assert_eq!(tables, vec!["orders"]);
    }

    #[test]
    fn test_create_table_data_type() {
        let ctx = ctx_at_end("CREATE TABLE t (id ");
        assert_eq!(ctx.clause, SqlClause::Create);
        assert_eq!(ctx.expected, ExpectedType::DataType);
    }

    #[test]
    fn test_comment_context_is_opaque() {
        let ctx = ctx_at_end("SELECT 1 -- FR");
        assert!(ctx.in_comment);
        assert_eq!(ctx.current_word, "FR");
    }

    #[test]
    fn test_only_current_statement_is_analysed() {
        let ctx = ctx_at_end("SELECT * FROM a; SELECT * FROM b WHERE ");
        assert_eq!(table_names(&ctx), vec![("b".to_string(), None)]);
        assert_eq!(ctx.statement_span.start, 16);
    }

    #[test]
    fn test_empty_and_invalid_input() {
        let ctx = ctx_at_end("");
        assert_eq!(ctx.clause, SqlClause::Unknown);
        assert_eq!(ctx.expected, ExpectedType::Any);

        let ctx = sql_context("SELECT", 99, Dialect::Postgres);
        assert_eq!(ctx, SqlContext::empty());
    }

    #[test]
    fn test_flatten_keeps_cursor_group() {
        let text = "a (b) (c ";
        let groups = paren_groups(text);
        assert_eq!(flatten(text, &groups, text.len()), "a ( ) (c ");
    }
}
