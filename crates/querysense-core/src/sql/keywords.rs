//! Compiled-in SQL keyword rules.
//!
//! Each rule names the clauses after which the keyword is a sensible next
//! token, the clause it opens (if any), and the dialects that support it.
//! Clause detection is derived from the `opens` column so the two never
//! drift apart.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Dialect, DialectSet, SqlClause};

#[derive(Debug, Clone, Copy)]
pub(crate) struct KeywordRule {
    pub name: &'static str,
    /// Clauses after which the keyword may follow. `Unknown` means statement start.
    pub after: &'static [SqlClause],
    pub opens: Option<SqlClause>,
    pub description: &'static str,
    pub dialects: DialectSet,
}

use SqlClause as C;

const fn kw(
    name: &'static str,
    after: &'static [SqlClause],
    opens: Option<SqlClause>,
    description: &'static str,
) -> KeywordRule {
    KeywordRule {
        name,
        after,
        opens,
        description,
        dialects: DialectSet::ALL,
    }
}

const fn kw_in(
    name: &'static str,
    after: &'static [SqlClause],
    opens: Option<SqlClause>,
    description: &'static str,
    dialects: DialectSet,
) -> KeywordRule {
    KeywordRule {
        name,
        after,
        opens,
        description,
        dialects,
    }
}

const START: &[SqlClause] = &[C::Unknown];
const AFTER_RELATION: &[SqlClause] = &[C::From, C::Join, C::On];
const AFTER_FILTER: &[SqlClause] = &[C::From, C::Join, C::On, C::Where];
const TAIL: &[SqlClause] = &[C::From, C::Join, C::On, C::Where, C::GroupBy, C::Having];
const CONDITION: &[SqlClause] = &[C::Where, C::On, C::Having];
const PREDICATE: &[SqlClause] = &[C::Where, C::On, C::Having, C::Select];
const MUTATION_TAIL: &[SqlClause] = &[C::Values, C::Set, C::Where, C::Delete, C::Insert];

const NOT_MSSQL: DialectSet = DialectSet::ALL.without(DialectSet::SQLSERVER);
const PG_SQLITE: DialectSet = DialectSet::POSTGRES.union(DialectSet::SQLITE);
const PG_SQLITE_MARIADB: DialectSet = PG_SQLITE.union(DialectSet::MARIADB);

pub(crate) static KEYWORDS: &[KeywordRule] = &[
    // Statement starters
    kw("SELECT", &[C::Unknown, C::With, C::Insert], Some(C::Select), "Query rows"),
    kw("INSERT INTO", START, Some(C::Insert), "Insert rows into a table"),
    kw("UPDATE", START, Some(C::Update), "Modify rows of a table"),
    kw("DELETE FROM", START, Some(C::Delete), "Delete rows from a table"),
    kw("WITH", START, Some(C::With), "Common table expressions"),
    kw("CREATE TABLE", START, Some(C::Create), "Create a table"),
    kw("CREATE VIEW", START, Some(C::Create), "Create a view"),
    kw("CREATE INDEX", START, Some(C::Create), "Create an index"),
    kw("ALTER TABLE", START, Some(C::Alter), "Change a table definition"),
    kw("DROP TABLE", START, None, "Remove a table"),
    kw_in("TRUNCATE TABLE", START, None, "Remove all rows", DialectSet::ALL.without(DialectSet::SQLITE)),
    kw_in("EXPLAIN", START, None, "Show the query plan", NOT_MSSQL),
    kw_in("SHOW", START, None, "Show server objects", DialectSet::MYSQL_FAMILY),
    kw_in("PRAGMA", START, None, "SQLite configuration", DialectSet::SQLITE),
    kw("BEGIN", START, None, "Start a transaction"),
    kw("COMMIT", START, None, "Commit the transaction"),
    kw("ROLLBACK", START, None, "Roll back the transaction"),
    // SELECT list
    kw("FROM", &[C::Select], Some(C::From), "Source relations"),
    kw("DISTINCT", &[C::Select], None, "Remove duplicate rows"),
    kw("AS", &[C::Select, C::From, C::Join, C::With], None, "Alias"),
    kw("CASE", &[C::Select, C::Where, C::OrderBy, C::Set], None, "Conditional expression"),
    kw_in("TOP", &[C::Select], None, "Limit returned rows", DialectSet::SQLSERVER),
    // Relations
    kw("WHERE", &[C::From, C::Join, C::On, C::Update, C::Set, C::Delete], Some(C::Where), "Filter rows"),
    kw("JOIN", AFTER_RELATION, Some(C::Join), "Inner join"),
    kw("INNER JOIN", AFTER_RELATION, Some(C::Join), "Rows matching in both relations"),
    kw("LEFT JOIN", AFTER_RELATION, Some(C::Join), "All rows from the left relation"),
    kw("RIGHT JOIN", AFTER_RELATION, Some(C::Join), "All rows from the right relation"),
    kw_in("FULL OUTER JOIN", AFTER_RELATION, Some(C::Join), "All rows from both relations", DialectSet::ALL.without(DialectSet::MYSQL_FAMILY)),
    kw("CROSS JOIN", AFTER_RELATION, Some(C::Join), "Cartesian product"),
    kw_in("NATURAL JOIN", AFTER_RELATION, Some(C::Join), "Join on same-named columns", NOT_MSSQL),
    kw_in("LATERAL", &[C::From, C::Join], None, "Correlated derived table", DialectSet::POSTGRES.union(DialectSet::MYSQL)),
    kw_in("CROSS APPLY", AFTER_RELATION, None, "Apply a table function per row", DialectSet::SQLSERVER),
    kw("ON", &[C::Join], Some(C::On), "Join condition"),
    kw("USING", &[C::Join, C::Delete], None, "Join on listed columns"),
    // Conditions
    kw("AND", CONDITION, None, "Logical conjunction"),
    kw("OR", CONDITION, None, "Logical disjunction"),
    kw("NOT", CONDITION, None, "Logical negation"),
    kw("IN", PREDICATE, None, "Membership test"),
    kw("BETWEEN", PREDICATE, None, "Range test"),
    kw("LIKE", PREDICATE, None, "Pattern match"),
    kw_in("ILIKE", PREDICATE, None, "Case-insensitive pattern match", DialectSet::POSTGRES),
    kw("IS NULL", PREDICATE, None, "Null test"),
    kw("IS NOT NULL", PREDICATE, None, "Non-null test"),
    kw("EXISTS", CONDITION, None, "Subquery returns rows"),
    // Grouping and ordering
    kw("GROUP BY", AFTER_FILTER, Some(C::GroupBy), "Group rows"),
    kw("HAVING", &[C::GroupBy], Some(C::Having), "Filter groups"),
    kw("ORDER BY", TAIL, Some(C::OrderBy), "Sort rows"),
    kw_in("WITH ROLLUP", &[C::GroupBy], None, "Super-aggregate rows", DialectSet::MYSQL_FAMILY),
    kw("ASC", &[C::OrderBy], None, "Ascending order"),
    kw("DESC", &[C::OrderBy], None, "Descending order"),
    kw_in("NULLS FIRST", &[C::OrderBy], None, "Nulls sort first", PG_SQLITE),
    kw_in("NULLS LAST", &[C::OrderBy], None, "Nulls sort last", PG_SQLITE),
    kw_in("LIMIT", &[C::From, C::Join, C::On, C::Where, C::GroupBy, C::Having, C::OrderBy], Some(C::Limit), "Limit returned rows", NOT_MSSQL),
    kw("OFFSET", &[C::OrderBy, C::Limit], Some(C::Limit), "Skip rows"),
    kw_in("FETCH NEXT", &[C::OrderBy, C::Limit], None, "Limit rows (standard form)", DialectSet::POSTGRES.union(DialectSet::SQLSERVER)),
    kw("UNION", &[C::From, C::Join, C::On, C::Where, C::GroupBy, C::Having], None, "Combine result sets"),
    kw("UNION ALL", &[C::From, C::Join, C::On, C::Where, C::GroupBy, C::Having], None, "Combine keeping duplicates"),
    kw("INTERSECT", &[C::From, C::Where], None, "Rows present in both results"),
    kw_in("EXCEPT", &[C::From, C::Where], None, "Rows of the first result only", DialectSet::ALL.without(DialectSet::MYSQL)),
    // Window
    kw("OVER", &[C::Select, C::OrderBy], None, "Window specification"),
    kw("PARTITION BY", &[C::Select], None, "Window partitioning"),
    // Data modification
    kw("VALUES", &[C::Insert], Some(C::Values), "Literal rows"),
    kw("DEFAULT VALUES", &[C::Insert], None, "Insert a row of defaults"),
    kw("SET", &[C::Update], Some(C::Set), "Assign columns"),
    kw_in("ON CONFLICT", &[C::Values, C::Insert], Some(C::Insert), "Upsert handling", PG_SQLITE),
    kw_in("DO NOTHING", &[C::Values, C::Insert], None, "Ignore conflicting rows", PG_SQLITE),
    kw_in("DO UPDATE SET", &[C::Insert], Some(C::Set), "Update the conflicting row", PG_SQLITE),
    kw_in("ON DUPLICATE KEY UPDATE", &[C::Values], Some(C::Set), "Upsert handling", DialectSet::MYSQL_FAMILY),
    kw_in("RETURNING", MUTATION_TAIL, Some(C::Returning), "Return modified rows", PG_SQLITE_MARIADB),
    kw_in("OUTPUT", &[C::Insert, C::Update, C::Set, C::Delete], None, "Return modified rows", DialectSet::SQLSERVER),
    // CTEs
    kw("RECURSIVE", &[C::With], None, "Self-referencing CTE"),
    kw_in("MATERIALIZED", &[C::With], None, "Force CTE materialization", DialectSet::POSTGRES),
    kw_in("NOT MATERIALIZED", &[C::With], None, "Inline the CTE", DialectSet::POSTGRES),
    // DDL
    kw("PRIMARY KEY", &[C::Create, C::Alter], None, "Primary key constraint"),
    kw("NOT NULL", &[C::Create, C::Alter], None, "Disallow nulls"),
    kw("UNIQUE", &[C::Create, C::Alter], None, "Unique constraint"),
    kw("DEFAULT", &[C::Create, C::Alter, C::Values], None, "Default value"),
    kw("REFERENCES", &[C::Create, C::Alter], None, "Foreign key target"),
    kw("CHECK", &[C::Create, C::Alter], None, "Check constraint"),
    kw("CONSTRAINT", &[C::Create, C::Alter], None, "Named constraint"),
    kw_in("IF NOT EXISTS", &[C::Create], None, "Skip when the object exists", NOT_MSSQL),
    kw_in("AUTO_INCREMENT", &[C::Create, C::Alter], None, "Generated key", DialectSet::MYSQL_FAMILY),
    kw_in("AUTOINCREMENT", &[C::Create], None, "Generated key", DialectSet::SQLITE),
    kw_in("IDENTITY", &[C::Create, C::Alter], None, "Generated key", DialectSet::SQLSERVER),
    kw_in("GENERATED ALWAYS AS IDENTITY", &[C::Create, C::Alter], None, "Generated key", DialectSet::POSTGRES),
    kw("ADD COLUMN", &[C::Alter], None, "Add a column"),
    kw("DROP COLUMN", &[C::Alter], None, "Remove a column"),
    kw("RENAME COLUMN", &[C::Alter], None, "Rename a column"),
    kw("RENAME TO", &[C::Alter], None, "Rename the table"),
    kw_in("ALTER COLUMN", &[C::Alter], None, "Change a column", DialectSet::ALL.without(DialectSet::SQLITE)),
];

/// Keywords offered in value positions.
pub(crate) static LITERAL_KEYWORDS: &[(&str, &str, DialectSet)] = &[
    ("NULL", "Missing value", DialectSet::ALL),
    ("TRUE", "Boolean true", NOT_MSSQL),
    ("FALSE", "Boolean false", NOT_MSSQL),
    ("CURRENT_DATE", "Current date", DialectSet::ALL),
    ("CURRENT_TIME", "Current time", NOT_MSSQL),
    ("CURRENT_TIMESTAMP", "Current date and time", DialectSet::ALL),
    ("DEFAULT", "Column default", DialectSet::ALL),
];

/// Keywords inside `CASE ... END`.
pub(crate) static CASE_KEYWORDS: &[(&str, &str)] = &[
    ("WHEN", "Condition branch"),
    ("THEN", "Branch result"),
    ("ELSE", "Fallback result"),
    ("END", "Close the CASE expression"),
];

/// Keywords inside `OVER (...)`.
pub(crate) static WINDOW_KEYWORDS: &[(&str, &str)] = &[
    ("PARTITION BY", "Window partitioning"),
    ("ORDER BY", "Window ordering"),
    ("ROWS BETWEEN", "Row-based frame"),
    ("RANGE BETWEEN", "Value-based frame"),
    ("UNBOUNDED PRECEDING", "Frame start"),
    ("CURRENT ROW", "Frame bound"),
    ("UNBOUNDED FOLLOWING", "Frame end"),
];

/// Words that can never be a table alias. A token from this list after a
/// relation name is read as the next clause, not as an alias.
static RESERVED: &[&str] = &[
    "ALL", "ALTER", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "CREATE", "CROSS",
    "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FETCH",
    "FROM", "FULL", "GROUP", "HAVING", "ILIKE", "IN", "INNER", "INSERT", "INTERSECT", "INTO", "IS",
    "JOIN", "LATERAL", "LEFT", "LIKE", "LIMIT", "NATURAL", "NOT", "NULL", "OFFSET", "ON", "OR",
    "ORDER", "OUTER", "OVER", "PARTITION", "QUALIFY", "RECURSIVE", "RETURNING", "RIGHT", "SELECT",
    "SET", "TABLE", "THEN", "TRUE", "UNION", "UPDATE", "USING", "VALUES", "WHEN", "WHERE",
    "WINDOW", "WITH", "APPLY", "OUTPUT",
];

static RESERVED_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| RESERVED.iter().copied().collect());

pub(crate) fn is_reserved(word: &str) -> bool {
    RESERVED_SET.contains(word.to_ascii_uppercase().as_str())
}

/// Matches every clause-opening keyword phrase, longest alternatives first.
static CLAUSE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let mut phrases: Vec<&str> = KEYWORDS
        .iter()
        .filter(|rule| rule.opens.is_some())
        .map(|rule| rule.name)
        .collect();
    phrases.sort_by_key(|phrase| std::cmp::Reverse(phrase.len()));
    phrases.dedup();
    let alternation = phrases
        .iter()
        .map(|phrase| regex::escape(phrase).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("Invalid clause regex")
});

fn clause_for_phrase(phrase: &str) -> SqlClause {
    let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
    KEYWORDS
        .iter()
        .find(|rule| rule.name.eq_ignore_ascii_case(&normalized))
        .and_then(|rule| rule.opens)
        .unwrap_or(SqlClause::Unknown)
}

/// A clause keyword occurrence found by [`clause_markers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ClauseMarker {
    pub clause: SqlClause,
    pub start: usize,
    pub end: usize,
}

/// Every clause-opening keyword in `text`, left to right.
///
/// The `UPDATE` of an upsert (`DO UPDATE`, `ON DUPLICATE KEY UPDATE`) opens
/// an assignment list, not an `UPDATE` statement.
pub(crate) fn clause_markers(text: &str) -> Vec<ClauseMarker> {
    CLAUSE_REGEX
        .find_iter(text)
        .filter(|m| !preceded_by_ident_char(text, m.start()))
        .map(|m| {
            let clause = match clause_for_phrase(m.as_str()) {
                SqlClause::Update if is_upsert_update(text, m.start()) => SqlClause::Set,
                clause => clause,
            };
            ClauseMarker {
                clause,
                start: m.start(),
                end: m.end(),
            }
        })
        .collect()
}

/// `UPDATE` at `start` follows `DO` or `KEY`.
pub(crate) fn is_upsert_update(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end();
    let word_start = before
        .rfind(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_')
        .map_or(0, |idx| idx + 1);
    let word = &before[word_start..];
    word.eq_ignore_ascii_case("DO") || word.eq_ignore_ascii_case("KEY")
}

// `\b` treats `$` as a boundary, but `$from` is an identifier.
fn preceded_by_ident_char(text: &str, start: usize) -> bool {
    text[..start]
        .chars()
        .next_back()
        .is_some_and(|ch| ch == '$' || ch == '.')
}

/// Keyword rules that may follow `clause` in `dialect`.
pub(crate) fn keywords_after(
    clause: SqlClause,
    dialect: Dialect,
) -> impl Iterator<Item = &'static KeywordRule> {
    KEYWORDS
        .iter()
        .filter(move |rule| rule.dialects.contains(dialect) && rule.after.contains(&clause))
}
