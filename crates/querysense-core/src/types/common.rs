//! Common types shared between requests, contexts and results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    /// Byte offset from start of the text (inclusive)
    pub start: usize,
    /// Byte offset from start of the text (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true when `offset` falls within `[start, end]`.
    pub fn touches(&self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end
    }
}

/// SQL dialect of the document being completed.
///
/// Drives dialect-specific lexing (dollar quotes, `#` comments) and filters
/// the keyword, function and data type catalogs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
    Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Mysql,
    Mariadb,
    Sqlserver,
    Sqlite,
}

impl Dialect {
    pub const ALL: [Dialect; 5] = [
        Dialect::Postgres,
        Dialect::Mysql,
        Dialect::Mariadb,
        Dialect::Sqlserver,
        Dialect::Sqlite,
    ];

    pub fn to_sqlparser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::{MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
        match self {
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::Mysql | Self::Mariadb => Box::new(MySqlDialect {}),
            Self::Sqlserver => Box::new(MsSqlDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
        }
    }

    /// Whether `$tag$ ... $tag$` strings are recognized.
    pub fn supports_dollar_quotes(&self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// Whether `#` starts a line comment.
    pub fn supports_hash_comments(&self) -> bool {
        matches!(self, Self::Mysql | Self::Mariadb)
    }

    /// Whether backticks quote identifiers.
    pub fn supports_backtick_identifiers(&self) -> bool {
        matches!(self, Self::Mysql | Self::Mariadb | Self::Sqlite)
    }

    /// Whether `[name]` quotes identifiers.
    pub fn supports_bracket_identifiers(&self) -> bool {
        matches!(self, Self::Sqlserver | Self::Sqlite)
    }

    pub(crate) fn bit(&self) -> u8 {
        match self {
            Self::Postgres => 1 << 0,
            Self::Mysql => 1 << 1,
            Self::Mariadb => 1 << 2,
            Self::Sqlserver => 1 << 3,
            Self::Sqlite => 1 << 4,
        }
    }
}

/// Compact set of dialects used by the static rule tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialectSet(u8);

impl DialectSet {
    pub const ALL: DialectSet = DialectSet(0b1_1111);
    pub const POSTGRES: DialectSet = DialectSet(1 << 0);
    pub const MYSQL: DialectSet = DialectSet(1 << 1);
    pub const MARIADB: DialectSet = DialectSet(1 << 2);
    pub const SQLSERVER: DialectSet = DialectSet(1 << 3);
    pub const SQLITE: DialectSet = DialectSet(1 << 4);
    /// MySQL and MariaDB share most of their surface.
    pub const MYSQL_FAMILY: DialectSet = DialectSet((1 << 1) | (1 << 2));

    pub const fn union(self, other: DialectSet) -> DialectSet {
        DialectSet(self.0 | other.0)
    }

    pub const fn without(self, other: DialectSet) -> DialectSet {
        DialectSet(self.0 & !other.0)
    }

    pub fn contains(&self, dialect: Dialect) -> bool {
        self.0 & dialect.bit() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_set_membership() {
        let set = DialectSet::POSTGRES.union(DialectSet::SQLITE);
        assert!(set.contains(Dialect::Postgres));
        assert!(set.contains(Dialect::Sqlite));
        assert!(!set.contains(Dialect::Mysql));

        let no_mssql = DialectSet::ALL.without(DialectSet::SQLSERVER);
        assert!(!no_mssql.contains(Dialect::Sqlserver));
        assert!(no_mssql.contains(Dialect::Mariadb));
    }

    #[test]
    fn test_dialect_serde_lowercase() {
        let json = serde_json::to_string(&Dialect::Sqlserver).unwrap();
        assert_eq!(json, "\"sqlserver\"");
        let parsed: Dialect = serde_json::from_str("\"mariadb\"").unwrap();
        assert_eq!(parsed, Dialect::Mariadb);
    }

    #[test]
    fn test_span_touches() {
        let span = Span::new(3, 7);
        assert!(span.touches(3));
        assert!(span.touches(7));
        assert!(!span.touches(8));
        assert_eq!(span.len(), 4);
    }
}
