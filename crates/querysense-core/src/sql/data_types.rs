//! Column data types per dialect.

use crate::types::{Dialect, DialectSet};

const ALL: DialectSet = DialectSet::ALL;
const PG: DialectSet = DialectSet::POSTGRES;
const MY: DialectSet = DialectSet::MYSQL_FAMILY;
const MS: DialectSet = DialectSet::SQLSERVER;
const LITE: DialectSet = DialectSet::SQLITE;

pub(crate) static DATA_TYPES: &[(&str, DialectSet)] = &[
    ("INTEGER", ALL),
    ("INT", ALL),
    ("SMALLINT", ALL),
    ("BIGINT", ALL),
    ("DECIMAL", ALL),
    ("NUMERIC", ALL),
    ("REAL", ALL),
    ("FLOAT", ALL),
    ("DOUBLE PRECISION", PG.union(MY)),
    ("SERIAL", PG),
    ("BIGSERIAL", PG),
    ("TINYINT", MY.union(MS)),
    ("CHAR", ALL),
    ("VARCHAR", ALL),
    ("NVARCHAR", MS),
    ("TEXT", PG.union(MY).union(LITE)),
    ("LONGTEXT", MY),
    ("CITEXT", PG),
    ("UUID", PG),
    ("UNIQUEIDENTIFIER", MS),
    ("BOOLEAN", PG.union(MY).union(LITE)),
    ("BIT", MS.union(MY)),
    ("DATE", ALL),
    ("TIME", ALL),
    ("TIMESTAMP", PG.union(MY)),
    ("TIMESTAMPTZ", PG),
    ("DATETIME", MY.union(MS).union(LITE)),
    ("DATETIME2", MS),
    ("INTERVAL", PG),
    ("JSON", PG.union(MY)),
    ("JSONB", PG),
    ("BYTEA", PG),
    ("BLOB", MY.union(LITE)),
    ("VARBINARY", MY.union(MS)),
    ("MONEY", PG.union(MS)),
    ("ENUM", MY),
];

pub(crate) fn data_types_for(dialect: Dialect) -> impl Iterator<Item = &'static str> {
    DATA_TYPES
        .iter()
        .filter(move |(_, dialects)| dialects.contains(dialect))
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_specific_types() {
        let pg: Vec<_> = data_types_for(Dialect::Postgres).collect();
        assert!(pg.contains(&"JSONB"));
        assert!(!pg.contains(&"NVARCHAR"));

        let mssql: Vec<_> = data_types_for(Dialect::Sqlserver).collect();
        assert!(mssql.contains(&"NVARCHAR"));
        assert!(!mssql.contains(&"TEXT"));
    }
}
