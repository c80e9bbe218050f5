//! SQL operators and the type categories they apply to.

use crate::types::{Dialect, DialectSet};

/// Coarse type family of a column, derived from its declared data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TypeCategory {
    Numeric,
    Text,
    Temporal,
    Boolean,
    Json,
    Array,
    Any,
}

impl TypeCategory {
    /// Classifies a declared column type such as `varchar(255)` or `timestamptz`.
    pub(crate) fn of_data_type(data_type: &str) -> TypeCategory {
        let lower = data_type.trim().to_ascii_lowercase();
        if lower.ends_with("[]") || lower.starts_with("array") {
            return TypeCategory::Array;
        }
        let base = lower
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        match base {
            "int" | "integer" | "int2" | "int4" | "int8" | "smallint" | "bigint" | "tinyint"
            | "mediumint" | "serial" | "bigserial" | "smallserial" | "decimal" | "numeric"
            | "real" | "float" | "float4" | "float8" | "double" | "money" | "smallmoney" => {
                TypeCategory::Numeric
            }
            "char" | "character" | "varchar" | "nchar" | "nvarchar" | "text" | "tinytext"
            | "mediumtext" | "longtext" | "ntext" | "citext" | "string" | "uuid" | "enum" => {
                TypeCategory::Text
            }
            "date" | "time" | "timetz" | "timestamp" | "timestamptz" | "datetime" | "datetime2"
            | "smalldatetime" | "datetimeoffset" | "interval" | "year" => TypeCategory::Temporal,
            "bool" | "boolean" | "bit" => TypeCategory::Boolean,
            "json" | "jsonb" => TypeCategory::Json,
            _ => TypeCategory::Any,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OperatorSpec {
    pub symbol: &'static str,
    pub description: &'static str,
    pub categories: &'static [TypeCategory],
    pub dialects: DialectSet,
}

use TypeCategory as T;

const ORDERED: &[TypeCategory] = &[T::Numeric, T::Text, T::Temporal];
const ARITHMETIC: &[TypeCategory] = &[T::Numeric, T::Temporal];
const PG: DialectSet = DialectSet::POSTGRES;
const JSON_DIALECTS: DialectSet = DialectSet::POSTGRES
    .union(DialectSet::MYSQL_FAMILY)
    .union(DialectSet::SQLITE);

const fn op(
    symbol: &'static str,
    description: &'static str,
    categories: &'static [TypeCategory],
    dialects: DialectSet,
) -> OperatorSpec {
    OperatorSpec {
        symbol,
        description,
        categories,
        dialects,
    }
}

pub(crate) static OPERATORS: &[OperatorSpec] = &[
    op("=", "Equal", &[T::Any], DialectSet::ALL),
    op("<>", "Not equal", &[T::Any], DialectSet::ALL),
    op("!=", "Not equal", &[T::Any], DialectSet::ALL),
    op("<", "Less than", ORDERED, DialectSet::ALL),
    op(">", "Greater than", ORDERED, DialectSet::ALL),
    op("<=", "Less than or equal", ORDERED, DialectSet::ALL),
    op(">=", "Greater than or equal", ORDERED, DialectSet::ALL),
    op("+", "Addition", ARITHMETIC, DialectSet::ALL),
    op("-", "Subtraction", ARITHMETIC, DialectSet::ALL),
    op("*", "Multiplication", &[T::Numeric], DialectSet::ALL),
    op("/", "Division", &[T::Numeric], DialectSet::ALL),
    op("%", "Modulo", &[T::Numeric], DialectSet::ALL),
    op("||", "String concatenation", &[T::Text, T::Array], DialectSet::POSTGRES.union(DialectSet::SQLITE)),
    op("~", "Matches regex", &[T::Text], PG),
    op("~*", "Matches regex, case-insensitive", &[T::Text], PG),
    op("->", "JSON field", &[T::Json], JSON_DIALECTS),
    op("->>", "JSON field as text", &[T::Json], JSON_DIALECTS),
    op("#>", "JSON path", &[T::Json], PG),
    op("@>", "Contains", &[T::Json, T::Array], PG),
    op("<@", "Contained by", &[T::Json, T::Array], PG),
    op("&&", "Overlaps", &[T::Array], PG),
];

/// Operators usable on a value of `category` in `dialect`.
///
/// An unknown category only yields operators that apply to any type.
pub(crate) fn operators_for(
    category: Option<TypeCategory>,
    dialect: Dialect,
) -> impl Iterator<Item = &'static OperatorSpec> {
    let category = category.unwrap_or(TypeCategory::Any);
    OPERATORS.iter().filter(move |spec| {
        spec.dialects.contains(dialect)
            && (spec.categories.contains(&TypeCategory::Any) || spec.categories.contains(&category))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_category_parsing() {
        assert_eq!(TypeCategory::of_data_type("VARCHAR(255)"), TypeCategory::Text);
        assert_eq!(TypeCategory::of_data_type("bigint"), TypeCategory::Numeric);
        assert_eq!(TypeCategory::of_data_type("timestamp with time zone"), TypeCategory::Temporal);
        assert_eq!(TypeCategory::of_data_type("jsonb"), TypeCategory::Json);
        assert_eq!(TypeCategory::of_data_type("text[]"), TypeCategory::Array);
        assert_eq!(TypeCategory::of_data_type("geometry"), TypeCategory::Any);
    }

    #[test]
    fn test_unknown_type_only_gets_universal_operators() {
        let symbols: Vec<_> = operators_for(None, Dialect::Postgres)
            .map(|spec| spec.symbol)
            .collect();
        assert_eq!(symbols, vec!["=", "<>", "!="]);
    }

    #[test]
    fn test_json_operators_need_json_column() {
        let numeric: Vec<_> = operators_for(Some(TypeCategory::Numeric), Dialect::Postgres)
            .map(|spec| spec.symbol)
            .collect();
        assert!(numeric.contains(&">="));
        assert!(!numeric.contains(&"->>"));

        let json: Vec<_> = operators_for(Some(TypeCategory::Json), Dialect::Mysql)
            .map(|spec| spec.symbol)
            .collect();
        assert!(json.contains(&"->>"));
        assert!(!json.contains(&"@>"));
    }
}
