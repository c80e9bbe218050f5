//! SQL function catalog.
//!
//! Completion items are built from the static table on first use per dialect
//! and memoized in [`crate::cache::FUNCTION_CACHE`]. Context bonuses for
//! aggregates are applied by the generators on the cloned items.

use std::sync::Arc;

use crate::cache::FUNCTION_CACHE;
use crate::types::{CompletionItem, CompletionItemKind, Dialect, DialectSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FunctionCategory {
    Aggregate,
    Window,
    String,
    Numeric,
    DateTime,
    Conditional,
    Conversion,
    Json,
    Array,
}

impl FunctionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregate => "aggregate",
            Self::Window => "window",
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::DateTime => "datetime",
            Self::Conditional => "conditional",
            Self::Conversion => "conversion",
            Self::Json => "json",
            Self::Array => "array",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FunctionSpec {
    pub name: &'static str,
    pub category: FunctionCategory,
    /// Call template shown as the item detail.
    pub syntax: &'static str,
    pub example: &'static str,
    pub description: &'static str,
    pub dialects: DialectSet,
}

use FunctionCategory as F;

const ALL: DialectSet = DialectSet::ALL;
const PG: DialectSet = DialectSet::POSTGRES;
const MY: DialectSet = DialectSet::MYSQL_FAMILY;
const MS: DialectSet = DialectSet::SQLSERVER;
const LITE: DialectSet = DialectSet::SQLITE;
const NOT_MS: DialectSet = DialectSet::ALL.without(DialectSet::SQLSERVER);
const NOT_LITE: DialectSet = DialectSet::ALL.without(DialectSet::SQLITE);

const fn func(
    name: &'static str,
    category: FunctionCategory,
    syntax: &'static str,
    example: &'static str,
    description: &'static str,
    dialects: DialectSet,
) -> FunctionSpec {
    FunctionSpec {
        name,
        category,
        syntax,
        example,
        description,
        dialects,
    }
}

pub(crate) static FUNCTIONS: &[FunctionSpec] = &[
    // Aggregates
    func("COUNT", F::Aggregate, "COUNT(expr)", "COUNT(*)", "Number of rows", ALL),
    func("SUM", F::Aggregate, "SUM(expr)", "SUM(amount)", "Sum of values", ALL),
    func("AVG", F::Aggregate, "AVG(expr)", "AVG(price)", "Average of values", ALL),
    func("MIN", F::Aggregate, "MIN(expr)", "MIN(created_at)", "Smallest value", ALL),
    func("MAX", F::Aggregate, "MAX(expr)", "MAX(created_at)", "Largest value", ALL),
    func("STRING_AGG", F::Aggregate, "STRING_AGG(expr, delimiter)", "STRING_AGG(name, ', ')", "Concatenate values", PG.union(MS)),
    func("GROUP_CONCAT", F::Aggregate, "GROUP_CONCAT(expr)", "GROUP_CONCAT(name)", "Concatenate values", MY.union(LITE)),
    func("ARRAY_AGG", F::Aggregate, "ARRAY_AGG(expr)", "ARRAY_AGG(id)", "Collect values into an array", PG),
    func("JSON_AGG", F::Aggregate, "JSON_AGG(expr)", "JSON_AGG(row)", "Collect values into a JSON array", PG),
    func("BOOL_AND", F::Aggregate, "BOOL_AND(expr)", "BOOL_AND(active)", "True when all values are true", PG),
    func("BOOL_OR", F::Aggregate, "BOOL_OR(expr)", "BOOL_OR(active)", "True when any value is true", PG),
    func("STDDEV", F::Aggregate, "STDDEV(expr)", "STDDEV(score)", "Sample standard deviation", PG.union(MY)),
    func("VARIANCE", F::Aggregate, "VARIANCE(expr)", "VARIANCE(score)", "Sample variance", PG.union(MY)),
    func("STDEV", F::Aggregate, "STDEV(expr)", "STDEV(score)", "Sample standard deviation", MS),
    // Window
    func("ROW_NUMBER", F::Window, "ROW_NUMBER() OVER (...)", "ROW_NUMBER() OVER (ORDER BY id)", "Sequential row number", ALL),
    func("RANK", F::Window, "RANK() OVER (...)", "RANK() OVER (ORDER BY score DESC)", "Rank with gaps", ALL),
    func("DENSE_RANK", F::Window, "DENSE_RANK() OVER (...)", "DENSE_RANK() OVER (ORDER BY score)", "Rank without gaps", ALL),
    func("NTILE", F::Window, "NTILE(n) OVER (...)", "NTILE(4) OVER (ORDER BY score)", "Bucket number", ALL),
    func("LAG", F::Window, "LAG(expr [, offset [, default]]) OVER (...)", "LAG(price) OVER (ORDER BY day)", "Value from a previous row", ALL),
    func("LEAD", F::Window, "LEAD(expr [, offset [, default]]) OVER (...)", "LEAD(price) OVER (ORDER BY day)", "Value from a following row", ALL),
    func("FIRST_VALUE", F::Window, "FIRST_VALUE(expr) OVER (...)", "FIRST_VALUE(price) OVER w", "First value in the frame", ALL),
    func("LAST_VALUE", F::Window, "LAST_VALUE(expr) OVER (...)", "LAST_VALUE(price) OVER w", "Last value in the frame", ALL),
    func("PERCENT_RANK", F::Window, "PERCENT_RANK() OVER (...)", "PERCENT_RANK() OVER (ORDER BY score)", "Relative rank", ALL),
    func("CUME_DIST", F::Window, "CUME_DIST() OVER (...)", "CUME_DIST() OVER (ORDER BY score)", "Cumulative distribution", ALL),
    // Strings
    func("LOWER", F::String, "LOWER(text)", "LOWER(email)", "Lowercase text", ALL),
    func("UPPER", F::String, "UPPER(text)", "UPPER(code)", "Uppercase text", ALL),
    func("LENGTH", F::String, "LENGTH(text)", "LENGTH(name)", "Character count", NOT_MS),
    func("LEN", F::String, "LEN(text)", "LEN(name)", "Character count", MS),
    func("TRIM", F::String, "TRIM(text)", "TRIM(name)", "Strip surrounding whitespace", ALL),
    func("LTRIM", F::String, "LTRIM(text)", "LTRIM(name)", "Strip leading whitespace", ALL),
    func("RTRIM", F::String, "RTRIM(text)", "RTRIM(name)", "Strip trailing whitespace", ALL),
    func("SUBSTRING", F::String, "SUBSTRING(text, start, length)", "SUBSTRING(name, 1, 3)", "Part of a string", NOT_LITE),
    func("SUBSTR", F::String, "SUBSTR(text, start, length)", "SUBSTR(name, 1, 3)", "Part of a string", PG.union(MY).union(LITE)),
    func("REPLACE", F::String, "REPLACE(text, from, to)", "REPLACE(phone, '-', '')", "Replace occurrences", ALL),
    func("CONCAT", F::String, "CONCAT(a, b, ...)", "CONCAT(first, ' ', last)", "Concatenate strings", NOT_LITE),
    func("CONCAT_WS", F::String, "CONCAT_WS(sep, a, b, ...)", "CONCAT_WS(', ', city, country)", "Concatenate with separator", NOT_LITE),
    func("LEFT", F::String, "LEFT(text, n)", "LEFT(code, 2)", "Leading characters", NOT_LITE),
    func("RIGHT", F::String, "RIGHT(text, n)", "RIGHT(code, 2)", "Trailing characters", NOT_LITE),
    func("POSITION", F::String, "POSITION(sub IN text)", "POSITION('@' IN email)", "Index of a substring", PG.union(MY)),
    func("INSTR", F::String, "INSTR(text, sub)", "INSTR(email, '@')", "Index of a substring", MY.union(LITE)),
    func("CHARINDEX", F::String, "CHARINDEX(sub, text)", "CHARINDEX('@', email)", "Index of a substring", MS),
    func("SPLIT_PART", F::String, "SPLIT_PART(text, delimiter, n)", "SPLIT_PART(email, '@', 2)", "Nth field of a split string", PG),
    func("REGEXP_REPLACE", F::String, "REGEXP_REPLACE(text, pattern, replacement)", "REGEXP_REPLACE(s, '\\s+', ' ')", "Regex replace", PG.union(MY)),
    // Numeric
    func("ABS", F::Numeric, "ABS(n)", "ABS(delta)", "Absolute value", ALL),
    func("ROUND", F::Numeric, "ROUND(n [, digits])", "ROUND(price, 2)", "Round a number", ALL),
    func("CEIL", F::Numeric, "CEIL(n)", "CEIL(ratio)", "Round up", PG.union(MY)),
    func("CEILING", F::Numeric, "CEILING(n)", "CEILING(ratio)", "Round up", NOT_LITE),
    func("FLOOR", F::Numeric, "FLOOR(n)", "FLOOR(ratio)", "Round down", NOT_LITE),
    func("MOD", F::Numeric, "MOD(a, b)", "MOD(id, 10)", "Remainder", PG.union(MY)),
    func("POWER", F::Numeric, "POWER(base, exp)", "POWER(2, 10)", "Exponentiation", NOT_LITE),
    func("SQRT", F::Numeric, "SQRT(n)", "SQRT(area)", "Square root", NOT_LITE),
    func("RANDOM", F::Numeric, "RANDOM()", "RANDOM()", "Random value", PG.union(LITE)),
    func("RAND", F::Numeric, "RAND()", "RAND()", "Random value", MY.union(MS)),
    // Date and time
    func("NOW", F::DateTime, "NOW()", "NOW()", "Current timestamp", PG.union(MY)),
    func("DATE_TRUNC", F::DateTime, "DATE_TRUNC(unit, ts)", "DATE_TRUNC('month', created_at)", "Truncate to a unit", PG),
    func("EXTRACT", F::DateTime, "EXTRACT(field FROM ts)", "EXTRACT(YEAR FROM created_at)", "Date part", PG.union(MY)),
    func("DATE_PART", F::DateTime, "DATE_PART(field, ts)", "DATE_PART('dow', created_at)", "Date part", PG),
    func("AGE", F::DateTime, "AGE(ts [, ts])", "AGE(birth_date)", "Interval between timestamps", PG),
    func("TO_CHAR", F::DateTime, "TO_CHAR(value, format)", "TO_CHAR(created_at, 'YYYY-MM')", "Format as text", PG),
    func("DATE_FORMAT", F::DateTime, "DATE_FORMAT(ts, format)", "DATE_FORMAT(created_at, '%Y-%m')", "Format as text", MY),
    func("DATEDIFF", F::DateTime, "DATEDIFF(a, b)", "DATEDIFF(end_at, start_at)", "Difference between dates", MY.union(MS)),
    func("DATEADD", F::DateTime, "DATEADD(part, n, date)", "DATEADD(day, 7, created_at)", "Shift a date", MS),
    func("GETDATE", F::DateTime, "GETDATE()", "GETDATE()", "Current timestamp", MS),
    func("DATE", F::DateTime, "DATE(value)", "DATE(created_at)", "Date part of a timestamp", MY.union(LITE)),
    func("STRFTIME", F::DateTime, "STRFTIME(format, ts)", "STRFTIME('%Y', created_at)", "Format as text", LITE),
    // Conditional
    func("COALESCE", F::Conditional, "COALESCE(a, b, ...)", "COALESCE(nickname, name)", "First non-null argument", ALL),
    func("NULLIF", F::Conditional, "NULLIF(a, b)", "NULLIF(total, 0)", "Null when arguments are equal", ALL),
    func("GREATEST", F::Conditional, "GREATEST(a, b, ...)", "GREATEST(a, b)", "Largest argument", PG.union(MY)),
    func("LEAST", F::Conditional, "LEAST(a, b, ...)", "LEAST(a, b)", "Smallest argument", PG.union(MY)),
    func("IFNULL", F::Conditional, "IFNULL(a, b)", "IFNULL(discount, 0)", "Fallback for null", MY.union(LITE)),
    func("ISNULL", F::Conditional, "ISNULL(a, b)", "ISNULL(discount, 0)", "Fallback for null", MS),
    func("IIF", F::Conditional, "IIF(cond, a, b)", "IIF(paid, 'yes', 'no')", "Inline conditional", MS.union(LITE)),
    func("IF", F::Conditional, "IF(cond, a, b)", "IF(paid, 'yes', 'no')", "Inline conditional", MY),
    // Conversion
    func("CAST", F::Conversion, "CAST(expr AS type)", "CAST(id AS TEXT)", "Convert a value", ALL),
    func("CONVERT", F::Conversion, "CONVERT(type, expr)", "CONVERT(VARCHAR, id)", "Convert a value", MS.union(MY)),
    func("TRY_CAST", F::Conversion, "TRY_CAST(expr AS type)", "TRY_CAST(code AS INT)", "Convert or null", MS),
    // JSON
    func("JSON_EXTRACT", F::Json, "JSON_EXTRACT(doc, path)", "JSON_EXTRACT(data, '$.name')", "Extract a JSON value", MY.union(LITE)),
    func("JSON_VALUE", F::Json, "JSON_VALUE(doc, path)", "JSON_VALUE(data, '$.name')", "Extract a scalar JSON value", MS.union(MY)),
    func("JSONB_BUILD_OBJECT", F::Json, "JSONB_BUILD_OBJECT(key, value, ...)", "JSONB_BUILD_OBJECT('id', id)", "Build a JSON object", PG),
    func("JSONB_ARRAY_ELEMENTS", F::Json, "JSONB_ARRAY_ELEMENTS(doc)", "JSONB_ARRAY_ELEMENTS(tags)", "Expand a JSON array", PG),
    func("JSON_OBJECT", F::Json, "JSON_OBJECT(key, value, ...)", "JSON_OBJECT('id', id)", "Build a JSON object", MY.union(LITE)),
    // Arrays
    func("UNNEST", F::Array, "UNNEST(array)", "UNNEST(tags)", "Expand an array to rows", PG),
    func("ARRAY_LENGTH", F::Array, "ARRAY_LENGTH(array, dim)", "ARRAY_LENGTH(tags, 1)", "Array length", PG),
    func("GENERATE_SERIES", F::Array, "GENERATE_SERIES(start, stop [, step])", "GENERATE_SERIES(1, 10)", "Series of values", PG),
];

fn function_to_completion_item(spec: &FunctionSpec) -> CompletionItem {
    CompletionItem::new(spec.name, CompletionItemKind::Function)
        .with_detail(spec.syntax)
        .with_info(format!(
            "{} ({}). Example: {}",
            spec.description,
            spec.category.as_str(),
            spec.example
        ))
        .with_insert_text(format!("{}(", spec.name))
}

/// Function items available in `dialect`, memoized.
pub(crate) fn functions_for(dialect: Dialect) -> Arc<Vec<CompletionItem>> {
    FUNCTION_CACHE.for_dialect(dialect, || {
        FUNCTIONS
            .iter()
            .filter(|spec| spec.dialects.contains(dialect))
            .map(function_to_completion_item)
            .collect()
    })
}

/// Function items of one category available in `dialect`, memoized.
pub(crate) fn functions_in_category(
    dialect: Dialect,
    category: FunctionCategory,
) -> Arc<Vec<CompletionItem>> {
    FUNCTION_CACHE.for_category(dialect, category, || {
        FUNCTIONS
            .iter()
            .filter(|spec| spec.category == category && spec.dialects.contains(dialect))
            .map(function_to_completion_item)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_filtering() {
        let mssql = functions_for(Dialect::Sqlserver);
        assert!(mssql.iter().any(|item| item.label == "GETDATE"));
        assert!(!mssql.iter().any(|item| item.label == "DATE_TRUNC"));

        let pg = functions_for(Dialect::Postgres);
        assert!(pg.iter().any(|item| item.label == "DATE_TRUNC"));
    }

    #[test]
    fn test_category_lookup() {
        let windows = functions_in_category(Dialect::Postgres, FunctionCategory::Window);
        assert!(windows.iter().any(|item| item.label == "ROW_NUMBER"));
        assert!(windows.iter().all(|item| item.label != "COUNT"));
        let aggregates = functions_in_category(Dialect::Postgres, FunctionCategory::Aggregate);
        assert!(aggregates.iter().any(|item| item.label == "COUNT"));
    }

    #[test]
    fn test_items_carry_syntax_and_call_insert() {
        let pg = functions_for(Dialect::Postgres);
        let coalesce = pg.iter().find(|item| item.label == "COALESCE").unwrap();
        assert_eq!(coalesce.detail.as_deref(), Some("COALESCE(a, b, ...)"));
        assert_eq!(coalesce.insert_text.as_deref(), Some("COALESCE("));
        assert_eq!(coalesce.kind, CompletionItemKind::Function);
    }
}
