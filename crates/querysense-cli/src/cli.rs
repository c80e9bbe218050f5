//! CLI argument parsing using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// QuerySense - SQL and MongoDB query completion
#[derive(Parser, Debug)]
#[command(name = "querysense")]
#[command(about = "Compute editor completions for a SQL or MongoDB query", long_about = None)]
#[command(version)]
pub struct Args {
    /// Query file (reads from stdin if omitted)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Query language of the input
    #[arg(short, long, default_value = "sql", value_enum)]
    pub language: LanguageArg,

    /// SQL dialect
    #[arg(short, long, default_value = "postgres", value_enum)]
    pub dialect: DialectArg,

    /// Metadata JSON file (SqlMetadata or MongoMetadata shape)
    #[arg(short, long, value_name = "FILE")]
    pub metadata: Option<PathBuf>,

    /// Cursor byte offset (defaults to the end of the input, trailing newlines excluded)
    #[arg(long, value_name = "OFFSET", conflicts_with = "marker")]
    pub cursor: Option<usize>,

    /// Take the cursor from the first `|` in the input and remove the marker
    #[arg(long)]
    pub marker: bool,

    /// Treat the request as explicit (complete inside strings and comments)
    #[arg(long)]
    pub explicit: bool,

    /// Maximum number of candidates
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,

    /// Log engine spans to stderr (filter with RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,

    /// Exit with status 1 when no candidates are produced
    #[arg(long)]
    pub fail_empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LanguageArg {
    Sql,
    Mongo,
}

/// SQL dialect options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
    Postgres,
    Mysql,
    Mariadb,
    Sqlserver,
    Sqlite,
}

impl From<DialectArg> for querysense_core::Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Postgres => querysense_core::Dialect::Postgres,
            DialectArg::Mysql => querysense_core::Dialect::Mysql,
            DialectArg::Mariadb => querysense_core::Dialect::Mariadb,
            DialectArg::Sqlserver => querysense_core::Dialect::Sqlserver,
            DialectArg::Sqlite => querysense_core::Dialect::Sqlite,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_conversion() {
        let dialect: querysense_core::Dialect = DialectArg::Sqlserver.into();
        assert_eq!(dialect, querysense_core::Dialect::Sqlserver);
    }

    #[test]
    fn test_parse_minimal_args() {
        let args = Args::parse_from(["querysense", "query.sql"]);
        assert!(args.file.is_some());
        assert_eq!(args.language, LanguageArg::Sql);
        assert_eq!(args.dialect, DialectArg::Postgres);
        assert_eq!(args.format, OutputFormat::Table);
        assert!(args.cursor.is_none());
        assert!(!args.fail_empty);
    }

    #[test]
    fn test_parse_full_args() {
        let args = Args::parse_from([
            "querysense",
            "-l",
            "mongo",
            "-m",
            "meta.json",
            "--cursor",
            "12",
            "--explicit",
            "-n",
            "5",
            "-f",
            "json",
            "--compact",
            "--verbose",
            "--fail-empty",
            "cmd.json",
        ]);

        assert_eq!(args.language, LanguageArg::Mongo);
        assert_eq!(args.cursor, Some(12));
        assert_eq!(args.limit, Some(5));
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.explicit && args.compact && args.verbose && args.fail_empty);
    }

    #[test]
    fn test_cursor_conflicts_with_marker() {
        let result = Args::try_parse_from(["querysense", "--cursor", "3", "--marker"]);
        assert!(result.is_err());
    }
}
