//! QuerySense CLI - query completion from the command line

use querysense_cli::cli;
use querysense_cli::input;
use querysense_cli::output;

use anyhow::{bail, Result};
use clap::Parser;
use querysense_core::{
    complete_mongo, complete_sql, CompletionOptions, MongoCompletionRequest, MongoMetadata,
    SqlCompletionRequest, SqlMetadata,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{Args, LanguageArg, OutputFormat};
use output::{format_json, format_table, CompletionReport};

/// No candidates were produced and `--fail-empty` was given.
const EXIT_FAILURE: u8 = 1;
/// Configuration error (unreadable input, bad metadata, invalid cursor).
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    let args = Args::parse();

    if args.verbose {
        initialize_logging();
    }

    match run(&args) {
        Ok(has_candidates) => {
            if !has_candidates && args.fail_empty {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("querysense: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

/// Route engine spans to stderr. `RUST_LOG` overrides the default filter.
fn initialize_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("querysense_core=trace"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Runs one completion and prints it. Returns whether any candidate was produced.
fn run(args: &Args) -> Result<bool> {
    let source = input::read_input(args.file.as_deref())?;
    let (text, cursor) = input::place_cursor(source.content, args.cursor, args.marker)?;
    let options = completion_options(args);

    let report = match args.language {
        LanguageArg::Sql => {
            let metadata: SqlMetadata = input::read_metadata(args.metadata.as_deref())?;
            let mut request = SqlCompletionRequest::new(text, cursor)
                .with_dialect(args.dialect.into())
                .with_metadata(metadata);
            request.options = options;
            CompletionReport::Sql(complete_sql(&request))
        }
        LanguageArg::Mongo => {
            let metadata: MongoMetadata = input::read_metadata(args.metadata.as_deref())?;
            let mut request = MongoCompletionRequest::new(text, cursor).with_metadata(metadata);
            request.options = options;
            CompletionReport::Mongo(complete_mongo(&request))
        }
    };

    if let Some(error) = report.error() {
        bail!("{error}");
    }

    let rendered = match args.format {
        OutputFormat::Json => format_json(&report, args.compact)?,
        OutputFormat::Table => format_table(&report, &source.name, true),
    };
    print!("{rendered}");
    if args.format == OutputFormat::Json {
        println!();
    }

    Ok(!report.candidates().is_empty())
}

fn completion_options(args: &Args) -> CompletionOptions {
    let mut options = CompletionOptions {
        explicit: args.explicit,
        ..CompletionOptions::default()
    };
    if let Some(limit) = args.limit {
        options.limits.max_results = limit;
        options.limits.max_filtered_results = limit;
    }
    options
}
