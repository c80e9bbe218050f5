//! Pieces of the `querysense` binary: argument parsing, reading the query
//! and its metadata, and rendering a completion result as a table or JSON.
//!
//! Split out of `main.rs` so unit tests can reach them.

pub mod cli;
pub mod input;
pub mod output;

pub use cli::Args;
pub use output::CompletionReport;
