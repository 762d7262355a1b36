#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Operator CLI for the GovPress bundle builder.
//!
//! Layout:
//! - `cli.rs`: argument parsing and command dispatch
//! - `commands/`: command handlers, one per subcommand
//! - `client.rs`: CLI error type and blocking-work helpers
//! - `scheduler.rs`: tokio-backed recurring job runner used by `daemon`
//! - `output.rs`: renderers and formatting helpers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod output;
pub(crate) mod scheduler;

pub use cli::run;
