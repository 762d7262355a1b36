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

//! Logging primitives shared across the GovPress workspace.
//!
//! Layout: `init.rs` (subscriber installation), `context.rs` (run spans).

pub mod context;
pub mod init;

pub use context::RunSpanGuard;
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_version, init_logging};
