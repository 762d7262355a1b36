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

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (zip writers and readers, temp dirs), wordpress.rs (core, plugin and theme snapshots).

pub mod fixtures;
pub mod wordpress;
