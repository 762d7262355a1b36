//! Command handlers, one module per subcommand.

pub(crate) mod build;
pub(crate) mod daemon;
pub(crate) mod resolve;
pub(crate) mod status;
