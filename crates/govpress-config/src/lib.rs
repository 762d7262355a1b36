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
#![allow(clippy::module_name_repetitions)]

//! Typed configuration for the GovPress bundle builder.
//!
//! Layout: `model.rs` (typed sections and defaults), `loader.rs` (file and
//! environment merging), `validate.rs` (field checks), `defaults.rs` (stock
//! upstream locations and layout names).

mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_PATH_ENV, load, load_file, load_with_env};
pub use model::{
    BuildConfig, HttpConfig, LayoutConfig, LogFormatSetting, LoggingSettings, MetadataConfig,
    ScheduleConfig,
};
pub use validate::validate;
