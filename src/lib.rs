pub mod cli;
pub mod config;
pub mod errors;
pub mod identity;
pub mod models;
pub mod pipeline;
pub mod reporting;
pub mod sources;
pub mod utils;

/// Version string with the build's git hash and date.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);
