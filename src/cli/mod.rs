pub mod commands;
pub mod scan;
pub mod variations;

pub use commands::{Cli, Commands};
