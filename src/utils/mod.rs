pub mod formatting;
pub mod text;
pub mod truncation;

pub use formatting::{format_duration, plural};
pub use truncation::{truncate_error, truncate_snippet};
