pub mod finding;
pub mod source;
pub mod report;

pub use finding::*;
pub use source::*;
pub use report::*;
