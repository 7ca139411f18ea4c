pub mod adapter;
pub mod http;
pub mod github;
pub mod reddit;
pub mod hackernews;
pub mod stackexchange;
pub mod profiles;
pub mod breaches;
pub mod web_search;
pub mod domain;
pub mod registry;

pub use adapter::{SourceAdapter, Target};
pub use http::{HttpClient, HttpSettings};
pub use registry::{build_sources, SourceSet, SOURCE_IDS};
