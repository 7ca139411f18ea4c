pub mod aggregator;
pub mod dedup;
pub mod events;
pub mod orchestrator;
pub mod state;
pub mod window;

pub use aggregator::{AggregateResult, Aggregator, AggregatorSettings};
pub use events::ScanEvent;
pub use orchestrator::ScanOrchestrator;
pub use state::{ScanSettings, ScanSummary};
