pub mod formatter;
pub mod progress;
pub mod writer;

pub use formatter::{render_markdown, search_banner, summary_lines};
pub use progress::ScanProgress;
pub use writer::{report_file_name, write_json_report, write_markdown_report};
