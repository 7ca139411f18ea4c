use std::collections::HashMap;
use std::time::{Duration, Instant};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use console::style;
use crate::models::SourceStatus;
use crate::pipeline::events::ScanEvent;
use crate::utils::{format_duration, plural};

/// Spinner per running source plus a status line, drawn on stderr.
pub struct ScanProgress {
    multi: MultiProgress,
    source_bars: HashMap<String, ProgressBar>,
    status_bar: ProgressBar,
    total_sources: usize,
    finished_sources: usize,
    findings_count: usize,
    start_time: Instant,
}

impl ScanProgress {
    pub fn new(hidden: bool) -> Self {
        let target = if hidden { ProgressDrawTarget::hidden() } else { ProgressDrawTarget::stderr() };
        let multi = MultiProgress::with_draw_target(target);

        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(spinner_style("  {spinner:.cyan} {msg}"));
        status_bar.set_message("Preparing sources...");
        status_bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            multi,
            source_bars: HashMap::new(),
            status_bar,
            total_sources: 0,
            finished_sources: 0,
            findings_count: 0,
            start_time: Instant::now(),
        }
    }

    pub fn handle_event(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::ScanStarted { sources, .. } => {
                self.total_sources = *sources;
                self.update_status();
            }
            ScanEvent::SourceStarted { name } => {
                let bar = self.multi.insert_before(&self.status_bar, ProgressBar::new_spinner());
                bar.set_style(spinner_style("    {spinner:.yellow} {msg}"));
                bar.set_message(name.clone());
                bar.enable_steady_tick(Duration::from_millis(100));
                self.source_bars.insert(name.clone(), bar);
            }
            ScanEvent::SourceCompleted { name, findings, duration_ms } => {
                self.finished_sources += 1;
                if let Some(bar) = self.source_bars.remove(name) {
                    bar.finish_and_clear();
                }
                self.println(&format!(
                    "  {} {} ({} raw, {})",
                    style("✓").green(),
                    name,
                    findings,
                    format_duration(*duration_ms),
                ));
                self.update_status();
            }
            ScanEvent::SourceFailed { name, status, error } => {
                self.finished_sources += 1;
                if let Some(bar) = self.source_bars.remove(name) {
                    bar.finish_and_clear();
                }
                if *status != SourceStatus::Cancelled {
                    self.println(&format!("  {} {}: {}", style("✗").red(), name, error));
                }
                self.update_status();
            }
            ScanEvent::FindingDiscovered { .. } => {
                self.findings_count += 1;
            }
            ScanEvent::ScanCompleted { total_findings, total_duration_ms } => {
                self.clear_sources();
                self.status_bar.finish_and_clear();
                self.println(&format!(
                    "  Scan complete: {} in {}",
                    plural(*total_findings, "finding", "findings"),
                    format_duration(*total_duration_ms),
                ));
            }
            ScanEvent::ScanInterrupted { total_findings } => {
                self.clear_sources();
                self.status_bar.abandon_with_message(format!(
                    "{} Interrupted, saving {}",
                    style("⚠").yellow(),
                    plural(*total_findings, "finding", "findings"),
                ));
            }
        }
    }

    fn clear_sources(&mut self) {
        for (_, bar) in self.source_bars.drain() {
            bar.finish_and_clear();
        }
    }

    fn update_status(&self) {
        let elapsed = format_duration(self.start_time.elapsed().as_millis() as u64);
        self.status_bar.set_message(format!(
            "{}/{} sources | {} | {} running",
            self.finished_sources,
            self.total_sources,
            elapsed,
            self.source_bars.len(),
        ));
    }

    /// Print a line above the bars without tearing them.
    pub fn println(&self, msg: &str) {
        let _ = self.multi.println(msg);
    }
}

fn spinner_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
