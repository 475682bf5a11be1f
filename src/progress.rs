use std::time::{Duration, Instant};

use log::info;

use crate::MassUpdateStats;

/// Reports the progress of a long running pass over a table using `log`. Progress is only
/// reported if at least `interval` passed since the last report, so calling [`Self::tick`] for
/// each row is cheap.
pub struct ProgressLogger {
    plural_name: String,
    interval: Duration,
    last_report: Instant,
}

impl ProgressLogger {
    pub fn new(plural_name: impl Into<String>, interval: Duration) -> Self {
        Self {
            plural_name: plural_name.into(),
            interval,
            last_report: Instant::now(),
        }
    }

    pub fn tick(&mut self, stats: &MassUpdateStats) {
        if self.last_report.elapsed() >= self.interval {
            info!(
                "{} {} processed, {} selected for update",
                stats.rows_read, self.plural_name, stats.rows_selected
            );
            self.last_report = Instant::now();
        }
    }

    /// Final report once the pass completed successfully.
    pub fn finish(&self, stats: &MassUpdateStats) {
        if stats.rows_read == 0 {
            info!("No {} to migrate", self.plural_name);
        } else {
            info!(
                "{} {} processed, {} updated in {:?}",
                stats.rows_read, self.plural_name, stats.rows_written, stats.elapsed
            );
        }
    }
}
