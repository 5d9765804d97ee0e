//! Spinner shown while package listings run

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::discovery::ListingProgress;
use crate::managers::ManagerId;

/// Tracks how many managers are still being listed
pub struct ListingSpinner {
    bar: ProgressBar,
    running: usize,
    finished: usize,
}

impl ListingSpinner {
    /// A visible spinner, or a hidden one when stdout must stay clean
    pub fn new(visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message("Discovering package managers...");
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar,
            running: 0,
            finished: 0,
        }
    }

    pub fn update(&mut self, manager: ManagerId, progress: &ListingProgress) {
        match progress {
            ListingProgress::Started => self.running += 1,
            ListingProgress::Completed { .. } | ListingProgress::Failed { .. } => {
                self.running = self.running.saturating_sub(1);
                self.finished += 1;
            }
            ListingProgress::Skipped { .. } => return,
        }

        self.bar.set_message(self.message(manager, progress));
    }

    fn message(&self, manager: ManagerId, progress: &ListingProgress) -> String {
        let last = match progress {
            ListingProgress::Started => format!("listing {manager}"),
            ListingProgress::Completed { count } => format!("{manager}: {count} packages"),
            ListingProgress::Failed { .. } => format!("{manager}: listing failed"),
            ListingProgress::Skipped { status } => format!("{manager}: {status}"),
        };
        format!(
            "{} done, {} running ({})",
            self.finished, self.running, last
        )
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_follow_progress() {
        let mut spinner = ListingSpinner::new(false);
        spinner.update(ManagerId::Npm, &ListingProgress::Started);
        spinner.update(ManagerId::Cargo, &ListingProgress::Started);
        spinner.update(ManagerId::Npm, &ListingProgress::Completed { count: 3 });
        spinner.update(
            ManagerId::Gem,
            &ListingProgress::Skipped {
                status: crate::discovery::Availability::NotInstalled,
            },
        );

        assert_eq!(spinner.running, 1);
        assert_eq!(spinner.finished, 1);
        let message = spinner.message(ManagerId::Npm, &ListingProgress::Completed { count: 3 });
        assert!(message.contains("npm: 3 packages"));
        spinner.finish();
    }
}
