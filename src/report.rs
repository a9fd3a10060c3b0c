//! Campaign statistics and the per-run results file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;

use crate::campaign::RegistrationResult;
use crate::error::AppError;

/// Longest target label kept in results and alerts.
pub const EVENT_LABEL_CHARS: usize = 20;

/// Truncate to at most `max` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Last non-empty path segment of a target.
pub fn last_path_segment(url: &str) -> &str {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(url)
}

/// Short display label for a target page.
pub fn event_label(target: &str) -> String {
    truncate_chars(last_path_segment(target), EVENT_LABEL_CHARS)
}

/// Aggregate view of a finished (or in-flight) campaign.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl CampaignSummary {
    pub fn from_results(results: &[RegistrationResult], duration: Duration) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            duration,
        }
    }

    /// Percentage in `0.0..=100.0`; zero for an empty campaign.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total as f64 * 100.0
        }
    }

    /// Completed jobs per second.
    pub fn rate_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 { self.total as f64 / secs } else { 0.0 }
    }
}

/// Write results as a pretty JSON array to `results_<timestamp>.json` in `dir`.
pub fn save_results(dir: &Path, results: &[RegistrationResult]) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("results_{}.json", Local::now().format("%Y%m%d_%H%M%S")));
    let data = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, data)?;
    Ok(path)
}
