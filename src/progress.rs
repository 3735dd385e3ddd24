use std::io::IsTerminal;
use std::path::Path;
use tracing::{debug, info};

/// Number of 10% bands a run is divided into.
pub const MILESTONE_COUNT: usize = 10;

/// Remembers which 10% bands have already been logged.
///
/// Index 0 is never reported, so nothing is logged until the first 10% is
/// done. Build a fresh tracker for every run.
#[derive(Debug, Clone, Default)]
pub struct MilestoneTracker {
    reported: [bool; MILESTONE_COUNT + 1],
}

impl MilestoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_reported(&self, milestone: usize) -> bool {
        self.reported.get(milestone).copied().unwrap_or(false)
    }

    /// Log any milestone crossed by `done` out of `total` bytes.
    ///
    /// Bands skipped over by a single large file are logged first, in
    /// ascending order, followed by the exact percentage. Returns the
    /// percentages that were logged.
    pub fn record(&mut self, done: u64, total: u64) -> Vec<f64> {
        if total == 0 {
            return Vec::new();
        }

        let percent_done = 100.0 * done as f64 / total as f64;
        debug!("Done {}%", percent_done);

        let band = 100.0 / MILESTONE_COUNT as f64;
        let milestone = ((percent_done / band).floor() as usize).min(MILESTONE_COUNT);
        if milestone == 0 || self.reported[milestone] {
            return Vec::new();
        }

        let mut emitted = Vec::new();
        for i in 1..milestone {
            if !self.reported[i] {
                let skipped = i as f64 * band;
                info!("Done {skipped:.2}%");
                self.reported[i] = true;
                emitted.push(skipped);
            }
        }

        info!("Done {percent_done:.2}%");
        self.reported[milestone] = true;
        emitted.push(percent_done);
        emitted
    }
}

#[derive(Debug, Clone)]
pub struct ProgressConfig {
    pub enabled: bool,
    pub is_interactive: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            is_interactive: std::io::stderr().is_terminal(),
        }
    }
}

impl ProgressConfig {
    pub fn auto_detect() -> Self {
        // Disable in CI environments
        if is_ci_environment() {
            Self {
                enabled: false,
                is_interactive: false,
            }
        } else {
            Self::default()
        }
    }

    /// Whether a live progress bar should be drawn on top of the log lines.
    pub fn should_show_bar(&self) -> bool {
        cfg!(feature = "progress") && self.enabled && self.is_interactive
    }
}

/// Milestone logging for a run, plus a byte progress bar when built with the
/// `progress` feature and attached to a terminal.
pub struct ProgressReporter {
    milestones: MilestoneTracker,
    #[cfg(feature = "progress")]
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressReporter {
    #[cfg_attr(not(feature = "progress"), allow(unused_variables))]
    pub fn new(total_bytes: u64, config: &ProgressConfig) -> Self {
        Self {
            milestones: MilestoneTracker::new(),
            #[cfg(feature = "progress")]
            bar: config
                .should_show_bar()
                .then(|| bar::create_byte_bar(total_bytes)),
        }
    }

    pub fn milestones(&self) -> &MilestoneTracker {
        &self.milestones
    }

    #[cfg_attr(not(feature = "progress"), allow(unused_variables))]
    pub fn update(&mut self, done: u64, total: u64, current_file: &Path) -> Vec<f64> {
        #[cfg(feature = "progress")]
        if let Some(pb) = &self.bar {
            pb.set_position(done);
            pb.set_message(bar::short_name(current_file));
            let milestones = &mut self.milestones;
            return pb.suspend(|| milestones.record(done, total));
        }

        self.milestones.record(done, total)
    }

    pub fn finish(&mut self) {
        #[cfg(feature = "progress")]
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}

#[cfg(feature = "progress")]
mod bar {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::path::Path;

    pub(super) fn create_byte_bar(total_bytes: u64) -> ProgressBar {
        let pb = ProgressBar::new(total_bytes);
        let style = ProgressStyle::default_bar()
            .template(
                "[{bar:32.cyan/blue}] {bytes}/{total_bytes} ({percent}%) • {bytes_per_sec} • ETA: {eta} • {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏ ");
        pb.set_style(style);
        pb
    }

    pub(super) fn short_name(path: &Path) -> String {
        const MAX_LEN: usize = 30;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "...".to_string());

        if filename.chars().count() > MAX_LEN {
            let head: String = filename.chars().take(MAX_LEN - 3).collect();
            format!("{head}...")
        } else {
            filename
        }
    }
}

/// Check if we're running in a CI environment
fn is_ci_environment() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
        || std::env::var("BUILDKITE").is_ok()
}
