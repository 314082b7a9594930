use std::fmt;

#[cfg(feature = "colorized_output")]
use console::style;

/// Stage of a run; waves run strictly in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Wave {
    /// Fragment construction
    Build,
    /// Per-sample merge
    Merge,
    /// Cross-sample export
    Export,
}

impl fmt::Display for Wave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Wave::Build => "build",
            Wave::Merge => "merge",
            Wave::Export => "export",
        };
        f.write_str(name)
    }
}

/// Outcome of one sample task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task completed
    Ok,
    /// Task completed, something was skipped
    Warning(String),
    /// Task aborted
    Failed(String),
}

impl TaskStatus {
    fn is_ok(&self) -> bool {
        matches!(self, TaskStatus::Ok)
    }

    fn is_warning(&self) -> bool {
        matches!(self, TaskStatus::Warning(_))
    }

    /// Whether the task failed
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskStatus::Failed(_))
    }

    fn symbol(&self) -> &'static str {
        match self {
            TaskStatus::Ok => "✓",
            TaskStatus::Warning(_) => "⚠",
            TaskStatus::Failed(_) => "✗",
        }
    }
}

/// Status of one sample in one wave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleOutcome {
    /// Sample directory name
    pub sample: String,
    pub status: TaskStatus,
}

impl SampleOutcome {
    pub fn new(sample: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            sample: sample.into(),
            status,
        }
    }
}

/// Per-sample outcomes of one wave, in sample order
#[derive(Debug, Clone)]
pub struct WaveReport {
    pub wave: Wave,
    pub outcomes: Vec<SampleOutcome>,
}

impl WaveReport {
    pub fn new(wave: Wave) -> Self {
        Self {
            wave,
            outcomes: Vec::new(),
        }
    }

    pub fn add(&mut self, outcome: SampleOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_ok()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_warning()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_failed()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// A wave completes when at least one sample did not fail, or there
    /// was nothing to do
    pub fn completed(&self) -> bool {
        self.outcomes.is_empty() || self.failure_count() < self.outcomes.len()
    }
}

impl fmt::Display for WaveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Wave: {}", self.wave)?;
        for outcome in &self.outcomes {
            write!(f, "  [{}] {}", outcome.status.symbol(), outcome.sample)?;
            match &outcome.status {
                TaskStatus::Ok => writeln!(f)?,
                TaskStatus::Warning(msg) => writeln!(f, " - WARNING: {}", msg)?,
                TaskStatus::Failed(msg) => writeln!(f, " - FAILED: {}", msg)?,
            }
        }
        writeln!(
            f,
            "  {}: {} ok, {} warnings, {} failed",
            self.wave,
            self.success_count(),
            self.warning_count(),
            self.failure_count()
        )
    }
}

/// Reports of every wave of a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Sample directories discovered under the root
    pub samples: usize,
    pub waves: Vec<WaveReport>,
}

impl RunSummary {
    pub fn new(samples: usize) -> Self {
        Self {
            samples,
            waves: Vec::new(),
        }
    }

    /// Report of a wave, if it ran
    pub fn wave(&self, wave: Wave) -> Option<&WaveReport> {
        self.waves.iter().find(|w| w.wave == wave)
    }

    pub fn has_failures(&self) -> bool {
        self.waves.iter().any(WaveReport::has_failures)
    }

    /// Every requested wave completed for some subset of samples
    pub fn is_success(&self) -> bool {
        self.waves.iter().all(WaveReport::completed)
    }

    /// Format the summary with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::Emoji;

            static OK: Emoji<'_, '_> = Emoji("✓", "[OK]");
            static WARN: Emoji<'_, '_> = Emoji("⚠", "[WARN]");
            static FAIL: Emoji<'_, '_> = Emoji("✗", "[FAIL]");

            let mut output = String::new();
            output.push_str(&format!("{}\n", style("mzgraph Run Summary").bold().cyan()));
            output.push_str(&format!("{}\n", style("===================").cyan()));
            output.push_str(&format!("{}: {}\n", style("Samples").bold(), self.samples));

            for report in &self.waves {
                output.push_str(&format!("\n{} {}\n", style("Wave:").bold(), report.wave));
                for outcome in &report.outcomes {
                    match &outcome.status {
                        TaskStatus::Ok => output.push_str(&format!(
                            "  [{}] {}\n",
                            OK,
                            style(&outcome.sample).green()
                        )),
                        TaskStatus::Warning(msg) => output.push_str(&format!(
                            "  [{}] {} - {}: {}\n",
                            WARN,
                            style(&outcome.sample).yellow(),
                            style("WARNING").yellow().bold(),
                            msg
                        )),
                        TaskStatus::Failed(msg) => output.push_str(&format!(
                            "  [{}] {} - {}: {}\n",
                            FAIL,
                            style(&outcome.sample).red(),
                            style("FAILED").red().bold(),
                            msg
                        )),
                    }
                }
                output.push_str(&format!(
                    "  {}: {} ok, {} warnings, {} failed\n",
                    style("Summary").bold(),
                    style(report.success_count()).green(),
                    style(report.warning_count()).yellow(),
                    style(report.failure_count()).red()
                ));
            }

            output.push('\n');
            if !self.is_success() {
                output.push_str(&format!("{}\n", style("Run FAILED").red().bold()));
            } else if self.has_failures() {
                output.push_str(&format!(
                    "{}\n",
                    style("Run COMPLETED with failed samples").yellow().bold()
                ));
            } else {
                output.push_str(&format!("{}\n", style("Run COMPLETED").green().bold()));
            }
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mzgraph Run Summary")?;
        writeln!(f, "===================")?;
        writeln!(f, "Samples: {}", self.samples)?;
        for report in &self.waves {
            writeln!(f)?;
            write!(f, "{}", report)?;
        }
        writeln!(f)?;
        if !self.is_success() {
            writeln!(f, "Run FAILED")
        } else if self.has_failures() {
            writeln!(f, "Run COMPLETED with failed samples")
        } else {
            writeln!(f, "Run COMPLETED")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> WaveReport {
        let mut report = WaveReport::new(Wave::Build);
        report.add(SampleOutcome::new("S1", TaskStatus::Ok));
        report.add(SampleOutcome::new(
            "S2",
            TaskStatus::Warning("tima: missing input".to_string()),
        ));
        report.add(SampleOutcome::new(
            "S3",
            TaskStatus::Failed("ambiguous polarity".to_string()),
        ));
        report
    }

    #[test]
    fn test_wave_counts() {
        let report = report();
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.failure_count(), 1);
        assert!(report.has_failures());
        assert!(report.completed());
    }

    #[test]
    fn test_wave_with_only_failures_is_incomplete() {
        let mut report = WaveReport::new(Wave::Merge);
        report.add(SampleOutcome::new("S1", TaskStatus::Failed("io".to_string())));
        assert!(!report.completed());
        assert!(WaveReport::new(Wave::Merge).completed());
    }

    #[test]
    fn test_summary_display() {
        let mut summary = RunSummary::new(3);
        summary.waves.push(report());
        let text = summary.to_string();

        assert!(text.contains("Samples: 3"));
        assert!(text.contains("[✓] S1"));
        assert!(text.contains("[⚠] S2 - WARNING: tima: missing input"));
        assert!(text.contains("[✗] S3 - FAILED: ambiguous polarity"));
        assert!(text.contains("build: 1 ok, 1 warnings, 1 failed"));
        assert!(text.contains("Run COMPLETED with failed samples"));
        assert!(summary.is_success());
        assert!(summary.wave(Wave::Build).is_some());
        assert!(summary.wave(Wave::Export).is_none());
    }
}
