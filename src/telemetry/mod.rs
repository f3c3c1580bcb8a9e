//! Telemetry for quizfolio
//!
//! Logging setup plus an in-process collector for pipeline stage events
//! and durations.

use colored::Colorize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Initialise the `tracing` subscriber
///
/// `RUST_LOG` wins over `level`. Logs go to stderr so stdout stays clean
/// for command output.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quizfolio={level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Stage of the quiz-to-portfolio run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Classify,
    Fetch,
    Market,
    Shape,
    Enhance,
    Render,
    Pdf,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Classify => "classify",
            Stage::Fetch => "fetch",
            Stage::Market => "market",
            Stage::Shape => "shape",
            Stage::Enhance => "enhance",
            Stage::Render => "render",
            Stage::Pdf => "pdf",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    StageStarted {
        stage: Stage,
        timestamp: Instant,
    },
    StageCompleted {
        stage: Stage,
        duration_ms: u64,
        success: bool,
        timestamp: Instant,
    },
    /// A stage failed and the run continued with a fallback
    Degraded {
        stage: Stage,
        reason: String,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub stages_started: usize,
    pub stages_succeeded: usize,
    pub stages_failed: usize,
    pub degradations: usize,
}

/// Telemetry collector
#[derive(Debug, Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                TelemetryEvent::StageStarted { .. } => stats.stages_started += 1,
                TelemetryEvent::StageCompleted { success: true, .. } => stats.stages_succeeded += 1,
                TelemetryEvent::StageCompleted { success: false, .. } => stats.stages_failed += 1,
                TelemetryEvent::Degraded { .. } => stats.degradations += 1,
            }
        }

        lock(&self.events).push(event);
    }

    /// Mark a stage as started and return its start instant
    pub fn start(&self, stage: Stage) -> Instant {
        let now = Instant::now();
        self.record(TelemetryEvent::StageStarted {
            stage,
            timestamp: now,
        });
        now
    }

    /// Mark a stage as finished
    pub fn finish(&self, stage: Stage, started: Instant, success: bool) -> Duration {
        let elapsed = started.elapsed();
        self.record(TelemetryEvent::StageCompleted {
            stage,
            duration_ms: elapsed.as_millis() as u64,
            success,
            timestamp: Instant::now(),
        });
        elapsed
    }

    pub fn degraded(&self, stage: Stage, reason: impl Into<String>) {
        self.record(TelemetryEvent::Degraded {
            stage,
            reason: reason.into(),
            timestamp: Instant::now(),
        });
    }

    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Completed stages with their durations, in completion order
    pub fn stage_timings(&self) -> Vec<(Stage, u64, bool)> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                TelemetryEvent::StageCompleted {
                    stage,
                    duration_ms,
                    success,
                    ..
                } => Some((*stage, *duration_ms, *success)),
                _ => None,
            })
            .collect()
    }

    /// Reasons recorded for degraded stages
    pub fn degradations(&self) -> Vec<(Stage, String)> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                TelemetryEvent::Degraded { stage, reason, .. } => Some((*stage, reason.clone())),
                _ => None,
            })
            .collect()
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal summary of a run
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: crate::cli::Verbosity,
}

impl TelemetryDisplay {
    pub fn new(collector: TelemetryCollector, verbosity: crate::cli::Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Print stage timings (verbose modes only)
    pub fn display_summary(&self) {
        if !self.should_show_details() {
            return;
        }

        println!("\n{}", "Run summary".bold());
        println!("─────────────────────────────────────");
        for (stage, ms, success) in self.collector.stage_timings() {
            let mark = if success { "ok".green() } else { "failed".red() };
            println!("{:<10} {:>7} ms  {}", stage.as_str(), ms, mark);
        }
        for (stage, reason) in self.collector.degradations() {
            println!("{} {}: {}", "degraded".yellow(), stage, reason);
        }
        println!("Total:     {:>7} ms", self.collector.elapsed().as_millis());
        println!();
    }

    pub fn should_show_details(&self) -> bool {
        self.verbosity.show_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_counts_stages() {
        let collector = TelemetryCollector::new();

        let started = collector.start(Stage::Fetch);
        collector.finish(Stage::Fetch, started, false);
        collector.degraded(Stage::Fetch, "HTTP 503");

        let started = collector.start(Stage::Render);
        collector.finish(Stage::Render, started, true);

        let stats = collector.get_stats();
        assert_eq!(stats.stages_started, 2);
        assert_eq!(stats.stages_succeeded, 1);
        assert_eq!(stats.stages_failed, 1);
        assert_eq!(stats.degradations, 1);
        assert_eq!(collector.event_count(), 5);
    }

    #[test]
    fn test_stage_timings_in_order() {
        let collector = TelemetryCollector::new();
        for stage in [Stage::Parse, Stage::Classify] {
            let started = collector.start(stage);
            collector.finish(stage, started, true);
        }

        let stages: Vec<Stage> = collector.stage_timings().iter().map(|(s, _, _)| *s).collect();
        assert_eq!(stages, vec![Stage::Parse, Stage::Classify]);
        assert!(collector.degradations().is_empty());
    }

    #[test]
    fn test_clones_share_events() {
        let collector = TelemetryCollector::new();
        let clone = collector.clone();
        clone.degraded(Stage::Enhance, "no key");
        assert_eq!(collector.degradations()[0].1, "no key");
    }
}
