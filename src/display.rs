//! Terminal output for the CLI
//!
//! Spinners for pipeline stages and colour-coded messages. Quiet mode hides
//! spinners and informational output; results and errors still print.

use crate::agent::AgentStep;
use crate::portfolio::PortfolioReport;
use crate::quiz::{PortfolioType, QuizProfile};
use crate::render::RenderOutput;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

/// Display manager for CLI output
pub struct DisplayManager {
    show_progress: bool,
    current_bar: Option<ProgressBar>,
}

impl DisplayManager {
    pub fn new(show_progress: bool) -> Self {
        Self {
            show_progress,
            current_bar: None,
        }
    }

    /// Section banner
    pub fn show_banner(&self, title: &str) {
        if !self.show_progress {
            return;
        }
        let rule = "=".repeat(50);
        println!("\n{}", rule.cyan());
        println!("{}", title.bold().cyan());
        println!("{}", rule.cyan());
    }

    /// Spinner for a running stage
    pub fn start_stage(&mut self, message: &str) -> ProgressBar {
        self.finish_current();

        let pb = if self.show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(TICK);
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message.to_string());

        self.current_bar = Some(pb.clone());
        pb
    }

    pub fn finish_current(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_and_clear();
        }
    }

    pub fn finish_with_success(&mut self, message: &str, duration: Duration) {
        self.finish_current();
        if self.show_progress {
            println!(
                "{} {} {}",
                "✓".green(),
                message,
                format!("({}ms)", duration.as_millis()).dimmed()
            );
        }
    }

    pub fn finish_with_warning(&mut self, message: &str) {
        self.finish_current();
        self.show_warning(message);
    }

    pub fn show_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error.red());
    }

    pub fn show_warning(&self, warning: &str) {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    pub fn show_info(&self, info: &str) {
        if self.show_progress {
            println!("{} {}", "Info:".cyan(), info);
        }
    }

    /// Parsed quiz answers and the chosen tier
    pub fn show_profile(&self, profile: &QuizProfile, portfolio: PortfolioType) {
        if !self.show_progress {
            return;
        }
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

        println!(
            "\n{} {} ({})",
            "User:".bold(),
            or_dash(&profile.user_name),
            or_dash(&profile.user_email)
        );
        println!("{} {}", "Goal:".bold(), profile.goal_label());
        println!("{} {}", "Risk:".bold(), profile.behavior_label());
        println!("{} {}", "Horizon:".bold(), profile.horizon_label());
        if !profile.topics.is_empty() {
            println!("{} {}", "Topics:".bold(), profile.topics.all().join(", "));
        }
        println!("{} {}", "Portfolio:".bold(), portfolio.to_string().cyan());
    }

    /// Headline numbers of a finished report
    pub fn show_report_summary(&self, report: &PortfolioReport) {
        if !self.show_progress {
            return;
        }
        println!(
            "{} {} | 5Y {} | 3Y {} | Vol {}",
            "Risk profile:".bold(),
            report.risk_profile,
            report.metrics.five_year_return,
            report.metrics.three_year_return,
            report.metrics.five_year_volatility
        );
    }

    /// Where the report landed
    pub fn show_outputs(&self, number: u32, output: &RenderOutput, pdf: Option<&Path>) {
        println!("\n{} {}", "DONE!".green().bold(), format!("Portfolio #{}", number).bold());
        println!("  - HTML: {}", output.html.display());
        println!("  - JSON: {}", output.json.display());
        if let Some(pdf) = pdf {
            println!("  - PDF:  {}", pdf.display());
        }
    }

    /// Streamed model output
    pub fn stream_token(&self, token: &str) {
        print!("{}", token);
        let _ = io::stdout().flush();
    }

    /// Agent progress line (verbose)
    pub fn show_agent_step(&self, step: &AgentStep) {
        if !self.show_progress {
            return;
        }
        match step {
            AgentStep::Reply { iteration, text } => {
                println!("{} {}", format!("[{}]", iteration).dimmed(), text.trim().dimmed());
            }
            AgentStep::ToolCall { tool, input, .. } => {
                println!("{} {}({})", "→".cyan(), tool.cyan(), input);
            }
            AgentStep::ToolResult { output, success, .. } => {
                let mark = if *success { "✓".green() } else { "✗".red() };
                println!("  {} {}", mark, output);
            }
            AgentStep::Answer { .. } => {}
            AgentStep::LimitReached { iterations } => {
                self.show_warning(&format!("stopped after {} iterations", iterations));
            }
        }
    }

    pub fn show_section(&self, title: &str) {
        println!("\n{}", title.bold().cyan());
        println!("{}", "-".repeat(60).cyan());
    }

    pub fn show_bullet(&self, text: &str) {
        println!("  {} {}", "•".cyan(), text);
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_lifecycle() {
        let mut manager = DisplayManager::new(true);
        let _pb = manager.start_stage("Fetching portfolio data");
        assert!(manager.current_bar.is_some());

        manager.finish_with_success("Portfolio data", Duration::from_millis(12));
        assert!(manager.current_bar.is_none());
    }

    #[test]
    fn test_quiet_mode_uses_hidden_bar() {
        let mut manager = DisplayManager::new(false);
        let pb = manager.start_stage("Rendering");
        assert!(pb.is_hidden());
        manager.finish_with_warning("skipped");
        assert!(manager.current_bar.is_none());
    }

    #[test]
    fn test_new_stage_replaces_previous() {
        let mut manager = DisplayManager::new(true);
        let first = manager.start_stage("one");
        let _second = manager.start_stage("two");
        assert!(first.is_finished());
        manager.finish_current();
    }
}
