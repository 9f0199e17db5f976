//! CLI presenter for output formatting

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::SessionSummary;
use crate::domain::devices::MediaSources;
use crate::domain::message::StatusReport;
use crate::domain::recording::format_elapsed;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.red} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.spinner.is_some()
    }

    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    pub fn info(&self, message: &str) {
        self.print_err(format!("{} {}", "ℹ".cyan(), message));
    }

    pub fn success(&self, message: &str) {
        self.print_err(format!("{} {}", "✓".green(), message));
    }

    pub fn warn(&self, message: &str) {
        self.print_err(format!("{} {}", "⚠".yellow(), message));
    }

    pub fn error(&self, message: &str) {
        self.print_err(format!("{} {}", "✗".red(), message));
    }

    /// Keep stderr lines from tearing through an active spinner
    fn print_err(&self, line: String) {
        match self.spinner {
            Some(ref spinner) => spinner.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// One line per recording outcome
    pub fn format_summary(&self, summary: &SessionSummary) -> String {
        let mut line = format!(
            "{} recorded ({}, {} chunks",
            summary.filename,
            format_elapsed(summary.elapsed_ms),
            summary.chunks_sent
        );
        if summary.chunks_dropped > 0 {
            line.push_str(&format!(", {} dropped", summary.chunks_dropped));
        }
        line.push(')');
        if !summary.finalized {
            line.push_str(" - processing request failed");
        }
        line
    }

    pub fn sources(&self, sources: &MediaSources) {
        println!("{}", "Screens".bold());
        if sources.screens.is_empty() {
            println!("  (none)");
        }
        for screen in &sources.screens {
            match screen.geometry {
                Some(g) => println!(
                    "  {:<24} {} ({}x{}+{}+{})",
                    screen.id.cyan(),
                    screen.name,
                    g.width,
                    g.height,
                    g.x,
                    g.y
                ),
                None => println!("  {:<24} {}", screen.id.cyan(), screen.name),
            }
        }

        println!("{}", "Audio inputs".bold());
        if sources.audio_inputs.is_empty() {
            println!("  (none)");
        }
        for input in &sources.audio_inputs {
            println!("  {}", input.device_id.cyan());
        }
    }

    pub fn status(&self, report: &StatusReport) {
        self.key_value("state", report.state.as_str());
        self.key_value("elapsed", &report.display);
        self.key_value("preview", if report.preview { "on" } else { "off" });
        if let Some(ref filename) = report.filename {
            self.key_value("filename", filename);
        }
        if let Some(ref profile) = report.profile {
            let field = |v: Option<String>| v.unwrap_or_else(|| "(not set)".to_string());
            self.key_value("screen", &field(profile.screen_source_id.clone()));
            self.key_value("audio", &field(profile.audio_device_id.clone()));
            self.key_value("preset", &field(profile.preset.map(|p| p.to_string())));
            self.key_value("plan", &field(profile.plan.map(|p| p.to_string())));
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
