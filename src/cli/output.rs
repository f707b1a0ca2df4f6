//! Colored output helpers for the CLI

use crate::agents::RunReport;
use crate::court::prompts::REPORT_SECTIONS;
use crate::court::{NEG_DATA, POS_DATA};
use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self) {
        if self.colored {
            println!(
                "\n   {}\n   {} {}\n",
                "⚖  THE HISTORICAL COURT".bright_yellow().bold(),
                "Balanced inquiries into people and events".bright_white(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!(
                "\n   THE HISTORICAL COURT\n   Balanced inquiries into people and events v{}\n",
                env!("CARGO_PKG_VERSION")
            );
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            eprintln!("  [WARN] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Ask the user for a topic; `None` when stdin is not interactive.
    pub fn ask_topic(&self) -> Option<String> {
        let prompt = "Which historical figure or event shall the court examine?";
        dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .ok()
            .map(|topic| topic.trim().to_string())
            .filter(|topic| !topic.is_empty())
    }

    /// Summarize a finished run.
    pub fn verdict(&self, report: &RunReport) {
        self.header("Verdict");
        self.kv("Topic", &report.topic);
        self.kv("Passes", &report.passes.to_string());
        if let Some(termination) = report.termination {
            self.kv("Ended by", &termination.to_string());
        }
        self.kv("Supporting findings", &report.state.len_of(POS_DATA).to_string());
        self.kv("Critical findings", &report.state.len_of(NEG_DATA).to_string());
        let elapsed = report.finished_at - report.started_at;
        self.kv("Elapsed", &format!("{:.1}s", elapsed.num_milliseconds() as f64 / 1000.0));

        println!();
        match &report.report_path {
            Some(path) => {
                self.success(&format!("Report filed at {}", path.display()));
                if let Ok(text) = std::fs::read_to_string(path) {
                    let missing = missing_sections(&text);
                    if !missing.is_empty() {
                        self.warning(&format!("Report lacks sections: {}", missing.join(", ")));
                    }
                }
            }
            None => self.warning("The verdict writer did not file a report"),
        }
    }
}

/// Expected report headings that do not appear in `report`.
pub fn missing_sections(report: &str) -> Vec<&'static str> {
    REPORT_SECTIONS
        .into_iter()
        .filter(|section| !report.contains(section))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SharedState;
    use chrono::Utc;

    #[test]
    fn test_output_new() {
        assert!(Output::new().colored);
        assert!(!Output::no_color().colored);
        assert!(Output::default().colored);
    }

    #[test]
    fn test_missing_sections() {
        let full = REPORT_SECTIONS.join("\ntext\n");
        assert!(missing_sections(&full).is_empty());

        let partial = "## EXECUTIVE DOSSIER: Apollo 11\n### I. CONTEXTUAL OVERVIEW\nCold War.";
        assert_eq!(
            missing_sections(partial),
            vec![
                "II. MILESTONES & ACHIEVEMENTS",
                "III. DISPUTES & LIMITATIONS",
                "IV. COMPREHENSIVE SYNTHESIS"
            ]
        );
    }

    #[test]
    fn test_verdict_prints_without_path() {
        let now = Utc::now();
        let report = RunReport {
            topic: "Ada Lovelace".to_string(),
            report_path: None,
            passes: 1,
            termination: None,
            verdict: String::new(),
            started_at: now,
            finished_at: now,
            state: SharedState::new().snapshot(),
        };

        Output::no_color().verdict(&report);
    }
}
