//! CLI argument parsing.
//!
//! The CLI is a thin mapping from flags to a single orchestrator call; all
//! selection policy lives in the orchestrator.
use crate::config::DEFAULT_CONFIG_FILE;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "secrun",
    version,
    about = "Run configured test sections selectively",
    after_help = "Examples:\n  secrun --list                       List all available sections\n  secrun --config my_config.json      Run the policy from a specific config\n  secrun basic_gpio_operations        Run specific sections\n  secrun --all                        Run all enabled sections\n  secrun --enable gpio_interrupts     Enable a section\n  secrun --disable gpio_interrupts    Disable a section"
)]
pub struct Args {
    /// Configuration file to use
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// List all available test sections
    #[arg(short, long)]
    pub list: bool,

    /// Run all enabled test sections
    #[arg(short, long)]
    pub all: bool,

    /// Enable a specific test section
    #[arg(short, long, value_name = "SECTION")]
    pub enable: Option<String>,

    /// Disable a specific test section
    #[arg(short, long, value_name = "SECTION")]
    pub disable: Option<String>,

    /// Show configuration summary
    #[arg(short, long)]
    pub summary: bool,

    /// Log filter for diagnostics on stderr (RUST_LOG takes precedence)
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Specific test sections to run
    #[arg(value_name = "SECTION")]
    pub sections: Vec<String>,
}

/// The one operation a process run performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    Enable(String),
    Disable(String),
    Summary,
    RunAll,
    RunNamed(Vec<String>),
    RunPolicy,
}

impl Args {
    /// Resolve flags to an action. Earlier flags win when several are given.
    pub fn action(&self) -> Action {
        if self.list {
            Action::List
        } else if let Some(name) = &self.enable {
            Action::Enable(name.clone())
        } else if let Some(name) = &self.disable {
            Action::Disable(name.clone())
        } else if self.summary {
            Action::Summary
        } else if self.all {
            Action::RunAll
        } else if !self.sections.is_empty() {
            Action::RunNamed(self.sections.clone())
        } else {
            Action::RunPolicy
        }
    }
}
