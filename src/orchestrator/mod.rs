//! Section selection, enable/disable, and reporting.
//!
//! Every operation writes its user-facing text to the orchestrator's writer
//! (stdout in the binary). Recoverable problems such as unknown section names
//! are reported there and signalled through return values; only storage and
//! I/O failures surface as errors.
use crate::config::{ConfigStore, Storage};
use crate::executor::TestExecutor;
use anyhow::Result;
use std::io::Write;

mod run;

pub use run::RunSummary;

/// Drives section operations over a config store, a test executor, and an
/// output writer.
pub struct SectionOrchestrator<S, E, W> {
    store: ConfigStore<S>,
    executor: E,
    out: W,
}

impl<S: Storage, E: TestExecutor, W: Write> SectionOrchestrator<S, E, W> {
    /// Wrap the three collaborators; nothing is read or written yet.
    pub fn new(store: ConfigStore<S>, executor: E, out: W) -> Self {
        Self {
            store,
            executor,
            out,
        }
    }

    /// The configuration store.
    pub fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    /// The test executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The writer user-facing text goes to.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Print every section with its status, description, test count, and timeout.
    pub fn list_sections(&mut self) -> Result<()> {
        writeln!(self.out, "Available Test Sections:")?;
        writeln!(self.out)?;
        let settings = self.store.settings();
        for (name, section) in self.store.sections().iter() {
            let marker = if section.enabled { "✓" } else { "✗" };
            writeln!(self.out, "{marker} {name}")?;
            writeln!(self.out, "    Description: {}", section.description())?;
            writeln!(self.out, "    Tests: {}", section.tests.len())?;
            writeln!(self.out, "    Timeout: {}s", settings.timeout_for(section))?;
            writeln!(self.out, "    Enabled: {}", section.enabled)?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Enable `name` and persist. Returns false when the section does not exist.
    pub fn enable_section(&mut self, name: &str) -> Result<bool> {
        self.set_section_enabled(name, true)
    }

    /// Disable `name` and persist. Returns false when the section does not exist.
    pub fn disable_section(&mut self, name: &str) -> Result<bool> {
        self.set_section_enabled(name, false)
    }

    fn set_section_enabled(&mut self, name: &str, enabled: bool) -> Result<bool> {
        if !self.store.set_enabled(name, enabled) {
            self.report_unknown_section(name)?;
            return Ok(false);
        }
        self.store.save()?;
        tracing::info!(section = name, enabled, "section state saved");
        if enabled {
            writeln!(self.out, "✓ Enabled section: {name}")?;
        } else {
            writeln!(self.out, "✗ Disabled section: {name}")?;
        }
        Ok(true)
    }

    fn report_unknown_section(&mut self, name: &str) -> Result<()> {
        let available: Vec<&str> = self.store.sections().names().collect();
        writeln!(self.out, "✗ Section '{name}' not found.")?;
        writeln!(self.out, "Available sections: {}", available.join(", "))?;
        Ok(())
    }

    /// Print the effective global settings and execution policy.
    pub fn summary(&mut self) -> Result<()> {
        let location = self.store.location();
        let settings = self.store.settings();
        let policy = self.store.policy();

        writeln!(self.out, "Current Configuration Summary:")?;
        writeln!(self.out, "  Config file: {location}")?;
        writeln!(self.out, "  Verbose output: {}", settings.verbose_output)?;
        writeln!(self.out, "  Stop on failure: {}", settings.stop_on_failure)?;
        writeln!(self.out, "  Generate report: {}", settings.generate_report)?;
        writeln!(self.out, "  Report file: {}", settings.report_filename)?;
        writeln!(self.out, "  Default timeout: {}s", settings.default_timeout())?;
        writeln!(self.out)?;

        writeln!(self.out, "Execution Configuration:")?;
        writeln!(self.out, "  Run mode: {}", policy.run_mode)?;
        writeln!(
            self.out,
            "  Selected sections: {}",
            join_or_none(&policy.selected_sections)
        )?;
        writeln!(
            self.out,
            "  Excluded sections: {}",
            join_or_none(&policy.exclude_sections)
        )?;
        writeln!(self.out, "  Parallel execution: {}", policy.parallel_execution)?;
        writeln!(self.out, "  Max parallel tests: {}", policy.max_parallel_tests)?;
        writeln!(self.out)?;
        Ok(())
    }
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests;
