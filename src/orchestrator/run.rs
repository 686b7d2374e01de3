use super::SectionOrchestrator;
use crate::config::{RunMode, Storage};
use crate::executor::{TestExecutor, TestRequest, TestStatus};
use anyhow::Result;
use std::io::Write;
use std::time::Duration;

/// Tally of one bulk run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Sections that executed, in order.
    pub sections_run: Vec<String>,
    /// Sections refused because they were unknown or disabled.
    pub sections_rejected: Vec<String>,
    /// Set when `stop_on_failure` cut the run short.
    pub stopped_early: bool,
    pub passed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total_tests(&self) -> usize {
        self.passed + self.failed + self.timed_out
    }

    fn success_rate(&self) -> Option<f64> {
        match self.total_tests() {
            0 => None,
            total => Some(self.passed as f64 * 100.0 / total as f64),
        }
    }
}

impl<S: Storage, E: TestExecutor, W: Write> SectionOrchestrator<S, E, W> {
    /// Run every test of one enabled section, in order.
    ///
    /// Returns false without executing anything when the section is unknown
    /// or disabled. Test failures do not make this return false.
    pub fn run_section(&mut self, name: &str) -> Result<bool> {
        let mut summary = RunSummary::default();
        self.run_section_into(name, &mut summary)
    }

    fn run_section_into(&mut self, name: &str, summary: &mut RunSummary) -> Result<bool> {
        let Some(section) = self.store.section(name) else {
            writeln!(self.out, "✗ Section '{name}' not found.")?;
            summary.sections_rejected.push(name.to_string());
            return Ok(false);
        };
        if !section.enabled {
            writeln!(self.out, "⚠ Section '{name}' is disabled. Enable it first.")?;
            summary.sections_rejected.push(name.to_string());
            return Ok(false);
        }

        let verbose = self.store.settings().verbose_output;
        let timeout = self.store.effective_timeout(section);
        let tests = section.tests.clone();

        writeln!(self.out)?;
        writeln!(self.out, "=== Running {name} ===")?;
        writeln!(self.out, "Description: {}", section.description())?;
        writeln!(self.out, "Timeout: {}s", timeout.as_secs())?;
        writeln!(self.out, "Tests: {}", tests.len())?;
        if verbose && !tests.is_empty() {
            writeln!(self.out, "Test list: {}", tests.join(", "))?;
        }
        writeln!(self.out)?;
        tracing::debug!(section = name, tests = tests.len(), "running section");

        let (mut passed, mut not_passed) = (0usize, 0usize);
        for (index, test) in tests.iter().enumerate() {
            write!(
                self.out,
                "Running test {}/{}: {test}... ",
                index + 1,
                tests.len()
            )?;
            self.out.flush()?;

            let request = TestRequest {
                section: name,
                test,
                timeout,
            };
            let outcome = self.executor.execute(&request);
            writeln!(
                self.out,
                "{} ({}ms)",
                outcome.status,
                outcome.elapsed.as_millis()
            )?;
            if let Some(message) = outcome.message.as_deref() {
                if verbose || !outcome.is_pass() {
                    writeln!(self.out, "  Message: {message}")?;
                }
            }

            summary.elapsed += outcome.elapsed;
            match outcome.status {
                TestStatus::Passed => summary.passed += 1,
                TestStatus::Failed => summary.failed += 1,
                TestStatus::TimedOut => summary.timed_out += 1,
            }
            if outcome.is_pass() {
                passed += 1;
            } else {
                not_passed += 1;
                tracing::warn!(section = name, test = %test, status = %outcome.status, "test did not pass");
            }
        }

        writeln!(self.out)?;
        writeln!(
            self.out,
            "--- {name} completed: {passed} passed, {not_passed} not passed ---"
        )?;
        summary.sections_run.push(name.to_string());
        Ok(true)
    }

    /// Run `names` in order, honoring `stop_on_failure` for rejected sections.
    pub fn run_sections<T: AsRef<str>>(&mut self, names: &[T]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        if names.is_empty() {
            writeln!(self.out, "No sections specified to run.")?;
            return Ok(summary);
        }

        let listed: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
        writeln!(
            self.out,
            "Running {} test section(s): {}",
            listed.len(),
            listed.join(", ")
        )?;
        if self.store.policy().parallel_execution {
            tracing::info!(
                max_parallel_tests = self.store.policy().max_parallel_tests,
                "parallel_execution is set; tests still run sequentially"
            );
        }

        let stop_on_failure = self.store.settings().stop_on_failure;
        for name in &listed {
            if !self.run_section_into(name, &mut summary)? && stop_on_failure {
                writeln!(self.out, "Stopping due to failure (stop_on_failure enabled)")?;
                summary.stopped_early = true;
                break;
            }
        }

        self.write_overall_summary(&summary)?;
        Ok(summary)
    }

    /// Run every enabled section in document order.
    pub fn run_all_enabled(&mut self) -> Result<RunSummary> {
        let enabled = self.enabled_sections(|_| true);
        if enabled.is_empty() {
            writeln!(self.out, "No test sections are enabled.")?;
            return Ok(RunSummary::default());
        }
        writeln!(
            self.out,
            "Running all enabled sections: {}",
            enabled.join(", ")
        )?;
        self.run_sections(&enabled)
    }

    /// Run whatever the configured execution policy selects.
    pub fn run_from_policy(&mut self) -> Result<RunSummary> {
        let policy = self.store.policy().clone();
        tracing::debug!(run_mode = %policy.run_mode, "dispatching execution policy");
        match &policy.run_mode {
            RunMode::AllSections => self.run_all_enabled(),
            // Used verbatim; run_section rejects unknown and disabled names itself.
            RunMode::SelectedSections => self.run_sections(&policy.selected_sections),
            RunMode::ExcludeSections => {
                let remaining = self.enabled_sections(|name| !policy.is_excluded(name));
                self.run_sections(&remaining)
            }
            RunMode::Unknown(raw) => {
                writeln!(self.out, "✗ Unknown run mode: {raw}")?;
                Ok(RunSummary::default())
            }
        }
    }

    fn enabled_sections(&self, keep: impl Fn(&str) -> bool) -> Vec<String> {
        self.store
            .sections()
            .iter()
            .filter(|&(name, section)| section.enabled && keep(name))
            .map(|(name, _)| name.to_string())
            .collect()
    }

    fn write_overall_summary(&mut self, summary: &RunSummary) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "=== Overall Summary ===")?;
        writeln!(
            self.out,
            "Sections run: {} (rejected: {})",
            summary.sections_run.len(),
            summary.sections_rejected.len()
        )?;
        writeln!(
            self.out,
            "Tests: {} passed, {} failed, {} timed out",
            summary.passed, summary.failed, summary.timed_out
        )?;
        match summary.success_rate() {
            Some(rate) => writeln!(self.out, "Success rate: {rate:.1}%")?,
            None => writeln!(self.out, "Success rate: n/a")?,
        }
        writeln!(self.out, "Total time: {}ms", summary.elapsed.as_millis())?;
        Ok(())
    }
}
