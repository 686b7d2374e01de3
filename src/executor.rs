//! Single-test execution backends.
//!
//! The orchestrator only decides *which* tests run and in what order; the
//! executor decides what running one means. The bundled backend simulates a
//! fixed latency and always passes.
use anyhow::{Context, Result};
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

/// Environment override for the simulated per-test latency, in milliseconds.
pub const SIMULATED_DELAY_ENV: &str = "SECRUN_SIMULATED_DELAY_MS";

/// One test to execute.
#[derive(Debug, Clone, Copy)]
pub struct TestRequest<'a> {
    pub section: &'a str,
    pub test: &'a str,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Failed,
    TimedOut,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "PASSED",
            TestStatus::Failed => "FAILED",
            TestStatus::TimedOut => "TIMED OUT",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub status: TestStatus,
    pub message: Option<String>,
    pub elapsed: Duration,
}

impl TestOutcome {
    pub fn passed(message: Option<String>, elapsed: Duration) -> Self {
        Self {
            status: TestStatus::Passed,
            message,
            elapsed,
        }
    }

    pub fn failed(message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            status: TestStatus::Failed,
            message: Some(message.into()),
            elapsed,
        }
    }

    pub fn timed_out(timeout: Duration, elapsed: Duration) -> Self {
        Self {
            status: TestStatus::TimedOut,
            message: Some(format!("exceeded {}s timeout", timeout.as_secs_f64())),
            elapsed,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// Runs a single test identifier.
pub trait TestExecutor {
    fn execute(&mut self, request: &TestRequest<'_>) -> TestOutcome;
}

/// Placeholder backend: sleep, then pass.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    latency: Duration,
}

impl SimulatedExecutor {
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(100);

    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Build from `SECRUN_SIMULATED_DELAY_MS`, falling back to the default latency.
    pub fn from_env() -> Result<Self> {
        match std::env::var(SIMULATED_DELAY_ENV) {
            Ok(raw) => {
                let millis: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("parse {SIMULATED_DELAY_ENV}={raw:?}"))?;
                Ok(Self::new(Duration::from_millis(millis)))
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Time each simulated test takes.
    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LATENCY)
    }
}

impl TestExecutor for SimulatedExecutor {
    fn execute(&mut self, request: &TestRequest<'_>) -> TestOutcome {
        let start = Instant::now();
        if self.latency > request.timeout {
            thread::sleep(request.timeout);
            tracing::debug!(
                section = request.section,
                test = request.test,
                "simulated test exceeded timeout"
            );
            return TestOutcome::timed_out(request.timeout, start.elapsed());
        }
        thread::sleep(self.latency);
        TestOutcome::passed(
            Some("Test passed successfully".to_string()),
            start.elapsed(),
        )
    }
}
