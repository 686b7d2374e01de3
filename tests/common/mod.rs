//! Shared test infrastructure for integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A scratch directory holding one configuration file for `secrun`.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn fresh() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Workspace seeded with `contents` as the configuration file.
    pub fn with_config(contents: &str) -> Self {
        let workspace = Self::fresh();
        std::fs::write(workspace.config_path(), contents).expect("write config");
        workspace
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("sections.json")
    }

    pub fn read_config(&self) -> serde_json::Value {
        let text = std::fs::read_to_string(self.config_path()).expect("read config");
        serde_json::from_str(&text).expect("parse config")
    }

    /// Run `secrun --config <path> <args>` with no simulated latency.
    pub fn run(&self, args: &[&str]) -> RunResult {
        run_in(self.dir.path(), &self.config_path(), args)
    }
}

pub struct RunResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

fn run_in(cwd: &Path, config: &Path, args: &[&str]) -> RunResult {
    let output: Output = Command::new(env!("CARGO_BIN_EXE_secrun"))
        .current_dir(cwd)
        .arg("--config")
        .arg(config)
        .args(args)
        .env("SECRUN_SIMULATED_DELAY_MS", "0")
        .env_remove("RUST_LOG")
        .output()
        .expect("run secrun");
    RunResult {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// Test identifiers in the order the run reported them.
pub fn executed_tests(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix("Running test "))
        .filter_map(|rest| rest.split_once(": "))
        .filter_map(|(_, rest)| rest.split_once("... "))
        .map(|(name, _)| name.to_string())
        .collect()
}
