//! Configuration-driven test section orchestration.
//!
//! A JSON document describes named sections of test identifiers. The
//! [`orchestrator::SectionOrchestrator`] selects and runs sections over a
//! [`config::ConfigStore`], delegating each test to an
//! [`executor::TestExecutor`].
pub mod cli;
pub mod config;
pub mod executor;
pub mod orchestrator;
