use super::SectionOrchestrator;
use crate::config::{
    default_document, parse_document, ConfigStore, Document, MemoryStorage, RunMode, Section,
    SectionTable,
};
use crate::executor::{TestExecutor, TestOutcome, TestRequest};
use std::collections::BTreeSet;
use std::time::Duration;

/// Executor that records every call and fails or times out the tests it is
/// told to.
#[derive(Default)]
struct RecordingExecutor {
    calls: Vec<(String, String)>,
    failing: BTreeSet<String>,
    timing_out: BTreeSet<String>,
}

impl RecordingExecutor {
    fn tests(&self) -> Vec<&str> {
        self.calls.iter().map(|(_, test)| test.as_str()).collect()
    }

    fn sections(&self) -> Vec<&str> {
        let mut sections: Vec<&str> = Vec::new();
        for (section, _) in &self.calls {
            if sections.last() != Some(&section.as_str()) {
                sections.push(section);
            }
        }
        sections
    }
}

impl TestExecutor for RecordingExecutor {
    fn execute(&mut self, request: &TestRequest<'_>) -> TestOutcome {
        self.calls
            .push((request.section.to_string(), request.test.to_string()));
        if self.failing.contains(request.test) {
            TestOutcome::failed("forced failure", Duration::from_millis(2))
        } else if self.timing_out.contains(request.test) {
            TestOutcome::timed_out(request.timeout, Duration::from_millis(3))
        } else {
            TestOutcome::passed(None, Duration::from_millis(1))
        }
    }
}

type TestOrchestrator = SectionOrchestrator<MemoryStorage, RecordingExecutor, Vec<u8>>;

fn section(enabled: bool, tests: &[&str]) -> Section {
    Section {
        enabled,
        tests: tests.iter().map(|test| test.to_string()).collect(),
        ..Section::default()
    }
}

fn document(sections: Vec<(&str, Section)>) -> Document {
    Document {
        sections: sections
            .into_iter()
            .map(|(name, section)| (name.to_string(), section))
            .collect::<SectionTable>(),
        ..Document::default()
    }
}

fn abc_document(b_enabled: bool) -> Document {
    document(vec![
        ("A", section(true, &["a1", "a2"])),
        ("B", section(b_enabled, &["b1"])),
        ("C", section(true, &["c1"])),
    ])
}

fn orchestrator(document: Document) -> TestOrchestrator {
    let store = ConfigStore::from_document(MemoryStorage::new(), document);
    SectionOrchestrator::new(store, RecordingExecutor::default(), Vec::new())
}

fn output(orchestrator: &TestOrchestrator) -> String {
    String::from_utf8(orchestrator.output().clone()).expect("utf8 output")
}

#[test]
fn enable_then_run_executes_every_test_in_order() {
    let mut orch = orchestrator(document(vec![("X", section(false, &["x1", "x2", "x3"]))]));

    assert!(orch.enable_section("X").expect("enable"));
    assert!(orch.run_section("X").expect("run"));

    assert_eq!(orch.executor().tests(), vec!["x1", "x2", "x3"]);
    assert_eq!(orch.store().storage().writes(), 1);
    let text = output(&orch);
    assert!(text.contains("✓ Enabled section: X"));
    assert!(text.contains("Running test 3/3: x3... PASSED (1ms)"));
}

#[test]
fn disabled_or_missing_sections_do_not_execute() {
    let mut orch = orchestrator(document(vec![("off", section(false, &["t"]))]));

    assert!(!orch.run_section("off").expect("run disabled"));
    assert!(!orch.run_section("ghost").expect("run missing"));

    assert!(orch.executor().calls.is_empty());
    let text = output(&orch);
    assert!(text.contains("⚠ Section 'off' is disabled. Enable it first."));
    assert!(text.contains("✗ Section 'ghost' not found."));
}

#[test]
fn failing_tests_do_not_abort_the_section() {
    let mut orch = orchestrator(abc_document(true));
    orch.executor.failing.insert("a1".to_string());

    assert!(orch.run_section("A").expect("run"));
    assert_eq!(orch.executor().tests(), vec!["a1", "a2"]);
    let text = output(&orch);
    assert!(text.contains("Running test 1/2: a1... FAILED (2ms)"));
    assert!(text.contains("  Message: forced failure"));
    assert!(text.contains("--- A completed: 1 passed, 1 not passed ---"));
}

#[test]
fn timed_out_tests_are_tallied_separately() {
    let mut orch = orchestrator(abc_document(false));
    orch.executor.timing_out.insert("a2".to_string());

    let summary = orch.run_sections(&["A"]).expect("run");
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.timed_out, 1);
    assert_eq!(summary.total_tests(), 2);
    assert_eq!(summary.elapsed, Duration::from_millis(4));

    let text = output(&orch);
    assert!(text.contains("Running test 2/2: a2... TIMED OUT (3ms)"), "{text}");
    assert!(text.contains("  Message: exceeded 30s timeout"), "{text}");
    assert!(text.contains("--- A completed: 1 passed, 1 not passed ---"));
    assert!(text.contains("Tests: 1 passed, 0 failed, 1 timed out"));
    assert!(text.contains("Success rate: 50.0%"));
}

#[test]
fn stop_on_failure_skips_remaining_sections() {
    let mut doc = abc_document(false);
    doc.settings.stop_on_failure = true;
    let mut orch = orchestrator(doc);

    let summary = orch.run_sections(&["A", "B", "C"]).expect("run");

    assert_eq!(orch.executor().sections(), vec!["A"]);
    assert!(summary.stopped_early);
    assert_eq!(summary.sections_run, vec!["A"]);
    assert_eq!(summary.sections_rejected, vec!["B"]);
    assert!(output(&orch).contains("Stopping due to failure (stop_on_failure enabled)"));
}

#[test]
fn without_stop_on_failure_every_section_is_attempted() {
    let mut orch = orchestrator(abc_document(false));

    let summary = orch.run_sections(&["A", "B", "C"]).expect("run");

    assert_eq!(orch.executor().sections(), vec!["A", "C"]);
    assert!(!summary.stopped_early);
    assert_eq!(summary.passed, 3);
    assert_eq!(summary.total_tests(), 3);
}

#[test]
fn empty_selection_is_a_no_op() {
    let mut orch = orchestrator(abc_document(true));
    let names: [&str; 0] = [];

    let summary = orch.run_sections(&names).expect("run");

    assert_eq!(summary, Default::default());
    assert!(orch.executor().calls.is_empty());
    assert_eq!(output(&orch), "No sections specified to run.\n");
}

#[test]
fn exclude_mode_runs_enabled_sections_minus_exclusions() {
    let mut doc = abc_document(true);
    doc.policy.run_mode = RunMode::ExcludeSections;
    doc.policy.exclude_sections = vec!["B".to_string(), "missing".to_string()];
    let mut orch = orchestrator(doc);

    let summary = orch.run_from_policy().expect("run");

    assert_eq!(summary.sections_run, vec!["A", "C"]);
    assert_eq!(orch.executor().tests(), vec!["a1", "a2", "c1"]);
}

#[test]
fn all_sections_mode_runs_enabled_sections_in_document_order() {
    let mut doc = abc_document(false);
    doc.policy.run_mode = RunMode::AllSections;
    let mut orch = orchestrator(doc);

    let summary = orch.run_from_policy().expect("run");

    assert_eq!(summary.sections_run, vec!["A", "C"]);
    assert!(output(&orch).contains("Running all enabled sections: A, C"));
}

#[test]
fn selected_mode_uses_the_list_verbatim() {
    let mut doc = abc_document(false);
    doc.policy.selected_sections = vec!["C".to_string(), "B".to_string(), "nope".to_string()];
    let mut orch = orchestrator(doc);

    let summary = orch.run_from_policy().expect("run");

    assert_eq!(summary.sections_run, vec!["C"]);
    assert_eq!(summary.sections_rejected, vec!["B", "nope"]);
}

#[test]
fn unknown_run_mode_executes_nothing() {
    let text = r#"{
      "test_sections": { "A": { "enabled": true, "tests": ["a1"] } },
      "test_execution": { "run_mode": "shuffle" }
    }"#;
    let mut orch = orchestrator(parse_document(text).expect("parse"));

    let summary = orch.run_from_policy().expect("run");

    assert!(summary.sections_run.is_empty());
    assert!(orch.executor().calls.is_empty());
    assert_eq!(output(&orch), "✗ Unknown run mode: shuffle\n");
}

#[test]
fn no_enabled_sections_reports_and_returns() {
    let mut orch = orchestrator(document(vec![("A", section(false, &["a1"]))]));

    let summary = orch.run_all_enabled().expect("run");

    assert!(summary.sections_run.is_empty());
    assert_eq!(output(&orch), "No test sections are enabled.\n");
}

#[test]
fn default_document_policy_run_attempts_all_five_tests() {
    let mut orch = orchestrator(default_document());

    let summary = orch.run_from_policy().expect("run");

    assert_eq!(
        summary.sections_run,
        vec!["basic_gpio_operations", "gpio_interrupts"]
    );
    assert_eq!(
        orch.executor().tests(),
        vec![
            "gpio_pin_configuration",
            "gpio_digital_write",
            "gpio_digital_read",
            "gpio_rising_edge_interrupt",
            "gpio_falling_edge_interrupt",
        ]
    );
    let text = output(&orch);
    assert!(text.contains("Timeout: 25s"));
    assert!(text.contains("Timeout: 35s"));
    assert!(text.contains("Success rate: 100.0%"));
}

#[test]
fn disabling_interrupts_limits_run_all_to_basic_tests() {
    let mut orch = orchestrator(default_document());

    assert!(orch.disable_section("gpio_interrupts").expect("disable"));
    let summary = orch.run_all_enabled().expect("run");

    assert_eq!(summary.sections_run, vec!["basic_gpio_operations"]);
    assert_eq!(orch.executor().calls.len(), 3);
    let saved = parse_document(orch.store().storage().contents().expect("saved")).expect("parse");
    assert!(!saved.sections.get("gpio_interrupts").expect("section").enabled);
}

#[test]
fn enable_unknown_section_lists_valid_names_without_saving() {
    let mut orch = orchestrator(default_document());

    assert!(!orch.enable_section("stress").expect("enable"));

    assert_eq!(orch.store().storage().writes(), 0);
    assert_eq!(
        output(&orch),
        "✗ Section 'stress' not found.\nAvailable sections: basic_gpio_operations, gpio_interrupts\n"
    );
}

#[test]
fn list_sections_shows_effective_timeouts() {
    let mut doc = abc_document(false);
    doc.settings.default_timeout_seconds = 12;
    if let Some(section) = doc.sections.get_mut("A") {
        section.timeout_seconds = Some(3);
        section.description = Some("first".to_string());
    }
    let mut orch = orchestrator(doc);

    orch.list_sections().expect("list");

    let text = output(&orch);
    assert!(text.starts_with("Available Test Sections:\n\n✓ A\n    Description: first\n    Tests: 2\n    Timeout: 3s\n"));
    assert!(text.contains("✗ B\n    Description: No description\n    Tests: 1\n    Timeout: 12s\n    Enabled: false\n"));
}

#[test]
fn list_sections_with_no_sections_prints_header_only() {
    let mut orch = orchestrator(Document::default());
    orch.list_sections().expect("list");
    assert_eq!(output(&orch), "Available Test Sections:\n\n");
}

#[test]
fn summary_reports_effective_values() {
    let mut orch = orchestrator(default_document());

    orch.summary().expect("summary");

    let text = output(&orch);
    assert!(text.contains("  Config file: <memory>\n"));
    assert!(text.contains("  Generate report: true\n"));
    assert!(text.contains("  Default timeout: 30s\n"));
    assert!(text.contains("  Run mode: selected_sections\n"));
    assert!(text.contains("  Selected sections: basic_gpio_operations, gpio_interrupts\n"));
    assert!(text.contains("  Excluded sections: (none)\n"));
    assert!(text.contains("  Max parallel tests: 1\n"));
}

#[test]
fn verbose_output_prints_test_list_and_messages() {
    let mut doc = abc_document(true);
    doc.settings.verbose_output = true;
    let mut orch = orchestrator(doc);
    orch.executor.failing.insert("c1".to_string());

    orch.run_section("C").expect("run");

    let text = output(&orch);
    assert!(text.contains("Test list: c1\n"));
    assert!(text.contains("  Message: forced failure\n"));
}
