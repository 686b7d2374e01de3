use super::{Document, ExecutionPolicy, GlobalSettings, RunMode, Section, SectionTable};
use std::collections::BTreeMap;

/// Build the document written when no configuration file exists yet.
///
/// Two example sections are enabled and selected so the first policy run has
/// something to execute.
pub fn default_document() -> Document {
    let mut sections = SectionTable::new();
    sections.insert(
        "basic_gpio_operations",
        example_section(
            25,
            "Basic GPIO functionality",
            &[
                "gpio_pin_configuration",
                "gpio_digital_write",
                "gpio_digital_read",
            ],
        ),
    );
    sections.insert(
        "gpio_interrupts",
        example_section(
            35,
            "GPIO interrupt functionality",
            &["gpio_rising_edge_interrupt", "gpio_falling_edge_interrupt"],
        ),
    );

    let selected_sections = sections.names().map(str::to_string).collect();
    Document {
        settings: GlobalSettings::default(),
        sections,
        policy: ExecutionPolicy {
            run_mode: RunMode::SelectedSections,
            selected_sections,
            ..ExecutionPolicy::default()
        },
        extra: BTreeMap::new(),
    }
}

fn example_section(timeout_seconds: u64, description: &str, tests: &[&str]) -> Section {
    Section {
        enabled: true,
        timeout_seconds: Some(timeout_seconds),
        description: Some(description.to_string()),
        tests: tests.iter().map(|test| test.to_string()).collect(),
        extra: BTreeMap::new(),
    }
}
