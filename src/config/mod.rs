//! Configuration document types.
//!
//! These types mirror the on-disk JSON so a load/save cycle is lossless:
//! unknown keys ride along in `extra`, and optional section fields stay absent
//! when the file omits them. Accessors fill in defaults instead.
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

mod defaults;
mod lenient;
mod store;
mod validate;

pub use defaults::default_document;
pub use store::{
    parse_document, parse_document_checked, render_document, ConfigStore, FileStorage, LoadOrigin,
    MemoryStorage, Storage,
};
pub use validate::{type_issues, validate_document, ConfigIssue};

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "gpio_test_config.json";
pub const DEFAULT_REPORT_FILENAME: &str = "gpio_test_report.txt";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
/// Placeholder shown for sections without a description.
pub const NO_DESCRIPTION: &str = "No description";

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Document {
    #[serde(
        rename = "test_configuration",
        default,
        deserialize_with = "lenient::or_default"
    )]
    pub settings: GlobalSettings,
    #[serde(rename = "test_sections", default)]
    pub sections: SectionTable,
    #[serde(
        rename = "test_execution",
        default,
        deserialize_with = "lenient::or_default"
    )]
    pub policy: ExecutionPolicy,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Settings shared by every section (`test_configuration`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalSettings {
    #[serde(deserialize_with = "lenient::or_default")]
    pub verbose_output: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub stop_on_failure: bool,
    #[serde(deserialize_with = "lenient::or_true")]
    pub generate_report: bool,
    #[serde(deserialize_with = "lenient::report_filename")]
    pub report_filename: String,
    #[serde(deserialize_with = "lenient::timeout")]
    pub default_timeout_seconds: u64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            verbose_output: false,
            stop_on_failure: false,
            generate_report: true,
            report_filename: DEFAULT_REPORT_FILENAME.to_string(),
            default_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            extra: BTreeMap::new(),
        }
    }
}

impl GlobalSettings {
    /// Default timeout, never zero.
    pub fn default_timeout(&self) -> u64 {
        if self.default_timeout_seconds == 0 {
            DEFAULT_TIMEOUT_SECONDS
        } else {
            self.default_timeout_seconds
        }
    }

    /// Timeout in seconds for `section`, falling back to the global default.
    pub fn timeout_for(&self, section: &Section) -> u64 {
        section
            .timeout_seconds
            .filter(|seconds| *seconds > 0)
            .unwrap_or_else(|| self.default_timeout())
    }
}

/// A named group of test identifiers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Section {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub enabled: bool,
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout_seconds: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub tests: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Section {
    /// Description, or a placeholder when the document has none.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }
}

/// Policy used when no explicit section names are given (`test_execution`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionPolicy {
    #[serde(deserialize_with = "lenient::or_default")]
    pub run_mode: RunMode,
    #[serde(deserialize_with = "lenient::or_default")]
    pub selected_sections: Vec<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub exclude_sections: Vec<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub parallel_execution: bool,
    #[serde(deserialize_with = "lenient::parallel_limit")]
    pub max_parallel_tests: u64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            run_mode: RunMode::default(),
            selected_sections: Vec::new(),
            exclude_sections: Vec::new(),
            parallel_execution: false,
            max_parallel_tests: 1,
            extra: BTreeMap::new(),
        }
    }
}

impl ExecutionPolicy {
    /// Whether `name` appears in `exclude_sections`.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude_sections.iter().any(|excluded| excluded == name)
    }
}

/// Section selection mode.
///
/// Unrecognized strings are kept verbatim so they survive a save and can be
/// reported when the policy is dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum RunMode {
    AllSections,
    #[default]
    SelectedSections,
    ExcludeSections,
    Unknown(String),
}

impl RunMode {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &str {
        match self {
            RunMode::AllSections => "all_sections",
            RunMode::SelectedSections => "selected_sections",
            RunMode::ExcludeSections => "exclude_sections",
            RunMode::Unknown(raw) => raw,
        }
    }
}

impl From<String> for RunMode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "all_sections" => RunMode::AllSections,
            "selected_sections" => RunMode::SelectedSections,
            "exclude_sections" => RunMode::ExcludeSections,
            _ => RunMode::Unknown(raw),
        }
    }
}

impl From<RunMode> for String {
    fn from(mode: RunMode) -> Self {
        match mode {
            RunMode::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sections keyed by name, iterated in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionTable {
    entries: Vec<(String, Section)>,
}

impl SectionTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a section. A replaced section keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, section: Section) -> Option<Section> {
        let name = name.into();
        match self.get_mut(&name) {
            Some(existing) => Some(std::mem::replace(existing, section)),
            None => {
                self.entries.push((name, section));
                None
            }
        }
    }

    /// Look up a section by name.
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, section)| section)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, section)| section)
    }

    /// Whether a section named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sections with their names, in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.entries
            .iter()
            .map(|(name, section)| (name.as_str(), section))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Section)> for SectionTable {
    fn from_iter<I: IntoIterator<Item = (String, Section)>>(iter: I) -> Self {
        let mut table = SectionTable::new();
        for (name, section) in iter {
            table.insert(name, section);
        }
        table
    }
}

impl Serialize for SectionTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, section) in &self.entries {
            map.serialize_entry(name, section)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SectionTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = SectionTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of section names to sections")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut table = SectionTable::new();
                // Duplicate keys: last one wins, first position is kept.
                // Entries that are not objects are dropped.
                while let Some((name, value)) = access.next_entry::<String, Value>()? {
                    if let Ok(section) = Section::deserialize(value) {
                        table.insert(name, section);
                    }
                }
                Ok(table)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                while access.next_element::<IgnoredAny>()?.is_some() {}
                Ok(SectionTable::new())
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(SectionTable::new())
            }

            fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
                Ok(SectionTable::new())
            }

            fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
                Ok(SectionTable::new())
            }

            fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
                Ok(SectionTable::new())
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
                Ok(SectionTable::new())
            }

            fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
                Ok(SectionTable::new())
            }
        }

        // Anything but a map becomes an empty table; `type_issues` reports it.
        deserializer.deserialize_any(TableVisitor)
    }
}
