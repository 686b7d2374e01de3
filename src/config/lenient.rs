//! Field deserializers that fall back instead of failing.
//!
//! A value of the wrong JSON type is replaced by the field's default; the
//! matching `ConfigIssue` comes from `validate::type_issues`.
use super::{DEFAULT_REPORT_FILENAME, DEFAULT_TIMEOUT_SECONDS};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn or_else<'de, D, T>(deserializer: D, fallback: impl FnOnce() -> T) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_else(|_| fallback()))
}

pub(super) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    or_else(deserializer, T::default)
}

pub(super) fn or_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    or_else(deserializer, || true)
}

pub(super) fn report_filename<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    or_else(deserializer, || DEFAULT_REPORT_FILENAME.to_string())
}

pub(super) fn timeout<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    or_else(deserializer, || DEFAULT_TIMEOUT_SECONDS)
}

pub(super) fn parallel_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    or_else(deserializer, || 1)
}
