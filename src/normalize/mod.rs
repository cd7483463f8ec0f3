//! Best-effort conversion of arbitrary values into JSON text.
//!
//! [`normalize`] walks an ordered chain of [`Strategy`] attempts and keeps the
//! first one that succeeds. The chain always ends with the string fallback.
//! A panic raised by a user capability implementation counts as a failed attempt
//! and the chain moves on. When nothing succeeds, a nested element or field
//! degrades to its string form and a top-level value is described by its shape
//! (`data_type` or `total_items`/`item_type`/`sample_item`, plus `raw_data`).
//! Only a failure while building that description produces an
//! `{"error", "data_str"}` object. The result is always valid JSON.
//!
//! Contained panics are reported through `tracing` at debug level. The process
//! panic hook still runs for them, so a host that wants no stderr output from a
//! misbehaving `Loggable` installs its own hook.

mod loggable;
mod strategy;

pub use loggable::{Entries, Loggable, Serialized};
pub use strategy::{Skip, Strategy};

use serde_json::{Value, json};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Nesting depth past which values collapse to their string form.
pub const MAX_DEPTH: usize = 32;

/// JSON text guaranteed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerializedForm(String);

impl SerializedForm {
    fn from_value(value: &Value) -> Self {
        Self(value.to_string())
    }

    /// Borrow the JSON text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the JSON text.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Parse the text back into a JSON value.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.0)
    }
}

impl fmt::Display for SerializedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SerializedForm {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SerializedForm> for String {
    fn from(form: SerializedForm) -> Self {
        form.0
    }
}

/// Normalize a value with the default strategy chain.
pub fn normalize(value: &dyn Loggable) -> SerializedForm {
    Normalizer::default().normalize(value)
}

/// Ordered strategy chain with a bounded recursion depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    chain: Vec<Strategy>,
    max_depth: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            chain: Strategy::DEFAULT_CHAIN.to_vec(),
            max_depth: MAX_DEPTH,
        }
    }
}

impl Normalizer {
    /// Build a normalizer from a custom chain.
    ///
    /// [`Strategy::StringFallback`] is appended when the chain does not already end with it.
    pub fn new(mut chain: Vec<Strategy>) -> Self {
        if chain.last() != Some(&Strategy::StringFallback) {
            chain.push(Strategy::StringFallback);
        }
        Self {
            chain,
            max_depth: MAX_DEPTH,
        }
    }

    /// Override the nesting depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Strategies in the order they are attempted.
    pub fn chain(&self) -> &[Strategy] {
        &self.chain
    }

    /// Convert a value into JSON text. Never fails.
    pub fn normalize(&self, value: &dyn Loggable) -> SerializedForm {
        SerializedForm::from_value(&self.to_json_value(value))
    }

    /// Convert a value into a JSON value. Never fails.
    pub fn to_json_value(&self, value: &dyn Loggable) -> Value {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.convert(value, 0)))
            .unwrap_or_else(|payload| Err(panic_message(payload.as_ref())));
        match outcome {
            Ok((converted, Strategy::DirectEncode)) => {
                tracing::debug!("Direct JSON serialization successful");
                converted
            }
            Ok((converted, strategy)) => {
                tracing::debug!(
                    strategy = strategy.label(),
                    value_type = value.type_name(),
                    "Converted value through fallback strategy"
                );
                converted
            }
            Err(reason) => {
                tracing::debug!(
                    %reason,
                    value_type = value.type_name(),
                    "Every strategy failed; emitting metadata"
                );
                match panic::catch_unwind(AssertUnwindSafe(|| metadata(value))) {
                    Ok(fallback) => fallback,
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        tracing::debug!(error = %message, "Metadata fallback failed");
                        json!({
                            "error": format!("Complete serialization failed: {message}"),
                            "data_str": describe_guarded(value),
                        })
                    }
                }
            }
        }
    }

    /// Run the chain on one value, returning the result and the strategy that produced it.
    ///
    /// `Err` carries the last failure reason once every strategy has been tried.
    fn convert(&self, value: &dyn Loggable, depth: usize) -> Result<(Value, Strategy), String> {
        if depth > self.max_depth {
            tracing::debug!(
                depth,
                value_type = value.type_name(),
                "Maximum depth exceeded"
            );
            return self
                .attempt_guarded(Strategy::StringFallback, value, depth)
                .map(|converted| (converted, Strategy::StringFallback))
                .map_err(|_| "string form unavailable past the depth limit".to_string());
        }

        let mut last_failure = None;
        for &strategy in &self.chain {
            match self.attempt_guarded(strategy, value, depth) {
                Ok(converted) => return Ok((converted, strategy)),
                Err(Skip::Inapplicable) => {}
                Err(Skip::Failed(reason)) => {
                    tracing::debug!(
                        strategy = strategy.label(),
                        value_type = value.type_name(),
                        %reason,
                        "Conversion strategy failed"
                    );
                    last_failure = Some(reason);
                }
            }
        }

        Err(last_failure.unwrap_or_else(|| "no strategy applied".to_string()))
    }

    /// Run one strategy, turning a panic in a capability into a failed attempt.
    fn attempt_guarded(
        &self,
        strategy: Strategy,
        value: &dyn Loggable,
        depth: usize,
    ) -> Result<Value, Skip> {
        panic::catch_unwind(AssertUnwindSafe(|| strategy.attempt(value, self, depth)))
            .unwrap_or_else(|payload| Err(Skip::Failed(panic_message(payload.as_ref()))))
    }

    /// Convert a nested element or field, degrading to its string form if every strategy fails.
    pub(crate) fn convert_child(&self, value: &dyn Loggable, depth: usize) -> Value {
        match self.convert(value, depth) {
            Ok((converted, _)) => converted,
            Err(reason) => {
                tracing::debug!(
                    %reason,
                    value_type = value.type_name(),
                    "Nested conversion failed; using string form"
                );
                Value::String(describe_guarded(value))
            }
        }
    }
}

/// Describe a value by its shape when no strategy could convert it.
fn metadata(value: &dyn Loggable) -> Value {
    match value.elements() {
        Some(items) if !items.is_empty() => json!({
            "total_items": items.len(),
            "item_type": items[0].type_name(),
            "sample_item": describe_guarded(items[0]),
            "raw_data": describe_guarded(value),
        }),
        _ => json!({
            "data_type": value.type_name(),
            "raw_data": describe_guarded(value),
        }),
    }
}

fn describe_guarded(value: &dyn Loggable) -> String {
    panic::catch_unwind(AssertUnwindSafe(|| value.describe()))
        .unwrap_or_else(|_| format!("<unprintable {}>", value.type_name()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
