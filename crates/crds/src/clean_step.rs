//! Clean step descriptors
//!
//! A clean step is a single out-of-band maintenance operation executed by
//! the hardware driver (e.g., erasing disks through the `deploy` interface).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single clean step: driver interface, step name and opaque arguments
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CleanStep {
    /// Driver interface the step belongs to (e.g., "deploy", "raid")
    pub interface: String,

    /// Step name within the interface (e.g., "erase_devices")
    pub step: String,

    /// Step arguments, passed through to the driver untouched
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, serde_json::Value>,
}

impl CleanStep {
    /// Create a clean step without arguments
    pub fn new(interface: &str, step: &str) -> Self {
        Self {
            interface: interface.to_string(),
            step: step.to_string(),
            args: BTreeMap::new(),
        }
    }

    /// Add an argument to the step
    #[must_use]
    pub fn with_arg(mut self, key: &str, value: serde_json::Value) -> Self {
        self.args.insert(key.to_string(), value);
        self
    }

    /// Whether two steps name the same operation (interface and step; args ignored)
    pub fn same_step(&self, other: &CleanStep) -> bool {
        self.interface == other.interface && self.step == other.step
    }
}

/// Compare two clean-step sequences by length and in-order step identity
///
/// Arguments are not compared.
pub fn clean_steps_match(left: &[CleanStep], right: &[CleanStep]) -> bool {
    left.len() == right.len()
        && left.iter().zip(right).all(|(l, r)| l.same_step(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_step_ignores_args() {
        let plain = CleanStep::new("deploy", "erase_devices");
        let with_args = CleanStep::new("deploy", "erase_devices")
            .with_arg("shred", serde_json::json!(true));
        assert!(plain.same_step(&with_args));
        assert!(!plain.same_step(&CleanStep::new("raid", "erase_devices")));
        assert!(!plain.same_step(&CleanStep::new("deploy", "erase_devices_metadata")));
    }

    #[test]
    fn test_clean_steps_match_order_and_length() {
        let a = vec![CleanStep::new("raid", "delete_configuration"), CleanStep::new("deploy", "erase_devices")];
        let reversed: Vec<CleanStep> = a.iter().rev().cloned().collect();

        assert!(clean_steps_match(&a, &a.clone()));
        assert!(!clean_steps_match(&a, &reversed), "order matters");
        assert!(!clean_steps_match(&a, &a[..1]), "length matters");
        assert!(clean_steps_match(&[], &[]));
    }

    #[test]
    fn test_clean_step_deserializes_without_args() {
        let yaml = "- interface: deploy\n  step: erase_devices\n- interface: raid\n  step: create_configuration\n  args:\n    level: \"1\"\n";
        let steps: Vec<CleanStep> = serde_yaml::from_str(yaml).expect("valid clean steps");
        assert_eq!(steps.len(), 2);
        assert!(steps[0].args.is_empty());
        assert_eq!(steps[1].args.get("level"), Some(&serde_json::json!("1")));
    }
}
