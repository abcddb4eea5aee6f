//! Kubernetes object references used by the BareMetalHost CRD
//!
//! Hosts point at three kinds of external objects:
//! - the consumer (a workload such as a Machine) bound to the host
//! - the Secret holding BMC credentials
//! - the ConfigMap holding requested manual clean steps

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Weak reference to the resource currently consuming a host
///
/// Mirrors the shape of the core `ObjectReference`. Every field is optional:
/// the presence of the reference is what binds the host, not its content.
///
/// Declared locally because the CRD schema derive needs `JsonSchema`, which
/// k8s-openapi types only implement behind its `schemars` feature. Only the
/// fields a host needs are kept; extra core fields (`uid`, `fieldPath`,
/// `resourceVersion`) are accepted and dropped on read.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    /// API version of the consumer (e.g., "cluster.x-k8s.io/v1beta1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Kind of the consumer (e.g., "Machine")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Name of the consumer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Namespace of the consumer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ObjectReference {
    /// Create a reference to a named consumer of the given kind
    pub fn new(kind: &str, name: &str, namespace: &str) -> Self {
        Self {
            api_version: None,
            kind: Some(kind.to_string()),
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
        }
    }
}

/// Reference to a Secret, optionally in another namespace
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    /// Name of the Secret
    pub name: String,

    /// Namespace of the Secret (defaults to the host's namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl SecretReference {
    /// Create a reference to a Secret in the given namespace
    pub fn with_namespace(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: Some(namespace.to_string()),
        }
    }

    /// Namespace of the Secret, falling back to `default_namespace`
    pub fn namespace_or<'a>(&'a self, default_namespace: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(default_namespace)
    }
}

/// Reference to a key of a ConfigMap holding requested clean steps
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigStepsReference {
    /// Name of the ConfigMap (same namespace as the host)
    pub name: String,

    /// Data key holding the YAML list of clean steps
    #[serde(default = "default_config_steps_key")]
    pub key: String,
}

fn default_config_steps_key() -> String {
    "cleanSteps".to_string()
}
