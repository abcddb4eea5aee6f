//! Controller-specific error types.
//!
//! This module defines error types specific to the BareMetalHost Controller
//! that are not covered by upstream library errors.

use bmc_resolver::ResolveError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the BareMetalHost Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// A host prerequisite (BMC secret, config steps) could not be resolved
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Status patch could not be built
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
