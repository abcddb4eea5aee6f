//! CredentialsResolver trait for mocking
//!
//! The lifecycle engine never fetches anything itself. The reconciler asks a
//! resolver for the host's BMC credentials and requested clean steps; the
//! Kubernetes-backed resolver implements this trait and tests use the mock.

use crate::error::ResolveError;
use crate::models::BmcCredentials;
use crds::{BareMetalHost, CleanStep, SecretReference};

/// Resolution of a host's out-of-band prerequisites
///
/// Every failure is a [`ResolveError`] whose message names the host.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait CredentialsResolver: Send + Sync {
    /// Validate the host's BMC descriptor and read its credentials Secret
    async fn resolve_bmc_credentials(&self, host: &BareMetalHost) -> Result<BmcCredentials, ResolveError>;

    /// Read the clean steps requested through `spec.configStepsRef`
    ///
    /// Returns an empty list when the host has no reference.
    async fn resolve_config_steps(&self, host: &BareMetalHost) -> Result<Vec<CleanStep>, ResolveError>;

    /// Make the host the controlling owner of its credentials Secret
    async fn save_secret_owner(&self, secret: &SecretReference, host: &BareMetalHost) -> Result<(), ResolveError>;
}
