//! Reconciliation logic for BareMetalHost resources.
//!
//! - `host`: resolves a host's prerequisites, evaluates the lifecycle engine
//!   and writes the outcome to the host's status subresource

pub mod host;

use crate::backoff::HostBackoffs;
use bmc_resolver::CredentialsResolver;
use crds::BareMetalHost;
use kube::{Api, Client};
use std::time::Duration;

/// Tunables read from the environment at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerSettings {
    /// Requeue interval while out-of-band work is outstanding
    pub requeue_interval: Duration,
    /// Minimum error backoff in minutes
    pub backoff_min_minutes: u64,
    /// Maximum error backoff in minutes
    pub backoff_max_minutes: u64,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            requeue_interval: Duration::from_secs(30),
            backoff_min_minutes: 1,
            backoff_max_minutes: 10,
        }
    }
}

/// Reconciles BareMetalHost resources.
pub struct Reconciler {
    pub(crate) resolver: Box<dyn CredentialsResolver>,
    client: Client,
    settings: ReconcilerSettings,
    /// Error count tracking per host (namespace/name -> backoff)
    backoffs: HostBackoffs,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(
        resolver: impl CredentialsResolver + 'static,
        client: Client,
        settings: ReconcilerSettings,
    ) -> Self {
        let backoffs = HostBackoffs::new(settings.backoff_min_minutes, settings.backoff_max_minutes);
        Self {
            resolver: Box::new(resolver),
            client,
            settings,
            backoffs,
        }
    }

    /// Status writes go through the host's own namespace
    pub(crate) fn host_api(&self, namespace: &str) -> Api<BareMetalHost> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub(crate) fn requeue_interval(&self) -> Duration {
        self.settings.requeue_interval
    }

    /// Record a failed pass for a host and get its next backoff
    ///
    /// Returns (backoff_seconds, error_count)
    pub fn get_backoff_for_resource(&self, resource_key: &str) -> (u64, u32) {
        self.backoffs.record_failure(resource_key)
    }

    /// Drop the error backoff of a host (successful pass, or the host is gone)
    pub fn reset_error(&self, resource_key: &str) {
        self.backoffs.reset(resource_key);
    }
}
