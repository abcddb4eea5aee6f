//! Kubernetes resource watchers.
//!
//! Watches BareMetalHost resources and drives reconciliation through
//! `kube_runtime::Controller`, which reconnects the watch, never runs two
//! passes for the same host at once, and requeues on the actions we return.

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crds::BareMetalHost;
use futures::StreamExt;
use kube::Api;
use kube_runtime::{
    controller::{Action, Config as ControllerConfig, Error as ControllerRunError},
    watcher, Controller,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

async fn reconcile(host: Arc<BareMetalHost>, ctx: Arc<Reconciler>) -> Result<Action, ControllerError> {
    debug!("Reconciling BareMetalHost {}", host.identity());
    ctx.reconcile_bare_metal_host(&host).await
}

/// Error policy: requeue with the host's Fibonacci backoff
fn error_policy(host: Arc<BareMetalHost>, error: &ControllerError, ctx: Arc<Reconciler>) -> Action {
    let (backoff_seconds, error_count) = ctx.get_backoff_for_resource(&host.identity());
    warn!(
        "Reconciliation error for BareMetalHost {} (attempt {}), retrying in {}s: {}",
        host.identity(),
        error_count,
        backoff_seconds,
        error
    );
    Action::requeue(Duration::from_secs(backoff_seconds))
}

/// Watches Kubernetes resources for changes.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    host_api: Api<BareMetalHost>,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(reconciler: Arc<Reconciler>, host_api: Api<BareMetalHost>) -> Self {
        Self { reconciler, host_api }
    }

    /// Starts watching BareMetalHost resources.
    pub async fn watch_bare_metal_hosts(&self) -> Result<(), ControllerError> {
        debug!("Starting BareMetalHost watcher");

        // Debounce batches bursts of events (our own status patches included)
        let controller_config = ControllerConfig::default()
            .debounce(Duration::from_secs(5))
            .concurrency(3);

        let reconciler = self.reconciler.clone();
        Controller::new(self.host_api.clone(), watcher::Config::default())
            .with_config(controller_config)
            .shutdown_on_signal()
            .run(reconcile, error_policy, self.reconciler.clone())
            .for_each(|res| {
                let reconciler = reconciler.clone();
                async move {
                    match res {
                        Ok(_) => {}
                        // A pending backoff requeue fired for a host that was deleted
                        Err(ControllerRunError::ObjectNotFound(obj_ref)) => {
                            let key = format!(
                                "{}/{}",
                                obj_ref.namespace.as_deref().unwrap_or("default"),
                                obj_ref.name
                            );
                            debug!("BareMetalHost {} no longer exists, dropping its backoff", key);
                            reconciler.reset_error(&key);
                        }
                        Err(e) => error!("Controller error for BareMetalHost: {}", e),
                    }
                }
            })
            .await;

        Ok(())
    }
}
