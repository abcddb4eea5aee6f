//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the Kubernetes
//! client, the credentials resolver and the reconciler together and runs the
//! BareMetalHost watcher.

use crate::error::ControllerError;
use crate::reconciler::{Reconciler, ReconcilerSettings};
use crate::watcher::Watcher;
use bmc_resolver::KubeCredentialsResolver;
use crds::BareMetalHost;
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for BareMetalHost management.
pub struct Controller {
    host_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance.
    ///
    /// Watches a single namespace when `namespace` is set, all namespaces otherwise.
    pub async fn new(
        namespace: Option<String>,
        settings: ReconcilerSettings,
    ) -> Result<Self, ControllerError> {
        info!("Initializing BareMetalHost Controller");

        let kube_client = Client::try_default().await?;

        let host_api: Api<BareMetalHost> = match namespace.as_deref() {
            Some(ns) => Api::namespaced(kube_client.clone(), ns),
            None => Api::all(kube_client.clone()),
        };

        let resolver = KubeCredentialsResolver::new(kube_client.clone());
        let reconciler = Arc::new(Reconciler::new(resolver, kube_client, settings));

        let watcher_instance = Watcher::new(reconciler, host_api);
        let host_watcher = tokio::spawn(async move {
            watcher_instance.watch_bare_metal_hosts().await
        });

        Ok(Self { host_watcher })
    }

    /// Runs the controller until the watcher exits (shutdown signal or failure).
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("BareMetalHost Controller running");

        self.host_watcher
            .await
            .map_err(|e| ControllerError::Watch(format!("BareMetalHost watcher panicked: {}", e)))?
            .map_err(|e| ControllerError::Watch(format!("BareMetalHost watcher error: {}", e)))?;

        info!("BareMetalHost Controller stopped");
        Ok(())
    }
}
