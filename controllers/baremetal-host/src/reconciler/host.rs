//! BareMetalHost reconciler

use super::Reconciler;
use crate::error::ControllerError;
use crate::reconcile_helpers::{create_host_status_patch, status_needs_update};
use bmc_resolver::{CredentialsResolver, ResolveError, ResolveErrorKind};
use crds::{
    clean_steps_match, BareMetalHost, BareMetalHostStatus, CleanStep, HoldReason, LifecyclePhase,
    OperationalStatus,
};
use kube::api::{Patch, PatchParams};
use kube_runtime::controller::Action;
use tracing::{debug, info, warn};

/// Outcome of evaluating one host, before anything is written back
#[derive(Debug, Clone)]
pub struct HostAssessment {
    /// Status the host should carry after this pass
    pub status: BareMetalHostStatus,
    /// Phase chosen by the lifecycle engine (`None` when resolution failed)
    pub phase: Option<LifecyclePhase>,
    /// Resolution failure recorded on the status
    pub error: Option<ResolveError>,
}

impl HostAssessment {
    /// Whether this pass has to write the status back
    ///
    /// Hosts being deleted are never written to, even when they carry no status yet.
    pub fn needs_status_write(&self, current: Option<&BareMetalHostStatus>) -> bool {
        !matches!(self.phase, Some(LifecyclePhase::Held(HoldReason::Deleting)))
            && status_needs_update(current, &self.status)
    }
}

/// Resolve credentials (taking ownership of a new secret version) and the requested clean steps
async fn resolve_prerequisites(
    resolver: &dyn CredentialsResolver,
    host: &mut BareMetalHost,
) -> Result<Vec<CleanStep>, ResolveError> {
    let credentials = resolver.resolve_bmc_credentials(host).await?;

    if host.credentials_need_validation(&credentials.secret, &credentials.version) {
        debug!(
            "BMC secret {} version {} not yet validated for host {}",
            credentials.secret.name,
            credentials.version,
            host.identity()
        );
        host.update_tried_credentials(&credentials.secret, &credentials.version);
        resolver.save_secret_owner(&credentials.secret, host).await?;
        host.update_good_credentials(&credentials.secret, &credentials.version);
    }

    resolver.resolve_config_steps(host).await
}

/// Evaluate a host: resolve its prerequisites, then ask the engine for the next phase
///
/// A resolution failure is written to the error message and the engine is
/// not consulted for that pass. A clean pass clears any previous error first.
pub async fn assess_host(resolver: &dyn CredentialsResolver, host: &BareMetalHost) -> HostAssessment {
    let mut host = host.clone();

    if host.is_deleting() {
        debug!("Host {} is being deleted, leaving it untouched", host.identity());
        return HostAssessment {
            status: host.status.unwrap_or_default(),
            phase: Some(LifecyclePhase::Held(HoldReason::Deleting)),
            error: None,
        };
    }

    match resolve_prerequisites(resolver, &mut host).await {
        Err(error) => {
            host.set_error_message(error.to_string());
            // Hosts without usable BMC details are merely known, not broken
            if matches!(
                error.kind(),
                ResolveErrorKind::EmptyBmcAddress | ResolveErrorKind::EmptyBmcSecret
            ) {
                host.set_operational_status(OperationalStatus::Discovered);
            }
            HostAssessment {
                status: host.status.unwrap_or_default(),
                phase: None,
                error: Some(error),
            }
        }
        Ok(requested) => {
            if host.clear_error() {
                info!("Cleared error on host {}", host.identity());
            }

            let recorded = host.recorded_clean_steps();
            if !recorded.is_empty() && !clean_steps_match(&requested, recorded) {
                info!(
                    "Requested clean steps for host {} differ from the {} already run; not cleaning again",
                    host.identity(),
                    recorded.len()
                );
            }

            let phase = host.next_phase(&requested);
            if let Some(state) = phase.provisioning_state() {
                host.status_mut().provisioning.state = state;
            }

            HostAssessment {
                status: host.status.unwrap_or_default(),
                phase: Some(phase),
                error: None,
            }
        }
    }
}

impl Reconciler {
    pub async fn reconcile_bare_metal_host(&self, host: &BareMetalHost) -> Result<Action, ControllerError> {
        let name = host.metadata.name.as_ref()
            .ok_or_else(|| ControllerError::InvalidConfig("BareMetalHost missing name".to_string()))?;
        let namespace = host.metadata.namespace.as_deref()
            .unwrap_or("default");
        let resource_key = host.identity();

        info!("Reconciling BareMetalHost {}/{}", namespace, name);

        let mut assessment = assess_host(self.resolver.as_ref(), host).await;

        if assessment.needs_status_write(host.status.as_ref()) {
            assessment.status.last_updated = Some(chrono::Utc::now());
            let patch = create_host_status_patch(&assessment.status)?;
            self.host_api(namespace)
                .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
                .await?;
            debug!("Updated status of BareMetalHost {}/{}", namespace, name);
        } else {
            debug!("BareMetalHost {}/{} status is up-to-date, skipping update", namespace, name);
        }

        if let Some(error) = assessment.error {
            warn!("BareMetalHost {}/{} prerequisites unresolved: {}", namespace, name, error);
            return Err(ControllerError::Resolve(error));
        }
        self.reset_error(&resource_key);

        match assessment.phase {
            Some(LifecyclePhase::Held(HoldReason::Deleting)) => Ok(Action::await_change()),
            Some(phase) if phase.has_pending_work() => {
                info!("BareMetalHost {}/{} needs {:?}", namespace, name, phase);
                Ok(Action::requeue(self.requeue_interval()))
            }
            Some(phase) => {
                debug!("BareMetalHost {}/{} is {:?}", namespace, name, phase);
                Ok(Action::await_change())
            }
            None => Ok(Action::await_change()),
        }
    }
}
