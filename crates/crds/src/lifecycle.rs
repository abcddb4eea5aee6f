//! Host lifecycle decision engine
//!
//! Pure predicates over a [`BareMetalHost`] comparing desired spec with
//! observed status, plus [`BareMetalHost::next_phase`] which evaluates them in
//! a fixed priority order and returns the single phase the host must enter.
//!
//! Nothing here performs I/O or mutates the host. Callers serialize passes
//! per host; the engine itself holds no state and is safe to call from any
//! number of threads on distinct hosts.

use crate::bare_metal_host::{BareMetalHost, ProvisioningState};
use crate::clean_step::CleanStep;

/// Why a host is held out of lifecycle transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// Deletion marker is set
    Deleting,
    /// Status carries an error message
    Error,
}

/// Phase a host must enter next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// No transition may be attempted
    Held(HoldReason),
    /// Hardware inventory must be discovered
    Inspecting,
    /// Requested manual clean steps must run
    Cleaning,
    /// Provisioning is owned elsewhere; leave the host alone
    ExternallyProvisioned,
    /// Deployed image must be removed (image removed or changed)
    Deprovisioning,
    /// Desired image must be deployed
    Provisioning,
    /// Desired image is deployed
    Provisioned,
    /// Inspected and free, nothing to deploy
    Ready,
}

impl LifecyclePhase {
    /// State to report in `status.provisioning.state`
    ///
    /// Held hosts keep whatever state they were last reported in.
    pub fn provisioning_state(self) -> Option<ProvisioningState> {
        match self {
            LifecyclePhase::Held(_) => None,
            LifecyclePhase::Inspecting => Some(ProvisioningState::Inspecting),
            LifecyclePhase::Cleaning => Some(ProvisioningState::Cleaning),
            LifecyclePhase::ExternallyProvisioned => Some(ProvisioningState::ExternallyProvisioned),
            LifecyclePhase::Deprovisioning => Some(ProvisioningState::Deprovisioning),
            LifecyclePhase::Provisioning => Some(ProvisioningState::Provisioning),
            LifecyclePhase::Provisioned => Some(ProvisioningState::Provisioned),
            LifecyclePhase::Ready => Some(ProvisioningState::Ready),
        }
    }

    /// Whether an out-of-band operation is outstanding for this phase
    pub fn has_pending_work(self) -> bool {
        matches!(
            self,
            LifecyclePhase::Inspecting
                | LifecyclePhase::Cleaning
                | LifecyclePhase::Deprovisioning
                | LifecyclePhase::Provisioning
        )
    }
}

impl BareMetalHost {
    /// Whether the host can be handed out for new work
    pub fn available(&self) -> bool {
        !self.is_deleting() && !self.has_error() && self.spec.consumer_ref.is_none()
    }

    /// Whether hardware inspection still has to run
    ///
    /// A bound consumer does not suppress first-time inspection; a recorded
    /// deployed image does.
    pub fn needs_hardware_inspection(&self) -> bool {
        let inspected = self
            .status
            .as_ref()
            .is_some_and(|status| status.hardware.is_some());
        !inspected && self.deployed_image().is_none()
    }

    /// Whether the requested clean steps still have to run
    ///
    /// One-shot gate: once any steps are recorded in status, no further
    /// manual cleaning is requested, whatever `requested` contains.
    pub fn needs_manual_cleaning(&self, requested: &[CleanStep]) -> bool {
        !requested.is_empty() && self.recorded_clean_steps().is_empty()
    }

    /// Whether the desired image has to be deployed
    pub fn needs_provisioning(&self) -> bool {
        self.spec.online && self.desired_image().is_some() && self.deployed_image().is_none()
    }

    /// Whether the deployed image has to be removed
    pub fn needs_deprovisioning(&self) -> bool {
        match (self.deployed_image(), self.desired_image()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(deployed), Some(desired)) => deployed.url != desired.url,
        }
    }

    /// Whether provisioning is managed outside this controller
    pub fn was_externally_provisioned(&self) -> bool {
        self.spec.externally_provisioned
            && self.desired_image().is_none()
            && self.spec.consumer_ref.is_some()
    }

    /// Compute the phase the host must enter next
    ///
    /// Priority: deletion, error, inspection, manual cleaning, deprovisioning,
    /// external provisioning, provisioning. Deprovisioning always wins over
    /// provisioning, so a single pass never asks for both. The external
    /// provisioning flag only suppresses provisioning; an image this
    /// controller deployed is still removed.
    pub fn next_phase(&self, requested_clean_steps: &[CleanStep]) -> LifecyclePhase {
        if self.is_deleting() {
            return LifecyclePhase::Held(HoldReason::Deleting);
        }
        if self.has_error() {
            return LifecyclePhase::Held(HoldReason::Error);
        }
        if self.needs_hardware_inspection() {
            return LifecyclePhase::Inspecting;
        }
        if self.needs_manual_cleaning(requested_clean_steps) {
            return LifecyclePhase::Cleaning;
        }
        if self.needs_deprovisioning() {
            return LifecyclePhase::Deprovisioning;
        }
        if self.was_externally_provisioned() {
            return LifecyclePhase::ExternallyProvisioned;
        }
        if self.needs_provisioning() {
            return LifecyclePhase::Provisioning;
        }
        if self.deployed_image().is_some() {
            LifecyclePhase::Provisioned
        } else {
            LifecyclePhase::Ready
        }
    }
}
