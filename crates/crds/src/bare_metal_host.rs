//! BareMetalHost CRD
//!
//! Desired state (spec) and observed state (status) of one physical machine.
//! Spec is authored externally; status is written by the controller and by
//! the out-of-band driver after it has performed work on the machine.

use crate::clean_step::CleanStep;
use crate::hardware::HardwareDetails;
use crate::references::{ConfigStepsReference, ObjectReference, SecretReference};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// BareMetalHostSpec defines the desired state of a physical host
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "metal3.io",
    version = "v1alpha1",
    kind = "BareMetalHost",
    namespaced,
    status = "BareMetalHostStatus",
    shortname = "bmh",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.operationalStatus"}"#,
    printcolumn = r#"{"name":"Provisioning","type":"string","jsonPath":".status.provisioning.state"}"#,
    printcolumn = r#"{"name":"Online","type":"boolean","jsonPath":".spec.online"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BareMetalHostSpec {
    /// How to reach the baseboard management controller
    #[serde(default)]
    pub bmc: BmcDetails,

    /// Image to deploy onto the host (absent means nothing should be deployed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,

    /// Whether the host should be powered on
    #[serde(default)]
    pub online: bool,

    /// Workload currently bound to the host (absent means unbound)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_ref: Option<ObjectReference>,

    /// Provisioning is managed outside this controller
    #[serde(default)]
    pub externally_provisioned: bool,

    /// ConfigMap holding manual clean steps to run before provisioning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_steps_ref: Option<ConfigStepsReference>,

    /// Name of the hardware profile the host is expected to match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_profile: Option<String>,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// BMC connection details
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BmcDetails {
    /// BMC URL (e.g., "ipmi://192.168.122.1:6233" or "redfish://10.0.0.5/redfish/v1/Systems/1")
    #[serde(default)]
    pub address: String,

    /// Name of the Secret (same namespace as the host) holding username and password
    #[serde(default)]
    pub credentials_name: String,
}

/// Deployable OS image
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Location of the image
    #[serde(default)]
    pub url: String,

    /// Checksum of the image (or URL of a checksum file)
    #[serde(default)]
    pub checksum: String,
}

impl Image {
    pub fn new(url: &str, checksum: &str) -> Self {
        Self {
            url: url.to_string(),
            checksum: checksum.to_string(),
        }
    }

    /// An image with an empty URL identifies nothing
    pub fn is_set(&self) -> bool {
        !self.url.is_empty()
    }
}

/// BareMetalHostStatus defines the observed state of a physical host
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BareMetalHostStatus {
    /// Health indicator derived from the error state
    #[serde(default)]
    pub operational_status: OperationalStatus,

    /// Last resolution or lifecycle error (empty means no error)
    #[serde(default)]
    pub error_message: String,

    /// Provisioning progress and the image last actually deployed
    #[serde(default)]
    pub provisioning: ProvisionStatus,

    /// Inventory from the last successful inspection (absent means never inspected)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<HardwareDetails>,

    /// Clean steps last executed on the host
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clean_steps: Vec<CleanStep>,

    /// Last credentials the controller resolved and took ownership of
    #[serde(default)]
    pub good_credentials: CredentialsStatus,

    /// Last credentials the controller attempted to use
    #[serde(default)]
    pub tried_credentials: CredentialsStatus,

    /// Whether the host was last observed powered on
    #[serde(default)]
    pub powered_on: bool,

    /// Last time the controller changed this status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

/// Provisioning progress
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionStatus {
    /// Lifecycle state the host is in
    #[serde(default)]
    pub state: ProvisioningState,

    /// Image last deployed (empty URL means nothing deployed)
    #[serde(default)]
    pub image: Image,
}

/// Lifecycle state reported in `status.provisioning.state`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum ProvisioningState {
    /// Not yet evaluated
    #[default]
    #[serde(rename = "")]
    Unknown,

    #[serde(rename = "inspecting")]
    Inspecting,

    #[serde(rename = "cleaning")]
    Cleaning,

    /// Inspected, nothing deployed, free to be provisioned
    #[serde(rename = "ready")]
    Ready,

    #[serde(rename = "provisioning")]
    Provisioning,

    #[serde(rename = "provisioned")]
    Provisioned,

    #[serde(rename = "externally provisioned")]
    ExternallyProvisioned,

    #[serde(rename = "deprovisioning")]
    Deprovisioning,
}

/// Health indicator of a host
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum OperationalStatus {
    /// Host is healthy
    #[default]
    #[serde(rename = "OK")]
    Ok,

    /// Host is known but lacks the BMC details needed to manage it
    #[serde(rename = "discovered")]
    Discovered,

    /// Host carries an error message
    #[serde(rename = "error")]
    Error,
}

/// Reference to a credentials Secret at a specific resource version
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<SecretReference>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub credentials_version: String,
}

impl CredentialsStatus {
    fn matches(&self, secret: &SecretReference, version: &str) -> bool {
        self.credentials.as_ref() == Some(secret) && self.credentials_version == version
    }
}

impl BareMetalHost {
    /// `namespace/name` identity used in log lines and error messages
    pub fn identity(&self) -> String {
        format!(
            "{}/{}",
            self.metadata.namespace.as_deref().unwrap_or("default"),
            self.metadata.name.as_deref().unwrap_or_default()
        )
    }

    /// Whether the host has been scheduled for removal
    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Desired image, present only when the spec carries an image with a URL
    pub fn desired_image(&self) -> Option<&Image> {
        self.spec.image.as_ref().filter(|image| image.is_set())
    }

    /// Deployed image, present only when a provisioning run has recorded a URL
    pub fn deployed_image(&self) -> Option<&Image> {
        self.status
            .as_ref()
            .map(|status| &status.provisioning.image)
            .filter(|image| image.is_set())
    }

    /// Current error message (empty when none)
    pub fn error_message(&self) -> &str {
        self.status
            .as_ref()
            .map_or("", |status| status.error_message.as_str())
    }

    /// Whether the host carries an error message
    pub fn has_error(&self) -> bool {
        !self.error_message().is_empty()
    }

    /// Clean steps recorded in status
    pub fn recorded_clean_steps(&self) -> &[CleanStep] {
        self.status
            .as_ref()
            .map(|status| status.clean_steps.as_slice())
            .unwrap_or_default()
    }

    /// Mutable status, created with defaults if the host has none yet
    pub fn status_mut(&mut self) -> &mut BareMetalHostStatus {
        self.status.get_or_insert_with(BareMetalHostStatus::default)
    }

    /// Overwrite the error message, deriving the operational status from it
    pub fn set_error_message(&mut self, message: impl Into<String>) {
        let status = self.status_mut();
        status.error_message = message.into();
        status.operational_status = if status.error_message.is_empty() {
            OperationalStatus::Ok
        } else {
            OperationalStatus::Error
        };
    }

    /// Clear any error after a successful resolution pass
    ///
    /// Returns true if the status changed.
    pub fn clear_error(&mut self) -> bool {
        let status = self.status_mut();
        let dirty = !status.error_message.is_empty()
            || status.operational_status != OperationalStatus::Ok;
        status.error_message.clear();
        status.operational_status = OperationalStatus::Ok;
        dirty
    }

    /// Set the operational status, returning true if it changed
    pub fn set_operational_status(&mut self, operational_status: OperationalStatus) -> bool {
        let status = self.status_mut();
        let dirty = status.operational_status != operational_status;
        status.operational_status = operational_status;
        dirty
    }

    /// Whether the given credentials version still has to be proven good
    pub fn credentials_need_validation(&self, secret: &SecretReference, version: &str) -> bool {
        self.status
            .as_ref()
            .is_none_or(|status| !status.good_credentials.matches(secret, version))
    }

    /// Record the credentials the controller is about to use
    pub fn update_tried_credentials(&mut self, secret: &SecretReference, version: &str) {
        self.status_mut().tried_credentials = CredentialsStatus {
            credentials: Some(secret.clone()),
            credentials_version: version.to_string(),
        };
    }

    /// Record credentials that resolved and were taken ownership of
    pub fn update_good_credentials(&mut self, secret: &SecretReference, version: &str) {
        self.status_mut().good_credentials = CredentialsStatus {
            credentials: Some(secret.clone()),
            credentials_version: version.to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> BareMetalHost {
        BareMetalHost::new("myhost", BareMetalHostSpec::default())
    }

    #[test]
    fn test_set_error_message_overwrites_and_derives_status() {
        let mut host = host();
        host.set_error_message("first");
        host.set_error_message("oops something went wrong");

        let status = host.status.as_ref().expect("status created");
        assert_eq!(status.error_message, "oops something went wrong");
        assert_eq!(status.operational_status, OperationalStatus::Error);

        host.set_error_message("");
        assert!(!host.has_error());
        assert_eq!(host.status.as_ref().map(|s| s.operational_status), Some(OperationalStatus::Ok));
    }

    #[test]
    fn test_clear_error_reports_dirty_once() {
        let mut host = host();
        host.set_error_message("boom");
        assert!(host.clear_error());
        assert!(!host.clear_error());
        assert_eq!(host.error_message(), "");
    }

    #[test]
    fn test_image_views_normalise_empty_urls() {
        let mut host = host();
        assert!(host.desired_image().is_none());
        assert!(host.deployed_image().is_none());

        host.spec.image = Some(Image::default());
        assert!(host.desired_image().is_none(), "empty URL is not a desired image");

        host.spec.image = Some(Image::new("http://images/os.qcow2", "abc"));
        assert_eq!(host.desired_image().map(|i| i.url.as_str()), Some("http://images/os.qcow2"));

        host.status_mut().provisioning.image = Image::default();
        assert!(host.deployed_image().is_none(), "empty URL is not a deployed image");
    }

    #[test]
    fn test_credentials_bookkeeping() {
        let mut host = host();
        let secret = SecretReference::with_namespace("bmc-secret", "myns");

        assert!(host.credentials_need_validation(&secret, "1"));
        host.update_tried_credentials(&secret, "1");
        assert!(host.credentials_need_validation(&secret, "1"), "tried is not good");

        host.update_good_credentials(&secret, "1");
        assert!(!host.credentials_need_validation(&secret, "1"));
        assert!(host.credentials_need_validation(&secret, "2"), "new secret version");
    }

    #[test]
    fn test_status_wire_format() {
        let mut host = host();
        host.status_mut().provisioning.state = ProvisioningState::ExternallyProvisioned;
        host.set_error_message("bad");

        let json = serde_json::to_value(host.status.as_ref().expect("status")).expect("serializes");
        assert_eq!(json["operationalStatus"], "error");
        assert_eq!(json["errorMessage"], "bad");
        assert_eq!(json["provisioning"]["state"], "externally provisioned");
        assert_eq!(json["provisioning"]["image"]["url"], "");
        assert!(json.get("hardware").is_none());
    }

    #[test]
    fn test_spec_defaults_from_minimal_yaml() {
        let spec: BareMetalHostSpec = serde_yaml::from_str("online: true\n").expect("valid spec");
        assert!(spec.online);
        assert!(spec.image.is_none());
        assert!(spec.consumer_ref.is_none());
        assert!(!spec.externally_provisioned);
        assert_eq!(spec.bmc, BmcDetails::default());
    }
}
