//! Kubernetes-backed resolver
//!
//! Reads BMC credentials from Secrets and requested clean steps from
//! ConfigMaps in the host's namespace, and takes controller ownership of the
//! credentials Secret so it is garbage collected with the host.

use crate::error::{ResolveError, ResolveErrorKind};
use crate::models::{bmc_secret_reference, credentials_from_values, parse_config_steps, BmcCredentials};
use crate::resolver_trait::CredentialsResolver;
use crds::{BareMetalHost, CleanStep, SecretReference};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, Resource};
use tracing::{debug, info, warn};

const USERNAME_KEY: &str = "username";
const PASSWORD_KEY: &str = "password";

/// Resolver reading Secrets and ConfigMaps through the Kubernetes API
#[derive(Clone)]
pub struct KubeCredentialsResolver {
    client: Client,
}

impl KubeCredentialsResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn get_secret(&self, secret_ref: &SecretReference, host: &BareMetalHost) -> Result<Secret, ResolveError> {
        let namespace = secret_ref.namespace_or("default");
        match self.secrets(namespace).get_opt(&secret_ref.name).await {
            Ok(Some(secret)) => Ok(secret),
            Ok(None) => Err(ResolveError::new(
                ResolveErrorKind::ResolveBmcSecretRef,
                format!("{}/{} for host {}", namespace, secret_ref.name, host.identity()),
            )),
            Err(e) => {
                warn!("Failed to read BMC secret {}/{}: {}", namespace, secret_ref.name, e);
                Err(ResolveError::new(
                    ResolveErrorKind::ResolveBmcSecretRef,
                    format!("{}/{} ({}) for host {}", namespace, secret_ref.name, e, host.identity()),
                ))
            }
        }
    }
}

fn secret_value(secret: &Secret, key: &str) -> Option<String> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .and_then(|bytes| String::from_utf8(bytes.0.clone()).ok())
}

#[async_trait::async_trait]
impl CredentialsResolver for KubeCredentialsResolver {
    async fn resolve_bmc_credentials(&self, host: &BareMetalHost) -> Result<BmcCredentials, ResolveError> {
        let secret_ref = bmc_secret_reference(host)?;
        let secret = self.get_secret(&secret_ref, host).await?;
        let version = secret.metadata.resource_version.clone().unwrap_or_default();

        debug!(
            "Resolved BMC secret {}/{} (version {}) for host {}",
            secret_ref.namespace_or("default"),
            secret_ref.name,
            version,
            host.identity()
        );

        credentials_from_values(
            host,
            &secret_ref,
            &version,
            secret_value(&secret, USERNAME_KEY).as_deref(),
            secret_value(&secret, PASSWORD_KEY).as_deref(),
        )
    }

    async fn resolve_config_steps(&self, host: &BareMetalHost) -> Result<Vec<CleanStep>, ResolveError> {
        let Some(steps_ref) = &host.spec.config_steps_ref else {
            return Ok(Vec::new());
        };
        let namespace = host.metadata.namespace.as_deref().unwrap_or("default");
        let source = format!("{}/{}", namespace, steps_ref.name);
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);

        let config_map = match config_maps.get_opt(&steps_ref.name).await {
            Ok(Some(config_map)) => config_map,
            Ok(None) => {
                return Err(ResolveError::new(
                    ResolveErrorKind::ResolveConfigStepsRef,
                    format!("{} for host {}", source, host.identity()),
                ));
            }
            Err(e) => {
                warn!("Failed to read config steps ConfigMap {}: {}", source, e);
                return Err(ResolveError::new(
                    ResolveErrorKind::ResolveConfigStepsRef,
                    format!("{} ({}) for host {}", source, e, host.identity()),
                ));
            }
        };

        let payload = config_map
            .data
            .as_ref()
            .and_then(|data| data.get(&steps_ref.key))
            .ok_or_else(|| {
                ResolveError::new(
                    ResolveErrorKind::ResolveConfigStepsRef,
                    format!("{} (no key {:?}) for host {}", source, steps_ref.key, host.identity()),
                )
            })?;

        parse_config_steps(host, &source, payload)
    }

    async fn save_secret_owner(&self, secret_ref: &SecretReference, host: &BareMetalHost) -> Result<(), ResolveError> {
        let owner_error = |detail: String| {
            ResolveError::new(
                ResolveErrorKind::SaveBmcSecretOwner,
                format!(
                    "{}/{} ({}) for host {}",
                    secret_ref.namespace_or("default"),
                    secret_ref.name,
                    detail,
                    host.identity()
                ),
            )
        };

        let owner = host
            .controller_owner_ref(&())
            .ok_or_else(|| owner_error("host has no uid yet".to_string()))?;

        let secret = self.get_secret(secret_ref, host).await?;
        let mut owners = secret.metadata.owner_references.unwrap_or_default();

        if owners.iter().any(|existing| existing.uid == owner.uid) {
            debug!("BMC secret {} already owned by host {}", secret_ref.name, host.identity());
            return Ok(());
        }
        if let Some(controller) = owners.iter().find(|existing| existing.controller == Some(true)) {
            return Err(owner_error(format!(
                "already controlled by {} {}",
                controller.kind, controller.name
            )));
        }
        owners.push(owner);

        let patch = serde_json::json!({
            "metadata": {
                "ownerReferences": owners,
            }
        });
        self.secrets(secret_ref.namespace_or("default"))
            .patch(&secret_ref.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| owner_error(e.to_string()))?;

        info!("Host {} now owns BMC secret {}", host.identity(), secret_ref.name);
        Ok(())
    }
}
