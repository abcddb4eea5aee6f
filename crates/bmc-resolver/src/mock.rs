//! Mock resolver for unit testing
//!
//! Stores secrets and config-step payloads in memory so reconcilers can be
//! exercised without a Kubernetes API server.

use crate::error::{ResolveError, ResolveErrorKind};
use crate::models::{bmc_secret_reference, credentials_from_values, parse_config_steps, BmcCredentials};
use crate::resolver_trait::CredentialsResolver;
use crds::{BareMetalHost, CleanStep, SecretReference};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Key = (String, String);

#[derive(Debug, Clone)]
struct MockSecret {
    username: String,
    password: String,
    version: String,
}

/// In-memory [`CredentialsResolver`]
#[derive(Clone, Default)]
pub struct MockCredentialsResolver {
    secrets: Arc<Mutex<HashMap<Key, MockSecret>>>,
    // (namespace, configmap name) -> key -> YAML payload
    config_maps: Arc<Mutex<HashMap<Key, HashMap<String, String>>>>,
    // (namespace, secret name) -> owning host identity
    owners: Arc<Mutex<HashMap<Key, String>>>,
    fail_owner_saves: Arc<AtomicBool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockCredentialsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credentials Secret (for test setup)
    pub fn add_secret(&self, namespace: &str, name: &str, username: &str, password: &str) {
        let mut secrets = lock(&self.secrets);
        let version = (secrets.len() + 1).to_string();
        secrets.insert(
            (namespace.to_string(), name.to_string()),
            MockSecret {
                username: username.to_string(),
                password: password.to_string(),
                version,
            },
        );
    }

    /// Add a config-steps ConfigMap key holding a YAML payload (for test setup)
    pub fn add_config_steps(&self, namespace: &str, name: &str, key: &str, payload: &str) {
        lock(&self.config_maps)
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(key.to_string(), payload.to_string());
    }

    /// Make every subsequent `save_secret_owner` call fail
    pub fn fail_owner_saves(&self, fail: bool) {
        self.fail_owner_saves.store(fail, Ordering::SeqCst);
    }

    /// Host identity recorded as owner of a Secret
    pub fn secret_owner(&self, namespace: &str, name: &str) -> Option<String> {
        lock(&self.owners)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }
}

#[async_trait::async_trait]
impl CredentialsResolver for MockCredentialsResolver {
    async fn resolve_bmc_credentials(&self, host: &BareMetalHost) -> Result<BmcCredentials, ResolveError> {
        let secret_ref = bmc_secret_reference(host)?;
        let namespace = secret_ref.namespace_or("default").to_string();
        let stored = lock(&self.secrets)
            .get(&(namespace.clone(), secret_ref.name.clone()))
            .cloned()
            .ok_or_else(|| {
                ResolveError::new(
                    ResolveErrorKind::ResolveBmcSecretRef,
                    format!("{}/{} for host {}", namespace, secret_ref.name, host.identity()),
                )
            })?;

        credentials_from_values(
            host,
            &secret_ref,
            &stored.version,
            Some(&stored.username),
            Some(&stored.password),
        )
    }

    async fn resolve_config_steps(&self, host: &BareMetalHost) -> Result<Vec<CleanStep>, ResolveError> {
        let Some(steps_ref) = &host.spec.config_steps_ref else {
            return Ok(Vec::new());
        };
        let namespace = host.metadata.namespace.as_deref().unwrap_or("default");
        let source = format!("{}/{}", namespace, steps_ref.name);

        let payload = lock(&self.config_maps)
            .get(&(namespace.to_string(), steps_ref.name.clone()))
            .and_then(|data| data.get(&steps_ref.key).cloned())
            .ok_or_else(|| {
                ResolveError::new(
                    ResolveErrorKind::ResolveConfigStepsRef,
                    format!("{} for host {}", source, host.identity()),
                )
            })?;

        parse_config_steps(host, &source, &payload)
    }

    async fn save_secret_owner(&self, secret_ref: &SecretReference, host: &BareMetalHost) -> Result<(), ResolveError> {
        let key = (secret_ref.namespace_or("default").to_string(), secret_ref.name.clone());
        if self.fail_owner_saves.load(Ordering::SeqCst) || !lock(&self.secrets).contains_key(&key) {
            return Err(ResolveError::new(
                ResolveErrorKind::SaveBmcSecretOwner,
                format!("{}/{} for host {}", key.0, key.1, host.identity()),
            ));
        }
        lock(&self.owners).insert(key, host.identity());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::{BareMetalHostSpec, BmcDetails, ConfigStepsReference};

    fn host() -> BareMetalHost {
        let mut host = BareMetalHost::new(
            "myhost",
            BareMetalHostSpec {
                bmc: BmcDetails {
                    address: "redfish://10.0.0.5/redfish/v1/Systems/1".to_string(),
                    credentials_name: "bmc-secret".to_string(),
                },
                ..Default::default()
            },
        );
        host.metadata.namespace = Some("myns".to_string());
        host
    }

    #[tokio::test]
    async fn test_resolve_bmc_credentials() {
        let resolver = MockCredentialsResolver::new();
        let err = resolver.resolve_bmc_credentials(&host()).await.expect_err("secret missing");
        assert_eq!(err.kind(), ResolveErrorKind::ResolveBmcSecretRef);
        assert_eq!(
            err.to_string(),
            "BMC CredentialsName secret doesn't exist myns/bmc-secret for host myns/myhost"
        );

        resolver.add_secret("myns", "bmc-secret", "admin", "password");
        let creds = resolver.resolve_bmc_credentials(&host()).await.expect("secret present");
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.secret, SecretReference::with_namespace("bmc-secret", "myns"));
    }

    #[tokio::test]
    async fn test_resolve_bmc_credentials_validates_descriptor_first() {
        let resolver = MockCredentialsResolver::new();
        resolver.add_secret("myns", "bmc-secret", "admin", "password");

        let mut no_address = host();
        no_address.spec.bmc.address.clear();
        let err = resolver.resolve_bmc_credentials(&no_address).await.expect_err("no address");
        assert_eq!(err.kind(), ResolveErrorKind::EmptyBmcAddress);

        let mut no_secret = host();
        no_secret.spec.bmc.credentials_name.clear();
        let err = resolver.resolve_bmc_credentials(&no_secret).await.expect_err("no secret");
        assert_eq!(err.kind(), ResolveErrorKind::EmptyBmcSecret);
    }

    #[tokio::test]
    async fn test_resolve_config_steps() {
        let resolver = MockCredentialsResolver::new();
        assert!(resolver.resolve_config_steps(&host()).await.expect("no ref").is_empty());

        let mut with_ref = host();
        with_ref.spec.config_steps_ref = Some(ConfigStepsReference {
            name: "steps".to_string(),
            key: "cleanSteps".to_string(),
        });
        let err = resolver.resolve_config_steps(&with_ref).await.expect_err("configmap missing");
        assert_eq!(err.kind(), ResolveErrorKind::ResolveConfigStepsRef);
        assert!(err.message().contains("myns/myhost"));

        resolver.add_config_steps("myns", "steps", "cleanSteps", "- interface: deploy\n  step: erase_devices\n");
        let steps = resolver.resolve_config_steps(&with_ref).await.expect("configmap present");
        assert_eq!(steps, vec![CleanStep::new("deploy", "erase_devices")]);
    }

    #[tokio::test]
    async fn test_save_secret_owner() {
        let resolver = MockCredentialsResolver::new();
        let secret = SecretReference::with_namespace("bmc-secret", "myns");
        resolver.add_secret("myns", "bmc-secret", "admin", "password");

        resolver.save_secret_owner(&secret, &host()).await.expect("owner saved");
        assert_eq!(resolver.secret_owner("myns", "bmc-secret").as_deref(), Some("myns/myhost"));

        resolver.fail_owner_saves(true);
        let err = resolver.save_secret_owner(&secret, &host()).await.expect_err("forced failure");
        assert_eq!(err.kind(), ResolveErrorKind::SaveBmcSecretOwner);
    }
}
