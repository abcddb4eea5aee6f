//! Resolved values and the validation shared by every resolver

use crate::error::{ResolveError, ResolveErrorKind};
use crds::{BareMetalHost, CleanStep, SecretReference};
use std::fmt;

/// Username and password read from a host's credentials Secret
#[derive(Clone, PartialEq, Eq)]
pub struct BmcCredentials {
    pub username: String,
    pub password: String,
    /// Secret the credentials were read from
    pub secret: SecretReference,
    /// Resource version of that Secret
    pub version: String,
}

impl fmt::Debug for BmcCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BmcCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("secret", &self.secret)
            .field("version", &self.version)
            .finish()
    }
}

/// Validate the host's BMC descriptor and return its credentials Secret reference
///
/// Fails with `EmptyBmcAddress` or `EmptyBmcSecret` before any lookup is made.
pub fn bmc_secret_reference(host: &BareMetalHost) -> Result<SecretReference, ResolveError> {
    let bmc = &host.spec.bmc;
    if bmc.address.trim().is_empty() {
        return Err(ResolveError::new(
            ResolveErrorKind::EmptyBmcAddress,
            format!("for host {}", host.identity()),
        ));
    }
    if bmc.credentials_name.trim().is_empty() {
        return Err(ResolveError::new(
            ResolveErrorKind::EmptyBmcSecret,
            format!("for host {}", host.identity()),
        ));
    }
    Ok(SecretReference::with_namespace(
        &bmc.credentials_name,
        host.metadata.namespace.as_deref().unwrap_or("default"),
    ))
}

/// Build credentials from raw Secret values, rejecting missing or blank fields
pub fn credentials_from_values(
    host: &BareMetalHost,
    secret: &SecretReference,
    version: &str,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<BmcCredentials, ResolveError> {
    let missing = |field: &str| {
        ResolveError::new(
            ResolveErrorKind::EmptyBmcSecret,
            format!(
                "(secret {}/{} has no {}) for host {}",
                secret.namespace_or("default"),
                secret.name,
                field,
                host.identity()
            ),
        )
    };
    let username = username.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| missing("username"))?;
    let password = password.filter(|v| !v.trim().is_empty()).ok_or_else(|| missing("password"))?;

    Ok(BmcCredentials {
        username: username.to_string(),
        password: password.to_string(),
        secret: secret.clone(),
        version: version.to_string(),
    })
}

/// Decode a YAML list of clean steps from a config-steps payload
pub fn parse_config_steps(
    host: &BareMetalHost,
    source: &str,
    payload: &str,
) -> Result<Vec<CleanStep>, ResolveError> {
    if payload.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(payload).map_err(|e| {
        ResolveError::new(
            ResolveErrorKind::ResolveConfigStepsRef,
            format!("{} (invalid clean steps: {}) for host {}", source, e, host.identity()),
        )
    })
}
