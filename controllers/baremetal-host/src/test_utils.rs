//! Test utilities for unit testing the reconciler
//!
//! Builders for hosts in the shapes the reconciler tests need.

#[cfg(test)]
use bmc_resolver::MockCredentialsResolver;
#[cfg(test)]
use crds::*;
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Helper to create a test BareMetalHost with a valid BMC descriptor and no status
#[cfg(test)]
pub fn create_test_host(name: &str, namespace: &str) -> BareMetalHost {
    BareMetalHost {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(format!("uid-{}", name)),
            ..Default::default()
        },
        spec: BareMetalHostSpec {
            bmc: BmcDetails {
                address: "ipmi://192.168.122.1:6233".to_string(),
                credentials_name: format!("{}-bmc-secret", name),
            },
            online: true,
            ..Default::default()
        },
        status: None,
    }
}

/// Helper to create a host that has already been inspected
#[cfg(test)]
pub fn create_inspected_host(name: &str, namespace: &str) -> BareMetalHost {
    let mut host = create_test_host(name, namespace);
    host.status_mut().hardware = Some(HardwareDetails {
        hostname: "node-0".to_string(),
        ram_mebibytes: 16384,
        ..Default::default()
    });
    host
}

/// Helper to create a mock resolver holding the credentials Secret of `host`
#[cfg(test)]
pub fn create_resolver_for(host: &BareMetalHost) -> MockCredentialsResolver {
    let resolver = MockCredentialsResolver::new();
    resolver.add_secret(
        host.metadata.namespace.as_deref().unwrap_or("default"),
        &host.spec.bmc.credentials_name,
        "admin",
        "password",
    );
    resolver
}
