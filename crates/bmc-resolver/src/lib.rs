//! BMC Credential & Config Resolver
//!
//! Resolves the out-of-band prerequisites of a `BareMetalHost`: the BMC
//! credentials Secret and the ConfigMap of requested clean steps. Failures
//! are reported through a closed error taxonomy ([`ResolveErrorKind`]) so
//! callers can match them exhaustively and surface them on the host status.
//!
//! # Example
//!
//! ```no_run
//! use bmc_resolver::{CredentialsResolver, KubeCredentialsResolver};
//! use crds::BareMetalHost;
//!
//! # async fn example(host: &BareMetalHost) -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let resolver = KubeCredentialsResolver::new(client);
//!
//! match resolver.resolve_bmc_credentials(host).await {
//!     Ok(credentials) => println!("BMC user {}", credentials.username),
//!     Err(e) => println!("{} ({:?})", e, e.kind()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod resolver_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::KubeCredentialsResolver;
pub use error::{ResolveError, ResolveErrorKind};
pub use models::*;
pub use resolver_trait::CredentialsResolver;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockCredentialsResolver;
