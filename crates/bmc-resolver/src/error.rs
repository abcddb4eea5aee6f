//! Resolution errors
//!
//! Closed taxonomy of the ways resolving a host's out-of-band prerequisites
//! can fail. Retry policy is decided by the caller, not encoded here.

use std::fmt;
use thiserror::Error;

/// Kind of resolution failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveErrorKind {
    /// BMC descriptor present but its address is empty
    EmptyBmcAddress,

    /// BMC descriptor present but its credentials reference is empty
    EmptyBmcSecret,

    /// Credentials reference set but the Secret does not exist
    ResolveBmcSecretRef,

    /// Taking ownership of the credentials Secret failed
    SaveBmcSecretOwner,

    /// Config-steps reference set but the ConfigMap (or its key) does not exist
    ResolveConfigStepsRef,
}

impl ResolveErrorKind {
    /// Every kind, in declaration order
    pub const ALL: [ResolveErrorKind; 5] = [
        ResolveErrorKind::EmptyBmcAddress,
        ResolveErrorKind::EmptyBmcSecret,
        ResolveErrorKind::ResolveBmcSecretRef,
        ResolveErrorKind::SaveBmcSecretOwner,
        ResolveErrorKind::ResolveConfigStepsRef,
    ];

    /// Human-readable prefix of the error message
    pub fn summary(self) -> &'static str {
        match self {
            ResolveErrorKind::EmptyBmcAddress => "Empty BMC address",
            ResolveErrorKind::EmptyBmcSecret => "No BMC CredentialsName defined",
            ResolveErrorKind::ResolveBmcSecretRef => "BMC CredentialsName secret doesn't exist",
            ResolveErrorKind::SaveBmcSecretOwner => "Failed to set owner of BMC secret",
            ResolveErrorKind::ResolveConfigStepsRef => "Config steps ConfigMap doesn't exist",
        }
    }
}

impl fmt::Display for ResolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.summary())
    }
}

/// A resolution failure: fixed kind plus free-form diagnostic message
///
/// The message always names the host (`namespace/name`) the failure is for.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} {message}")]
pub struct ResolveError {
    kind: ResolveErrorKind,
    message: String,
}

impl ResolveError {
    pub fn new(kind: ResolveErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ResolveErrorKind {
        self.kind
    }

    /// Diagnostic detail, without the kind summary
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes_summary() {
        let err = ResolveError::new(ResolveErrorKind::EmptyBmcAddress, "for host myns/myhost");
        assert_eq!(err.to_string(), "Empty BMC address for host myns/myhost");
        assert_eq!(err.kind(), ResolveErrorKind::EmptyBmcAddress);
        assert_eq!(err.message(), "for host myns/myhost");
    }

    #[test]
    fn test_every_kind_has_distinct_summary() {
        let mut summaries: Vec<&str> = ResolveErrorKind::ALL.iter().map(|k| k.summary()).collect();
        summaries.sort_unstable();
        summaries.dedup();
        assert_eq!(summaries.len(), ResolveErrorKind::ALL.len());
    }

    #[test]
    fn test_kind_summaries() {
        let rendered: Vec<String> = ResolveErrorKind::ALL
            .iter()
            .map(|kind| ResolveError::new(*kind, "x").to_string())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "Empty BMC address x",
                "No BMC CredentialsName defined x",
                "BMC CredentialsName secret doesn't exist x",
                "Failed to set owner of BMC secret x",
                "Config steps ConfigMap doesn't exist x",
            ]
        );
    }
}
