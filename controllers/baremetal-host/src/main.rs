//! BareMetalHost Controller
//!
//! Watches BareMetalHost resources, resolves each host's BMC credentials and
//! requested clean steps, records resolution errors on the host, and reports
//! the lifecycle phase the host must enter next in its status.

mod backoff;
mod controller;
mod error;
mod reconcile_helpers;
mod reconciler;
mod test_utils;
mod watcher;

use crate::error::ControllerError;
use crate::reconciler::ReconcilerSettings;
use controller::Controller;
use std::env;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Read an optional numeric environment variable
fn env_u64(name: &str, default: u64) -> Result<u64, ControllerError> {
    parse_u64(name, env::var(name).ok().as_deref(), default)
}

fn parse_u64(name: &str, value: Option<&str>, default: u64) -> Result<u64, ControllerError> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            ControllerError::InvalidConfig(format!("{} must be a non-negative integer, got {:?}", name, raw))
        }),
    }
}

fn settings_from_env() -> Result<ReconcilerSettings, ControllerError> {
    let defaults = ReconcilerSettings::default();
    let settings = ReconcilerSettings {
        requeue_interval: Duration::from_secs(env_u64(
            "RECONCILE_INTERVAL_SECS",
            defaults.requeue_interval.as_secs(),
        )?),
        backoff_min_minutes: env_u64("BACKOFF_MIN_MINUTES", defaults.backoff_min_minutes)?,
        backoff_max_minutes: env_u64("BACKOFF_MAX_MINUTES", defaults.backoff_max_minutes)?,
    };
    validate_settings(settings)
}

/// Reject values that would turn requeues into a hot loop
fn validate_settings(settings: ReconcilerSettings) -> Result<ReconcilerSettings, ControllerError> {
    if settings.requeue_interval.is_zero() {
        return Err(ControllerError::InvalidConfig(
            "RECONCILE_INTERVAL_SECS must be at least 1".to_string(),
        ));
    }
    if settings.backoff_min_minutes == 0 {
        return Err(ControllerError::InvalidConfig(
            "BACKOFF_MIN_MINUTES must be at least 1".to_string(),
        ));
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube's rustls stack needs a process-wide crypto provider
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        info!("rustls crypto provider already installed");
    }

    info!("Starting BareMetalHost Controller");

    let namespace = env::var("WATCH_NAMESPACE").ok().filter(|ns| !ns.is_empty());
    let settings = settings_from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Requeue interval: {}s", settings.requeue_interval.as_secs());
    info!(
        "  Error backoff: {}m..{}m",
        settings.backoff_min_minutes, settings.backoff_max_minutes
    );

    let controller = Controller::new(namespace, settings).await?;
    controller.run().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_defaults_when_unset_or_blank() {
        assert_eq!(parse_u64("X", None, 30).expect("default"), 30);
        assert_eq!(parse_u64("X", Some("  "), 30).expect("default"), 30);
        assert_eq!(parse_u64("X", Some(" 45 "), 30).expect("parsed"), 45);
    }

    #[test]
    fn test_parse_u64_rejects_garbage() {
        let err = parse_u64("RECONCILE_INTERVAL_SECS", Some("-5"), 30).expect_err("negative");
        assert!(matches!(err, ControllerError::InvalidConfig(_)));
        assert!(err.to_string().contains("RECONCILE_INTERVAL_SECS"));
    }

    #[test]
    fn test_validate_settings_rejects_zero_intervals() {
        let defaults = ReconcilerSettings::default();
        assert_eq!(validate_settings(defaults.clone()).expect("defaults are valid"), defaults);

        let err = validate_settings(ReconcilerSettings {
            requeue_interval: Duration::ZERO,
            ..Default::default()
        })
        .expect_err("zero requeue interval");
        assert!(err.to_string().contains("RECONCILE_INTERVAL_SECS"));

        let err = validate_settings(ReconcilerSettings {
            backoff_min_minutes: 0,
            ..Default::default()
        })
        .expect_err("zero backoff");
        assert!(err.to_string().contains("BACKOFF_MIN_MINUTES"));
    }
}
