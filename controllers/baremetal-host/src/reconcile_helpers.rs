//! Helper functions for common reconciliation patterns

use crds::BareMetalHostStatus;

/// Whether a newly computed status differs from the stored one
///
/// `lastUpdated` is ignored so a pass that changes nothing else never
/// produces a patch (and never retriggers the watch).
pub fn status_needs_update(current: Option<&BareMetalHostStatus>, desired: &BareMetalHostStatus) -> bool {
    match current {
        Some(current) => {
            let mut current = current.clone();
            current.last_updated = desired.last_updated;
            current != *desired
        }
        None => true,
    }
}

/// Build the merge patch for the status subresource
///
/// Only the fields this controller owns are written. `provisioning.image`,
/// `hardware`, `cleanSteps` and `poweredOn` belong to the hardware driver and
/// must never be overwritten from a cached copy of the host.
pub fn create_host_status_patch(status: &BareMetalHostStatus) -> Result<serde_json::Value, serde_json::Error> {
    let mut owned = serde_json::json!({
        "operationalStatus": serde_json::to_value(status.operational_status)?,
        "errorMessage": status.error_message,
        "provisioning": {
            "state": serde_json::to_value(status.provisioning.state)?,
        },
        "goodCredentials": serde_json::to_value(&status.good_credentials)?,
        "triedCredentials": serde_json::to_value(&status.tried_credentials)?,
    });
    if let Some(last_updated) = status.last_updated {
        owned["lastUpdated"] = serde_json::to_value(last_updated)?;
    }

    Ok(serde_json::json!({ "status": owned }))
}
