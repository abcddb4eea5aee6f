//! Hardware inventory discovered by inspection
//!
//! Written into `status.hardware` by the out-of-band driver once inspection
//! completes. The lifecycle engine only cares whether it is present.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Inventory of a single host
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HardwareDetails {
    #[serde(default)]
    pub system_vendor: HardwareSystemVendor,

    #[serde(default)]
    pub firmware: Firmware,

    /// Installed memory in MiB
    #[serde(default)]
    pub ram_mebibytes: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nics: Vec<Nic>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage: Vec<Storage>,

    #[serde(default)]
    pub cpu: Cpu,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HardwareSystemVendor {
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub serial_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Firmware {
    #[serde(default)]
    pub bios: Bios,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bios {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub version: String,
}

/// Network interface
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Nic {
    pub name: String,

    #[serde(default)]
    pub model: String,

    /// MAC address (e.g., "aa:bb:cc:dd:ee:ff")
    #[serde(default)]
    pub mac: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(default)]
    pub speed_gbps: u32,

    /// Whether the NIC is able to PXE boot
    #[serde(default)]
    pub pxe: bool,
}

/// Disk or other block device
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Storage {
    pub name: String,

    #[serde(default)]
    pub rotational: bool,

    #[serde(default)]
    pub size_bytes: u64,

    #[serde(default)]
    pub vendor: String,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub serial_number: String,

    /// SCSI host:channel:target:lun
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hctl: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cpu {
    #[serde(default)]
    pub arch: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub clock_megahertz: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(default)]
    pub count: u32,
}
