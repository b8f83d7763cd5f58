use serde::{Deserialize, Serialize};

/// Snapshot returned by the device's `/info` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceInfo {
    pub version: String,
    pub name: String,
    pub free_mem: u64,
    pub flash_size: u64,
    pub chip_id: String,
    pub mac_address: String,
    pub files: Vec<DeviceFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceFile {
    pub name: String,
    pub size: u64,
}
