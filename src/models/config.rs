use serde::{Deserialize, Serialize};

/// Physical button label and the device slot it triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonMapping {
    pub name: String,
    pub esp_btn: u32,
}

/// The part of the configuration the browser UI needs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub device_url: String,
    /// `host[:port]` of the device, used by the UI to call it directly.
    pub esp32_ip: String,
    pub buttons_mapping: Vec<ButtonMapping>,
}
