use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::settings::ClientIdentity;

/// `ClientInfo` object merged into every signed JSON request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub app_name: String,
    pub app_version: String,
    pub os: String,
    pub os_architecture: String,
}

impl From<&ClientIdentity> for ClientInfo {
    fn from(identity: &ClientIdentity) -> Self {
        Self {
            app_name: identity.app_name.clone(),
            app_version: identity.app_version.clone(),
            os: identity.os.clone(),
            os_architecture: identity.os_architecture.clone(),
        }
    }
}

/// A reader device that can receive documents.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnedDevice {
    pub device_capabilities: BTreeMap<String, bool>,
    pub device_name: String,
    pub device_serial_number: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetOwnedDevicesResponse {
    pub owned_devices: Vec<OwnedDevice>,
    pub status_code: i64,
}

/// Where and until when the document bytes may be uploaded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetUploadUrlResponse {
    pub expiry_time: i64,
    pub status_code: i64,
    /// Identifies the upload in the later delivery request.
    pub stk_token: String,
    pub upload_url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendToKindleResponse {
    pub sku: String,
    pub status_code: i64,
}

/// Descriptive metadata attached to a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub author: String,
    pub title: String,
    /// Input format, e.g. `pdf` or `epub`.
    pub format: String,
}
