//! JSON response shapes for the Cync/GE cloud REST API.
//!
//! These mirror the vendor API byte-for-byte; the domain-shaped `Topology`
//! these feed into lives in `cync-core`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest<'a> {
    pub corp_id: &'static str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TwoFactorVerifyCodeRequest<'a> {
    pub corp_id: &'static str,
    pub email: &'a str,
    pub local_lang: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TwoFactorAuthRequest<'a> {
    pub corp_id: &'static str,
    pub email: &'a str,
    pub password: &'a str,
    pub two_factor: &'a str,
    pub resource: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user_id: u32,
    pub authorize: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribedDevice {
    pub product_id: String,
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceProperty {
    #[serde(default, rename = "bulbsArray")]
    pub bulbs_array: Vec<RawBulb>,
    #[serde(default, rename = "groupsArray")]
    pub groups_array: Vec<RawGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBulb {
    #[serde(rename = "deviceID")]
    pub device_id: i64,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "deviceType")]
    pub device_type: u32,
    #[serde(rename = "switchID", default)]
    pub switch_id: u32,
    #[serde(default)]
    pub mac: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGroup {
    #[serde(rename = "groupID")]
    pub group_id: i64,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "deviceIDArray", default)]
    pub device_id_array: Vec<i64>,
    #[serde(rename = "subgroupIDArray", default)]
    pub subgroup_id_array: Vec<i64>,
    #[serde(rename = "isSubgroup", default)]
    pub is_subgroup: bool,
}
