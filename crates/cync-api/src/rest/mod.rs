//! REST client for the Cync/GE cloud API: authentication, two-factor
//! continuation, and home/device discovery.

mod auth;
mod client;
mod discovery;
pub mod models;

pub use client::{AuthOutcome, RestClient, Session};
pub use discovery::RawHome;

const API_BASE: &str = "https://api.gelighting.com";
const CORP_ID: &str = "1007d2ad150c4000";
const TWO_FACTOR_RESOURCE: &str = "abcdefghijklmnop";
