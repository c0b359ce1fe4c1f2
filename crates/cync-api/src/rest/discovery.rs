use tracing::debug;

use crate::error::Result;

use super::client::{status_error, RestClient, Session};
use super::models::{DeviceProperty, RawBulb, RawGroup, SubscribedDevice};

/// A home as returned by discovery: identity plus its raw bulb/group
/// layout, before any filtering or mesh-id computation. `cync-core` turns
/// this into a `Topology`.
#[derive(Debug, Clone)]
pub struct RawHome {
    pub home_id: u32,
    pub name: String,
    pub bulbs: Vec<RawBulb>,
    pub groups: Vec<RawGroup>,
}

/// `GET /v2/user/{user_id}/subscribe/devices`, then
/// `GET /v2/product/{product_id}/device/{home_id}/property` for each home.
pub(super) async fn discover(client: &RestClient, session: &Session) -> Result<Vec<RawHome>> {
    let homes = list_homes(client, session).await?;
    let mut out = Vec::with_capacity(homes.len());
    for home in homes {
        let property = fetch_property(client, session, &home).await?;
        debug!(
            home_id = home.id,
            bulbs = property.bulbs_array.len(),
            groups = property.groups_array.len(),
            "fetched home property"
        );
        out.push(RawHome {
            home_id: home.id,
            name: home.name,
            bulbs: property.bulbs_array,
            groups: property.groups_array,
        });
    }
    Ok(out)
}

async fn list_homes(client: &RestClient, session: &Session) -> Result<Vec<SubscribedDevice>> {
    let url = format!("{}/v2/user/{}/subscribe/devices", client.base_url, session.user_id);
    let (header_name, header_value) = RestClient::auth_header(session);
    let resp = client.http.get(&url).header(header_name, header_value).send().await?;
    if !resp.status().is_success() {
        return Err(status_error(resp.status(), "/v2/user/{user_id}/subscribe/devices"));
    }
    resp.json().await.map_err(crate::Error::Http)
}

async fn fetch_property(
    client: &RestClient,
    session: &Session,
    home: &SubscribedDevice,
) -> Result<DeviceProperty> {
    let url = format!(
        "{}/v2/product/{}/device/{}/property",
        client.base_url, home.product_id, home.id
    );
    let (header_name, header_value) = RestClient::auth_header(session);
    let resp = client.http.get(&url).header(header_name, header_value).send().await?;
    if !resp.status().is_success() {
        return Err(status_error(resp.status(), "/v2/product/{product_id}/device/{home_id}/property"));
    }
    resp.json().await.map_err(crate::Error::Http)
}
