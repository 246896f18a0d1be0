//! Server inventory of a Hetzner Cloud project.
//!
//! [`Inventory`] is what discovery needs from the cloud; [`HcloudClient`]
//! answers it over the public REST API.

use std::{collections::HashMap, net::IpAddr};

use ipnetwork::IpNetwork;
use serde::{de::DeserializeOwned, Deserialize};

use crate::{config::ResolvedConfig, errors::DiscoverError};

const PER_PAGE: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum IpFamily {
    #[serde(rename = "ipv4")]
    V4,
    #[serde(rename = "ipv6")]
    V6,
}

/// A directly attached public address.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicAddress {
    pub ip: IpAddr,
    pub blocked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatingAddress {
    pub ip: IpAddr,
    pub family: IpFamily,
    pub blocked: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkEndpoints {
    /// One entry per attached private network, in API order.
    pub private: Vec<IpAddr>,
    pub public_v4: Option<PublicAddress>,
    pub public_v6: Option<PublicAddress>,
    pub floating: Vec<FloatingAddress>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerRecord {
    pub id: u64,
    pub name: String,
    /// Name of the datacenter location, e.g. `fsn1`.
    pub location: String,
    pub endpoints: NetworkEndpoints,
}

#[async_trait::async_trait]
pub trait Inventory: Send + Sync {
    /// Looks up a server by its exact name.
    async fn server_by_name(&self, name: &str) -> Result<Option<ServerRecord>, DiscoverError>;
    /// Lists all running servers matching `label_selector`. An empty
    /// selector matches every server.
    async fn running_servers(&self, label_selector: &str)
        -> Result<Vec<ServerRecord>, DiscoverError>;
}

#[async_trait::async_trait]
impl<'a, T: Inventory + ?Sized> Inventory for &'a T {
    async fn server_by_name(&self, name: &str) -> Result<Option<ServerRecord>, DiscoverError> {
        (**self).server_by_name(name).await
    }

    async fn running_servers(
        &self,
        label_selector: &str,
    ) -> Result<Vec<ServerRecord>, DiscoverError> {
        (**self).running_servers(label_selector).await
    }
}

#[derive(Debug, Deserialize)]
struct Meta {
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    next_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListServersResponse {
    servers: Vec<Server>,
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct ListFloatingIpsResponse {
    floating_ips: Vec<FloatingIp>,
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct Server {
    id: u64,
    name: String,
    datacenter: Datacenter,
    public_net: PublicNet,
    #[serde(default)]
    private_net: Vec<PrivateNet>,
}

#[derive(Debug, Deserialize)]
struct Datacenter {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PublicNet {
    ipv4: Option<PublicIp>,
    ipv6: Option<PublicIp>,
    /// Only ids; resolved through the floating IP listing.
    #[serde(default)]
    floating_ips: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct PublicIp {
    ip: String,
    blocked: bool,
}

#[derive(Debug, Deserialize)]
struct PrivateNet {
    ip: String,
}

#[derive(Debug, Deserialize)]
struct FloatingIp {
    id: u64,
    ip: String,
    #[serde(rename = "type")]
    family: IpFamily,
    blocked: bool,
}

trait Paginated: DeserializeOwned {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<u64>);
}

fn next_page(meta: Option<Meta>) -> Option<u64> {
    meta.and_then(|m| m.pagination).and_then(|p| p.next_page)
}

impl Paginated for ListServersResponse {
    type Item = Server;

    fn into_parts(self) -> (Vec<Server>, Option<u64>) {
        (self.servers, next_page(self.meta))
    }
}

impl Paginated for ListFloatingIpsResponse {
    type Item = FloatingIp;

    fn into_parts(self) -> (Vec<FloatingIp>, Option<u64>) {
        (self.floating_ips, next_page(self.meta))
    }
}

/// IPv6 values come as networks (`2001:db8::/64`); the address part is used.
fn parse_address(value: &str) -> Result<IpAddr, DiscoverError> {
    let invalid = || DiscoverError::ProviderRequestFailed(format!("Invalid IP address `{}`", value));
    if value.contains('/') {
        value
            .parse::<IpNetwork>()
            .map(|net| net.ip())
            .map_err(|_| invalid())
    } else {
        value.parse::<IpAddr>().map_err(|_| invalid())
    }
}

impl PublicIp {
    fn into_address(self) -> Result<PublicAddress, DiscoverError> {
        Ok(PublicAddress {
            ip: parse_address(&self.ip)?,
            blocked: self.blocked,
        })
    }
}

impl FloatingIp {
    fn into_address(self) -> Result<(u64, FloatingAddress), DiscoverError> {
        let address = FloatingAddress {
            ip: parse_address(&self.ip)?,
            family: self.family,
            blocked: self.blocked,
        };
        Ok((self.id, address))
    }
}

impl Server {
    /// Floating ids missing from `floating` are dropped.
    fn into_record(
        self,
        floating: &HashMap<u64, FloatingAddress>,
    ) -> Result<ServerRecord, DiscoverError> {
        let private = self
            .private_net
            .iter()
            .map(|net| parse_address(&net.ip))
            .collect::<Result<Vec<_>, _>>()?;

        let endpoints = NetworkEndpoints {
            private,
            public_v4: self.public_net.ipv4.map(PublicIp::into_address).transpose()?,
            public_v6: self.public_net.ipv6.map(PublicIp::into_address).transpose()?,
            floating: self
                .public_net
                .floating_ips
                .iter()
                .filter_map(|id| floating.get(id).cloned())
                .collect(),
        };

        Ok(ServerRecord {
            id: self.id,
            name: self.name,
            location: self.datacenter.location.name,
            endpoints,
        })
    }
}

fn request_failed<E: std::fmt::Debug>(e: E) -> DiscoverError {
    DiscoverError::ProviderRequestFailed(format!("{:?}", e))
}

#[derive(Debug, Clone)]
pub struct HcloudClient {
    http: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl HcloudClient {
    pub fn new(config: &ResolvedConfig) -> Self {
        HcloudClient {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DiscoverError> {
        let res = self
            .http
            .get(format!("{}{}", self.endpoint, path))
            .bearer_auth(&self.api_token)
            .query(query)
            .send()
            .await
            .map_err(request_failed)?;

        let status = res.status();
        if !status.is_success() {
            let message = match res.json::<ErrorResponse>().await {
                Ok(body) => format!("{} ({})", body.error.message, body.error.code),
                Err(_) => "no error details".to_string(),
            };
            return Err(DiscoverError::ProviderRequestFailed(format!(
                "{} returned {}: {}",
                path, status, message
            )));
        }

        res.json::<T>().await.map_err(request_failed)
    }

    async fn get_all<P>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<P::Item>, DiscoverError>
    where
        P: Paginated + Send,
        P::Item: Send,
    {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let mut paged = query.to_vec();
            paged.push(("page", page.to_string()));
            paged.push(("per_page", PER_PAGE.to_string()));

            let (batch, next) = self.get::<P>(path, &paged).await?.into_parts();
            items.extend(batch);

            match next {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(items)
    }

    async fn floating_ips(&self) -> Result<HashMap<u64, FloatingAddress>, DiscoverError> {
        self.get_all::<ListFloatingIpsResponse>("/floating_ips", &[])
            .await?
            .into_iter()
            .map(FloatingIp::into_address)
            .collect()
    }
}

#[async_trait::async_trait]
impl Inventory for HcloudClient {
    async fn server_by_name(&self, name: &str) -> Result<Option<ServerRecord>, DiscoverError> {
        let res = self
            .get::<ListServersResponse>("/servers", &[("name", name.to_string())])
            .await?;

        res.servers
            .into_iter()
            .next()
            .map(|server| server.into_record(&HashMap::new()))
            .transpose()
    }

    async fn running_servers(
        &self,
        label_selector: &str,
    ) -> Result<Vec<ServerRecord>, DiscoverError> {
        let mut query = vec![("status", "running".to_string())];
        if !label_selector.is_empty() {
            query.push(("label_selector", label_selector.to_string()));
        }

        let servers = self
            .get_all::<ListServersResponse>("/servers", &query)
            .await?;

        let floating = if servers.iter().any(|s| !s.public_net.floating_ips.is_empty()) {
            self.floating_ips().await?
        } else {
            HashMap::new()
        };

        servers
            .into_iter()
            .map(|server| server.into_record(&floating))
            .collect()
    }
}
