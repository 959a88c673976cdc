//! Blocking neutron API client authenticated through keystone v2

use super::{ClientConnector, Credentials, NeutronClient, Router};
use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: Access,
}

#[derive(Debug, Deserialize)]
struct Access {
    token: Token,
    #[serde(rename = "serviceCatalog", default)]
    service_catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct Token {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    #[serde(default)]
    region: Option<String>,
    #[serde(rename = "publicURL")]
    public_url: String,
}

#[derive(Debug, Deserialize)]
struct RouterList {
    routers: Vec<Router>,
}

/// Connects by requesting a keystone v2 token and looking up the network
/// endpoint for the configured region in the service catalog
pub struct KeystoneConnector {
    http: Client,
}

impl KeystoneConnector {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl Default for KeystoneConnector {
    fn default() -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::new(http)
    }
}

impl ClientConnector for KeystoneConnector {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn NeutronClient>> {
        let url = format!("{}/tokens", credentials.auth_url.trim_end_matches('/'));
        debug!("Requesting token from {}", url);

        let body = json!({
            "auth": {
                "tenantName": credentials.tenant_name,
                "passwordCredentials": {
                    "username": credentials.username,
                    "password": credentials.password,
                }
            }
        });
        let response: TokenResponse = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .with_context(|| format!("Failed to reach keystone at {}", url))?
            .error_for_status()
            .context("Keystone rejected the credentials")?
            .json()
            .context("Invalid keystone token response")?;

        let endpoints: Vec<&Endpoint> = response
            .access
            .service_catalog
            .iter()
            .filter(|entry| entry.service_type == "network")
            .flat_map(|entry| entry.endpoints.iter())
            .collect();
        let endpoint = endpoints
            .iter()
            .find(|e| e.region.as_deref() == Some(credentials.region.as_str()))
            .or_else(|| endpoints.first())
            .ok_or_else(|| anyhow!("No network endpoint in the service catalog"))?;

        Ok(Box::new(HttpNeutronClient::new(
            self.http.clone(),
            endpoint.public_url.clone(),
            response.access.token.id,
        )))
    }
}

/// Neutron API client using a pre-issued token
pub struct HttpNeutronClient {
    http: Client,
    endpoint: String,
    token: String,
}

impl HttpNeutronClient {
    pub fn new(http: Client, endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }
}

impl NeutronClient for HttpNeutronClient {
    fn list_routers(&self) -> Result<Vec<Router>> {
        let url = format!("{}/v2.0/routers", self.endpoint.trim_end_matches('/'));
        let list: RouterList = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.token)
            .send()
            .with_context(|| format!("Failed to reach neutron at {}", url))?
            .error_for_status()?
            .json()
            .context("Invalid router listing")?;
        Ok(list.routers)
    }
}
