//! Device position lookup for the "weather here" flow.
//!
//! A terminal has no GPS, so the position is approximated from the public
//! IP address. The lookup only runs when the user has allowed it.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;

use crate::{config::Config, error::LocationError, model::Coordinates};

pub const DEFAULT_SERVICE_URL: &str = "http://ip-api.com/json";

#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn current_location(&self) -> Result<Coordinates, LocationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IpLocationProvider {
    permission: Permission,
    service_url: String,
    http: Client,
}

impl IpLocationProvider {
    pub fn new(permission: Permission, service_url: impl Into<String>) -> Self {
        Self {
            permission,
            service_url: service_url.into(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let permission = if config.location.allow {
            Permission::Granted
        } else {
            Permission::Denied
        };
        let url = config
            .location
            .service_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

        Self::new(permission, url)
    }
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        if self.permission == Permission::Denied {
            tracing::info!("Location lookup refused: permission not granted");
            return Err(LocationError::PermissionDenied);
        }

        let res = self
            .http
            .get(&self.service_url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "location service returned {}",
                res.status()
            )));
        }

        let body: IpApiResponse = res.json().await?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(latitude), Some(longitude)) => {
                tracing::debug!(latitude, longitude, "Resolved location");
                Ok(Coordinates { latitude, longitude })
            }
            _ => Err(LocationError::Unavailable(
                body.message.unwrap_or_else(|| "no position in response".to_string()),
            )),
        }
    }
}
