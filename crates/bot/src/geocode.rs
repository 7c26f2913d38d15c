//! Address to coordinates lookup against a Nominatim-compatible endpoint
//!
//! Best effort only: every failure is logged and reported as `None`.

use std::time::Duration;

use anyhow::Result;
use invevent_core::geo::Coordinates;
use serde::Deserialize;
use url::Url;

const USER_AGENT: &str = concat!("invevent-bot/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

#[derive(Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    /// `None` disables lookups
    endpoint: Option<Url>,
    timeout: Duration,
}

impl Geocoder {
    pub fn new(endpoint: Option<Url>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn disabled() -> Result<Self> {
        Self::new(None, Duration::from_secs(1))
    }

    pub async fn geocode(&self, address: &str) -> Option<Coordinates> {
        let endpoint = self.endpoint.as_ref()?;
        match tokio::time::timeout(self.timeout, self.lookup(endpoint, address)).await {
            Ok(Ok(Some(point))) => {
                tracing::debug!("Geocoded {:?} to {:?}", address, point);
                Some(point)
            }
            Ok(Ok(None)) => {
                tracing::warn!("Geocoder found nothing for {:?}", address);
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("Geocoding {:?} failed: {}", address, e);
                None
            }
            Err(_) => {
                tracing::warn!("Geocoding {:?} timed out after {:?}", address, self.timeout);
                None
            }
        }
    }

    async fn lookup(&self, endpoint: &Url, address: &str) -> Result<Option<Coordinates>> {
        let places: Vec<Place> = self
            .client
            .get(endpoint.clone())
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        first_place(&places)
    }
}

fn first_place(places: &[Place]) -> Result<Option<Coordinates>> {
    let Some(place) = places.first() else {
        return Ok(None);
    };
    Ok(Some(Coordinates::new(place.lat.parse()?, place.lon.parse()?)))
}
