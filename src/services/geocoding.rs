// src/services/geocoding.rs
//! Nominatim reverse geocoding.

use crate::common::geo::Coordinates;
use crate::services::settings::SettingsService;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Debug, thiserror::Error)]
pub enum GeocodingError {
    #[error("Geocoding request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Settings error: {0}")]
    SettingsError(String),
}

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim's usage policy requires an identifying agent.
const USER_AGENT: &str = "scholargrid-api/0.1";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub neighbourhood: Option<String>,
    pub suburb: Option<String>,
    pub city_district: Option<String>,
    pub city: Option<String>,
    pub road: Option<String>,
    pub postcode: Option<String>,
}

impl Address {
    /// Most specific named area, from neighbourhood up to city.
    pub fn most_specific_area(&self) -> Option<String> {
        [
            &self.neighbourhood,
            &self.suburb,
            &self.city_district,
            &self.city,
        ]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReverseGeocode {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub address: Address,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct GeocodingService {
    settings_service: Arc<SettingsService>,
    client: Client,
}

impl GeocodingService {
    pub fn new(settings_service: Arc<SettingsService>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            settings_service,
            client,
        }
    }

    pub async fn reverse(&self, point: Coordinates) -> Result<ReverseGeocode, GeocodingError> {
        let base_url = self
            .settings_service
            .get_or("nominatim_base_url", DEFAULT_BASE_URL)
            .await
            .map_err(|e| GeocodingError::SettingsError(e.to_string()))?;

        let url = format!("{}/reverse", base_url.trim_end_matches('/'));
        debug!(lat = point.latitude, lng = point.longitude, "Reverse geocoding point");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
                ("zoom", "16".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| GeocodingError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Nominatim request failed");
            return Err(GeocodingError::RequestFailed(format!("HTTP {}", status)));
        }

        let body = response
            .json::<ReverseGeocode>()
            .await
            .map_err(|e| GeocodingError::InvalidResponse(e.to_string()))?;

        parse_reverse(body)
    }
}

fn parse_reverse(body: ReverseGeocode) -> Result<ReverseGeocode, GeocodingError> {
    if let Some(message) = &body.error {
        return Err(GeocodingError::InvalidResponse(message.clone()));
    }
    Ok(body)
}
