//! Google Directions API adapter.
//!
//! Requests one route over the ordered waypoint list and converts it to the
//! internal shape: meters to km, seconds to minutes, the overview polyline
//! decoded into coordinates. A status other than "OK" is a failure; the
//! caller falls back to straight-line estimation.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::api::provider::{DirectionsProvider, Leg, ProviderError, RouteLegs};
use crate::config::constant::PROVIDER_TIMEOUT_SECS;
use crate::domain::types::Coordinate;

const BASE_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

pub struct GoogleDirections {
    client: Client,
    api_key: String,
}

impl GoogleDirections {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()
            .expect("failed to build directions client");
        Self { client, api_key }
    }

    async fn fetch(&self, waypoints: &[Coordinate]) -> Result<RouteLegs, ProviderError> {
        if waypoints.len() < 2 {
            return Err(ProviderError::EmptyRoute);
        }

        let origin = waypoints[0].key();
        let destination = waypoints[waypoints.len() - 1].key();
        let mut url = format!(
            "{}?origin={}&destination={}&key={}",
            BASE_URL, origin, destination, self.api_key
        );

        let vias = &waypoints[1..waypoints.len() - 1];
        if !vias.is_empty() {
            let joined = vias.iter().map(|w| w.key()).collect::<Vec<_>>().join("|");
            url.push_str("&waypoints=");
            url.push_str(&joined);
        }

        debug!("requesting directions for {} waypoints", waypoints.len());

        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .json::<DirectionsResponse>()
            .await?;

        if response.status != "OK" {
            return Err(ProviderError::Status(response.status));
        }

        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyRoute)?;

        let legs = route
            .legs
            .iter()
            .map(|leg| Leg {
                distance_km: leg.distance.value as f64 / 1000.0,
                duration_min: leg.duration.value as f64 / 60.0,
            })
            .collect();

        Ok(RouteLegs {
            legs,
            path: decode_polyline(&route.overview_polyline.points),
        })
    }
}

impl DirectionsProvider for GoogleDirections {
    fn route_legs<'a>(
        &'a self,
        waypoints: &'a [Coordinate],
    ) -> BoxFuture<'a, Result<RouteLegs, ProviderError>> {
        Box::pin(self.fetch(waypoints))
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    legs: Vec<ApiLeg>,
    overview_polyline: ApiPolyline,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    distance: ApiValue,
    duration: ApiValue,
}

#[derive(Debug, Deserialize)]
struct ApiValue {
    value: i64, // meters for distance, seconds for duration
}

#[derive(Debug, Deserialize)]
struct ApiPolyline {
    points: String,
}

/// Decode an encoded polyline string into coordinates.
pub fn decode_polyline(encoded: &str) -> Vec<Coordinate> {
    let bytes = encoded.as_bytes();
    let mut coords = Vec::new();
    let mut index = 0usize;
    let mut lat = 0i64;
    let mut lng = 0i64;

    while index < bytes.len() {
        lat += decode_varint(bytes, &mut index);
        if index >= bytes.len() {
            break;
        }
        lng += decode_varint(bytes, &mut index);
        coords.push(Coordinate::new(lat as f64 / 1e5, lng as f64 / 1e5));
    }

    coords
}

fn decode_varint(bytes: &[u8], index: &mut usize) -> i64 {
    let mut result = 0i64;
    let mut shift = 0u32;

    while *index < bytes.len() {
        let chunk = (bytes[*index] as i64) - 63;
        *index += 1;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    }
}
