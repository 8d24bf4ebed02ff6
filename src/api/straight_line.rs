//! Straight-line route estimation.
//!
//! Less accurate than a directions API (ignores roads) but always
//! available. Doubles as the routing engine's fallback on provider failure
//! and as the active provider when no API key is configured.

use futures::future::BoxFuture;

use crate::api::provider::{DirectionsProvider, Leg, ProviderError, RouteLegs};
use crate::config::constant::AVERAGE_SPEED_KMH;
use crate::distance::geo::{haversine_km, km_to_minutes};
use crate::domain::types::Coordinate;

/// Build legs between consecutive waypoints from great-circle distances at a
/// constant average speed. The path is the waypoint list itself.
pub fn estimate_route(waypoints: &[Coordinate], speed_kmh: f64) -> RouteLegs {
    let legs = waypoints
        .windows(2)
        .map(|pair| {
            let km = haversine_km(pair[0], pair[1]);
            Leg {
                distance_km: km,
                duration_min: km_to_minutes(km, speed_kmh),
            }
        })
        .collect();

    RouteLegs {
        legs,
        path: waypoints.to_vec(),
    }
}

#[derive(Debug, Clone)]
pub struct StraightLineDirections {
    speed_kmh: f64,
}

impl StraightLineDirections {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }
}

impl Default for StraightLineDirections {
    fn default() -> Self {
        Self::new(AVERAGE_SPEED_KMH)
    }
}

impl DirectionsProvider for StraightLineDirections {
    fn route_legs<'a>(
        &'a self,
        waypoints: &'a [Coordinate],
    ) -> BoxFuture<'a, Result<RouteLegs, ProviderError>> {
        Box::pin(async move { Ok(estimate_route(waypoints, self.speed_kmh)) })
    }
}
