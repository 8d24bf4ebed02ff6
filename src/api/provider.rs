use std::error::Error;
use std::fmt;

use futures::future::BoxFuture;
use itertools::Itertools;

use crate::domain::types::Coordinate;

/// One segment of a route between two consecutive waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub distance_km: f64,
    pub duration_min: f64,
}

/// Provider response: ordered legs plus the route geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLegs {
    pub legs: Vec<Leg>,
    pub path: Vec<Coordinate>,
}

/// Errors from a directions lookup. These are non-exceptional outcomes:
/// callers fall back to straight-line estimation instead of retrying.
#[derive(Debug)]
pub enum ProviderError {
    Http(reqwest::Error),
    Status(String),
    EmptyRoute,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(err)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Http(err) => write!(f, "directions request failed: {}", err),
            ProviderError::Status(status) => write!(f, "directions API returned '{}'", status),
            ProviderError::EmptyRoute => write!(f, "directions API returned no route"),
        }
    }
}

impl Error for ProviderError {}

/// Distances and durations along an ordered waypoint list. May fail or time
/// out; the routing engine handles that locally.
pub trait DirectionsProvider: Send + Sync {
    fn route_legs<'a>(
        &'a self,
        waypoints: &'a [Coordinate],
    ) -> BoxFuture<'a, Result<RouteLegs, ProviderError>>;
}

/// Canonical string for an ordered waypoint list ("lat,lng|lat,lng|...").
/// Used as the directions cache key.
pub fn canonical_key(waypoints: &[Coordinate]) -> String {
    waypoints.iter().map(|w| w.key()).join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_key_is_order_sensitive() {
        let a = Coordinate::new(32.10, 34.80);
        let b = Coordinate::new(32.05, 34.78);
        assert_ne!(canonical_key(&[a, b]), canonical_key(&[b, a]));
        assert_eq!(
            canonical_key(&[a, b]),
            "32.100000,34.800000|32.050000,34.780000"
        );
    }
}
