//! In-process cache for directions lookups.
//!
//! Keyed by the canonical waypoint string; coordinates are exact, so entries
//! never expire. Concurrent identical requests may duplicate the inner call
//! but cannot corrupt the cache (last write wins with equal values).

use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::BoxFuture;
use tracing::debug;

use crate::api::provider::{canonical_key, DirectionsProvider, ProviderError, RouteLegs};
use crate::domain::types::Coordinate;

pub struct CachedDirections<P> {
    inner: P,
    cache: Mutex<HashMap<String, RouteLegs>>,
}

impl<P> CachedDirections<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl<P: DirectionsProvider> DirectionsProvider for CachedDirections<P> {
    fn route_legs<'a>(
        &'a self,
        waypoints: &'a [Coordinate],
    ) -> BoxFuture<'a, Result<RouteLegs, ProviderError>> {
        Box::pin(async move {
            let key = canonical_key(waypoints);

            if let Some(hit) = self
                .cache
                .lock()
                .expect("directions cache poisoned")
                .get(&key)
                .cloned()
            {
                debug!("directions cache hit ({} waypoints)", waypoints.len());
                return Ok(hit);
            }

            let route = self.inner.route_legs(waypoints).await?;

            self.cache
                .lock()
                .expect("directions cache poisoned")
                .insert(key, route.clone());

            Ok(route)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::provider::Leg;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl DirectionsProvider for CountingProvider {
        fn route_legs<'a>(
            &'a self,
            waypoints: &'a [Coordinate],
        ) -> BoxFuture<'a, Result<RouteLegs, ProviderError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(RouteLegs {
                    legs: vec![
                        Leg {
                            distance_km: 1.0,
                            duration_min: 2.0
                        };
                        waypoints.len() - 1
                    ],
                    path: waypoints.to_vec(),
                })
            })
        }
    }

    #[tokio::test]
    async fn identical_waypoint_lists_call_the_inner_provider_once() {
        let cached = CachedDirections::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let wps = [
            Coordinate::new(32.10, 34.80),
            Coordinate::new(32.09, 34.81),
            Coordinate::new(32.07, 34.79),
        ];

        let first = cached.route_legs(&wps).await.unwrap();
        let second = cached.route_legs(&wps).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_waypoint_lists_are_distinct_entries() {
        let cached = CachedDirections::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let a = [Coordinate::new(32.10, 34.80), Coordinate::new(32.07, 34.79)];
        let b = [Coordinate::new(32.05, 34.78), Coordinate::new(32.07, 34.79)];

        cached.route_legs(&a).await.unwrap();
        cached.route_legs(&b).await.unwrap();

        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }
}
