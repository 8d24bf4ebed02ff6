//! Shared fixtures for integration tests: mock directions providers and
//! roster seeding.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;

use ridematch::api::{DirectionsProvider, Leg, ProviderError, RouteLegs};
use ridematch::database::Store;
use ridematch::domain::types::Coordinate;

/// Every leg is 5 km / 10 minutes.
pub struct FixedLegs;

impl DirectionsProvider for FixedLegs {
    fn route_legs<'a>(
        &'a self,
        waypoints: &'a [Coordinate],
    ) -> BoxFuture<'a, Result<RouteLegs, ProviderError>> {
        Box::pin(async move {
            Ok(RouteLegs {
                legs: vec![
                    Leg {
                        distance_km: 5.0,
                        duration_min: 10.0,
                    };
                    waypoints.len() - 1
                ],
                path: waypoints.to_vec(),
            })
        })
    }
}

/// Simulated provider outage: every call fails.
pub struct OutageProvider;

impl DirectionsProvider for OutageProvider {
    fn route_legs<'a>(
        &'a self,
        _waypoints: &'a [Coordinate],
    ) -> BoxFuture<'a, Result<RouteLegs, ProviderError>> {
        Box::pin(async move { Err(ProviderError::Status("UNKNOWN_ERROR".into())) })
    }
}

/// Counts calls and answers slowly, to exercise the overlap guard.
pub struct SlowProvider {
    pub calls: AtomicUsize,
    pub delay: Duration,
}

impl SlowProvider {
    pub fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
        }
    }
}

impl DirectionsProvider for SlowProvider {
    fn route_legs<'a>(
        &'a self,
        waypoints: &'a [Coordinate],
    ) -> BoxFuture<'a, Result<RouteLegs, ProviderError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(RouteLegs {
                legs: vec![
                    Leg {
                        distance_km: 5.0,
                        duration_min: 10.0,
                    };
                    waypoints.len() - 1
                ],
                path: waypoints.to_vec(),
            })
        })
    }
}

/// The happy-path roster: destination in central Tel Aviv with 08:00 target,
/// two vehicles with two seats each, three passengers nearby.
pub async fn seed_scenario_a(store: &Store) -> (Vec<i64>, Vec<i64>) {
    use chrono::NaiveTime;

    store
        .set_destination(
            "Central Office",
            Coordinate::new(32.0741, 34.7922),
            "Tel Aviv",
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        )
        .await
        .unwrap();
    store.set_setting("SchedulingEnabled", "1").await.unwrap();
    store
        .set_setting("SchedulingTime", "21:00:00")
        .await
        .unwrap();

    let mut vehicle_ids = Vec::new();
    for (i, start) in [
        Coordinate::new(32.10, 34.80),
        Coordinate::new(32.05, 34.78),
    ]
    .into_iter()
    .enumerate()
    {
        let user_id = store
            .create_user(
                &format!("driver{}", i + 1),
                "hash",
                "Driver",
                &format!("Driver {}", i + 1),
            )
            .await
            .unwrap();
        vehicle_ids.push(
            store
                .create_vehicle(user_id, 2, start, "", true)
                .await
                .unwrap(),
        );
    }

    let mut passenger_ids = Vec::new();
    for (i, location) in [
        Coordinate::new(32.09, 34.81),
        Coordinate::new(32.08, 34.80),
        Coordinate::new(32.06, 34.79),
    ]
    .into_iter()
    .enumerate()
    {
        let user_id = store
            .create_user(
                &format!("rider{}", i + 1),
                "hash",
                "Passenger",
                &format!("Rider {}", i + 1),
            )
            .await
            .unwrap();
        passenger_ids.push(
            store
                .create_passenger(user_id, &format!("Rider {}", i + 1), location, "", true)
                .await
                .unwrap(),
        );
    }

    (vehicle_ids, passenger_ids)
}
