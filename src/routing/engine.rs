//! The routing engine.
//!
//! Takes a solver output, asks the directions provider for per-leg
//! distances and durations (straight-line fallback on any failure), then
//! back-propagates the target arrival time into a concrete departure time
//! and per-passenger pickup times.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use crate::api::provider::DirectionsProvider;
use crate::api::straight_line::estimate_route;
use crate::config::constant::AVERAGE_SPEED_KMH;
use crate::domain::solution::Solution;
use crate::domain::types::{Coordinate, Destination, RouteDetails, RouteStop, DESTINATION_STOP};

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Compute per-vehicle route details and fill the solution's output slots
/// (totals, path, departure time, pickup times). Vehicles without
/// passengers are left untouched.
pub async fn attach_route_details(
    solution: &mut Solution,
    destination: &Destination,
    target_arrival: NaiveDateTime,
    provider: &dyn DirectionsProvider,
) -> HashMap<i64, RouteDetails> {
    let mut details = HashMap::new();

    for vehicle in &mut solution.vehicles {
        if vehicle.assigned_passengers.is_empty() {
            continue;
        }

        let mut waypoints: Vec<Coordinate> =
            Vec::with_capacity(vehicle.assigned_passengers.len() + 2);
        waypoints.push(vehicle.start);
        waypoints.extend(vehicle.assigned_passengers.iter().map(|p| p.location));
        waypoints.push(destination.location);

        let route = match provider.route_legs(&waypoints).await {
            Ok(route) => route,
            Err(err) => {
                warn!(
                    "vehicle {}: directions lookup failed ({}), falling back to straight-line",
                    vehicle.id, err
                );
                estimate_route(&waypoints, AVERAGE_SPEED_KMH)
            }
        };

        // Legs run start->p1, p1->p2, ..., pn->destination, so stop i is
        // passenger i, and the last stop is the destination sentinel.
        let mut stops = Vec::with_capacity(route.legs.len());
        let mut cumulative_km = 0.0;
        let mut cumulative_min = 0.0;
        for (i, leg) in route.legs.iter().enumerate() {
            cumulative_km += leg.distance_km;
            cumulative_min += leg.duration_min;
            stops.push(RouteStop {
                passenger_id: vehicle
                    .assigned_passengers
                    .get(i)
                    .map(|p| p.id)
                    .unwrap_or(DESTINATION_STOP),
                location: waypoints.get(i + 1).copied().unwrap_or(destination.location),
                distance_from_previous: leg.distance_km,
                time_from_previous: leg.duration_min,
                cumulative_distance: cumulative_km,
                cumulative_time: cumulative_min,
            });
        }

        let total_distance = cumulative_km;
        let total_time = cumulative_min;

        // Back-propagation: departure = target arrival minus total travel
        // time, pickups at the cumulative offsets, all at minute precision.
        let mut departure_time = None;
        if total_time >= MINUTES_PER_DAY {
            warn!(
                "vehicle {}: total travel time {:.0} min exceeds a day, schedule left unset",
                vehicle.id, total_time
            );
            for p in &mut vehicle.assigned_passengers {
                p.estimated_pickup_time = None;
            }
        } else {
            let departure = target_arrival - Duration::minutes(total_time.round() as i64);
            departure_time = Some(departure.time());
            for (i, p) in vehicle.assigned_passengers.iter_mut().enumerate() {
                let pickup = departure + Duration::minutes(stops[i].cumulative_time.round() as i64);
                p.estimated_pickup_time = Some(pickup.time());
            }
        }

        debug!(
            "vehicle {}: {:.1} km, {:.0} min over {} stops",
            vehicle.id,
            total_distance,
            total_time,
            stops.len()
        );

        vehicle.total_distance = total_distance;
        vehicle.total_time = total_time;
        vehicle.departure_time = departure_time;
        vehicle.route_path = route.path.clone();

        details.insert(
            vehicle.id,
            RouteDetails {
                vehicle_id: vehicle.id,
                total_distance,
                total_time,
                departure_time,
                stops,
                path: route.path,
            },
        );
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::provider::{Leg, ProviderError, RouteLegs};
    use crate::domain::types::{Passenger, Vehicle};
    use chrono::{NaiveDate, NaiveTime};
    use futures::future::BoxFuture;

    struct FixedLegs {
        km_per_leg: f64,
        min_per_leg: f64,
    }

    impl DirectionsProvider for FixedLegs {
        fn route_legs<'a>(
            &'a self,
            waypoints: &'a [Coordinate],
        ) -> BoxFuture<'a, Result<RouteLegs, ProviderError>> {
            Box::pin(async move {
                Ok(RouteLegs {
                    legs: vec![
                        Leg {
                            distance_km: self.km_per_leg,
                            duration_min: self.min_per_leg,
                        };
                        waypoints.len() - 1
                    ],
                    path: waypoints.to_vec(),
                })
            })
        }
    }

    struct AlwaysFails;

    impl DirectionsProvider for AlwaysFails {
        fn route_legs<'a>(
            &'a self,
            _waypoints: &'a [Coordinate],
        ) -> BoxFuture<'a, Result<RouteLegs, ProviderError>> {
            Box::pin(async move { Err(ProviderError::Status("OVER_QUERY_LIMIT".into())) })
        }
    }

    fn solution_with_two_passengers() -> (Solution, Destination) {
        let mut vehicle = Vehicle::new(1, 4, Coordinate::new(32.10, 34.80));
        vehicle.assigned_passengers = vec![
            Passenger {
                id: 11,
                name: "a".into(),
                location: Coordinate::new(32.09, 34.81),
                available_tomorrow: true,
                estimated_pickup_time: None,
            },
            Passenger {
                id: 12,
                name: "b".into(),
                location: Coordinate::new(32.08, 34.80),
                available_tomorrow: true,
                estimated_pickup_time: None,
            },
        ];
        let destination = Destination {
            name: "office".into(),
            location: Coordinate::new(32.0741, 34.7922),
            target_arrival_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        };
        (Solution::new(vec![vehicle]), destination)
    }

    fn target(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 2)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    #[tokio::test]
    async fn totals_are_the_sum_of_legs() {
        let (mut solution, destination) = solution_with_two_passengers();
        let provider = FixedLegs {
            km_per_leg: 5.0,
            min_per_leg: 10.0,
        };

        let details =
            attach_route_details(&mut solution, &destination, target(8, 0), &provider).await;

        let d = &details[&1];
        assert!((d.total_distance - 15.0).abs() < 1e-6);
        assert!((d.total_time - 30.0).abs() < 1e-6);
        let leg_sum: f64 = d.stops.iter().map(|s| s.time_from_previous).sum();
        assert!((d.total_time - leg_sum).abs() < 1e-6);
    }

    #[tokio::test]
    async fn departure_plus_total_time_hits_the_target() {
        let (mut solution, destination) = solution_with_two_passengers();
        let provider = FixedLegs {
            km_per_leg: 5.0,
            min_per_leg: 10.0,
        };

        attach_route_details(&mut solution, &destination, target(8, 0), &provider).await;

        let vehicle = &solution.vehicles[0];
        assert_eq!(
            vehicle.departure_time,
            NaiveTime::from_hms_opt(7, 30, 0)
        );
        // pickups follow the cumulative offsets and stay monotone
        assert_eq!(
            vehicle.assigned_passengers[0].estimated_pickup_time,
            NaiveTime::from_hms_opt(7, 40, 0)
        );
        assert_eq!(
            vehicle.assigned_passengers[1].estimated_pickup_time,
            NaiveTime::from_hms_opt(7, 50, 0)
        );
    }

    #[tokio::test]
    async fn pickups_are_monotone_and_before_target() {
        let (mut solution, destination) = solution_with_two_passengers();
        let provider = FixedLegs {
            km_per_leg: 2.0,
            min_per_leg: 7.0,
        };
        let target_dt = target(8, 0);

        attach_route_details(&mut solution, &destination, target_dt, &provider).await;

        let vehicle = &solution.vehicles[0];
        let mut previous = vehicle.departure_time.unwrap();
        for p in &vehicle.assigned_passengers {
            let pickup = p.estimated_pickup_time.unwrap();
            assert!(pickup >= previous);
            assert!(pickup <= target_dt.time());
            previous = pickup;
        }
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_straight_line() {
        let (mut solution, destination) = solution_with_two_passengers();

        let details =
            attach_route_details(&mut solution, &destination, target(8, 0), &AlwaysFails).await;

        let d = &details[&1];
        assert!(d.total_distance > 0.0);
        assert!(d.total_time > 0.0);
        // fallback path is the waypoint list itself: start, 2 pickups, destination
        assert_eq!(d.path.len(), 4);
        assert!(solution.vehicles[0].departure_time.is_some());
    }

    #[tokio::test]
    async fn day_long_routes_leave_the_schedule_unset() {
        let (mut solution, destination) = solution_with_two_passengers();
        let provider = FixedLegs {
            km_per_leg: 400.0,
            min_per_leg: 600.0,
        };

        let details =
            attach_route_details(&mut solution, &destination, target(8, 0), &provider).await;

        assert!(details[&1].departure_time.is_none());
        assert!(solution.vehicles[0]
            .assigned_passengers
            .iter()
            .all(|p| p.estimated_pickup_time.is_none()));
    }

    #[tokio::test]
    async fn last_stop_is_the_destination_sentinel() {
        let (mut solution, destination) = solution_with_two_passengers();
        let provider = FixedLegs {
            km_per_leg: 1.0,
            min_per_leg: 2.0,
        };

        let details =
            attach_route_details(&mut solution, &destination, target(8, 0), &provider).await;

        let stops = &details[&1].stops;
        assert_eq!(stops.len(), 3);
        assert_eq!(stops[0].passenger_id, 11);
        assert_eq!(stops[1].passenger_id, 12);
        assert_eq!(stops[2].passenger_id, DESTINATION_STOP);
    }

    #[tokio::test]
    async fn empty_vehicles_are_skipped() {
        let (mut solution, destination) = solution_with_two_passengers();
        solution.vehicles.push(Vehicle::new(2, 4, Coordinate::new(32.0, 34.7)));
        let provider = FixedLegs {
            km_per_leg: 1.0,
            min_per_leg: 2.0,
        };

        let details =
            attach_route_details(&mut solution, &destination, target(8, 0), &provider).await;

        assert!(details.contains_key(&1));
        assert!(!details.contains_key(&2));
    }
}
