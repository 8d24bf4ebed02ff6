//! Cost function and candidate comparison.

use std::cmp::Ordering;

use crate::config::constant::{
    DISTANCE_WEIGHT, TIME_WEIGHT, UNASSIGNED_PENALTY, VEHICLE_WEIGHT,
};
use crate::distance::estimate::EstimateMatrix;
use crate::domain::types::{Destination, Passenger, Vehicle};
use crate::solver::genetic::chromosome::{unassigned_count, vehicle_orders, Gene};

/// Everything the GA needs per evaluation, precomputed once per run.
#[derive(Debug)]
pub struct SolverContext {
    pub matrix: EstimateMatrix,
    pub capacities: Vec<usize>,
    pub vehicle_count: usize,
    pub passenger_count: usize,
}

impl SolverContext {
    pub fn new(vehicles: &[Vehicle], passengers: &[Passenger], destination: &Destination) -> Self {
        Self {
            matrix: EstimateMatrix::build(vehicles, passengers, destination),
            capacities: vehicles.iter().map(|v| v.capacity).collect(),
            vehicle_count: vehicles.len(),
            passenger_count: passengers.len(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouteSummary {
    pub cost: f64,
    pub vehicles_used: usize,
    pub total_time: f64,
    pub total_distance: f64,
}

/// Weighted cost (minimized): total distance + total time + vehicles used
/// + a large penalty per unassigned passenger.
pub fn evaluate(genes: &[Gene], ctx: &SolverContext) -> RouteSummary {
    let orders = vehicle_orders(genes, ctx.vehicle_count);

    let mut total_km = 0.0;
    let mut vehicles_used = 0;
    for (v, order) in orders.iter().enumerate() {
        if order.is_empty() {
            continue;
        }
        vehicles_used += 1;

        let mut at = ctx.matrix.vehicle_start(v);
        let mut km = 0.0;
        for &p in order {
            let next = ctx.matrix.passenger(p);
            km += ctx.matrix.km(at, next);
            at = next;
        }
        km += ctx.matrix.km(at, ctx.matrix.destination());
        total_km += km;
    }

    let total_time = ctx.matrix.minutes(total_km);
    let unassigned = unassigned_count(genes);

    let cost = DISTANCE_WEIGHT * total_km
        + TIME_WEIGHT * total_time
        + VEHICLE_WEIGHT * vehicles_used as f64
        + UNASSIGNED_PENALTY * unassigned as f64;

    RouteSummary {
        cost,
        vehicles_used,
        total_time,
        total_distance: total_km,
    }
}

pub fn cost(genes: &[Gene], ctx: &SolverContext) -> f64 {
    evaluate(genes, ctx).cost
}

/// Selection fitness (maximized).
pub fn fitness(cost: f64) -> f64 {
    1.0 / (1.0 + cost)
}

/// Full candidate ordering with tie-breaks: lower cost, then fewer vehicles
/// used, then lower total time, then lower total distance, then the
/// lexicographically smaller assignment vector for determinism.
pub fn compare_candidates(
    a_genes: &[Gene],
    a: &RouteSummary,
    b_genes: &[Gene],
    b: &RouteSummary,
) -> Ordering {
    a.cost
        .total_cmp(&b.cost)
        .then(a.vehicles_used.cmp(&b.vehicles_used))
        .then(a.total_time.total_cmp(&b.total_time))
        .then(a.total_distance.total_cmp(&b.total_distance))
        .then_with(|| {
            for (ga, gb) in a_genes.iter().zip(b_genes) {
                match ga.vehicle.cmp(&gb.vehicle) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            Ordering::Equal
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Coordinate;
    use crate::solver::genetic::chromosome::UNASSIGNED;
    use chrono::NaiveTime;

    fn small_context() -> SolverContext {
        let vehicles = vec![
            Vehicle::new(1, 2, Coordinate::new(32.10, 34.80)),
            Vehicle::new(2, 2, Coordinate::new(32.05, 34.78)),
        ];
        let passengers = vec![
            Passenger {
                id: 10,
                name: "a".into(),
                location: Coordinate::new(32.09, 34.81),
                available_tomorrow: true,
                estimated_pickup_time: None,
            },
            Passenger {
                id: 11,
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
        SolverContext::new(&vehicles, &passengers, &destination)
    }

    #[test]
    fn unassigned_passengers_dominate_the_cost() {
        let ctx = small_context();
        let all_unassigned = vec![Gene::unassigned(); 2];
        let assigned = vec![
            Gene { vehicle: 0, order_key: 0.0 },
            Gene { vehicle: 0, order_key: 1.0 },
        ];
        assert!(cost(&all_unassigned, &ctx) > cost(&assigned, &ctx));
    }

    #[test]
    fn packing_into_one_vehicle_beats_two_for_nearby_passengers() {
        let ctx = small_context();
        let packed = vec![
            Gene { vehicle: 0, order_key: 0.0 },
            Gene { vehicle: 0, order_key: 1.0 },
        ];
        let split = vec![
            Gene { vehicle: 0, order_key: 0.0 },
            Gene { vehicle: 1, order_key: 0.0 },
        ];
        assert!(cost(&packed, &ctx) < cost(&split, &ctx));
    }

    #[test]
    fn fitness_is_monotone_decreasing_in_cost() {
        assert!(fitness(0.0) > fitness(1.0));
        assert!(fitness(1.0) > fitness(100.0));
    }

    #[test]
    fn equal_cost_prefers_lexicographic_assignment() {
        let ctx = small_context();
        let a = vec![
            Gene { vehicle: 0, order_key: 0.0 },
            Gene { vehicle: UNASSIGNED, order_key: 0.0 },
        ];
        let s = evaluate(&a, &ctx);
        assert_eq!(compare_candidates(&a, &s, &a, &s), Ordering::Equal);
    }
}
