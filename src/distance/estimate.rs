//! Distance estimates used inside the solver.
//!
//! The genetic search evaluates hundreds of thousands of candidate routes,
//! so it never calls the directions provider. It works off a precomputed
//! matrix of calibrated great-circle distances; accurate timing is attached
//! later by the routing engine.

use crate::config::constant::{AVERAGE_SPEED_KMH, DISTANCE_CALIBRATION};
use crate::distance::geo::haversine_km;
use crate::domain::types::{Coordinate, Destination, Passenger, Vehicle};

/// Pairwise estimated road distances (km) over all problem points, laid out
/// as `[vehicle starts.., passenger locations.., destination]`.
#[derive(Debug, Clone)]
pub struct EstimateMatrix {
    dm: Vec<Vec<f64>>,
    vehicle_count: usize,
}

impl EstimateMatrix {
    pub fn build(vehicles: &[Vehicle], passengers: &[Passenger], destination: &Destination) -> Self {
        let mut points: Vec<Coordinate> =
            Vec::with_capacity(vehicles.len() + passengers.len() + 1);
        points.extend(vehicles.iter().map(|v| v.start));
        points.extend(passengers.iter().map(|p| p.location));
        points.push(destination.location);

        let n = points.len();
        let mut dm = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    dm[i][j] = haversine_km(points[i], points[j]) * DISTANCE_CALIBRATION;
                }
            }
        }

        Self {
            dm,
            vehicle_count: vehicles.len(),
        }
    }

    pub fn vehicle_start(&self, vehicle: usize) -> usize {
        vehicle
    }

    pub fn passenger(&self, passenger: usize) -> usize {
        self.vehicle_count + passenger
    }

    pub fn destination(&self) -> usize {
        self.dm.len() - 1
    }

    pub fn km(&self, from: usize, to: usize) -> f64 {
        self.dm[from][to]
    }

    /// Estimated travel time in minutes for an estimated distance.
    pub fn minutes(&self, km: f64) -> f64 {
        km / AVERAGE_SPEED_KMH * 60.0
    }
}
