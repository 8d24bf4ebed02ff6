//! Console summary of a generated plan.

use colored::Colorize;

use crate::domain::solution::Solution;
use crate::domain::types::{format_hhmm, Destination};

fn hhmm_or_dashes(time: Option<chrono::NaiveTime>) -> String {
    time.map(format_hhmm).unwrap_or_else(|| "--:--".to_string())
}

pub fn print_plan(solution: &Solution, destination: &Destination) {
    println!(
        "Route plan to {} (arrive {})",
        destination.name,
        format_hhmm(destination.target_arrival_time)
    );

    for vehicle in solution.used_vehicles() {
        let line = format!(
            "vehicle {:>3} | {}/{} seats | {:>6.1} km | {:>4.0} min | departs {}",
            vehicle.id,
            vehicle.assigned_passengers.len(),
            vehicle.capacity,
            vehicle.total_distance,
            vehicle.total_time,
            hhmm_or_dashes(vehicle.departure_time),
        );
        if vehicle.assigned_passengers.len() > vehicle.capacity {
            println!("{}", line.red());
        } else {
            println!("{}", line.green());
        }

        for passenger in &vehicle.assigned_passengers {
            println!(
                "    {} at {}",
                passenger.name,
                hhmm_or_dashes(passenger.estimated_pickup_time)
            );
        }
    }

    println!(
        "{} passengers across {} vehicles",
        solution.assigned_count(),
        solution.vehicles_used()
    );
}
