//! One scheduling run: load the roster for tomorrow, solve, attach timing,
//! persist the route set.
//!
//! The pipeline never panics and never propagates errors to the tick
//! source; every exit path is a `RunOutcome` the caller appends to the run
//! log.

use chrono::{Duration, NaiveDateTime};
use tracing::info;

use crate::api::provider::DirectionsProvider;
use crate::database::Store;
use crate::domain::types::RunOutcome;
use crate::routing::engine::attach_route_details;
use crate::scheduler::report;
use crate::solver::{solve, SolverParams};

pub async fn run_pipeline(
    store: &Store,
    provider: &dyn DirectionsProvider,
    now: NaiveDateTime,
    params: &SolverParams,
) -> RunOutcome {
    let destination = match store.destination().await {
        Ok(Some(destination)) => destination,
        Ok(None) => return RunOutcome::failed("no destination configured"),
        Err(err) => return RunOutcome::error(format!("failed to load destination: {}", err)),
    };

    let vehicles = match store.available_vehicles().await {
        Ok(vehicles) => vehicles,
        Err(err) => return RunOutcome::error(format!("failed to load vehicles: {}", err)),
    };
    let passengers = match store.available_passengers().await {
        Ok(passengers) => passengers,
        Err(err) => return RunOutcome::error(format!("failed to load passengers: {}", err)),
    };

    if vehicles.is_empty() || passengers.is_empty() {
        info!(
            "nothing to schedule ({} vehicles, {} passengers available tomorrow)",
            vehicles.len(),
            passengers.len()
        );
        return RunOutcome::skipped(format!(
            "nothing to schedule: {} vehicles, {} passengers available tomorrow",
            vehicles.len(),
            passengers.len()
        ));
    }

    info!(
        "scheduling {} passengers across {} vehicles",
        passengers.len(),
        vehicles.len()
    );

    let mut solution = match solve(&passengers, &vehicles, &destination, params) {
        Ok(solution) => solution,
        Err(err) => return RunOutcome::failed(format!("solver rejected input: {}", err)),
    };

    let solution_date = now.date() + Duration::days(1);
    let target_arrival = solution_date.and_time(destination.target_arrival_time);

    let details =
        attach_route_details(&mut solution, &destination, target_arrival, provider).await;

    match store
        .save_solution(&solution, &details, solution_date, now)
        .await
    {
        Ok(route_id) => {
            report::print_plan(&solution, &destination);
            RunOutcome::success(
                solution.vehicles_used(),
                solution.assigned_count(),
                format!("route set {} for {}", route_id, solution_date),
            )
        }
        Err(err) => RunOutcome::error(format!("failed to persist route set: {}", err)),
    }
}
