//! The genetic search loop.
//!
//! Two flat population buffers are swapped each generation; evaluation is
//! pure and runs in parallel. The whole search is deterministic under a
//! fixed seed.

use std::cmp::Ordering;
use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::solution::Solution;
use crate::domain::types::{Destination, Passenger, Vehicle};
use crate::solver::genetic::chromosome::{vehicle_orders, Chromosome};
use crate::solver::genetic::cost::{compare_candidates, cost, evaluate, RouteSummary, SolverContext};
use crate::solver::genetic::operators::{mutate, repair, tournament, uniform_crossover};
use crate::solver::genetic::population::initial_population;
use crate::solver::genetic::{SolverParams, ValidationError};

/// Partition passengers among vehicles and order each vehicle's pickups,
/// minimizing the weighted cost under the capacity constraint.
pub fn solve(
    passengers: &[Passenger],
    vehicles: &[Vehicle],
    destination: &Destination,
    params: &SolverParams,
) -> Result<Solution, ValidationError> {
    validate(passengers, vehicles)?;

    // Trivial rosters skip the GA loop: no vehicles means everyone stays
    // unassigned, no passengers means nothing to order.
    if vehicles.is_empty() || passengers.is_empty() {
        return Ok(Solution::new(vehicles.iter().map(blank_output).collect()));
    }

    let ctx = SolverContext::new(vehicles, passengers, destination);
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    let mut population = initial_population(&ctx, params, &mut rng);
    evaluate_all(&mut population, &ctx);

    let (mut best, mut best_summary) = best_of(&population, &ctx);
    info!(
        "generation 0: best cost {:.2} ({} assigned, {} vehicles)",
        best_summary.cost,
        passengers.len() - crate::solver::genetic::chromosome::unassigned_count(&best.genes),
        best_summary.vehicles_used
    );

    let mut next: Vec<Chromosome> = Vec::with_capacity(population.len());
    let mut stagnation = 0usize;

    for generation in 1..=params.generations {
        next.clear();

        // Elitism: the best individuals survive unchanged.
        let mut by_cost: Vec<usize> = (0..population.len()).collect();
        by_cost.sort_by(|&a, &b| population[a].cost.total_cmp(&population[b].cost));
        for &i in by_cost.iter().take(params.elite_count.min(population.len())) {
            next.push(population[i].clone());
        }

        while next.len() < population.len() {
            let parent_a = tournament(&population, params.tournament_size, &mut rng);
            let parent_b = tournament(&population, params.tournament_size, &mut rng);

            let mut genes = uniform_crossover(&parent_a.genes, &parent_b.genes, &mut rng);
            repair(&mut genes, &ctx);

            if rng.gen::<f64>() < params.mutation_rate {
                mutate(&mut genes, &ctx, &mut rng);
                repair(&mut genes, &ctx);
            }

            next.push(Chromosome { genes, cost: 0.0 });
        }

        std::mem::swap(&mut population, &mut next);
        evaluate_all(&mut population, &ctx);

        let (gen_best, gen_summary) = best_of(&population, &ctx);
        if compare_candidates(&gen_best.genes, &gen_summary, &best.genes, &best_summary)
            == Ordering::Less
        {
            debug!(
                "generation {}: new best cost {:.2}",
                generation, gen_summary.cost
            );
            best = gen_best;
            best_summary = gen_summary;
            stagnation = 0;
        } else {
            stagnation += 1;
            if stagnation >= params.stagnation_limit {
                info!(
                    "no improvement for {} generations, stopping at generation {}",
                    stagnation, generation
                );
                break;
            }
        }
    }

    info!(
        "search finished: cost {:.2}, {:.1} km, {:.0} min, {} vehicles",
        best_summary.cost,
        best_summary.total_distance,
        best_summary.total_time,
        best_summary.vehicles_used
    );

    Ok(decode_solution(&best, vehicles, passengers, &ctx))
}

fn validate(passengers: &[Passenger], vehicles: &[Vehicle]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for p in passengers {
        if !seen.insert(p.id) {
            return Err(ValidationError::DuplicatePassengerId(p.id));
        }
    }
    for v in vehicles {
        if v.capacity == 0 {
            return Err(ValidationError::ZeroCapacity { vehicle_id: v.id });
        }
    }
    Ok(())
}

fn blank_output(vehicle: &Vehicle) -> Vehicle {
    let mut vehicle = vehicle.clone();
    vehicle.assigned_passengers.clear();
    vehicle.route_path.clear();
    vehicle.departure_time = None;
    vehicle.total_distance = 0.0;
    vehicle.total_time = 0.0;
    vehicle
}

fn evaluate_all(population: &mut [Chromosome], ctx: &SolverContext) {
    population
        .par_iter_mut()
        .for_each(|individual| individual.cost = cost(&individual.genes, ctx));
}

fn best_of(population: &[Chromosome], ctx: &SolverContext) -> (Chromosome, RouteSummary) {
    let mut best_index = 0;
    let mut best_summary = evaluate(&population[0].genes, ctx);

    for (i, individual) in population.iter().enumerate().skip(1) {
        let summary = evaluate(&individual.genes, ctx);
        if compare_candidates(
            &individual.genes,
            &summary,
            &population[best_index].genes,
            &best_summary,
        ) == Ordering::Less
        {
            best_index = i;
            best_summary = summary;
        }
    }

    (population[best_index].clone(), best_summary)
}

fn decode_solution(
    best: &Chromosome,
    vehicles: &[Vehicle],
    passengers: &[Passenger],
    ctx: &SolverContext,
) -> Solution {
    let orders = vehicle_orders(&best.genes, ctx.vehicle_count);

    let decoded = vehicles
        .iter()
        .enumerate()
        .map(|(v, vehicle)| {
            let mut vehicle = blank_output(vehicle);
            vehicle.assigned_passengers = orders[v]
                .iter()
                .map(|&p| passengers[p].clone())
                .collect();
            vehicle
        })
        .collect();

    Solution::new(decoded)
}
