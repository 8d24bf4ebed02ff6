//! Initial population: a greedy fraction seeded by cheapest insertion, the
//! remainder random-feasible.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::solver::genetic::chromosome::{Chromosome, Gene};
use crate::solver::genetic::cost::SolverContext;
use crate::solver::genetic::operators::best_insertion;
use crate::solver::genetic::SolverParams;

pub fn initial_population(
    ctx: &SolverContext,
    params: &SolverParams,
    rng: &mut ChaCha8Rng,
) -> Vec<Chromosome> {
    let greedy_target =
        ((params.population_size as f64) * params.greedy_fraction).round() as usize;

    (0..params.population_size)
        .map(|i| {
            let genes = if i < greedy_target {
                greedy_genes(ctx, rng)
            } else {
                random_genes(ctx, rng)
            };
            Chromosome { genes, cost: 0.0 }
        })
        .collect()
}

/// Visit passengers in random order; each goes to the vehicle where its
/// cheapest-insertion detour is smallest among vehicles with a free seat.
fn greedy_genes(ctx: &SolverContext, rng: &mut ChaCha8Rng) -> Vec<Gene> {
    let mut orders: Vec<Vec<usize>> = vec![Vec::new(); ctx.vehicle_count];
    let mut visit_order: Vec<usize> = (0..ctx.passenger_count).collect();
    visit_order.shuffle(rng);

    for p in visit_order {
        let mut best: Option<(f64, usize, usize)> = None;
        for v in 0..ctx.vehicle_count {
            if orders[v].len() >= ctx.capacities[v] {
                continue;
            }
            let (pos, added) = best_insertion(&orders[v], v, p, ctx);
            if best.map_or(true, |(b, _, _)| added < b) {
                best = Some((added, v, pos));
            }
        }
        if let Some((_, v, pos)) = best {
            orders[v].insert(pos, p);
        }
    }

    genes_from_orders(&orders, ctx.passenger_count)
}

/// Assign each passenger to a uniformly random vehicle that still has a
/// free seat; passengers that find none stay unassigned.
fn random_genes(ctx: &SolverContext, rng: &mut ChaCha8Rng) -> Vec<Gene> {
    let mut genes = vec![Gene::unassigned(); ctx.passenger_count];
    let mut loads = vec![0usize; ctx.vehicle_count];

    for gene in genes.iter_mut() {
        let open: Vec<usize> = (0..ctx.vehicle_count)
            .filter(|&v| loads[v] < ctx.capacities[v])
            .collect();
        if let Some(&v) = open.choose(rng) {
            loads[v] += 1;
            *gene = Gene {
                vehicle: v,
                order_key: rng.gen::<f64>() * ctx.passenger_count.max(1) as f64,
            };
        }
    }

    genes
}

fn genes_from_orders(orders: &[Vec<usize>], passenger_count: usize) -> Vec<Gene> {
    let mut genes = vec![Gene::unassigned(); passenger_count];
    for (v, order) in orders.iter().enumerate() {
        for (pos, &p) in order.iter().enumerate() {
            genes[p] = Gene {
                vehicle: v,
                order_key: pos as f64,
            };
        }
    }
    genes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Coordinate, Destination, Passenger, Vehicle};
    use crate::solver::genetic::chromosome::vehicle_orders;
    use chrono::NaiveTime;
    use rand::SeedableRng;

    fn context() -> SolverContext {
        let vehicles = vec![
            Vehicle::new(1, 2, Coordinate::new(32.10, 34.80)),
            Vehicle::new(2, 2, Coordinate::new(32.05, 34.78)),
        ];
        let passengers: Vec<Passenger> = (0..3)
            .map(|i| Passenger {
                id: i as i64,
                name: format!("p{}", i),
                location: Coordinate::new(32.06 + 0.01 * i as f64, 34.80),
                available_tomorrow: true,
                estimated_pickup_time: None,
            })
            .collect();
        let destination = Destination {
            name: "office".into(),
            location: Coordinate::new(32.0741, 34.7922),
            target_arrival_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        };
        SolverContext::new(&vehicles, &passengers, &destination)
    }

    #[test]
    fn every_initial_individual_is_feasible() {
        let ctx = context();
        let params = SolverParams {
            population_size: 40,
            ..SolverParams::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for individual in initial_population(&ctx, &params, &mut rng) {
            let orders = vehicle_orders(&individual.genes, ctx.vehicle_count);
            for (v, order) in orders.iter().enumerate() {
                assert!(order.len() <= ctx.capacities[v]);
            }
        }
    }

    #[test]
    fn greedy_assigns_everyone_when_seats_suffice() {
        let ctx = context();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let genes = greedy_genes(&ctx, &mut rng);
        assert!(genes.iter().all(|g| g.is_assigned()));
    }
}
