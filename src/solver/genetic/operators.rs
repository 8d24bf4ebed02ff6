//! Genetic operators: selection, crossover, repair, mutation.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::solver::genetic::chromosome::{vehicle_orders, Chromosome, Gene};
use crate::solver::genetic::cost::{fitness, SolverContext};

/// Tournament selection: sample k individuals, keep the fittest.
pub fn tournament<'a>(
    population: &'a [Chromosome],
    k: usize,
    rng: &mut ChaCha8Rng,
) -> &'a Chromosome {
    let mut best: Option<&Chromosome> = None;
    for _ in 0..k.max(1) {
        let pick = &population[rng.gen_range(0..population.len())];
        if best.map_or(true, |b| fitness(pick.cost) > fitness(b.cost)) {
            best = Some(pick);
        }
    }
    best.expect("tournament over empty population")
}

/// Uniform crossover on the assignment vector.
pub fn uniform_crossover(a: &[Gene], b: &[Gene], rng: &mut ChaCha8Rng) -> Vec<Gene> {
    a.iter()
        .zip(b)
        .map(|(ga, gb)| if rng.gen::<bool>() { *ga } else { *gb })
        .collect()
}

/// Cheapest insertion slot for passenger `p` into a vehicle's current order.
/// Returns (position, added km).
pub fn best_insertion(
    order: &[usize],
    vehicle: usize,
    p: usize,
    ctx: &SolverContext,
) -> (usize, f64) {
    let m = &ctx.matrix;
    let point = m.passenger(p);

    let mut best_pos = 0;
    let mut best_added = f64::INFINITY;
    for pos in 0..=order.len() {
        let prev = if pos == 0 {
            m.vehicle_start(vehicle)
        } else {
            m.passenger(order[pos - 1])
        };
        let next = if pos == order.len() {
            m.destination()
        } else {
            m.passenger(order[pos])
        };
        let added = m.km(prev, point) + m.km(point, next) - m.km(prev, next);
        if added < best_added {
            best_added = added;
            best_pos = pos;
        }
    }
    (best_pos, best_added)
}

/// Detour saved by removing the stop at `pos` from a vehicle's order.
fn removal_saving(order: &[usize], vehicle: usize, pos: usize, ctx: &SolverContext) -> f64 {
    let m = &ctx.matrix;
    let point = m.passenger(order[pos]);
    let prev = if pos == 0 {
        m.vehicle_start(vehicle)
    } else {
        m.passenger(order[pos - 1])
    };
    let next = if pos + 1 == order.len() {
        m.destination()
    } else {
        m.passenger(order[pos + 1])
    };
    m.km(prev, point) + m.km(point, next) - m.km(prev, next)
}

/// Restore capacity feasibility: evict passengers from over-capacity
/// vehicles (largest detour contribution first), then reinsert them greedily
/// wherever space remains. Order keys are rewritten as positions, so the
/// repaired chromosome is normalized.
pub fn repair(genes: &mut [Gene], ctx: &SolverContext) {
    let mut orders = vehicle_orders(genes, ctx.vehicle_count);
    let mut evicted: Vec<usize> = Vec::new();

    for v in 0..ctx.vehicle_count {
        while orders[v].len() > ctx.capacities[v] {
            let worst = (0..orders[v].len())
                .max_by(|&a, &b| {
                    removal_saving(&orders[v], v, a, ctx)
                        .total_cmp(&removal_saving(&orders[v], v, b, ctx))
                })
                .expect("over-capacity vehicle has stops");
            evicted.push(orders[v].remove(worst));
        }
    }

    for p in evicted {
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
        match best {
            Some((_, v, pos)) => orders[v].insert(pos, p),
            None => {} // no capacity anywhere, stays unassigned
        }
    }

    for gene in genes.iter_mut() {
        *gene = Gene::unassigned();
    }
    for (v, order) in orders.iter().enumerate() {
        for (pos, &p) in order.iter().enumerate() {
            genes[p] = Gene {
                vehicle: v,
                order_key: pos as f64,
            };
        }
    }
}

/// Apply one mutation, chosen uniformly: reassign to a random vehicle, swap
/// two passengers, reorder two stops within a vehicle, or drop a passenger.
pub fn mutate(genes: &mut [Gene], ctx: &SolverContext, rng: &mut ChaCha8Rng) {
    if genes.is_empty() || ctx.vehicle_count == 0 {
        return;
    }

    match rng.gen_range(0..4) {
        0 => {
            let p = rng.gen_range(0..genes.len());
            genes[p] = Gene {
                vehicle: rng.gen_range(0..ctx.vehicle_count),
                order_key: rng.gen::<f64>() * genes.len() as f64,
            };
        }
        1 => {
            let a = rng.gen_range(0..genes.len());
            let b = rng.gen_range(0..genes.len());
            genes.swap(a, b);
        }
        2 => {
            let orders = vehicle_orders(genes, ctx.vehicle_count);
            let candidates: Vec<usize> =
                (0..ctx.vehicle_count).filter(|&v| orders[v].len() >= 2).collect();
            if let Some(&v) = candidates.choose(rng) {
                let i = rng.gen_range(0..orders[v].len());
                let mut j = rng.gen_range(0..orders[v].len());
                if i == j {
                    j = (j + 1) % orders[v].len();
                }
                let (pa, pb) = (orders[v][i], orders[v][j]);
                let tmp = genes[pa].order_key;
                genes[pa].order_key = genes[pb].order_key;
                genes[pb].order_key = tmp;
            }
        }
        _ => {
            let p = rng.gen_range(0..genes.len());
            genes[p] = Gene::unassigned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Coordinate, Destination, Passenger, Vehicle};
    use chrono::NaiveTime;
    use rand::SeedableRng;

    fn context(capacity: usize, passenger_count: usize) -> SolverContext {
        let vehicles = vec![
            Vehicle::new(1, capacity, Coordinate::new(32.10, 34.80)),
            Vehicle::new(2, capacity, Coordinate::new(32.05, 34.78)),
        ];
        let passengers: Vec<Passenger> = (0..passenger_count)
            .map(|i| Passenger {
                id: 100 + i as i64,
                name: format!("p{}", i),
                location: Coordinate::new(32.06 + 0.01 * i as f64, 34.79),
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
    fn repair_restores_capacity() {
        let ctx = context(2, 5);
        // all five passengers crammed into vehicle 0
        let mut genes: Vec<Gene> = (0..5)
            .map(|i| Gene {
                vehicle: 0,
                order_key: i as f64,
            })
            .collect();
        repair(&mut genes, &ctx);

        let orders = vehicle_orders(&genes, ctx.vehicle_count);
        assert!(orders[0].len() <= 2);
        assert!(orders[1].len() <= 2);
        // 4 seats for 5 passengers: exactly one left out
        assert_eq!(orders[0].len() + orders[1].len(), 4);
    }

    #[test]
    fn repair_is_a_noop_on_feasible_chromosomes() {
        let ctx = context(2, 3);
        let mut genes = vec![
            Gene { vehicle: 0, order_key: 0.0 },
            Gene { vehicle: 0, order_key: 1.0 },
            Gene { vehicle: 1, order_key: 0.0 },
        ];
        let before = vehicle_orders(&genes, ctx.vehicle_count);
        repair(&mut genes, &ctx);
        assert_eq!(before, vehicle_orders(&genes, ctx.vehicle_count));
    }

    #[test]
    fn crossover_takes_each_gene_from_a_parent() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(5);
        let a: Vec<Gene> = (0..4).map(|i| Gene { vehicle: 0, order_key: i as f64 }).collect();
        let b: Vec<Gene> = (0..4).map(|i| Gene { vehicle: 1, order_key: i as f64 }).collect();
        let child = uniform_crossover(&a, &b, &mut rng);
        assert_eq!(child.len(), 4);
        for gene in &child {
            assert!(gene.vehicle == 0 || gene.vehicle == 1);
        }
    }

    #[test]
    fn best_insertion_prefers_the_cheap_slot() {
        let ctx = context(4, 3);
        // passenger 2 lies between passengers 0 and 1 on the way south
        let (pos, added) = best_insertion(&[1, 0], 0, 2, &ctx);
        assert!(pos <= 2);
        assert!(added >= 0.0);
    }
}
