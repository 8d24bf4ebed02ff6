//! Chromosome representation.
//!
//! A chromosome maps each passenger (by index) to a vehicle index plus an
//! order key; a vehicle's pickup sequence is its passengers sorted by order
//! key, ties broken by passenger index. Unassigned passengers carry the
//! sentinel vehicle index.

/// Sentinel vehicle index for unassigned passengers.
pub const UNASSIGNED: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
pub struct Gene {
    pub vehicle: usize,
    pub order_key: f64,
}

impl Gene {
    pub fn unassigned() -> Self {
        Self {
            vehicle: UNASSIGNED,
            order_key: 0.0,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.vehicle != UNASSIGNED
    }
}

#[derive(Debug, Clone)]
pub struct Chromosome {
    pub genes: Vec<Gene>,
    pub cost: f64,
}

/// Decode per-vehicle pickup orders as passenger indices.
pub fn vehicle_orders(genes: &[Gene], vehicle_count: usize) -> Vec<Vec<usize>> {
    let mut orders: Vec<Vec<usize>> = vec![Vec::new(); vehicle_count];
    for (p, gene) in genes.iter().enumerate() {
        if gene.is_assigned() {
            orders[gene.vehicle].push(p);
        }
    }
    for order in &mut orders {
        order.sort_by(|&a, &b| {
            genes[a]
                .order_key
                .total_cmp(&genes[b].order_key)
                .then(a.cmp(&b))
        });
    }
    orders
}

pub fn unassigned_count(genes: &[Gene]) -> usize {
    genes.iter().filter(|g| !g.is_assigned()).count()
}
