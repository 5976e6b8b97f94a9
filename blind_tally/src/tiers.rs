//! Extraction of the final ranking from the strongest paths.

use log::{debug, warn};

use crate::config::Tier;
use crate::graph::Matrix;

/// Marks, on the diagonal, a candidate whose tier has been decided.
pub const ASSIGNED: i64 = -1;

/// Splits the candidates into tiers, from best to worst.
///
/// A candidate enters the next tier when no remaining candidate has a stronger path
/// to it than it has in return. All such candidates share the tier. If a pass finds
/// nobody (which a proper closure never produces), the tiers found so far are
/// returned and the remaining candidates are left out.
pub fn extract(closure: &Matrix) -> Vec<Tier> {
    let n = closure.size();
    let mut graph = closure.clone();
    let mut tiers: Vec<Tier> = Vec::new();
    let mut num_placed: usize = 0;

    while num_placed < n {
        let is_assigned = |g: &Matrix, c: usize| g[(c, c)] == ASSIGNED;
        let tier: Tier = (0..n)
            .filter(|&i| !is_assigned(&graph, i))
            .filter(|&i| {
                (0..n)
                    .filter(|&j| j != i && !is_assigned(&graph, j))
                    .all(|j| graph[(i, j)] >= graph[(j, i)])
            })
            .collect();

        if tier.is_empty() {
            warn!(
                "extract: no undominated candidate left, {} of {} candidates placed",
                num_placed, n
            );
            break;
        }

        for &c in tier.iter() {
            for i in 0..n {
                graph[(i, c)] = 0;
                graph[(c, i)] = 0;
            }
            graph[(c, c)] = ASSIGNED;
        }
        num_placed += tier.len();
        debug!("extract: tier {}: {:?}", tiers.len() + 1, tier);
        tiers.push(tier);
    }
    tiers
}
