use rayon::prelude::*;

use crate::expectation::PriorsCache;
use crate::sim::{SimulationOptions, SimulationResult, Simulator};

/// Simulates independent matchups in parallel. Results keep the input order.
///
/// Each matchup gets its own priors cache, since contexts differ per matchup.
pub fn simulate_slate(sim: &Simulator, matchups: &[SimulationOptions]) -> Vec<SimulationResult> {
    tracing::debug!(matchups = matchups.len(), "simulating slate");
    matchups
        .par_iter()
        .map(|opts| {
            let mut cache = PriorsCache::new();
            sim.simulate_with_cache(opts, &mut cache)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Engine;

    #[test]
    fn slate_matches_sequential_runs() {
        let sim = Simulator::default();
        let matchups: Vec<SimulationOptions> = (0..6)
            .map(|i| {
                let mut opts = SimulationOptions::new("Chiefs", "Bills", 250);
                opts.seed = Some(100 + i);
                opts.engine = Engine::Classic;
                opts.classic_fallback.spread = Some(i as f64 - 3.0);
                opts
            })
            .collect();

        let parallel = simulate_slate(&sim, &matchups);
        assert_eq!(parallel.len(), matchups.len());
        for (opts, result) in matchups.iter().zip(&parallel) {
            assert_eq!(result, &sim.simulate(opts));
        }
    }

    #[test]
    fn empty_slate() {
        assert!(simulate_slate(&Simulator::default(), &[]).is_empty());
    }
}
