//! Parallel batch simulation
//!
//! Rounds are split into fixed-size chunks. Chunk `i` always draws from
//! ChaCha8 stream `i` of the configured seed, so results depend only on the
//! seed and chunk size, never on the thread count.

use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use rf_cascade::{CascadeEngine, StepRequest};

use crate::error::{SimError, SimResult};
use crate::stats::{SimReport, SimStats};

/// Simulation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Paid base rounds to play
    pub rounds: u64,
    pub seed: u64,
    /// Worker threads (0 = one per CPU)
    pub threads: usize,
    /// Discard awarded free rounds instead of playing them
    pub base_only: bool,
    /// Base stake per round
    pub stake: u64,
    /// Free-round weight table tier
    pub feature_tier: usize,
    /// Rounds per RNG stream
    pub chunk_rounds: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rounds: 1_000_000,
            seed: 1,
            threads: 0,
            base_only: false,
            stake: 1,
            feature_tier: 0,
            chunk_rounds: 10_000,
        }
    }
}

impl SimConfig {
    pub fn with_rounds(mut self, rounds: u64) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn base_only(mut self, base_only: bool) -> Self {
        self.base_only = base_only;
        self
    }

    fn worker_count(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

pub struct Simulator {
    engine: Arc<CascadeEngine>,
    config: SimConfig,
}

impl Simulator {
    pub fn new(engine: Arc<CascadeEngine>, config: SimConfig) -> Self {
        Self { engine, config }
    }

    pub fn run(&self) -> SimResult<SimReport> {
        let config = &self.config;
        if config.rounds == 0 || config.chunk_rounds == 0 {
            return Err(SimError::InvalidSetup(
                "rounds and chunk size must be positive".into(),
            ));
        }
        let request = StepRequest::new(config.stake, 1).with_tier(config.feature_tier);
        self.engine.check_request(&request)?;

        let threads = config.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?;

        let chunks = config.rounds.div_ceil(config.chunk_rounds);
        log::info!(
            "Simulating {} rounds of '{}' in {} chunks on {} threads",
            config.rounds,
            self.engine.engine_id(),
            chunks,
            threads
        );

        let started = Instant::now();
        let stats = pool.install(|| {
            (0..chunks)
                .into_par_iter()
                .map(|chunk| {
                    let rounds = config
                        .chunk_rounds
                        .min(config.rounds - chunk * config.chunk_rounds);
                    self.run_chunk(chunk, rounds, &request)
                })
                .try_reduce(SimStats::default, |a, b| Ok(a.merge(b)))
        })?;
        let elapsed = started.elapsed().as_secs_f64();

        log::info!("Simulation finished in {elapsed:.2}s, RTP {:.4}%", stats.rtp() * 100.0);

        Ok(SimReport {
            engine_id: self.engine.engine_id().to_string(),
            seed: config.seed,
            threads,
            base_only: config.base_only,
            rounds: stats.rounds,
            rtp: stats.rtp(),
            base_rtp: stats.base_rtp(),
            free_rtp: stats.free_rtp(),
            hit_rate: stats.hit_rate(),
            trigger_rate: stats.trigger_rate(),
            avg_cascade_length: stats.avg_cascade_length(),
            max_win_ratio: stats.max_win_ratio(),
            target_rtp: self.engine.config().target_rtp,
            elapsed_secs: elapsed,
            stats,
        })
    }

    fn run_chunk(&self, chunk: u64, rounds: u64, request: &StepRequest) -> SimResult<SimStats> {
        let engine = &*self.engine;
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        rng.set_stream(chunk);

        let mut stats = SimStats::default();
        let mut scene = engine.new_scene();

        for _ in 0..rounds {
            let base = engine.play_round(&mut scene, request, &mut rng)?;
            stats.rounds += 1;
            stats.total_wager += base.wager;
            stats.base_win += base.win;
            stats.record_steps(base.steps);
            let mut session_win = base.win;

            if scene.mode.is_free() {
                stats.feature_triggers += 1;
                if self.config.base_only {
                    scene = engine.new_scene();
                } else {
                    while scene.mode.is_free() {
                        let free = engine.play_round(&mut scene, request, &mut rng)?;
                        stats.free_rounds_played += 1;
                        stats.free_win += free.win;
                        session_win += free.win;
                    }
                }
            }

            stats.total_win += session_win;
            if session_win > 0 {
                stats.hits += 1;
            }
            stats.max_win = stats.max_win.max(session_win);
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_cascade::presets;

    fn engine(config: rf_cascade::GameConfig) -> Arc<CascadeEngine> {
        Arc::new(CascadeEngine::new(Arc::new(config)).unwrap())
    }

    #[test]
    fn test_results_independent_of_thread_count() {
        let engine = engine(presets::demo_ways());
        let base = SimConfig {
            rounds: 3_000,
            chunk_rounds: 500,
            ..SimConfig::default()
        };

        let one = Simulator::new(engine.clone(), base.clone().with_threads(1))
            .run()
            .unwrap();
        let four = Simulator::new(engine, base.with_threads(4)).run().unwrap();
        assert_eq!(one.stats, four.stats);
        assert_eq!(one.rounds, 3_000);
    }

    #[test]
    fn test_base_only_plays_no_free_rounds() {
        let engine = engine(presets::demo_ways());
        let config = SimConfig::default()
            .with_rounds(5_000)
            .with_threads(2)
            .base_only(true);
        let report = Simulator::new(engine, config).run().unwrap();
        assert_eq!(report.stats.free_rounds_played, 0);
        assert_eq!(report.stats.free_win, 0);
        assert_eq!(report.stats.total_win, report.stats.base_win);
        assert_eq!(report.stats.total_wager, 5_000 * 20);
    }

    #[test]
    fn test_rejects_empty_run() {
        let engine = engine(presets::toy_ways());
        let result = Simulator::new(engine, SimConfig::default().with_rounds(0)).run();
        assert!(matches!(result, Err(SimError::InvalidSetup(_))));
    }
}
