//! Exact base-game RTP by full enumeration
//!
//! A base round is fully determined by its strip set and the start offset of
//! each column: cascades refill from the same cursors. Walking every
//! combination, weighted by the strip set's selection weight, gives the exact
//! base return without sampling noise. Awarded free rounds are not counted.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use rf_cascade::{CascadeEngine, StepRequest};

use crate::error::{SimError, SimResult};

/// Default cap on combinations walked per call
pub const DEFAULT_COMBINATION_LIMIT: u128 = 50_000_000;

/// Exact base-game figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enumeration {
    /// Base-game return as a fraction of wager
    pub rtp: f64,
    /// Probability that a base round wins anything
    pub hit_rate: f64,
    /// Probability that a base round awards free rounds
    pub trigger_rate: f64,
    pub combinations: u128,
}

#[derive(Default)]
struct Tally {
    win: u128,
    hits: u64,
    triggers: u64,
}

impl Tally {
    fn merge(mut self, other: Tally) -> Tally {
        self.win += other.win;
        self.hits += other.hits;
        self.triggers += other.triggers;
        self
    }
}

/// Enumerate every base round of `engine`'s base weight table
pub fn enumerate_base_rtp(engine: &CascadeEngine, limit: u128) -> SimResult<Enumeration> {
    let config = engine.config();
    let table = &config.weights.base;
    let total_weight = table.total() as f64;
    let request = StepRequest::new(1, 1);
    let wager = f64::from(config.bet_units);

    let mut combinations = 0u128;
    for (key, _) in table.entries() {
        let lens = strip_lengths(engine, key)?;
        combinations += lens.iter().map(|&l| l as u128).product::<u128>();
    }
    if combinations > limit {
        return Err(SimError::TooLarge {
            combinations,
            limit,
        });
    }
    log::info!(
        "Enumerating {} base rounds of '{}'",
        combinations,
        engine.engine_id()
    );

    let mut rtp = 0.0;
    let mut hit_rate = 0.0;
    let mut trigger_rate = 0.0;
    for (key, weight) in table.entries() {
        if weight == 0 {
            continue;
        }
        let lens = strip_lengths(engine, key)?;
        let per_set: u128 = lens.iter().map(|&l| l as u128).product();

        // Split on the first column's offset; walk the rest sequentially
        let tally = (0..lens[0])
            .into_par_iter()
            .map(|first| walk_from(engine, &request, key, &lens, first))
            .try_reduce(Tally::default, |a, b| Ok(a.merge(b)))?;

        let share = f64::from(weight) / total_weight;
        let n = per_set as f64;
        rtp += share * (tally.win as f64 / n) / wager;
        hit_rate += share * tally.hits as f64 / n;
        trigger_rate += share * tally.triggers as f64 / n;
    }

    Ok(Enumeration {
        rtp,
        hit_rate,
        trigger_rate,
        combinations,
    })
}

fn strip_lengths(engine: &CascadeEngine, key: usize) -> SimResult<Vec<usize>> {
    let set = engine
        .config()
        .strip_sets
        .get(key)
        .ok_or_else(|| SimError::InvalidSetup(format!("strip set {key} missing")))?;
    let lens: Vec<usize> = set.columns.iter().map(Vec::len).collect();
    if lens.is_empty() || lens.contains(&0) {
        return Err(SimError::InvalidSetup(format!(
            "strip set '{}' has an empty column",
            set.name
        )));
    }
    Ok(lens)
}

/// All combinations whose first column starts at `first`
fn walk_from(
    engine: &CascadeEngine,
    request: &StepRequest,
    key: usize,
    lens: &[usize],
    first: usize,
) -> SimResult<Tally> {
    let mut tally = Tally::default();
    let mut starts = vec![0usize; lens.len()];
    starts[0] = first;

    loop {
        let mut scene = engine.new_scene();
        loop {
            let result = engine.step_at(&mut scene, request, key, &starts)?;
            if result.round_over {
                tally.win += u128::from(result.round_total);
                if result.round_total > 0 {
                    tally.hits += 1;
                }
                if result.free_rounds_awarded > 0 {
                    tally.triggers += 1;
                }
                break;
            }
        }

        // Odometer over columns 1..
        let mut column = 1;
        loop {
            if column == lens.len() {
                return Ok(tally);
            }
            starts[column] += 1;
            if starts[column] < lens[column] {
                break;
            }
            starts[column] = 0;
            column += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_cascade::{
        AwardCurve, CascadeRules, EliminationRule, FreeRoundRules, GameConfig, GridSpec,
        ReelWeights, StripSet, Symbol, WeightTable,
    };
    use std::sync::Arc;

    /// 1×3 grid: only identical triples win, no cascade refills can repeat
    fn single_row() -> GameConfig {
        GameConfig {
            engine_id: "single_row".into(),
            name: "Single Row".into(),
            version: 1,
            grid: GridSpec::new(1, 3),
            symbols: vec![
                Symbol::regular(1, "A", &[0, 0, 10]),
                Symbol::regular(2, "B", &[0, 0, 0]),
                Symbol::scatter(20, "S"),
            ],
            families: Vec::new(),
            min_match: 3,
            strip_sets: vec![StripSet::new(
                "only",
                vec![vec![1, 2], vec![1, 2], vec![1, 2]],
            )],
            weights: ReelWeights {
                base: WeightTable::single("base", 0),
                free: vec![WeightTable::single("free", 0)],
            },
            free_rounds: FreeRoundRules {
                trigger: 20,
                count_wilds: false,
                award: AwardCurve {
                    min_count: 3,
                    base_award: 1,
                    per_extra_award: 0,
                },
                retrigger: None,
            },
            cascade: CascadeRules {
                rule: EliminationRule::Classic,
                max_steps: 1,
                base_multipliers: vec![1],
                free_multipliers: vec![1],
            },
            bet_units: 1,
            target_rtp: None,
        }
    }

    #[test]
    fn test_hand_computed_rtp() {
        let engine = CascadeEngine::new(Arc::new(single_row())).unwrap();
        let result = enumerate_base_rtp(&engine, DEFAULT_COMBINATION_LIMIT).unwrap();
        // One of eight combinations is A-A-A paying 10
        assert_eq!(result.combinations, 8);
        assert!((result.rtp - 10.0 / 8.0).abs() < 1e-12);
        assert!((result.hit_rate - 1.0 / 8.0).abs() < 1e-12);
        assert_eq!(result.trigger_rate, 0.0);
    }

    #[test]
    fn test_limit_enforced() {
        let engine = CascadeEngine::new(Arc::new(single_row())).unwrap();
        assert!(matches!(
            enumerate_base_rtp(&engine, 7),
            Err(SimError::TooLarge {
                combinations: 8,
                limit: 7
            })
        ));
    }
}
