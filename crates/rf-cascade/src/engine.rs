//! Cascade engine: one parameterized step machine for every variant
//!
//! Each call advances a player's scene by exactly one step: either opening a
//! round from fresh reel samples or evaluating the pending grid of a cascade.
//! The engine owns no per-player state; everything lives in [`SceneState`].

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cascade::{Cascade, EliminationMode};
use crate::config::GameConfig;
use crate::error::{ConfigError, EngineError};
use crate::free_rounds::FeatureCounter;
use crate::grid::{CellPos, SymbolGrid, WinMask};
use crate::paytable::{WinEvaluator, WinRecord};
use crate::reels::{ReelSampler, Sample, WeightTable};
use crate::scene::{PlayMode, SceneState};
use crate::symbols::SymbolTable;

/// Caller parameters for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRequest {
    pub base_stake: u64,
    pub stake_multiplier: u32,
    /// Free-round weight table to use if this round triggers the feature
    #[serde(default)]
    pub feature_tier: Option<usize>,
}

impl StepRequest {
    pub fn new(base_stake: u64, stake_multiplier: u32) -> Self {
        Self {
            base_stake,
            stake_multiplier,
            feature_tier: None,
        }
    }

    pub fn with_tier(mut self, tier: usize) -> Self {
        self.feature_tier = Some(tier);
        self
    }

    /// `base_stake × stake_multiplier`
    pub fn stake_unit(&self) -> Result<u64, EngineError> {
        self.base_stake
            .checked_mul(u64::from(self.stake_multiplier))
            .ok_or(EngineError::Overflow("stake unit"))
    }
}

/// Output of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinStepResult {
    /// Step index within the round
    pub step: u32,
    /// Mode the step was played in
    pub mode: PlayMode,
    pub grid: SymbolGrid,
    pub wins: Vec<WinRecord>,
    pub win_mask: WinMask,
    pub elimination: EliminationMode,
    pub eliminated: Vec<CellPos>,
    /// Grid the next cascade step will evaluate (the evaluated grid when nothing fell)
    pub next_grid: SymbolGrid,
    pub round_over: bool,
    /// Cascade ladder multiplier applied to this step
    pub step_multiplier: u32,
    pub step_payout: u64,
    /// Amount charged by this step (only a base round's opening step charges)
    pub wager: u64,
    /// Round win including this step
    pub round_total: u64,
    pub free_rounds_awarded: u32,
    pub remaining_free_rounds: u32,
}

/// Totals of a round played to completion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub wager: u64,
    pub win: u64,
    pub steps: u32,
    pub free_rounds_awarded: u32,
    pub remaining_free_rounds: u32,
    /// Round was played in free mode
    pub free: bool,
}

/// The cascading ways engine
pub struct CascadeEngine {
    config: Arc<GameConfig>,
    symbols: SymbolTable,
}

impl CascadeEngine {
    /// Validate the config and build lookup tables
    pub fn new(config: Arc<GameConfig>) -> Result<Self, ConfigError> {
        config.validate()?;
        let symbols = config.symbol_table()?;
        log::info!(
            "Cascade engine '{}' ready: {}x{} grid, {} symbols, {:?} elimination",
            config.engine_id,
            config.grid.rows,
            config.grid.columns,
            config.symbols.len(),
            config.cascade.rule
        );
        Ok(Self { config, symbols })
    }

    pub fn config(&self) -> &Arc<GameConfig> {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn engine_id(&self) -> &str {
        &self.config.engine_id
    }

    /// Blank scene for a new player
    pub fn new_scene(&self) -> SceneState {
        SceneState::new(self.config.families.len())
    }

    /// Reject malformed requests before any computation
    pub fn check_request(&self, request: &StepRequest) -> Result<(), EngineError> {
        if request.base_stake == 0 || request.stake_multiplier == 0 {
            return Err(EngineError::InvalidRequest(
                "stake must be positive".to_string(),
            ));
        }
        if let Some(tier) = request.feature_tier {
            if tier >= self.config.weights.free.len() {
                return Err(EngineError::InvalidRequest(format!(
                    "unknown feature tier {tier}"
                )));
            }
        }
        request.stake_unit().map(|_| ())
    }

    /// Amount the next step would charge
    pub fn wager_for(&self, scene: &SceneState, request: &StepRequest) -> Result<u64, EngineError> {
        self.check_request(request)?;
        if !scene.is_idle() {
            return Ok(0);
        }
        request
            .stake_unit()?
            .checked_mul(u64::from(self.config.bet_units))
            .ok_or(EngineError::Overflow("wager"))
    }

    /// Advance the scene by one step using random reel samples
    ///
    /// On error the scene may be partially updated; persist it only on success.
    pub fn step<R: Rng + ?Sized>(
        &self,
        scene: &mut SceneState,
        request: &StepRequest,
        rng: &mut R,
    ) -> Result<SpinStepResult, EngineError> {
        self.advance(scene, request, |sampler, table, counters| {
            sampler.sample(table, counters, rng)
        })
    }

    /// Advance the scene with explicit strip set and start offsets for the
    /// opening sample (ignored on cascade steps)
    pub fn step_at(
        &self,
        scene: &mut SceneState,
        request: &StepRequest,
        strip_set: usize,
        starts: &[usize],
    ) -> Result<SpinStepResult, EngineError> {
        self.advance(scene, request, |sampler, _, counters| {
            sampler.sample_at(strip_set, starts, counters)
        })
    }

    /// Step until the current round is over
    pub fn play_round<R: Rng + ?Sized>(
        &self,
        scene: &mut SceneState,
        request: &StepRequest,
        rng: &mut R,
    ) -> Result<RoundSummary, EngineError> {
        let mut summary = RoundSummary {
            free: scene.mode.is_free(),
            ..RoundSummary::default()
        };
        loop {
            let result = self.step(scene, request, rng)?;
            summary.wager += result.wager;
            summary.win = result.round_total;
            summary.steps += 1;
            if result.round_over {
                summary.free_rounds_awarded = result.free_rounds_awarded;
                summary.remaining_free_rounds = result.remaining_free_rounds;
                return Ok(summary);
            }
        }
    }

    fn advance<F>(
        &self,
        scene: &mut SceneState,
        request: &StepRequest,
        sample: F,
    ) -> Result<SpinStepResult, EngineError>
    where
        F: FnOnce(&ReelSampler<'_>, &WeightTable, &[u32]) -> Result<Sample, EngineError>,
    {
        self.check_request(request)?;
        scene.check(&self.config)?;

        let config = &*self.config;
        let mode = scene.mode;
        let free = mode.is_free();
        let counter = FeatureCounter::new(&config.free_rounds, &self.symbols);
        let mut wager = 0;

        let grid = if mode.is_cascading() {
            scene
                .grid
                .take()
                .ok_or_else(|| EngineError::CorruptScene("missing pending grid".into()))?
        } else {
            if mode == PlayMode::Base {
                scene.stake_unit = request.stake_unit()?;
                scene.feature_tier = request.feature_tier.unwrap_or(0);
                wager = self.wager_for(scene, request)?;
            }
            let table = if free {
                config.weights.free.get(scene.feature_tier).ok_or_else(|| {
                    EngineError::InvalidRequest(format!(
                        "unknown feature tier {}",
                        scene.feature_tier
                    ))
                })?
            } else {
                &config.weights.base
            };
            let sampler = ReelSampler::new(
                &config.strip_sets,
                &self.symbols,
                config.grid.rows,
                config.grid.columns,
                &config.grid.blocked,
            );
            let opened = sample(&sampler, table, &scene.family_counters)?;
            scene.cursors = opened.cursors;
            scene.step = 0;
            scene.round_win = 0;
            scene.round_triggers = if free {
                counter.count_triggers(&opened.grid)
            } else {
                0
            };
            opened.grid
        };

        let step = scene.step;
        let eval = WinEvaluator::new(&self.symbols, config.min_match).evaluate(&grid)?;
        let multiplier = config.cascade.multiplier_for_step(free, step);
        let payout = eval
            .total_units()
            .and_then(|units| units.checked_mul(u64::from(multiplier)))
            .and_then(|units| units.checked_mul(scene.stake_unit))
            .ok_or(EngineError::Overflow("step payout"))?;

        let outcome = Cascade::new(&self.symbols, &config.strip_sets, config.cascade.rule).resolve(
            &grid,
            &eval,
            free,
            &mut scene.family_counters,
            &mut scene.cursors,
        )?;
        if free && outcome.continues {
            scene.round_triggers += counter.count_in(&outcome.next_grid, &outcome.refilled);
        }

        scene.round_win = scene
            .round_win
            .checked_add(payout)
            .ok_or(EngineError::Overflow("round win"))?;
        if free {
            scene.feature_win = scene.feature_win.saturating_add(payout);
        }
        scene.round_multiplier = multiplier;
        let round_total = scene.round_win;

        let capped = outcome.continues && step + 1 >= config.cascade.max_steps;
        if capped {
            log::warn!(
                "Round capped at {} steps in '{}'",
                config.cascade.max_steps,
                config.engine_id
            );
        }
        let round_over = !outcome.continues || capped;

        log::debug!(
            "Step {} ({:?}): {} wins, payout {}, x{}, elimination {:?}",
            step,
            mode,
            eval.records.len(),
            payout,
            multiplier,
            outcome.mode
        );

        let mut awarded = 0;
        if round_over {
            let settlement = counter.settle(
                free,
                &outcome.next_grid,
                scene.round_triggers,
                scene.remaining_free_rounds,
            );
            awarded = settlement.awarded;
            scene.remaining_free_rounds = settlement.remaining;
            if free {
                scene.free_rounds_played += 1;
            }

            match (free, settlement.feature_active) {
                (false, true) => {
                    log::info!(
                        "Free rounds triggered: {} awarded from {} triggers (tier {})",
                        awarded,
                        settlement.triggers,
                        scene.feature_tier
                    );
                    scene.free_rounds_played = 0;
                    scene.feature_win = 0;
                    scene.mode = PlayMode::Free;
                }
                (true, true) => {
                    if awarded > 0 {
                        log::info!("Free rounds retriggered: +{awarded}");
                    }
                    scene.mode = PlayMode::Free;
                }
                (true, false) => {
                    log::info!(
                        "Free rounds finished after {} rounds, feature win {}",
                        scene.free_rounds_played,
                        scene.feature_win
                    );
                    scene.family_counters.iter_mut().for_each(|c| *c = 0);
                    scene.mode = PlayMode::Base;
                }
                (false, false) => scene.mode = PlayMode::Base,
            }

            scene.step = 0;
            scene.grid = None;
            scene.round_win = 0;
            scene.round_multiplier = 1;
            scene.round_triggers = 0;
        } else {
            scene.step = step + 1;
            scene.grid = Some(outcome.next_grid.clone());
            scene.mode = if free {
                PlayMode::FreeCascade
            } else {
                PlayMode::BaseCascade
            };
        }

        Ok(SpinStepResult {
            step,
            mode,
            grid,
            wins: eval.records,
            win_mask: eval.mask,
            elimination: outcome.mode,
            eliminated: outcome.eliminated,
            next_grid: outcome.next_grid,
            round_over,
            step_multiplier: multiplier,
            step_payout: payout,
            wager,
            round_total,
            free_rounds_awarded: awarded,
            remaining_free_rounds: scene.remaining_free_rounds,
        })
    }
}
