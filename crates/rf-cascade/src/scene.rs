//! Durable per-player scene state and its versioned codec

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::{CodecError, EngineError};
use crate::grid::{Slot, SymbolGrid};
use crate::reels::ReelCursor;

/// Current scene record layout
pub const SCENE_VERSION: u32 = 1;

/// Where the player is inside the game flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Next call opens a base round
    #[default]
    Base,
    /// Base round mid-cascade; next call evaluates the pending grid
    BaseCascade,
    /// Next call opens a free round
    Free,
    /// Free round mid-cascade
    FreeCascade,
}

impl PlayMode {
    pub fn is_free(self) -> bool {
        matches!(self, PlayMode::Free | PlayMode::FreeCascade)
    }

    pub fn is_cascading(self) -> bool {
        matches!(self, PlayMode::BaseCascade | PlayMode::FreeCascade)
    }
}

/// Snapshot of everything needed to resume a player's game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneState {
    pub mode: PlayMode,
    /// Cascade step within the current round (0 opens a round)
    pub step: u32,
    /// Pending grid to evaluate on the next cascading call
    pub grid: Option<SymbolGrid>,
    pub cursors: Vec<ReelCursor>,
    /// Collected symbols per family (free rounds)
    pub family_counters: Vec<u32>,
    /// Ladder multiplier applied to the latest step
    pub round_multiplier: u32,
    /// Win accumulated by the current round
    pub round_win: u64,
    pub remaining_free_rounds: u32,
    pub free_rounds_played: u32,
    /// Weight table index for the active feature session
    pub feature_tier: usize,
    /// Trigger symbols seen during the current free round
    pub round_triggers: u32,
    /// Stake unit locked in at the start of the round or feature session
    pub stake_unit: u64,
    /// Win accumulated over the active feature session
    pub feature_win: u64,
}

impl SceneState {
    pub fn new(families: usize) -> Self {
        Self {
            mode: PlayMode::Base,
            step: 0,
            grid: None,
            cursors: Vec::new(),
            family_counters: vec![0; families],
            round_multiplier: 1,
            round_win: 0,
            remaining_free_rounds: 0,
            free_rounds_played: 0,
            feature_tier: 0,
            round_triggers: 0,
            stake_unit: 0,
            feature_win: 0,
        }
    }

    /// True between rounds, when a new stake may be chosen
    pub fn is_idle(&self) -> bool {
        self.mode == PlayMode::Base
    }

    /// Verify the scene still fits `config`
    pub fn check(&self, config: &GameConfig) -> Result<(), EngineError> {
        let corrupt = |msg: String| Err(EngineError::CorruptScene(msg));

        if self.family_counters.len() != config.families.len() {
            return corrupt(format!(
                "{} family counters, config has {} families",
                self.family_counters.len(),
                config.families.len()
            ));
        }
        if let Some((i, _)) = self
            .family_counters
            .iter()
            .zip(&config.families)
            .enumerate()
            .find(|(_, (count, def))| **count > def.threshold)
        {
            return corrupt(format!("family {i} counter above threshold"));
        }
        if self.mode.is_free() && self.feature_tier >= config.weights.free.len() {
            return corrupt(format!("unknown feature tier {}", self.feature_tier));
        }
        if self.mode == PlayMode::Free && self.remaining_free_rounds == 0 {
            return corrupt("free mode with no rounds remaining".into());
        }
        if !self.mode.is_free() && self.remaining_free_rounds > 0 {
            return corrupt("base mode with free rounds pending".into());
        }

        if !self.mode.is_cascading() {
            return Ok(());
        }

        let Some(grid) = &self.grid else {
            return corrupt("cascading scene without a pending grid".into());
        };
        if grid.rows() != config.grid.rows || grid.columns() != config.grid.columns {
            return corrupt(format!(
                "grid is {}x{}, config expects {}x{}",
                grid.rows(),
                grid.columns(),
                config.grid.rows,
                config.grid.columns
            ));
        }
        for pos in grid.positions() {
            let blocked = config.grid.blocked.contains(&pos);
            match grid.get(pos) {
                Some(Slot::Blocked) if blocked => {}
                Some(Slot::Symbol(id)) if !blocked && config.symbols.iter().any(|s| s.id == id) => {}
                other => {
                    return corrupt(format!(
                        "cell ({}, {}) holds {:?}",
                        pos.row, pos.column, other
                    ));
                }
            }
        }

        if self.cursors.len() != config.grid.columns as usize {
            return corrupt(format!(
                "{} cursors for {} columns",
                self.cursors.len(),
                config.grid.columns
            ));
        }
        for (column, cursor) in self.cursors.iter().enumerate() {
            let strip_len = config
                .strip_sets
                .get(cursor.strip_set)
                .and_then(|s| s.strip(column))
                .map(<[_]>::len);
            if strip_len != Some(cursor.len) || cursor.offset >= cursor.len {
                return corrupt(format!("cursor for column {column} does not fit its strip"));
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    v: u32,
    scene: &'a SceneState,
}

#[derive(Deserialize)]
struct Envelope {
    v: u32,
    scene: serde_json::Value,
}

/// Compact JSON scene records with a version tag
pub struct SceneCodec;

impl SceneCodec {
    pub fn save(scene: &SceneState) -> Result<Vec<u8>, CodecError> {
        let envelope = EnvelopeRef {
            v: SCENE_VERSION,
            scene,
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    pub fn load(bytes: &[u8]) -> Result<SceneState, CodecError> {
        let envelope: Envelope = serde_json::from_slice(bytes)?;
        if envelope.v != SCENE_VERSION {
            return Err(CodecError::UnsupportedVersion(envelope.v));
        }
        Ok(serde_json::from_value(envelope.scene)?)
    }
}
