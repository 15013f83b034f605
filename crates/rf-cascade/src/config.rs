//! Game configuration: the immutable ruleset of one engine variant
//!
//! Loaded once from JSON or YAML, validated, then shared read-only. Any
//! inconsistency (mismatched weight tables, missing strips, dangling symbol
//! references) is reported here so it can never surface at spin time.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cascade::EliminationRule;
use crate::error::ConfigError;
use crate::grid::CellPos;
use crate::reels::{StripSet, WeightTable};
use crate::symbols::{FamilyDef, Symbol, SymbolId, SymbolKind, SymbolTable};

/// Grid specification (rows × columns, optional blocked cells)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: u8,
    pub columns: u8,
    /// Cells that never hold a symbol (e.g. trimmed corners)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked: Vec<CellPos>,
}

impl GridSpec {
    pub fn new(rows: u8, columns: u8) -> Self {
        Self {
            rows,
            columns,
            blocked: Vec::new(),
        }
    }

    /// Builder: block the four corner cells
    pub fn with_blocked_corners(mut self) -> Self {
        let last_row = self.rows.saturating_sub(1);
        let last_col = self.columns.saturating_sub(1);
        self.blocked = vec![
            CellPos::new(0, 0),
            CellPos::new(0, last_col),
            CellPos::new(last_row, 0),
            CellPos::new(last_row, last_col),
        ];
        self
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Number of open (non-blocked) cells in `column`
    pub fn open_cells(&self, column: u8) -> usize {
        let blocked = self.blocked.iter().filter(|p| p.column == column).count();
        (self.rows as usize).saturating_sub(blocked)
    }
}

/// Strip-set weight tables per mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelWeights {
    pub base: WeightTable,
    /// One table per feature tier
    pub free: Vec<WeightTable>,
}

/// `base + (count - min) * per_extra` once `count >= min`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardCurve {
    pub min_count: u32,
    pub base_award: u32,
    pub per_extra_award: u32,
}

impl AwardCurve {
    pub fn award(&self, count: u32) -> u32 {
        if count < self.min_count {
            return 0;
        }
        self.base_award
            .saturating_add((count - self.min_count).saturating_mul(self.per_extra_award))
    }
}

/// Free-round trigger and award rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeRoundRules {
    /// Trigger (scatter) symbol
    pub trigger: SymbolId,
    /// Whether wild cells count toward the trigger total
    #[serde(default)]
    pub count_wilds: bool,
    /// Award curve in base mode
    pub award: AwardCurve,
    /// Award curve applied inside free rounds (None = no retrigger)
    #[serde(default)]
    pub retrigger: Option<AwardCurve>,
}

/// Cascade behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeRules {
    pub rule: EliminationRule,
    /// Hard cap on steps per round
    pub max_steps: u32,
    /// Multiplier progression per cascade step in base rounds [1x, 2x, 3x, ...]
    pub base_multipliers: Vec<u32>,
    /// Multiplier progression per cascade step in free rounds
    pub free_multipliers: Vec<u32>,
}

impl CascadeRules {
    /// Ladder value for `step`; steps beyond the ladder repeat its last value
    pub fn multiplier_for_step(&self, free: bool, step: u32) -> u32 {
        let ladder = if free {
            &self.free_multipliers
        } else {
            &self.base_multipliers
        };
        ladder
            .get(step as usize)
            .or_else(|| ladder.last())
            .copied()
            .unwrap_or(1)
    }
}

impl Default for CascadeRules {
    fn default() -> Self {
        Self {
            rule: EliminationRule::Classic,
            max_steps: 64,
            base_multipliers: vec![1],
            free_multipliers: vec![1],
        }
    }
}

/// Complete ruleset of one engine variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Engine id used in scene keys
    pub engine_id: String,
    pub name: String,
    /// Config document version
    pub version: u32,
    pub grid: GridSpec,
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub families: Vec<FamilyDef>,
    /// Minimum column depth for a ways win
    #[serde(default = "default_min_match")]
    pub min_match: u8,
    pub strip_sets: Vec<StripSet>,
    pub weights: ReelWeights,
    pub free_rounds: FreeRoundRules,
    #[serde(default)]
    pub cascade: CascadeRules,
    /// Stake units charged per base round (wager = stake unit × bet_units)
    pub bet_units: u32,
    /// Documented long-run return, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_rtp: Option<f64>,
}

fn default_min_match() -> u8 {
    3
}

impl GameConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: GameConfig =
            serde_yml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from disk, picking the format from the extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text)?,
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ));
            }
        };
        log::info!(
            "Loaded game config '{}' v{} from {}",
            config.engine_id,
            config.version,
            path.display()
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build the symbol table (also validates symbol/family references)
    pub fn symbol_table(&self) -> Result<SymbolTable, ConfigError> {
        SymbolTable::new(&self.symbols, &self.families)
    }

    /// Reject inconsistent configs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine_id.trim().is_empty() || self.engine_id.contains(':') {
            return Err(ConfigError::InvalidRule(format!(
                "engine id '{}' must be non-empty and free of ':'",
                self.engine_id
            )));
        }
        self.validate_grid()?;
        let table = self.symbol_table()?;
        self.validate_symbols(&table)?;
        self.validate_strips(&table)?;
        self.validate_weights()?;
        self.validate_rules(&table)?;
        Ok(())
    }

    fn validate_grid(&self) -> Result<(), ConfigError> {
        let grid = &self.grid;
        if grid.rows == 0 || grid.columns == 0 {
            return Err(ConfigError::InvalidGrid(format!(
                "{}x{} grid has no cells",
                grid.rows, grid.columns
            )));
        }
        for pos in &grid.blocked {
            if pos.row >= grid.rows || pos.column >= grid.columns {
                return Err(ConfigError::InvalidGrid(format!(
                    "blocked cell ({}, {}) outside grid",
                    pos.row, pos.column
                )));
            }
        }
        for column in 0..grid.columns {
            if grid.open_cells(column) == 0 {
                return Err(ConfigError::InvalidGrid(format!(
                    "column {column} is fully blocked"
                )));
            }
        }
        if self.min_match == 0 || self.min_match > grid.columns {
            return Err(ConfigError::InvalidRule(format!(
                "min_match {} must be within 1..={}",
                self.min_match, grid.columns
            )));
        }
        Ok(())
    }

    fn validate_symbols(&self, table: &SymbolTable) -> Result<(), ConfigError> {
        let columns = self.grid.columns as usize;
        for symbol in &self.symbols {
            if symbol.kind == SymbolKind::Regular && symbol.pays.len() != columns {
                return Err(ConfigError::InvalidSymbol {
                    symbol: symbol.id,
                    reason: format!(
                        "paytable has {} depths, grid has {columns} columns",
                        symbol.pays.len()
                    ),
                });
            }
        }
        if table.candidates().is_empty() {
            return Err(ConfigError::InvalidRule("no regular symbols".into()));
        }
        Ok(())
    }

    fn validate_strips(&self, table: &SymbolTable) -> Result<(), ConfigError> {
        if self.strip_sets.is_empty() {
            return Err(ConfigError::MissingStripData {
                strip_set: 0,
                column: 0,
            });
        }
        let columns = self.grid.columns as usize;
        for (i, set) in self.strip_sets.iter().enumerate() {
            if set.columns.len() != columns {
                return Err(ConfigError::StripColumnMismatch {
                    strip_set: i,
                    expected: columns,
                    found: set.columns.len(),
                });
            }
            for (c, strip) in set.columns.iter().enumerate() {
                if strip.is_empty() {
                    return Err(ConfigError::MissingStripData {
                        strip_set: i,
                        column: c,
                    });
                }
                if let Some(&bad) = strip.iter().find(|&&id| !table.contains(id)) {
                    return Err(ConfigError::UnknownSymbol {
                        symbol: bad,
                        context: format!("strip set '{}' column {c}", set.name),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_weights(&self) -> Result<(), ConfigError> {
        if self.weights.free.is_empty() {
            return Err(ConfigError::InvalidRule(
                "at least one free-round weight table is required".into(),
            ));
        }
        let tables = std::iter::once(&self.weights.base).chain(self.weights.free.iter());
        for table in tables {
            if table.keys.len() != table.weights.len() {
                return Err(ConfigError::WeightLengthMismatch {
                    table: table.name.clone(),
                    keys: table.keys.len(),
                    weights: table.weights.len(),
                });
            }
            if table.keys.is_empty() || table.total() == 0 {
                return Err(ConfigError::NonPositiveWeights {
                    table: table.name.clone(),
                });
            }
            if let Some(&index) = table.keys.iter().find(|&&k| k >= self.strip_sets.len()) {
                return Err(ConfigError::IndexOutOfRange {
                    table: table.name.clone(),
                    index,
                    available: self.strip_sets.len(),
                });
            }
        }
        Ok(())
    }

    fn validate_rules(&self, table: &SymbolTable) -> Result<(), ConfigError> {
        let trigger = self.free_rounds.trigger;
        match table.get(trigger).map(|s| s.kind) {
            Some(SymbolKind::Scatter) => {}
            Some(_) => {
                return Err(ConfigError::InvalidSymbol {
                    symbol: trigger,
                    reason: "free-round trigger must be a scatter".into(),
                });
            }
            None => {
                return Err(ConfigError::UnknownSymbol {
                    symbol: trigger,
                    context: "free_rounds.trigger".into(),
                });
            }
        }
        if self.free_rounds.award.min_count == 0 {
            return Err(ConfigError::InvalidRule(
                "free-round award min_count must be positive".into(),
            ));
        }
        if self.free_rounds.retrigger.is_some_and(|c| c.min_count == 0) {
            return Err(ConfigError::InvalidRule(
                "retrigger min_count must be positive".into(),
            ));
        }

        let cascade = &self.cascade;
        if cascade.max_steps == 0 {
            return Err(ConfigError::InvalidRule("max_steps must be positive".into()));
        }
        if cascade.base_multipliers.is_empty() || cascade.free_multipliers.is_empty() {
            return Err(ConfigError::InvalidRule(
                "cascade multiplier ladders must not be empty".into(),
            ));
        }
        if cascade
            .base_multipliers
            .iter()
            .chain(&cascade.free_multipliers)
            .any(|&m| m == 0)
        {
            return Err(ConfigError::InvalidRule(
                "cascade multipliers must be positive".into(),
            ));
        }
        if cascade.rule == EliminationRule::FamilyCollect && self.families.is_empty() {
            return Err(ConfigError::InvalidRule(
                "family_collect elimination needs at least one family".into(),
            ));
        }
        if self.bet_units == 0 {
            return Err(ConfigError::InvalidRule("bet_units must be positive".into()));
        }
        Ok(())
    }
}
