//! Trigger counting and free-round settlement

use crate::config::FreeRoundRules;
use crate::grid::{CellPos, SymbolGrid};
use crate::symbols::{SymbolId, SymbolTable};

/// Outcome of settling a finished round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    /// Trigger count the award was computed from
    pub triggers: u32,
    /// Free rounds awarded by this round
    pub awarded: u32,
    /// Free rounds left after this round
    pub remaining: u32,
    /// True while free rounds remain
    pub feature_active: bool,
}

/// Counts trigger symbols and converts them into free-round awards
pub struct FeatureCounter<'a> {
    rules: &'a FreeRoundRules,
    symbols: &'a SymbolTable,
}

impl<'a> FeatureCounter<'a> {
    pub fn new(rules: &'a FreeRoundRules, symbols: &'a SymbolTable) -> Self {
        Self { rules, symbols }
    }

    fn is_trigger(&self, id: SymbolId) -> bool {
        id == self.rules.trigger || (self.rules.count_wilds && self.symbols.is_wild(id))
    }

    /// Trigger symbols anywhere on the grid
    pub fn count_triggers(&self, grid: &SymbolGrid) -> u32 {
        grid.count_symbols(|id| self.is_trigger(id))
    }

    /// Trigger symbols among the given cells (used for refills)
    pub fn count_in(&self, grid: &SymbolGrid, cells: &[CellPos]) -> u32 {
        cells
            .iter()
            .filter_map(|&pos| grid.symbol_at(pos))
            .filter(|&id| self.is_trigger(id))
            .count() as u32
    }

    /// Settle a round that just ended
    ///
    /// Base rounds award from the settled grid. Free rounds consume one round
    /// and may retrigger from the triggers collected over the whole round.
    pub fn settle(
        &self,
        free: bool,
        settled: &SymbolGrid,
        round_triggers: u32,
        remaining: u32,
    ) -> Settlement {
        let (triggers, awarded, remaining) = if free {
            let awarded = self
                .rules
                .retrigger
                .map(|curve| curve.award(round_triggers))
                .unwrap_or(0);
            (
                round_triggers,
                awarded,
                remaining.saturating_sub(1).saturating_add(awarded),
            )
        } else {
            let triggers = self.count_triggers(settled);
            let awarded = self.rules.award.award(triggers);
            (triggers, awarded, remaining.saturating_add(awarded))
        };

        Settlement {
            triggers,
            awarded,
            remaining,
            feature_active: remaining > 0,
        }
    }
}
