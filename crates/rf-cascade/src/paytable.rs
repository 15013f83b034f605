//! Ways-pay win evaluation

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::grid::{CellPos, SymbolGrid, WinMask};
use crate::symbols::{Match, SymbolId, SymbolTable};

/// One confirmed ways win
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRecord {
    /// Winning symbol ID
    pub symbol: SymbolId,
    /// Consecutive columns matched from the left
    pub depth: u8,
    /// Product of per-column match counts
    pub ways: u64,
    /// Paytable multiplier for `depth`
    pub multiplier: u32,
    /// Matching cells per column (real symbol or applicable wild)
    pub column_counts: Vec<u32>,
    /// Every cell taking part in the win
    pub cells: Vec<CellPos>,
    /// At least one matched cell was a wild
    pub wild_assisted: bool,
    /// Winning symbol belongs to a collectable family
    pub feature: bool,
}

impl WinRecord {
    /// Win in stake units before any cascade multiplier (None on overflow)
    pub fn units(&self) -> Option<u64> {
        self.ways.checked_mul(u64::from(self.multiplier))
    }
}

/// Result of evaluating one grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub records: Vec<WinRecord>,
    pub mask: WinMask,
    pub has_feature_win: bool,
    pub has_wild_win: bool,
}

impl Evaluation {
    pub fn is_win(&self) -> bool {
        !self.records.is_empty()
    }

    /// Sum of record units (None on overflow)
    pub fn total_units(&self) -> Option<u64> {
        self.records
            .iter()
            .try_fold(0u64, |acc, r| acc.checked_add(r.units()?))
    }
}

/// Scans a grid left to right for every regular symbol
pub struct WinEvaluator<'a> {
    symbols: &'a SymbolTable,
    min_match: u8,
}

impl<'a> WinEvaluator<'a> {
    pub fn new(symbols: &'a SymbolTable, min_match: u8) -> Self {
        Self { symbols, min_match }
    }

    pub fn evaluate(&self, grid: &SymbolGrid) -> Result<Evaluation, EngineError> {
        let mut records = Vec::new();
        let mut mask = WinMask::new(grid.rows(), grid.columns());

        for &candidate in self.symbols.candidates() {
            let Some(record) = self.evaluate_symbol(grid, candidate)? else {
                continue;
            };
            for &pos in &record.cells {
                mask.mark(pos, record.symbol);
            }
            records.push(record);
        }

        let has_feature_win = records.iter().any(|r| r.feature);
        let has_wild_win = records.iter().any(|r| r.wild_assisted);
        Ok(Evaluation {
            records,
            mask,
            has_feature_win,
            has_wild_win,
        })
    }

    fn evaluate_symbol(
        &self,
        grid: &SymbolGrid,
        target: SymbolId,
    ) -> Result<Option<WinRecord>, EngineError> {
        let mut column_counts = Vec::new();
        let mut cells = Vec::new();
        let mut real_seen = false;
        let mut wild_seen = false;

        for column in 0..grid.columns() {
            let slots = grid.column(column).ok_or(EngineError::CellOutOfRange {
                row: 0,
                column: column as usize,
            })?;
            let mut count = 0u32;
            for (row, slot) in slots.iter().enumerate() {
                let Some(cell) = slot.symbol() else {
                    continue;
                };
                match self.symbols.matches(cell, target) {
                    Match::Real => real_seen = true,
                    Match::Wild => wild_seen = true,
                    Match::Miss => continue,
                }
                count += 1;
                cells.push(CellPos::new(row as u8, column));
            }
            if count == 0 {
                break;
            }
            column_counts.push(count);
        }

        let depth = column_counts.len() as u8;
        // Wild-only runs pay nothing
        if depth < self.min_match || !real_seen {
            return Ok(None);
        }
        let multiplier = self.symbols.pay(target, depth);
        if multiplier == 0 {
            return Ok(None);
        }
        let ways = column_counts
            .iter()
            .try_fold(1u64, |acc, &c| acc.checked_mul(u64::from(c)))
            .ok_or(EngineError::Overflow("ways"))?;

        Ok(Some(WinRecord {
            symbol: target,
            depth,
            ways,
            multiplier,
            column_counts,
            cells,
            wild_assisted: wild_seen,
            feature: self.symbols.family_of(target).is_some(),
        }))
    }
}
