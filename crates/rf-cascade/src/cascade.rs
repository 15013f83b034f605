//! Elimination, gravity and refill
//!
//! After a step's wins are evaluated, the elimination policy marks cells for
//! removal, surviving symbols fall to the bottom of their column (blocked
//! cells stay put), and the emptied cells are refilled from the column's reel
//! cursor, bottom-most first.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::grid::{CellPos, Slot, SymbolGrid};
use crate::paytable::{Evaluation, WinRecord};
use crate::reels::{ReelCursor, StripSet, pull_next};
use crate::symbols::{Match, SymbolTable};

/// How winning cells are removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationRule {
    /// Every non-protected cell of every win is removed
    Classic,
    /// Family symbols are collected; wilds removal depends on the mode
    FamilyCollect,
}

/// Elimination mode chosen for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationMode {
    /// Nothing to remove; the round ends
    None,
    BaseCascade,
    FreePartial,
    /// Every family is complete: wins touching a family wild clear their whole mask
    FreeFull,
}

impl EliminationMode {
    pub fn select(rule: EliminationRule, free: bool, gate_open: bool, eval: &Evaluation) -> Self {
        if !eval.is_win() {
            return EliminationMode::None;
        }
        if rule == EliminationRule::FamilyCollect && !eval.has_feature_win && !eval.has_wild_win {
            return EliminationMode::None;
        }
        match (free, gate_open) {
            (false, _) => EliminationMode::BaseCascade,
            (true, false) => EliminationMode::FreePartial,
            (true, true) => EliminationMode::FreeFull,
        }
    }
}

/// Result of resolving one cascade step
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeOutcome {
    pub mode: EliminationMode,
    /// Removed cells, sorted
    pub eliminated: Vec<CellPos>,
    /// Grid after gravity, refill and promotion (unchanged when nothing was removed)
    pub next_grid: SymbolGrid,
    /// Cells that received a fresh symbol from the strips
    pub refilled: Vec<CellPos>,
    /// False when the round ends with this step
    pub continues: bool,
}

/// Applies one elimination rule to evaluated grids
pub struct Cascade<'a> {
    symbols: &'a SymbolTable,
    strip_sets: &'a [StripSet],
    rule: EliminationRule,
}

impl<'a> Cascade<'a> {
    pub fn new(symbols: &'a SymbolTable, strip_sets: &'a [StripSet], rule: EliminationRule) -> Self {
        Self {
            symbols,
            strip_sets,
            rule,
        }
    }

    /// Eliminate, collapse and refill
    ///
    /// `counters` are bumped for collected family symbols in free rounds and
    /// never exceed their family threshold. `cursors` advance once per
    /// refilled cell.
    pub fn resolve(
        &self,
        grid: &SymbolGrid,
        eval: &Evaluation,
        free: bool,
        counters: &mut [u32],
        cursors: &mut [ReelCursor],
    ) -> Result<CascadeOutcome, EngineError> {
        let gate_open = self.symbols.all_families_complete(counters);
        let mode = EliminationMode::select(self.rule, free, gate_open, eval);
        let eliminated = match mode {
            EliminationMode::None => BTreeSet::new(),
            _ => self.mark(grid, eval, mode),
        };

        if eliminated.is_empty() {
            return Ok(CascadeOutcome {
                mode,
                eliminated: Vec::new(),
                next_grid: grid.clone(),
                refilled: Vec::new(),
                continues: false,
            });
        }

        if free {
            self.collect(grid, &eliminated, counters);
        }

        let mut next = grid.clone();
        for &pos in &eliminated {
            next.set(pos, Slot::Empty)?;
        }
        let refilled = self.collapse_and_refill(&mut next, cursors)?;
        next.map_symbols(|id| self.symbols.promoted(id, counters));

        log::debug!(
            "Cascade {:?}: removed {} cells, refilled {}",
            mode,
            eliminated.len(),
            refilled.len()
        );

        Ok(CascadeOutcome {
            mode,
            eliminated: eliminated.into_iter().collect(),
            next_grid: next,
            refilled,
            continues: true,
        })
    }

    fn mark(&self, grid: &SymbolGrid, eval: &Evaluation, mode: EliminationMode) -> BTreeSet<CellPos> {
        let mut marked = BTreeSet::new();

        if self.rule == EliminationRule::Classic {
            for record in &eval.records {
                self.mark_cells(grid, record, &mut marked, |_| true);
            }
            return marked;
        }

        let trigger_on_grid = grid.count_symbols(|id| self.symbols.is_protected(id)) > 0;
        for record in &eval.records {
            match mode {
                EliminationMode::None => {}
                EliminationMode::BaseCascade => {
                    self.mark_cells(grid, record, &mut marked, |m| match m {
                        Match::Real => record.feature,
                        Match::Wild => !trigger_on_grid,
                        Match::Miss => false,
                    });
                }
                EliminationMode::FreeFull if self.touches_family_wild(grid, record) => {
                    self.mark_cells(grid, record, &mut marked, |_| true);
                }
                EliminationMode::FreePartial | EliminationMode::FreeFull => {
                    self.mark_cells(grid, record, &mut marked, |m| {
                        m == Match::Real && record.feature
                    });
                }
            }
        }
        marked
    }

    fn touches_family_wild(&self, grid: &SymbolGrid, record: &WinRecord) -> bool {
        record.cells.iter().any(|&pos| {
            grid.symbol_at(pos).is_some_and(|id| self.symbols.is_family_wild(id))
        })
    }

    fn mark_cells(
        &self,
        grid: &SymbolGrid,
        record: &WinRecord,
        marked: &mut BTreeSet<CellPos>,
        keep: impl Fn(Match) -> bool,
    ) {
        for &pos in &record.cells {
            let Some(id) = grid.symbol_at(pos) else {
                continue;
            };
            if self.symbols.is_protected(id) {
                continue;
            }
            if keep(self.symbols.matches(id, record.symbol)) {
                marked.insert(pos);
            }
        }
    }

    fn collect(&self, grid: &SymbolGrid, eliminated: &BTreeSet<CellPos>, counters: &mut [u32]) {
        let families = self.symbols.families();
        for &pos in eliminated {
            let Some(family) = grid.symbol_at(pos).and_then(|id| self.symbols.family_of(id)) else {
                continue;
            };
            if let (Some(counter), Some(def)) = (counters.get_mut(family), families.get(family)) {
                *counter = (*counter + 1).min(def.threshold);
            }
        }
    }

    /// Gravity then refill; returns the refilled cells
    fn collapse_and_refill(
        &self,
        grid: &mut SymbolGrid,
        cursors: &mut [ReelCursor],
    ) -> Result<Vec<CellPos>, EngineError> {
        let mut refilled = Vec::new();

        for column in 0..grid.columns() {
            let col = column as usize;
            let slots = grid
                .column_mut(column)
                .ok_or(EngineError::CellOutOfRange { row: 0, column: col })?;

            let open: Vec<usize> = (0..slots.len()).filter(|&r| !slots[r].is_blocked()).collect();
            let survivors: Vec<Slot> = open
                .iter()
                .map(|&r| slots[r])
                .filter(|s| s.symbol().is_some())
                .collect();
            let gaps = open.len() - survivors.len();

            // Survivors keep their order and settle into the lowest open cells
            for (&row, slot) in open.iter().skip(gaps).zip(&survivors) {
                slots[row] = *slot;
            }
            for &row in open.iter().take(gaps) {
                slots[row] = Slot::Empty;
            }

            let cursor = cursors
                .get_mut(col)
                .ok_or(EngineError::StripOutOfRange { strip_set: 0, column: col })?;
            for &row in open.iter().take(gaps).rev() {
                let symbol = pull_next(self.strip_sets, cursor, col)?;
                slots[row] = Slot::Symbol(symbol);
                refilled.push(CellPos::new(row as u8, column));
            }
        }

        Ok(refilled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paytable::WinEvaluator;
    use crate::symbols::{FamilyDef, Symbol, SymbolId};

    const A: SymbolId = 1;
    const B: SymbolId = 2;
    const C: SymbolId = 3;
    const D: SymbolId = 4;
    const E: SymbolId = 5;
    const W: SymbolId = 9;
    const AW: SymbolId = 11;
    const S: SymbolId = 20;

    fn table() -> SymbolTable {
        let symbols = vec![
            Symbol::regular(A, "A", &[0, 0, 5]).with_family(0),
            Symbol::regular(B, "B", &[0, 0, 3]),
            Symbol::regular(C, "C", &[0, 0, 2]),
            Symbol::regular(D, "D", &[0, 0, 1]),
            Symbol::regular(E, "E", &[0, 0, 4]).with_family(0),
            Symbol::wild(W, "WILD"),
            Symbol::family_wild(AW, "A_WILD", 0),
            Symbol::scatter(S, "SCATTER"),
        ];
        let families = vec![FamilyDef {
            name: "a".into(),
            threshold: 2,
            wild: AW,
            promoted: vec![A],
        }];
        SymbolTable::new(&symbols, &families).unwrap()
    }

    fn strips() -> Vec<StripSet> {
        vec![StripSet::new(
            "s0",
            vec![vec![B, C, D], vec![C, D, B], vec![D, B, C]],
        )]
    }

    fn cursors() -> Vec<ReelCursor> {
        (0..3)
            .map(|_| ReelCursor {
                strip_set: 0,
                offset: 0,
                len: 3,
            })
            .collect()
    }

    #[test]
    fn test_no_win_is_noop_and_ends_round() {
        let table = table();
        let strips = strips();
        let grid = SymbolGrid::from_rows(&[vec![B, C, D], vec![C, D, B]]);
        let eval = WinEvaluator::new(&table, 3).evaluate(&grid).unwrap();
        let mut counters = vec![0];
        let mut reels = cursors();

        let outcome = Cascade::new(&table, &strips, EliminationRule::Classic)
            .resolve(&grid, &eval, false, &mut counters, &mut reels)
            .unwrap();
        assert_eq!(outcome.mode, EliminationMode::None);
        assert!(!outcome.continues);
        assert_eq!(outcome.next_grid, grid);
        assert_eq!(reels, cursors());
    }

    #[test]
    fn test_classic_gravity_and_refill_order() {
        let table = table();
        let strips = strips();
        // B wins across the top row; column 0 keeps C which falls to the bottom
        let grid = SymbolGrid::from_rows(&[vec![C, B, B], vec![B, C, D]]);
        let eval = WinEvaluator::new(&table, 3).evaluate(&grid).unwrap();
        let mut counters = vec![0];
        let mut cursors = cursors();

        let outcome = Cascade::new(&table, &strips, EliminationRule::Classic)
            .resolve(&grid, &eval, false, &mut counters, &mut cursors)
            .unwrap();
        assert!(outcome.continues);
        assert_eq!(
            outcome.eliminated,
            vec![CellPos::new(0, 1), CellPos::new(0, 2), CellPos::new(1, 0)]
        );
        let next = &outcome.next_grid;
        assert_eq!(next.symbol_at(CellPos::new(1, 0)), Some(C));
        assert_eq!(next.symbol_at(CellPos::new(0, 0)), Some(C));
        assert_eq!(next.symbol_at(CellPos::new(1, 1)), Some(C));
        assert_eq!(next.symbol_at(CellPos::new(0, 1)), Some(D));
        assert_eq!(next.symbol_at(CellPos::new(0, 2)), Some(B));
        assert_eq!(cursors[0].offset, 1);
        assert_eq!(cursors[1].offset, 1);
        assert_eq!(cursors[2].offset, 1);
        assert_eq!(outcome.refilled.len(), 3);
    }

    #[test]
    fn test_gravity_skips_blocked_cells() {
        let table = table();
        let strips = strips();
        let grid = SymbolGrid::from_rows(&[vec![C, B, B], vec![D, D, D], vec![B, D, D]])
            .with_blocked(&[CellPos::new(1, 0)]);
        let eval = WinEvaluator::new(&table, 3).evaluate(&grid).unwrap();
        let mut counters = vec![0];
        let mut cursors = cursors();

        let outcome = Cascade::new(&table, &strips, EliminationRule::Classic)
            .resolve(&grid, &eval, false, &mut counters, &mut cursors)
            .unwrap();
        let next = &outcome.next_grid;
        assert_eq!(next.get(CellPos::new(1, 0)), Some(Slot::Blocked));
        // C falls past the blocked cell, the refill lands on top
        assert_eq!(next.symbol_at(CellPos::new(2, 0)), Some(C));
        assert_eq!(next.symbol_at(CellPos::new(0, 0)), Some(C));
    }

    #[test]
    fn test_base_cascade_keeps_wilds_when_trigger_present() {
        let table = table();
        let strips = strips();
        let grid = SymbolGrid::from_rows(&[vec![A, W, A], vec![S, B, C]]);
        let eval = WinEvaluator::new(&table, 3).evaluate(&grid).unwrap();
        let mut counters = vec![0];
        let mut cursors = cursors();

        let outcome = Cascade::new(&table, &strips, EliminationRule::FamilyCollect)
            .resolve(&grid, &eval, false, &mut counters, &mut cursors)
            .unwrap();
        assert_eq!(outcome.mode, EliminationMode::BaseCascade);
        assert_eq!(outcome.eliminated, vec![CellPos::new(0, 0), CellPos::new(0, 2)]);
        assert_eq!(outcome.next_grid.symbol_at(CellPos::new(1, 0)), Some(S));
        assert_eq!(outcome.next_grid.symbol_at(CellPos::new(0, 1)), Some(W));
        // Base rounds never collect
        assert_eq!(counters, vec![0]);
    }

    #[test]
    fn test_base_cascade_removes_wilds_without_trigger() {
        let table = table();
        let strips = strips();
        let grid = SymbolGrid::from_rows(&[vec![A, W, A], vec![D, B, C]]);
        let eval = WinEvaluator::new(&table, 3).evaluate(&grid).unwrap();
        let mut counters = vec![0];
        let mut cursors = cursors();

        let outcome = Cascade::new(&table, &strips, EliminationRule::FamilyCollect)
            .resolve(&grid, &eval, false, &mut counters, &mut cursors)
            .unwrap();
        assert!(outcome.eliminated.contains(&CellPos::new(0, 1)));
    }

    #[test]
    fn test_free_partial_collects_and_promotes() {
        let table = table();
        let strips = vec![StripSet::new(
            "s0",
            vec![vec![A, C, D], vec![C, A, B], vec![D, B, C]],
        )];
        let grid = SymbolGrid::from_rows(&[vec![A, A, A], vec![D, B, C]]);
        let eval = WinEvaluator::new(&table, 3).evaluate(&grid).unwrap();
        let mut counters = vec![0];
        let mut cursors = cursors();

        let outcome = Cascade::new(&table, &strips, EliminationRule::FamilyCollect)
            .resolve(&grid, &eval, true, &mut counters, &mut cursors)
            .unwrap();
        assert_eq!(outcome.mode, EliminationMode::FreePartial);
        // Three collected, capped at threshold 2
        assert_eq!(counters, vec![2]);
        // Column 1 refills A, which is promoted to the family wild
        assert_eq!(outcome.next_grid.symbol_at(CellPos::new(0, 1)), Some(AW));
    }

    #[test]
    fn test_free_full_clears_only_family_wild_wins() {
        let table = table();
        let strips = strips();
        // Family complete: A is gone, E stays real next to its promoted wild.
        // B wins through the plain wild only.
        let grid = SymbolGrid::from_rows(&[vec![E, AW, E], vec![B, B, W]]);
        let eval = WinEvaluator::new(&table, 3).evaluate(&grid).unwrap();
        assert_eq!(eval.records.len(), 2);
        let mut counters = vec![2];
        let mut cursors = cursors();

        let outcome = Cascade::new(&table, &strips, EliminationRule::FamilyCollect)
            .resolve(&grid, &eval, true, &mut counters, &mut cursors)
            .unwrap();
        assert_eq!(outcome.mode, EliminationMode::FreeFull);
        assert_eq!(
            outcome.eliminated,
            vec![
                CellPos::new(0, 0),
                CellPos::new(0, 1),
                CellPos::new(0, 2),
                CellPos::new(1, 2)
            ]
        );
        assert_eq!(counters, vec![2]);
    }

    #[test]
    fn test_free_full_keeps_plain_wild_wins_and_trigger() {
        let table = table();
        let strips = strips();
        let grid = SymbolGrid::from_rows(&[vec![B, C, W], vec![S, B, D]]);
        let eval = WinEvaluator::new(&table, 3).evaluate(&grid).unwrap();
        assert!(eval.has_wild_win);
        let mut counters = vec![2];
        let mut cursors = cursors();

        let outcome = Cascade::new(&table, &strips, EliminationRule::FamilyCollect)
            .resolve(&grid, &eval, true, &mut counters, &mut cursors)
            .unwrap();
        assert_eq!(outcome.mode, EliminationMode::FreeFull);
        assert!(outcome.eliminated.is_empty());
        assert!(!outcome.continues);
        assert_eq!(outcome.next_grid, grid);
    }
}
