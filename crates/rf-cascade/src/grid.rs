//! Visible symbol window and win masks

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::symbols::SymbolId;

/// One grid cell
///
/// Serialized as a signed integer: `-2` blocked, `-1` empty, otherwise the
/// symbol id. That keeps scene records compact and client grids readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Slot {
    /// Permanently unused cell (never sampled, eliminated or refilled)
    Blocked,
    /// Cell emptied by elimination, waiting for refill
    Empty,
    Symbol(SymbolId),
}

impl Slot {
    pub fn symbol(self) -> Option<SymbolId> {
        match self {
            Slot::Symbol(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_blocked(self) -> bool {
        self == Slot::Blocked
    }
}

impl From<Slot> for i64 {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Blocked => -2,
            Slot::Empty => -1,
            Slot::Symbol(id) => i64::from(id),
        }
    }
}

impl TryFrom<i64> for Slot {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -2 => Ok(Slot::Blocked),
            -1 => Ok(Slot::Empty),
            v => SymbolId::try_from(v)
                .map(Slot::Symbol)
                .map_err(|_| format!("invalid slot value {v}")),
        }
    }
}

/// Grid coordinate (row 0 is the top row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    pub row: u8,
    pub column: u8,
}

impl CellPos {
    pub fn new(row: u8, column: u8) -> Self {
        Self { row, column }
    }
}

/// Fixed rows × columns window, stored column-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolGrid {
    rows: u8,
    columns: u8,
    slots: Vec<Slot>,
}

impl SymbolGrid {
    /// Empty grid with the given cells blocked
    pub fn new(rows: u8, columns: u8, blocked: &[CellPos]) -> Self {
        let mut grid = Self {
            rows,
            columns,
            slots: vec![Slot::Empty; rows as usize * columns as usize],
        };
        for &pos in blocked {
            if let Some(i) = grid.index(pos) {
                grid.slots[i] = Slot::Blocked;
            }
        }
        grid
    }

    /// Build a fully populated grid from rows of symbol ids
    pub fn from_rows(rows: &[Vec<SymbolId>]) -> Self {
        let row_count = rows.len() as u8;
        let columns = rows.first().map(|r| r.len()).unwrap_or(0) as u8;
        let mut grid = Self::new(row_count, columns, &[]);
        for (r, row) in rows.iter().enumerate() {
            for (c, &id) in row.iter().enumerate().take(columns as usize) {
                grid.slots[c * row_count as usize + r] = Slot::Symbol(id);
            }
        }
        grid
    }

    /// Builder: mark cells as blocked
    pub fn with_blocked(mut self, blocked: &[CellPos]) -> Self {
        for &pos in blocked {
            if let Some(i) = self.index(pos) {
                self.slots[i] = Slot::Blocked;
            }
        }
        self
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn get(&self, pos: CellPos) -> Option<Slot> {
        self.index(pos).map(|i| self.slots[i])
    }

    pub fn symbol_at(&self, pos: CellPos) -> Option<SymbolId> {
        self.get(pos).and_then(Slot::symbol)
    }

    /// Overwrite a cell; blocked cells are immutable
    pub fn set(&mut self, pos: CellPos, slot: Slot) -> Result<(), EngineError> {
        let i = self.index(pos).ok_or(EngineError::CellOutOfRange {
            row: pos.row as usize,
            column: pos.column as usize,
        })?;
        if !self.slots[i].is_blocked() {
            self.slots[i] = slot;
        }
        Ok(())
    }

    /// Slots of one column, top to bottom
    pub fn column(&self, column: u8) -> Option<&[Slot]> {
        if column >= self.columns {
            return None;
        }
        let start = column as usize * self.rows as usize;
        Some(&self.slots[start..start + self.rows as usize])
    }

    pub(crate) fn column_mut(&mut self, column: u8) -> Option<&mut [Slot]> {
        if column >= self.columns {
            return None;
        }
        let start = column as usize * self.rows as usize;
        let rows = self.rows as usize;
        Some(&mut self.slots[start..start + rows])
    }

    /// All cell positions, column by column
    pub fn positions(&self) -> impl Iterator<Item = CellPos> + use<> {
        let rows = self.rows;
        (0..self.columns).flat_map(move |c| (0..rows).map(move |r| CellPos::new(r, c)))
    }

    /// Count symbol cells satisfying `pred`
    pub fn count_symbols(&self, mut pred: impl FnMut(SymbolId) -> bool) -> u32 {
        self.slots
            .iter()
            .filter_map(|s| s.symbol())
            .filter(|&id| pred(id))
            .count() as u32
    }

    /// Client-facing row-major view
    pub fn to_rows(&self) -> Vec<Vec<Slot>> {
        (0..self.rows)
            .map(|r| {
                (0..self.columns)
                    .map(|c| self.slots[c as usize * self.rows as usize + r as usize])
                    .collect()
            })
            .collect()
    }

    /// Apply `f` to every symbol cell in place
    pub(crate) fn map_symbols(&mut self, mut f: impl FnMut(SymbolId) -> SymbolId) {
        for slot in &mut self.slots {
            if let Slot::Symbol(id) = *slot {
                *slot = Slot::Symbol(f(id));
            }
        }
    }

    fn index(&self, pos: CellPos) -> Option<usize> {
        if pos.row < self.rows && pos.column < self.columns {
            Some(pos.column as usize * self.rows as usize + pos.row as usize)
        } else {
            None
        }
    }
}

/// Consolidated win highlight
///
/// Each cell remembers the symbol of the first win record that covered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinMask {
    rows: u8,
    columns: u8,
    owners: Vec<Option<SymbolId>>,
}

impl WinMask {
    pub fn new(rows: u8, columns: u8) -> Self {
        Self {
            rows,
            columns,
            owners: vec![None; rows as usize * columns as usize],
        }
    }

    /// Mark a cell; the first writer keeps ownership
    pub fn mark(&mut self, pos: CellPos, symbol: SymbolId) {
        if let Some(i) = self.index(pos) {
            self.owners[i].get_or_insert(symbol);
        }
    }

    pub fn owner(&self, pos: CellPos) -> Option<SymbolId> {
        self.index(pos).and_then(|i| self.owners[i])
    }

    pub fn is_set(&self, pos: CellPos) -> bool {
        self.owner(pos).is_some()
    }

    pub fn count(&self) -> usize {
        self.owners.iter().filter(|o| o.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.iter().all(Option::is_none)
    }

    fn index(&self, pos: CellPos) -> Option<usize> {
        if pos.row < self.rows && pos.column < self.columns {
            Some(pos.column as usize * self.rows as usize + pos.row as usize)
        } else {
            None
        }
    }
}
