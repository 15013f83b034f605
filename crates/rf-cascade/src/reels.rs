//! Reel strips, weighted strip-set selection and the reel sampler

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::grid::{CellPos, Slot, SymbolGrid};
use crate::symbols::{SymbolId, SymbolTable};

/// One full set of reel strips (one strip per column)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripSet {
    pub name: String,
    /// Symbol IDs per column, read circularly
    pub columns: Vec<Vec<SymbolId>>,
}

impl StripSet {
    pub fn new(name: impl Into<String>, columns: Vec<Vec<SymbolId>>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Strip for one column
    pub fn strip(&self, column: usize) -> Option<&[SymbolId]> {
        self.columns.get(column).map(Vec::as_slice)
    }
}

/// Weighted selection over strip sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub name: String,
    /// Strip set indices
    pub keys: Vec<usize>,
    pub weights: Vec<u32>,
}

impl WeightTable {
    pub fn new(name: impl Into<String>, keys: Vec<usize>, weights: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            keys,
            weights,
        }
    }

    /// Single strip set with weight 1
    pub fn single(name: impl Into<String>, key: usize) -> Self {
        Self::new(name, vec![key], vec![1])
    }

    pub fn total(&self) -> u64 {
        self.weights.iter().map(|&w| u64::from(w)).sum()
    }

    /// Key covering `draw` in `[0, total)`: the first entry whose running
    /// sum exceeds the draw
    pub fn key_for_draw(&self, draw: u64) -> Option<usize> {
        let mut acc = 0u64;
        for (&key, &weight) in self.keys.iter().zip(&self.weights) {
            acc += u64::from(weight);
            if draw < acc {
                return Some(key);
            }
        }
        None
    }

    /// Draw a strip set index
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        self.key_for_draw(rng.random_range(0..total))
    }

    /// `(key, weight)` pairs
    pub fn entries(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.keys.iter().copied().zip(self.weights.iter().copied())
    }
}

/// Read position inside one column's strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelCursor {
    pub strip_set: usize,
    /// Last offset read
    pub offset: usize,
    /// Strip length (wrap point)
    pub len: usize,
}

impl ReelCursor {
    /// Step forward one position (circularly) and return the new offset
    pub fn advance(&mut self) -> usize {
        self.offset = (self.offset + 1) % self.len.max(1);
        self.offset
    }
}

/// Freshly sampled window plus the cursors that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub grid: SymbolGrid,
    pub cursors: Vec<ReelCursor>,
}

/// Builds the opening grid of a round from the configured strips
pub struct ReelSampler<'a> {
    strip_sets: &'a [StripSet],
    symbols: &'a SymbolTable,
    rows: u8,
    columns: u8,
    blocked: &'a [CellPos],
}

impl<'a> ReelSampler<'a> {
    pub fn new(
        strip_sets: &'a [StripSet],
        symbols: &'a SymbolTable,
        rows: u8,
        columns: u8,
        blocked: &'a [CellPos],
    ) -> Self {
        Self {
            strip_sets,
            symbols,
            rows,
            columns,
            blocked,
        }
    }

    /// Weighted strip-set draw, then one uniform start offset per column
    pub fn sample<R: Rng + ?Sized>(
        &self,
        table: &WeightTable,
        counters: &[u32],
        rng: &mut R,
    ) -> Result<Sample, EngineError> {
        let set = table.pick(rng).ok_or_else(|| {
            EngineError::InvalidRequest(format!("weight table '{}' is empty", table.name))
        })?;
        let strip_set = self.strip_set(set)?;

        let mut starts = Vec::with_capacity(self.columns as usize);
        for column in 0..self.columns as usize {
            let strip = strip_set
                .strip(column)
                .filter(|s| !s.is_empty())
                .ok_or(EngineError::StripOutOfRange {
                    strip_set: set,
                    column,
                })?;
            starts.push(rng.random_range(0..strip.len()));
        }
        self.sample_at(set, &starts, counters)
    }

    /// Deterministic sample from explicit start offsets
    ///
    /// Open cells of each column are filled top to bottom from consecutive
    /// strip positions; the last position read becomes the column cursor.
    pub fn sample_at(
        &self,
        set: usize,
        starts: &[usize],
        counters: &[u32],
    ) -> Result<Sample, EngineError> {
        let strip_set = self.strip_set(set)?;
        let mut grid = SymbolGrid::new(self.rows, self.columns, self.blocked);
        let mut cursors = Vec::with_capacity(self.columns as usize);

        for column in 0..self.columns {
            let col = column as usize;
            let strip = strip_set
                .strip(col)
                .filter(|s| !s.is_empty())
                .ok_or(EngineError::StripOutOfRange {
                    strip_set: set,
                    column: col,
                })?;
            let start = starts.get(col).copied().ok_or(EngineError::StripOutOfRange {
                strip_set: set,
                column: col,
            })?;

            let mut cursor = ReelCursor {
                strip_set: set,
                offset: start % strip.len(),
                len: strip.len(),
            };
            let mut first = true;
            for row in 0..self.rows {
                let pos = CellPos::new(row, column);
                if grid.get(pos) == Some(Slot::Blocked) {
                    continue;
                }
                if !first {
                    cursor.advance();
                }
                first = false;
                let symbol = self.symbols.promoted(strip[cursor.offset], counters);
                grid.set(pos, Slot::Symbol(symbol))?;
            }
            cursors.push(cursor);
        }

        Ok(Sample { grid, cursors })
    }

    fn strip_set(&self, set: usize) -> Result<&'a StripSet, EngineError> {
        self.strip_sets
            .get(set)
            .ok_or(EngineError::StripOutOfRange {
                strip_set: set,
                column: 0,
            })
    }
}

/// Advance `cursor` and read the symbol now under it
pub fn pull_next(strip_sets: &[StripSet], cursor: &mut ReelCursor, column: usize) -> Result<SymbolId, EngineError> {
    let strip = strip_sets
        .get(cursor.strip_set)
        .and_then(|s| s.strip(column))
        .filter(|s| s.len() == cursor.len && !s.is_empty())
        .ok_or(EngineError::StripOutOfRange {
            strip_set: cursor.strip_set,
            column,
        })?;
    let offset = cursor.advance();
    strip.get(offset).copied().ok_or(EngineError::StripOutOfRange {
        strip_set: cursor.strip_set,
        column,
    })
}
