//! Symbol definitions, families and wild matching rules

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Symbol code as it appears on strips and grids
pub type SymbolId = u32;

/// Symbol type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SymbolKind {
    /// Regular paying symbol
    Regular,
    /// Plain wild - substitutes for any regular symbol
    Wild,
    /// Targeted wild - substitutes only for symbols of one family
    FamilyWild { family: u8 },
    /// Trigger/scatter - counted anywhere, never matched, never eliminated
    Scatter,
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique symbol ID
    pub id: SymbolId,
    /// Symbol name (e.g., "BAMBOO_3", "WILD", "SCATTER")
    pub name: String,
    /// Symbol type
    pub kind: SymbolKind,
    /// Collectable family (regular symbols only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<u8>,
    /// Pay multipliers by match depth (index 0 = depth 1)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pays: Vec<u32>,
}

impl Symbol {
    /// Create a regular symbol
    pub fn regular(id: SymbolId, name: impl Into<String>, pays: &[u32]) -> Self {
        Self {
            id,
            name: name.into(),
            kind: SymbolKind::Regular,
            family: None,
            pays: pays.to_vec(),
        }
    }

    /// Create a plain wild
    pub fn wild(id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: SymbolKind::Wild,
            family: None,
            pays: Vec::new(),
        }
    }

    /// Create a wild that only stands in for `family`
    pub fn family_wild(id: SymbolId, name: impl Into<String>, family: u8) -> Self {
        Self {
            id,
            name: name.into(),
            kind: SymbolKind::FamilyWild { family },
            family: None,
            pays: Vec::new(),
        }
    }

    /// Create a scatter/trigger symbol
    pub fn scatter(id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: SymbolKind::Scatter,
            family: None,
            pays: Vec::new(),
        }
    }

    /// Builder: assign a collectable family
    pub fn with_family(mut self, family: u8) -> Self {
        self.family = Some(family);
        self
    }

    /// Pay multiplier for a match depth (0 when unpaid)
    pub fn pay(&self, depth: u8) -> u32 {
        if depth == 0 {
            return 0;
        }
        self.pays.get(depth as usize - 1).copied().unwrap_or(0)
    }

    pub fn is_wild(&self) -> bool {
        matches!(self.kind, SymbolKind::Wild | SymbolKind::FamilyWild { .. })
    }
}

/// A collectable symbol family
///
/// During free rounds every eliminated family symbol bumps the family's
/// counter. At `threshold` the `promoted` members turn into `wild`; the
/// remaining members stay on the reels for the wild to stand in for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyDef {
    pub name: String,
    pub threshold: u32,
    /// Family-targeted wild the symbols are promoted to
    pub wild: SymbolId,
    /// Members replaced by `wild` once the family is complete
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub promoted: Vec<SymbolId>,
}

/// How a grid cell relates to a candidate symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// The cell is the candidate itself
    Real,
    /// The cell is a wild applicable to the candidate
    Wild,
    Miss,
}

/// Validated symbol lookup shared by evaluator, cascade and counters
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<SymbolId, usize>,
    candidates: Vec<SymbolId>,
    families: Vec<FamilyDef>,
}

impl SymbolTable {
    /// Build the table, checking ids and family references
    pub fn new(symbols: &[Symbol], families: &[FamilyDef]) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(symbols.len());
        for (i, symbol) in symbols.iter().enumerate() {
            if index.insert(symbol.id, i).is_some() {
                return Err(ConfigError::DuplicateSymbol(symbol.id));
            }
        }

        for symbol in symbols {
            match symbol.kind {
                SymbolKind::Regular => {
                    if let Some(family) = symbol.family {
                        if family as usize >= families.len() {
                            return Err(ConfigError::InvalidSymbol {
                                symbol: symbol.id,
                                reason: format!("unknown family {family}"),
                            });
                        }
                    }
                }
                SymbolKind::FamilyWild { family } => {
                    if family as usize >= families.len() {
                        return Err(ConfigError::InvalidSymbol {
                            symbol: symbol.id,
                            reason: format!("targets unknown family {family}"),
                        });
                    }
                }
                SymbolKind::Wild | SymbolKind::Scatter => {
                    if symbol.family.is_some() {
                        return Err(ConfigError::InvalidSymbol {
                            symbol: symbol.id,
                            reason: "only regular symbols belong to a family".into(),
                        });
                    }
                }
            }
        }

        for (i, family) in families.iter().enumerate() {
            if family.threshold == 0 {
                return Err(ConfigError::InvalidFamily {
                    family: i,
                    reason: "threshold must be positive".into(),
                });
            }
            let wild = index
                .get(&family.wild)
                .map(|&at| &symbols[at])
                .ok_or_else(|| ConfigError::UnknownSymbol {
                    symbol: family.wild,
                    context: format!("family '{}'", family.name),
                })?;
            if wild.kind != (SymbolKind::FamilyWild { family: i as u8 }) {
                return Err(ConfigError::InvalidFamily {
                    family: i,
                    reason: format!("wild {} is not a wild for this family", family.wild),
                });
            }
            for &id in &family.promoted {
                let member = index.get(&id).map(|&at| &symbols[at]);
                if member.and_then(|s| s.family) != Some(i as u8) {
                    return Err(ConfigError::InvalidFamily {
                        family: i,
                        reason: format!("promoted symbol {id} is not a member"),
                    });
                }
            }
            if symbols
                .iter()
                .filter(|s| s.family == Some(i as u8))
                .all(|s| family.promoted.contains(&s.id))
            {
                return Err(ConfigError::InvalidFamily {
                    family: i,
                    reason: "needs at least one member that is never promoted".into(),
                });
            }
        }

        let mut candidates: Vec<SymbolId> = symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Regular)
            .map(|s| s.id)
            .collect();
        candidates.sort_unstable();

        Ok(Self {
            symbols: symbols.to_vec(),
            index,
            candidates,
            families: families.to_vec(),
        })
    }

    /// Get symbol by ID
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.index.get(&id).map(|&i| &self.symbols[i])
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.index.contains_key(&id)
    }

    /// Regular symbol ids in ascending order
    pub fn candidates(&self) -> &[SymbolId] {
        &self.candidates
    }

    pub fn families(&self) -> &[FamilyDef] {
        &self.families
    }

    pub fn is_wild(&self, id: SymbolId) -> bool {
        self.get(id).is_some_and(Symbol::is_wild)
    }

    pub fn is_family_wild(&self, id: SymbolId) -> bool {
        self.get(id)
            .is_some_and(|s| matches!(s.kind, SymbolKind::FamilyWild { .. }))
    }

    /// Trigger symbols are protected from elimination in every mode
    pub fn is_protected(&self, id: SymbolId) -> bool {
        self.get(id).is_some_and(|s| s.kind == SymbolKind::Scatter)
    }

    /// Family index of a regular symbol
    pub fn family_of(&self, id: SymbolId) -> Option<usize> {
        self.get(id)
            .filter(|s| s.kind == SymbolKind::Regular)
            .and_then(|s| s.family)
            .map(usize::from)
    }

    /// Classify `cell` against the candidate `target`
    pub fn matches(&self, cell: SymbolId, target: SymbolId) -> Match {
        if cell == target {
            return Match::Real;
        }
        let Some(kind) = self.get(cell).map(|s| s.kind) else {
            return Match::Miss;
        };
        match kind {
            SymbolKind::Wild if self.is_regular(target) => Match::Wild,
            SymbolKind::FamilyWild { family } if self.family_of(target) == Some(family as usize) => {
                Match::Wild
            }
            _ => Match::Miss,
        }
    }

    /// Symbol after family promotion given the current collection counters
    ///
    /// Only a complete family's `promoted` members change.
    pub fn promoted(&self, id: SymbolId, counters: &[u32]) -> SymbolId {
        match self.family_of(id) {
            Some(family) => {
                let def = &self.families[family];
                let collected = counters.get(family).copied().unwrap_or(0);
                if collected >= def.threshold && def.promoted.contains(&id) {
                    def.wild
                } else {
                    id
                }
            }
            None => id,
        }
    }

    /// True when every tracked family has reached its threshold
    pub fn all_families_complete(&self, counters: &[u32]) -> bool {
        !self.families.is_empty()
            && self
                .families
                .iter()
                .enumerate()
                .all(|(i, f)| counters.get(i).copied().unwrap_or(0) >= f.threshold)
    }

    /// Paytable lookup: multiplier for `symbol` matched to `depth` columns
    pub fn pay(&self, symbol: SymbolId, depth: u8) -> u32 {
        self.get(symbol).map(|s| s.pay(depth)).unwrap_or(0)
    }

    fn is_regular(&self, id: SymbolId) -> bool {
        self.get(id).is_some_and(|s| s.kind == SymbolKind::Regular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        let symbols = vec![
            Symbol::regular(1, "DOT_1", &[0, 0, 5, 10, 20]).with_family(0),
            Symbol::regular(2, "DOT_2", &[0, 0, 4, 8, 16]).with_family(0),
            Symbol::regular(3, "BAMBOO", &[0, 0, 3, 6, 12]).with_family(1),
            Symbol::regular(4, "CHAR", &[0, 0, 2, 4, 8]),
            Symbol::regular(5, "BAMBOO_5", &[0, 0, 1, 2, 4]).with_family(1),
            Symbol::wild(10, "WILD"),
            Symbol::family_wild(11, "DOT_WILD", 0),
            Symbol::family_wild(12, "BAMBOO_WILD", 1),
            Symbol::scatter(20, "SCATTER"),
        ];
        let families = vec![
            FamilyDef {
                name: "dots".into(),
                threshold: 4,
                wild: 11,
                promoted: vec![2],
            },
            FamilyDef {
                name: "bamboo".into(),
                threshold: 2,
                wild: 12,
                promoted: vec![5],
            },
        ];
        SymbolTable::new(&symbols, &families).unwrap()
    }

    #[test]
    fn test_symbol_pay_by_depth() {
        let symbol = Symbol::regular(1, "X", &[0, 0, 5, 8, 12]);
        assert_eq!(symbol.pay(0), 0);
        assert_eq!(symbol.pay(2), 0);
        assert_eq!(symbol.pay(3), 5);
        assert_eq!(symbol.pay(5), 12);
        assert_eq!(symbol.pay(6), 0);
    }

    #[test]
    fn test_plain_wild_matches_any_regular() {
        let table = table();
        assert_eq!(table.matches(10, 1), Match::Wild);
        assert_eq!(table.matches(10, 4), Match::Wild);
        assert_eq!(table.matches(4, 4), Match::Real);
        assert_eq!(table.matches(3, 4), Match::Miss);
    }

    #[test]
    fn test_family_wild_does_not_cross_families() {
        let table = table();
        assert_eq!(table.matches(11, 1), Match::Wild);
        assert_eq!(table.matches(11, 2), Match::Wild);
        assert_eq!(table.matches(11, 3), Match::Miss);
        assert_eq!(table.matches(12, 3), Match::Wild);
        assert_eq!(table.matches(12, 4), Match::Miss);
    }

    #[test]
    fn test_scatter_never_substituted() {
        let table = table();
        assert_eq!(table.matches(10, 20), Match::Miss);
        assert!(table.is_protected(20));
        assert!(!table.candidates().contains(&20));
    }

    #[test]
    fn test_candidates_ascending() {
        assert_eq!(table().candidates(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_promotion_at_threshold() {
        let table = table();
        assert_eq!(table.promoted(5, &[0, 1]), 5);
        assert_eq!(table.promoted(5, &[0, 2]), 12);
        // Unpromoted members stay real for the family wild to serve
        assert_eq!(table.promoted(3, &[0, 2]), 3);
        assert_eq!(table.matches(12, 3), Match::Wild);
        assert_eq!(table.promoted(4, &[9, 9]), 4);
        assert!(!table.all_families_complete(&[3, 2]));
        assert!(table.all_families_complete(&[4, 2]));
    }

    #[test]
    fn test_rejects_duplicate_and_dangling_family() {
        let dup = vec![Symbol::wild(1, "A"), Symbol::wild(1, "B")];
        assert!(matches!(
            SymbolTable::new(&dup, &[]),
            Err(ConfigError::DuplicateSymbol(1))
        ));

        let dangling = vec![Symbol::regular(1, "A", &[0, 0, 1]).with_family(3)];
        assert!(SymbolTable::new(&dangling, &[]).is_err());
    }

    #[test]
    fn test_rejects_bad_promotion_lists() {
        let symbols = vec![
            Symbol::regular(1, "DOT_1", &[0, 0, 5]).with_family(0),
            Symbol::regular(2, "DOT_2", &[0, 0, 4]).with_family(0),
            Symbol::regular(3, "CHAR", &[0, 0, 2]),
            Symbol::family_wild(11, "DOT_WILD", 0),
        ];
        let family = |promoted: Vec<SymbolId>| {
            vec![FamilyDef {
                name: "dots".into(),
                threshold: 3,
                wild: 11,
                promoted,
            }]
        };

        assert!(SymbolTable::new(&symbols, &family(vec![2])).is_ok());
        // Every member promoted leaves the wild nothing to substitute for
        assert!(matches!(
            SymbolTable::new(&symbols, &family(vec![1, 2])),
            Err(ConfigError::InvalidFamily { family: 0, .. })
        ));
        assert!(matches!(
            SymbolTable::new(&symbols, &family(vec![3])),
            Err(ConfigError::InvalidFamily { family: 0, .. })
        ));
    }
}
