//! Built-in game configurations
//!
//! Strips are generated from per-column symbol counts so presets stay
//! readable and reproducible.

use crate::cascade::EliminationRule;
use crate::config::{
    AwardCurve, CascadeRules, FreeRoundRules, GameConfig, GridSpec, ReelWeights,
};
use crate::reels::{StripSet, WeightTable};
use crate::symbols::{FamilyDef, Symbol, SymbolId};

pub const WILD: SymbolId = 10;
pub const SCATTER: SymbolId = 20;

/// Get all built-in presets
pub fn all_presets() -> Vec<GameConfig> {
    vec![demo_ways(), classic_ways(), toy_ways()]
}

/// Look up a preset by engine id
pub fn by_name(name: &str) -> Option<GameConfig> {
    match name {
        "demo" | "demo_ways" => Some(demo_ways()),
        "classic" | "classic_ways" => Some(classic_ways()),
        "toy" | "toy_ways" => Some(toy_ways()),
        _ => None,
    }
}

/// 5×4 family-collect game with targeted wilds and tiered free rounds
pub fn demo_ways() -> GameConfig {
    let symbols = vec![
        Symbol::regular(1, "RED_DRAGON", &[0, 0, 20, 40, 80]),
        Symbol::regular(2, "GREEN_DRAGON", &[0, 0, 15, 30, 60]),
        Symbol::regular(3, "DOT_2", &[0, 0, 6, 12, 25]).with_family(0),
        Symbol::regular(4, "DOT_5", &[0, 0, 4, 8, 15]).with_family(0),
        Symbol::regular(5, "BAMBOO_2", &[0, 0, 6, 12, 25]).with_family(1),
        Symbol::regular(6, "BAMBOO_5", &[0, 0, 4, 8, 15]).with_family(1),
        Symbol::regular(7, "CHAR_2", &[0, 0, 3, 6, 10]).with_family(2),
        Symbol::regular(8, "CHAR_5", &[0, 0, 2, 4, 8]).with_family(2),
        Symbol::wild(WILD, "WILD"),
        Symbol::family_wild(11, "DOT_WILD", 0),
        Symbol::family_wild(12, "BAMBOO_WILD", 1),
        Symbol::family_wild(13, "CHAR_WILD", 2),
        Symbol::scatter(SCATTER, "SCATTER"),
    ];
    let families = vec![
        // The low "5" tiles turn wild; the "2" tiles stay for the wild to serve
        family("dots", 12, 11, &[4]),
        family("bamboo", 12, 12, &[6]),
        family("characters", 15, 13, &[8]),
    ];

    // (red, green, dot2, dot5, bam2, bam5, char2, char5, wild, scatter)
    let base_a = [2, 3, 5, 6, 5, 6, 6, 7, 2, 2];
    let base_b = [2, 2, 5, 6, 5, 6, 7, 7, 1, 3];
    let free_a = [2, 3, 5, 6, 5, 6, 6, 7, 3, 2];
    let free_b = [3, 4, 5, 5, 5, 5, 6, 6, 4, 2];
    let ids = [1, 2, 3, 4, 5, 6, 7, 8, WILD, SCATTER];

    let strip_sets = [
        ("base_a", base_a),
        ("base_b", base_b),
        ("free_a", free_a),
        ("free_b", free_b),
    ]
    .into_iter()
    .map(|(name, counts)| {
        let columns = (0..5)
            .map(|c| {
                // No wilds on the first column
                let counts: Vec<(SymbolId, usize)> = ids
                    .iter()
                    .zip(counts)
                    .map(|(&id, n)| (id, if id == WILD && c == 0 { 0 } else { n }))
                    .collect();
                spread(&counts, c)
            })
            .collect();
        StripSet::new(name, columns)
    })
    .collect();

    GameConfig {
        engine_id: "demo_ways".to_string(),
        name: "Demo Ways".to_string(),
        version: 1,
        grid: GridSpec::new(4, 5),
        symbols,
        families,
        min_match: 3,
        strip_sets,
        weights: ReelWeights {
            base: WeightTable::new("base", vec![0, 1], vec![3, 1]),
            free: vec![
                WeightTable::single("free_standard", 2),
                WeightTable::new("free_boosted", vec![2, 3], vec![1, 1]),
            ],
        },
        free_rounds: FreeRoundRules {
            trigger: SCATTER,
            count_wilds: false,
            award: AwardCurve {
                min_count: 3,
                base_award: 10,
                per_extra_award: 2,
            },
            retrigger: Some(AwardCurve {
                min_count: 3,
                base_award: 5,
                per_extra_award: 1,
            }),
        },
        cascade: CascadeRules {
            rule: EliminationRule::FamilyCollect,
            max_steps: 50,
            base_multipliers: vec![1, 2, 3, 5],
            free_multipliers: vec![2, 4, 6, 10],
        },
        bet_units: 20,
        target_rtp: None,
    }
}

/// 5×5 classic cascade with trimmed corners and a plain wild
pub fn classic_ways() -> GameConfig {
    let symbols = vec![
        Symbol::regular(1, "CROWN", &[0, 0, 25, 50, 100]),
        Symbol::regular(2, "BELL", &[0, 0, 15, 30, 60]),
        Symbol::regular(3, "BAR", &[0, 0, 10, 20, 40]),
        Symbol::regular(4, "CHERRY", &[0, 0, 5, 10, 20]),
        Symbol::regular(5, "PLUM", &[0, 0, 4, 8, 15]),
        Symbol::regular(6, "LEMON", &[0, 0, 3, 6, 10]),
        Symbol::wild(WILD, "WILD"),
        Symbol::scatter(SCATTER, "SCATTER"),
    ];
    let ids = [1, 2, 3, 4, 5, 6, WILD, SCATTER];
    let counts = [2, 3, 5, 7, 8, 9, 2, 2];
    let columns = (0..5)
        .map(|c| {
            let counts: Vec<(SymbolId, usize)> = ids.iter().copied().zip(counts).collect();
            spread(&counts, c)
        })
        .collect();

    GameConfig {
        engine_id: "classic_ways".to_string(),
        name: "Classic Ways".to_string(),
        version: 1,
        grid: GridSpec::new(5, 5).with_blocked_corners(),
        symbols,
        families: Vec::new(),
        min_match: 3,
        strip_sets: vec![StripSet::new("main", columns)],
        weights: ReelWeights {
            base: WeightTable::single("base", 0),
            free: vec![WeightTable::single("free", 0)],
        },
        free_rounds: FreeRoundRules {
            trigger: SCATTER,
            count_wilds: false,
            award: AwardCurve {
                min_count: 3,
                base_award: 8,
                per_extra_award: 2,
            },
            retrigger: None,
        },
        cascade: CascadeRules {
            rule: EliminationRule::Classic,
            max_steps: 50,
            base_multipliers: vec![1, 2, 3, 4, 5],
            free_multipliers: vec![3, 6, 9, 12, 15],
        },
        bet_units: 25,
        target_rtp: None,
    }
}

/// 3×3 toy game small enough for exact enumeration
///
/// Scatters never appear on the strips, so every round is a base round.
pub fn toy_ways() -> GameConfig {
    const A: SymbolId = 1;
    const B: SymbolId = 2;
    const C: SymbolId = 3;
    const D: SymbolId = 4;
    const W: SymbolId = 9;

    let symbols = vec![
        Symbol::regular(A, "A", &[0, 0, 8]),
        Symbol::regular(B, "B", &[0, 0, 5]),
        Symbol::regular(C, "C", &[0, 0, 3]),
        Symbol::regular(D, "D", &[0, 0, 2]),
        Symbol::wild(W, "WILD"),
        Symbol::scatter(SCATTER, "SCATTER"),
    ];
    let strip_sets = vec![
        StripSet::new(
            "toy_a",
            vec![
                vec![A, B, C, D, B, C, D, C, D, D, C, B],
                vec![D, C, W, B, A, D, C, B, D, C, A, D],
                vec![C, D, A, B, C, D, B, C, D, A, D, C],
            ],
        ),
        StripSet::new(
            "toy_b",
            vec![
                vec![B, C, D, A, D, C, B, D, C, D],
                vec![C, D, B, W, D, C, A, D, B, C],
                vec![D, B, C, D, A, C, D, B, C, D],
            ],
        ),
    ];

    GameConfig {
        engine_id: "toy_ways".to_string(),
        name: "Toy Ways".to_string(),
        version: 1,
        grid: GridSpec::new(3, 3),
        symbols,
        families: Vec::new(),
        min_match: 3,
        strip_sets,
        weights: ReelWeights {
            base: WeightTable::new("base", vec![0, 1], vec![2, 1]),
            free: vec![WeightTable::single("free", 0)],
        },
        free_rounds: FreeRoundRules {
            trigger: SCATTER,
            count_wilds: false,
            award: AwardCurve {
                min_count: 3,
                base_award: 5,
                per_extra_award: 1,
            },
            retrigger: None,
        },
        cascade: CascadeRules {
            rule: EliminationRule::Classic,
            max_steps: 20,
            base_multipliers: vec![1],
            free_multipliers: vec![1],
        },
        bet_units: 125,
        // Exact base return from full enumeration
        target_rtp: Some(0.9789725432098766),
    }
}

fn family(name: &str, threshold: u32, wild: SymbolId, promoted: &[SymbolId]) -> FamilyDef {
    FamilyDef {
        name: name.to_string(),
        threshold,
        wild,
        promoted: promoted.to_vec(),
    }
}

/// Interleave symbol counts into one strip; `column` rotates the result
fn spread(counts: &[(SymbolId, usize)], column: usize) -> Vec<SymbolId> {
    let pool: Vec<SymbolId> = counts
        .iter()
        .flat_map(|&(id, n)| std::iter::repeat_n(id, n))
        .collect();
    let len = pool.len();
    if len == 0 {
        return pool;
    }
    let stride = [7, 11, 13, 17, 19]
        .into_iter()
        .find(|&s| gcd(s, len) == 1)
        .unwrap_or(1);
    let mut strip: Vec<SymbolId> = (0..len).map(|i| pool[(i * stride) % len]).collect();
    strip.rotate_left((column * 5) % len);
    strip
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spread_keeps_counts() {
        let strip = spread(&[(1, 3), (2, 5), (3, 1)], 2);
        assert_eq!(strip.len(), 9);
        assert_eq!(strip.iter().filter(|&&s| s == 1).count(), 3);
        assert_eq!(strip.iter().filter(|&&s| s == 2).count(), 5);
        assert_eq!(strip.iter().filter(|&&s| s == 3).count(), 1);
    }

    #[test]
    fn test_demo_first_column_has_no_wild() {
        let config = demo_ways();
        for set in &config.strip_sets {
            assert!(!set.columns[0].contains(&WILD));
            assert!(set.columns[1].contains(&WILD));
        }
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("toy").map(|c| c.engine_id), Some("toy_ways".into()));
        assert!(by_name("missing").is_none());
        assert_eq!(all_presets().len(), 3);
    }
}
