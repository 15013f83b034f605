//! Batch statistics and the final report

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cascade length buckets (the last bucket collects longer chains)
pub const CASCADE_BUCKETS: usize = 12;

/// Additive counters for a batch of rounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimStats {
    /// Paid base rounds
    pub rounds: u64,
    pub total_wager: u64,
    pub total_win: u64,
    pub base_win: u64,
    pub free_win: u64,
    /// Paid rounds whose session won anything
    pub hits: u64,
    pub feature_triggers: u64,
    pub free_rounds_played: u64,
    /// Steps over all base rounds
    pub base_steps: u64,
    /// Largest single-session win
    pub max_win: u64,
    /// Base rounds by step count (index 0 = single step)
    pub cascade_histogram: Vec<u64>,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            rounds: 0,
            total_wager: 0,
            total_win: 0,
            base_win: 0,
            free_win: 0,
            hits: 0,
            feature_triggers: 0,
            free_rounds_played: 0,
            base_steps: 0,
            max_win: 0,
            cascade_histogram: vec![0; CASCADE_BUCKETS],
        }
    }
}

impl SimStats {
    /// Record one base round's step count
    pub fn record_steps(&mut self, steps: u32) {
        self.base_steps += u64::from(steps);
        let bucket = (steps.max(1) as usize - 1).min(CASCADE_BUCKETS - 1);
        self.cascade_histogram[bucket] += 1;
    }

    /// Fold another batch into this one
    pub fn merge(mut self, other: SimStats) -> SimStats {
        self.rounds += other.rounds;
        self.total_wager += other.total_wager;
        self.total_win += other.total_win;
        self.base_win += other.base_win;
        self.free_win += other.free_win;
        self.hits += other.hits;
        self.feature_triggers += other.feature_triggers;
        self.free_rounds_played += other.free_rounds_played;
        self.base_steps += other.base_steps;
        self.max_win = self.max_win.max(other.max_win);
        for (mine, theirs) in self.cascade_histogram.iter_mut().zip(&other.cascade_histogram) {
            *mine += theirs;
        }
        self
    }

    /// Return to player as a fraction of wager
    pub fn rtp(&self) -> f64 {
        ratio(self.total_win, self.total_wager)
    }

    pub fn base_rtp(&self) -> f64 {
        ratio(self.base_win, self.total_wager)
    }

    pub fn free_rtp(&self) -> f64 {
        ratio(self.free_win, self.total_wager)
    }

    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.rounds)
    }

    pub fn trigger_rate(&self) -> f64 {
        ratio(self.feature_triggers, self.rounds)
    }

    pub fn avg_cascade_length(&self) -> f64 {
        ratio(self.base_steps, self.rounds)
    }

    /// Largest session win relative to one round's wager
    pub fn max_win_ratio(&self) -> f64 {
        if self.rounds == 0 {
            return 0.0;
        }
        let wager_per_round = self.total_wager as f64 / self.rounds as f64;
        if wager_per_round > 0.0 {
            self.max_win as f64 / wager_per_round
        } else {
            0.0
        }
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}

/// Human/JSON report of a finished simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimReport {
    pub engine_id: String,
    pub seed: u64,
    pub threads: usize,
    pub base_only: bool,
    pub rounds: u64,
    pub rtp: f64,
    pub base_rtp: f64,
    pub free_rtp: f64,
    pub hit_rate: f64,
    pub trigger_rate: f64,
    pub avg_cascade_length: f64,
    pub max_win_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_rtp: Option<f64>,
    pub elapsed_secs: f64,
    pub stats: SimStats,
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Engine:            {}", self.engine_id)?;
        writeln!(
            f,
            "Rounds:            {} (seed {}, {} threads{})",
            self.rounds,
            self.seed,
            self.threads,
            if self.base_only { ", base only" } else { "" }
        )?;
        writeln!(f, "RTP:               {:.4}%", self.rtp * 100.0)?;
        writeln!(f, "  base:            {:.4}%", self.base_rtp * 100.0)?;
        writeln!(f, "  free rounds:     {:.4}%", self.free_rtp * 100.0)?;
        if let Some(target) = self.target_rtp {
            writeln!(f, "  target:          {:.4}%", target * 100.0)?;
        }
        writeln!(f, "Hit rate:          {:.2}%", self.hit_rate * 100.0)?;
        writeln!(
            f,
            "Trigger rate:      1 in {:.1}",
            if self.trigger_rate > 0.0 {
                1.0 / self.trigger_rate
            } else {
                f64::INFINITY
            }
        )?;
        writeln!(f, "Avg cascade steps: {:.3}", self.avg_cascade_length)?;
        writeln!(f, "Max win:           {:.1}x", self.max_win_ratio)?;
        writeln!(f, "Cascade histogram:")?;
        for (i, count) in self.stats.cascade_histogram.iter().enumerate() {
            let label = if i + 1 == CASCADE_BUCKETS {
                format!("{}+", i + 1)
            } else {
                (i + 1).to_string()
            };
            writeln!(f, "  {label:>4} steps: {count}")?;
        }
        write!(f, "Elapsed:           {:.2}s", self.elapsed_secs)
    }
}
