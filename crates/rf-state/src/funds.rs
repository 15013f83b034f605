//! Balance checks ahead of a wager
//!
//! Money movement belongs to the host; the service only asks whether the
//! wager could be covered before it touches any scene state.

use std::collections::HashMap;

use parking_lot::RwLock;
use rf_core::{PlayerRef, RfError, RfResult};

pub trait FundsGuard: Send + Sync {
    /// `Err(InsufficientFunds)` when `amount` cannot be covered
    fn ensure_available(&self, player: &PlayerRef, amount: u64) -> RfResult<()>;
}

/// Accepts every wager
#[derive(Debug, Default, Clone, Copy)]
pub struct Unmetered;

impl FundsGuard for Unmetered {
    fn ensure_available(&self, _player: &PlayerRef, _amount: u64) -> RfResult<()> {
        Ok(())
    }
}

/// Fixed balances, e.g. mirrored from a wallet before a session
#[derive(Debug, Default)]
pub struct BalanceSheet {
    balances: RwLock<HashMap<PlayerRef, u64>>,
}

impl BalanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, player: &PlayerRef, amount: u64) {
        self.balances.write().insert(player.clone(), amount);
    }

    pub fn balance(&self, player: &PlayerRef) -> u64 {
        self.balances.read().get(player).copied().unwrap_or(0)
    }
}

impl FundsGuard for BalanceSheet {
    fn ensure_available(&self, player: &PlayerRef, amount: u64) -> RfResult<()> {
        let available = self.balance(player);
        if available < amount {
            return Err(RfError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        Ok(())
    }
}
