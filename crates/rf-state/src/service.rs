//! Spin service: the per-call host boundary
//!
//! Each call: validate → lock player → load scene → check funds → step →
//! save scene → unlock. Faults in one player's call never leak into another:
//! panics are caught and reported as internal errors, and a corrupt record is
//! deleted before the error is returned.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use rf_cascade::{CascadeEngine, SceneCodec, SceneState, SpinStepResult, StepRequest};
use rf_core::{PlayerRef, RfError, RfResult, SceneKey};

use crate::funds::FundsGuard;
use crate::locks::PlayerLocks;
use crate::store::SceneStore;

/// Default scene record lifetime (14 days)
pub const DEFAULT_SCENE_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// One caller request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinRequest {
    pub player: PlayerRef,
    pub base_stake: u64,
    pub stake_multiplier: u32,
    #[serde(default)]
    pub feature_tier: Option<usize>,
}

impl SpinRequest {
    pub fn new(player: PlayerRef, base_stake: u64, stake_multiplier: u32) -> Self {
        Self {
            player,
            base_stake,
            stake_multiplier,
            feature_tier: None,
        }
    }

    fn step_request(&self) -> StepRequest {
        StepRequest {
            base_stake: self.base_stake,
            stake_multiplier: self.stake_multiplier,
            feature_tier: self.feature_tier,
        }
    }
}

pub struct SpinService {
    engine: Arc<CascadeEngine>,
    store: Arc<dyn SceneStore>,
    funds: Arc<dyn FundsGuard>,
    locks: PlayerLocks,
    ttl: Duration,
}

impl SpinService {
    pub fn new(
        engine: Arc<CascadeEngine>,
        store: Arc<dyn SceneStore>,
        funds: Arc<dyn FundsGuard>,
    ) -> Self {
        Self {
            engine,
            store,
            funds,
            locks: PlayerLocks::new(),
            ttl: DEFAULT_SCENE_TTL,
        }
    }

    /// Builder: scene record lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn engine(&self) -> &Arc<CascadeEngine> {
        &self.engine
    }

    pub fn scene_key(&self, player: &PlayerRef) -> SceneKey {
        SceneKey::new(player, self.engine.engine_id())
    }

    /// Play one step with a fresh OS-seeded RNG
    pub fn step(&self, request: &SpinRequest) -> RfResult<SpinStepResult> {
        let mut rng = StdRng::from_os_rng();
        self.step_with_rng(request, &mut rng)
    }

    /// Play one step with a caller-supplied RNG (deterministic replay)
    pub fn step_with_rng<R: Rng + ?Sized>(
        &self,
        request: &SpinRequest,
        rng: &mut R,
    ) -> RfResult<SpinStepResult> {
        let step_request = request.step_request();
        self.engine.check_request(&step_request)?;

        let key = self.scene_key(&request.player);
        let _guard = self.locks.acquire(&key);

        panic::catch_unwind(AssertUnwindSafe(|| {
            self.locked_step(&key, request, &step_request, rng)
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            log::error!("Step for {} panicked: {message}", request.player);
            Err(RfError::Internal(message))
        })
    }

    /// Current persisted scene, if any
    pub fn scene(&self, player: &PlayerRef) -> RfResult<Option<SceneState>> {
        let key = self.scene_key(player);
        let _guard = self.locks.acquire(&key);
        match self.store.fetch(&key)? {
            Some(bytes) => Ok(Some(SceneCodec::load(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Forget a player's scene (abandoned round, operator reset)
    pub fn discard(&self, player: &PlayerRef) -> RfResult<()> {
        let key = self.scene_key(player);
        let _guard = self.locks.acquire(&key);
        self.store.remove(&key)?;
        log::info!("Discarded scene {key}");
        Ok(())
    }

    fn locked_step<R: Rng + ?Sized>(
        &self,
        key: &SceneKey,
        request: &SpinRequest,
        step_request: &StepRequest,
        rng: &mut R,
    ) -> RfResult<SpinStepResult> {
        let mut scene = self.load_scene(key)?;

        let wager = self.engine.wager_for(&scene, step_request)?;
        if wager > 0 {
            self.funds.ensure_available(&request.player, wager)?;
        }

        let result = self.engine.step(&mut scene, step_request, rng)?;
        self.store.store(key, SceneCodec::save(&scene)?, self.ttl)?;

        log::debug!(
            "{} step {} ({:?}): payout {}, round over {}",
            key,
            result.step,
            result.mode,
            result.step_payout,
            result.round_over
        );
        Ok(result)
    }

    fn load_scene(&self, key: &SceneKey) -> RfResult<SceneState> {
        let Some(bytes) = self.store.fetch(key)? else {
            return Ok(self.engine.new_scene());
        };

        let decoded = SceneCodec::load(&bytes).map_err(RfError::from).and_then(|scene| {
            scene.check(self.engine.config())?;
            Ok(scene)
        });
        match decoded {
            Ok(scene) => Ok(scene),
            Err(err) => {
                log::warn!("Deleting unusable scene record {key}: {err}");
                self.store.remove(key)?;
                Err(RfError::Persistence(format!("scene {key} was unusable: {err}")))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
