//! Tenant / player identity and scene cache keys

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RfError, RfResult};

/// Identifies one player inside one tenant (site)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerRef {
    pub tenant: String,
    pub player: String,
}

impl PlayerRef {
    /// Create a player reference, rejecting blank or separator-bearing ids
    pub fn new(tenant: impl Into<String>, player: impl Into<String>) -> RfResult<Self> {
        let tenant = tenant.into();
        let player = player.into();
        check_segment("tenant", &tenant)?;
        check_segment("player", &player)?;
        Ok(Self { tenant, player })
    }
}

impl fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant, self.player)
    }
}

/// Key of a persisted scene record: `{tenant}:{engine}:{player}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneKey(String);

impl SceneKey {
    pub fn new(player: &PlayerRef, engine_id: &str) -> Self {
        Self(format!("{}:{}:{}", player.tenant, engine_id, player.player))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn check_segment(what: &str, value: &str) -> RfResult<()> {
    if value.trim().is_empty() {
        return Err(RfError::InvalidRequest(format!("{what} id is empty")));
    }
    if value.contains(':') {
        return Err(RfError::InvalidRequest(format!(
            "{what} id must not contain ':' ({value})"
        )));
    }
    Ok(())
}
