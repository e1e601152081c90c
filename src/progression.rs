//! Run statistics and the upgrade shop
//!
//! Stats only change by applying deltas emitted by the simulation. Upgrades
//! cost berries and get pricier with every purchase.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::sim::{Agent, GameEvent, StatDelta, UpgradeSlot, UpgradeStats};

/// Running totals for the current run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub shards: u64,
    pub berries: u64,
    pub time_survived_ms: f64,
    pub enemies_killed: u64,
}

impl GameStats {
    pub fn apply(&mut self, delta: StatDelta) {
        match delta {
            StatDelta::Shards(n) => self.shards += n as u64,
            StatDelta::Berries(n) => self.berries += n as u64,
            StatDelta::Kill => self.enemies_killed += 1,
            StatDelta::SurvivalTick(ms) => self.time_survived_ms += ms as f64,
        }
    }

    /// Apply every stat delta in `events`, ignoring other events
    pub fn apply_events(&mut self, events: &[GameEvent]) {
        for event in events {
            if let GameEvent::Stat(delta) = event {
                self.apply(*delta);
            }
        }
    }

    pub fn seconds_survived(&self) -> u64 {
        (self.time_survived_ms / 1000.0) as u64
    }
}

/// Why a purchase was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseRefusal {
    NotPlaying,
    TooExpensive { cost: u64, berries: u64 },
}

/// Upgrade shop state for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    /// Upgrades bought so far this run
    pub purchases: u32,
}

impl Shop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Price of the next upgrade, any slot
    pub fn next_cost(&self, config: &SimConfig) -> u64 {
        (config.upgrade_cost_base * config.upgrade_cost_scaling.powi(self.purchases as i32)).floor()
            as u64
    }

    pub fn can_afford(&self, stats: &GameStats, config: &SimConfig) -> bool {
        stats.berries >= self.next_cost(config)
    }

    /// Buy an upgrade: pay berries, bump the build, and heal the agent for
    /// the extra max hp
    pub fn purchase(
        &mut self,
        slot: UpgradeSlot,
        stats: &mut GameStats,
        upgrades: &mut UpgradeStats,
        agent: &mut Agent,
        config: &SimConfig,
    ) -> Result<u64, PurchaseRefusal> {
        let cost = self.next_cost(config);
        if stats.berries < cost {
            return Err(PurchaseRefusal::TooExpensive {
                cost,
                berries: stats.berries,
            });
        }

        stats.berries -= cost;
        self.purchases += 1;
        match slot {
            UpgradeSlot::MaxHp => {
                upgrades.max_hp += 20.0;
                agent.hp += 20.0;
                agent.max_hp = upgrades.max_hp;
            }
            UpgradeSlot::AttackDamage => upgrades.attack_damage += 5.0,
            UpgradeSlot::MoveSpeed => upgrades.move_speed += 0.1,
            UpgradeSlot::Orbital => upgrades.orbitals += 1,
        }
        log::info!("Purchased {:?} for {} berries", slot, cost);
        Ok(cost)
    }
}
