//! Progression rules
//!
//! Pure functions for level rewards and shop prices, the shop's purchase rules,
//! plus the upgrade snapshot the simulation reads at the start of every level
//! attempt.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{BASE_JUMP_FORCE, BASE_PLAYER_SPEED};

/// Lives a fresh profile starts with
pub const BASE_MAX_LIVES: u32 = 3;
/// Highest purchasable speed/jump level
pub const MAX_STAT_UPGRADE_LEVEL: u32 = 20;
/// Highest purchasable max-lives value
pub const MAX_LIVES_UPGRADE_LEVEL: u32 = 20;

pub const UPGRADE_COST_BASE: f64 = 50.0;
pub const UPGRADE_COST_MULTIPLIER: f64 = 1.5;
pub const DOUBLE_JUMP_COST: u64 = 1000;
pub const TRIPLE_JUMP_COST: u64 = 3000;
pub const GROUND_POUND_COST: u64 = 2000;
pub const LEVEL_SKIP_COST: u64 = 1500;
/// Levels jumped over by one skip
pub const LEVEL_SKIP_AMOUNT: u32 = 10;
pub const DIAMOND_TO_POINTS_RATIO: u64 = 10;

/// Player upgrades bought in the shop (read-only inside a level)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Upgrades {
    pub speed: u32,
    pub jump: u32,
    pub double_jump: bool,
    pub triple_jump: bool,
    pub ground_pound: bool,
    pub max_lives: u32,
}

impl Default for Upgrades {
    fn default() -> Self {
        Self {
            speed: 0,
            jump: 0,
            double_jump: false,
            triple_jump: false,
            ground_pound: false,
            max_lives: BASE_MAX_LIVES,
        }
    }
}

impl Upgrades {
    /// Vertical velocity granted by each jump
    pub fn jump_force(&self) -> f32 {
        BASE_JUMP_FORCE * (0.8 + self.jump as f32 * 0.05)
    }

    /// Horizontal movement speed (units/s)
    pub fn move_speed(&self) -> f32 {
        BASE_PLAYER_SPEED * (0.8 + self.speed as f32 * 0.05)
    }

    /// Number of jumps available before touching ground again
    pub fn max_jumps(&self) -> u8 {
        match (self.double_jump, self.triple_jump) {
            (true, true) => 3,
            (true, false) => 2,
            _ => 1,
        }
    }

    /// Current price of `item`, or why it cannot be bought
    pub fn price(&self, item: Purchase) -> Result<u64, ShopError> {
        match item {
            Purchase::Speed if self.speed >= MAX_STAT_UPGRADE_LEVEL => {
                Err(ShopError::SoldOut(item))
            }
            Purchase::Speed => Ok(upgrade_cost(self.speed)),
            Purchase::Jump if self.jump >= MAX_STAT_UPGRADE_LEVEL => {
                Err(ShopError::SoldOut(item))
            }
            Purchase::Jump => Ok(upgrade_cost(self.jump)),
            Purchase::MaxLives if self.max_lives >= MAX_LIVES_UPGRADE_LEVEL => {
                Err(ShopError::SoldOut(item))
            }
            Purchase::MaxLives => Ok(max_lives_cost(self.max_lives)),
            Purchase::DoubleJump if self.double_jump => Err(ShopError::SoldOut(item)),
            Purchase::DoubleJump => Ok(DOUBLE_JUMP_COST),
            Purchase::TripleJump if self.triple_jump => Err(ShopError::SoldOut(item)),
            Purchase::TripleJump if !self.double_jump => Err(ShopError::Locked(item)),
            Purchase::TripleJump => Ok(TRIPLE_JUMP_COST),
            Purchase::GroundPound if self.ground_pound => Err(ShopError::SoldOut(item)),
            Purchase::GroundPound => Ok(GROUND_POUND_COST),
        }
    }

    /// Buy `item` with `points`; returns what was spent
    ///
    /// Nothing changes when the purchase is refused.
    pub fn buy(&mut self, item: Purchase, points: &mut u64) -> Result<u64, ShopError> {
        let cost = self.price(item)?;
        spend(points, cost)?;
        match item {
            Purchase::Speed => self.speed += 1,
            Purchase::Jump => self.jump += 1,
            Purchase::MaxLives => self.max_lives += 1,
            Purchase::DoubleJump => self.double_jump = true,
            Purchase::TripleJump => self.triple_jump = true,
            Purchase::GroundPound => self.ground_pound = true,
        }
        log::info!("Bought {:?} for {} points, {} left", item, cost, points);
        Ok(cost)
    }
}

/// Items sold in the upgrade shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purchase {
    Speed,
    Jump,
    MaxLives,
    DoubleJump,
    TripleJump,
    GroundPound,
}

impl Purchase {
    pub const ALL: [Purchase; 6] = [
        Purchase::Speed,
        Purchase::Jump,
        Purchase::MaxLives,
        Purchase::DoubleJump,
        Purchase::TripleJump,
        Purchase::GroundPound,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    #[error("{0:?} is already maxed out")]
    SoldOut(Purchase),
    #[error("{0:?} requires double jump")]
    Locked(Purchase),
    #[error("not enough points: need {cost}, have {available}")]
    InsufficientPoints { cost: u64, available: u64 },
    #[error("not enough diamonds: need {needed}, have {available}")]
    InsufficientDiamonds { needed: u64, available: u64 },
}

/// Take `cost` out of `points`, leaving it untouched when short
pub fn spend(points: &mut u64, cost: u64) -> Result<(), ShopError> {
    *points = points
        .checked_sub(cost)
        .ok_or(ShopError::InsufficientPoints {
            cost,
            available: *points,
        })?;
    Ok(())
}

/// Points granted for converting `diamonds`
pub fn diamonds_to_points(diamonds: u64) -> u64 {
    diamonds.saturating_mul(DIAMOND_TO_POINTS_RATIO)
}

/// Upgrade points awarded for finishing `level`
pub fn level_reward(level: u32) -> u32 {
    match level {
        0..5 => 2,
        5..10 => 3,
        10..20 => 4,
        20..30 => 5,
        30..40 => 6,
        _ => level / 10 + 3,
    }
}

/// `(level, reward)` pairs for a range of levels
pub fn reward_curve(levels: std::ops::RangeInclusive<u32>) -> Vec<(u32, u32)> {
    levels.map(|level| (level, level_reward(level))).collect()
}

/// Price of the next speed/jump level when `current` levels are owned
pub fn upgrade_cost(current: u32) -> u64 {
    (UPGRADE_COST_BASE * UPGRADE_COST_MULTIPLIER.powi(current as i32)).floor() as u64
}

/// Price of one more maximum life
pub fn max_lives_cost(max_lives: u32) -> u64 {
    upgrade_cost(max_lives.saturating_sub(BASE_MAX_LIVES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_reward_bands() {
        assert_eq!(level_reward(1), 2);
        assert_eq!(level_reward(4), 2);
        assert_eq!(level_reward(9), 3);
        assert_eq!(level_reward(10), 4);
        assert_eq!(level_reward(25), 5);
        assert_eq!(level_reward(39), 6);
        assert_eq!(level_reward(40), 7);
        assert_eq!(level_reward(45), 7);
        assert_eq!(level_reward(120), 15);
    }

    #[test]
    fn test_reward_curve_is_monotonic() {
        let curve = reward_curve(1..=300);
        assert_eq!(curve.len(), 300);
        for pair in curve.windows(2) {
            assert!(pair[1].1 >= pair[0].1, "reward dropped at level {}", pair[1].0);
        }
    }

    #[test]
    fn test_upgrade_costs() {
        assert_eq!(upgrade_cost(0), 50);
        assert_eq!(upgrade_cost(1), 75);
        assert_eq!(upgrade_cost(2), 112);
        assert_eq!(max_lives_cost(BASE_MAX_LIVES), 50);
    }

    #[test]
    fn test_upgrade_scaling() {
        let base = Upgrades::default();
        assert!((base.jump_force() - 4.8).abs() < 1e-5);
        assert!((base.move_speed() - 4.0).abs() < 1e-5);

        let maxed = Upgrades {
            jump: 20,
            speed: 20,
            ..Default::default()
        };
        assert!((maxed.jump_force() - 10.8).abs() < 1e-5);
        assert!((maxed.move_speed() - 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_upgrades_deserialize_with_missing_fields() {
        let upgrades: Upgrades = serde_json::from_str(r#"{"speed":3,"doubleJump":true}"#).unwrap();
        assert_eq!(upgrades.speed, 3);
        assert!(upgrades.double_jump);
        assert_eq!(upgrades.max_lives, BASE_MAX_LIVES);
        assert_eq!(upgrades.max_jumps(), 2);
    }

    #[test]
    fn test_stat_purchases_walk_the_cost_curve() {
        let mut upgrades = Upgrades::default();
        let mut points = 200;
        assert_eq!(upgrades.buy(Purchase::Speed, &mut points), Ok(50));
        assert_eq!(upgrades.buy(Purchase::Speed, &mut points), Ok(75));
        assert_eq!(upgrades.speed, 2);
        assert_eq!(points, 75);
        assert_eq!(
            upgrades.buy(Purchase::Speed, &mut points),
            Err(ShopError::InsufficientPoints {
                cost: 112,
                available: 75
            })
        );
        assert_eq!(upgrades.speed, 2);
        assert_eq!(points, 75);
    }

    #[test]
    fn test_stats_stop_at_their_cap() {
        let mut upgrades = Upgrades {
            jump: MAX_STAT_UPGRADE_LEVEL,
            max_lives: MAX_LIVES_UPGRADE_LEVEL,
            ..Default::default()
        };
        let mut points = u64::MAX;
        assert_eq!(
            upgrades.buy(Purchase::Jump, &mut points),
            Err(ShopError::SoldOut(Purchase::Jump))
        );
        assert_eq!(
            upgrades.price(Purchase::MaxLives),
            Err(ShopError::SoldOut(Purchase::MaxLives))
        );
        assert_eq!(points, u64::MAX);
    }

    #[test]
    fn test_max_lives_priced_from_base() {
        let mut upgrades = Upgrades::default();
        let mut points = 1000;
        upgrades.buy(Purchase::MaxLives, &mut points).unwrap();
        assert_eq!(upgrades.max_lives, BASE_MAX_LIVES + 1);
        assert_eq!(upgrades.price(Purchase::MaxLives), Ok(75));
    }

    #[test]
    fn test_one_time_abilities() {
        let mut upgrades = Upgrades::default();
        let mut points = 10_000;
        assert_eq!(
            upgrades.price(Purchase::TripleJump),
            Err(ShopError::Locked(Purchase::TripleJump))
        );
        assert_eq!(upgrades.buy(Purchase::DoubleJump, &mut points), Ok(DOUBLE_JUMP_COST));
        assert_eq!(upgrades.buy(Purchase::TripleJump, &mut points), Ok(TRIPLE_JUMP_COST));
        assert_eq!(upgrades.buy(Purchase::GroundPound, &mut points), Ok(GROUND_POUND_COST));
        assert_eq!(points, 4000);
        assert_eq!(upgrades.max_jumps(), 3);
        assert!(upgrades.ground_pound);

        for item in [Purchase::DoubleJump, Purchase::TripleJump, Purchase::GroundPound] {
            assert_eq!(upgrades.buy(item, &mut points), Err(ShopError::SoldOut(item)));
        }
        assert_eq!(points, 4000);
    }

    #[test]
    fn test_fresh_profile_can_price_everything_but_triple_jump() {
        let upgrades = Upgrades::default();
        let priced: Vec<_> = Purchase::ALL
            .into_iter()
            .filter(|item| upgrades.price(*item).is_ok())
            .collect();
        assert_eq!(priced.len(), 5);
        assert!(!priced.contains(&Purchase::TripleJump));
    }

    #[test]
    fn test_diamond_conversion_rate() {
        assert_eq!(diamonds_to_points(0), 0);
        assert_eq!(diamonds_to_points(7), 70);
        assert_eq!(diamonds_to_points(u64::MAX), u64::MAX);
    }
}
