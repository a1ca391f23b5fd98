//! Player ball: jump chain, ground pound, rolling and the respawn anchor

use std::collections::BTreeSet;

use glam::{Quat, Vec2, Vec3};

use super::entity::EntityId;
use crate::Upgrades;
use crate::consts::{GROUND_POUND_VELOCITY, INVULNERABILITY_DURATION, PLAYER_RADIUS};

/// Where the player comes back after losing a life
#[derive(Debug, Clone, PartialEq)]
pub struct RespawnAnchor {
    pub position: Vec3,
    /// Apple ids already collected when the anchor was set
    pub collected: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub position: Vec3,
    /// Vertical part is integrated; horizontal part mirrors input
    pub velocity: Vec3,
    /// Rolling orientation
    pub rotation: Quat,
    /// Jumps used since last touching ground (0..=3)
    pub jumps: u8,
    pub grounded: bool,
    /// Platform currently stood on
    pub ground: Option<EntityId>,
    pub pounding: bool,
    /// Jump input state last tick, for edge detection
    pub jump_held: bool,
    /// Seconds of damage immunity left
    pub invulnerable: f32,
    pub lives: u32,
    /// Apples collected this attempt
    pub score: u32,
    pub anchor: RespawnAnchor,
}

impl Player {
    pub fn new(start: Vec3, lives: u32) -> Self {
        Self {
            position: start,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            jumps: 0,
            grounded: false,
            ground: None,
            pounding: false,
            jump_held: false,
            invulnerable: 0.0,
            lives,
            score: 0,
            anchor: RespawnAnchor {
                position: start,
                collected: BTreeSet::new(),
            },
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0.0
    }

    pub fn tick_invulnerability(&mut self, dt: f32) {
        self.invulnerable = (self.invulnerable - dt).max(0.0);
    }

    /// Confirmed ground contact at height `top`
    pub fn land(&mut self, top: f32, platform: EntityId) {
        self.position.y = top + PLAYER_RADIUS;
        self.velocity.y = 0.0;
        self.jumps = 0;
        self.grounded = true;
        self.ground = Some(platform);
    }

    pub fn leave_ground(&mut self) {
        self.grounded = false;
        self.ground = None;
    }

    /// Handle the jump input; returns the new chain length when a jump is granted
    ///
    /// Only a press (released last tick, held now) counts. Holding the button
    /// never chains jumps.
    pub fn try_jump(&mut self, pressed: bool, upgrades: &Upgrades) -> Option<u8> {
        let edge = pressed && !self.jump_held;
        self.jump_held = pressed;
        if !edge || self.pounding {
            return None;
        }
        let next = if self.grounded {
            1
        } else {
            match self.jumps {
                1 if upgrades.double_jump => 2,
                2 if upgrades.triple_jump => 3,
                _ => return None,
            }
        };
        self.jumps = next;
        self.velocity.y = upgrades.jump_force();
        self.leave_ground();
        Some(next)
    }

    /// Start a ground pound if airborne, owned and not already pounding
    pub fn try_ground_pound(&mut self, pressed: bool, upgrades: &Upgrades) -> bool {
        if pressed && !self.grounded && upgrades.ground_pound && !self.pounding {
            self.pounding = true;
            self.velocity.y = GROUND_POUND_VELOCITY;
            true
        } else {
            false
        }
    }

    /// Move horizontally by `input * speed * dt` and roll to match
    pub fn walk(&mut self, input: Vec2, speed: f32, dt: f32) {
        let delta = Vec3::new(input.x, 0.0, -input.y) * speed * dt;
        self.velocity.x = input.x * speed;
        self.velocity.z = -input.y * speed;
        self.position += delta;
        self.roll(delta);
    }

    /// Rotate like a ball rolling along `delta`
    pub fn roll(&mut self, delta: Vec3) {
        let distance = delta.length();
        if distance <= f32::EPSILON {
            return;
        }
        let axis = Vec3::Y.cross(delta / distance);
        let turn = Quat::from_axis_angle(axis, distance / PLAYER_RADIUS);
        self.rotation = (turn * self.rotation).normalize();
    }

    /// Lose one life; `true` if any remain
    pub fn hurt(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.lives > 0
    }

    /// Put the player back at the anchor with a fresh invulnerability window
    pub fn respawn(&mut self) {
        self.position = self.anchor.position;
        self.velocity = Vec3::ZERO;
        self.jumps = 0;
        self.pounding = false;
        self.leave_ground();
        self.score = self.anchor.collected.len() as u32;
        self.invulnerable = INVULNERABILITY_DURATION;
    }

    pub fn set_anchor(&mut self, position: Vec3, collected: BTreeSet<String>) {
        self.anchor = RespawnAnchor {
            position,
            collected,
        };
    }

    /// Blink while invulnerable
    pub fn blink_visible(&self) -> bool {
        !self.is_invulnerable() || (self.invulnerable * 10.0).floor() as i64 % 2 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded_player() -> Player {
        let mut p = Player::new(Vec3::new(0.0, 1.0, 0.0), 3);
        p.land(0.5, EntityId(1));
        p
    }

    fn all_jumps() -> Upgrades {
        Upgrades {
            double_jump: true,
            triple_jump: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_second_jump_refused_without_upgrade() {
        let upgrades = Upgrades::default();
        let mut p = grounded_player();
        assert_eq!(p.try_jump(true, &upgrades), Some(1));
        p.try_jump(false, &upgrades);
        p.velocity.y = -1.0;
        assert_eq!(p.try_jump(true, &upgrades), None);
        assert_eq!(p.velocity.y, -1.0);
        assert_eq!(p.jumps, 1);
    }

    #[test]
    fn test_jump_chain_caps_at_three() {
        let upgrades = all_jumps();
        let mut p = grounded_player();
        let mut granted = Vec::new();
        for _ in 0..5 {
            granted.push(p.try_jump(true, &upgrades));
            p.try_jump(false, &upgrades);
        }
        assert_eq!(granted, vec![Some(1), Some(2), Some(3), None, None]);
    }

    #[test]
    fn test_held_jump_does_not_repeat() {
        let upgrades = all_jumps();
        let mut p = grounded_player();
        assert_eq!(p.try_jump(true, &upgrades), Some(1));
        assert_eq!(p.try_jump(true, &upgrades), None);
        assert_eq!(p.jumps, 1);
    }

    #[test]
    fn test_triple_needs_double_flag_chain() {
        // Triple without double cannot reach the third jump
        let upgrades = Upgrades {
            triple_jump: true,
            ..Default::default()
        };
        let mut p = grounded_player();
        p.try_jump(true, &upgrades);
        p.try_jump(false, &upgrades);
        assert_eq!(p.try_jump(true, &upgrades), None);
    }

    #[test]
    fn test_landing_resets_chain() {
        let upgrades = all_jumps();
        let mut p = grounded_player();
        p.try_jump(true, &upgrades);
        p.try_jump(false, &upgrades);
        p.try_jump(true, &upgrades);
        assert_eq!(p.jumps, 2);
        p.land(0.5, EntityId(2));
        assert_eq!(p.jumps, 0);
        assert_eq!(p.ground, Some(EntityId(2)));
    }

    #[test]
    fn test_ground_pound_gates() {
        let owned = Upgrades {
            ground_pound: true,
            ..Default::default()
        };
        let mut p = grounded_player();
        assert!(!p.try_ground_pound(true, &owned));
        p.leave_ground();
        assert!(!p.try_ground_pound(true, &Upgrades::default()));
        assert!(p.try_ground_pound(true, &owned));
        assert_eq!(p.velocity.y, GROUND_POUND_VELOCITY);
        assert!(!p.try_ground_pound(true, &owned));
        // No jumping out of a pound
        assert_eq!(p.try_jump(true, &all_jumps()), None);
    }

    #[test]
    fn test_respawn_restores_anchor_score() {
        let mut p = grounded_player();
        let collected: BTreeSet<String> = ["apple-1".to_string()].into_iter().collect();
        p.set_anchor(Vec3::new(5.0, 2.0, -10.0), collected);
        p.score = 4;
        assert!(p.hurt());
        p.respawn();
        assert_eq!(p.position, Vec3::new(5.0, 2.0, -10.0));
        assert_eq!(p.score, 1);
        assert!(p.is_invulnerable());
        assert_eq!(p.lives, 2);
    }

    #[test]
    fn test_zero_input_does_not_roll() {
        let mut p = grounded_player();
        p.walk(Vec2::ZERO, 5.0, 0.016);
        assert_eq!(p.rotation, Quat::IDENTITY);
        p.walk(Vec2::new(1.0, 0.0), 5.0, 0.1);
        assert!(p.rotation != Quat::IDENTITY);
        assert!((p.position.x - 0.5).abs() < 1e-6);
    }
}
