//! Game state for one level attempt
//!
//! Built from a [`LevelData`] snapshot and owned by the loop until the attempt
//! ends. Loading another level discards the whole state.

use std::collections::BTreeSet;

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::{Boss, EyeColor};
use super::entity::{Entity, EntityId, EntityKind, EntityRegistry, RenderItem, Transform};
use super::level::LevelData;
use super::player::Player;
use crate::consts::*;
use crate::resources::ResourceProvider;
use crate::theme::Theme;
use crate::{Settings, Upgrades};

/// Current phase of the attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    /// Out of lives; waiting for the session-end signal
    GameOver,
    /// Tunnel reached; waiting for the session-end signal
    LevelComplete,
}

/// Terminal result reported to the session host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    GameOver,
    LevelComplete,
}

/// Countdown to the single session-end signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingSessionEnd {
    pub status: SessionStatus,
    pub remaining: f32,
    pub delivered: bool,
}

/// Follow camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub look_at: Vec3,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub player: Transform,
    pub player_visible: bool,
    pub camera: Camera,
    pub items: Vec<RenderItem>,
    /// End tunnel emissive intensity
    pub tunnel_glow: f32,
    pub boss_eye: Option<EyeColor>,
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub level: u32,
    pub theme: &'static Theme,
    pub is_boss_level: bool,
    pub upgrades: Upgrades,
    /// Apples needed to open the tunnel
    pub num_apples: u32,
    pub player: Player,
    /// Live entities (sorted by id for determinism)
    pub entities: Vec<Entity>,
    pub registry: EntityRegistry,
    pub phase: GamePhase,
    pub paused: bool,
    pub session_end: Option<PendingSessionEnd>,
    pub camera: Camera,
    /// Per-frame (60 Hz) camera easing
    pub camera_smoothing: f32,
    pub reduced_motion: bool,
    /// Seconds simulated since load (pauses excluded)
    pub time: f32,
    /// Smoothed tunnel glow
    pub tunnel_glow: f32,
    pub rng: Pcg32,
    /// Entities spawned during a tick, merged at its end
    pub pending: Vec<Entity>,
}

impl GameState {
    pub fn new(
        data: &LevelData,
        upgrades: Upgrades,
        settings: &Settings,
        provider: &mut dyn ResourceProvider,
        seed: u64,
    ) -> Self {
        let mut registry = EntityRegistry::new(provider, data.level);
        let mut entities = Vec::new();

        for p in &data.platforms {
            entities.push(registry.platform(p));
        }
        for a in &data.apples {
            entities.push(registry.apple(a));
        }
        for h in &data.hearts {
            entities.push(registry.heart(h));
        }
        for h in &data.hazards {
            entities.push(registry.hazard(h));
        }
        if let Some(pos) = data.checkpoint {
            entities.push(registry.checkpoint(pos));
        }
        if let Some(pos) = data.end_tunnel {
            entities.push(registry.end_tunnel(pos, !data.is_boss_level()));
        }
        if let Some(b) = &data.boss {
            entities.push(registry.boss(b));
        }

        let start = Vec3::from(PLAYER_START);
        let camera_offset = camera_offset(data.is_boss_level());

        log::info!(
            "Level {} loaded: {} entities, {} lives, difficulty {:.2}, boss tier {}",
            data.level,
            entities.len(),
            upgrades.max_lives,
            registry.difficulty(),
            registry.tier()
        );

        Self {
            level: data.level,
            theme: data.theme,
            is_boss_level: data.is_boss_level(),
            upgrades,
            num_apples: data.num_apples,
            player: Player::new(start, upgrades.max_lives.max(1)),
            entities,
            registry,
            phase: GamePhase::Playing,
            paused: false,
            session_end: None,
            camera: Camera {
                position: start + camera_offset,
                look_at: start,
            },
            camera_smoothing: settings.camera_smoothing,
            reduced_motion: settings.reduced_motion,
            time: 0.0,
            tunnel_glow: 0.5,
            rng: Pcg32::seed_from_u64(seed),
            pending: Vec::new(),
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Queue an entity for the end of the tick
    pub fn spawn(&mut self, entity: Entity) {
        self.pending.push(entity);
    }

    /// Merge queued spawns and restore id order
    pub fn flush_spawns(&mut self) {
        if !self.pending.is_empty() {
            self.entities.append(&mut self.pending);
            self.normalize_order();
        }
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.entities.sort_by_key(|e| e.id);
    }

    pub fn boss(&self) -> Option<(&Entity, &Boss)> {
        self.entities.iter().find_map(|e| match &e.kind {
            EntityKind::Boss(b) => Some((e, b)),
            _ => None,
        })
    }

    /// `(current, max)` boss health for the HUD
    pub fn boss_health(&self) -> Option<(u32, u32)> {
        self.boss().map(|(_, b)| (b.health, b.max_health))
    }

    /// Ids of apples collected so far
    pub fn collected_apples(&self) -> BTreeSet<String> {
        self.entities
            .iter()
            .filter_map(|e| match &e.kind {
                EntityKind::Apple {
                    id,
                    collected: true,
                } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn all_apples_collected(&self) -> bool {
        self.player.score >= self.num_apples
    }

    /// Record a checkpoint as the respawn anchor
    pub fn claim_checkpoint(&mut self, id: EntityId) {
        let collected = self.collected_apples();
        let Some(checkpoint) = self.entity_mut(id) else {
            return;
        };
        let EntityKind::Checkpoint { claimed } = &mut checkpoint.kind else {
            return;
        };
        *claimed = true;
        let anchor = checkpoint.position() + Vec3::new(0.0, CHECKPOINT_RESPAWN_HEIGHT, 0.0);
        log::debug!(
            "Checkpoint claimed at {:?} with {} apples",
            anchor,
            collected.len()
        );
        self.player.set_anchor(anchor, collected);
    }

    /// Take one life; respawns at the anchor or ends the attempt
    ///
    /// Returns `true` if the attempt is over.
    pub fn lose_life(&mut self) -> bool {
        if !self.player.hurt() {
            log::info!("Out of lives on level {}", self.level);
            self.phase = GamePhase::GameOver;
            self.schedule_session_end(SessionStatus::GameOver);
            return true;
        }

        log::debug!("Life lost, {} remaining", self.player.lives);
        self.player.respawn();
        let keep = &self.player.anchor.collected;
        for e in &mut self.entities {
            match &mut e.kind {
                EntityKind::Apple { id, collected } => {
                    *collected = keep.contains(id.as_str());
                    e.visible = !*collected;
                }
                EntityKind::Platform(state) => {
                    if state.shrink_elapsed.take().is_some() {
                        e.transform.scale = Vec3::ONE;
                        e.visible = true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// Arm the session-end countdown (first terminal condition wins)
    pub fn schedule_session_end(&mut self, status: SessionStatus) {
        if self.session_end.is_none() {
            self.session_end = Some(PendingSessionEnd {
                status,
                remaining: SESSION_END_DELAY,
                delivered: false,
            });
        }
    }

    /// Count down; yields the status exactly once when the delay elapses
    pub fn advance_session_end(&mut self, dt: f32) -> Option<SessionStatus> {
        let pending = self.session_end.as_mut()?;
        if pending.delivered {
            return None;
        }
        pending.remaining -= dt;
        if pending.remaining <= 0.0 {
            pending.delivered = true;
            Some(pending.status)
        } else {
            None
        }
    }

    /// Ease the camera towards its follow position
    pub fn update_camera(&mut self, dt: f32) {
        let target = self.player.position + camera_offset(self.is_boss_level);
        let f = crate::smoothing(self.camera_smoothing, dt);
        self.camera.position = self.camera.position.lerp(target, f);
        self.camera.look_at = match self.boss() {
            Some((e, _)) if self.is_boss_level => {
                let p = e.position();
                Vec3::new(p.x, (p.y - 2.0).max(0.0), p.z)
            }
            _ => self.player.position,
        };
    }

    /// Ease the tunnel glow towards its target brightness
    pub fn update_tunnel_glow(&mut self, dt: f32) {
        let target = if !self.is_boss_level && self.num_apples > 0 && self.all_apples_collected() {
            1.5 + (self.time * 5.0).sin() * 0.5
        } else {
            0.5
        };
        self.tunnel_glow += (target - self.tunnel_glow) * crate::smoothing(0.1, dt);
    }

    pub fn render_snapshot(&self) -> RenderSnapshot {
        let player_visible = self.reduced_motion || self.player.blink_visible();
        RenderSnapshot {
            player: Transform {
                translation: self.player.position,
                rotation: self.player.rotation,
                scale: Vec3::ONE,
            },
            player_visible,
            camera: self.camera,
            items: self.entities.iter().map(RenderItem::from).collect(),
            tunnel_glow: self.tunnel_glow,
            boss_eye: self.boss().map(|(_, b)| b.eye_color()),
        }
    }
}

fn camera_offset(boss_level: bool) -> Vec3 {
    let base = Vec3::from(CAMERA_OFFSET);
    if boss_level { base * BOSS_CAMERA_SCALE } else { base }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::KindHandles;
    use crate::sim::generator::generate_seeded;

    fn state(level: u32) -> GameState {
        let data = generate_seeded(level, 9);
        GameState::new(&data, Upgrades::default(), &Settings::default(), &mut KindHandles, 9)
    }

    #[test]
    fn test_world_mirrors_level_data() {
        let data = generate_seeded(4, 9);
        let settings = Settings::default();
        let s = GameState::new(&data, Upgrades::default(), &settings, &mut KindHandles, 9);
        let expected = data.platforms.len()
            + data.apples.len()
            + data.hearts.len()
            + data.hazards.len()
            + 2;
        assert_eq!(s.entities.len(), expected);
        assert_eq!(s.player.lives, 3);
        assert!(s.entities.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn test_boss_level_hides_tunnel() {
        let s = state(20);
        let tunnel = s
            .entities
            .iter()
            .find(|e| matches!(e.kind, EntityKind::EndTunnel))
            .unwrap();
        assert!(!tunnel.visible);
        assert_eq!(s.boss_health(), Some((4, 4)));
    }

    #[test]
    fn test_session_end_delivered_once() {
        let mut s = state(1);
        s.schedule_session_end(SessionStatus::LevelComplete);
        s.schedule_session_end(SessionStatus::GameOver);
        assert_eq!(s.advance_session_end(1.0), None);
        assert_eq!(s.advance_session_end(1.5), Some(SessionStatus::LevelComplete));
        assert_eq!(s.advance_session_end(5.0), None);
    }

    #[test]
    fn test_session_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::GameOver).unwrap(),
            "\"gameOver\""
        );
        assert_eq!(
            serde_json::to_string(&SessionStatus::LevelComplete).unwrap(),
            "\"levelComplete\""
        );
    }
}
