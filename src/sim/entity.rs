//! Runtime entities and the registry that builds them
//!
//! Every live object in a level is one [`Entity`]: a transform, a visibility
//! flag, a visual handle and an [`EntityKind`] carrying only the state that kind
//! needs. Entities refer to each other by [`EntityId`], never by reference.

use std::collections::HashMap;

use glam::{Quat, Vec2, Vec3};

use super::boss::Boss;
use super::level::{
    ApplePlacement, Axis, BossDescriptor, HazardKind, HazardPlacement, HeartPlacement, LaserMode,
    PlatformKind, PlatformPlacement, Rect,
};
use crate::resources::{ResourceProvider, VisualHandle, visual_or_placeholder};
use crate::theme::Hsl;
use crate::{boss_tier, difficulty_for_level};

/// Stable identifier, unique within one level attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Authoritative placement handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Local +Z in world space
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

/// Yaw that turns local +Z towards `to` (XZ plane only)
pub fn yaw_towards(from: Vec3, to: Vec3) -> Option<f32> {
    let d = Vec2::new(to.x - from.x, to.z - from.z);
    if d.length_squared() < 1e-8 {
        return None;
    }
    Some(d.x.atan2(d.y))
}

/// Fieldless mirror of [`EntityKind`], used for visuals and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityTag {
    Platform,
    Apple,
    Heart,
    Skull,
    Ghost,
    Stomper,
    Laser,
    SpikeBlock,
    RamBot,
    SentinelEye,
    Projectile,
    Shockwave,
    PoundRing,
    Checkpoint,
    EndTunnel,
    Boss,
}

impl EntityTag {
    pub const ALL: [EntityTag; 16] = [
        EntityTag::Platform,
        EntityTag::Apple,
        EntityTag::Heart,
        EntityTag::Skull,
        EntityTag::Ghost,
        EntityTag::Stomper,
        EntityTag::Laser,
        EntityTag::SpikeBlock,
        EntityTag::RamBot,
        EntityTag::SentinelEye,
        EntityTag::Projectile,
        EntityTag::Shockwave,
        EntityTag::PoundRing,
        EntityTag::Checkpoint,
        EntityTag::EndTunnel,
        EntityTag::Boss,
    ];

    /// Visual variants requested from the resource provider for this kind
    pub fn variants(&self) -> &'static [&'static str] {
        match self {
            EntityTag::Platform => &["static", "moving", "shrinking", "jumpPad", "bouncePad"],
            EntityTag::Laser => &["rotating", "sweeping"],
            EntityTag::Projectile => &["sentinel", "boss"],
            _ => &[],
        }
    }
}

/// Runtime state of a platform
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformState {
    /// Placement position; moving platforms oscillate around it
    pub origin: Vec3,
    pub width: f32,
    pub depth: f32,
    pub color: Hsl,
    pub kind: PlatformKind,
    /// Displacement per second over the last step (moving platforms)
    pub velocity: Vec3,
    /// Seconds since the player first landed (shrinking platforms)
    pub shrink_elapsed: Option<f32>,
}

impl PlatformState {
    /// 0 = full size, 1 = gone
    pub fn shrink_progress(&self) -> f32 {
        match (self.kind, self.shrink_elapsed) {
            (PlatformKind::Shrinking { duration }, Some(t)) if duration > 0.0 => {
                (t / duration).min(1.0)
            }
            (PlatformKind::Shrinking { .. }, Some(_)) => 1.0,
            _ => 0.0,
        }
    }

    /// Start the shrink timer; `false` if already running or not a shrinking platform
    pub fn start_shrinking(&mut self) -> bool {
        if matches!(self.kind, PlatformKind::Shrinking { .. }) && self.shrink_elapsed.is_none() {
            self.shrink_elapsed = Some(0.0);
            true
        } else {
            false
        }
    }

    /// Half extents on XZ after scaling
    pub fn half_extents(&self, scale: Vec3) -> Vec2 {
        Vec2::new(self.width * scale.x, self.depth * scale.z) / 2.0
    }
}

/// Sinusoidal back-and-forth along one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patrol {
    pub origin: Vec3,
    pub axis: Axis,
    pub distance: f32,
    pub speed: f32,
}

impl Patrol {
    pub fn position_at(&self, time: f32) -> Vec3 {
        let mut p = self.origin;
        let base = self.axis.get(self.origin);
        self.axis
            .set(&mut p, base + (time * self.speed).sin() * self.distance);
        p
    }
}

/// Ram-bot behaviour; each phase carries its own countdown
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RamPhase {
    Idle,
    Aiming { timer: f32 },
    Charging { timer: f32, velocity: Vec3 },
    Cooldown { timer: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SentinelPhase {
    Scanning,
    Locked { timer: f32, since_fire: f32 },
}

/// Kind plus per-kind behaviour state
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Platform(PlatformState),
    Apple {
        id: String,
        collected: bool,
    },
    Heart {
        origin: Vec3,
        phase: f32,
    },
    Skull {
        patrol: Patrol,
        /// Remaining death animation; `Some` means the skull is harmless
        dying: Option<f32>,
    },
    Ghost {
        origin_y: f32,
        chasing: bool,
        chase_speed: f32,
    },
    Stomper {
        floor_y: f32,
        speed: f32,
    },
    Laser {
        origin: Vec3,
        mode: LaserMode,
        speed: f32,
        range: f32,
    },
    SpikeBlock {
        patrol: Patrol,
    },
    RamBot {
        bounds: Rect,
        charge_speed: f32,
        phase: RamPhase,
    },
    SentinelEye {
        range: f32,
        fire_interval: f32,
        phase: SentinelPhase,
    },
    Projectile {
        velocity: Vec3,
        ttl: f32,
        from_boss: bool,
    },
    Shockwave {
        age: f32,
        lifetime: f32,
        speed: f32,
    },
    PoundRing {
        age: f32,
    },
    Checkpoint {
        claimed: bool,
    },
    EndTunnel,
    Boss(Boss),
}

impl EntityKind {
    pub fn tag(&self) -> EntityTag {
        match self {
            EntityKind::Platform(_) => EntityTag::Platform,
            EntityKind::Apple { .. } => EntityTag::Apple,
            EntityKind::Heart { .. } => EntityTag::Heart,
            EntityKind::Skull { .. } => EntityTag::Skull,
            EntityKind::Ghost { .. } => EntityTag::Ghost,
            EntityKind::Stomper { .. } => EntityTag::Stomper,
            EntityKind::Laser { .. } => EntityTag::Laser,
            EntityKind::SpikeBlock { .. } => EntityTag::SpikeBlock,
            EntityKind::RamBot { .. } => EntityTag::RamBot,
            EntityKind::SentinelEye { .. } => EntityTag::SentinelEye,
            EntityKind::Projectile { .. } => EntityTag::Projectile,
            EntityKind::Shockwave { .. } => EntityTag::Shockwave,
            EntityKind::PoundRing { .. } => EntityTag::PoundRing,
            EntityKind::Checkpoint { .. } => EntityTag::Checkpoint,
            EntityKind::EndTunnel => EntityTag::EndTunnel,
            EntityKind::Boss(_) => EntityTag::Boss,
        }
    }
}

/// A live object in the level
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub visible: bool,
    pub visual: VisualHandle,
    pub kind: EntityKind,
}

impl Entity {
    pub fn tag(&self) -> EntityTag {
        self.kind.tag()
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }
}

/// Visual scale per kind
pub const SKULL_SCALE: f32 = 0.8;
pub const GHOST_SCALE: f32 = 1.2;
pub const RAM_BOT_SCALE: f32 = 0.9;
pub const BOSS_SCALE: f32 = 1.5;

/// Ghosts start chasing inside this distance
pub const GHOST_ACTIVATION_RADIUS: f32 = 10.0;
pub const PROJECTILE_SPEED: f32 = 15.0;
pub const PROJECTILE_LIFETIME: f32 = 5.0;
pub const SHOCKWAVE_LIFETIME: f32 = 0.8;
pub const POUND_RING_LIFETIME: f32 = 0.4;

type VisualKey = (EntityTag, Option<&'static str>);

/// Builds entities with their visuals and difficulty-scaled defaults
///
/// Visuals are resolved once when the registry is created, so spawning mid-level
/// never touches the resource provider.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    difficulty: f32,
    tier: u32,
    visuals: HashMap<VisualKey, VisualHandle>,
    next_id: u32,
}

impl EntityRegistry {
    pub fn new(provider: &mut dyn ResourceProvider, level: u32) -> Self {
        let mut visuals = HashMap::new();
        for tag in EntityTag::ALL {
            visuals.insert((tag, None), visual_or_placeholder(provider, tag, None));
            for variant in tag.variants() {
                visuals.insert(
                    (tag, Some(*variant)),
                    visual_or_placeholder(provider, tag, Some(variant)),
                );
            }
        }
        Self {
            difficulty: difficulty_for_level(level),
            tier: boss_tier(level),
            visuals,
            next_id: 1,
        }
    }

    pub fn difficulty(&self) -> f32 {
        self.difficulty
    }

    pub fn tier(&self) -> u32 {
        self.tier
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Handle for a kind/variant; placeholder if it never resolved
    pub fn visual(&self, tag: EntityTag, variant: Option<&'static str>) -> VisualHandle {
        self.visuals
            .get(&(tag, variant))
            .copied()
            .unwrap_or(VisualHandle::PLACEHOLDER)
    }

    fn spawn(
        &mut self,
        transform: Transform,
        variant: Option<&'static str>,
        kind: EntityKind,
    ) -> Entity {
        let visual = self.visual(kind.tag(), variant);
        Entity {
            id: self.next_entity_id(),
            transform,
            visible: true,
            visual,
            kind,
        }
    }

    pub fn platform(&mut self, p: &PlatformPlacement) -> Entity {
        let variant = match p.kind {
            PlatformKind::Static => "static",
            PlatformKind::Moving { .. } => "moving",
            PlatformKind::Shrinking { .. } => "shrinking",
            PlatformKind::JumpPad => "jumpPad",
            PlatformKind::BouncePad => "bouncePad",
        };
        self.spawn(
            Transform::from_translation(p.position),
            Some(variant),
            EntityKind::Platform(PlatformState {
                origin: p.position,
                width: p.width,
                depth: p.depth,
                color: p.color,
                kind: p.kind,
                velocity: Vec3::ZERO,
                shrink_elapsed: None,
            }),
        )
    }

    pub fn apple(&mut self, a: &ApplePlacement) -> Entity {
        self.spawn(
            Transform::from_translation(a.position),
            None,
            EntityKind::Apple {
                id: a.id.clone(),
                collected: false,
            },
        )
    }

    pub fn heart(&mut self, h: &HeartPlacement) -> Entity {
        // Offsets the bob so neighbouring hearts do not move in lockstep
        let phase = self.next_id as f32;
        self.spawn(
            Transform::from_translation(h.position),
            None,
            EntityKind::Heart {
                origin: h.position,
                phase,
            },
        )
    }

    pub fn hazard(&mut self, h: &HazardPlacement) -> Entity {
        let d = self.difficulty;
        let at = Transform::from_translation(h.position);
        match h.kind {
            HazardKind::Skull {
                patrol_axis,
                patrol_distance,
                patrol_speed,
            } => self.spawn(
                at.with_scale(SKULL_SCALE),
                None,
                EntityKind::Skull {
                    patrol: Patrol {
                        origin: h.position,
                        axis: patrol_axis,
                        distance: patrol_distance,
                        speed: patrol_speed,
                    },
                    dying: None,
                },
            ),
            HazardKind::SpikeBlock {
                patrol_axis,
                patrol_distance,
                patrol_speed,
            } => self.spawn(
                at,
                None,
                EntityKind::SpikeBlock {
                    patrol: Patrol {
                        origin: h.position,
                        axis: patrol_axis,
                        distance: patrol_distance,
                        speed: patrol_speed,
                    },
                },
            ),
            HazardKind::Ghost => self.spawn(
                at.with_scale(GHOST_SCALE),
                None,
                EntityKind::Ghost {
                    origin_y: h.position.y,
                    chasing: false,
                    chase_speed: 0.8 + d * 0.5,
                },
            ),
            HazardKind::Stomper { floor_y } => self.spawn(
                at,
                None,
                EntityKind::Stomper {
                    floor_y,
                    speed: 1.0 + d * 2.0,
                },
            ),
            HazardKind::RamBot { bounds } => self.spawn(
                at.with_scale(RAM_BOT_SCALE),
                None,
                EntityKind::RamBot {
                    bounds,
                    charge_speed: 12.0 + d * 4.0,
                    phase: RamPhase::Idle,
                },
            ),
            HazardKind::SentinelEye { range } => self.spawn(
                at,
                None,
                EntityKind::SentinelEye {
                    range,
                    fire_interval: 2.0 - d,
                    phase: SentinelPhase::Scanning,
                },
            ),
            HazardKind::Laser { mode, speed, range } => {
                let variant = match mode {
                    LaserMode::Rotating => "rotating",
                    LaserMode::Sweeping => "sweeping",
                };
                self.spawn(
                    at,
                    Some(variant),
                    EntityKind::Laser {
                        origin: h.position,
                        mode,
                        speed,
                        range,
                    },
                )
            }
        }
    }

    pub fn checkpoint(&mut self, position: Vec3) -> Entity {
        self.spawn(
            Transform::from_translation(position),
            None,
            EntityKind::Checkpoint { claimed: false },
        )
    }

    /// End tunnel; hidden until the boss falls on boss levels
    pub fn end_tunnel(&mut self, position: Vec3, visible: bool) -> Entity {
        let mut e = self.spawn(Transform::from_translation(position), None, EntityKind::EndTunnel);
        e.visible = visible;
        e
    }

    pub fn boss(&mut self, b: &BossDescriptor) -> Entity {
        let boss = Boss::new(b.kind, b.health, self.tier, b.position);
        self.spawn(
            Transform::from_translation(b.position).with_scale(BOSS_SCALE),
            None,
            EntityKind::Boss(boss),
        )
    }

    pub fn projectile(&mut self, origin: Vec3, velocity: Vec3, from_boss: bool) -> Entity {
        let variant = if from_boss { "boss" } else { "sentinel" };
        self.spawn(
            Transform::from_translation(origin),
            Some(variant),
            EntityKind::Projectile {
                velocity,
                ttl: PROJECTILE_LIFETIME,
                from_boss,
            },
        )
    }

    /// Boss landing wave; expands faster at higher tiers
    pub fn shockwave(&mut self, center: Vec3) -> Entity {
        let speed = 8.0 + self.tier as f32 * 1.5;
        self.spawn(
            Transform::from_translation(center).with_scale(0.0),
            None,
            EntityKind::Shockwave {
                age: 0.0,
                lifetime: SHOCKWAVE_LIFETIME,
                speed,
            },
        )
    }

    /// Cosmetic ring left by a ground-pound landing
    pub fn pound_ring(&mut self, center: Vec3) -> Entity {
        self.spawn(
            Transform::from_translation(center),
            None,
            EntityKind::PoundRing { age: 0.0 },
        )
    }
}

/// One renderable item in a frame snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderItem {
    pub id: EntityId,
    pub tag: EntityTag,
    pub visual: VisualHandle,
    pub transform: Transform,
    pub visible: bool,
}

impl From<&Entity> for RenderItem {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id,
            tag: e.tag(),
            visual: e.visual,
            transform: e.transform,
            visible: e.visible,
        }
    }
}
