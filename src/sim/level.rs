//! Level description produced by the generator
//!
//! A `LevelData` is an immutable snapshot: built once when a level is entered,
//! read by the world builder, and dropped on exit or retry.

use glam::{Vec2, Vec3};

use crate::theme::{Hsl, Theme};

/// World axis selector for oscillating motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn get(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    #[inline]
    pub fn set(self, v: &mut Vec3, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
            Axis::Z => v.z = value,
        }
    }
}

/// Axis-aligned rectangle on the XZ plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Rect {
    pub fn around(center: Vec3, width: f32, depth: f32) -> Self {
        Self {
            min_x: center.x - width / 2.0,
            max_x: center.x + width / 2.0,
            min_z: center.z - depth / 2.0,
            max_z: center.z + depth / 2.0,
        }
    }

    pub fn contains_xz(&self, p: Vec3) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.z >= self.min_z && p.z <= self.max_z
    }
}

/// Platform behaviour
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlatformKind {
    Static,
    /// Oscillates along `axis` around its placement
    Moving { axis: Axis, range: f32, speed: f32 },
    /// Shrinks away over `duration` seconds once stood on
    Shrinking { duration: f32 },
    /// Launches the player on landing
    JumpPad,
    /// Launches the player higher than a jump pad
    BouncePad,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformPlacement {
    pub position: Vec3,
    pub width: f32,
    pub depth: f32,
    pub color: Hsl,
    pub kind: PlatformKind,
}

impl PlatformPlacement {
    /// Height of the walkable surface
    pub fn top(&self) -> f32 {
        self.position.y + crate::consts::PLATFORM_THICKNESS / 2.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::around(self.position, self.width, self.depth)
    }
}

/// Circle reserved on a platform's XZ plane by a placed item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    /// Index into `LevelData::platforms`
    pub platform: usize,
    pub center: Vec2,
    pub radius: f32,
    /// Placed by a guarantee pass without the overlap check
    pub forced: bool,
}

impl Footprint {
    pub fn overlaps(&self, other: &Footprint) -> bool {
        use super::collision::circles_overlap;
        self.platform == other.platform
            && circles_overlap(self.center, self.radius, other.center, other.radius)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplePlacement {
    /// Stable per-level id, e.g. `apple-3`
    pub id: String,
    pub position: Vec3,
    pub footprint: Footprint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeartPlacement {
    pub position: Vec3,
    pub footprint: Footprint,
}

/// How a laser emitter moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaserMode {
    /// Spins around the vertical axis
    Rotating,
    /// Slides back and forth along X
    Sweeping,
}

/// Hazard type plus generator-chosen parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HazardKind {
    Skull {
        patrol_axis: Axis,
        patrol_distance: f32,
        patrol_speed: f32,
    },
    SpikeBlock {
        patrol_axis: Axis,
        patrol_distance: f32,
        patrol_speed: f32,
    },
    Ghost,
    Stomper {
        floor_y: f32,
    },
    RamBot {
        bounds: Rect,
    },
    SentinelEye {
        range: f32,
    },
    Laser {
        mode: LaserMode,
        speed: f32,
        range: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HazardPlacement {
    pub position: Vec3,
    pub footprint: Footprint,
    pub kind: HazardKind,
}

/// Boss variants (only one exists)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossKind {
    SkullKing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BossDescriptor {
    pub kind: BossKind,
    pub health: u32,
    pub position: Vec3,
}

/// Complete description of one level
#[derive(Debug, Clone, PartialEq)]
pub struct LevelData {
    pub level: u32,
    pub theme: &'static Theme,
    pub platforms: Vec<PlatformPlacement>,
    pub apples: Vec<ApplePlacement>,
    pub hearts: Vec<HeartPlacement>,
    pub hazards: Vec<HazardPlacement>,
    pub checkpoint: Option<Vec3>,
    pub end_tunnel: Option<Vec3>,
    pub boss: Option<BossDescriptor>,
    /// Apples required to open the end tunnel
    pub num_apples: u32,
}

impl LevelData {
    pub fn is_boss_level(&self) -> bool {
        self.boss.is_some()
    }

    /// Every footprint reserved on the level's platforms
    pub fn footprints(&self) -> impl Iterator<Item = &Footprint> {
        self.apples
            .iter()
            .map(|a| &a.footprint)
            .chain(self.hearts.iter().map(|h| &h.footprint))
            .chain(self.hazards.iter().map(|h| &h.footprint))
    }
}
