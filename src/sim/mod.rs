//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Seeded RNG only (level layout and boss volleys)
//! - Stable iteration order (by entity ID)
//! - Audio, resources and the session host are injected
//! - No rendering or platform dependencies

pub mod behavior;
pub mod boss;
pub mod collision;
pub mod entity;
pub mod generator;
pub mod level;
pub mod player;
pub mod session;
pub mod state;
pub mod tick;

pub use boss::{Boss, BossEvent, BossPhase, EyeColor};
pub use entity::{Entity, EntityId, EntityKind, EntityRegistry, EntityTag, RenderItem, Transform};
pub use generator::{generate_level, generate_seeded, is_boss_level, platform_count};
pub use level::{BossDescriptor, LevelData, PlatformKind};
pub use player::Player;
pub use session::{FrameClock, LogHost, RecordingHost, SessionHost, Simulation};
pub use state::{Camera, GamePhase, GameState, RenderSnapshot, SessionStatus};
pub use tick::{FrameResult, Services, TickInput, tick};
