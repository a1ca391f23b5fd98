//! Apple Adventure - simulation core of a 3D apple-collecting platformer
//!
//! Core modules:
//! - `sim`: Level generation, per-frame physics, hazards and the boss encounter
//! - `theme`: Static visual/mood theme table
//! - `progression`: Rewards, upgrade costs and the upgrade snapshot
//! - `audio`: Injected sound sink (no global audio state)
//! - `resources`: Visual handle provider with placeholder fallback
//! - `persistence`: Opaque progress store contract
//! - `settings`: Player preferences

pub mod audio;
pub mod persistence;
pub mod progression;
pub mod resources;
pub mod settings;
pub mod sim;
pub mod theme;

pub use progression::Upgrades;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Largest simulated step per frame (seconds); longer hitches are clamped
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// Downward acceleration (units/s²)
    pub const GRAVITY: f32 = 9.8;
    /// Jump velocity before upgrades
    pub const BASE_JUMP_FORCE: f32 = 6.0;
    /// Horizontal speed before upgrades (units/s)
    pub const BASE_PLAYER_SPEED: f32 = 5.0;
    /// Player sphere radius
    pub const PLAYER_RADIUS: f32 = 0.5;
    /// Where the player spawns when no checkpoint has been claimed
    pub const PLAYER_START: [f32; 3] = [0.0, 1.0, 0.0];
    /// Falling below this height costs a life
    pub const DEATH_Y_LEVEL: f32 = -20.0;

    /// Vertical velocity forced by a ground pound
    pub const GROUND_POUND_VELOCITY: f32 = -25.0;
    /// Hazards closer than this to a ground-pound landing die
    pub const GROUND_POUND_RADIUS: f32 = 4.0;
    /// Jump pad launch velocity (multiplier on the base jump force)
    pub const JUMP_PAD_BOOST: f32 = 1.8;
    /// Bounce pad launch velocity (multiplier on the base jump force)
    pub const BOUNCE_PAD_BOOST: f32 = 2.5;
    /// Bounce after stomping a hazard (multiplier on the upgraded jump force)
    pub const STOMP_BOUNCE: f32 = 0.8;
    /// Falling faster than this counts as "coming down" for stomps
    pub const STOMP_FALL_SPEED: f32 = -0.1;

    /// Invulnerability window after losing a life (seconds)
    pub const INVULNERABILITY_DURATION: f32 = 2.0;
    /// Delay between a terminal condition and the session-end signal (seconds)
    pub const SESSION_END_DELAY: f32 = 2.0;

    /// Platform slab thickness (top = centre + half of this)
    pub const PLATFORM_THICKNESS: f32 = 1.0;
    /// Slack above a platform top that still counts as standing on it
    pub const GROUND_TOLERANCE: f32 = 0.1;

    /// Pickup distance for apples and hearts
    pub const PICKUP_RADIUS: f32 = 1.2;
    /// Claim distance for checkpoint flags and the end tunnel
    pub const TRIGGER_RADIUS: f32 = 2.5;
    /// Respawn height above a claimed checkpoint flag
    pub const CHECKPOINT_RESPAWN_HEIGHT: f32 = 1.5;

    /// Camera offset behind/above the player
    pub const CAMERA_OFFSET: [f32; 3] = [0.0, 6.0, 10.0];
    /// Camera offset multiplier during boss fights
    pub const BOSS_CAMERA_SCALE: f32 = 1.5;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Convert a per-frame (60 Hz) lerp factor into one for an arbitrary `dt`
///
/// Keeps camera and boss easing speed independent of the display refresh rate.
#[inline]
pub fn smoothing(per_frame: f32, dt: f32) -> f32 {
    let per_frame = per_frame.clamp(0.0, 1.0);
    1.0 - (1.0 - per_frame).powf(dt * 60.0)
}

/// Difficulty factor in `[0, 1]` for a level number
#[inline]
pub fn difficulty_for_level(level: u32) -> f32 {
    (level.saturating_sub(1) as f32 / 99.0).clamp(0.0, 1.0)
}

/// Boss encounter ordinal for a level (`level / 10`)
#[inline]
pub fn boss_tier(level: u32) -> u32 {
    level / 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_bounds() {
        assert_eq!(difficulty_for_level(1), 0.0);
        assert!((difficulty_for_level(50) - 49.0 / 99.0).abs() < 1e-6);
        assert_eq!(difficulty_for_level(100), 1.0);
        assert_eq!(difficulty_for_level(500), 1.0);
    }

    #[test]
    fn test_smoothing_matches_per_frame_at_60hz() {
        let f = smoothing(0.08, 1.0 / 60.0);
        assert!((f - 0.08).abs() < 1e-5);
        assert_eq!(smoothing(0.08, 0.0), 0.0);
    }
}
