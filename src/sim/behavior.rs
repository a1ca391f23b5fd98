//! Per-kind entity behaviour
//!
//! One dispatch over [`EntityKind`] advances every non-boss entity. Behaviours
//! never touch the world directly; anything beyond their own state is returned
//! as an [`Outcome`] for the loop to apply.

use glam::{Quat, Vec3};

use super::entity::{
    Entity, EntityKind, PROJECTILE_SPEED, POUND_RING_LIFETIME, RamPhase, SKULL_SCALE,
    SentinelPhase, yaw_towards,
};
use super::level::{LaserMode, PlatformKind};

/// Skull death animation length
pub const SKULL_DEATH_TIME: f32 = 0.5;
/// Ram-bots wake up inside this distance
pub const RAM_BOT_WAKE_RADIUS: f32 = 20.0;
pub const RAM_BOT_AIM_TIME: f32 = 0.7;
pub const RAM_BOT_CHARGE_TIME: f32 = 2.0;
pub const RAM_BOT_COOLDOWN: f32 = 3.0;
/// Sentinels stay locked this long after spotting the player
pub const SENTINEL_LOCK_TIME: f32 = 5.0;
pub const SENTINEL_SCAN_SPEED: f32 = 0.5;
/// Laser beam length along the emitter's facing
pub const LASER_LENGTH: f32 = 10.0;

/// Half-angle of a sentinel's view cone
pub fn sentinel_view_angle() -> f32 {
    (5.0f32 / 15.0).atan()
}

/// Shared inputs for one behaviour step
#[derive(Debug, Clone, Copy)]
pub struct BehaviorCtx {
    /// Seconds since the level started
    pub time: f32,
    pub dt: f32,
    pub player: Vec3,
}

/// What the loop must do after a behaviour step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Keep,
    Remove,
    /// Spawn a hazard projectile
    Fire { origin: Vec3, velocity: Vec3 },
    /// Ram-bot started a charge
    Charge,
}

/// Advance one entity by `ctx.dt`
pub fn advance(entity: &mut Entity, ctx: &BehaviorCtx) -> Outcome {
    let BehaviorCtx { time, dt, player } = *ctx;
    let t = &mut entity.transform;

    match &mut entity.kind {
        EntityKind::Platform(state) => {
            match state.kind {
                PlatformKind::Moving { axis, range, speed } => {
                    let mut next = state.origin;
                    axis.set(&mut next, axis.get(state.origin) + (time * speed).sin() * range);
                    state.velocity = if dt > 0.0 {
                        (next - t.translation) / dt
                    } else {
                        Vec3::ZERO
                    };
                    t.translation = next;
                }
                PlatformKind::Shrinking { .. } => {
                    if let Some(elapsed) = state.shrink_elapsed.as_mut() {
                        *elapsed += dt;
                        let p = state.shrink_progress();
                        t.scale = Vec3::new(1.0 - p, 1.0, 1.0 - p);
                        if p >= 1.0 {
                            entity.visible = false;
                        }
                    }
                }
                _ => {}
            }
            Outcome::Keep
        }
        EntityKind::Heart { origin, phase } => {
            t.rotation *= Quat::from_rotation_y(dt);
            t.translation.y = origin.y + (time * 2.0 + *phase).sin() * 0.2;
            Outcome::Keep
        }
        EntityKind::Skull { patrol, dying } => match dying {
            Some(left) => {
                *left -= dt;
                t.scale = Vec3::splat((*left / SKULL_DEATH_TIME).max(0.0) * SKULL_SCALE);
                if *left <= 0.0 {
                    Outcome::Remove
                } else {
                    Outcome::Keep
                }
            }
            None => {
                t.rotation *= Quat::from_rotation_y(0.5 * dt);
                t.translation = patrol.position_at(time);
                Outcome::Keep
            }
        },
        EntityKind::SpikeBlock { patrol } => {
            t.translation = patrol.position_at(time);
            Outcome::Keep
        }
        EntityKind::Ghost {
            origin_y,
            chasing,
            chase_speed,
        } => {
            let near = player.distance(t.translation) < super::entity::GHOST_ACTIVATION_RADIUS;
            if !*chasing && near {
                *chasing = true;
                log::debug!("Ghost {} started chasing", entity.id.0);
            }
            if *chasing {
                let dir = (player - t.translation).normalize_or_zero();
                t.translation += dir * *chase_speed * dt;
            }
            t.translation.y = *origin_y + (time * 2.0).sin() * 0.5;
            Outcome::Keep
        }
        EntityKind::Stomper { floor_y, speed } => {
            t.translation.y = *floor_y + 10.0 + (time * *speed).sin() * 8.0;
            Outcome::Keep
        }
        EntityKind::Laser {
            origin,
            mode,
            speed,
            range,
        } => {
            match mode {
                LaserMode::Rotating => t.rotation = Quat::from_rotation_y(time * *speed),
                LaserMode::Sweeping => {
                    t.translation.x = origin.x + (time * *speed).sin() * *range;
                }
            }
            Outcome::Keep
        }
        EntityKind::RamBot {
            bounds,
            charge_speed,
            phase,
        } => {
            let mut outcome = Outcome::Keep;
            *phase = match *phase {
                RamPhase::Idle => {
                    if player.distance(t.translation) < RAM_BOT_WAKE_RADIUS {
                        RamPhase::Aiming {
                            timer: RAM_BOT_AIM_TIME,
                        }
                    } else {
                        RamPhase::Idle
                    }
                }
                RamPhase::Aiming { timer } => {
                    if let Some(yaw) = yaw_towards(t.translation, player) {
                        t.rotation = Quat::from_rotation_y(yaw);
                    }
                    let timer = timer - dt;
                    if timer <= 0.0 {
                        // Direction is fixed here; the charge does not steer
                        let mut dir = t.forward();
                        dir.y = 0.0;
                        outcome = Outcome::Charge;
                        RamPhase::Charging {
                            timer: RAM_BOT_CHARGE_TIME,
                            velocity: dir.normalize_or_zero() * *charge_speed,
                        }
                    } else {
                        RamPhase::Aiming { timer }
                    }
                }
                RamPhase::Charging { timer, velocity } => {
                    t.translation += velocity * dt;
                    let timer = timer - dt;
                    if timer <= 0.0 || !bounds.contains_xz(t.translation) {
                        RamPhase::Cooldown {
                            timer: RAM_BOT_COOLDOWN,
                        }
                    } else {
                        RamPhase::Charging { timer, velocity }
                    }
                }
                RamPhase::Cooldown { timer } => {
                    let timer = timer - dt;
                    if timer <= 0.0 {
                        RamPhase::Idle
                    } else {
                        RamPhase::Cooldown { timer }
                    }
                }
            };
            outcome
        }
        EntityKind::SentinelEye {
            range,
            fire_interval,
            phase,
        } => {
            let mut outcome = Outcome::Keep;
            *phase = match *phase {
                SentinelPhase::Scanning => {
                    t.rotation *= Quat::from_rotation_y(SENTINEL_SCAN_SPEED * dt);
                    let to_player = (player - t.translation).normalize_or_zero();
                    let sees = to_player != Vec3::ZERO
                        && t.forward().angle_between(to_player) < sentinel_view_angle()
                        && player.distance(t.translation) < *range;
                    if sees {
                        log::debug!("Sentinel {} locked on", entity.id.0);
                        // Fires on the first locked frame
                        SentinelPhase::Locked {
                            timer: SENTINEL_LOCK_TIME,
                            since_fire: *fire_interval,
                        }
                    } else {
                        SentinelPhase::Scanning
                    }
                }
                SentinelPhase::Locked { timer, since_fire } => {
                    if let Some(yaw) = yaw_towards(t.translation, player) {
                        t.rotation = Quat::from_rotation_y(yaw);
                    }
                    let mut since_fire = since_fire + dt;
                    if since_fire >= *fire_interval {
                        since_fire = 0.0;
                        let dir = (player - t.translation).normalize_or_zero();
                        outcome = Outcome::Fire {
                            origin: t.translation,
                            velocity: dir * PROJECTILE_SPEED,
                        };
                    }
                    let timer = timer - dt;
                    if timer <= 0.0 {
                        SentinelPhase::Scanning
                    } else {
                        SentinelPhase::Locked { timer, since_fire }
                    }
                }
            };
            outcome
        }
        EntityKind::Projectile { velocity, ttl, .. } => {
            *ttl -= dt;
            t.translation += *velocity * dt;
            if *ttl <= 0.0 {
                Outcome::Remove
            } else {
                Outcome::Keep
            }
        }
        EntityKind::Shockwave {
            age,
            lifetime,
            speed,
        } => {
            *age += dt;
            if *age > *lifetime {
                return Outcome::Remove;
            }
            let r = *age * *speed;
            t.scale = Vec3::new(r, 1.0, r);
            Outcome::Keep
        }
        EntityKind::PoundRing { age } => {
            *age += dt;
            let progress = *age / POUND_RING_LIFETIME;
            if progress >= 1.0 {
                return Outcome::Remove;
            }
            t.scale = Vec3::splat(1.0 + progress * 20.0);
            Outcome::Keep
        }
        EntityKind::EndTunnel => {
            t.rotation *= Quat::from_rotation_x(dt) * Quat::from_rotation_y(0.5 * dt);
            Outcome::Keep
        }
        EntityKind::Apple { .. } | EntityKind::Checkpoint { .. } | EntityKind::Boss(_) => {
            Outcome::Keep
        }
    }
}

/// Beam endpoints for a laser emitter
pub fn laser_beam(entity: &Entity) -> (Vec3, Vec3) {
    let start = entity.position();
    (start, start + entity.transform.forward() * LASER_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::KindHandles;
    use crate::sim::entity::EntityRegistry;
    use crate::sim::level::{Axis, Footprint, HazardKind, HazardPlacement, PlatformPlacement, Rect};
    use crate::theme::Hsl;
    use glam::Vec2;

    const DT: f32 = 1.0 / 60.0;

    fn placed(kind: HazardKind, position: Vec3) -> HazardPlacement {
        HazardPlacement {
            position,
            footprint: Footprint {
                platform: 1,
                center: Vec2::new(position.x, position.z),
                radius: 2.0,
                forced: false,
            },
            kind,
        }
    }

    fn ctx(time: f32, player: Vec3) -> BehaviorCtx {
        BehaviorCtx {
            time,
            dt: DT,
            player,
        }
    }

    #[test]
    fn test_ram_bot_cycle() {
        let mut registry = EntityRegistry::new(&mut KindHandles, 1);
        let bounds = Rect::around(Vec3::ZERO, 40.0, 40.0);
        let mut bot = registry.hazard(&placed(HazardKind::RamBot { bounds }, Vec3::ZERO));
        let player = Vec3::new(0.0, 0.0, 10.0);

        assert_eq!(advance(&mut bot, &ctx(0.0, player)), Outcome::Keep);
        assert!(matches!(bot.kind, EntityKind::RamBot { phase: RamPhase::Aiming { .. }, .. }));

        let mut charged = false;
        for i in 0..60 {
            if advance(&mut bot, &ctx(i as f32 * DT, player)) == Outcome::Charge {
                charged = true;
                break;
            }
        }
        assert!(charged);
        match bot.kind {
            EntityKind::RamBot {
                phase: RamPhase::Charging { velocity, .. },
                ..
            } => {
                assert!(velocity.z > 0.0);
                assert_eq!(velocity.y, 0.0);
            }
            ref other => panic!("expected charging, got {:?}", other),
        }
    }

    #[test]
    fn test_ram_bot_stops_at_platform_edge() {
        let mut registry = EntityRegistry::new(&mut KindHandles, 1);
        let bounds = Rect::around(Vec3::ZERO, 4.0, 4.0);
        let mut bot = registry.hazard(&placed(HazardKind::RamBot { bounds }, Vec3::ZERO));
        if let EntityKind::RamBot { phase, .. } = &mut bot.kind {
            *phase = RamPhase::Charging {
                timer: 2.0,
                velocity: Vec3::new(0.0, 0.0, 12.0),
            };
        }
        for _ in 0..20 {
            advance(&mut bot, &ctx(0.0, Vec3::new(100.0, 0.0, 0.0)));
        }
        assert!(matches!(bot.kind, EntityKind::RamBot { phase: RamPhase::Cooldown { .. }, .. }));
        assert!(bot.position().z < 3.0);
    }

    #[test]
    fn test_sentinel_locks_and_fires() {
        let mut registry = EntityRegistry::new(&mut KindHandles, 1);
        let mut eye = registry.hazard(&placed(HazardKind::SentinelEye { range: 25.0 }, Vec3::ZERO));
        // Straight ahead along +Z, inside range
        let player = Vec3::new(0.0, 0.0, 10.0);
        advance(&mut eye, &ctx(0.0, player));
        assert!(matches!(
            eye.kind,
            EntityKind::SentinelEye {
                phase: SentinelPhase::Locked { .. },
                ..
            }
        ));
        match advance(&mut eye, &ctx(DT, player)) {
            Outcome::Fire { velocity, .. } => {
                assert!((velocity.length() - PROJECTILE_SPEED).abs() < 1e-3);
            }
            other => panic!("expected a shot, got {:?}", other),
        }
    }

    #[test]
    fn test_sentinel_ignores_player_behind() {
        let mut registry = EntityRegistry::new(&mut KindHandles, 1);
        let mut eye = registry.hazard(&placed(HazardKind::SentinelEye { range: 25.0 }, Vec3::ZERO));
        advance(&mut eye, &ctx(0.0, Vec3::new(0.0, 0.0, -10.0)));
        assert!(matches!(eye.kind, EntityKind::SentinelEye { phase: SentinelPhase::Scanning, .. }));
    }

    #[test]
    fn test_ghost_activation_radius() {
        let mut registry = EntityRegistry::new(&mut KindHandles, 1);
        let mut ghost = registry.hazard(&placed(HazardKind::Ghost, Vec3::ZERO));
        advance(&mut ghost, &ctx(0.0, Vec3::new(20.0, 0.0, 0.0)));
        assert!(matches!(ghost.kind, EntityKind::Ghost { chasing: false, .. }));
        advance(&mut ghost, &ctx(0.0, Vec3::new(5.0, 0.0, 0.0)));
        assert!(matches!(ghost.kind, EntityKind::Ghost { chasing: true, .. }));
        assert!(ghost.position().x > 0.0);
    }

    #[test]
    fn test_stomped_skull_fades_then_is_removed() {
        let mut registry = EntityRegistry::new(&mut KindHandles, 1);
        let kind = HazardKind::Skull {
            patrol_axis: Axis::X,
            patrol_distance: 1.0,
            patrol_speed: 1.0,
        };
        let mut skull = registry.hazard(&placed(kind, Vec3::ZERO));
        if let EntityKind::Skull { dying, .. } = &mut skull.kind {
            *dying = Some(SKULL_DEATH_TIME);
        }
        let mut frames = 0;
        while advance(&mut skull, &ctx(0.0, Vec3::ZERO)) == Outcome::Keep {
            frames += 1;
            assert!(frames < 100);
        }
        assert!(frames >= 25);
    }

    #[test]
    fn test_moving_platform_reports_velocity() {
        let mut registry = EntityRegistry::new(&mut KindHandles, 1);
        let mut platform = registry.platform(&PlatformPlacement {
            position: Vec3::ZERO,
            width: 4.0,
            depth: 4.0,
            color: Hsl {
                h: 0.0,
                s: 50.0,
                l: 50.0,
            },
            kind: PlatformKind::Moving {
                axis: Axis::X,
                range: 3.0,
                speed: 1.0,
            },
        });
        advance(&mut platform, &ctx(DT, Vec3::ZERO));
        match &platform.kind {
            EntityKind::Platform(state) => {
                // d/dt of 3 sin(t) near t = 0
                assert!((state.velocity.x - 3.0).abs() < 0.01);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_projectile_expires() {
        let mut registry = EntityRegistry::new(&mut KindHandles, 1);
        let mut shot = registry.projectile(Vec3::ZERO, Vec3::new(0.0, 0.0, 15.0), false);
        let mut frames = 0;
        while advance(&mut shot, &ctx(0.0, Vec3::ZERO)) == Outcome::Keep {
            frames += 1;
        }
        assert!((frames as f32 * DT - 5.0).abs() < 0.05);
    }
}
