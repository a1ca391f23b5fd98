//! Boss encounter state machine
//!
//! `Intro -> Attacking -> (SlamRise -> SlamFall | ProjectileAim -> ProjectileFire)
//! -> Vulnerable -> (Hit -> Attacking | Dying)`. Each phase carries only its own
//! timer and bookkeeping; leaving a phase drops that data.
//!
//! Every duration and speed scales with the boss tier (`level / 10`).

use glam::{Quat, Vec3};
use rand::Rng;

use super::collision::Aabb;
use super::entity::{Transform, yaw_towards};
use super::level::BossKind;
use crate::consts::{PLAYER_RADIUS, STOMP_FALL_SPEED};
use crate::smoothing;

pub const INTRO_DURATION: f32 = 3.0;
pub const ATTACK_WINDUP: f32 = 1.0;
pub const SLAM_FALL_DURATION: f32 = 0.5;
pub const FIRE_DURATION: f32 = 1.5;
/// Volley shots are spread over this part of the fire phase
pub const FIRE_WINDOW: f32 = 1.2;
pub const HIT_DURATION: f32 = 1.5;
pub const DYING_DURATION: f32 = 3.0;

/// Distance from the boss centre to its eye along the facing direction
pub const EYE_OFFSET: f32 = 3.0;
/// Weak-point sphere radius
pub const EYE_RADIUS: f32 = 1.2;
/// Body contact radius while attacking
pub const BODY_RADIUS: f32 = 2.5 * 1.5;
/// Lateral spacing between volley shots
pub const VOLLEY_SPREAD: f32 = 0.2;

/// Boss phase with the data each phase needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BossPhase {
    Intro { timer: f32 },
    Attacking { timer: f32 },
    SlamRise { timer: f32 },
    SlamFall { timer: f32 },
    ProjectileAim { timer: f32 },
    ProjectileFire { timer: f32, fired: u32, total: u32 },
    Vulnerable { timer: f32 },
    Hit { timer: f32 },
    Dying { timer: f32 },
}

impl BossPhase {
    pub fn name(&self) -> &'static str {
        match self {
            BossPhase::Intro { .. } => "intro",
            BossPhase::Attacking { .. } => "attacking",
            BossPhase::SlamRise { .. } => "attack_slam_rise",
            BossPhase::SlamFall { .. } => "attack_slam_fall",
            BossPhase::ProjectileAim { .. } => "attack_projectiles_aim",
            BossPhase::ProjectileFire { .. } => "attack_projectiles_fire",
            BossPhase::Vulnerable { .. } => "vulnerable",
            BossPhase::Hit { .. } => "hit",
            BossPhase::Dying { .. } => "dying",
        }
    }

    fn timer_mut(&mut self) -> &mut f32 {
        match self {
            BossPhase::Intro { timer }
            | BossPhase::Attacking { timer }
            | BossPhase::SlamRise { timer }
            | BossPhase::SlamFall { timer }
            | BossPhase::ProjectileAim { timer }
            | BossPhase::ProjectileFire { timer, .. }
            | BossPhase::Vulnerable { timer }
            | BossPhase::Hit { timer }
            | BossPhase::Dying { timer } => timer,
        }
    }
}

/// Telegraph colour of the boss eye
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeColor {
    Red,
    Green,
}

/// What the boss needs to know about the player this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub position: Vec3,
    pub velocity_y: f32,
}

/// Side effects requested by one boss step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BossEvent {
    Fire { origin: Vec3, velocity: Vec3 },
    /// Slam landed; spawn a ground wave here
    Shockwave { center: Vec3 },
    /// Weak point stomped (player should bounce)
    Stomped { remaining: u32 },
    /// Death animation finished; remove the boss and open the tunnel
    Defeated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Boss {
    pub kind: BossKind,
    pub health: u32,
    pub max_health: u32,
    pub tier: u32,
    pub phase: BossPhase,
    /// Lerp destination
    pub target: Vec3,
}

/// Per-frame (60 Hz) movement easing; lower at higher tiers so moves read earlier
pub fn follow_rate(tier: u32) -> f32 {
    (0.08 - 0.01 * tier.saturating_sub(1) as f32).max(0.02)
}

pub fn slam_rise_duration(tier: u32) -> f32 {
    (1.5 - 0.1 * tier as f32).max(0.4)
}

pub fn aim_duration(tier: u32) -> f32 {
    (2.0 - 0.15 * tier as f32).max(0.6)
}

pub fn vulnerable_duration(tier: u32) -> f32 {
    (6.0 - 0.4 * tier as f32).max(2.5)
}

pub fn volley_size(tier: u32) -> u32 {
    1 + tier / 2
}

pub fn projectile_speed(tier: u32) -> f32 {
    15.0 + 0.5 * tier as f32
}

impl Boss {
    pub fn new(kind: BossKind, health: u32, tier: u32, position: Vec3) -> Self {
        Self {
            kind,
            health,
            max_health: health,
            tier,
            phase: BossPhase::Intro {
                timer: INTRO_DURATION,
            },
            target: position,
        }
    }

    /// Body contact hurts in every attacking phase
    pub fn is_attacking(&self) -> bool {
        !matches!(
            self.phase,
            BossPhase::Intro { .. }
                | BossPhase::Vulnerable { .. }
                | BossPhase::Hit { .. }
                | BossPhase::Dying { .. }
        )
    }

    pub fn is_vulnerable(&self) -> bool {
        matches!(self.phase, BossPhase::Vulnerable { .. })
    }

    pub fn eye_color(&self) -> EyeColor {
        if self.is_vulnerable() {
            EyeColor::Green
        } else {
            EyeColor::Red
        }
    }

    /// Weak-point centre for a boss at `transform`
    pub fn eye_position(transform: &Transform) -> Vec3 {
        transform.translation + transform.forward() * EYE_OFFSET
    }

    fn enter(&mut self, phase: BossPhase) {
        log::debug!("Boss {} -> {}", self.phase.name(), phase.name());
        self.phase = phase;
    }

    /// Advance one frame
    ///
    /// Moves the boss towards its target, applies phase effects to `transform`
    /// and returns the events the loop must act on.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        transform: &mut Transform,
        player: PlayerView,
        dt: f32,
        rng: &mut R,
    ) -> Vec<BossEvent> {
        let mut events = Vec::new();

        transform.translation = transform
            .translation
            .lerp(self.target, smoothing(follow_rate(self.tier), dt));

        let timer = {
            let t = self.phase.timer_mut();
            *t -= dt;
            *t
        };

        match self.phase {
            BossPhase::Intro { .. } => {
                if timer <= 0.0 {
                    self.enter(BossPhase::Attacking {
                        timer: ATTACK_WINDUP,
                    });
                }
            }
            BossPhase::Attacking { .. } => {
                if timer <= 0.0 {
                    if rng.random_bool(0.5) {
                        self.target = Vec3::new(
                            rng.random_range(-7.5..7.5),
                            15.0,
                            -10.0 + rng.random_range(-5.0..5.0),
                        );
                        self.enter(BossPhase::SlamRise {
                            timer: slam_rise_duration(self.tier),
                        });
                    } else {
                        self.target = Vec3::new(rng.random_range(-10.0..10.0), 10.0, -15.0);
                        self.enter(BossPhase::ProjectileAim {
                            timer: aim_duration(self.tier),
                        });
                    }
                }
            }
            BossPhase::SlamRise { .. } => {
                if timer <= 0.0 {
                    self.target.y = 1.0;
                    self.enter(BossPhase::SlamFall {
                        timer: SLAM_FALL_DURATION,
                    });
                }
            }
            BossPhase::SlamFall { .. } => {
                if timer <= 0.0 {
                    let p = transform.translation;
                    self.target = Vec3::new(p.x, 2.5, p.z);
                    events.push(BossEvent::Shockwave {
                        center: Vec3::new(p.x, 0.0, p.z),
                    });
                    self.enter(BossPhase::Vulnerable {
                        timer: vulnerable_duration(self.tier),
                    });
                }
            }
            BossPhase::ProjectileAim { .. } => {
                if let Some(yaw) = yaw_towards(transform.translation, player.position) {
                    transform.rotation = Quat::from_rotation_y(yaw);
                }
                if timer <= 0.0 {
                    self.enter(BossPhase::ProjectileFire {
                        timer: FIRE_DURATION,
                        fired: 0,
                        total: volley_size(self.tier),
                    });
                }
            }
            BossPhase::ProjectileFire { fired, total, .. } => {
                let mut fired = fired;
                let spacing = FIRE_WINDOW / total as f32;
                while fired < total && timer <= FIRE_DURATION - fired as f32 * spacing {
                    events.push(self.volley_shot(transform, player.position, fired, total));
                    fired += 1;
                }
                if timer <= 0.0 {
                    let p = transform.translation;
                    self.target = Vec3::new(p.x, 2.5, p.z);
                    self.enter(BossPhase::Vulnerable {
                        timer: vulnerable_duration(self.tier),
                    });
                } else {
                    self.phase = BossPhase::ProjectileFire {
                        timer,
                        fired,
                        total,
                    };
                }
            }
            BossPhase::Vulnerable { .. } => {
                if self.stomp_lands(transform, player) {
                    self.health = self.health.saturating_sub(1);
                    events.push(BossEvent::Stomped {
                        remaining: self.health,
                    });
                    if self.health == 0 {
                        self.enter(BossPhase::Dying {
                            timer: DYING_DURATION,
                        });
                    } else {
                        self.enter(BossPhase::Hit {
                            timer: HIT_DURATION,
                        });
                    }
                } else if timer <= 0.0 {
                    self.enter(BossPhase::Attacking {
                        timer: ATTACK_WINDUP,
                    });
                }
            }
            BossPhase::Hit { .. } => {
                if timer <= 0.0 {
                    self.enter(BossPhase::Attacking {
                        timer: ATTACK_WINDUP,
                    });
                }
            }
            BossPhase::Dying { .. } => {
                transform.rotation *=
                    Quat::from_rotation_x(10.0 * dt) * Quat::from_rotation_y(10.0 * dt);
                transform.scale *= (1.0 - dt).max(0.0);
                if timer <= 0.0 {
                    events.push(BossEvent::Defeated);
                }
            }
        }

        events
    }

    /// Hidden every other 1/20 s while recovering from a hit
    pub fn flicker_visible(&self, time: f32) -> bool {
        match self.phase {
            BossPhase::Hit { .. } => (time * 20.0).floor() as i64 % 2 == 0,
            _ => true,
        }
    }

    fn stomp_lands(&self, transform: &Transform, player: PlayerView) -> bool {
        let eye = Aabb::around_sphere(Self::eye_position(transform), EYE_RADIUS);
        Aabb::around_sphere(player.position, PLAYER_RADIUS).intersects(&eye)
            && player.velocity_y < STOMP_FALL_SPEED
    }

    fn volley_shot(&self, transform: &Transform, aim: Vec3, index: u32, total: u32) -> BossEvent {
        let origin = transform.translation + transform.forward() * EYE_OFFSET;
        let dir = (aim - origin).normalize_or_zero();
        let side = dir.cross(Vec3::Y).normalize_or_zero();
        let offset = (index as f32 - (total as f32 - 1.0) / 2.0) * VOLLEY_SPREAD;
        let dir = (dir + side * offset).normalize_or_zero();
        BossEvent::Fire {
            origin,
            velocity: dir * projectile_speed(self.tier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const DT: f32 = 1.0 / 60.0;

    fn boss(tier: u32) -> (Boss, Transform) {
        let start = Vec3::new(0.0, 8.0, -25.0);
        (
            Boss::new(BossKind::SkullKing, 2 + tier, tier, start),
            Transform::from_translation(start),
        )
    }

    fn idle_player() -> PlayerView {
        PlayerView {
            position: Vec3::new(0.0, 0.0, 15.0),
            velocity_y: 0.0,
        }
    }

    /// Player falling straight onto the eye
    fn stomping(transform: &Transform) -> PlayerView {
        PlayerView {
            position: Boss::eye_position(transform),
            velocity_y: -5.0,
        }
    }

    #[test]
    fn test_intro_then_attacking() {
        let (mut b, mut t) = boss(1);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut time = 0.0;
        while matches!(b.phase, BossPhase::Intro { .. }) {
            b.advance(&mut t, idle_player(), DT, &mut rng);
            time += DT;
        }
        assert!(matches!(b.phase, BossPhase::Attacking { .. }));
        assert!((time - INTRO_DURATION).abs() < 0.05);
    }

    #[test]
    fn test_health_unchanged_outside_vulnerable() {
        let mut rng = Pcg32::seed_from_u64(3);
        let phases = [
            BossPhase::Intro { timer: 1.0 },
            BossPhase::Attacking { timer: 1.0 },
            BossPhase::SlamRise { timer: 1.0 },
            BossPhase::SlamFall { timer: 0.4 },
            BossPhase::ProjectileAim { timer: 1.0 },
            BossPhase::ProjectileFire {
                timer: 1.0,
                fired: 1,
                total: 1,
            },
            BossPhase::Hit { timer: 1.0 },
        ];
        for phase in phases {
            let (mut b, mut t) = boss(1);
            b.phase = phase;
            let view = stomping(&t);
            let events = b.advance(&mut t, view, DT, &mut rng);
            assert_eq!(b.health, 3, "health changed in {}", phase.name());
            assert!(!events.iter().any(|e| matches!(e, BossEvent::Stomped { .. })));
        }
    }

    #[test]
    fn test_vulnerable_stomp_requires_falling() {
        let mut rng = Pcg32::seed_from_u64(4);
        let (mut b, mut t) = boss(1);
        b.phase = BossPhase::Vulnerable { timer: 5.0 };

        let rising = PlayerView {
            velocity_y: 2.0,
            ..stomping(&t)
        };
        b.advance(&mut t, rising, DT, &mut rng);
        assert_eq!(b.health, 3);
        assert!(b.is_vulnerable());

        let view = stomping(&t);
        let events = b.advance(&mut t, view, DT, &mut rng);
        assert_eq!(b.health, 2);
        assert_eq!(events, vec![BossEvent::Stomped { remaining: 2 }]);
        assert!(matches!(b.phase, BossPhase::Hit { .. }));
    }

    #[test]
    fn test_last_stomp_kills_and_defeat_fires_once() {
        let mut rng = Pcg32::seed_from_u64(5);
        let (mut b, mut t) = boss(1);
        b.health = 1;
        b.phase = BossPhase::Vulnerable { timer: 5.0 };
        let view = stomping(&t);
        b.advance(&mut t, view, DT, &mut rng);
        assert!(matches!(b.phase, BossPhase::Dying { .. }));

        let mut defeated = 0;
        for _ in 0..((DYING_DURATION / DT) as usize + 5) {
            let events = b.advance(&mut t, idle_player(), DT, &mut rng);
            defeated += events
                .iter()
                .filter(|e| **e == BossEvent::Defeated)
                .count();
            if defeated > 0 {
                break;
            }
        }
        assert_eq!(defeated, 1);
        // Shrunk while dying
        assert!(t.scale.x < 0.5);
    }

    #[test]
    fn test_unstomped_vulnerable_returns_to_attacking() {
        let mut rng = Pcg32::seed_from_u64(6);
        let (mut b, mut t) = boss(2);
        b.phase = BossPhase::Vulnerable { timer: DT / 2.0 };
        b.advance(&mut t, idle_player(), DT, &mut rng);
        assert!(matches!(b.phase, BossPhase::Attacking { .. }));
        assert_eq!(b.health, 4);
    }

    #[test]
    fn test_volley_fires_planned_count_then_vulnerable() {
        for tier in [1, 4, 9] {
            let mut rng = Pcg32::seed_from_u64(7);
            let (mut b, mut t) = boss(tier);
            b.phase = BossPhase::ProjectileFire {
                timer: FIRE_DURATION,
                fired: 0,
                total: volley_size(tier),
            };
            let mut shots = 0;
            while !b.is_vulnerable() {
                let events = b.advance(&mut t, idle_player(), DT, &mut rng);
                shots += events
                    .iter()
                    .filter(|e| matches!(e, BossEvent::Fire { .. }))
                    .count() as u32;
            }
            assert_eq!(shots, volley_size(tier));
        }
    }

    #[test]
    fn test_slam_lands_with_shockwave() {
        let mut rng = Pcg32::seed_from_u64(8);
        let (mut b, mut t) = boss(1);
        b.phase = BossPhase::SlamFall { timer: DT / 2.0 };
        let events = b.advance(&mut t, idle_player(), DT, &mut rng);
        assert!(matches!(events[0], BossEvent::Shockwave { center } if center.y == 0.0));
        assert!(b.is_vulnerable());
        assert_eq!(b.eye_color(), EyeColor::Green);
    }

    #[test]
    fn test_tier_scaling() {
        assert!(slam_rise_duration(5) < slam_rise_duration(1));
        assert_eq!(slam_rise_duration(20), 0.4);
        assert!(aim_duration(3) < aim_duration(1));
        assert_eq!(vulnerable_duration(20), 2.5);
        assert_eq!(volley_size(1), 1);
        assert_eq!(volley_size(4), 3);
        assert!(follow_rate(5) < follow_rate(1));
        assert_eq!(follow_rate(50), 0.02);
    }
}
