//! Per-frame simulation step
//!
//! Advances one level attempt by a wall-clock delta. Order matters and follows
//! the frame: ground, pound landing, walk, gravity, jump, pickups, hazards,
//! damage, checkpoint/tunnel, entity behaviour, boss, camera.

use glam::{Vec2, Vec3};

use super::behavior::{self, BehaviorCtx, Outcome, laser_beam};
use super::boss::{BODY_RADIUS, BossEvent, PlayerView};
use super::collision::{Aabb, beam_contact, near_surface, over_footprint, ring_contact};
use super::entity::{EntityId, EntityKind, RamPhase};
use super::level::PlatformKind;
use super::session::SessionHost;
use super::state::{GamePhase, GameState, SessionStatus};
use crate::audio::{AudioSink, SoundCue, play_cue};
use crate::consts::*;

/// Music volume handed to the sink when a loop (re)starts
pub const MUSIC_VOLUME: f32 = 0.5;
/// Skull contact distance
const SKULL_CONTACT: f32 = 1.0;
const GHOST_CONTACT: f32 = 1.0;
const SPIKE_CONTACT: f32 = 1.2;
const RAM_BOT_CONTACT: f32 = 1.2;
const BOSS_PROJECTILE_CONTACT: f32 = 1.0;
const LASER_BEAM_RADIUS: f32 = 0.1;
const SHOCKWAVE_THICKNESS: f32 = 1.5;
/// Stomper hit box half size
const STOMPER_HALF_EXTENT: f32 = 1.0;

/// Input sampled once per tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Stick/keys in `[-1, 1]`; `x` right, `y` forward
    pub movement: Vec2,
    /// Jump button held
    pub jump: bool,
    /// Ground-pound button held
    pub ground_pound: bool,
    /// Pause requested (held state, e.g. menu open)
    pub pause: bool,
}

impl TickInput {
    /// Movement with NaNs dropped and length capped at 1
    pub fn sanitized_movement(&self) -> Vec2 {
        let m = self.movement;
        if !m.is_finite() {
            return Vec2::ZERO;
        }
        if m.length_squared() > 1.0 {
            m.normalize_or_zero()
        } else {
            m
        }
    }
}

/// Side-effect services for a tick
pub struct Services<'a> {
    pub audio: &'a mut dyn AudioSink,
    pub host: &'a mut dyn SessionHost,
}

/// What one tick produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameResult {
    pub score: u32,
    pub lives: u32,
    pub phase: GamePhase,
    pub paused: bool,
    /// Set on the one frame the session-end signal was delivered
    pub session_end: Option<SessionStatus>,
    pub boss_health: Option<(u32, u32)>,
}

impl FrameResult {
    fn of(state: &GameState, session_end: Option<SessionStatus>) -> Self {
        Self {
            score: state.player.score,
            lives: state.player.lives,
            phase: state.phase,
            paused: state.paused,
            session_end,
            boss_health: state.boss_health(),
        }
    }
}

/// Clamp a raw frame delta into a safe physics step
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt.min(MAX_FRAME_DT)
    } else {
        0.0
    }
}

/// Advance the game state by one frame
pub fn tick(
    state: &mut GameState,
    input: &TickInput,
    dt: f32,
    services: &mut Services,
) -> FrameResult {
    let mut dt = clamp_dt(dt);

    // Pause is a frame-level short circuit
    if input.pause {
        if !state.paused {
            state.paused = true;
            services.audio.stop_loop(state.theme.music_track());
            log::debug!("Paused");
        }
        return FrameResult::of(state, None);
    }
    if state.paused {
        state.paused = false;
        services
            .audio
            .play_loop(state.theme.music_track(), MUSIC_VOLUME);
        log::debug!("Resumed");
        // No catch-up for the paused gap
        dt = 0.0;
    }

    state.time += dt;
    state.player.tick_invulnerability(dt);

    if state.phase == GamePhase::Playing {
        step_player(state, input, dt, services.audio);
    }

    advance_entities(state, dt, services.audio);
    advance_boss(state, dt, services.audio);
    state.flush_spawns();

    state.update_camera(dt);
    state.update_tunnel_glow(dt);

    let session_end = state.advance_session_end(dt);
    if let Some(status) = session_end {
        log::info!("Session end: {:?}", status);
        services.host.on_session_end(status);
    }

    FrameResult::of(state, session_end)
}

/// Player physics, pickups, damage and objectives
fn step_player(state: &mut GameState, input: &TickInput, dt: f32, audio: &mut dyn AudioSink) {
    let was_grounded = state.player.grounded;
    let was_pounding = state.player.pounding;

    // 1. Grounding
    ground_player(state, dt, audio);

    // 2. Ground-pound landing
    if was_pounding && !was_grounded && state.player.grounded {
        pound_landing(state, audio);
    }

    // 3. Walk
    if !state.player.pounding {
        let speed = state.upgrades.move_speed();
        state.player.walk(input.sanitized_movement(), speed, dt);
    }

    // 4. Gravity and ground pound
    state.player.velocity.y -= GRAVITY * dt;
    state.player.try_ground_pound(input.ground_pound, &state.upgrades);

    // 5. Jump
    if state.player.try_jump(input.jump, &state.upgrades).is_some() {
        audio.play(SoundCue::Jump, 0.5, 1.0);
    }
    state.player.position.y += state.player.velocity.y * dt;

    // 6. Pickups
    collect_pickups(state, audio);

    // 7-8. Hazards and damage
    if !state.player.is_invulnerable() && hazard_contact(state, audio) {
        audio.play(SoundCue::PlayerHurt, 1.0, 1.0);
        if state.lose_life() {
            play_cue(audio, SoundCue::GameOver);
            return;
        }
    }

    // 9. Checkpoint and tunnel
    check_objectives(state, audio);
}

fn ground_player(state: &mut GameState, dt: f32, audio: &mut dyn AudioSink) {
    let p = state.player.position;
    let falling = state.player.velocity.y <= 0.0;

    let mut best: Option<(f32, EntityId)> = None;
    if falling {
        for e in state.entities.iter().filter(|e| e.visible) {
            let EntityKind::Platform(platform) = &e.kind else {
                continue;
            };
            let top = e.position().y + PLATFORM_THICKNESS / 2.0;
            let half = platform.half_extents(e.transform.scale);
            if over_footprint(p, PLAYER_RADIUS, e.position(), half)
                && near_surface(p, PLAYER_RADIUS, top, GROUND_TOLERANCE)
                && best.is_none_or(|(y, _)| top > y)
            {
                best = Some((top, e.id));
            }
        }
    }

    let Some((top, id)) = best else {
        state.player.leave_ground();
        return;
    };

    state.player.land(top, id);
    let Some(EntityKind::Platform(platform)) = state.entity_mut(id).map(|e| &mut e.kind) else {
        return;
    };

    let mut carry = Vec3::ZERO;
    let kind = platform.kind;
    match kind {
        PlatformKind::Moving { .. } => carry = platform.velocity * dt,
        PlatformKind::Shrinking { .. } => {
            if platform.start_shrinking() {
                log::debug!("Platform {} started shrinking", id.0);
            }
        }
        _ => {}
    }
    state.player.position += carry;

    match kind {
        PlatformKind::JumpPad => {
            launch(state, BASE_JUMP_FORCE * JUMP_PAD_BOOST);
            audio.play(SoundCue::JumpPad, 1.0, 1.0);
        }
        PlatformKind::BouncePad => {
            launch(state, BASE_JUMP_FORCE * BOUNCE_PAD_BOOST);
            audio.play(SoundCue::JumpPad, 0.6, 1.2);
        }
        _ => {}
    }
}

/// Pad launch: counts as the first jump of the chain
fn launch(state: &mut GameState, velocity: f32) {
    state.player.velocity.y = velocity;
    state.player.jumps = 1;
    state.player.pounding = false;
    state.player.leave_ground();
}

fn pound_landing(state: &mut GameState, audio: &mut dyn AudioSink) {
    state.player.pounding = false;
    audio.play(SoundCue::GroundSlam, 0.8, 1.0);

    let center = state.player.position - Vec3::new(0.0, PLAYER_RADIUS, 0.0);
    let ring = state.registry.pound_ring(center);
    state.spawn(ring);

    let player = state.player.position;
    let mut killed = 0;
    for e in &mut state.entities {
        let pos = e.position();
        if let EntityKind::Skull { dying, .. } = &mut e.kind {
            if dying.is_none() && pos.distance(player) < GROUND_POUND_RADIUS {
                *dying = Some(behavior::SKULL_DEATH_TIME);
                killed += 1;
            }
        }
    }
    log::debug!("Ground pound landed, {} hazards destroyed", killed);
}

fn collect_pickups(state: &mut GameState, audio: &mut dyn AudioSink) {
    let p = state.player.position;
    let num_apples = state.num_apples;
    let max_lives = state.upgrades.max_lives.max(1);

    let mut apples = 0;
    let mut hearts = 0;
    for e in state.entities.iter_mut().filter(|e| e.visible) {
        if e.position().distance(p) >= PICKUP_RADIUS {
            continue;
        }
        match &mut e.kind {
            EntityKind::Apple { collected, .. } if !*collected => {
                *collected = true;
                e.visible = false;
                apples += 1;
            }
            EntityKind::Heart { .. } => {
                e.visible = false;
                hearts += 1;
            }
            _ => {}
        }
    }

    for _ in 0..apples {
        state.player.score = (state.player.score + 1).min(num_apples);
        audio.play(SoundCue::CollectApple, 0.5, 1.5);
    }
    for _ in 0..hearts {
        state.player.lives = (state.player.lives + 1).min(max_lives);
        play_cue(audio, SoundCue::CollectHeart);
    }
    if hearts > 0 {
        state
            .entities
            .retain(|e| e.visible || !matches!(e.kind, EntityKind::Heart { .. }));
    }
}

/// Resolve stomps and report whether anything hurt the player
fn hazard_contact(state: &mut GameState, audio: &mut dyn AudioSink) -> bool {
    let p = state.player.position;
    let vy = state.player.velocity.y;
    let pounding = state.player.pounding;
    let stomp_bounce = state.upgrades.jump_force() * STOMP_BOUNCE;

    let mut damage = p.y < DEATH_Y_LEVEL;
    let mut stomped = false;
    let mut spent_shots: Vec<EntityId> = Vec::new();

    for e in state.entities.iter_mut().filter(|e| e.visible) {
        let pos = e.position();
        let dist = pos.distance(p);
        match &mut e.kind {
            EntityKind::Skull { dying, .. } => {
                if dying.is_some() || dist >= SKULL_CONTACT {
                    continue;
                }
                let from_above = vy < STOMP_FALL_SPEED && p.y - PLAYER_RADIUS > pos.y - 0.2;
                if from_above && !pounding {
                    *dying = Some(behavior::SKULL_DEATH_TIME);
                    stomped = true;
                } else {
                    damage = true;
                }
            }
            EntityKind::Stomper { .. } => {
                if Aabb::from_center(pos, Vec3::splat(STOMPER_HALF_EXTENT)).contains_point(p) {
                    damage = true;
                }
            }
            EntityKind::Ghost { .. } => damage |= dist < GHOST_CONTACT,
            EntityKind::SpikeBlock { .. } => damage |= dist < SPIKE_CONTACT,
            EntityKind::RamBot { phase, .. } => {
                damage |= matches!(phase, RamPhase::Charging { .. }) && dist < RAM_BOT_CONTACT;
            }
            EntityKind::Projectile { from_boss, .. } => {
                let reach = if *from_boss {
                    BOSS_PROJECTILE_CONTACT
                } else {
                    PLAYER_RADIUS + 0.2
                };
                if dist < reach {
                    damage = true;
                    spent_shots.push(e.id);
                }
            }
            EntityKind::Laser { .. } => {
                let (a, b) = laser_beam(e);
                damage |= beam_contact(p, PLAYER_RADIUS, a, b, LASER_BEAM_RADIUS);
            }
            EntityKind::Shockwave { age, speed, .. } => {
                let radius = *age * *speed;
                damage |= ring_contact(p, PLAYER_RADIUS, pos, radius, SHOCKWAVE_THICKNESS);
            }
            EntityKind::Boss(boss) => {
                damage |= boss.is_attacking() && dist < PLAYER_RADIUS + BODY_RADIUS;
            }
            _ => {}
        }
    }

    if stomped {
        state.player.velocity.y = stomp_bounce;
        play_cue(audio, SoundCue::EnemyStomp);
    }
    if !spent_shots.is_empty() {
        state.entities.retain(|e| !spent_shots.contains(&e.id));
    }
    damage
}

fn check_objectives(state: &mut GameState, audio: &mut dyn AudioSink) {
    let p = state.player.position;

    let checkpoint = state.entities.iter().find_map(|e| match e.kind {
        EntityKind::Checkpoint { claimed: false } if e.position().distance(p) < TRIGGER_RADIUS => {
            Some(e.id)
        }
        _ => None,
    });
    if let Some(id) = checkpoint {
        state.claim_checkpoint(id);
        play_cue(audio, SoundCue::Checkpoint);
    }

    let at_tunnel = state.entities.iter().any(|e| {
        matches!(e.kind, EntityKind::EndTunnel)
            && e.visible
            && e.position().distance(p) < TRIGGER_RADIUS
    });
    if at_tunnel && (state.is_boss_level || state.all_apples_collected()) {
        log::info!("Level {} complete", state.level);
        state.phase = GamePhase::LevelComplete;
        state.schedule_session_end(SessionStatus::LevelComplete);
        play_cue(audio, SoundCue::LevelComplete);
    }
}

fn advance_entities(state: &mut GameState, dt: f32, audio: &mut dyn AudioSink) {
    let ctx = BehaviorCtx {
        time: state.time,
        dt,
        player: state.player.position,
    };

    let mut removed: Vec<EntityId> = Vec::new();
    let mut shots: Vec<(Vec3, Vec3)> = Vec::new();
    for e in &mut state.entities {
        match behavior::advance(e, &ctx) {
            Outcome::Keep => {}
            Outcome::Remove => removed.push(e.id),
            Outcome::Fire { origin, velocity } => shots.push((origin, velocity)),
            Outcome::Charge => play_cue(audio, SoundCue::RamBotCharge),
        }
    }

    if !removed.is_empty() {
        state.entities.retain(|e| !removed.contains(&e.id));
    }
    for (origin, velocity) in shots {
        let shot = state.registry.projectile(origin, velocity, false);
        state.spawn(shot);
        play_cue(audio, SoundCue::LaserFire);
    }
}

fn advance_boss(state: &mut GameState, dt: f32, audio: &mut dyn AudioSink) {
    let view = PlayerView {
        position: state.player.position,
        velocity_y: state.player.velocity.y,
    };
    let time = state.time;
    let reduced_motion = state.reduced_motion;

    let Some(entity) = state
        .entities
        .iter_mut()
        .find(|e| matches!(e.kind, EntityKind::Boss(_)))
    else {
        return;
    };
    let EntityKind::Boss(boss) = &mut entity.kind else {
        return;
    };
    let events = boss.advance(&mut entity.transform, view, dt, &mut state.rng);
    entity.visible = reduced_motion || boss.flicker_visible(time);
    let boss_id = entity.id;

    for event in events {
        match event {
            BossEvent::Fire { origin, velocity } => {
                let shot = state.registry.projectile(origin, velocity, true);
                state.spawn(shot);
                audio.play(SoundCue::LaserFire, 0.4, 1.2);
            }
            BossEvent::Shockwave { center } => {
                let wave = state.registry.shockwave(center);
                state.spawn(wave);
                audio.play(SoundCue::GroundSlam, 0.8, 1.0);
            }
            BossEvent::Stomped { remaining } => {
                log::debug!("Boss stomped, {} health left", remaining);
                state.player.velocity.y = state.upgrades.jump_force();
                audio.play(SoundCue::EnemyStomp, 0.8, 0.8);
            }
            BossEvent::Defeated => {
                log::info!("Boss defeated on level {}", state.level);
                state.entities.retain(|e| e.id != boss_id);
                for e in &mut state.entities {
                    if matches!(e.kind, EntityKind::EndTunnel) {
                        e.visible = true;
                    }
                }
            }
        }
    }
}
