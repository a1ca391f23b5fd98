//! Session driver: owns one level attempt and its injected services

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::generator::generate_level;
use super::level::LevelData;
use super::state::{GameState, RenderSnapshot, SessionStatus};
use super::tick::{FrameResult, MUSIC_VOLUME, Services, TickInput, tick};
use crate::audio::AudioSink;
use crate::consts::MAX_FRAME_DT;
use crate::resources::ResourceProvider;
use crate::{Settings, Upgrades};

/// Receives the terminal result of an attempt
pub trait SessionHost {
    fn on_session_end(&mut self, status: SessionStatus);
}

/// Host that only logs
#[derive(Debug, Default)]
pub struct LogHost;

impl SessionHost for LogHost {
    fn on_session_end(&mut self, status: SessionStatus) {
        log::info!("Session ended: {:?}", status);
    }
}

/// Host that remembers every signal, for tests and replays
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub ends: Vec<SessionStatus>,
}

impl SessionHost for RecordingHost {
    fn on_session_end(&mut self, status: SessionStatus) {
        self.ends.push(status);
    }
}

/// Turns wall-clock timestamps (seconds) into clamped frame deltas
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta since the previous call; the first call yields zero
    pub fn delta(&mut self, now: f64) -> f32 {
        let dt = match self.last {
            Some(last) if now.is_finite() => (now - last).clamp(0.0, MAX_FRAME_DT as f64) as f32,
            _ => 0.0,
        };
        if now.is_finite() {
            self.last = Some(now);
        }
        dt
    }

    /// Forget the previous timestamp (after a pause or tab switch)
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// One running level attempt with its audio and host
pub struct Simulation<A: AudioSink, H: SessionHost> {
    state: GameState,
    audio: A,
    host: H,
    clock: FrameClock,
    settings: Settings,
    rng: Pcg32,
}

impl<A: AudioSink, H: SessionHost> Simulation<A, H> {
    /// Generate `level` and start its music
    pub fn new(
        level: u32,
        upgrades: Upgrades,
        settings: Settings,
        provider: &mut dyn ResourceProvider,
        seed: u64,
        audio: A,
        host: H,
    ) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let state = load_state(level, upgrades, &settings, provider, &mut rng);
        let mut sim = Self {
            state,
            audio,
            host,
            clock: FrameClock::new(),
            settings,
            rng,
        };
        sim.start_music();
        sim
    }

    /// Drive one frame from a wall-clock timestamp in seconds
    pub fn frame(&mut self, now: f64, input: &TickInput) -> FrameResult {
        if input.pause {
            self.clock.reset();
        }
        let dt = self.clock.delta(now);
        self.step(dt, input)
    }

    /// Drive one frame from an explicit delta
    pub fn step(&mut self, dt: f32, input: &TickInput) -> FrameResult {
        let mut services = Services {
            audio: &mut self.audio,
            host: &mut self.host,
        };
        tick(&mut self.state, input, dt, &mut services)
    }

    /// Discard the current attempt and load `level` fresh
    pub fn reload(&mut self, level: u32, upgrades: Upgrades, provider: &mut dyn ResourceProvider) {
        self.stop_music();
        self.state = load_state(level, upgrades, &self.settings, provider, &mut self.rng);
        self.clock.reset();
        self.start_music();
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn render_snapshot(&self) -> RenderSnapshot {
        self.state.render_snapshot()
    }

    fn start_music(&mut self) {
        self.audio
            .play_loop(self.state.theme.music_track(), MUSIC_VOLUME);
    }

    fn stop_music(&mut self) {
        self.audio.stop_loop(self.state.theme.music_track());
    }
}

impl<A: AudioSink, H: SessionHost> Drop for Simulation<A, H> {
    fn drop(&mut self) {
        self.stop_music();
    }
}

fn load_state(
    level: u32,
    upgrades: Upgrades,
    settings: &Settings,
    provider: &mut dyn ResourceProvider,
    rng: &mut Pcg32,
) -> GameState {
    let data: LevelData = generate_level(level, rng);
    let seed = rng.random::<u64>();
    GameState::new(&data, upgrades, settings, provider, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioEvent, RecordingAudio};
    use crate::resources::KindHandles;
    use crate::sim::state::GamePhase;

    fn sim(level: u32) -> Simulation<RecordingAudio, RecordingHost> {
        Simulation::new(
            level,
            Upgrades::default(),
            Settings::default(),
            &mut KindHandles,
            42,
            RecordingAudio::default(),
            RecordingHost::default(),
        )
    }

    #[test]
    fn test_frame_clock_clamps() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta(10.0), 0.0);
        assert!((clock.delta(10.016) - 0.016).abs() < 1e-5);
        assert_eq!(clock.delta(12.0), MAX_FRAME_DT);
        // Time going backwards is not negative time
        assert_eq!(clock.delta(11.0), 0.0);
        clock.reset();
        assert_eq!(clock.delta(50.0), 0.0);
    }

    #[test]
    fn test_music_follows_theme() {
        let s = sim(1);
        let track = s.state().theme.music_track().to_string();
        assert_eq!(s.audio().events, vec![AudioEvent::StartLoop(track)]);
    }

    #[test]
    fn test_boss_level_plays_boss_track() {
        let s = sim(10);
        assert_eq!(
            s.audio().events,
            vec![AudioEvent::StartLoop(crate::theme::BOSS_TRACK.to_string())]
        );
    }

    #[test]
    fn test_reload_swaps_music() {
        let mut s = sim(1);
        s.reload(2, Upgrades::default(), &mut KindHandles);
        assert_eq!(s.state().level, 2);
        assert_eq!(s.audio().events.len(), 3);
        assert!(matches!(s.audio().events[1], AudioEvent::StopLoop(_)));
    }

    #[test]
    fn test_same_seed_same_world() {
        let a = sim(7);
        let b = sim(7);
        assert_eq!(a.state().entities, b.state().entities);
    }

    #[test]
    fn test_game_over_reaches_host_once() {
        let mut s = sim(1);
        s.state_mut().player.lives = 1;
        s.state_mut().player.position.y = -100.0;
        let mut now = 0.0;
        for _ in 0..400 {
            now += 1.0 / 60.0;
            s.frame(now, &TickInput::default());
        }
        assert_eq!(s.state().phase, GamePhase::GameOver);
        assert_eq!(s.host().ends, vec![SessionStatus::GameOver]);
    }
}
