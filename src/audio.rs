//! Audio service
//!
//! The simulation never touches a global audio device. It is handed an
//! [`AudioSink`] and fires named cues at it; playback is the host's problem.

/// Sound effect cues fired by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Player left the ground
    Jump,
    /// Apple picked up
    CollectApple,
    /// Checkpoint flag claimed
    Checkpoint,
    /// End tunnel entered
    LevelComplete,
    /// Life lost
    PlayerHurt,
    /// Hazard or boss stomped
    EnemyStomp,
    /// Last life lost
    GameOver,
    /// Heart picked up
    CollectHeart,
    /// Ram-bot started charging
    RamBotCharge,
    /// Sentinel or boss fired a projectile
    LaserFire,
    /// Jump or bounce pad launch
    JumpPad,
    /// Ground-pound landing
    GroundSlam,
}

impl SoundCue {
    /// Cue name understood by the host's sound bank
    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::Jump => "jump",
            SoundCue::CollectApple => "collectApple",
            SoundCue::Checkpoint => "checkpoint",
            SoundCue::LevelComplete => "levelComplete",
            SoundCue::PlayerHurt => "playerHurt",
            SoundCue::EnemyStomp => "enemyStomp",
            SoundCue::GameOver => "gameOver",
            SoundCue::CollectHeart => "collectHeart",
            SoundCue::RamBotCharge => "ramBotCharge",
            SoundCue::LaserFire => "laserFire",
            SoundCue::JumpPad => "jumpPad",
            SoundCue::GroundSlam => "groundSlam",
        }
    }
}

/// Fire-and-forget audio output
pub trait AudioSink {
    /// Play a one-shot cue
    fn play(&mut self, cue: SoundCue, volume: f32, pitch: f32);
    /// Start (or keep) a looping music track
    fn play_loop(&mut self, track: &str, volume: f32);
    /// Stop a looping music track
    fn stop_loop(&mut self, track: &str);
}

/// Convenience for cues at default volume and pitch
pub fn play_cue(sink: &mut dyn AudioSink, cue: SoundCue) {
    sink.play(cue, 1.0, 1.0);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _cue: SoundCue, _volume: f32, _pitch: f32) {}
    fn play_loop(&mut self, _track: &str, _volume: f32) {}
    fn stop_loop(&mut self, _track: &str) {}
}

/// Writes every request to the log (used by the headless demo)
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, cue: SoundCue, volume: f32, pitch: f32) {
        log::debug!("sfx {} vol={:.2} pitch={:.2}", cue.name(), volume, pitch);
    }

    fn play_loop(&mut self, track: &str, volume: f32) {
        log::info!("music start {} vol={:.2}", track, volume);
    }

    fn stop_loop(&mut self, track: &str) {
        log::info!("music stop {}", track);
    }
}

/// One request captured by [`RecordingAudio`]
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Play(SoundCue),
    StartLoop(String),
    StopLoop(String),
}

/// Keeps every request in order; handy for asserting side effects in tests
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub events: Vec<AudioEvent>,
}

impl RecordingAudio {
    /// How many times `cue` was played
    pub fn count(&self, cue: SoundCue) -> usize {
        self.events
            .iter()
            .filter(|e| **e == AudioEvent::Play(cue))
            .count()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: SoundCue, _volume: f32, _pitch: f32) {
        self.events.push(AudioEvent::Play(cue));
    }

    fn play_loop(&mut self, track: &str, _volume: f32) {
        self.events.push(AudioEvent::StartLoop(track.to_string()));
    }

    fn stop_loop(&mut self, track: &str) {
        self.events.push(AudioEvent::StopLoop(track.to_string()));
    }
}

/// Applies player volume preferences and mute before forwarding to a sink
pub struct AudioMixer<S: AudioSink> {
    inner: S,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
}

impl<S: AudioSink> AudioMixer<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
        }
    }

    /// Build a mixer configured from saved settings
    pub fn from_settings(inner: S, settings: &crate::Settings) -> Self {
        let mut mixer = Self::new(inner);
        mixer.set_master_volume(settings.master_volume);
        mixer.set_sfx_volume(settings.sfx_volume);
        mixer.set_music_volume(settings.music_volume);
        mixer.set_muted(settings.muted);
        mixer
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn effective(&self, channel: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * channel
        }
    }
}

impl<S: AudioSink> AudioSink for AudioMixer<S> {
    fn play(&mut self, cue: SoundCue, volume: f32, pitch: f32) {
        let vol = self.effective(self.sfx_volume) * volume;
        if vol <= 0.0 {
            return;
        }
        self.inner.play(cue, vol, pitch);
    }

    fn play_loop(&mut self, track: &str, volume: f32) {
        // Loops still start while muted so unmuting mid-level has something to raise
        let vol = self.effective(self.music_volume) * volume;
        self.inner.play_loop(track, vol);
    }

    fn stop_loop(&mut self, track: &str) {
        self.inner.stop_loop(track);
    }
}
