//! Timeline playback: advances a fractional playhead over wall-clock time.

use serde::{Deserialize, Serialize};

/// Timeline settings persisted with a scene. Missing fields take their defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timeline {
    pub fps: u32,
    pub frame_count: u32,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            fps: 24,
            frame_count: 120,
        }
    }
}

impl Timeline {
    /// Index of the last frame.
    pub fn last_frame(&self) -> i32 {
        self.frame_count.saturating_sub(1) as i32
    }

    pub fn clamp_frame(&self, frame: i32) -> i32 {
        frame.clamp(0, self.last_frame())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopMode {
    Once,
    #[default]
    Loop,
    PingPong,
}

fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Reflect t into [0, span] with a period of 2 * span.
fn ping_pong(t: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    let period = 2.0 * span;
    let m = fmod(t, period);
    if m <= span {
        m
    } else {
        period - m
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Playback {
    pub timeline: Timeline,
    pub loop_mode: LoopMode,
    /// Playback rate multiplier; negative plays backwards.
    pub speed: f32,
    playing: bool,
    /// Unwrapped playhead in frames.
    time: f32,
}

impl Playback {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            loop_mode: LoopMode::default(),
            speed: 1.0,
            playing: false,
            time: 0.0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Move the playhead to an integer frame without playing.
    pub fn seek(&mut self, frame: i32) {
        self.time = frame as f32;
    }

    /// Current playhead in frames, mapped through the loop mode.
    pub fn playhead(&self) -> f32 {
        let last = self.timeline.last_frame() as f32;
        match self.loop_mode {
            LoopMode::Once => self.time.clamp(0.0, last),
            LoopMode::Loop => fmod(self.time, self.timeline.frame_count as f32),
            LoopMode::PingPong => ping_pong(self.time, last),
        }
    }

    /// Advance by `dt` seconds; returns the new playhead. Paused playback does not move.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if !self.playing {
            return self.playhead();
        }
        self.time += dt * self.timeline.fps as f32 * self.speed;
        if self.loop_mode == LoopMode::Once {
            let last = self.timeline.last_frame() as f32;
            if self.time >= last || self.time <= 0.0 {
                self.time = self.time.clamp(0.0, last);
                // stop at either end
                if (self.speed >= 0.0 && self.time >= last) || (self.speed < 0.0 && self.time <= 0.0) {
                    self.playing = false;
                }
            }
        }
        self.playhead()
    }
}
