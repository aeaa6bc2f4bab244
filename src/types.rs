use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

// ─── Timeline events ────────────────────────────────────────────────────────

/// One expected pitch segment of the reference melody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchEvent {
    /// Start time in milliseconds from the beginning of playback
    #[serde(rename = "s")]
    pub start_ms: i64,
    /// Length in milliseconds, never negative in a loaded model
    #[serde(rename = "d")]
    pub duration_ms: i64,
    /// Target MIDI note number, 0–127
    #[serde(rename = "p")]
    pub pitch: i32,
}

impl PitchEvent {
    pub fn new(start_ms: i64, duration_ms: i64, pitch: i32) -> Self {
        Self {
            start_ms,
            duration_ms,
            pitch,
        }
    }

    pub fn end_ms(&self) -> i64 {
        self.start_ms.saturating_add(self.duration_ms)
    }

    pub fn contains(&self, time_ms: i64) -> bool {
        time_ms >= self.start_ms && time_ms <= self.end_ms()
    }
}

impl fmt::Display for PitchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>7}ms +{:>5}ms] {:>3} ({})",
            self.start_ms,
            self.duration_ms,
            self.pitch,
            midi_note_name(self.pitch)
        )
    }
}

// ─── Geometry ───────────────────────────────────────────────────────────────

/// Axis-aligned rectangle in pixels. y grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Same rectangle moved left by `dx` (content → screen space).
    pub fn shifted_x(&self, dx: f32) -> Rect {
        Rect {
            left: self.left - dx,
            top: self.top,
            right: self.right - dx,
            bottom: self.bottom,
        }
    }
}

/// Content-space rectangle recording where the singer matched an event.
pub type FeedbackRegion = Rect;

/// Padding around the drawable area, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Size of the host surface the renderer draws into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub padding: Padding,
    /// Pixels per density-independent unit
    pub density: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, padding: Padding, density: f32) -> Self {
        Self {
            width,
            height,
            padding,
            density,
        }
    }

    /// Convert density-independent units to pixels, rounded the way
    /// display metrics round.
    pub fn dp(&self, dp: f32) -> f32 {
        dp * self.density + 0.5
    }

    /// Left edge of the scrolled content area.
    pub fn left_edge(&self) -> f32 {
        self.padding.left
    }

    /// Right edge of the scrolled content area.
    pub fn right_edge(&self) -> f32 {
        self.width - self.padding.right
    }

    /// Lowest drawable y.
    pub fn bottom_edge(&self) -> f32 {
        self.height - self.padding.bottom
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, Padding::default(), 1.0)
    }
}

// ─── Inter-thread messages ──────────────────────────────────────────────────

/// Inputs delivered to the coordinator from producer threads.
///
/// Playback progress is not in here: it travels through a
/// [`ProgressSlot`](crate::progress::ProgressSlot) so the update loop always
/// sees the latest value rather than a backlog.
#[derive(Debug, Clone)]
pub enum EngineInput {
    Load(Vec<PitchEvent>),
    PitchSample { time_ms: i64, pitch: i32 },
    Score { score: i32, sentence_index: i32 },
    Resize(Viewport),
    Shutdown,
}

// ─── Session clock ──────────────────────────────────────────────────────────

/// Monotonic wall clock for the render loop.
#[derive(Clone)]
pub struct SessionClock {
    start: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Constants ──────────────────────────────────────────────────────────────

pub const MIN_MIDI_PITCH: i32 = 0;
pub const MAX_MIDI_PITCH: i32 = 127;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// "C4"-style name for a MIDI note number.
pub fn midi_note_name(pitch: i32) -> String {
    let name = NOTE_NAMES[pitch.rem_euclid(12) as usize];
    let octave = pitch.div_euclid(12) - 1;
    format!("{}{}", name, octave)
}
