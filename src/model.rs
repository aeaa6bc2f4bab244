use crate::types::*;
use log::info;
use thiserror::Error;

pub const DEFAULT_PITCH_PADDING: i32 = 5;

/// Why a chart was refused. The previously loaded timeline stays in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("no events to load")]
    Empty,
    #[error("event {index} starts before its predecessor")]
    Unsorted { index: usize },
    #[error("event {index} has negative duration")]
    NegativeDuration { index: usize },
    #[error("event {index} ends past the representable time range")]
    EndOverflow { index: usize },
    #[error("event {index} has pitch {pitch} outside 0..=127")]
    PitchOutOfRange { index: usize, pitch: i32 },
}

/// A loaded event plus its screen-space state.
#[derive(Debug, Clone)]
pub struct TimelineEvent {
    pub event: PitchEvent,
    /// Content-space rectangle, written by the layout pass
    pub layout: Rect,
    feedback: Vec<FeedbackRegion>,
}

impl TimelineEvent {
    fn new(event: PitchEvent) -> Self {
        Self {
            event,
            layout: Rect::default(),
            feedback: Vec::new(),
        }
    }

    pub fn feedback(&self) -> &[FeedbackRegion] {
        &self.feedback
    }

    pub fn add_feedback(&mut self, region: FeedbackRegion) {
        self.feedback.push(region);
    }

    pub fn clear_feedback(&mut self) {
        self.feedback.clear();
        self.feedback.shrink_to_fit();
    }

    pub fn is_hit(&self) -> bool {
        !self.feedback.is_empty()
    }
}

/// Ordered event sequence and its padded pitch range.
///
/// The sequence is only ever replaced as a whole; between loads the sole
/// mutation is the feedback list on each event.
pub struct TimelineModel {
    events: Vec<TimelineEvent>,
    min_pitch: i32,
    max_pitch: i32,
    pitch_padding: i32,
    layout_dirty: bool,
}

impl TimelineModel {
    pub fn new() -> Self {
        Self::with_padding(DEFAULT_PITCH_PADDING)
    }

    pub fn with_padding(pitch_padding: i32) -> Self {
        Self {
            events: Vec::new(),
            min_pitch: MIN_MIDI_PITCH,
            max_pitch: MAX_MIDI_PITCH,
            pitch_padding,
            layout_dirty: true,
        }
    }

    /// Replace the timeline. Events must be in non-decreasing start order;
    /// the forward scans depend on it, so out-of-order input is refused
    /// rather than loaded.
    pub fn load(&mut self, events: &[PitchEvent]) -> Result<(), LoadError> {
        validate(events)?;

        let mut lo = events[0].pitch;
        let mut hi = events[0].pitch;
        for e in events {
            lo = lo.min(e.pitch);
            hi = hi.max(e.pitch);
        }
        self.min_pitch = (lo - self.pitch_padding).max(MIN_MIDI_PITCH);
        self.max_pitch = (hi + self.pitch_padding).min(MAX_MIDI_PITCH);
        self.events = events.iter().copied().map(TimelineEvent::new).collect();
        self.layout_dirty = true;

        info!(
            "Timeline loaded: {} events, pitch range {}..={}",
            self.events.len(),
            self.min_pitch,
            self.max_pitch
        );
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut [TimelineEvent] {
        &mut self.events
    }

    pub fn min_pitch(&self) -> i32 {
        self.min_pitch
    }

    pub fn max_pitch(&self) -> i32 {
        self.max_pitch
    }

    pub fn pitch_padding(&self) -> i32 {
        self.pitch_padding
    }

    pub fn needs_layout(&self) -> bool {
        self.layout_dirty
    }

    pub fn invalidate_layout(&mut self) {
        self.layout_dirty = true;
    }

    pub(crate) fn mark_laid_out(&mut self) {
        self.layout_dirty = false;
    }
}

impl Default for TimelineModel {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(events: &[PitchEvent]) -> Result<(), LoadError> {
    if events.is_empty() {
        return Err(LoadError::Empty);
    }
    let mut prev_start = i64::MIN;
    for (index, e) in events.iter().enumerate() {
        if e.start_ms < prev_start {
            return Err(LoadError::Unsorted { index });
        }
        if e.duration_ms < 0 {
            return Err(LoadError::NegativeDuration { index });
        }
        if e.start_ms.checked_add(e.duration_ms).is_none() {
            return Err(LoadError::EndOverflow { index });
        }
        if !(MIN_MIDI_PITCH..=MAX_MIDI_PITCH).contains(&e.pitch) {
            return Err(LoadError::PitchOutOfRange {
                index,
                pitch: e.pitch,
            });
        }
        prev_start = e.start_ms;
    }
    Ok(())
}
