//! Time → x and pitch → y mappings.
//!
//! Event rectangles live in content space: x grows with time from the
//! baseline and the renderer subtracts the current scroll offset. The
//! baseline and indicator are fixed in screen space.

use crate::model::TimelineModel;
use crate::types::*;

/// Geometry shared by the layout pass, the visibility scan and hit
/// detection. Recomputed whenever the viewport or the model changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutContext {
    pub viewport: Viewport,
    /// Screen x of "now"
    pub baseline_x: f32,
    /// Pixels per millisecond
    pub speed: f32,
    pub bar_height: f32,
    pub indicator_width: f32,
    pub indicator_height: f32,
    /// Pixels per semitone; 0 when the pitch range is a single value
    pub pitch_unit_height: f32,
    pub min_pitch: i32,
}

impl LayoutContext {
    pub fn new(baseline_x: f32, speed: f32) -> Self {
        Self {
            viewport: Viewport::default(),
            baseline_x,
            speed,
            bar_height: 0.0,
            indicator_width: 0.0,
            indicator_height: 0.0,
            pitch_unit_height: 0.0,
            min_pitch: MIN_MIDI_PITCH,
        }
    }

    /// Content-space x of a playback instant.
    pub fn time_to_x(&self, time_ms: i64) -> f32 {
        self.baseline_x + self.duration_to_px(time_ms)
    }

    pub fn duration_to_px(&self, duration_ms: i64) -> f32 {
        duration_ms as f32 * self.speed
    }

    /// Scroll offset that puts `progress_ms` on the baseline.
    pub fn scroll_target(&self, progress_ms: i64) -> f32 {
        self.duration_to_px(progress_ms)
    }

    /// Height above the lowest lane for a pitch. Higher pitch, smaller y.
    fn pitch_height(&self, pitch: f32) -> f32 {
        (pitch - self.min_pitch as f32) * self.pitch_unit_height
    }

    /// Vertical centre of an event bar at `pitch`.
    pub fn pitch_to_y(&self, pitch: f32) -> f32 {
        self.viewport.bottom_edge() - self.indicator_height * 0.5 - self.pitch_height(pitch)
    }

    pub fn event_rect(&self, event: &PitchEvent) -> Rect {
        let left = self.time_to_x(event.start_ms);
        let right = left + self.duration_to_px(event.duration_ms);
        let top = self.pitch_to_y(event.pitch as f32) - self.bar_height * 0.5;
        Rect::new(left, top, right, top + self.bar_height)
    }

    /// Indicator box for an (interpolated) pitch value. Its right edge
    /// touches the baseline; at `min_pitch` its bottom sits on the padded
    /// bottom edge.
    pub fn indicator_rect(&self, pitch: f32) -> Rect {
        let left = self.baseline_x - self.indicator_width;
        let top = self.viewport.bottom_edge() - self.indicator_height - self.pitch_height(pitch);
        Rect::new(left, top, self.baseline_x, top + self.indicator_height)
    }

    /// The 1 px "now" line.
    pub fn baseline_rect(&self) -> Rect {
        Rect::new(
            self.baseline_x,
            self.viewport.padding.top,
            self.baseline_x + 1.0,
            self.viewport.bottom_edge(),
        )
    }
}

/// Pixels per semitone for the drawable height, guarded against a
/// collapsed pitch range.
pub fn pitch_unit_height(ctx: &LayoutContext, min_pitch: i32, max_pitch: i32) -> f32 {
    let vp = &ctx.viewport;
    let total_height =
        vp.height - vp.padding.top - vp.padding.bottom - ctx.indicator_height;
    let total_pitch = max_pitch - min_pitch;
    if total_pitch > 0 {
        total_height / total_pitch as f32
    } else {
        0.0
    }
}

/// Full layout pass: refresh the pitch scale in `ctx` and write every
/// event's content rectangle. Same inputs always give the same output.
pub fn recompute(ctx: &mut LayoutContext, model: &mut TimelineModel) {
    ctx.min_pitch = model.min_pitch();
    ctx.pitch_unit_height = pitch_unit_height(ctx, model.min_pitch(), model.max_pitch());
    let ctx = *ctx;
    for te in model.events_mut() {
        te.layout = ctx.event_rect(&te.event);
    }
    model.mark_laid_out();
}
