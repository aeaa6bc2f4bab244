use crate::layout::LayoutContext;
use crate::model::TimelineModel;
use crate::types::*;
use log::trace;

pub const DEFAULT_TOLERANCE: i32 = 2;
pub const DEFAULT_LOOKAHEAD_MS: i64 = 120;

/// Decides whether a sung pitch counts for an expected event.
pub trait PitchMatcher: Send {
    fn matches(&self, event: &PitchEvent, time_ms: i64, user_pitch: i32) -> bool;
}

/// Time inside the event (inclusive) and pitch within ± `tolerance` semitones.
#[derive(Debug, Clone, Copy)]
pub struct ToleranceMatcher {
    pub tolerance: i32,
}

impl PitchMatcher for ToleranceMatcher {
    fn matches(&self, event: &PitchEvent, time_ms: i64, user_pitch: i32) -> bool {
        event.contains(time_ms) && (event.pitch - user_pitch).abs() <= self.tolerance
    }
}

/// A recorded match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub index: usize,
    pub pitch: i32,
    pub region: FeedbackRegion,
}

/// Matches live pitch samples against the events around "now" and records
/// a feedback region on the first event that matches.
pub struct HitDetector {
    matcher: Box<dyn PitchMatcher>,
    lookahead_ms: i64,
    hit_count: u64,
}

impl HitDetector {
    pub fn new(tolerance: i32, lookahead_ms: i64) -> Self {
        Self::with_matcher(Box::new(ToleranceMatcher { tolerance }), lookahead_ms)
    }

    pub fn with_matcher(matcher: Box<dyn PitchMatcher>, lookahead_ms: i64) -> Self {
        Self {
            matcher,
            lookahead_ms,
            hit_count: 0,
        }
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// Scan forward from `start_index` for the first event matching the
    /// sample. Stops early once events are past the right edge at
    /// `scroll_offset`. Every match appends a new region; nothing is replaced.
    pub fn sample(
        &mut self,
        model: &mut TimelineModel,
        ctx: &LayoutContext,
        start_index: usize,
        scroll_offset: f32,
        time_ms: i64,
        user_pitch: i32,
    ) -> Option<Hit> {
        let right_edge = ctx.viewport.right_edge();
        let mut found = None;
        for (i, te) in model.events().iter().enumerate().skip(start_index) {
            if self.matcher.matches(&te.event, time_ms, user_pitch) {
                found = Some(i);
                break;
            }
            if te.layout.left - scroll_offset > right_edge {
                break;
            }
        }

        let index = found?;
        let te = &mut model.events_mut()[index];
        let cutoff_ms = te
            .event
            .end_ms()
            .min(time_ms.saturating_add(self.lookahead_ms))
            - time_ms;
        let left = ctx.time_to_x(time_ms);
        let region = Rect::new(
            left,
            te.layout.top,
            left + ctx.duration_to_px(cutoff_ms),
            te.layout.bottom,
        );
        te.add_feedback(region);
        self.hit_count += 1;
        trace!(
            "Hit event {} at {}ms (sung {}, target {}), {} regions",
            index,
            time_ms,
            user_pitch,
            te.event.pitch,
            te.feedback().len()
        );
        Some(Hit {
            index,
            pitch: te.event.pitch,
            region,
        })
    }
}
