//! Drawing seam between the timeline engine and whatever paints it.
//!
//! The engine hands a [`Renderer`] screen-space geometry once per frame;
//! pixels, fonts and icons are the renderer's business.

use crate::types::*;
use serde::{Deserialize, Serialize};

/// One on-screen event, in draw order.
#[derive(Debug, Clone, Copy)]
pub struct EventView<'a> {
    pub index: usize,
    pub event: &'a PitchEvent,
    /// Screen-space bar
    pub rect: Rect,
    /// Content-space feedback; use [`EventView::drawable_feedback`]
    pub feedback: &'a [FeedbackRegion],
    pub scroll_offset: f32,
    pub baseline_x: f32,
}

impl<'a> EventView<'a> {
    /// Feedback regions in screen space that have already reached the
    /// baseline. A region still to the right of "now" is not drawn yet.
    pub fn drawable_feedback(&self) -> impl Iterator<Item = Rect> + 'a {
        let dx = self.scroll_offset;
        let baseline = self.baseline_x;
        self.feedback
            .iter()
            .map(move |r| r.shifted_x(dx))
            .filter(move |r| r.right <= baseline)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorView {
    pub rect: Rect,
    /// Interpolated pitch the rectangle was placed at
    pub pitch: f32,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreView {
    pub text: String,
    /// The text's right edge sits here
    pub right_x: f32,
    pub baseline_y: f32,
}

pub trait Renderer {
    fn draw_event(&mut self, view: &EventView<'_>);
    fn draw_baseline(&mut self, rect: Rect);
    fn draw_score(&mut self, score: &ScoreView);
    fn draw_indicator(&mut self, indicator: &IndicatorView);
}

// ─── Frame snapshot ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub index: usize,
    pub event: PitchEvent,
    pub rect: Rect,
    pub feedback: Vec<Rect>,
}

/// Owned copy of everything drawn in one frame. Implements [`Renderer`] so
/// it can be filled straight from the engine and shipped to another thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub now_ms: u64,
    pub progress_ms: i64,
    pub scroll_offset: f32,
    pub viewport: Viewport,
    pub min_pitch: i32,
    pub max_pitch: i32,
    pub visible_start_index: usize,
    pub indicator_active: bool,
    pub events: Vec<EventSnapshot>,
    pub baseline: Option<Rect>,
    pub score: Option<ScoreView>,
    pub indicator: Option<IndicatorView>,
}

impl FrameSnapshot {
    /// Draw this frame again on another renderer.
    pub fn replay(&self, r: &mut dyn Renderer) {
        for e in &self.events {
            r.draw_event(&EventView {
                index: e.index,
                event: &e.event,
                rect: e.rect,
                feedback: &e.feedback,
                scroll_offset: 0.0,
                baseline_x: f32::INFINITY,
            });
        }
        if let Some(b) = self.baseline {
            r.draw_baseline(b);
        }
        if let Some(ref s) = self.score {
            r.draw_score(s);
        }
        if let Some(ref i) = self.indicator {
            r.draw_indicator(i);
        }
    }
}

impl Renderer for FrameSnapshot {
    fn draw_event(&mut self, view: &EventView<'_>) {
        self.events.push(EventSnapshot {
            index: view.index,
            event: *view.event,
            rect: view.rect,
            feedback: view.drawable_feedback().collect(),
        });
    }

    fn draw_baseline(&mut self, rect: Rect) {
        self.baseline = Some(rect);
    }

    fn draw_score(&mut self, score: &ScoreView) {
        self.score = Some(score.clone());
    }

    fn draw_indicator(&mut self, indicator: &IndicatorView) {
        self.indicator = Some(indicator.clone());
    }
}
