use crate::config::TimelineConfig;
use crate::hit_detector::{Hit, HitDetector};
use crate::indicator::IndicatorAnimator;
use crate::layout::{self, LayoutContext};
use crate::model::{LoadError, TimelineModel, TimelineEvent};
use crate::progress::{Advance, ProgressController};
use crate::renderer::{EventView, IndicatorView, Renderer, ScoreView};
use crate::score::ScoreTracker;
use crate::types::*;
use crate::visibility::VisibilityWindow;
use log::{debug, info, warn};

/// The pitch timeline: model, layout, scroll state, hit feedback, score
/// and indicator, driven from a single update thread.
///
/// Wall-clock time enters only through [`tick`](Self::tick); every
/// animation is evaluated against the last tick, so two engines fed the
/// same calls produce the same frames.
pub struct TimelineEngine {
    config: TimelineConfig,
    model: TimelineModel,
    ctx: LayoutContext,
    progress: ProgressController,
    window: VisibilityWindow,
    hits: HitDetector,
    score: ScoreTracker,
    indicator: IndicatorAnimator,
    indicator_active: bool,
    /// Pixel baseline set at runtime; survives resizes
    baseline_override: Option<f32>,
    now_ms: u64,
}

impl TimelineEngine {
    pub fn new(config: TimelineConfig) -> Self {
        let hits = HitDetector::new(config.tolerance, config.lookahead_ms);
        Self::with_hit_detector(config, hits)
    }

    /// Build with a custom hit detector (e.g. a different pitch matcher).
    pub fn with_hit_detector(config: TimelineConfig, hits: HitDetector) -> Self {
        let mut ctx = LayoutContext::new(config.baseline_dp, config.speed);
        ctx.bar_height = config.bar_height_dp;
        ctx.indicator_width = config.indicator_width_dp;
        ctx.indicator_height = config.indicator_height_dp;
        Self {
            model: TimelineModel::with_padding(config.pitch_padding),
            ctx,
            progress: ProgressController::new(),
            window: VisibilityWindow::new(),
            hits,
            score: ScoreTracker::new(config.score_hide_delay_ms),
            indicator: IndicatorAnimator::new(config.indicator_anim_ms),
            indicator_active: false,
            baseline_override: None,
            now_ms: 0,
            config,
        }
    }

    // ─── Inputs ─────────────────────────────────────────────────────────

    /// Replace the timeline. A refused chart leaves the current one loaded.
    pub fn load(&mut self, events: &[PitchEvent]) -> Result<(), LoadError> {
        if let Err(e) = self.model.load(events) {
            warn!("Chart rejected: {}", e);
            return Err(e);
        }
        self.window.reset();
        self.relayout();
        Ok(())
    }

    /// New surface size. Density-independent config values are converted
    /// to pixels here and the layout is recomputed.
    pub fn resize_viewport(&mut self, width: f32, height: f32, padding: Padding, density: f32) {
        let vp = Viewport::new(width, height, padding, density);
        self.ctx.viewport = vp;
        self.ctx.baseline_x = self
            .baseline_override
            .unwrap_or_else(|| vp.dp(self.config.baseline_dp));
        self.ctx.bar_height = vp.dp(self.config.bar_height_dp);
        self.ctx.indicator_width = vp.dp(self.config.indicator_width_dp);
        self.ctx.indicator_height = vp.dp(self.config.indicator_height_dp);
        info!(
            "Viewport {}x{} @{}x, baseline at {:.0}px",
            width, height, density, self.ctx.baseline_x
        );
        self.model.invalidate_layout();
        self.relayout();
    }

    /// Feed the playback clock. A value below the previous one is a seek.
    pub fn advance(&mut self, progress_ms: i64) -> Advance {
        let outcome =
            self.progress
                .advance(progress_ms, self.model.is_empty(), &self.ctx, self.now_ms);
        if outcome == Advance::Seeked {
            self.reset();
        }
        outcome
    }

    /// Feed one detected pitch. Returns the hit, if any.
    pub fn sample(&mut self, time_ms: i64, user_pitch: i32) -> Option<Hit> {
        if !self.indicator_active || self.model.is_empty() {
            return None;
        }
        self.relayout_if_needed();
        let scroll_offset = self.ctx.scroll_target(self.progress.current_progress());
        let hit = self.hits.sample(
            &mut self.model,
            &self.ctx,
            self.window.start_index(),
            scroll_offset,
            time_ms,
            user_pitch,
        )?;
        self.indicator.start(
            hit.pitch as f32,
            self.model.min_pitch() as f32,
            self.now_ms,
        );
        Some(hit)
    }

    /// Feed a sentence score. Returns true when it started a new sentence.
    pub fn report_score(&mut self, score: i32, sentence_index: i32) -> bool {
        self.score
            .report(score, sentence_index, self.indicator_active, self.now_ms)
    }

    /// Advance wall-clock time for animations and timers.
    pub fn tick(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        self.score.tick(self.now_ms);
        self.relayout_if_needed();
    }

    /// Change the scroll rate. The scroll jumps to where the current
    /// progress sits at the new rate so bars and scroll stay in step.
    pub fn set_speed(&mut self, speed: f32) {
        self.config.speed = speed;
        self.ctx.speed = speed;
        self.progress.retarget(&self.ctx);
        self.model.invalidate_layout();
    }

    /// Pin "now" at a pixel x, overriding the configured baseline across
    /// later resizes.
    pub fn set_baseline_x(&mut self, baseline_x: f32) {
        self.baseline_override = Some(baseline_x);
        self.ctx.baseline_x = baseline_x;
        self.model.invalidate_layout();
    }

    pub fn set_indicator_icon(&mut self, icon: impl Into<String>) {
        self.config.indicator_icon = icon.into();
    }

    // ─── Frame ──────────────────────────────────────────────────────────

    /// Run the visibility scan at the current scroll position and draw
    /// the frame: events and their feedback, then baseline, score and
    /// indicator on top.
    pub fn render(&mut self, r: &mut dyn Renderer) {
        self.relayout_if_needed();
        let scroll_offset = self.scroll_offset();
        self.window.scan(
            &mut self.model,
            &self.ctx,
            scroll_offset,
            &mut self.indicator_active,
        );

        let events = self.model.events();
        for &i in self.window.visible() {
            let te: &TimelineEvent = &events[i];
            r.draw_event(&EventView {
                index: i,
                event: &te.event,
                rect: te.layout.shifted_x(scroll_offset),
                feedback: te.feedback(),
                scroll_offset,
                baseline_x: self.ctx.baseline_x,
            });
        }

        r.draw_baseline(self.ctx.baseline_rect());
        if let Some(score) = self.score_view() {
            r.draw_score(&score);
        }
        r.draw_indicator(&self.indicator_view());
    }

    fn score_view(&self) -> Option<ScoreView> {
        if !self.score.is_visible() || !self.indicator_active {
            return None;
        }
        let vp = &self.ctx.viewport;
        Some(ScoreView {
            text: self.score.score().to_string(),
            right_x: self.ctx.baseline_x - vp.dp(self.config.score_offset_dp),
            baseline_y: vp.dp(self.config.score_top_dp),
        })
    }

    pub fn indicator_view(&self) -> IndicatorView {
        let pitch = self.indicator.value_at(self.now_ms);
        IndicatorView {
            rect: self.ctx.indicator_rect(pitch),
            pitch,
            icon: self.config.indicator_icon.clone(),
        }
    }

    // ─── State ──────────────────────────────────────────────────────────

    /// Drop cross-event state after a seek.
    fn reset(&mut self) {
        self.window.reset();
        self.score.reset();
        if self.indicator_active {
            debug!("Indicator deactivated by seek");
        }
        self.indicator_active = false;
    }

    fn relayout_if_needed(&mut self) {
        if self.model.needs_layout() {
            self.relayout();
        }
    }

    fn relayout(&mut self) {
        layout::recompute(&mut self.ctx, &mut self.model);
        if !self.indicator.is_running(self.now_ms) {
            self.indicator.settle(self.model.min_pitch() as f32);
        }
    }

    pub fn scroll_offset(&self) -> f32 {
        self.progress.scroll_offset(self.now_ms)
    }

    pub fn scroll_target(&self) -> f32 {
        self.progress.scroll_target()
    }

    pub fn current_progress(&self) -> i64 {
        self.progress.current_progress()
    }

    pub fn visible_start_index(&self) -> usize {
        self.window.start_index()
    }

    pub fn is_indicator_active(&self) -> bool {
        self.indicator_active
    }

    pub fn score(&self) -> &ScoreTracker {
        &self.score
    }

    pub fn model(&self) -> &TimelineModel {
        &self.model
    }

    pub fn layout(&self) -> &LayoutContext {
        &self.ctx
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.hit_count()
    }

    pub fn seek_count(&self) -> u64 {
        self.progress.seek_count()
    }
}
