use crate::layout::LayoutContext;
use log::info;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

// ─── Scroll animation ───────────────────────────────────────────────────────

/// Linear scroll from one offset to another, polled by wall-clock time.
///
/// Nothing advances on its own: `offset_at(now)` is a pure function of the
/// start point, the target and the elapsed fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnimation {
    from: f32,
    to: f32,
    start_ms: u64,
    duration_ms: u64,
}

impl ScrollAnimation {
    pub fn new() -> Self {
        Self::still(0.0)
    }

    fn still(x: f32) -> Self {
        Self {
            from: x,
            to: x,
            start_ms: 0,
            duration_ms: 0,
        }
    }

    /// Start scrolling from wherever the current animation is at `now_ms`.
    pub fn start(&mut self, to: f32, now_ms: u64, duration_ms: u64) {
        let from = self.offset_at(now_ms);
        *self = Self {
            from,
            to,
            start_ms: now_ms,
            duration_ms,
        };
    }

    /// Jump without animating, abandoning whatever was in flight.
    pub fn snap(&mut self, x: f32) {
        *self = Self::still(x);
    }

    pub fn offset_at(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        if self.duration_ms == 0 || elapsed >= self.duration_ms {
            return self.to;
        }
        let t = elapsed as f32 / self.duration_ms as f32;
        self.from + (self.to - self.from) * t
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_finished(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.start_ms) >= self.duration_ms
    }
}

impl Default for ScrollAnimation {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Progress controller ────────────────────────────────────────────────────

/// What an `advance` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Negative progress or nothing loaded
    Ignored,
    /// Progress moved forward (or stayed); scroll animates toward the target
    Scrolled,
    /// Progress moved backward; scroll snapped and cross-event state must reset
    Seeked,
}

/// Turns the external playback clock into a scroll offset.
///
/// Forward steps animate linearly across the gap between clock ticks so a
/// coarse clock still scrolls smoothly. Backward steps are seeks: they snap.
pub struct ProgressController {
    current_progress: i64,
    scroll: ScrollAnimation,
    seek_count: u64,
}

impl ProgressController {
    pub fn new() -> Self {
        Self {
            current_progress: 0,
            scroll: ScrollAnimation::new(),
            seek_count: 0,
        }
    }

    pub fn advance(
        &mut self,
        progress_ms: i64,
        model_empty: bool,
        ctx: &LayoutContext,
        now_ms: u64,
    ) -> Advance {
        if model_empty || progress_ms < 0 {
            return Advance::Ignored;
        }
        let target = ctx.scroll_target(progress_ms);

        if progress_ms < self.current_progress {
            self.seek_count += 1;
            info!(
                "Seek: {}ms → {}ms (scroll snaps to {:.1}px)",
                self.current_progress, progress_ms, target
            );
            self.scroll.snap(target);
            self.current_progress = progress_ms;
            return Advance::Seeked;
        }

        let delta_ms = progress_ms.abs_diff(self.current_progress);
        self.scroll.start(target, now_ms, delta_ms);
        self.current_progress = progress_ms;
        Advance::Scrolled
    }

    /// Snap the scroll onto the current progress under new geometry,
    /// dropping any animation in flight.
    pub fn retarget(&mut self, ctx: &LayoutContext) {
        self.scroll.snap(ctx.scroll_target(self.current_progress));
    }

    /// Scroll offset to render with at `now_ms`.
    pub fn scroll_offset(&self, now_ms: u64) -> f32 {
        self.scroll.offset_at(now_ms)
    }

    /// Where the scroll is heading: exactly `progress · speed` as of the
    /// last accepted `advance`.
    pub fn scroll_target(&self) -> f32 {
        self.scroll.target()
    }

    pub fn current_progress(&self) -> i64 {
        self.current_progress
    }

    pub fn is_scrolling(&self, now_ms: u64) -> bool {
        !self.scroll.is_finished(now_ms)
    }

    pub fn seek_count(&self) -> u64 {
        self.seek_count
    }
}

impl Default for ProgressController {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Cross-thread progress slot ─────────────────────────────────────────────

const EMPTY_SLOT: i64 = i64::MIN;

/// Single-value mailbox for the playback clock.
///
/// The clock thread publishes with Release, the update loop reads with
/// Acquire; only the most recent value matters.
#[derive(Clone)]
pub struct ProgressSlot {
    value: Arc<AtomicI64>,
}

impl ProgressSlot {
    pub fn new() -> Self {
        Self {
            value: Arc::new(AtomicI64::new(EMPTY_SLOT)),
        }
    }

    pub fn publish(&self, progress_ms: i64) {
        self.value.store(progress_ms, Ordering::Release);
    }

    /// Latest published progress, or `None` if the clock has not ticked yet.
    pub fn latest(&self) -> Option<i64> {
        match self.value.load(Ordering::Acquire) {
            EMPTY_SLOT => None,
            v => Some(v),
        }
    }
}

impl Default for ProgressSlot {
    fn default() -> Self {
        Self::new()
    }
}
