use crate::layout::LayoutContext;
use crate::model::TimelineModel;
use log::{debug, trace};

/// Incremental forward scan over the sorted timeline.
///
/// `start_index` is the lowest event that has not yet scrolled fully past
/// the left edge. It only moves forward during playback and is rewound to
/// 0 on seek or reload, so each frame touches roughly the events on screen
/// instead of the whole chart.
pub struct VisibilityWindow {
    start_index: usize,
    visible: Vec<usize>,
}

impl VisibilityWindow {
    pub fn new() -> Self {
        Self {
            start_index: 0,
            visible: Vec::new(),
        }
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Indices drawn by the last scan, in order.
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    pub fn reset(&mut self) {
        self.start_index = 0;
        self.visible.clear();
    }

    /// Run one render-pass scan at `scroll_offset`.
    ///
    /// Events that have left the view lose their feedback regions, since
    /// they will not be drawn again. Event 0 entering view switches the
    /// indicator on; the last event leaving view switches it off.
    pub fn scan(
        &mut self,
        model: &mut TimelineModel,
        ctx: &LayoutContext,
        scroll_offset: f32,
        indicator_active: &mut bool,
    ) {
        self.visible.clear();
        let len = model.len();
        if len == 0 {
            return;
        }

        let left_edge = ctx.viewport.left_edge();
        let right_edge = ctx.viewport.right_edge();
        let mut first_live: Option<usize> = None;
        let mut stopped_at = len;

        for i in self.start_index..len {
            let te = &mut model.events_mut()[i];
            let screen = te.layout.shifted_x(scroll_offset);

            if screen.left > right_edge {
                stopped_at = i;
                break;
            }
            let exited = screen.right < left_edge;
            let is_last = i == len - 1;
            if i == 0 && !(exited && is_last) && !*indicator_active {
                debug!("First event entered view, indicator active");
                *indicator_active = true;
            }
            if exited {
                if is_last && *indicator_active {
                    debug!("Last event left view, indicator inactive");
                    *indicator_active = false;
                }
                if te.is_hit() {
                    trace!("Event {} left view, dropping feedback", i);
                    te.clear_feedback();
                }
                continue;
            }
            first_live.get_or_insert(i);
            self.visible.push(i);
        }

        // Everything before the first live event (or before the first
        // not-yet-visible one) is gone for good.
        self.start_index = first_live.unwrap_or_else(|| stopped_at.min(len - 1));
    }
}

impl Default for VisibilityWindow {
    fn default() -> Self {
        Self::new()
    }
}
