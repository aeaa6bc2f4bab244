use log::debug;

pub const DEFAULT_HIDE_DELAY_MS: u64 = 2000;

/// Per-sentence score display with an auto-hide deadline.
///
/// Only a change of sentence index has any effect, so the scoring pipeline
/// may repeat the same report as often as it likes.
pub struct ScoreTracker {
    score: i32,
    sentence_index: i32,
    visible: bool,
    hide_at_ms: Option<u64>,
    hide_delay_ms: u64,
}

impl ScoreTracker {
    pub fn new(hide_delay_ms: u64) -> Self {
        Self {
            score: 0,
            sentence_index: 0,
            visible: false,
            hide_at_ms: None,
            hide_delay_ms,
        }
    }

    /// Returns true when the report started a new sentence.
    ///
    /// The score is only shown while the indicator is active; a newer
    /// sentence moves the hide deadline instead of adding a second one.
    pub fn report(
        &mut self,
        score: i32,
        sentence_index: i32,
        indicator_active: bool,
        now_ms: u64,
    ) -> bool {
        let changed = self.sentence_index != sentence_index;
        self.sentence_index = sentence_index;
        if !changed {
            return false;
        }
        self.score = score;
        if indicator_active {
            self.visible = true;
            self.hide_at_ms = Some(now_ms.saturating_add(self.hide_delay_ms));
            debug!("Sentence {} scored {}", sentence_index, score);
        }
        true
    }

    /// Apply an expired hide deadline.
    pub fn tick(&mut self, now_ms: u64) {
        if let Some(deadline) = self.hide_at_ms {
            if now_ms >= deadline {
                self.visible = false;
                self.hide_at_ms = None;
            }
        }
    }

    pub fn reset(&mut self) {
        self.score = 0;
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn sentence_index(&self) -> i32 {
        self.sentence_index
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn hide_deadline(&self) -> Option<u64> {
        self.hide_at_ms
    }
}

impl Default for ScoreTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HIDE_DELAY_MS)
    }
}
