use log::trace;

pub const DEFAULT_ANIM_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fall {
    from: f32,
    to: f32,
    start_ms: u64,
}

/// Pitch value driving the indicator's vertical position.
///
/// A hit starts a linear fall from the hit pitch to the lowest lane; a
/// newer hit replaces the running fall outright. The value is computed
/// from elapsed time whenever it is read.
pub struct IndicatorAnimator {
    duration_ms: u64,
    fall: Option<Fall>,
    rest: f32,
}

impl IndicatorAnimator {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            fall: None,
            rest: 0.0,
        }
    }

    pub fn start(&mut self, from_pitch: f32, to_pitch: f32, now_ms: u64) {
        trace!("Indicator fall {:.0} → {:.0}", from_pitch, to_pitch);
        self.fall = Some(Fall {
            from: from_pitch,
            to: to_pitch,
            start_ms: now_ms,
        });
        self.rest = to_pitch;
    }

    /// Place the indicator at `pitch` with no animation in flight.
    pub fn settle(&mut self, pitch: f32) {
        self.fall = None;
        self.rest = pitch;
    }

    pub fn value_at(&self, now_ms: u64) -> f32 {
        match self.fall {
            Some(f) => {
                let elapsed = now_ms.saturating_sub(f.start_ms);
                if self.duration_ms == 0 || elapsed >= self.duration_ms {
                    f.to
                } else {
                    let t = elapsed as f32 / self.duration_ms as f32;
                    f.from + (f.to - f.from) * t
                }
            }
            None => self.rest,
        }
    }

    pub fn is_running(&self, now_ms: u64) -> bool {
        self.fall
            .map(|f| now_ms.saturating_sub(f.start_ms) < self.duration_ms)
            .unwrap_or(false)
    }
}

impl Default for IndicatorAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_ANIM_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_fall() {
        let mut a = IndicatorAnimator::default();
        a.settle(55.0);
        assert_eq!(a.value_at(0), 55.0);
        a.start(67.0, 55.0, 1000);
        assert_eq!(a.value_at(1000), 67.0);
        assert_eq!(a.value_at(2500), 61.0);
        assert_eq!(a.value_at(4000), 55.0);
        assert_eq!(a.value_at(9000), 55.0);
        assert!(a.is_running(3999));
        assert!(!a.is_running(4000));
    }

    #[test]
    fn test_latest_hit_wins() {
        let mut a = IndicatorAnimator::default();
        a.start(70.0, 50.0, 0);
        a.start(60.0, 50.0, 1500);
        assert_eq!(a.value_at(1500), 60.0);
        assert_eq!(a.value_at(3000), 55.0);
    }

    #[test]
    fn test_settle_cancels() {
        let mut a = IndicatorAnimator::default();
        a.start(70.0, 50.0, 0);
        a.settle(48.0);
        assert_eq!(a.value_at(100), 48.0);
        assert!(!a.is_running(100));
    }
}
