use crate::engine::TimelineEngine;
use crate::progress::{Advance, ProgressSlot};
use crate::renderer::FrameSnapshot;
use crate::types::*;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, info, trace};
use std::thread;
use std::time::Duration;

/// The coordinator owns the timeline engine and is the only thread that
/// touches it. Each step it
///
/// 1. drains queued inputs (chart loads, pitch samples, score reports,
///    resizes) from the input channel,
/// 2. picks up the newest playback progress from the [`ProgressSlot`],
/// 3. ticks the engine clock and renders a [`FrameSnapshot`] that is
///    broadcast to every downstream consumer.
///
/// Consumers that fall behind miss frames; the loop never waits on them.
pub struct Coordinator {
    input_rx: Receiver<EngineInput>,
    progress: ProgressSlot,
    frame_txs: Vec<Sender<FrameSnapshot>>,
    engine: TimelineEngine,
    clock: SessionClock,
    last_progress: Option<i64>,
    frame_count: u64,
    dropped_frames: u64,
}

impl Coordinator {
    pub fn new(
        input_rx: Receiver<EngineInput>,
        progress: ProgressSlot,
        frame_txs: Vec<Sender<FrameSnapshot>>,
        engine: TimelineEngine,
        clock: SessionClock,
    ) -> Self {
        Self {
            input_rx,
            progress,
            frame_txs,
            engine,
            clock,
            last_progress: None,
            frame_count: 0,
            dropped_frames: 0,
        }
    }

    pub fn engine(&self) -> &TimelineEngine {
        &self.engine
    }

    /// Run until a `Shutdown` input arrives or every input sender is gone.
    /// Blocks the calling thread.
    pub fn run(&mut self, fps: u32) {
        let interval = Duration::from_millis(1000 / fps.max(1) as u64);
        info!("Coordinator running at {} fps", fps.max(1));

        while self.step(self.clock.now_ms()) {
            thread::sleep(interval);
        }

        info!(
            "Coordinator shutting down after {} frames ({} dropped, {} hits, {} seeks)",
            self.frame_count,
            self.dropped_frames,
            self.engine.hit_count(),
            self.engine.seek_count()
        );
    }

    /// One update pass at wall-clock `now_ms`. Returns false once the
    /// coordinator should stop.
    pub fn step(&mut self, now_ms: u64) -> bool {
        self.engine.tick(now_ms);

        let mut running = true;
        loop {
            match self.input_rx.try_recv() {
                Ok(EngineInput::Shutdown) => {
                    running = false;
                    break;
                }
                Ok(input) => self.apply(input),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    running = false;
                    break;
                }
            }
        }

        if let Some(p) = self.progress.latest() {
            if self.last_progress != Some(p) && self.engine.advance(p) != Advance::Ignored {
                self.last_progress = Some(p);
            }
        }

        let mut frame = FrameSnapshot {
            now_ms: self.engine.now_ms(),
            progress_ms: self.engine.current_progress(),
            scroll_offset: self.engine.scroll_offset(),
            viewport: self.engine.layout().viewport,
            min_pitch: self.engine.model().min_pitch(),
            max_pitch: self.engine.model().max_pitch(),
            ..FrameSnapshot::default()
        };
        self.engine.render(&mut frame);
        frame.visible_start_index = self.engine.visible_start_index();
        frame.indicator_active = self.engine.is_indicator_active();

        for tx in &self.frame_txs {
            if tx.try_send(frame.clone()).is_err() {
                self.dropped_frames += 1;
            }
        }

        self.frame_count += 1;
        if self.frame_count % 600 == 0 {
            debug!(
                "Coordinator: {} frames, progress {}ms, window from event {}",
                self.frame_count,
                frame.progress_ms,
                frame.visible_start_index
            );
        }
        running
    }

    fn apply(&mut self, input: EngineInput) {
        match input {
            EngineInput::Load(events) => {
                // Rejections are logged by the engine.
                let _ = self.engine.load(&events);
            }
            EngineInput::PitchSample { time_ms, pitch } => {
                if let Some(hit) = self.engine.sample(time_ms, pitch) {
                    trace!("Sample {}ms/{} hit event {}", time_ms, pitch, hit.index);
                }
            }
            EngineInput::Score {
                score,
                sentence_index,
            } => {
                self.engine.report_score(score, sentence_index);
            }
            EngineInput::Resize(vp) => {
                self.engine
                    .resize_viewport(vp.width, vp.height, vp.padding, vp.density);
            }
            EngineInput::Shutdown => {}
        }
    }
}
