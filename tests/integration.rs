//! End-to-end integration tests for the pitch lane pipeline.
//!
//! These tests exercise the full data flow:
//!   inputs + ProgressSlot → Coordinator → FrameSnapshot channel → assertions
//!
//! Threaded tests react to the frames the coordinator broadcasts; the
//! step-driven tests call `Coordinator::step` with explicit clock values so
//! scroll animation and timers are deterministic.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use pitch_lane::config::TimelineConfig;
use pitch_lane::coordinator::Coordinator;
use pitch_lane::engine::TimelineEngine;
use pitch_lane::progress::ProgressSlot;
use pitch_lane::renderer::FrameSnapshot;
use pitch_lane::simulator::{demo_song, DemoSong, Simulator};
use pitch_lane::types::*;

// ─── Helpers ───────────────────────────────────────────────────────────────

fn viewport() -> Viewport {
    Viewport::new(400.0, 200.0, Padding::default(), 1.0)
}

struct Pipeline {
    input_tx: Sender<EngineInput>,
    progress: ProgressSlot,
    frames: Receiver<FrameSnapshot>,
    handle: thread::JoinHandle<()>,
}

impl Pipeline {
    /// Block until a frame satisfies `pred`, or panic after a timeout.
    fn wait_for(&self, what: &str, pred: impl Fn(&FrameSnapshot) -> bool) -> FrameSnapshot {
        let deadline = Instant::now() + Duration::from_secs(3);
        while Instant::now() < deadline {
            if let Ok(f) = self.frames.recv_timeout(Duration::from_millis(50)) {
                if pred(&f) {
                    return f;
                }
            }
        }
        panic!("timed out waiting for {}", what);
    }

    fn send(&self, input: EngineInput) {
        self.input_tx.send(input).unwrap();
    }

    fn shutdown(self) {
        self.input_tx.send(EngineInput::Shutdown).unwrap();
        self.handle.join().unwrap();
    }
}

/// Run a coordinator in a background thread at 200 fps.
fn spawn_pipeline(config: TimelineConfig) -> Pipeline {
    let (input_tx, input_rx) = bounded::<EngineInput>(4096);
    let (frame_tx, frame_rx) = bounded::<FrameSnapshot>(4096);
    let progress = ProgressSlot::new();

    let slot = progress.clone();
    let handle = thread::Builder::new()
        .name("test-coordinator".into())
        .spawn(move || {
            let engine = TimelineEngine::new(config);
            let mut coord =
                Coordinator::new(input_rx, slot, vec![frame_tx], engine, SessionClock::new());
            coord.run(200);
        })
        .unwrap();

    Pipeline {
        input_tx,
        progress,
        frames: frame_rx,
        handle,
    }
}

/// Coordinator driven by hand through `step`.
fn stepped() -> (Sender<EngineInput>, ProgressSlot, Receiver<FrameSnapshot>, Coordinator) {
    let (input_tx, input_rx) = bounded::<EngineInput>(4096);
    let (frame_tx, frame_rx) = bounded::<FrameSnapshot>(4096);
    let progress = ProgressSlot::new();
    let coord = Coordinator::new(
        input_rx,
        progress.clone(),
        vec![frame_tx],
        TimelineEngine::new(TimelineConfig::default()),
        SessionClock::new(),
    );
    input_tx.send(EngineInput::Resize(viewport())).unwrap();
    (input_tx, progress, frame_rx, coord)
}

fn last_frame(frames: &Receiver<FrameSnapshot>) -> FrameSnapshot {
    frames.try_iter().last().expect("no frame broadcast")
}

// ─── Threaded pipeline ─────────────────────────────────────────────────────

#[test]
fn test_pipeline_hit_feedback_grows_in_behind_baseline() {
    let p = spawn_pipeline(TimelineConfig::default());
    p.send(EngineInput::Resize(viewport()));
    p.send(EngineInput::Load(vec![PitchEvent::new(0, 1000, 60)]));

    let f = p.wait_for("indicator to activate", |f| f.indicator_active && f.events.len() == 1);
    assert_eq!((f.min_pitch, f.max_pitch), (55, 65));
    assert!(f.events[0].feedback.is_empty());

    p.progress.publish(400);
    p.send(EngineInput::PitchSample { time_ms: 400, pitch: 61 });

    // Region spans 400..520 ms, i.e. content x 182.5..212.5. At progress
    // 400 (scroll 100) it is still right of the baseline and not drawn.
    let f = p.wait_for("scroll to reach 400ms", |f| {
        f.progress_ms == 400 && (f.scroll_offset - 100.0).abs() < 1e-3
    });
    assert!(f.events[0].feedback.is_empty(), "feedback drawn ahead of the baseline");

    p.progress.publish(600);
    let f = p.wait_for("feedback to pass the baseline", |f| {
        f.events.first().map_or(false, |e| !e.feedback.is_empty())
    });
    let baseline = f.baseline.unwrap();
    let region = f.events[0].feedback[0];
    assert!(region.right <= baseline.left + 1e-3, "region {:?} past baseline", region);
    assert!((region.width() - 30.0).abs() < 1e-3, "width={}", region.width());

    p.shutdown();
}

#[test]
fn test_pipeline_score_shows_then_hides() {
    let config = TimelineConfig {
        score_hide_delay_ms: 100,
        ..TimelineConfig::default()
    };
    let p = spawn_pipeline(config);
    p.send(EngineInput::Resize(viewport()));
    p.send(EngineInput::Load(vec![PitchEvent::new(0, 5000, 60)]));
    p.wait_for("indicator to activate", |f| f.indicator_active);

    p.send(EngineInput::Score { score: 88, sentence_index: 1 });
    let f = p.wait_for("score to show", |f| f.score.is_some());
    assert_eq!(f.score.unwrap().text, "88");

    p.wait_for("score to hide", |f| f.score.is_none());
    p.shutdown();
}

#[test]
fn test_pipeline_stops_when_inputs_disconnect() {
    let p = spawn_pipeline(TimelineConfig::default());
    let Pipeline { input_tx, frames, handle, .. } = p;
    drop(input_tx);
    handle.join().unwrap();
    // every frame sender is gone with the coordinator
    while frames.try_recv().is_ok() {}
    assert!(frames.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn test_simulator_plays_short_song_to_completion() {
    let (input_tx, input_rx) = bounded::<EngineInput>(4096);
    let (frame_tx, frame_rx) = bounded::<FrameSnapshot>(4096);
    let progress = ProgressSlot::new();
    let clock = SessionClock::new();
    input_tx.send(EngineInput::Resize(viewport())).unwrap();

    let slot = progress.clone();
    let coord_clock = clock.clone();
    let coord = thread::spawn(move || {
        let engine = TimelineEngine::new(TimelineConfig::default());
        let mut c = Coordinator::new(input_rx, slot, vec![frame_tx], engine, coord_clock);
        c.run(100);
        c.engine().current_progress()
    });

    let song = DemoSong::from_events(vec![PitchEvent::new(0, 300, 60)]);
    Simulator::new(clock, input_tx, progress, song).run();

    let final_progress = coord.join().unwrap();
    let frames: Vec<FrameSnapshot> = frame_rx.try_iter().collect();
    assert!(!frames.is_empty());
    assert!(frames.iter().any(|f| f.indicator_active), "indicator never activated");
    assert!(final_progress >= 300, "progress={}", final_progress);
    let last = frames.last().unwrap();
    assert!(last.events.is_empty(), "song should have scrolled away");
    assert!(!last.indicator_active);
}

// ─── Step-driven scenarios ─────────────────────────────────────────────────

#[test]
fn test_sample_ignored_until_first_event_is_drawn() {
    let (tx, progress, _frames, mut coord) = stepped();
    tx.send(EngineInput::Load(vec![PitchEvent::new(0, 1000, 60)])).unwrap();
    // same batch as the load: nothing has been drawn yet
    tx.send(EngineInput::PitchSample { time_ms: 10, pitch: 60 }).unwrap();
    progress.publish(10);
    coord.step(0);
    assert_eq!(coord.engine().hit_count(), 0);
    assert!(coord.engine().is_indicator_active());

    tx.send(EngineInput::PitchSample { time_ms: 20, pitch: 60 }).unwrap();
    progress.publish(20);
    coord.step(10);
    assert_eq!(coord.engine().hit_count(), 1);
}

#[test]
fn test_seek_back_snaps_scroll_and_rewinds_window() {
    let (tx, progress, frames, mut coord) = stepped();
    tx.send(EngineInput::Load(vec![
        PitchEvent::new(0, 1000, 60),
        PitchEvent::new(2000, 1000, 62),
    ]))
    .unwrap();
    coord.step(0);

    progress.publish(1500);
    coord.step(0);
    coord.step(1500);
    let f = last_frame(&frames);
    assert!((f.scroll_offset - 375.0).abs() < 1e-3, "scroll={}", f.scroll_offset);
    assert_eq!(f.visible_start_index, 1, "first event scrolled out");
    assert_eq!(f.events.len(), 1);

    tx.send(EngineInput::Score { score: 70, sentence_index: 1 }).unwrap();
    coord.step(1510);
    assert!(last_frame(&frames).score.is_some());

    progress.publish(200);
    coord.step(1520);
    let f = last_frame(&frames);
    assert_eq!(coord.engine().seek_count(), 1);
    assert!((f.scroll_offset - 50.0).abs() < 1e-3, "seek must snap, scroll={}", f.scroll_offset);
    assert_eq!(f.visible_start_index, 0);
    assert_eq!(coord.engine().score().score(), 0);
    // first event is back on screen, so the indicator is live again and
    // the zeroed score stays up until its timer runs out
    assert!(f.indicator_active);
    assert_eq!(f.score.map(|s| s.text).as_deref(), Some("0"));
    assert_eq!(f.events.len(), 1, "second event is right of the view again");
}

#[test]
fn test_window_cursor_never_moves_back_during_playback() {
    let (tx, progress, frames, mut coord) = stepped();
    let song = demo_song();
    tx.send(EngineInput::Load(song.events.clone())).unwrap();

    let mut last_cursor = 0;
    let mut t = 0;
    while t <= song.end_ms() + 2000 {
        progress.publish(t);
        coord.step(t as u64);
        let f = last_frame(&frames);
        assert!(
            f.visible_start_index >= last_cursor,
            "cursor went back {} -> {} at {}ms",
            last_cursor,
            f.visible_start_index,
            t
        );
        last_cursor = f.visible_start_index;
        t += 50;
    }
    assert_eq!(last_cursor, song.events.len() - 1);
    assert!(!coord.engine().is_indicator_active(), "last event has left the view");
}

#[test]
fn test_simulated_singer_hits_all_but_missed_note() {
    let (tx, progress, frames, mut coord) = stepped();
    let song = demo_song();
    tx.send(EngineInput::Load(song.events.clone())).unwrap();
    coord.step(0);

    let mut sim = Simulator::new(SessionClock::new(), tx.clone(), progress, song.clone());

    // Seventh note is sung a fourth sharp: no hits.
    let seventh = song.events[6];
    let mut t = seventh.start_ms;
    while t < seventh.end_ms() {
        assert!(sim.play_at(t));
        coord.step(t as u64);
        t += 20;
    }
    assert_eq!(coord.engine().hit_count(), 0);
    assert!(coord.engine().model().events()[6].feedback().is_empty());

    // First note of the second phrase: every sample lands. The jump past
    // the end of the first sentence also reports its score.
    let eighth = song.events[7];
    for i in 0..10 {
        let t = eighth.start_ms + 10 + i * 20;
        assert!(sim.play_at(t));
        coord.step(t as u64);
    }
    assert_eq!(coord.engine().hit_count(), 10);
    assert_eq!(coord.engine().model().events()[7].feedback().len(), 10);

    let f = last_frame(&frames);
    let score = f.score.expect("sentence score shown");
    assert_eq!(score.text, "60");
    assert_eq!(coord.engine().score().sentence_index(), 1);
}

#[test]
fn test_rejected_load_keeps_current_chart() {
    let (tx, _progress, frames, mut coord) = stepped();
    tx.send(EngineInput::Load(vec![PitchEvent::new(0, 1000, 60)])).unwrap();
    coord.step(0);
    tx.send(EngineInput::Load(vec![
        PitchEvent::new(500, 100, 60),
        PitchEvent::new(100, 100, 62),
    ]))
    .unwrap();
    tx.send(EngineInput::Load(Vec::new())).unwrap();
    coord.step(10);

    assert_eq!(coord.engine().model().len(), 1);
    let f = last_frame(&frames);
    assert_eq!(f.events.len(), 1);
    assert_eq!((f.min_pitch, f.max_pitch), (55, 65));
}

#[test]
fn test_indicator_falls_back_to_min_pitch_after_hit() {
    let (tx, progress, frames, mut coord) = stepped();
    tx.send(EngineInput::Load(vec![PitchEvent::new(0, 5000, 60)])).unwrap();
    coord.step(0);

    tx.send(EngineInput::PitchSample { time_ms: 100, pitch: 60 }).unwrap();
    progress.publish(100);
    coord.step(100);
    let start = last_frame(&frames).indicator.unwrap();
    assert!((start.pitch - 60.0).abs() < 1e-3, "pitch={}", start.pitch);

    coord.step(1600);
    let mid = last_frame(&frames).indicator.unwrap();
    assert!(mid.pitch < 60.0 && mid.pitch > 55.0, "pitch={}", mid.pitch);
    assert!(mid.rect.top > start.rect.top, "indicator should move down");

    coord.step(3100);
    let end = last_frame(&frames).indicator.unwrap();
    assert!((end.pitch - 55.0).abs() < 1e-3, "pitch={}", end.pitch);
    assert_eq!(end.icon, "ic_midi_triangle_arrow");
    assert!((end.rect.right - coord.engine().layout().baseline_x).abs() < 1e-3);
}
