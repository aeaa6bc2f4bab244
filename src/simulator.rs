use crate::progress::ProgressSlot;
use crate::types::*;
use crossbeam_channel::Sender;
use log::info;
use std::f32::consts::PI;
use std::thread;
use std::time::Duration;

/// Irregular clock tick pattern (ms): the playback clock is coarse and
/// jittery on purpose so the scroll interpolation has gaps to fill.
const TICK_PATTERN_MS: [u64; 6] = [16, 41, 23, 70, 33, 17];

/// How long to keep playing after the last note so it scrolls off screen.
const TAIL_MS: i64 = 2500;

/// A rest at least this long ends a sentence in a chart loaded from disk.
const SENTENCE_GAP_MS: i64 = 600;

/// A chart plus the end time of each sung sentence.
#[derive(Debug, Clone)]
pub struct DemoSong {
    pub events: Vec<PitchEvent>,
    pub sentence_ends: Vec<i64>,
}

impl DemoSong {
    /// Wrap a chart, ending a sentence at every long rest and at the
    /// last note.
    pub fn from_events(events: Vec<PitchEvent>) -> Self {
        let mut sentence_ends = Vec::new();
        let mut end = None;
        for event in &events {
            if let Some(prev_end) = end {
                if event.start_ms - prev_end >= SENTENCE_GAP_MS {
                    sentence_ends.push(prev_end);
                }
            }
            end = Some(end.map_or(event.end_ms(), |e: i64| e.max(event.end_ms())));
        }
        sentence_ends.extend(end);
        Self {
            events,
            sentence_ends,
        }
    }

    pub fn end_ms(&self) -> i64 {
        self.events.iter().map(|e| e.end_ms()).max().unwrap_or(0)
    }
}

/// Jump the playback clock back once it reaches `at_ms`.
#[derive(Debug, Clone, Copy)]
pub struct Seek {
    pub at_ms: i64,
    pub to_ms: i64,
}

/// Plays a song against the coordinator without any audio: a playback
/// clock publishing progress, a singer producing pitch samples (with
/// vibrato and the occasional wrong note), and a scorer reporting each
/// finished sentence.
pub struct Simulator {
    clock: SessionClock,
    tx: Sender<EngineInput>,
    progress: ProgressSlot,
    seek: Option<Seek>,
    song: DemoSong,
    next_sentence: usize,
    event_cursor: usize,
    last_playback: i64,
}

impl Simulator {
    pub fn new(
        clock: SessionClock,
        tx: Sender<EngineInput>,
        progress: ProgressSlot,
        song: DemoSong,
    ) -> Self {
        Self {
            clock,
            tx,
            progress,
            seek: None,
            song,
            next_sentence: 0,
            event_cursor: 0,
            last_playback: 0,
        }
    }

    pub fn with_seek(mut self, seek: Option<Seek>) -> Self {
        self.seek = seek;
        self
    }

    /// Load the song and play it through in real time. Sends `Shutdown`
    /// at the end. Blocks the calling thread.
    pub fn run(&mut self) {
        info!(
            "Simulator: {} events, {} sentences, {:.1}s",
            self.song.events.len(),
            self.song.sentence_ends.len(),
            self.song.end_ms() as f32 / 1000.0
        );
        if self.tx.send(EngineInput::Load(self.song.events.clone())).is_err() {
            return;
        }

        let end = self.song.end_ms() + TAIL_MS;
        let mut origin_ms = self.clock.now_ms() as i64;
        let mut pending_seek = self.seek;

        for step in TICK_PATTERN_MS.iter().cycle() {
            thread::sleep(Duration::from_millis(*step));

            let mut playback = self.clock.now_ms() as i64 - origin_ms;
            if let Some(seek) = pending_seek {
                if playback >= seek.at_ms {
                    info!("Simulator: seeking {}ms → {}ms", playback, seek.to_ms);
                    origin_ms += playback - seek.to_ms;
                    playback = seek.to_ms;
                    pending_seek = None;
                }
            }
            if playback > end || !self.play_at(playback) {
                break;
            }
        }

        info!("Simulator: song finished");
        let _ = self.tx.send(EngineInput::Shutdown);
    }

    /// Emit everything that happens at playback time `playback_ms`:
    /// the progress value, one pitch sample, and any sentence score that
    /// just completed. Returns false if the coordinator has gone away.
    pub fn play_at(&mut self, playback_ms: i64) -> bool {
        self.progress.publish(playback_ms);
        self.rewind_if_needed(playback_ms);

        if let Some(pitch) = self.sung_pitch(playback_ms) {
            let sample = EngineInput::PitchSample {
                time_ms: playback_ms,
                pitch,
            };
            if self.tx.send(sample).is_err() {
                return false;
            }
        }

        while self.next_sentence < self.song.sentence_ends.len()
            && playback_ms >= self.song.sentence_ends[self.next_sentence]
        {
            let index = self.next_sentence as i32;
            let report = EngineInput::Score {
                score: sentence_score(index),
                sentence_index: index + 1,
            };
            if self.tx.send(report).is_err() {
                return false;
            }
            self.next_sentence += 1;
        }
        true
    }

    /// After a backward jump, sentences and notes ahead of the new
    /// position are due again.
    fn rewind_if_needed(&mut self, playback_ms: i64) {
        if playback_ms < self.last_playback {
            self.event_cursor = 0;
            let ends = &self.song.sentence_ends;
            self.next_sentence = ends
                .iter()
                .position(|&e| e > playback_ms)
                .unwrap_or(ends.len());
        }
        self.last_playback = playback_ms;
    }

    /// What the singer produces at `t`: the target pitch with a ±1
    /// semitone vibrato, except on every seventh note where they miss by a
    /// fourth. Silent between notes.
    fn sung_pitch(&mut self, t: i64) -> Option<i32> {
        let events = &self.song.events;
        while self.event_cursor < events.len() && events[self.event_cursor].end_ms() < t {
            self.event_cursor += 1;
        }
        let event = events.get(self.event_cursor)?;
        if !event.contains(t) {
            return None;
        }
        if self.event_cursor % 7 == 6 {
            return Some(event.pitch + 5);
        }
        let vibrato = (2.0 * PI * 5.5 * t as f32 / 1000.0).sin();
        Some(event.pitch + vibrato.round() as i32)
    }
}

/// Deterministic made-up score for a sentence.
fn sentence_score(index: i32) -> i32 {
    60 + (index * 17) % 40
}

/// A short four-phrase tune. Each beat is 400 ms, phrases are separated
/// by a two-beat rest.
pub fn demo_song() -> DemoSong {
    const BEAT_MS: i64 = 400;
    const REST_BEATS: i64 = 2;
    // (MIDI pitch, beats)
    let phrases: [&[(i32, i64)]; 4] = [
        &[(60, 1), (60, 1), (67, 1), (67, 1), (69, 1), (69, 1), (67, 2)],
        &[(65, 1), (65, 1), (64, 1), (64, 1), (62, 1), (62, 1), (60, 2)],
        &[(67, 1), (67, 1), (65, 1), (65, 1), (64, 1), (64, 1), (62, 2)],
        &[(60, 1), (60, 1), (67, 1), (67, 1), (69, 1), (69, 1), (67, 2)],
    ];

    let mut events = Vec::new();
    let mut sentence_ends = Vec::new();
    let mut t = 1000; // lead-in
    for phrase in phrases {
        for &(pitch, beats) in phrase {
            // notes are slightly detached
            events.push(PitchEvent::new(t, beats * BEAT_MS - 40, pitch));
            t += beats * BEAT_MS;
        }
        sentence_ends.push(t);
        t += REST_BEATS * BEAT_MS;
    }
    DemoSong {
        events,
        sentence_ends,
    }
}
