use crate::renderer::{EventView, FrameSnapshot, IndicatorView, Renderer, ScoreView};
use crate::types::*;
use crossbeam_channel::Receiver;
use std::io::{self, Write};

/// Renders a live ASCII view of the timeline in the terminal.
pub struct ConsoleDisplay {
    rx: Receiver<FrameSnapshot>,
    update_hz: u32,
    cols: usize,
    rows: usize,
}

impl ConsoleDisplay {
    pub fn new(rx: Receiver<FrameSnapshot>, update_hz: u32) -> Self {
        Self {
            rx,
            update_hz,
            cols: 72,
            rows: 16,
        }
    }

    pub fn run(&self) {
        let min_gap_ms = if self.update_hz == 0 { 50 } else { (1000 / self.update_hz).max(1) as u64 };
        let mut last_drawn: Option<u64> = None;
        let mut stdout = io::stdout();

        for frame in self.rx.iter() {
            if let Some(t) = last_drawn {
                if frame.now_ms < t + min_gap_ms {
                    continue;
                }
            }
            last_drawn = Some(frame.now_ms);

            let mut canvas = AsciiCanvas::new(self.cols, self.rows, &frame.viewport);
            frame.replay(&mut canvas);

            // Clear screen and move cursor home
            print!("\x1b[2J\x1b[H");
            println!("╔{}╗", "═".repeat(self.cols));
            let title = format!(
                "  PITCH LANE  t={:>6.2}s  pitch {}..{}  window@{}  {}",
                frame.progress_ms as f64 / 1000.0,
                midi_note_name(frame.min_pitch),
                midi_note_name(frame.max_pitch),
                frame.visible_start_index,
                if frame.indicator_active { "LIVE" } else { "----" },
            );
            println!("║{}║", pad(&title, self.cols));
            println!("╠{}╣", "═".repeat(self.cols));
            for line in canvas.lines() {
                println!("║{}║", line);
            }
            println!("╚{}╝", "═".repeat(self.cols));
            let _ = stdout.flush();
        }
    }
}

/// Character-cell renderer. Later draws overwrite earlier ones, so the
/// baseline and indicator sit on top of event bars.
pub struct AsciiCanvas {
    cells: Vec<Vec<char>>,
    sx: f32,
    sy: f32,
}

impl AsciiCanvas {
    pub fn new(cols: usize, rows: usize, viewport: &Viewport) -> Self {
        let sx = if viewport.width > 0.0 { cols as f32 / viewport.width } else { 0.0 };
        let sy = if viewport.height > 0.0 { rows as f32 / viewport.height } else { 0.0 };
        Self {
            cells: vec![vec![' '; cols]; rows],
            sx,
            sy,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.cells.iter().map(|r| r.iter().collect()).collect()
    }

    fn row(&self, y: f32) -> Option<usize> {
        let r = (y * self.sy).floor();
        if r < 0.0 || r as usize >= self.cells.len() {
            None
        } else {
            Some(r as usize)
        }
    }

    fn col(&self, x: f32) -> isize {
        (x * self.sx).floor() as isize
    }

    fn fill(&mut self, rect: Rect, ch: char) {
        let Some(row) = self.row((rect.top + rect.bottom) * 0.5) else {
            return;
        };
        let width = self.cells[row].len() as isize;
        if self.col(rect.right) < 0 {
            return;
        }
        let from = self.col(rect.left).max(0);
        let to = self.col(rect.right).max(from + 1).min(width);
        for c in from..to {
            self.cells[row][c as usize] = ch;
        }
    }

    fn put(&mut self, row: usize, col: isize, ch: char) {
        if col >= 0 && (col as usize) < self.cells[row].len() {
            self.cells[row][col as usize] = ch;
        }
    }
}

impl Renderer for AsciiCanvas {
    fn draw_event(&mut self, view: &EventView<'_>) {
        self.fill(view.rect, '─');
        for region in view.drawable_feedback() {
            self.fill(region, '█');
        }
    }

    fn draw_baseline(&mut self, rect: Rect) {
        let col = self.col(rect.left);
        for row in 0..self.cells.len() {
            self.put(row, col, '│');
        }
    }

    fn draw_score(&mut self, score: &ScoreView) {
        let Some(row) = self.row(score.baseline_y) else {
            return;
        };
        let end = self.col(score.right_x);
        let start = end - score.text.chars().count() as isize;
        for (i, ch) in score.text.chars().enumerate() {
            self.put(row, start + i as isize, ch);
        }
    }

    fn draw_indicator(&mut self, indicator: &IndicatorView) {
        if let Some(row) = self.row((indicator.rect.top + indicator.rect.bottom) * 0.5) {
            let col = self.col(indicator.rect.right) - 1;
            self.put(row, col, '▶');
        }
    }
}

fn pad(s: &str, width: usize) -> String {
    let mut out: String = s.chars().take(width).collect();
    while out.chars().count() < width {
        out.push(' ');
    }
    out
}
