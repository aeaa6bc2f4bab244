use pitch_lane::chart_reader;
use pitch_lane::config::TimelineConfig;
use pitch_lane::console_display;
use pitch_lane::coordinator;
use pitch_lane::engine::TimelineEngine;
use pitch_lane::progress::ProgressSlot;
use pitch_lane::renderer::FrameSnapshot;
use pitch_lane::simulator::{self, DemoSong, Seek};
use pitch_lane::types::*;

use clap::Parser;
use crossbeam_channel::bounded;
use log::{error, info};
use std::path::PathBuf;
use std::process;
use std::thread;

#[derive(Parser)]
#[command(name = "pitch-lane")]
#[command(about = "Scrolling pitch timeline for sing-along scoring")]
struct Cli {
    /// Chart file (JSONL). Plays the built-in demo tune when omitted.
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Timeline config file (JSON)
    #[arg(long, default_value = "pitch_lane.json")]
    config: PathBuf,

    /// Scroll speed in px per ms (overrides config)
    #[arg(long)]
    speed: Option<f32>,

    /// Hit tolerance in semitones (overrides config)
    #[arg(long)]
    tolerance: Option<i32>,

    /// Surface width (px)
    #[arg(long, default_value_t = 1080.0)]
    width: f32,

    /// Surface height (px)
    #[arg(long, default_value_t = 360.0)]
    height: f32,

    /// Pixels per density-independent unit
    #[arg(long, default_value_t = 1.0)]
    density: f32,

    /// Engine update rate (Hz)
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Console display refresh rate (Hz)
    #[arg(long, default_value_t = 20)]
    display_hz: u32,

    /// Playback time (ms) at which the simulated player seeks
    #[arg(long, requires = "seek_to")]
    seek_at: Option<i64>,

    /// Playback time (ms) the simulated player seeks to
    #[arg(long, requires = "seek_at")]
    seek_to: Option<i64>,

    /// Disable the console display
    #[arg(long)]
    no_console: bool,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let cli = Cli::parse();
    let clock = SessionClock::new();

    let mut config = TimelineConfig::load_or_default(&cli.config);
    if let Some(speed) = cli.speed {
        config.speed = speed;
    }
    if let Some(tolerance) = cli.tolerance {
        config.tolerance = tolerance;
    }

    let song = match &cli.chart {
        Some(path) => match chart_reader::load_chart(path) {
            Ok((_, events)) => DemoSong::from_events(events),
            Err(e) => {
                error!("Cannot load chart {:?}: {}", path, e);
                process::exit(1);
            }
        },
        None => simulator::demo_song(),
    };
    let seek = match (cli.seek_at, cli.seek_to) {
        (Some(at_ms), Some(to_ms)) => Some(Seek { at_ms, to_ms }),
        _ => None,
    };

    info!("═══════════════════════════════════════════════");
    info!("  PITCH LANE v{}", env!("CARGO_PKG_VERSION"));
    match &cli.chart {
        Some(path) => info!("  Chart: {:?}", path),
        None => info!("  Chart: built-in demo"),
    }
    info!("  Surface: {}x{} @{}x", cli.width, cli.height, cli.density);
    info!("  Speed: {} px/ms, tolerance ±{}", config.speed, config.tolerance);
    if let Some(s) = seek { info!("  Seek: {}ms → {}ms", s.at_ms, s.to_ms); }
    if !cli.no_console { info!("  UI: Console TUI"); }
    info!("═══════════════════════════════════════════════");

    // Channel: inputs → coordinator
    let (input_tx, input_rx) = bounded::<EngineInput>(4096);
    let progress = ProgressSlot::new();

    // Channels: coordinator → consumers
    let mut frame_txs: Vec<crossbeam_channel::Sender<FrameSnapshot>> = Vec::new();

    let mut handles = Vec::new();

    // ─── Console display ────────────────────────────────────────────
    if !cli.no_console {
        let (tx, rx) = bounded::<FrameSnapshot>(256);
        frame_txs.push(tx);
        let hz = cli.display_hz;
        handles.push(thread::Builder::new().name("display".into()).spawn(move || {
            console_display::ConsoleDisplay::new(rx, hz).run();
        }).unwrap());
    }

    // ─── Coordinator ────────────────────────────────────────────────
    let viewport = Viewport::new(cli.width, cli.height, Padding::default(), cli.density);
    if input_tx.send(EngineInput::Resize(viewport)).is_err() {
        error!("Coordinator input channel closed before start");
        return;
    }
    let coord_progress = progress.clone();
    let coord_clock = clock.clone();
    let fps = cli.fps;
    handles.push(thread::Builder::new().name("coordinator".into()).spawn(move || {
        let engine = TimelineEngine::new(config);
        let mut coord = coordinator::Coordinator::new(
            input_rx,
            coord_progress,
            frame_txs,
            engine,
            coord_clock,
        );
        coord.run(fps);
    }).unwrap());

    // ─── Input source ───────────────────────────────────────────────
    info!("Starting simulator...");
    let sim_clock = clock.clone();
    let sim_tx = input_tx.clone();
    handles.push(thread::Builder::new().name("simulator".into()).spawn(move || {
        simulator::Simulator::new(sim_clock, sim_tx, progress, song)
            .with_seek(seek)
            .run();
    }).unwrap());
    drop(input_tx);

    for h in handles {
        let _ = h.join();
    }
    info!("Done.");
}
