pub mod chart_reader;
pub mod config;
pub mod console_display;
pub mod coordinator;
pub mod engine;
pub mod hit_detector;
pub mod indicator;
pub mod layout;
pub mod model;
pub mod progress;
pub mod renderer;
pub mod score;
pub mod simulator;
pub mod types;
pub mod visibility;
