//! JSONL chart reader: parses a reference melody into PitchEvents.
//!
//! The first line is a header (`"format": "pitch-lane"`, optional title),
//! then one `{"s":start_ms,"d":duration_ms,"p":pitch}` object per line.
//! Works with any `BufRead`: files, in-memory buffers, stdin.

use crate::types::PitchEvent;
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

pub const CHART_FORMAT: &str = "pitch-lane";

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("read chart: {0}")]
    Io(#[from] std::io::Error),
    #[error("empty chart file")]
    Empty,
    #[error("parse header: {0}")]
    Header(serde_json::Error),
    #[error("missing \"format\" field")]
    MissingFormat,
    #[error("unknown format: {0}")]
    UnknownFormat(String),
    #[error("parse event on line {line}: {source}")]
    Event {
        line: usize,
        source: serde_json::Error,
    },
}

/// Parsed chart header (first line of a chart file).
#[derive(Debug)]
pub struct ChartHeader {
    pub format: String,
    pub title: String,
    pub raw: serde_json::Value,
}

/// Line-by-line chart reader.
pub struct ChartReader<R: BufRead> {
    reader: R,
    pub header: ChartHeader,
    line_buf: String,
    line_no: usize,
}

impl<R: BufRead> ChartReader<R> {
    /// Read and validate the header line.
    pub fn open(mut reader: R) -> Result<Self, ChartError> {
        let mut first_line = String::new();
        reader.read_line(&mut first_line)?;

        let first_line = first_line.trim();
        if first_line.is_empty() {
            return Err(ChartError::Empty);
        }

        let raw: serde_json::Value =
            serde_json::from_str(first_line).map_err(ChartError::Header)?;

        let format = raw["format"]
            .as_str()
            .ok_or(ChartError::MissingFormat)?
            .to_string();
        if format != CHART_FORMAT {
            return Err(ChartError::UnknownFormat(format));
        }
        let title = raw["title"].as_str().unwrap_or("").to_string();

        Ok(Self {
            reader,
            header: ChartHeader { format, title, raw },
            line_buf: String::new(),
            line_no: 1,
        })
    }

    /// Read the next event. Returns `None` at EOF, `Err` for unparseable lines.
    pub fn next_event(&mut self) -> Option<Result<PitchEvent, ChartError>> {
        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    let trimmed = self.line_buf.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let line = self.line_no;
                    return Some(
                        serde_json::from_str::<PitchEvent>(trimmed)
                            .map_err(|source| ChartError::Event { line, source }),
                    );
                }
                Err(e) => return Some(Err(ChartError::Io(e))),
            }
        }
    }

    /// Read all remaining events, skipping malformed lines.
    pub fn read_all(&mut self) -> Vec<PitchEvent> {
        let mut events = Vec::new();
        while let Some(result) = self.next_event() {
            match result {
                Ok(event) => events.push(event),
                Err(e) => warn!("Skipping chart line: {}", e),
            }
        }
        events
    }
}

/// Open a chart file and read every well-formed event.
pub fn load_chart(path: &Path) -> Result<(ChartHeader, Vec<PitchEvent>), ChartError> {
    let mut reader = ChartReader::open(BufReader::new(File::open(path)?))?;
    let events = reader.read_all();
    info!("Chart {:?}: \"{}\", {} events", path, reader.header.title, events.len());
    Ok((reader.header, events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header() -> String {
        r#"{"format":"pitch-lane","title":"Scale"}"#.to_string()
    }

    #[test]
    fn test_open_valid_header() {
        let data = header() + "\n";
        let reader = ChartReader::open(Cursor::new(data)).unwrap();
        assert_eq!(reader.header.format, "pitch-lane");
        assert_eq!(reader.header.title, "Scale");
    }

    #[test]
    fn test_open_missing_format() {
        let data = r#"{"title":"x"}"#.to_string() + "\n";
        let err = ChartReader::open(Cursor::new(data)).err().unwrap();
        assert!(matches!(err, ChartError::MissingFormat), "got: {}", err);
    }

    #[test]
    fn test_open_wrong_format() {
        let data = r#"{"format":"ultrastar"}"#.to_string() + "\n";
        let err = ChartReader::open(Cursor::new(data)).err().unwrap();
        assert!(err.to_string().contains("unknown format"), "got: {}", err);
    }

    #[test]
    fn test_open_empty_file() {
        assert!(matches!(
            ChartReader::open(Cursor::new("")).err().unwrap(),
            ChartError::Empty
        ));
    }

    #[test]
    fn test_read_events_skipping_blank_and_bad_lines() {
        let data = header()
            + "\n"
            + r#"{"s":0,"d":400,"p":60}"#
            + "\n\n"
            + "not json\n"
            + r#"{"s":500,"d":400,"p":62}"#
            + "\n";
        let events = ChartReader::open(Cursor::new(data)).unwrap().read_all();
        assert_eq!(
            events,
            vec![PitchEvent::new(0, 400, 60), PitchEvent::new(500, 400, 62)]
        );
    }

    #[test]
    fn test_next_event_reports_line() {
        let data = header() + "\n" + r#"{"s":0,"d":1,"p":60}"# + "\ngarbage\n";
        let mut reader = ChartReader::open(Cursor::new(data)).unwrap();
        assert!(reader.next_event().unwrap().is_ok());
        match reader.next_event().unwrap() {
            Err(ChartError::Event { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected event error, got {:?}", other),
        }
        assert!(reader.next_event().is_none());
    }

    #[test]
    fn test_load_chart_from_file() {
        let path = std::env::temp_dir().join(format!("pitch_lane_chart_{}.jsonl", std::process::id()));
        std::fs::write(&path, header() + "\n" + r#"{"s":0,"d":250,"p":64}"# + "\n").unwrap();
        let (h, events) = load_chart(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(h.title, "Scale");
        assert_eq!(events, vec![PitchEvent::new(0, 250, 64)]);
    }
}
