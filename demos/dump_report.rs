//! Tracks detections dumped by a detector and writes the CSV/JSON reports.
//!
//! Input is one JSON object per line:
//! `{"frame": 12, "detections": [[x1, y1, x2, y2, p, c]], "plates": [[x1, y1, x2, y2, p]]}`
//!
//! usage: dump_report <detections.ndjson> <output stem> [config.json]

use std::io::BufRead;

use log::warn;
use serde_derive::Deserialize;
use vehtrack::{visual, write_csv, write_json, Aggregator, Frame, TrackerConfig, Tracking};

#[derive(Deserialize)]
struct FrameLine {
    frame: i64,
    #[serde(default)]
    detections: Vec<Vec<f32>>,
    #[serde(default)]
    plates: Vec<Vec<f32>>,
}

fn main() -> Result<(), anyhow::Error> {
    // the default `tracing-log` feature forwards the crate's `log` records
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);

    let in_file_name = args.next().expect("expected detections file name");
    let out_stem = args.next().expect("expected output stem");
    let config = match args.next() {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };

    let reader = std::io::BufReader::new(std::fs::File::open(in_file_name)?);
    let mut aggregator = Aggregator::new(config);

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let parsed: FrameLine = match serde_json::from_str(&line) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("line {}: wrong file format: {}", lineno + 1, err);
                continue;
            }
        };

        let frame = Frame::from_rows(parsed.frame, &parsed.detections, &parsed.plates);
        if let Err(err) = aggregator.update(&frame) {
            warn!("line {}: {}", lineno + 1, err);
        }
    }

    for line in visual::stats_lines(0.0, &aggregator.live_counts()) {
        println!("{}", line.text);
    }

    let records = aggregator.records();
    write_csv(&records, format!("{}.csv", out_stem))?;
    write_json(&records, format!("{}.json", out_stem))?;

    println!("{} objects", records.len());

    Ok(())
}
