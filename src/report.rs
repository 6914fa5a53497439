//! CSV and JSON reports of finished tracks.
//!
//! Both writers serialize the whole document in memory first and then
//! replace the destination atomically, so a failed write never leaves a
//! truncated report behind.

use log::info;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::bbox::{BBox, Ltrb};
use crate::classes::UNKNOWN_CLASS;
use crate::error::Error;
use crate::math::round_dp;
use crate::record::{ObjectRecord, ObjectRecords, UNSET_FRAME};

pub const CSV_HEADERS: [&str; 7] = [
    "id",
    "vehicle_type",
    "vehicle_bbox",
    "lp_bbox",
    "lp_bbox_score",
    "frame_start",
    "frame_end",
];

const SCORE_DECIMALS: i32 = 4;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlateEntry {
    pub bbox: [i32; 4],
    pub bbox_score: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    #[serde(default = "unknown_type")]
    pub vehicle_type: String,
    pub vehicle_bbox: [i32; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<PlateEntry>,
    #[serde(default = "unset_frame")]
    pub frame_start: i64,
    #[serde(default = "unset_frame")]
    pub frame_end: i64,
}

fn unknown_type() -> String {
    UNKNOWN_CLASS.to_string()
}

fn unset_frame() -> i64 {
    UNSET_FRAME
}

impl From<&ObjectRecord> for ObjectEntry {
    fn from(rec: &ObjectRecord) -> Self {
        Self {
            vehicle_type: rec.vehicle_type.clone(),
            vehicle_bbox: rec.vehicle_bbox.as_xyxy(),
            license_plate: rec.license_plate.map(|lp| PlateEntry {
                bbox: lp.bbox.as_xyxy(),
                bbox_score: round_score(lp.bbox_score),
            }),
            frame_start: rec.frame_start,
            frame_end: rec.frame_end,
        }
    }
}

/// Structured report: per-type counts plus every record keyed by track id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub summary: BTreeMap<String, usize>,
    pub objects: BTreeMap<u32, ObjectEntry>,
}

impl Report {
    pub fn from_records(records: &ObjectRecords) -> Self {
        Self {
            summary: summarize(records),
            objects: records
                .iter()
                .map(|(&id, rec)| (id, ObjectEntry::from(rec)))
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: u32,
    vehicle_type: &'a str,
    vehicle_bbox: String,
    lp_bbox: String,
    lp_bbox_score: f64,
    frame_start: i64,
    frame_end: i64,
}

impl<'a> CsvRow<'a> {
    fn new(id: u32, rec: &'a ObjectRecord) -> Self {
        Self {
            id,
            vehicle_type: &rec.vehicle_type,
            vehicle_bbox: bbox_to_str(Some(&rec.vehicle_bbox)),
            lp_bbox: bbox_to_str(rec.license_plate.as_ref().map(|lp| &lp.bbox)),
            lp_bbox_score: rec
                .license_plate
                .map(|lp| round_score(lp.bbox_score))
                .unwrap_or(0.0),
            frame_start: rec.frame_start,
            frame_end: rec.frame_end,
        }
    }
}

#[inline]
fn round_score(score: f32) -> f64 {
    round_dp(score as f64, SCORE_DECIMALS)
}

/// `x1 y1 x2 y2` as integers, empty when there is no box.
fn bbox_to_str(bbox: Option<&BBox<Ltrb>>) -> String {
    match bbox {
        Some(b) => b
            .as_xyxy()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" "),
        None => String::new(),
    }
}

/// Number of records per vehicle type.
pub fn summarize(records: &ObjectRecords) -> BTreeMap<String, usize> {
    let mut summary = BTreeMap::new();

    for rec in records.values() {
        *summary.entry(rec.vehicle_type.clone()).or_insert(0) += 1;
    }

    summary
}

/// Writes the tabular report. Records already carry their resolved
/// `vehicle_type`, so no class table is needed here.
pub fn write_csv<P: AsRef<Path>>(records: &ObjectRecords, path: P) -> Result<(), Error> {
    let path = path.as_ref();

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    wtr.write_record(CSV_HEADERS)?;
    for (&id, rec) in records {
        wtr.serialize(CsvRow::new(id, rec))?;
    }

    let data = wtr.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    replace_file(path, &data)?;

    info!("CSV results saved → {}", path.display());

    Ok(())
}

/// Writes the JSON report. Like [`write_csv`] it takes records with the
/// vehicle type already resolved.
pub fn write_json<P: AsRef<Path>>(records: &ObjectRecords, path: P) -> Result<(), Error> {
    let path = path.as_ref();

    let data = serde_json::to_vec_pretty(&Report::from_records(records))?;
    replace_file(path, &data)?;

    info!("JSON results saved → {}", path.display());

    Ok(())
}

pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Report, Error> {
    let src = std::fs::read_to_string(path)?;

    Ok(serde_json::from_str(&src)?)
}

/// Writes `data` next to `path` and renames it over the destination.
fn replace_file(path: &Path, data: &[u8]) -> Result<(), Error> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
