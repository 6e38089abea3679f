//! CSV job roster loader.
//!
//! # CSV format
//!
//! ```csv
//! job_id,name,start_tick,end_tick,wage_rate,lateness_penalty,location_x,location_y
//! 0,grocer,480,960,0.02,0.5,4,7
//! 1,courier,360,840,0.015,0.25,,
//! ```
//!
//! Leave both location columns empty for a job that can be worked anywhere.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tw_core::{Cell, JobId, TwError};

use crate::job::{JobRoster, JobSpec};
use crate::{EmploymentError, EmploymentResult};

#[derive(Deserialize)]
struct RosterRecord {
    job_id:           u16,
    name:             String,
    start_tick:       u64,
    end_tick:         u64,
    wage_rate:        f32,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    lateness_penalty: Option<f32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    location_x:       Option<i32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    location_y:       Option<i32>,
}

pub fn load_roster_csv(path: &Path) -> EmploymentResult<JobRoster> {
    let file = std::fs::File::open(path).map_err(TwError::Io)?;
    load_roster_reader(file)
}

/// Like [`load_roster_csv`] but accepts any `Read` source.
pub fn load_roster_reader<R: Read>(reader: R) -> EmploymentResult<JobRoster> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut roster = JobRoster::new();

    for result in csv_reader.deserialize::<RosterRecord>() {
        let row = result.map_err(|e| EmploymentError::Parse(e.to_string()))?;
        let location = match (row.location_x, row.location_y) {
            (Some(x), Some(y)) => Some(Cell::new(x, y)),
            (None, None)       => None,
            _ => {
                return Err(EmploymentError::Parse(format!(
                    "job {}: location needs both x and y",
                    row.job_id
                )));
            }
        };
        roster.insert(JobSpec {
            id:               JobId(row.job_id),
            name:             row.name.trim().to_string(),
            start_tick:       row.start_tick,
            end_tick:         row.end_tick,
            wage_rate:        row.wage_rate,
            lateness_penalty: row.lateness_penalty.unwrap_or(0.0),
            location,
        })?;
    }

    Ok(roster)
}
