use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::config::OperatingWindow;
use crate::models::{FuelRecord, ParameterSample};

/// Calendar-day key for a sample: the timestamp truncated to its local date.
pub fn sample_date(timestamp: NaiveDateTime) -> NaiveDate {
    timestamp.date()
}

/// Keep only samples inside the inclusive operating-hours window.
///
/// A day emptied by the filter simply contributes no aggregated parameters;
/// downstream joins treat it as missing.
pub fn filter_operating_hours(
    samples: Vec<ParameterSample>,
    window: Option<&OperatingWindow>,
) -> Vec<ParameterSample> {
    let Some(window) = window else {
        return samples;
    };
    let before = samples.len();
    let kept: Vec<ParameterSample> = samples
        .into_iter()
        .filter(|sample| {
            let time = sample.timestamp.time();
            time >= window.start && time <= window.end
        })
        .collect();
    debug!(before, after = kept.len(), "applied operating-hours window");
    kept
}

/// Sort fuel records into strict ascending date order.
///
/// The cleaning rule engine's one-day lookback depends on this ordering.
pub fn sort_by_date(records: &mut [FuelRecord]) {
    records.sort_by_key(|record| record.date);
}
