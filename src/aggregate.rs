use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{
    BucketMeans, DailySensorMeans, FuelRecord, LabeledSample, ParameterSample, PARAMETER_FIELDS,
};

/// Annotate every sample with its day's efficiency and bucket.
///
/// Left join on the calendar date: samples from days without a fuel record
/// are kept with null labels, never dropped.
pub fn label_samples(samples: &[ParameterSample], fuel: &[FuelRecord]) -> Vec<LabeledSample> {
    let by_date: HashMap<NaiveDate, &FuelRecord> =
        fuel.iter().map(|record| (record.date, record)).collect();
    samples
        .iter()
        .map(|sample| {
            let record = by_date.get(&sample.date);
            LabeledSample {
                sample: sample.clone(),
                efficiency: record.and_then(|r| r.efficiency),
                bucket: record.and_then(|r| r.bucket.clone()),
            }
        })
        .collect()
}

/// Per-bucket arithmetic means over `PARAMETER_FIELDS`, nulls ignored.
///
/// Output order follows `label_order`; buckets with zero samples produce no
/// row, and unlabeled samples are excluded from the summary.
pub fn bucket_means(labeled: &[LabeledSample], label_order: &[String]) -> Vec<BucketMeans> {
    struct Accumulator {
        rows: usize,
        sums: Vec<f64>,
        counts: Vec<usize>,
    }

    let mut by_bucket: HashMap<&str, Accumulator> = HashMap::new();
    for entry in labeled {
        let Some(bucket) = entry.bucket.as_deref() else {
            continue;
        };
        let acc = by_bucket.entry(bucket).or_insert_with(|| Accumulator {
            rows: 0,
            sums: vec![0.0; PARAMETER_FIELDS.len()],
            counts: vec![0; PARAMETER_FIELDS.len()],
        });
        acc.rows += 1;
        for (slot, (_, getter)) in PARAMETER_FIELDS.iter().enumerate() {
            if let Some(value) = getter(&entry.sample) {
                acc.sums[slot] += value;
                acc.counts[slot] += 1;
            }
        }
    }

    let mut table = Vec::new();
    for label in label_order {
        let Some(acc) = by_bucket.remove(label.as_str()) else {
            continue;
        };
        let means = acc
            .sums
            .iter()
            .zip(&acc.counts)
            .map(|(sum, count)| (*count > 0).then(|| sum / *count as f64))
            .collect();
        table.push(BucketMeans {
            bucket: label.clone(),
            sample_count: acc.rows,
            means,
        });
    }
    debug!(buckets = table.len(), "computed bucket means");
    table
}

/// Daily means of the cleaning-relevant sensors, in ascending date order.
///
/// A day whose samples all miss a sensor keeps a null mean for it.
pub fn daily_sensor_means(samples: &[ParameterSample]) -> Vec<DailySensorMeans> {
    struct Accumulator {
        flue: (f64, usize),
        o2: (f64, usize),
        nox: (f64, usize),
    }

    let mut by_date: HashMap<NaiveDate, Accumulator> = HashMap::new();
    for sample in samples {
        let acc = by_date.entry(sample.date).or_insert(Accumulator {
            flue: (0.0, 0),
            o2: (0.0, 0),
            nox: (0.0, 0),
        });
        for (slot, value) in [
            (&mut acc.flue, sample.flue_gas_temp),
            (&mut acc.o2, sample.o2),
            (&mut acc.nox, sample.nox),
        ] {
            if let Some(value) = value {
                slot.0 += value;
                slot.1 += 1;
            }
        }
    }

    let mean = |(sum, count): (f64, usize)| (count > 0).then(|| sum / count as f64);
    let mut days: Vec<DailySensorMeans> = by_date
        .into_iter()
        .map(|(date, acc)| DailySensorMeans {
            date,
            flue_gas_temp: mean(acc.flue),
            o2: mean(acc.o2),
            nox: mean(acc.nox),
        })
        .collect();
    days.sort_by_key(|day| day.date);
    days
}
