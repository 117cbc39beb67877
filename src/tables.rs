//! Stable-column CSV writers for the four output tables the presentation
//! layer consumes.

use std::io;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{
    BucketMeans, CleaningRiskScore, CleaningWarning, FuelRecord, PARAMETER_FIELDS,
};

#[derive(Serialize)]
struct EfficiencyRow<'a> {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Steam_Generated_MT")]
    steam_generated_mt: f64,
    #[serde(rename = "Fuel_Consumed_MT")]
    fuel_consumed_mt: f64,
    #[serde(rename = "Boiler_Efficiency")]
    efficiency: Option<f64>,
    #[serde(rename = "Efficiency_Bucket")]
    bucket: Option<&'a str>,
}

pub fn write_efficiency_table<W: io::Write>(writer: W, fuel: &[FuelRecord]) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in fuel {
        csv.serialize(EfficiencyRow {
            date: record.date,
            steam_generated_mt: record.steam_generated_mt,
            fuel_consumed_mt: record.fuel_consumed_mt,
            efficiency: record.efficiency,
            bucket: record.bucket.as_deref(),
        })?;
    }
    csv.flush()?;
    Ok(())
}

/// Header is `Efficiency_Bucket,Sample_Count` followed by the versioned
/// parameter field list in order.
pub fn write_bucket_means_table<W: io::Write>(
    writer: W,
    means: &[BucketMeans],
) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec!["Efficiency_Bucket".to_string(), "Sample_Count".to_string()];
    header.extend(PARAMETER_FIELDS.iter().map(|(name, _)| (*name).to_string()));
    csv.write_record(&header)?;

    for bucket in means {
        let mut row = vec![bucket.bucket.clone(), bucket.sample_count.to_string()];
        row.extend(
            bucket
                .means
                .iter()
                .map(|mean| mean.map(|v| v.to_string()).unwrap_or_default()),
        );
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct WarningRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Boiler_Efficiency")]
    efficiency: Option<f64>,
    #[serde(rename = "Eff_Drop_Pct")]
    drop_pct: Option<f64>,
    #[serde(rename = "Flue_Temp_Delta")]
    flue_temp_delta: Option<f64>,
    #[serde(rename = "O2_Level")]
    o2_level: Option<f64>,
    #[serde(rename = "Clean_Warning")]
    warning: bool,
}

pub fn write_warnings_table<W: io::Write>(
    writer: W,
    warnings: &[CleaningWarning],
) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for warning in warnings {
        csv.serialize(WarningRow {
            date: warning.date,
            efficiency: warning.efficiency,
            drop_pct: warning.drop_pct,
            flue_temp_delta: warning.flue_temp_delta,
            o2_level: warning.o2_level,
            warning: warning.warning,
        })?;
    }
    csv.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct RiskRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Clean_Prob")]
    probability: f64,
}

pub fn write_risk_table<W: io::Write>(
    writer: W,
    scores: &[CleaningRiskScore],
) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for score in scores {
        csv.serialize(RiskRow {
            date: score.date,
            probability: score.probability,
        })?;
    }
    csv.flush()?;
    Ok(())
}
