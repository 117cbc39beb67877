use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::models::{CleaningRiskScore, CleaningWarning, DailySensorMeans, FuelRecord};

/// Feature vector of the risk model, in column order. Versioned: changing
/// this list changes what a stored risk table means.
pub const MODEL_FEATURES: [&str; 4] = [
    "Boiler_Efficiency",
    "Flue_Gas_Temp",
    "O2_Analyser",
    "NOx",
];

const MIN_TRAINING_ROWS: usize = MODEL_FEATURES.len();
const LEARNING_RATE: f64 = 0.1;
const TRAINING_STEPS: usize = 500;

/// Run the three cleaning rules over the date-sorted fuel series.
///
/// Explicit fold carrying the previous day's efficiency and mean flue-gas
/// temperature; an undefined rule (first day, missing predecessor value)
/// counts as not fired, so only the O2 rule can warn on day one.
pub fn evaluate_rules(
    fuel: &[FuelRecord],
    daily: &[DailySensorMeans],
    config: &AnalysisConfig,
) -> Vec<CleaningWarning> {
    let sensors: HashMap<NaiveDate, &DailySensorMeans> =
        daily.iter().map(|day| (day.date, day)).collect();

    let mut warnings = Vec::with_capacity(fuel.len());
    let mut prev_efficiency: Option<f64> = None;
    let mut prev_flue_temp: Option<f64> = None;

    for record in fuel {
        let day = sensors.get(&record.date);
        let flue_temp = day.and_then(|d| d.flue_gas_temp);
        let o2_level = day.and_then(|d| d.o2);

        let drop_pct = match (prev_efficiency, record.efficiency) {
            (Some(prev), Some(current)) if prev.abs() > f64::EPSILON => {
                Some((prev - current) / prev * 100.0)
            }
            _ => None,
        };
        let flue_temp_delta = match (prev_flue_temp, flue_temp) {
            (Some(prev), Some(current)) => Some(current - prev),
            _ => None,
        };

        let efficiency_dropped = drop_pct.is_some_and(|drop| drop >= config.drop_threshold_pct);
        let flue_temp_rose =
            flue_temp_delta.is_some_and(|delta| delta >= config.temp_rise_threshold);
        let o2_high = o2_level.is_some_and(|o2| o2 > config.o2_threshold_pct);
        let warning = efficiency_dropped || flue_temp_rose || o2_high;

        if warning {
            debug!(
                date = %record.date,
                efficiency_dropped,
                flue_temp_rose,
                o2_high,
                "cleaning warning raised"
            );
        }
        warnings.push(CleaningWarning {
            date: record.date,
            efficiency: record.efficiency,
            drop_pct,
            flue_temp_delta,
            o2_level,
            warning,
        });

        prev_efficiency = record.efficiency;
        prev_flue_temp = flue_temp;
    }
    warnings
}

/// One day the model can train on: all four features present.
#[derive(Debug, Clone)]
pub struct TrainingRow {
    pub date: NaiveDate,
    pub features: [f64; 4],
    pub label: bool,
}

/// Inner join of fuel days, daily sensor means and rule labels.
///
/// Days missing any feature are left out of training and scoring; they keep
/// their rule-engine verdict.
pub fn build_training_rows(
    fuel: &[FuelRecord],
    daily: &[DailySensorMeans],
    warnings: &[CleaningWarning],
) -> Vec<TrainingRow> {
    let sensors: HashMap<NaiveDate, &DailySensorMeans> =
        daily.iter().map(|day| (day.date, day)).collect();
    let labels: HashMap<NaiveDate, bool> = warnings
        .iter()
        .map(|warning| (warning.date, warning.warning))
        .collect();

    fuel.iter()
        .filter_map(|record| {
            let day = sensors.get(&record.date)?;
            let row = TrainingRow {
                date: record.date,
                features: [
                    record.efficiency?,
                    day.flue_gas_temp?,
                    day.o2?,
                    day.nox?,
                ],
                label: *labels.get(&record.date)?,
            };
            Some(row)
        })
        .collect()
}

/// Fit a logistic regression on the rule labels and score every training day.
///
/// Deterministic by construction: standardized features, zero-initialized
/// weights, fixed-step full-batch gradient descent. Retrained from scratch on
/// every run; nothing persists.
pub fn score_cleaning_risk(rows: &[TrainingRow]) -> Result<Vec<CleaningRiskScore>, AnalysisError> {
    let positives = rows.iter().filter(|row| row.label).count();
    let negatives = rows.len() - positives;
    if rows.len() < MIN_TRAINING_ROWS || positives == 0 || negatives == 0 {
        return Err(AnalysisError::InsufficientTraining {
            rows: rows.len(),
            positives,
            negatives,
            min_rows: MIN_TRAINING_ROWS,
        });
    }

    let standardized = standardize(rows);
    let n = rows.len() as f64;
    let mut weights = [0.0f64; 4];
    let mut bias = 0.0f64;

    for _ in 0..TRAINING_STEPS {
        let mut weight_grads = [0.0f64; 4];
        let mut bias_grad = 0.0f64;
        for (features, row) in standardized.iter().zip(rows) {
            let error = sigmoid(dot(&weights, features) + bias) - f64::from(row.label as u8);
            for (grad, feature) in weight_grads.iter_mut().zip(features) {
                *grad += error * feature;
            }
            bias_grad += error;
        }
        for (weight, grad) in weights.iter_mut().zip(&weight_grads) {
            *weight -= LEARNING_RATE * grad / n;
        }
        bias -= LEARNING_RATE * bias_grad / n;
    }

    info!(
        rows = rows.len(),
        positives, negatives, "trained cleaning risk model"
    );
    Ok(standardized
        .iter()
        .zip(rows)
        .map(|(features, row)| CleaningRiskScore {
            date: row.date,
            probability: sigmoid(dot(&weights, features) + bias),
        })
        .collect())
}

/// Z-score each feature column; constant columns become all zeros.
fn standardize(rows: &[TrainingRow]) -> Vec<[f64; 4]> {
    let n = rows.len() as f64;
    let mut means = [0.0f64; 4];
    for row in rows {
        for (mean, feature) in means.iter_mut().zip(&row.features) {
            *mean += feature;
        }
    }
    for mean in &mut means {
        *mean /= n;
    }

    let mut stds = [0.0f64; 4];
    for row in rows {
        for ((std, feature), mean) in stds.iter_mut().zip(&row.features).zip(&means) {
            *std += (feature - mean).powi(2);
        }
    }
    for std in &mut stds {
        *std = (*std / n).sqrt();
        if *std < 1e-12 {
            *std = 1.0;
        }
    }

    rows.iter()
        .map(|row| {
            let mut features = [0.0f64; 4];
            for slot in 0..4 {
                features[slot] = (row.features[slot] - means[slot]) / stds[slot];
            }
            features
        })
        .collect()
}

fn dot(weights: &[f64; 4], features: &[f64; 4]) -> f64 {
    weights.iter().zip(features).map(|(w, x)| w * x).sum()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
