use statrs::statistics::{Data, OrderStatistics};
use tracing::{debug, warn};

use crate::config::{AnalysisConfig, BucketPolicy};
use crate::models::FuelRecord;

/// Fill in each day's efficiency as `steam / fuel * calorific_constant`.
///
/// Days with nonpositive fuel consumption get a null efficiency and are
/// excluded from quartile and bucket computation; the batch keeps going.
pub fn compute_efficiency(records: &mut [FuelRecord], calorific_constant: f64) {
    for record in records.iter_mut() {
        if record.fuel_consumed_mt > 0.0 {
            record.efficiency =
                Some(record.steam_generated_mt / record.fuel_consumed_mt * calorific_constant);
        } else {
            warn!(
                date = %record.date,
                fuel = record.fuel_consumed_mt,
                "nonpositive fuel consumption, efficiency left null"
            );
            record.efficiency = None;
        }
    }
}

/// Bucket boundaries fixed for one batch.
///
/// Static boundaries are closed on the lower end; quartile boundaries send
/// values equal to Q1 or Q3 to Medium.
#[derive(Debug, Clone)]
pub enum BucketScheme {
    Static { cutpoints: Vec<f64> },
    Quartile { q1: f64, q3: f64 },
}

impl BucketScheme {
    fn from_cutpoints(cutpoints: &[f64]) -> Self {
        Self::Static {
            cutpoints: cutpoints.to_vec(),
        }
    }

    /// Two-pass quartile policy, pass 1: batch Q1/Q3 over non-null values.
    fn from_quartiles(values: &[f64]) -> Self {
        let mut data = Data::new(values.to_vec());
        let scheme = Self::Quartile {
            q1: data.quantile(0.25),
            q3: data.quantile(0.75),
        };
        debug!(?scheme, days = values.len(), "derived batch quartiles");
        scheme
    }

    /// Every finite efficiency value maps to exactly one label.
    pub fn classify(&self, efficiency: f64) -> String {
        match self {
            Self::Static { cutpoints } => {
                let band = cutpoints
                    .iter()
                    .position(|cut| efficiency < *cut)
                    .unwrap_or(cutpoints.len());
                self.labels()[band].clone()
            }
            Self::Quartile { q1, q3 } => {
                if efficiency < *q1 {
                    "Low".to_string()
                } else if efficiency > *q3 {
                    "High".to_string()
                } else {
                    "Medium".to_string()
                }
            }
        }
    }

    /// All labels in ascending efficiency order, including empty bands.
    pub fn labels(&self) -> Vec<String> {
        match self {
            Self::Static { cutpoints } => {
                let mut labels = Vec::with_capacity(cutpoints.len() + 1);
                labels.push(format!("<{}%", cutpoints[0]));
                for pair in cutpoints.windows(2) {
                    labels.push(format!("{}-{}%", pair[0], pair[1]));
                }
                labels.push(format!(
                    ">={}%",
                    cutpoints.last().copied().unwrap_or_default()
                ));
                labels
            }
            Self::Quartile { .. } => {
                vec!["Low".to_string(), "Medium".to_string(), "High".to_string()]
            }
        }
    }
}

/// Pass 2: label every day with a non-null efficiency.
///
/// Returns the scheme used, or `None` when no day has a usable efficiency.
/// Null-efficiency days stay in the table with a null bucket.
pub fn assign_buckets(records: &mut [FuelRecord], config: &AnalysisConfig) -> Option<BucketScheme> {
    let values: Vec<f64> = records.iter().filter_map(|r| r.efficiency).collect();
    if values.is_empty() {
        warn!("no usable efficiency values, skipping bucket assignment");
        return None;
    }
    let scheme = match config.bucket_policy {
        BucketPolicy::Static => BucketScheme::from_cutpoints(&config.static_cutpoints),
        BucketPolicy::Quartile => BucketScheme::from_quartiles(&values),
    };
    for record in records.iter_mut() {
        record.bucket = record.efficiency.map(|eff| scheme.classify(eff));
    }
    Some(scheme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fuel;

    fn config(policy: BucketPolicy) -> AnalysisConfig {
        AnalysisConfig {
            bucket_policy: policy,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn efficiency_is_monotonic_in_steam_and_fuel() {
        let mut records = vec![
            fuel(1, 100.0, 1.5),
            fuel(2, 110.0, 1.5),
            fuel(3, 100.0, 1.6),
        ];
        compute_efficiency(&mut records, 17.5);
        let base = records[0].efficiency.unwrap();
        assert!(records[1].efficiency.unwrap() > base);
        assert!(records[2].efficiency.unwrap() < base);
    }

    #[test]
    fn nonpositive_fuel_nulls_the_day() {
        let mut records = vec![fuel(1, 100.0, 0.0), fuel(2, 100.0, -1.0)];
        compute_efficiency(&mut records, 17.5);
        assert!(records[0].efficiency.is_none());
        assert!(records[1].efficiency.is_none());
    }

    #[test]
    fn commissioning_example_values() {
        let mut records = vec![
            fuel(1, 100.0, 1.5),
            fuel(2, 100.0, 1.6),
            fuel(3, 70.0, 1.6),
        ];
        compute_efficiency(&mut records, 17.5);
        let eff: Vec<f64> = records.iter().map(|r| r.efficiency.unwrap()).collect();
        assert!((eff[0] - 1166.6667).abs() < 0.001);
        assert!((eff[1] - 1093.75).abs() < 0.001);
        assert!((eff[2] - 765.625).abs() < 0.001);
    }

    #[test]
    fn static_bands_are_closed_on_the_lower_end() {
        let scheme = BucketScheme::from_cutpoints(&[70.0, 72.0, 75.0]);
        assert_eq!(scheme.labels(), vec!["<70%", "70-72%", "72-75%", ">=75%"]);
        assert_eq!(scheme.classify(69.9), "<70%");
        assert_eq!(scheme.classify(70.0), "70-72%");
        assert_eq!(scheme.classify(74.9), "72-75%");
        assert_eq!(scheme.classify(75.0), ">=75%");
        assert_eq!(scheme.classify(1166.7), ">=75%");
    }

    #[test]
    fn quartile_boundaries_go_to_medium() {
        let scheme = BucketScheme::Quartile { q1: 20.0, q3: 40.0 };
        assert_eq!(scheme.classify(19.9), "Low");
        assert_eq!(scheme.classify(20.0), "Medium");
        assert_eq!(scheme.classify(40.0), "Medium");
        assert_eq!(scheme.classify(40.1), "High");
    }

    #[test]
    fn quartile_assignment_is_total_over_non_null_days() {
        let mut records: Vec<_> = [10.0, 20.0, 30.0, 40.0, 50.0]
            .iter()
            .enumerate()
            .map(|(i, steam)| fuel(i as u32 + 1, *steam, 1.0))
            .collect();
        records.push(fuel(6, 100.0, 0.0)); // null efficiency day
        compute_efficiency(&mut records, 1.0);
        let scheme = assign_buckets(&mut records, &config(BucketPolicy::Quartile)).unwrap();
        assert!(matches!(scheme, BucketScheme::Quartile { .. }));

        let classified = records.iter().filter(|r| r.bucket.is_some()).count();
        assert_eq!(classified, 5);
        assert!(records[5].bucket.is_none());

        let count = |label: &str| {
            records
                .iter()
                .filter(|r| r.bucket.as_deref() == Some(label))
                .count()
        };
        assert_eq!(count("Low") + count("Medium") + count("High"), 5);
        assert_eq!(records[0].bucket.as_deref(), Some("Low"));
        assert_eq!(records[2].bucket.as_deref(), Some("Medium"));
        assert_eq!(records[4].bucket.as_deref(), Some("High"));
    }

    #[test]
    fn all_null_batch_assigns_nothing() {
        let mut records = vec![fuel(1, 100.0, 0.0)];
        compute_efficiency(&mut records, 17.5);
        assert!(assign_buckets(&mut records, &config(BucketPolicy::Quartile)).is_none());
        assert!(records[0].bucket.is_none());
    }
}
