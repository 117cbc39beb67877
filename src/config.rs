use std::path::Path;

use anyhow::Context;
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer};

/// How efficiency days are split into tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketPolicy {
    /// Fixed cutpoints from `static_cutpoints`, identical across runs.
    Static,
    /// Q1/Q3 recomputed from each batch; labels are batch-relative.
    Quartile,
}

/// Inclusive time-of-day window; samples outside it are dropped.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OperatingWindow {
    #[serde(deserialize_with = "de_time")]
    pub start: NaiveTime,
    #[serde(deserialize_with = "de_time")]
    pub end: NaiveTime,
}

fn de_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
        .map_err(|_| serde::de::Error::custom(format!("invalid time of day '{raw}'")))
}

/// Tunables for one analysis run, loaded from a JSON file.
///
/// Every field has a default matching the plant's commissioning values, so a
/// partial (or absent) config file is fine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Fuel-specific conversion factor for `steam / fuel * constant`.
    pub calorific_constant: f64,
    pub bucket_policy: BucketPolicy,
    /// Ascending band boundaries for the static policy, closed on the low end.
    pub static_cutpoints: Vec<f64>,
    /// Rule A: day-over-day efficiency drop, percent.
    pub drop_threshold_pct: f64,
    /// Rule B: day-over-day mean flue-gas temperature rise, degrees C.
    pub temp_rise_threshold: f64,
    /// Rule C: daily mean O2 reading, percent.
    pub o2_threshold_pct: f64,
    /// `None` keeps every sample regardless of time of day.
    pub operating_hours_window: Option<OperatingWindow>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            calorific_constant: 17.5,
            bucket_policy: BucketPolicy::Quartile,
            static_cutpoints: vec![70.0, 72.0, 75.0],
            drop_threshold_pct: 3.0,
            temp_rise_threshold: 5.0,
            o2_threshold_pct: 15.0,
            operating_hours_window: Some(OperatingWindow {
                start: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
                end: NaiveTime::from_hms_opt(19, 0, 0).unwrap_or(NaiveTime::MIN),
            }),
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.calorific_constant.is_finite() && self.calorific_constant > 0.0,
            "calorific_constant must be positive"
        );
        anyhow::ensure!(
            !self.static_cutpoints.is_empty(),
            "static_cutpoints must not be empty"
        );
        anyhow::ensure!(
            self.static_cutpoints.windows(2).all(|w| w[0] < w[1]),
            "static_cutpoints must be strictly ascending"
        );
        if let Some(window) = &self.operating_hours_window {
            anyhow::ensure!(
                window.start <= window.end,
                "operating_hours_window start must not be after end"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_commissioning_values() {
        let config = AnalysisConfig::default();
        assert_eq!(config.calorific_constant, 17.5);
        assert_eq!(config.bucket_policy, BucketPolicy::Quartile);
        assert_eq!(config.static_cutpoints, vec![70.0, 72.0, 75.0]);
        let window = config.operating_hours_window.unwrap();
        assert_eq!(window.start, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        assert_eq!(window.end, NaiveTime::from_hms_opt(19, 0, 0).unwrap());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{"bucket_policy": "static", "drop_threshold_pct": 5.0}"#,
        )
        .unwrap();
        assert_eq!(config.bucket_policy, BucketPolicy::Static);
        assert_eq!(config.drop_threshold_pct, 5.0);
        assert_eq!(config.calorific_constant, 17.5);
    }

    #[test]
    fn window_accepts_short_and_long_time_forms() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{"operating_hours_window": {"start": "06:30", "end": "20:15:00"}}"#,
        )
        .unwrap();
        let window = config.operating_hours_window.unwrap();
        assert_eq!(window.start, NaiveTime::from_hms_opt(6, 30, 0).unwrap());
        assert_eq!(window.end, NaiveTime::from_hms_opt(20, 15, 0).unwrap());
    }

    #[test]
    fn rejects_descending_cutpoints() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"static_cutpoints": [75.0, 72.0]}"#).unwrap();
        assert!(config.validate().is_err());
    }
}
