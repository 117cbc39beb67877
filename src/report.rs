use std::fmt::Write;

use crate::efficiency::BucketScheme;
use crate::error::AnalysisError;
use crate::models::{
    BucketMeans, CleaningRiskScore, CleaningWarning, FuelRecord, PARAMETER_FIELDS,
};

fn opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(value) => format!("{value:.decimals$}"),
        None => "n/a".to_string(),
    }
}

/// Render the batch results as a markdown report.
///
/// Deliberately free of timestamps so identical inputs produce identical
/// bytes.
pub fn build_report(
    fuel: &[FuelRecord],
    scheme: Option<&BucketScheme>,
    means: &[BucketMeans],
    warnings: &[CleaningWarning],
    risk: &Result<Vec<CleaningRiskScore>, AnalysisError>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Boiler Early Warning Report");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Efficiency");
    let _ = writeln!(output);
    let _ = writeln!(output, "| Date | Steam (MT) | Fuel (MT) | Efficiency (%) | Bucket |");
    let _ = writeln!(output, "|---|---|---|---|---|");
    for record in fuel {
        let _ = writeln!(
            output,
            "| {} | {:.2} | {:.2} | {} | {} |",
            record.date,
            record.steam_generated_mt,
            record.fuel_consumed_mt,
            opt(record.efficiency, 2),
            record.bucket.as_deref().unwrap_or("unclassified")
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Efficiency Bucket Breakdown");
    let _ = writeln!(output);
    match scheme {
        None => {
            let _ = writeln!(output, "No day had a usable efficiency value.");
        }
        Some(scheme) => {
            if let BucketScheme::Quartile { q1, q3 } = scheme {
                let _ = writeln!(
                    output,
                    "Quartile policy: Q1 = {q1:.2}, Q3 = {q3:.2} (boundaries are batch-relative)."
                );
                let _ = writeln!(output);
            }
            for label in scheme.labels() {
                let count = fuel
                    .iter()
                    .filter(|record| record.bucket.as_deref() == Some(label.as_str()))
                    .count();
                let _ = writeln!(output, "- {label}: {count} days");
            }
            let unclassified = fuel.iter().filter(|record| record.bucket.is_none()).count();
            if unclassified > 0 {
                let _ = writeln!(output, "- unclassified: {unclassified} days");
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Parameter Averages by Bucket");
    let _ = writeln!(output);
    if means.is_empty() {
        let _ = writeln!(output, "No parameter samples matched a bucketed day.");
    } else {
        let mut header = String::from("| Parameter |");
        let mut rule = String::from("|---|");
        for bucket in means {
            let _ = write!(header, " {} (n={}) |", bucket.bucket, bucket.sample_count);
            rule.push_str("---|");
        }
        let _ = writeln!(output, "{header}");
        let _ = writeln!(output, "{rule}");
        for (slot, (name, _)) in PARAMETER_FIELDS.iter().enumerate() {
            let _ = write!(output, "| {name} |");
            for bucket in means {
                let _ = write!(output, " {} |", opt(bucket.means[slot], 2));
            }
            let _ = writeln!(output);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Cleaning Warnings");
    let _ = writeln!(output);
    let flagged: Vec<&CleaningWarning> = warnings.iter().filter(|w| w.warning).collect();
    if flagged.is_empty() {
        let _ = writeln!(output, "No cleaning warnings in this batch.");
    } else {
        let _ = writeln!(
            output,
            "{} of {} days flagged.",
            flagged.len(),
            warnings.len()
        );
        for warning in flagged {
            let _ = writeln!(
                output,
                "- {}: efficiency drop {}%, flue-gas delta {} C, O2 {}%",
                warning.date,
                opt(warning.drop_pct, 1),
                opt(warning.flue_temp_delta, 1),
                opt(warning.o2_level, 1)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Cleaning Risk");
    let _ = writeln!(output);
    match risk {
        Err(err) => {
            let _ = writeln!(output, "Risk scores unavailable: {err}.");
        }
        Ok(scores) => {
            let mut ranked: Vec<&CleaningRiskScore> = scores.iter().collect();
            ranked.sort_by(|a, b| {
                b.probability
                    .partial_cmp(&a.probability)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.date.cmp(&b.date))
            });
            for score in ranked.iter().take(10) {
                let _ = writeln!(
                    output,
                    "- {}: {:.1}% cleaning risk",
                    score.date,
                    score.probability * 100.0
                );
            }
        }
    }

    output
}
