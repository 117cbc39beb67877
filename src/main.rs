use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod align;
mod cleaning;
mod config;
mod efficiency;
mod error;
mod ingest;
mod models;
mod report;
mod tables;
#[cfg(test)]
mod testutil;

use config::AnalysisConfig;
use error::AnalysisError;
use models::{BucketMeans, CleaningRiskScore, CleaningWarning, FuelRecord, ParameterSample};

#[derive(Parser)]
#[command(name = "boiler-early-warning")]
#[command(about = "Boiler efficiency analysis and cleaning early warning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Daily fuel and steam totals CSV
    #[arg(long)]
    fuel: PathBuf,
    /// DCS parameter export CSV
    #[arg(long)]
    params: PathBuf,
    /// JSON config file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and write the four output tables as CSV
    Analyze {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Print the days with the highest cleaning risk
    Score {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

/// Everything one batch run produces. The risk table keeps its error so the
/// rule-engine outputs stay usable when training data is degenerate.
struct PipelineOutput {
    fuel: Vec<FuelRecord>,
    scheme: Option<efficiency::BucketScheme>,
    means: Vec<BucketMeans>,
    warnings: Vec<CleaningWarning>,
    risk: Result<Vec<CleaningRiskScore>, AnalysisError>,
}

/// The whole batch: align, derive efficiency, bucket, aggregate, run the
/// cleaning rules, train and score the risk model.
fn run_pipeline(
    config: &AnalysisConfig,
    mut fuel: Vec<FuelRecord>,
    samples: Vec<ParameterSample>,
) -> PipelineOutput {
    let samples = align::filter_operating_hours(samples, config.operating_hours_window.as_ref());
    align::sort_by_date(&mut fuel);
    efficiency::compute_efficiency(&mut fuel, config.calorific_constant);
    let scheme = efficiency::assign_buckets(&mut fuel, config);

    let labeled = aggregate::label_samples(&samples, &fuel);
    let label_order = scheme.as_ref().map(|s| s.labels()).unwrap_or_default();
    let means = aggregate::bucket_means(&labeled, &label_order);

    let daily = aggregate::daily_sensor_means(&samples);
    let warnings = cleaning::evaluate_rules(&fuel, &daily, config);
    let rows = cleaning::build_training_rows(&fuel, &daily, &warnings);
    let risk = cleaning::score_cleaning_risk(&rows);

    PipelineOutput {
        fuel,
        scheme,
        means,
        warnings,
        risk,
    }
}

fn load_and_run(input: &InputArgs) -> anyhow::Result<PipelineOutput> {
    let config = AnalysisConfig::load(input.config.as_deref())?;
    let fuel = ingest::load_fuel_records(&input.fuel)?;
    let samples = ingest::load_parameter_samples(&input.params)?;
    info!(
        fuel_days = fuel.len(),
        samples = samples.len(),
        "inputs loaded"
    );
    Ok(run_pipeline(&config, fuel, samples))
}

fn create(path: &Path) -> anyhow::Result<std::fs::File> {
    std::fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { input, out_dir } => {
            let output = load_and_run(&input)?;
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("failed to create {}", out_dir.display()))?;

            let path = out_dir.join("efficiency.csv");
            tables::write_efficiency_table(create(&path)?, &output.fuel)?;
            println!("Wrote {} ({} days).", path.display(), output.fuel.len());

            let path = out_dir.join("bucket_means.csv");
            tables::write_bucket_means_table(create(&path)?, &output.means)?;
            println!("Wrote {} ({} buckets).", path.display(), output.means.len());

            let path = out_dir.join("warnings.csv");
            tables::write_warnings_table(create(&path)?, &output.warnings)?;
            let flagged = output.warnings.iter().filter(|w| w.warning).count();
            println!(
                "Wrote {} ({} of {} days flagged).",
                path.display(),
                flagged,
                output.warnings.len()
            );

            match &output.risk {
                Ok(scores) => {
                    let path = out_dir.join("risk.csv");
                    tables::write_risk_table(create(&path)?, scores)?;
                    println!("Wrote {} ({} scored days).", path.display(), scores.len());
                }
                Err(err) => println!("Risk table skipped: {err}."),
            }
        }
        Commands::Score { input, limit } => {
            let output = load_and_run(&input)?;
            let mut scores = output.risk?;
            scores.sort_by(|a, b| {
                b.probability
                    .partial_cmp(&a.probability)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.date.cmp(&b.date))
            });
            println!("Top days by cleaning risk:");
            for score in scores.iter().take(limit) {
                println!("- {} probability {:.3}", score.date, score.probability);
            }
        }
        Commands::Report { input, out } => {
            let output = load_and_run(&input)?;
            let report = report::build_report(
                &output.fuel,
                output.scheme.as_ref(),
                &output.means,
                &output.warnings,
                &output.risk,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BucketPolicy;
    use crate::testutil::{fuel, sensor_sample};

    const FUEL_CSV: &str = "\
Date,Qty. of Steam Generated (in MT),Fuel Consumed (in MT)
2026-03-01,100.0,1.5
2026-03-02,100.0,1.6
2026-03-03,70.0,1.6
";

    const PARAM_CSV: &str = "\
dateandtime,EquipmentName,AT_401_Oxygen_Analyser,AT_704B_Nox_Analyser,TE_402_Boiler_Outlet_Flue_Gas_Temp
2026-03-01 08:00:00,Boiler-1,4.0,110.0,180.0
2026-03-02 08:00:00,Boiler-1,4.2,112.0,181.0
2026-03-03 08:00:00,Boiler-1,4.4,114.0,182.0
2026-03-03 03:00:00,Boiler-1,9.9,400.0,400.0
";

    fn static_config() -> AnalysisConfig {
        AnalysisConfig {
            bucket_policy: BucketPolicy::Static,
            ..AnalysisConfig::default()
        }
    }

    /// Eight clean days where only efficiency drops trigger warnings; every
    /// day has a full feature vector, so the model can train.
    fn trainable_inputs() -> (Vec<FuelRecord>, Vec<ParameterSample>) {
        let efficiencies = [80.0, 80.0, 80.0, 76.0, 80.0, 80.0, 72.0, 80.0];
        let fuel_records = efficiencies
            .iter()
            .enumerate()
            .map(|(i, eff)| fuel(i as u32 + 1, *eff, 1.0))
            .collect();
        let samples = (1..=8)
            .map(|d| sensor_sample(d, Some(180.0), Some(4.0), Some(110.0)))
            .collect();
        (fuel_records, samples)
    }

    fn trainable_config() -> AnalysisConfig {
        AnalysisConfig {
            calorific_constant: 1.0,
            ..static_config()
        }
    }

    #[test]
    fn commissioning_example_lands_in_the_top_band() {
        let fuel = ingest::read_fuel_records(FUEL_CSV.as_bytes()).unwrap();
        let samples = ingest::read_parameter_samples(PARAM_CSV.as_bytes()).unwrap();
        let output = run_pipeline(&static_config(), fuel, samples);

        let labels = output.scheme.as_ref().unwrap().labels();
        assert_eq!(labels, vec!["<70%", "70-72%", "72-75%", ">=75%"]);
        let counts: Vec<usize> = labels
            .iter()
            .map(|label| {
                output
                    .fuel
                    .iter()
                    .filter(|r| r.bucket.as_deref() == Some(label.as_str()))
                    .count()
            })
            .collect();
        assert_eq!(counts, vec![0, 0, 0, 3]);

        // days two and three drop 6.25% and 30%, both past the 3% threshold
        assert!(!output.warnings[0].warning);
        assert!(output.warnings[1].warning);
        assert!(output.warnings[2].warning);

        // three days is below the minimum training size
        assert!(matches!(
            output.risk,
            Err(AnalysisError::InsufficientTraining { .. })
        ));
    }

    #[test]
    fn operating_window_excludes_early_morning_scans() {
        let fuel = ingest::read_fuel_records(FUEL_CSV.as_bytes()).unwrap();
        let samples = ingest::read_parameter_samples(PARAM_CSV.as_bytes()).unwrap();
        let output = run_pipeline(&static_config(), fuel, samples);

        // the 03:00 scan with wild readings is outside 07:00-19:00
        let day3 = output
            .warnings
            .iter()
            .find(|w| w.date == crate::testutil::day(3))
            .unwrap();
        assert_eq!(day3.o2_level, Some(4.4));
    }

    #[test]
    fn degenerate_labels_keep_rule_table_and_drop_risk() {
        // constant efficiency, cool flue gas, low O2: no rule ever fires
        let fuel_records: Vec<FuelRecord> = (1..=8).map(|d| fuel(d, 80.0, 1.0)).collect();
        let samples: Vec<ParameterSample> = (1..=8)
            .map(|d| sensor_sample(d, Some(180.0), Some(4.0), Some(110.0)))
            .collect();
        let output = run_pipeline(&trainable_config(), fuel_records, samples);

        assert_eq!(output.warnings.len(), 8);
        assert!(output.warnings.iter().all(|w| !w.warning));
        match output.risk {
            Err(AnalysisError::InsufficientTraining { positives, .. }) => {
                assert_eq!(positives, 0)
            }
            other => panic!("expected insufficient training data, got {other:?}"),
        }
    }

    #[test]
    fn risk_model_flags_the_drop_days() {
        let (fuel_records, samples) = trainable_inputs();
        let output = run_pipeline(&trainable_config(), fuel_records, samples);

        let scores = output.risk.unwrap();
        assert_eq!(scores.len(), 8);
        let by_date: std::collections::HashMap<_, _> = scores
            .iter()
            .map(|s| (s.date, s.probability))
            .collect();
        let warned: Vec<f64> = output
            .warnings
            .iter()
            .filter(|w| w.warning)
            .map(|w| by_date[&w.date])
            .collect();
        let clear: Vec<f64> = output
            .warnings
            .iter()
            .filter(|w| !w.warning)
            .map(|w| by_date[&w.date])
            .collect();
        assert_eq!(warned.len(), 2);
        assert!(scores
            .iter()
            .all(|s| (0.0..=1.0).contains(&s.probability)));
        // every flagged day outranks every clear day
        let lowest_warned = warned.iter().cloned().fold(f64::INFINITY, f64::min);
        let highest_clear = clear.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(lowest_warned > highest_clear);
    }

    #[test]
    fn pipeline_is_byte_identical_across_runs() {
        let render = || {
            let (fuel_records, samples) = trainable_inputs();
            let output = run_pipeline(&trainable_config(), fuel_records, samples);
            let mut bytes = Vec::new();
            tables::write_efficiency_table(&mut bytes, &output.fuel).unwrap();
            tables::write_bucket_means_table(&mut bytes, &output.means).unwrap();
            tables::write_warnings_table(&mut bytes, &output.warnings).unwrap();
            tables::write_risk_table(&mut bytes, &output.risk.unwrap()).unwrap();
            bytes
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn aggregated_rows_track_all_aligned_samples() {
        let (fuel_records, samples) = trainable_inputs();
        let config = trainable_config();
        let aligned =
            align::filter_operating_hours(samples, config.operating_hours_window.as_ref());
        let mut fuel_records = fuel_records;
        align::sort_by_date(&mut fuel_records);
        efficiency::compute_efficiency(&mut fuel_records, config.calorific_constant);
        efficiency::assign_buckets(&mut fuel_records, &config);
        let labeled = aggregate::label_samples(&aligned, &fuel_records);
        assert_eq!(labeled.len(), aligned.len());
    }
}
