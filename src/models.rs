use chrono::{NaiveDate, NaiveDateTime};

/// One day of fuel and steam totals for a single boiler.
///
/// `efficiency` and `bucket` start out empty and are filled in by the
/// efficiency and bucket stages; a `None` efficiency means the day had
/// nonpositive fuel consumption and is excluded from bucket statistics.
#[derive(Debug, Clone)]
pub struct FuelRecord {
    pub date: NaiveDate,
    pub steam_generated_mt: f64,
    pub fuel_consumed_mt: f64,
    pub efficiency: Option<f64>,
    pub bucket: Option<String>,
}

impl FuelRecord {
    pub fn new(date: NaiveDate, steam_generated_mt: f64, fuel_consumed_mt: f64) -> Self {
        Self {
            date,
            steam_generated_mt,
            fuel_consumed_mt,
            efficiency: None,
            bucket: None,
        }
    }
}

/// One sensor scan from the boiler DCS export.
///
/// Every sensor field is optional: analysers drop out individually, and a
/// missing cell must not invalidate the rest of the scan.
#[derive(Debug, Clone)]
pub struct ParameterSample {
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub boiler: String,
    pub sox: Option<f64>,
    pub nox: Option<f64>,
    pub spm: Option<f64>,
    pub boiler_steam_total: Option<f64>,
    pub deaerator_steam_total: Option<f64>,
    pub boiler_steam_flow: Option<f64>,
    pub deaerator_steam_flow: Option<f64>,
    pub deaerator_tank_level: Option<f64>,
    pub boiler_water_level: Option<f64>,
    pub id_fan_speed: Option<f64>,
    pub furnace_draft: Option<f64>,
    pub steam_pressure: Option<f64>,
    pub steam_header_temp: Option<f64>,
    pub furnace_exit_temp_1: Option<f64>,
    pub furnace_exit_temp_2: Option<f64>,
    pub flue_gas_temp: Option<f64>,
    pub eco_inlet_water_temp: Option<f64>,
    pub eco_outlet_water_temp: Option<f64>,
    pub pa_damper_1: Option<f64>,
    pub pa_damper_2: Option<f64>,
    pub pa_damper_3: Option<f64>,
    pub sa_damper_1: Option<f64>,
    pub sa_damper_2: Option<f64>,
    pub o2: Option<f64>,
    pub boiler_status: Option<f64>,
}

/// The fixed, versioned list of parameter fields the aggregator summarizes.
///
/// Column order here is the column order of the bucket-means table; adding a
/// sensor means appending here, never reordering.
pub const PARAMETER_FIELDS: &[(&str, fn(&ParameterSample) -> Option<f64>)] = &[
    ("SOx", |s: &ParameterSample| s.sox),
    ("NOx", |s: &ParameterSample| s.nox),
    ("SPM", |s: &ParameterSample| s.spm),
    ("Boiler_Steam_Total", |s: &ParameterSample| s.boiler_steam_total),
    ("Deaerator_Steam_Total", |s: &ParameterSample| s.deaerator_steam_total),
    ("Boiler_Steam_Flow", |s: &ParameterSample| s.boiler_steam_flow),
    ("Deaerator_Steam_Flow", |s: &ParameterSample| s.deaerator_steam_flow),
    ("Deaerator_Tank_Level", |s: &ParameterSample| s.deaerator_tank_level),
    ("Boiler_Water_Level", |s: &ParameterSample| s.boiler_water_level),
    ("IDFan_Speed_Signal", |s: &ParameterSample| s.id_fan_speed),
    ("Furnace_Draft", |s: &ParameterSample| s.furnace_draft),
    ("Steam_Pressure", |s: &ParameterSample| s.steam_pressure),
    ("Steam_Header_Temp", |s: &ParameterSample| s.steam_header_temp),
    ("Furnace_Exit_Temp_1", |s: &ParameterSample| s.furnace_exit_temp_1),
    ("Furnace_Exit_Temp_2", |s: &ParameterSample| s.furnace_exit_temp_2),
    ("Flue_Gas_Temp", |s: &ParameterSample| s.flue_gas_temp),
    ("Eco_Inlet_Water_Temp", |s: &ParameterSample| s.eco_inlet_water_temp),
    ("Eco_Outlet_Water_Temp", |s: &ParameterSample| s.eco_outlet_water_temp),
    ("PA_Damper_1", |s: &ParameterSample| s.pa_damper_1),
    ("PA_Damper_2", |s: &ParameterSample| s.pa_damper_2),
    ("PA_Damper_3", |s: &ParameterSample| s.pa_damper_3),
    ("SA_Damper_1", |s: &ParameterSample| s.sa_damper_1),
    ("SA_Damper_2", |s: &ParameterSample| s.sa_damper_2),
    ("O2_Analyser", |s: &ParameterSample| s.o2),
    ("Boiler_Status", |s: &ParameterSample| s.boiler_status),
];

/// A parameter sample annotated with its day's efficiency label.
///
/// Left join: samples whose date has no fuel record keep `None` on both.
#[derive(Debug, Clone)]
pub struct LabeledSample {
    pub sample: ParameterSample,
    pub efficiency: Option<f64>,
    pub bucket: Option<String>,
}

/// Per-bucket arithmetic means, one entry per `PARAMETER_FIELDS` slot.
#[derive(Debug, Clone)]
pub struct BucketMeans {
    pub bucket: String,
    pub sample_count: usize,
    pub means: Vec<Option<f64>>,
}

/// Daily means of the sensors the cleaning stages consume.
#[derive(Debug, Clone)]
pub struct DailySensorMeans {
    pub date: NaiveDate,
    pub flue_gas_temp: Option<f64>,
    pub o2: Option<f64>,
    pub nox: Option<f64>,
}

/// Rule-engine verdict for one day.
///
/// `drop_pct` and `flue_temp_delta` are `None` on the first day and whenever
/// the previous day's value is missing; an undefined rule never warns.
#[derive(Debug, Clone)]
pub struct CleaningWarning {
    pub date: NaiveDate,
    pub efficiency: Option<f64>,
    pub drop_pct: Option<f64>,
    pub flue_temp_delta: Option<f64>,
    pub o2_level: Option<f64>,
    pub warning: bool,
}

/// Model output: probability that the day needed cleaning.
#[derive(Debug, Clone)]
pub struct CleaningRiskScore {
    pub date: NaiveDate,
    pub probability: f64,
}
