use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, warn};

use crate::align;
use crate::error::AnalysisError;
use crate::models::{FuelRecord, ParameterSample};

/// Raw header of the daily fuel log.
const COL_DATE: &str = "Date";
const COL_STEAM: &str = "Qty. of Steam Generated (in MT)";
const COL_FUEL: &str = "Fuel Consumed (in MT)";

/// Raw headers of the DCS parameter export. Only the columns the analysis
/// depends on are required; any other sensor may be absent.
const COL_TIMESTAMP: &str = "dateandtime";
const COL_EQUIPMENT: &str = "EquipmentName";
const COL_O2: &str = "AT_401_Oxygen_Analyser";
const COL_NOX: &str = "AT_704B_Nox_Analyser";
const COL_FLUE_TEMP: &str = "TE_402_Boiler_Outlet_Flue_Gas_Temp";

/// Header lookup for one source, keyed by the raw (trimmed) column name.
struct ColumnMap {
    source_name: &'static str,
    by_raw: HashMap<String, usize>,
}

impl ColumnMap {
    fn from_headers(source_name: &'static str, headers: &StringRecord) -> Self {
        let by_raw = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_string(), idx))
            .collect();
        Self { source_name, by_raw }
    }

    fn require(&self, raw: &str) -> Result<usize, AnalysisError> {
        self.by_raw
            .get(raw)
            .copied()
            .ok_or_else(|| AnalysisError::MissingColumn {
                source_name: self.source_name,
                column: raw.to_string(),
            })
    }

    fn optional(&self, raw: &str) -> Option<usize> {
        self.by_raw.get(raw).copied()
    }
}

fn cell<'a>(record: &'a StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("").trim()
}

fn numeric(record: &StringRecord, idx: Option<usize>) -> Option<f64> {
    let raw = cell(record, idx?);
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    for format in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    // Spreadsheet exports sometimes carry a midnight time on the date column.
    parse_timestamp(raw).map(|ts| ts.date())
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d-%m-%Y %H:%M:%S",
        "%d-%m-%Y %H:%M",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    None
}

/// Load and normalize the daily fuel log.
pub fn load_fuel_records(path: &Path) -> anyhow::Result<Vec<FuelRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open fuel data {}", path.display()))?;
    read_fuel_records(file)
}

pub fn read_fuel_records<R: Read>(reader: R) -> anyhow::Result<Vec<FuelRecord>> {
    let mut csv = csv::Reader::from_reader(reader);
    let map = ColumnMap::from_headers("fuel", csv.headers().context("fuel data has no header")?);
    let date_idx = map.require(COL_DATE)?;
    let steam_idx = map.require(COL_STEAM)?;
    let fuel_idx = map.require(COL_FUEL)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in csv.records() {
        let row = row.context("failed to read fuel data row")?;
        let date = parse_date(cell(&row, date_idx));
        let steam = numeric(&row, Some(steam_idx));
        let fuel = numeric(&row, Some(fuel_idx));
        match (date, steam, fuel) {
            (Some(date), Some(steam), Some(fuel)) => {
                records.push(FuelRecord::new(date, steam, fuel));
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "dropped unparseable fuel rows");
    }
    if records.is_empty() {
        return Err(AnalysisError::EmptyInput { source_name: "fuel" }.into());
    }
    debug!(rows = records.len(), "loaded fuel records");
    Ok(records)
}

/// Column indices for the parameter export, resolved once per file.
struct ParamColumns {
    timestamp: usize,
    equipment: Option<usize>,
    sox: Option<usize>,
    nox: Option<usize>,
    spm: Option<usize>,
    boiler_steam_total: Option<usize>,
    deaerator_steam_total: Option<usize>,
    boiler_steam_flow: Option<usize>,
    deaerator_steam_flow: Option<usize>,
    deaerator_tank_level: Option<usize>,
    boiler_water_level: Option<usize>,
    id_fan_speed: Option<usize>,
    furnace_draft: Option<usize>,
    steam_pressure: Option<usize>,
    steam_header_temp: Option<usize>,
    furnace_exit_temp_1: Option<usize>,
    furnace_exit_temp_2: Option<usize>,
    flue_gas_temp: Option<usize>,
    eco_inlet_water_temp: Option<usize>,
    eco_outlet_water_temp: Option<usize>,
    pa_damper_1: Option<usize>,
    pa_damper_2: Option<usize>,
    pa_damper_3: Option<usize>,
    sa_damper_1: Option<usize>,
    sa_damper_2: Option<usize>,
    o2: Option<usize>,
    boiler_status: Option<usize>,
}

impl ParamColumns {
    fn resolve(map: &ColumnMap) -> Result<Self, AnalysisError> {
        // O2, NOx and flue-gas temperature feed the cleaning stages and must
        // exist as columns even if individual cells are blank.
        let o2 = map.require(COL_O2)?;
        let nox = map.require(COL_NOX)?;
        let flue_gas_temp = map.require(COL_FLUE_TEMP)?;
        Ok(Self {
            timestamp: map.require(COL_TIMESTAMP)?,
            equipment: map.optional(COL_EQUIPMENT),
            sox: map.optional("AT_704A_Sox_Analyser"),
            nox: Some(nox),
            spm: map.optional("AT_706_SPM_Analyser"),
            boiler_steam_total: map.optional("FIQ_601_Boiler_Steam_Flow_Totaliser"),
            deaerator_steam_total: map.optional("FIQ_603_Deaerator_Steam_Flow_Totaliser"),
            boiler_steam_flow: map.optional("FT_601A_Boiler_Outlet_Steam_Flow"),
            deaerator_steam_flow: map.optional("FT_603_Deaerator_Steam_Flow"),
            deaerator_tank_level: map.optional("LT_501_Deaerator_Tank_Level"),
            boiler_water_level: map.optional("LT_601_Boiler_Water_Level"),
            id_fan_speed: map.optional("PIC_401A_RAMP_OP_Id_Fan_VFD_Speed_Control_Signal"),
            furnace_draft: map.optional("PT_401A_Furnace_Draft_Pressure"),
            steam_pressure: map.optional("PT_601_Boiler_Steam_Pressure"),
            steam_header_temp: map.optional("TE_208_Steam_Header_Temp"),
            furnace_exit_temp_1: map.optional("TE_401A_Furnace_Exit_Temp_1"),
            furnace_exit_temp_2: map.optional("TE_401C_Furnace_Exit_Temp_2"),
            flue_gas_temp: Some(flue_gas_temp),
            eco_inlet_water_temp: map.optional("TE_501_Economiser_Inlet_Water_Temp"),
            eco_outlet_water_temp: map.optional("TE_502_Economiser_Outlet_Water_Temp"),
            pa_damper_1: map.optional("XT_301A_Primary_Air_Damper_1"),
            pa_damper_2: map.optional("XT_301B_Primary_Air_Damper_2"),
            pa_damper_3: map.optional("XT_301C_Primary_Air_Damper_3"),
            sa_damper_1: map.optional("XT_302A_Secondary_Air_Damper_1"),
            sa_damper_2: map.optional("XT_302B_Secondary_Air_Damper_2"),
            o2: Some(o2),
            boiler_status: map.optional("BoilerOnOffStatus"),
        })
    }
}

/// Load and normalize the DCS parameter export.
pub fn load_parameter_samples(path: &Path) -> anyhow::Result<Vec<ParameterSample>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open parameter data {}", path.display()))?;
    read_parameter_samples(file)
}

pub fn read_parameter_samples<R: Read>(reader: R) -> anyhow::Result<Vec<ParameterSample>> {
    let mut csv = csv::Reader::from_reader(reader);
    let map = ColumnMap::from_headers(
        "parameter",
        csv.headers().context("parameter data has no header")?,
    );
    let cols = ParamColumns::resolve(&map)?;

    let mut samples = Vec::new();
    let mut skipped = 0usize;
    for row in csv.records() {
        let row = row.context("failed to read parameter data row")?;
        let Some(timestamp) = parse_timestamp(cell(&row, cols.timestamp)) else {
            skipped += 1;
            continue;
        };
        samples.push(ParameterSample {
            timestamp,
            date: align::sample_date(timestamp),
            boiler: cols
                .equipment
                .map(|idx| cell(&row, idx).to_string())
                .unwrap_or_default(),
            sox: numeric(&row, cols.sox),
            nox: numeric(&row, cols.nox),
            spm: numeric(&row, cols.spm),
            boiler_steam_total: numeric(&row, cols.boiler_steam_total),
            deaerator_steam_total: numeric(&row, cols.deaerator_steam_total),
            boiler_steam_flow: numeric(&row, cols.boiler_steam_flow),
            deaerator_steam_flow: numeric(&row, cols.deaerator_steam_flow),
            deaerator_tank_level: numeric(&row, cols.deaerator_tank_level),
            boiler_water_level: numeric(&row, cols.boiler_water_level),
            id_fan_speed: numeric(&row, cols.id_fan_speed),
            furnace_draft: numeric(&row, cols.furnace_draft),
            steam_pressure: numeric(&row, cols.steam_pressure),
            steam_header_temp: numeric(&row, cols.steam_header_temp),
            furnace_exit_temp_1: numeric(&row, cols.furnace_exit_temp_1),
            furnace_exit_temp_2: numeric(&row, cols.furnace_exit_temp_2),
            flue_gas_temp: numeric(&row, cols.flue_gas_temp),
            eco_inlet_water_temp: numeric(&row, cols.eco_inlet_water_temp),
            eco_outlet_water_temp: numeric(&row, cols.eco_outlet_water_temp),
            pa_damper_1: numeric(&row, cols.pa_damper_1),
            pa_damper_2: numeric(&row, cols.pa_damper_2),
            pa_damper_3: numeric(&row, cols.pa_damper_3),
            sa_damper_1: numeric(&row, cols.sa_damper_1),
            sa_damper_2: numeric(&row, cols.sa_damper_2),
            o2: numeric(&row, cols.o2),
            boiler_status: numeric(&row, cols.boiler_status),
        });
    }
    if skipped > 0 {
        warn!(skipped, "dropped parameter rows without a parseable timestamp");
    }
    let boilers: std::collections::BTreeSet<&str> =
        samples.iter().map(|s| s.boiler.as_str()).collect();
    debug!(
        rows = samples.len(),
        boilers = boilers.len(),
        "loaded parameter samples"
    );
    Ok(samples)
}
