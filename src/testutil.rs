//! Shared builders for module tests.

use chrono::{NaiveDate, NaiveDateTime};

use crate::align;
use crate::models::{FuelRecord, ParameterSample};

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

pub fn fuel(d: u32, steam: f64, fuel: f64) -> FuelRecord {
    FuelRecord::new(day(d), steam, fuel)
}

/// A sample with every sensor blank; tests set the fields they care about.
pub fn sample(timestamp: NaiveDateTime) -> ParameterSample {
    ParameterSample {
        timestamp,
        date: align::sample_date(timestamp),
        boiler: "Boiler-1".to_string(),
        sox: None,
        nox: None,
        spm: None,
        boiler_steam_total: None,
        deaerator_steam_total: None,
        boiler_steam_flow: None,
        deaerator_steam_flow: None,
        deaerator_tank_level: None,
        boiler_water_level: None,
        id_fan_speed: None,
        furnace_draft: None,
        steam_pressure: None,
        steam_header_temp: None,
        furnace_exit_temp_1: None,
        furnace_exit_temp_2: None,
        flue_gas_temp: None,
        eco_inlet_water_temp: None,
        eco_outlet_water_temp: None,
        pa_damper_1: None,
        pa_damper_2: None,
        pa_damper_3: None,
        sa_damper_1: None,
        sa_damper_2: None,
        o2: None,
        boiler_status: None,
    }
}

/// A sample at noon on the given day with the cleaning-relevant sensors set.
pub fn sensor_sample(
    d: u32,
    flue_gas_temp: Option<f64>,
    o2: Option<f64>,
    nox: Option<f64>,
) -> ParameterSample {
    let mut s = sample(day(d).and_hms_opt(12, 0, 0).unwrap());
    s.flue_gas_temp = flue_gas_temp;
    s.o2 = o2;
    s.nox = nox;
    s
}
