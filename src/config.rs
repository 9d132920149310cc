use crate::calendar::Calendar;
use crate::error::ForcingError;
use crate::period::Chunking;
use std::collections::HashSet;
use std::path::PathBuf;

/// Sampling class of a forcing variable.
///
/// Regular variables land on the period's cadence-spaced axis; daily
/// variables are averaged over each calendar day and land on the one-point-
/// per-day axis. The class is declared per variable here so the partitioner
/// never special-cases a variable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadenceClass {
    Regular,
    Daily,
}

/// One variable to emit: source name in the merged input dataset, short name
/// used in output files, and the netCDF attributes attached to it.
#[derive(Debug, Clone)]
pub struct VariableSpec {
    pub source_name: String,
    pub output_name: String,
    pub units: String,
    pub long_name: String,
    pub cadence: CadenceClass,
}

impl VariableSpec {
    fn new(
        source_name: &str,
        output_name: &str,
        units: &str,
        long_name: &str,
        cadence: CadenceClass,
    ) -> Self {
        Self {
            source_name: source_name.to_string(),
            output_name: output_name.to_string(),
            units: units.to_string(),
            long_name: long_name.to_string(),
            cadence,
        }
    }
}

/// Run configuration for the forcing generator.
#[derive(Debug, Clone)]
pub struct ForcingConfig {
    pub variables: Vec<VariableSpec>,
    /// Hour spacing of the merged input samples; must divide 24.
    pub cadence_hours: u32,
    pub chunking: Chunking,
    pub calendar: Calendar,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub dataset_tag: String,
    pub fill_value: f32,
}

impl Default for ForcingConfig {
    fn default() -> Self {
        use CadenceClass::{Daily, Regular};
        Self {
            variables: vec![
                VariableSpec::new("ugrd10m", "u10", "m/s", "10 metre U wind component", Regular),
                VariableSpec::new("vgrd10m", "v10", "m/s", "10 metre V wind component", Regular),
                VariableSpec::new("tcdcclm", "tcc", "%", "Total cloud cover", Regular),
                VariableSpec::new("tmp2m", "t2", "K", "2 metre temperature", Regular),
                VariableSpec::new("spfh2m", "q2", "kg/kg", "2 metre specific humidity", Regular),
                VariableSpec::new(
                    "dlwrfsfc",
                    "radlw",
                    "W/m2",
                    "Surface downward longwave radiation",
                    Regular,
                ),
                VariableSpec::new(
                    "dswrfsfc",
                    "radsw",
                    "W/m2",
                    "Surface downward shortwave radiation",
                    Daily,
                ),
                VariableSpec::new("pratesfc", "precip", "kg/m2/s", "Precipitation rate", Regular),
                VariableSpec::new("snodsfc", "snow", "m", "Snow depth", Regular),
            ],
            cadence_hours: 6,
            chunking: Chunking::Yearly,
            calendar: Calendar::NoLeap,
            output_dir: PathBuf::from("."),
            file_prefix: String::from("drowned_"),
            dataset_tag: String::from("GFS"),
            fill_value: 9.999e20,
        }
    }
}

impl ForcingConfig {
    /// Validate the configuration before any pass begins. The daily-average
    /// cycle only aligns when the cadence divides 24 exactly, so that is a
    /// hard error here rather than silent drift later.
    pub fn validate(&self) -> Result<(), ForcingError> {
        if self.variables.is_empty() {
            return Err(ForcingError::Config("no variables configured".to_string()));
        }
        if self.cadence_hours == 0 || self.cadence_hours > 24 {
            return Err(ForcingError::Config(format!(
                "cadence must be between 1 and 24 hours, got {}",
                self.cadence_hours
            )));
        }
        if 24 % self.cadence_hours != 0 {
            return Err(ForcingError::Config(format!(
                "cadence of {} hours does not divide 24; daily averaging would drift",
                self.cadence_hours
            )));
        }
        let mut sources = HashSet::new();
        let mut outputs = HashSet::new();
        for var in &self.variables {
            if !sources.insert(var.source_name.as_str()) {
                return Err(ForcingError::Config(format!(
                    "duplicate source variable: {}",
                    var.source_name
                )));
            }
            if !outputs.insert(var.output_name.as_str()) {
                return Err(ForcingError::Config(format!(
                    "duplicate output variable: {}",
                    var.output_name
                )));
            }
        }
        Ok(())
    }

    /// Number of input samples per calendar day.
    pub fn samples_per_day(&self) -> usize {
        (24 / self.cadence_hours) as usize
    }

    /// Look up a variable by its source name.
    pub fn variable(&self, source_name: &str) -> Option<&VariableSpec> {
        self.variables
            .iter()
            .find(|v| v.source_name == source_name)
    }
}
