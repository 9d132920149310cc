use crate::config::ForcingConfig;
use crate::error::ForcingError;
use log::info;
use ndarray::Array3;
use std::collections::HashMap;
use std::path::Path;

/// Pre-merged, pre-regridded input dataset: one time axis, one spatial grid,
/// one `[time, lat, lon]` series per configured source variable. Regridding
/// and raw-product merging happen upstream; this reader only consumes the
/// merged container.
#[derive(Debug)]
pub struct ForcingInput {
    pub time: Vec<f64>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub series: HashMap<String, Array3<f32>>,
}

/// Load the merged input dataset from a netCDF file. Only the variables
/// named in the configuration are read.
pub fn read_forcing_input(
    path: impl AsRef<Path>,
    config: &ForcingConfig,
) -> Result<ForcingInput, ForcingError> {
    let file = netcdf::open(path.as_ref())?;

    let time = read_axis(&file, "time")?;
    let lat = read_axis(&file, "lat")?;
    let lon = read_axis(&file, "lon")?;

    let mut series = HashMap::new();
    for spec in &config.variables {
        let var = file
            .variable(&spec.source_name)
            .ok_or_else(|| ForcingError::MissingVariable(spec.source_name.clone()))?;

        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        if shape.len() != 3 {
            return Err(ForcingError::Conversion(format!(
                "{} is not a [time, lat, lon] variable",
                spec.source_name
            )));
        }

        let raw: Vec<f32> = var.get_values(..)?;
        let array = Array3::from_shape_vec((shape[0], shape[1], shape[2]), raw)
            .map_err(|_| ForcingError::Conversion(spec.source_name.clone()))?;
        info!(
            "read {} [{} x {} x {}]",
            spec.source_name, shape[0], shape[1], shape[2]
        );
        series.insert(spec.source_name.clone(), array);
    }

    Ok(ForcingInput {
        time,
        lat,
        lon,
        series,
    })
}

fn read_axis(file: &netcdf::File, name: &str) -> Result<Vec<f64>, ForcingError> {
    let var = file
        .variable(name)
        .ok_or_else(|| ForcingError::MissingVariable(name.to_string()))?;
    Ok(var.get_values(..)?)
}
