use crate::calendar::Calendar;
use crate::config::{ForcingConfig, VariableSpec};
use crate::error::ForcingError;
use crate::period::Period;
use crate::stream::{ForcingSink, ForcingStream};
use log::info;
use ndarray::ArrayView2;
use std::path::PathBuf;

/// netCDF-backed sink: one file per (variable, period), named
/// `{prefix}{short_name}_{tag}_{period}.nc`, with an unlimited time
/// dimension and fixed lat/lon dimensions. The period's ordinal time axis
/// is written when the file is created; data slabs are written one slot at
/// a time, in whatever order the partitioner visits them.
pub struct ForcingFileWriter {
    output_dir: PathBuf,
    file_prefix: String,
    dataset_tag: String,
    calendar: Calendar,
    fill_value: f32,
    lat: Vec<f64>,
    lon: Vec<f64>,
}

impl ForcingFileWriter {
    pub fn new(config: &ForcingConfig, lat: Vec<f64>, lon: Vec<f64>) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            file_prefix: config.file_prefix.clone(),
            dataset_tag: config.dataset_tag.clone(),
            calendar: config.calendar,
            fill_value: config.fill_value,
            lat,
            lon,
        }
    }

    fn file_path(&self, var: &VariableSpec, period: &Period) -> PathBuf {
        self.output_dir.join(format!(
            "{}{}_{}_{}.nc",
            self.file_prefix,
            var.output_name,
            self.dataset_tag,
            period.key.label()
        ))
    }
}

impl ForcingSink for ForcingFileWriter {
    fn open(
        &mut self,
        var: &VariableSpec,
        period: &Period,
        time_axis: &[f64],
    ) -> Result<Box<dyn ForcingStream>, ForcingError> {
        let path = self.file_path(var, period);
        info!("creating {}", path.display());
        let mut file = netcdf::create(&path)?;

        file.add_unlimited_dimension("time")?;
        file.add_dimension("lat", self.lat.len())?;
        file.add_dimension("lon", self.lon.len())?;

        {
            let mut time_var = file.add_variable::<f64>("time", &["time"])?;
            time_var.put_attribute("units", "days since 1950-01-01 00:00:00")?;
            time_var.put_attribute("time_origin", "1950-01-01 00:00:00")?;
            time_var.put_attribute("calendar", self.calendar.to_string())?;
        }
        {
            let mut lat_var = file.add_variable::<f64>("lat", &["lat"])?;
            lat_var.put_attribute("units", "degree_north")?;
        }
        {
            let mut lon_var = file.add_variable::<f64>("lon", &["lon"])?;
            lon_var.put_attribute("units", "degree_east")?;
        }
        {
            let mut data_var =
                file.add_variable::<f32>(&var.output_name, &["time", "lat", "lon"])?;
            data_var.put_attribute("units", var.units.as_str())?;
            data_var.put_attribute("long_name", var.long_name.as_str())?;
            data_var.put_attribute("_FillValue", self.fill_value)?;
        }

        file.variable_mut("time")
            .ok_or_else(|| ForcingError::MissingVariable("time".to_string()))?
            .put_values(time_axis, ..)?;
        file.variable_mut("lat")
            .ok_or_else(|| ForcingError::MissingVariable("lat".to_string()))?
            .put_values(&self.lat, ..)?;
        file.variable_mut("lon")
            .ok_or_else(|| ForcingError::MissingVariable("lon".to_string()))?
            .put_values(&self.lon, ..)?;

        Ok(Box::new(ForcingFileStream {
            file,
            var_name: var.output_name.clone(),
            n_lat: self.lat.len(),
            n_lon: self.lon.len(),
            n_slots: time_axis.len(),
        }))
    }
}

/// Open file handle for one (variable, period) output. Dropped when the
/// partitioner moves to the next period, which flushes and closes the file.
struct ForcingFileStream {
    file: netcdf::FileMut,
    var_name: String,
    n_lat: usize,
    n_lon: usize,
    n_slots: usize,
}

impl ForcingStream for ForcingFileStream {
    fn write_at(&mut self, field: ArrayView2<'_, f32>, slot: usize) -> Result<(), ForcingError> {
        if field.dim() != (self.n_lat, self.n_lon) {
            return Err(ForcingError::ShapeMismatch {
                name: self.var_name.clone(),
                got: field.dim(),
                expected: (self.n_lat, self.n_lon),
            });
        }
        if slot >= self.n_slots {
            return Err(ForcingError::Config(format!(
                "slot {} out of range for {} with {} slots",
                slot, self.var_name, self.n_slots
            )));
        }

        let mut var = self
            .file
            .variable_mut(&self.var_name)
            .ok_or_else(|| ForcingError::MissingVariable(self.var_name.clone()))?;
        // View may be non-contiguous; copy into row-major order for the
        // hyperslab write.
        let slab: Vec<f32> = field.iter().copied().collect();
        var.put_values(&slab, (slot..slot + 1, .., ..))?;
        Ok(())
    }
}
