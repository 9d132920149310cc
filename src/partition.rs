use crate::calendar::raw_ordinal_to_datetime;
use crate::config::{CadenceClass, ForcingConfig};
use crate::error::ForcingError;
use crate::period::{Advance, Period, PeriodTracker};
use crate::stream::{ForcingSink, ForcingStream};
use chrono::NaiveDateTime;
use log::{debug, info};
use ndarray::{Array3, Axis};
use std::collections::HashMap;

/// Streams for the currently open period, one per configured variable,
/// keyed by source name. Replaced wholesale when the next period opens.
struct OpenPeriod {
    period: Period,
    streams: HashMap<String, Box<dyn ForcingStream>>,
}

/// Walk the merged input time axis once and distribute every sample into
/// calendar-period output streams.
///
/// Regular-cadence variables are written sample-by-sample to the nearest
/// slot of the period's cadence-spaced axis. Daily-cadence variables are
/// averaged over each complete day of samples and written to the period's
/// daily axis. The first and last samples of the series are repeated into
/// the leading and trailing slots of their period so every declared slot
/// holds a value.
pub fn partition(
    config: &ForcingConfig,
    time_raw: &[f64],
    series: &HashMap<String, Array3<f32>>,
    sink: &mut dyn ForcingSink,
) -> Result<(), ForcingError> {
    config.validate()?;
    let instants = validate_time_axis(time_raw)?;
    validate_series(config, series, time_raw.len())?;

    let total = time_raw.len();
    if total == 0 {
        return Ok(());
    }

    let ordinals: Vec<f64> = instants.iter().map(|t| config.calendar.ordinal(*t)).collect();
    let per_day = config.samples_per_day();
    let dfd = per_day - 1;
    // Index of the step after the last complete daily cycle.
    let last_cycle_end = (total / per_day) * per_day;

    let mut tracker = PeriodTracker::new(config.calendar, config.chunking, config.cadence_hours);
    let mut open: Option<OpenPeriod> = None;
    let mut cycle = 0usize;

    for (n, instant) in instants.iter().enumerate() {
        if let Advance::Opened(period) = tracker.advance(*instant) {
            info!(
                "opening period {} ({} regular slots, {} daily slots)",
                period.key.label(),
                period.regular_axis.len(),
                period.daily_axis.len()
            );
            let mut streams = HashMap::new();
            for var in &config.variables {
                let axis = match var.cadence {
                    CadenceClass::Regular => &period.regular_axis,
                    CadenceClass::Daily => &period.daily_axis,
                };
                streams.insert(var.source_name.clone(), sink.open(var, &period, axis)?);
            }
            open = Some(OpenPeriod { period, streams });
        }
        let state = open.as_mut().expect("tracker opens a period on the first sample");

        for var in &config.variables {
            let data = &series[&var.source_name];
            let stream = state
                .streams
                .get_mut(&var.source_name)
                .expect("a stream is opened for every configured variable");

            match var.cadence {
                CadenceClass::Regular => {
                    let slot = nearest_slot(&state.period.regular_axis, ordinals[n]);
                    debug!("{}: step {} -> slot {}", var.output_name, n, slot);
                    let field = data.index_axis(Axis(0), n);
                    stream.write_at(field, slot)?;
                    if n == 0 {
                        for fill in 0..slot {
                            stream.write_at(field, fill)?;
                        }
                    }
                    if n + 1 == total {
                        for fill in slot..state.period.regular_axis.len() {
                            stream.write_at(field, fill)?;
                        }
                    }
                }
                CadenceClass::Daily => {
                    if cycle != dfd {
                        continue;
                    }
                    // A full day of samples is in hand: steps n-dfd ..= n.
                    let first = n - dfd;
                    let slot = nearest_slot(&state.period.daily_axis, ordinals[first]);
                    let mut mean = data.index_axis(Axis(0), first).to_owned();
                    for step in (first + 1)..=n {
                        mean += &data.index_axis(Axis(0), step);
                    }
                    mean /= per_day as f32;
                    debug!(
                        "{}: daily mean over steps {}..={} -> slot {}",
                        var.output_name, first, n, slot
                    );
                    stream.write_at(mean.view(), slot)?;
                    if n == dfd {
                        for fill in 0..slot {
                            stream.write_at(mean.view(), fill)?;
                        }
                    }
                    if n + 1 >= last_cycle_end {
                        for fill in slot..state.period.daily_axis.len() {
                            stream.write_at(mean.view(), fill)?;
                        }
                    }
                }
            }
        }

        cycle += 1;
        if cycle > dfd {
            cycle = 0;
        }
    }

    info!("partitioned {} input steps", total);
    Ok(())
}

/// Index of the axis value nearest to `target`. Axis values are
/// monotonically increasing; the scan is exhaustive and a strict comparison
/// resolves equal distances to the lower index.
fn nearest_slot(axis: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, value) in axis.iter().enumerate() {
        let dist = (value - target).abs();
        if dist < best_dist {
            best_dist = dist;
            best = idx;
        }
    }
    best
}

fn validate_time_axis(time_raw: &[f64]) -> Result<Vec<NaiveDateTime>, ForcingError> {
    let mut instants = Vec::with_capacity(time_raw.len());
    for (step, value) in time_raw.iter().enumerate() {
        let instant = raw_ordinal_to_datetime(*value).ok_or(ForcingError::BadTimestamp {
            step,
            value: *value,
        })?;
        if let Some(prev) = instants.last() {
            if instant < *prev {
                return Err(ForcingError::UnsortedTime(step));
            }
        }
        instants.push(instant);
    }
    Ok(instants)
}

fn validate_series(
    config: &ForcingConfig,
    series: &HashMap<String, Array3<f32>>,
    time_len: usize,
) -> Result<(), ForcingError> {
    for var in &config.variables {
        let data = series
            .get(&var.source_name)
            .ok_or_else(|| ForcingError::MissingSeries(var.source_name.clone()))?;
        if data.len_of(Axis(0)) != time_len {
            return Err(ForcingError::LengthMismatch {
                name: var.source_name.clone(),
                got: data.len_of(Axis(0)),
                expected: time_len,
            });
        }
    }
    // All variables share one spatial grid after regridding.
    let mut grid: Option<(usize, usize)> = None;
    for var in &config.variables {
        let shape = series[&var.source_name].dim();
        let spatial = (shape.1, shape.2);
        match grid {
            None => grid = Some(spatial),
            Some(expected) if expected != spatial => {
                return Err(ForcingError::ShapeMismatch {
                    name: var.source_name.clone(),
                    got: spatial,
                    expected,
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_slot_exact_and_between() {
        let axis = [0.0, 0.25, 0.5, 0.75];
        assert_eq!(nearest_slot(&axis, 0.5), 2);
        assert_eq!(nearest_slot(&axis, 0.74), 3);
        assert_eq!(nearest_slot(&axis, -5.0), 0);
        assert_eq!(nearest_slot(&axis, 9.0), 3);
    }

    #[test]
    fn test_nearest_slot_tie_takes_lower_index() {
        let axis = [0.0, 1.0];
        assert_eq!(nearest_slot(&axis, 0.5), 0);
    }

    #[test]
    fn test_unsorted_time_rejected() {
        let err = validate_time_axis(&[735000.0, 734999.5]).unwrap_err();
        assert!(matches!(err, ForcingError::UnsortedTime(1)));
    }

    #[test]
    fn test_malformed_time_rejected() {
        let err = validate_time_axis(&[735000.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, ForcingError::BadTimestamp { step: 1, .. }));
    }
}
