use crate::config::VariableSpec;
use crate::error::ForcingError;
use crate::period::Period;
use ndarray::{Array2, ArrayView2};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One open output stream for a (variable, period) pair.
///
/// Streams have a pre-declared time axis; writes are random-access by slot
/// index, never append-order, and re-writing a slot is allowed (the
/// partitioner's boundary fill relies on fill-then-overwrite).
pub trait ForcingStream {
    fn write_at(&mut self, field: ArrayView2<'_, f32>, slot: usize) -> Result<(), ForcingError>;
}

/// Factory for output streams. The partitioner opens a fresh set of streams
/// every time a new calendar period begins and drops the previous set;
/// streams are never reused across periods.
pub trait ForcingSink {
    fn open(
        &mut self,
        var: &VariableSpec,
        period: &Period,
        time_axis: &[f64],
    ) -> Result<Box<dyn ForcingStream>, ForcingError>;
}

/// Final contents of one in-memory stream.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedStream {
    pub time_axis: Vec<f64>,
    /// One entry per declared slot; `None` means never written.
    pub slots: Vec<Option<Array2<f32>>>,
    /// Write count per slot, fills included.
    pub write_counts: Vec<usize>,
}

/// In-memory sink capturing every write, keyed by `{output_name}_{period}`.
/// Used by the partitioner tests and as a dry-run stand-in for the file
/// writer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub captured: Arc<Mutex<HashMap<String, CapturedStream>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a captured stream, if it was opened.
    pub fn stream(&self, key: &str) -> Option<CapturedStream> {
        self.captured.lock().unwrap().get(key).cloned()
    }

    pub fn stream_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.captured.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

struct MemoryStream {
    key: String,
    captured: Arc<Mutex<HashMap<String, CapturedStream>>>,
}

impl ForcingStream for MemoryStream {
    fn write_at(&mut self, field: ArrayView2<'_, f32>, slot: usize) -> Result<(), ForcingError> {
        let mut captured = self.captured.lock().unwrap();
        let stream = captured
            .get_mut(&self.key)
            .expect("stream record created at open");
        if slot >= stream.slots.len() {
            return Err(ForcingError::Config(format!(
                "slot {} out of range for stream {} with {} slots",
                slot,
                self.key,
                stream.slots.len()
            )));
        }
        stream.slots[slot] = Some(field.to_owned());
        stream.write_counts[slot] += 1;
        Ok(())
    }
}

impl ForcingSink for MemorySink {
    fn open(
        &mut self,
        var: &VariableSpec,
        period: &Period,
        time_axis: &[f64],
    ) -> Result<Box<dyn ForcingStream>, ForcingError> {
        let key = format!("{}_{}", var.output_name, period.key.label());
        self.captured.lock().unwrap().insert(
            key.clone(),
            CapturedStream {
                time_axis: time_axis.to_vec(),
                slots: vec![None; time_axis.len()],
                write_counts: vec![0; time_axis.len()],
            },
        );
        Ok(Box::new(MemoryStream {
            key,
            captured: Arc::clone(&self.captured),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Calendar;
    use crate::config::ForcingConfig;
    use crate::period::{Advance, Chunking, PeriodTracker};
    use chrono::NaiveDate;
    use ndarray::array;

    #[test]
    fn test_memory_sink_records_overwrites() {
        let config = ForcingConfig::default();
        let var = config.variable("tmp2m").unwrap();
        let mut tracker = PeriodTracker::new(Calendar::NoLeap, Chunking::Yearly, 6);
        let t = NaiveDate::from_ymd_opt(2014, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let Advance::Opened(period) = tracker.advance(t) else {
            panic!("expected a new period");
        };

        let mut sink = MemorySink::new();
        let mut stream = sink.open(var, &period, &period.regular_axis).unwrap();
        let a = array![[1.0f32]];
        let b = array![[2.0f32]];
        stream.write_at(a.view(), 7).unwrap();
        stream.write_at(b.view(), 7).unwrap();

        let captured = sink.stream("t2_y2014").unwrap();
        assert_eq!(captured.slots[7], Some(b));
        assert_eq!(captured.write_counts[7], 2);
        assert_eq!(captured.slots[6], None);
    }

    #[test]
    fn test_out_of_range_slot_errors() {
        let config = ForcingConfig::default();
        let var = config.variable("tmp2m").unwrap();
        let mut tracker = PeriodTracker::new(Calendar::NoLeap, Chunking::Monthly, 6);
        let t = NaiveDate::from_ymd_opt(2014, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let Advance::Opened(period) = tracker.advance(t) else {
            panic!("expected a new period");
        };

        let mut sink = MemorySink::new();
        let mut stream = sink.open(var, &period, &period.regular_axis).unwrap();
        let field = array![[0.0f32]];
        assert!(stream.write_at(field.view(), 31 * 4).is_err());
    }
}
