pub mod calendar;
pub mod config;
pub mod data_io;
pub mod error;
pub mod partition;
pub mod period;
pub mod stream;

pub use calendar::Calendar;
pub use config::{CadenceClass, ForcingConfig, VariableSpec};
pub use error::ForcingError;
pub use period::{Chunking, Period, PeriodTracker};
