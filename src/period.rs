use crate::calendar::Calendar;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::str::FromStr;

/// How many calendar periods go into one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunking {
    Yearly,
    Monthly,
}

impl FromStr for Chunking {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yearly" => Ok(Chunking::Yearly),
            "monthly" => Ok(Chunking::Monthly),
            other => Err(format!("unknown chunking mode: {}", other)),
        }
    }
}

impl fmt::Display for Chunking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunking::Yearly => write!(f, "yearly"),
            Chunking::Monthly => write!(f, "monthly"),
        }
    }
}

/// Identity of one output period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    pub year: i32,
    /// `None` under yearly chunking.
    pub month: Option<u32>,
}

impl PeriodKey {
    /// File-name fragment: `y2014` or `y2014_M03`.
    pub fn label(&self) -> String {
        match self.month {
            Some(m) => format!("y{}_M{:02}", self.year, m),
            None => format!("y{}", self.year),
        }
    }
}

/// One open output period with its two derived time axes.
///
/// The regular axis carries `(length_days * 24) / cadence_hours` instants at
/// input cadence; the daily axis carries `length_days` instants one day
/// apart. Both hold calendar-model ordinal values.
#[derive(Debug, Clone)]
pub struct Period {
    pub key: PeriodKey,
    pub start: NaiveDateTime,
    pub length_days: f64,
    pub regular_axis: Vec<f64>,
    pub daily_axis: Vec<f64>,
}

/// Result of feeding one timestamp to the tracker.
#[derive(Debug, Clone)]
pub enum Advance {
    /// The timestamp crossed into a new period; streams for the previous
    /// period (if any) are to be replaced.
    Opened(Period),
    Same,
}

/// Detects period boundaries over a single pass of monotonically increasing
/// timestamps and builds each new period's output axes.
#[derive(Debug)]
pub struct PeriodTracker {
    calendar: Calendar,
    chunking: Chunking,
    cadence_hours: u32,
    current: Option<PeriodKey>,
}

impl PeriodTracker {
    pub fn new(calendar: Calendar, chunking: Chunking, cadence_hours: u32) -> Self {
        Self {
            calendar,
            chunking,
            cadence_hours,
            current: None,
        }
    }

    /// Feed the next timestamp. On the first call, or whenever the period
    /// key (year, or year+month) changes, returns the newly opened period.
    pub fn advance(&mut self, t: NaiveDateTime) -> Advance {
        let key = match self.chunking {
            Chunking::Yearly => PeriodKey {
                year: t.year(),
                month: None,
            },
            Chunking::Monthly => PeriodKey {
                year: t.year(),
                month: Some(t.month()),
            },
        };
        if self.current == Some(key) {
            return Advance::Same;
        }
        self.current = Some(key);
        Advance::Opened(self.build_period(key))
    }

    fn build_period(&self, key: PeriodKey) -> Period {
        let start = NaiveDate::from_ymd_opt(key.year, key.month.unwrap_or(1), 1)
            .expect("period start is a valid calendar date")
            .and_time(NaiveTime::MIN);
        let length_days = match key.month {
            Some(m) => f64::from(self.calendar.month_length(m)),
            None => self.calendar.year_length(),
        };

        // Instants are stepped in real datetime arithmetic from the period
        // start; only the ordinal conversion applies the model calendar.
        let n_regular = (length_days * 24.0 / f64::from(self.cadence_hours)) as usize;
        let regular_axis = (0..n_regular)
            .map(|i| {
                self.calendar
                    .ordinal(start + Duration::hours(i as i64 * i64::from(self.cadence_hours)))
            })
            .collect();

        let n_daily = length_days as usize;
        let daily_axis = (0..n_daily)
            .map(|i| self.calendar.ordinal(start + Duration::days(i as i64)))
            .collect();

        Period {
            key,
            start,
            length_days,
            regular_axis,
            daily_axis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_first_advance_opens() {
        let mut tracker = PeriodTracker::new(Calendar::NoLeap, Chunking::Yearly, 6);
        match tracker.advance(dt(2014, 3, 5, 12)) {
            Advance::Opened(p) => {
                assert_eq!(p.key.year, 2014);
                assert_eq!(p.key.month, None);
                assert_eq!(p.start, dt(2014, 1, 1, 0));
            }
            Advance::Same => panic!("first advance must open a period"),
        }
        assert!(matches!(tracker.advance(dt(2014, 3, 5, 18)), Advance::Same));
    }

    #[test]
    fn test_yearly_axis_lengths() {
        let mut tracker = PeriodTracker::new(Calendar::NoLeap, Chunking::Yearly, 6);
        let Advance::Opened(p) = tracker.advance(dt(2014, 1, 1, 0)) else {
            panic!("expected a new period");
        };
        assert_eq!(p.regular_axis.len(), 1460);
        assert_eq!(p.daily_axis.len(), 365);
        // 6-hour spacing in days
        assert!((p.regular_axis[1] - p.regular_axis[0] - 0.25).abs() < 1e-9);
        assert!((p.daily_axis[1] - p.daily_axis[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_boundary() {
        let mut tracker = PeriodTracker::new(Calendar::NoLeap, Chunking::Monthly, 6);
        let Advance::Opened(jan) = tracker.advance(dt(2014, 1, 31, 18)) else {
            panic!("expected january");
        };
        assert_eq!(jan.key.label(), "y2014_M01");
        assert_eq!(jan.regular_axis.len(), 31 * 4);
        assert_eq!(jan.daily_axis.len(), 31);

        let Advance::Opened(feb) = tracker.advance(dt(2014, 2, 1, 0)) else {
            panic!("february must open a new period");
        };
        assert_eq!(feb.key.label(), "y2014_M02");
        assert_eq!(feb.daily_axis.len(), 28);
    }

    #[test]
    fn test_day360_monthly_axis() {
        let mut tracker = PeriodTracker::new(Calendar::Day360, Chunking::Monthly, 12);
        let Advance::Opened(p) = tracker.advance(dt(2000, 2, 1, 0)) else {
            panic!("expected a new period");
        };
        assert_eq!(p.regular_axis.len(), 30 * 2);
        assert_eq!(p.daily_axis.len(), 30);
    }
}
