use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;
use std::str::FromStr;

/// Epoch for the ordinal time coordinate written to every forcing file.
pub const EPOCH_YEAR: i32 = 1950;

const GREGORIAN_MONTHS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const ALL_LEAP_MONTHS: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const DAY360_MONTHS: [u32; 12] = [30; 12];

/// Calendar conventions supported by the NEMO IOIPSL time layer.
///
/// The ocean model expects its forcing time coordinate under one explicit
/// calendar regardless of the native calendar of the raw data, so all date
/// math for output axes goes through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    Gregorian,
    NoLeap,
    AllLeap,
    Day360,
    Julian,
}

impl Calendar {
    /// Days per year under this calendar.
    pub fn year_length(&self) -> f64 {
        match self {
            Calendar::Gregorian => 365.2425,
            Calendar::NoLeap => 365.0,
            Calendar::AllLeap => 366.0,
            Calendar::Day360 => 360.0,
            Calendar::Julian => 365.25,
        }
    }

    /// Fixed 12-entry month-length table. February is always 28 days except
    /// under `all_leap`; no leap correction is applied even for `gregorian`,
    /// matching the convention the ocean model uses for its forcing axis.
    pub fn month_lengths(&self) -> [u32; 12] {
        match self {
            Calendar::AllLeap => ALL_LEAP_MONTHS,
            Calendar::Day360 => DAY360_MONTHS,
            Calendar::Gregorian | Calendar::NoLeap | Calendar::Julian => GREGORIAN_MONTHS,
        }
    }

    /// Length of `month` (1..=12) in days.
    pub fn month_length(&self, month: u32) -> u32 {
        assert!((1..=12).contains(&month), "invalid month: {}", month);
        self.month_lengths()[(month - 1) as usize]
    }

    /// Real-valued day count since 1950-01-01 00:00 under this calendar:
    /// `(year - 1950) * year_length + days_in_prior_months + (day - 1) + day_fraction`.
    pub fn ordinal(&self, t: NaiveDateTime) -> f64 {
        let months = self.month_lengths();
        let mut days = f64::from(t.year() - EPOCH_YEAR) * self.year_length();
        for len in &months[..t.month0() as usize] {
            days += f64::from(*len);
        }
        days + f64::from(t.day() - 1) + f64::from(t.time().num_seconds_from_midnight()) / 86400.0
    }

    /// Ordinal values for a sequence of instants.
    pub fn ordinal_seq(&self, instants: &[NaiveDateTime]) -> Vec<f64> {
        instants.iter().map(|t| self.ordinal(*t)).collect()
    }
}

impl FromStr for Calendar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gregorian" => Ok(Calendar::Gregorian),
            "noleap" => Ok(Calendar::NoLeap),
            "all_leap" => Ok(Calendar::AllLeap),
            "360_day" => Ok(Calendar::Day360),
            "julian" => Ok(Calendar::Julian),
            other => Err(format!("unknown calendar tag: {}", other)),
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Calendar::Gregorian => "gregorian",
            Calendar::NoLeap => "noleap",
            Calendar::AllLeap => "all_leap",
            Calendar::Day360 => "360_day",
            Calendar::Julian => "julian",
        };
        write!(f, "{}", tag)
    }
}

/// Convert a raw time value from the merged source axis to a civil datetime.
///
/// The extraction upstream encodes time as a proleptic-Gregorian day ordinal
/// (day 1 = 0001-01-01) plus a fractional day, running one day ahead of the
/// standard-Gregorian dates in the source files, so one day is subtracted
/// here. Returns `None` for values outside the representable range.
pub fn raw_ordinal_to_datetime(raw: f64) -> Option<NaiveDateTime> {
    if !raw.is_finite() || raw < 1.0 {
        return None;
    }
    let whole = raw.floor();
    let frac = raw - whole;
    let date = NaiveDate::from_num_days_from_ce_opt(whole as i32 - 1)?;
    let seconds = (frac * 86400.0).round() as i64;
    Some(date.and_time(NaiveTime::MIN) + Duration::seconds(seconds))
}

/// Inverse of [`raw_ordinal_to_datetime`].
pub fn datetime_to_raw_ordinal(t: NaiveDateTime) -> f64 {
    f64::from(t.date().num_days_from_ce() + 1)
        + f64::from(t.time().num_seconds_from_midnight()) / 86400.0
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
    fn test_epoch_is_zero() {
        for cal in [
            Calendar::Gregorian,
            Calendar::NoLeap,
            Calendar::AllLeap,
            Calendar::Day360,
            Calendar::Julian,
        ] {
            assert_eq!(cal.ordinal(dt(1950, 1, 1, 0)), 0.0);
        }
    }

    #[test]
    fn test_ordinal_components() {
        let cal = Calendar::NoLeap;
        assert_eq!(cal.ordinal(dt(1951, 1, 1, 0)), 365.0);
        assert_eq!(cal.ordinal(dt(1950, 2, 1, 0)), 31.0);
        assert_eq!(cal.ordinal(dt(1950, 1, 1, 6)), 0.25);
        assert_eq!(cal.ordinal(dt(1950, 1, 2, 12)), 1.5);
    }

    #[test]
    fn test_raw_ordinal_round_trip() {
        let t = dt(2014, 4, 22, 18);
        let raw = datetime_to_raw_ordinal(t);
        assert_eq!(raw_ordinal_to_datetime(raw), Some(t));
    }

    #[test]
    fn test_raw_ordinal_rejects_garbage() {
        assert_eq!(raw_ordinal_to_datetime(f64::NAN), None);
        assert_eq!(raw_ordinal_to_datetime(-3.0), None);
    }

    #[test]
    fn test_calendar_tags_parse() {
        for tag in ["gregorian", "noleap", "all_leap", "360_day", "julian"] {
            let cal: Calendar = tag.parse().unwrap();
            assert_eq!(cal.to_string(), tag);
        }
        assert!("proleptic".parse::<Calendar>().is_err());
    }
}
