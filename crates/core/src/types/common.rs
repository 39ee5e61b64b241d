//! Wall-clock timestamps for bookmarks and last-read markers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Milliseconds since the Unix epoch, shown as a UTC date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The current moment; a clock before 1970 reads as the epoch
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self(millis)
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// 1-based day of the (UTC) year, 1 January is day 1
    pub fn day_of_year(&self) -> u16 {
        const DAYS_BEFORE_MONTH: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

        let (year, month, day) = self.civil_date();
        let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
        let leap_day = u16::from(leap && month > 2);
        DAYS_BEFORE_MONTH[(month - 1) as usize] + day as u16 + leap_day
    }

    /// `(year, month, day)` in the proleptic Gregorian calendar
    fn civil_date(&self) -> (i64, u32, u32) {
        // Howard Hinnant's days-to-civil
        let days = self.0.div_euclid(MILLIS_PER_DAY) + 719_468;
        let era = days.div_euclid(146_097);
        let day_of_era = days.rem_euclid(146_097);
        let year_of_era =
            (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
        let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
        let mp = (5 * day_of_year + 2) / 153;
        let day = (day_of_year - (153 * mp + 2) / 5 + 1) as u32;
        let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
        let year = year_of_era + era * 400 + i64::from(month <= 2);
        (year, month, day)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (year, month, day) = self.civil_date();
        let minutes = self.0.rem_euclid(MILLIS_PER_DAY) / 60_000;
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02} UTC",
            year,
            month,
            day,
            minutes / 60,
            minutes % 60
        )
    }
}
