// 📅 Enrollment Calendar - which days count toward the meal plan
//
// A semester is a list of inclusive date ranges. Breaks between ranges do not
// count: day 1 is the first day of the first period, and the day after a
// break picks up where the previous period left off.

use crate::error::{TrackerError, TrackerResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentPeriod {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl EnrollmentPeriod {
    pub fn new(name: &str, start: NaiveDate, end: NaiveDate) -> Self {
        EnrollmentPeriod {
            name: name.to_string(),
            start,
            end,
        }
    }

    /// Inclusive day count
    pub fn days(&self) -> u32 {
        ((self.end - self.start).num_days() + 1).max(0) as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Sum of inclusive period lengths
pub fn total_days(periods: &[EnrollmentPeriod]) -> u32 {
    periods.iter().map(EnrollmentPeriod::days).sum()
}

/// 1-based day of the semester on `now`.
///
/// Before the first period: 0. During a break: days of all earlier periods.
/// After the last period: total days.
pub fn current_day_index(periods: &[EnrollmentPeriod], now: NaiveDate) -> u32 {
    let mut day = 0;
    for period in periods {
        if period.contains(now) {
            return day + ((now - period.start).num_days() + 1) as u32;
        }
        if now > period.end {
            day += period.days();
        }
    }
    day
}

// ============================================================================
// CALENDAR
// ============================================================================

/// Validated, ordered list of enrollment periods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<EnrollmentPeriod>", into = "Vec<EnrollmentPeriod>")]
pub struct Calendar {
    periods: Vec<EnrollmentPeriod>,
}

impl Calendar {
    /// Periods must be non-empty, each start ≤ end, ordered and non-overlapping
    pub fn new(periods: Vec<EnrollmentPeriod>) -> TrackerResult<Self> {
        if periods.is_empty() {
            return Err(TrackerError::Calendar("no enrollment periods".to_string()));
        }

        for period in &periods {
            if period.start > period.end {
                return Err(TrackerError::Calendar(format!(
                    "period '{}' ends ({}) before it starts ({})",
                    period.name, period.end, period.start
                )));
            }
        }

        for pair in periods.windows(2) {
            if pair[1].start <= pair[0].end {
                return Err(TrackerError::Calendar(format!(
                    "period '{}' overlaps or precedes '{}'",
                    pair[1].name, pair[0].name
                )));
            }
        }

        Ok(Calendar { periods })
    }

    /// Fall 2024 semester, orientation through the last day before winter break
    pub fn fall_2024() -> Self {
        // Literal dates; the calendar tests pin every one of them
        let date = |m, d| NaiveDate::from_ymd_opt(2024, m, d).expect("valid Fall 2024 date");
        Calendar {
            periods: vec![
                EnrollmentPeriod::new("Orientation to Fall Break", date(8, 25), date(10, 11)),
                EnrollmentPeriod::new("After Fall Break to Thanksgiving", date(10, 21), date(11, 26)),
                EnrollmentPeriod::new("After Thanksgiving to Winter Break", date(12, 2), date(12, 15)),
            ],
        }
    }

    pub fn periods(&self) -> &[EnrollmentPeriod] {
        &self.periods
    }

    pub fn total_days(&self) -> u32 {
        total_days(&self.periods)
    }

    pub fn current_day_index(&self, now: NaiveDate) -> u32 {
        current_day_index(&self.periods, now)
    }

    /// Days left after `now`
    pub fn remaining_days(&self, now: NaiveDate) -> u32 {
        self.total_days() - self.current_day_index(now)
    }

    pub fn period_at(&self, date: NaiveDate) -> Option<&EnrollmentPeriod> {
        self.periods.iter().find(|p| p.contains(date))
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Calendar::fall_2024()
    }
}

impl TryFrom<Vec<EnrollmentPeriod>> for Calendar {
    type Error = TrackerError;

    fn try_from(periods: Vec<EnrollmentPeriod>) -> TrackerResult<Self> {
        Calendar::new(periods)
    }
}

impl From<Calendar> for Vec<EnrollmentPeriod> {
    fn from(calendar: Calendar) -> Self {
        calendar.periods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_fall_2024_total_days() {
        let cal = Calendar::fall_2024();
        let lengths: Vec<u32> = cal.periods().iter().map(|p| p.days()).collect();

        assert_eq!(lengths, vec![48, 37, 14]);
        assert_eq!(cal.total_days(), 99);
    }

    #[test]
    fn test_fall_2024_dates_pass_validation() {
        let cal = Calendar::fall_2024();
        let bounds: Vec<(NaiveDate, NaiveDate)> = cal.periods().iter().map(|p| (p.start, p.end)).collect();

        assert_eq!(
            bounds,
            vec![
                (date(8, 25), date(10, 11)),
                (date(10, 21), date(11, 26)),
                (date(12, 2), date(12, 15)),
            ]
        );
        assert_eq!(Calendar::new(cal.periods().to_vec()).unwrap(), cal);

        println!("✅ Fall 2024 calendar literals are valid");
    }

    #[test]
    fn test_current_day_index_boundaries() {
        let cal = Calendar::fall_2024();

        assert_eq!(cal.current_day_index(date(8, 1)), 0);
        assert_eq!(cal.current_day_index(date(8, 25)), 1);
        assert_eq!(cal.current_day_index(date(9, 1)), 8);
        assert_eq!(cal.current_day_index(date(10, 11)), 48);
        assert_eq!(cal.current_day_index(date(10, 15)), 48);
        assert_eq!(cal.current_day_index(date(10, 21)), 49);
        assert_eq!(cal.current_day_index(date(12, 15)), 99);
        assert_eq!(cal.current_day_index(date(12, 20)), 99);

        println!("✅ Calendar boundary test passed");
    }

    #[test]
    fn test_remaining_days_and_period_lookup() {
        let cal = Calendar::fall_2024();

        assert_eq!(cal.remaining_days(date(9, 1)), 91);
        assert_eq!(cal.remaining_days(date(12, 20)), 0);
        assert_eq!(
            cal.period_at(date(11, 1)).map(|p| p.name.as_str()),
            Some("After Fall Break to Thanksgiving")
        );
        assert!(cal.period_at(date(11, 28)).is_none());
    }

    #[test]
    fn test_rejects_invalid_periods() {
        assert!(Calendar::new(vec![]).is_err());

        let inverted = vec![EnrollmentPeriod::new("bad", date(9, 2), date(9, 1))];
        assert!(matches!(Calendar::new(inverted), Err(TrackerError::Calendar(_))));

        let overlapping = vec![
            EnrollmentPeriod::new("a", date(9, 1), date(9, 10)),
            EnrollmentPeriod::new("b", date(9, 10), date(9, 20)),
        ];
        assert!(Calendar::new(overlapping).is_err());

        let single_day = vec![EnrollmentPeriod::new("one", date(9, 1), date(9, 1))];
        assert_eq!(Calendar::new(single_day).unwrap().total_days(), 1);
    }

    #[test]
    fn test_calendar_json_is_validated() {
        let json = r#"[
            {"name": "Spring", "start": "2025-01-13", "end": "2025-03-07"},
            {"name": "After Spring Break", "start": "2025-03-17", "end": "2025-05-02"}
        ]"#;
        let cal: Calendar = serde_json::from_str(json).unwrap();
        assert_eq!(cal.periods().len(), 2);

        let bad = r#"[{"name": "x", "start": "2025-02-01", "end": "2025-01-01"}]"#;
        assert!(serde_json::from_str::<Calendar>(bad).is_err());
    }
}
