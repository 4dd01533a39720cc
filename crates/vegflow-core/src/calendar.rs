//! Year range validation and monthly partitioning of acquisition periods.

use crate::error::{Result, VegflowError};
use crate::models::MonthlyRange;
use chrono::{Datelike, Local, NaiveDate};

/// First full year of Landsat 8 operational imagery
pub const LANDSAT8_FIRST_YEAR: i32 = 2013;

/// Accepted span of acquisition years, both ends included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearPolicy {
    pub earliest: i32,
    pub latest: i32,
}

impl YearPolicy {
    pub fn new(earliest: i32, latest: i32) -> Self {
        Self { earliest, latest }
    }

    /// Policy as of `today`: `earliest` through the last fully elapsed year
    pub fn as_of(earliest: i32, today: NaiveDate) -> Self {
        Self::new(earliest, today.year() - 1)
    }

    /// Landsat 8 policy as of the local date
    pub fn current() -> Self {
        Self::as_of(LANDSAT8_FIRST_YEAR, Local::now().date_naive())
    }
}

impl Default for YearPolicy {
    fn default() -> Self {
        Self::current()
    }
}

/// Validate `start_year..=end_year` against `policy`
pub fn check_year_range(start_year: i32, end_year: i32, policy: &YearPolicy) -> Result<()> {
    let invalid = |reason: String| VegflowError::InvalidRange { start_year, end_year, reason };

    if start_year > end_year {
        return Err(invalid("start year is after end year".to_string()));
    }
    if !(policy.earliest..=policy.latest).contains(&start_year) {
        return Err(invalid(format!(
            "start year must be between {} and {}",
            policy.earliest, policy.latest
        )));
    }
    if !(start_year..=policy.latest).contains(&end_year) {
        return Err(invalid(format!(
            "end year must be between {} and {}",
            start_year, policy.latest
        )));
    }
    Ok(())
}

/// First and last day of a month
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

/// One inclusive [`MonthlyRange`] per month of `start_year..=end_year`, in
/// chronological order.
pub fn monthly_ranges(
    start_year: i32,
    end_year: i32,
    policy: &YearPolicy,
) -> Result<Vec<MonthlyRange>> {
    check_year_range(start_year, end_year, policy)?;

    let mut ranges = Vec::with_capacity(((end_year - start_year + 1) * 12) as usize);
    for year in start_year..=end_year {
        for month in 1..=12 {
            let (start, end) =
                month_bounds(year, month).ok_or_else(|| VegflowError::InvalidRange {
                    start_year,
                    end_year,
                    reason: format!("{}-{:02} is not a representable date", year, month),
                })?;
            ranges.push(MonthlyRange { start, end, label: format!("{}-{:02}", year, month) });
        }
    }

    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> YearPolicy {
        YearPolicy::new(LANDSAT8_FIRST_YEAR, 2025)
    }

    #[test]
    fn test_leap_year_february() {
        let ranges = monthly_ranges(2020, 2020, &policy()).unwrap();
        assert_eq!(ranges.len(), 12);

        let feb = &ranges[1];
        assert_eq!(feb.label, "2020-02");
        assert_eq!(feb.start, NaiveDate::from_ymd_opt(2020, 2, 1).unwrap());
        assert_eq!(feb.end, NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
        assert_eq!(feb.days(), 29);
    }

    #[test]
    fn test_common_year_february() {
        let ranges = monthly_ranges(2021, 2021, &policy()).unwrap();
        assert_eq!(ranges[1].days(), 28);
        assert_eq!(ranges[1].end, NaiveDate::from_ymd_opt(2021, 2, 28).unwrap());
    }

    #[test]
    fn test_multi_year_is_chronological() {
        let ranges = monthly_ranges(2019, 2021, &policy()).unwrap();
        assert_eq!(ranges.len(), 36);
        assert_eq!(ranges.first().unwrap().label, "2019-01");
        assert_eq!(ranges.last().unwrap().label, "2021-12");
        assert_eq!(ranges[12].label, "2020-01");
        assert!(ranges.windows(2).all(|w| w[0].end < w[1].start));
        assert_eq!(ranges[11].end, NaiveDate::from_ymd_opt(2019, 12, 31).unwrap());
    }

    #[test]
    fn test_inverted_range() {
        let err = monthly_ranges(2025, 2020, &policy()).unwrap_err();
        assert!(matches!(err, VegflowError::InvalidRange { start_year: 2025, end_year: 2020, .. }));
    }

    #[test]
    fn test_out_of_policy_years() {
        assert!(check_year_range(2012, 2014, &policy()).is_err());
        assert!(check_year_range(2020, 2026, &policy()).is_err());
        assert!(check_year_range(2013, 2025, &policy()).is_ok());
    }

    #[test]
    fn test_policy_as_of_excludes_current_year() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let policy = YearPolicy::as_of(LANDSAT8_FIRST_YEAR, today);
        assert_eq!(policy.latest, 2025);
        assert!(check_year_range(2026, 2026, &policy).is_err());
    }

    #[test]
    fn test_file_names() {
        let ranges = monthly_ranges(2023, 2023, &policy()).unwrap();
        assert_eq!(ranges[8].file_name(), "2023-09.tif");
    }
}
