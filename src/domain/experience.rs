//! Calendar-aware experience duration shown next to every record.

use std::fmt::{Display, Formatter};

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

/// Whole years and remaining months between two dates.
///
/// Only calendar months count: days within the month are ignored, so
/// 2020-06-01..2020-06-30 is no experience at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Experience {
    pub years: i32,
    pub months: i32,
}

impl Experience {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        let mut years = end.year() - start.year();
        let mut months = end.month() as i32 - start.month() as i32;

        if months < 0 {
            years -= 1;
            months += 12;
        }

        Self { years, months }
    }

    pub fn is_empty(&self) -> bool {
        self.years <= 0 && self.months <= 0
    }
}

fn unit(count: i32, singular: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {singular}s")
    }
}

impl Display for Experience {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::with_capacity(2);
        if self.years > 0 {
            parts.push(unit(self.years, "Year"));
        }
        if self.months > 0 {
            parts.push(unit(self.months, "Month"));
        }

        if parts.is_empty() {
            f.write_str("No Experience")
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}

impl Serialize for Experience {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn render(start: NaiveDate, end: NaiveDate) -> String {
        Experience::between(start, end).to_string()
    }

    #[test]
    fn years_and_months_are_rendered_together() {
        assert_eq!(
            render(date(2020, 1, 15), date(2022, 3, 15)),
            "2 Years 2 Months"
        );
    }

    #[test]
    fn identical_dates_have_no_experience() {
        assert_eq!(render(date(2020, 1, 15), date(2020, 1, 15)), "No Experience");
    }

    #[test]
    fn days_within_the_same_month_do_not_count() {
        assert_eq!(render(date(2020, 6, 1), date(2020, 6, 15)), "No Experience");
    }

    #[test]
    fn earlier_end_month_borrows_a_year() {
        let experience = Experience::between(date(2019, 11, 3), date(2021, 2, 1));

        assert_eq!(experience, Experience { years: 1, months: 3 });
        assert_eq!(experience.to_string(), "1 Year 3 Months");
    }

    #[test]
    fn singular_units_are_not_pluralised() {
        assert_eq!(render(date(2020, 1, 1), date(2020, 2, 1)), "1 Month");
        assert_eq!(render(date(2020, 1, 1), date(2021, 1, 1)), "1 Year");
        assert_eq!(render(date(2020, 1, 1), date(2022, 2, 1)), "2 Years 1 Month");
    }

    #[test]
    fn ordered_ranges_never_produce_negative_parts() {
        let start = date(2015, 7, 20);
        let mut end = start;
        for _ in 0..200 {
            let experience = Experience::between(start, end);
            assert!(experience.years >= 0, "{start} -> {end}");
            assert!((0..=11).contains(&experience.months), "{start} -> {end}");
            end = end + chrono::Days::new(17);
        }
    }

    #[test]
    fn serializes_as_display_string() {
        let value = serde_json::to_value(Experience { years: 0, months: 5 })
            .expect("serializable");

        assert_eq!(value, serde_json::json!("5 Months"));
    }
}
