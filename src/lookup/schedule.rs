//! Next-occurrence resolution for week-of-month-gated weekly rules.

use chrono::{Datelike, Duration, NaiveDate};

use crate::dataset::SweepingRule;

/// Days ahead to search for the next matching sweep day.
pub const DEFAULT_HORIZON_DAYS: u32 = 14;

/// A resolved upcoming sweep day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextSweep {
    pub date: NaiveDate,
    /// Calendar days between the reference date and `date` (0 = today).
    pub days_until: u32,
}

/// Find the first day in `[today, today + horizon_days)` whose weekday and
/// week-of-month occurrence match the rule.
///
/// `today` must already be a date in the operational timezone. Converting a
/// UTC instant here instead would shift the weekday near midnight, so the
/// caller owns the localization.
pub fn next_occurrence(
    rule: &SweepingRule,
    today: NaiveDate,
    horizon_days: u32,
) -> Option<NextSweep> {
    for i in 0..horizon_days {
        let candidate = today + Duration::days(i as i64);
        if candidate.weekday() == rule.weekday && rule.weeks.contains(week_of_month(candidate)) {
            return Some(NextSweep {
                date: candidate,
                days_until: i,
            });
        }
    }
    None
}

/// 1-based "which occurrence of this weekday in its month" (1..=5).
fn week_of_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;
    use crate::dataset::{BlockSide, SweepingRule, WeekMask};

    fn rule(weekday: Weekday, flags: [bool; 5]) -> SweepingRule {
        SweepingRule {
            segment_id: "101".into(),
            side: BlockSide::NorthEast,
            weekday,
            weeks: WeekMask::from_flags(flags),
            from_hour: 2,
            to_hour: 6,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_of_month_boundaries() {
        assert_eq!(week_of_month(date(2024, 3, 1)), 1);
        assert_eq!(week_of_month(date(2024, 3, 7)), 1);
        assert_eq!(week_of_month(date(2024, 3, 8)), 2);
        assert_eq!(week_of_month(date(2024, 3, 28)), 4);
        assert_eq!(week_of_month(date(2024, 3, 29)), 5);
        assert_eq!(week_of_month(date(2024, 3, 31)), 5);
    }

    #[test]
    fn first_wednesday_matches_same_day() {
        // 2024-03-06 is the first Wednesday of March.
        let r = rule(Weekday::Wed, [true, false, false, false, false]);
        let next = next_occurrence(&r, date(2024, 3, 6), DEFAULT_HORIZON_DAYS).unwrap();
        assert_eq!(next.date, date(2024, 3, 6));
        assert_eq!(next.days_until, 0);
    }

    #[test]
    fn second_wednesday_is_a_week_out() {
        let r = rule(Weekday::Wed, [false, true, false, false, false]);
        let next = next_occurrence(&r, date(2024, 3, 6), DEFAULT_HORIZON_DAYS).unwrap();
        assert_eq!(next.date, date(2024, 3, 13));
        assert_eq!(next.days_until, 7);
    }

    #[test]
    fn first_occurrence_only_never_matches_second() {
        let r = rule(Weekday::Wed, [true, false, false, false, false]);
        // Starting the day after the first Wednesday: the second Wednesday
        // (2024-03-13) falls inside the horizon but must not match; the next
        // first-Wednesday (2024-04-03) is beyond 14 days.
        assert_eq!(next_occurrence(&r, date(2024, 3, 7), DEFAULT_HORIZON_DAYS), None);
    }

    #[test]
    fn empty_mask_never_matches() {
        let r = rule(Weekday::Wed, [false; 5]);
        assert_eq!(next_occurrence(&r, date(2024, 3, 6), DEFAULT_HORIZON_DAYS), None);
    }

    #[test]
    fn crosses_month_boundary() {
        // From 2024-03-29 (Friday), the next first-Monday is 2024-04-01.
        let r = rule(Weekday::Mon, [true, false, false, false, false]);
        let next = next_occurrence(&r, date(2024, 3, 29), DEFAULT_HORIZON_DAYS).unwrap();
        assert_eq!(next.date, date(2024, 4, 1));
        assert_eq!(next.days_until, 3);
    }

    #[test]
    fn fifth_occurrence_requires_a_long_month() {
        // March 2024 has five Fridays; the fifth is 2024-03-29.
        let r = rule(Weekday::Fri, [false, false, false, false, true]);
        let next = next_occurrence(&r, date(2024, 3, 18), DEFAULT_HORIZON_DAYS).unwrap();
        assert_eq!(next.date, date(2024, 3, 29));
        assert_eq!(next.days_until, 11);

        // April 2024 has only four Fridays; nothing within the horizon.
        assert_eq!(next_occurrence(&r, date(2024, 4, 1), DEFAULT_HORIZON_DAYS), None);
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let r = rule(Weekday::Sat, [false, true, true, false, false]);
        let a = next_occurrence(&r, date(2024, 3, 6), DEFAULT_HORIZON_DAYS);
        let b = next_occurrence(&r, date(2024, 3, 6), DEFAULT_HORIZON_DAYS);
        assert_eq!(a, b);
    }

    #[test]
    fn days_until_equals_calendar_difference() {
        let r = rule(Weekday::Sun, [true, true, true, true, true]);
        for day in 1..=28 {
            let today = date(2024, 3, day);
            if let Some(next) = next_occurrence(&r, today, DEFAULT_HORIZON_DAYS) {
                assert_eq!(
                    (next.date - today).num_days(),
                    next.days_until as i64,
                    "from {}",
                    today
                );
            }
        }
    }

    #[test]
    fn horizon_is_exclusive() {
        // 2024-03-20 is the third Wednesday, 14 days after 2024-03-06; a
        // 14-day horizon searches offsets 0..=13 and must not reach it.
        let r = rule(Weekday::Wed, [false, false, true, false, false]);
        assert_eq!(next_occurrence(&r, date(2024, 3, 6), 14), None);
        let next = next_occurrence(&r, date(2024, 3, 6), 15).unwrap();
        assert_eq!(next.days_until, 14);
    }
}
