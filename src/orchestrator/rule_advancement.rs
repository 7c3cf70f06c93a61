//! Rule advancement and `last_successful_download_date` anti-creep (spec
//! §4.3 "Rule advancement" / "last_successful_download_date").

use chrono::NaiveDate;

use crate::billing::{self, PeriodType};

#[derive(Debug, Clone, Copy)]
pub struct AdvancedSchedule {
    pub next_run_at: NaiveDate,
    pub range_start_at: NaiveDate,
    pub range_end_at: NaiveDate,
}

/// Advances a rule exactly once from the job's own `next_run_at` (not
/// today), preserving window offsets with a sanity clamp.
pub fn advance_rule(
    period_type: PeriodType,
    job_next_run_at: NaiveDate,
    current_range_start_at: NaiveDate,
    current_range_end_at: NaiveDate,
    window_days_before: Option<i32>,
    window_days_after: Option<i32>,
) -> AdvancedSchedule {
    let anchor_day = billing::anchor_day_of_month(job_next_run_at);
    let new_next_run = billing::step(period_type, job_next_run_at, anchor_day);

    let raw_wb = (job_next_run_at - current_range_start_at).num_days();
    let raw_wa = (current_range_end_at - job_next_run_at).num_days();

    let (default_wb, default_wa) = period_type.default_window();
    let wb = sanitize_window(raw_wb, window_days_before, default_wb);
    let wa = sanitize_window(raw_wa, window_days_after, default_wa);

    let (range_start_at, range_end_at) = billing::window(new_next_run, wb, wa);

    AdvancedSchedule {
        next_run_at: new_next_run,
        range_start_at,
        range_end_at,
    }
}

fn sanitize_window(raw: i64, stored_fallback: Option<i32>, period_default: i32) -> i32 {
    if raw < 0 || raw > 365 {
        stored_fallback.unwrap_or(period_default)
    } else {
        raw as i32
    }
}

/// `last_successful_download_date` anti-creep: a baseline on first
/// completion, then clamped so a late vendor delivery can never push the
/// tracked date later than the expected cadence step would allow.
pub fn next_last_successful_download_date(
    prior_value: Option<NaiveDate>,
    job_date: NaiveDate,
    period_type: PeriodType,
    prior_anchor: NaiveDate,
) -> NaiveDate {
    match prior_value {
        None => job_date,
        Some(_prior) => {
            let anchor_day = billing::anchor_day_of_month(prior_anchor);
            let expected = billing::step(period_type, prior_anchor, anchor_day);
            if job_date <= expected {
                job_date
            } else {
                expected
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn advances_by_one_period_from_job_anchor_not_today() {
        let schedule = advance_rule(
            PeriodType::Monthly,
            d(2024, 1, 15),
            d(2024, 1, 10),
            d(2024, 1, 20),
            None,
            None,
        );
        assert_eq!(schedule.next_run_at, d(2024, 2, 15));
        assert_eq!(schedule.range_start_at, d(2024, 2, 10));
        assert_eq!(schedule.range_end_at, d(2024, 2, 20));
    }

    #[test]
    fn falls_back_to_period_default_window_when_offsets_are_invalid() {
        let schedule = advance_rule(
            PeriodType::Monthly,
            d(2024, 1, 15),
            d(2024, 1, 20), // range_start after next_run_at => negative wb
            d(2024, 1, 20),
            None,
            None,
        );
        let (default_wb, default_wa) = PeriodType::Monthly.default_window();
        assert_eq!(schedule.range_start_at, schedule.next_run_at - chrono::Duration::days(default_wb as i64));
        assert_eq!(schedule.range_end_at, schedule.next_run_at + chrono::Duration::days(default_wa as i64));
    }

    #[test]
    fn anti_creep_uses_job_date_as_baseline_when_no_prior_value() {
        let result = next_last_successful_download_date(None, d(2024, 3, 1), PeriodType::Monthly, d(2024, 2, 1));
        assert_eq!(result, d(2024, 3, 1));
    }

    #[test]
    fn anti_creep_clamps_late_delivery_to_expected_date() {
        let prior_anchor = d(2024, 1, 15);
        let expected = billing::step(PeriodType::Monthly, prior_anchor, 15);
        let late_job_date = expected + chrono::Duration::days(10);
        let result = next_last_successful_download_date(
            Some(d(2024, 1, 15)),
            late_job_date,
            PeriodType::Monthly,
            prior_anchor,
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn anti_creep_allows_earlier_delivery() {
        let prior_anchor = d(2024, 1, 15);
        let expected = billing::step(PeriodType::Monthly, prior_anchor, 15);
        let early_job_date = expected - chrono::Duration::days(3);
        let result = next_last_successful_download_date(
            Some(d(2024, 1, 15)),
            early_job_date,
            PeriodType::Monthly,
            prior_anchor,
        );
        assert_eq!(result, early_job_date);
    }
}
