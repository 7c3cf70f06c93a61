//! Billing-period calculator (C1).
//!
//! Pure calendar arithmetic: no I/O, no mutable state. Classifies an
//! account's billing cadence from its invoice history, anchors dates to
//! avoid short-month drift, and computes next-run windows and status
//! buckets. Grounded on the pure-function style of the teacher's
//! `compute_due_times`/`compute_jitter_seconds` in `scheduler.rs`, adapted
//! from tick-interval arithmetic to calendar-month arithmetic.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::models::account::BillingStatus;

/// Safety cap on the next-run catch-up loop (spec §4.1).
const MAX_STEP_ITERATIONS: u32 = 120;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodType {
    BiWeekly,
    Monthly,
    BiMonthly,
    Quarterly,
    SemiAnnually,
    Annually,
}

impl PeriodType {
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodType::BiWeekly => "Bi-Weekly",
            PeriodType::Monthly => "Monthly",
            PeriodType::BiMonthly => "Bi-Monthly",
            PeriodType::Quarterly => "Quarterly",
            PeriodType::SemiAnnually => "Semi-Annually",
            PeriodType::Annually => "Annually",
        }
    }

    pub fn period_days(self) -> i32 {
        match self {
            PeriodType::BiWeekly => 14,
            PeriodType::Monthly => 30,
            PeriodType::BiMonthly => 60,
            PeriodType::Quarterly => 90,
            PeriodType::SemiAnnually => 180,
            PeriodType::Annually => 365,
        }
    }

    /// Default `(window_before, window_after)` in days.
    pub fn default_window(self) -> (i32, i32) {
        match self {
            PeriodType::BiWeekly => (3, 3),
            PeriodType::Monthly => (5, 5),
            PeriodType::BiMonthly => (7, 7),
            PeriodType::Quarterly => (10, 10),
            PeriodType::SemiAnnually => (14, 14),
            PeriodType::Annually => (21, 21),
        }
    }

    /// Parses the persisted string form back into a `PeriodType`.
    pub fn parse(s: &str) -> Option<PeriodType> {
        match s {
            "Bi-Weekly" => Some(PeriodType::BiWeekly),
            "Monthly" => Some(PeriodType::Monthly),
            "Bi-Monthly" => Some(PeriodType::BiMonthly),
            "Quarterly" => Some(PeriodType::Quarterly),
            "Semi-Annually" => Some(PeriodType::SemiAnnually),
            "Annually" => Some(PeriodType::Annually),
            _ => None,
        }
    }
}

impl std::fmt::Display for PeriodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Median of consecutive ordered deltas, excluding zero/negative deltas.
/// Defaults to 30 when fewer than two invoices (or no positive deltas)
/// are present.
pub fn median_inter_invoice_days(ordered_invoice_dates: &[NaiveDate]) -> f64 {
    if ordered_invoice_dates.len() < 2 {
        return 30.0;
    }
    let mut deltas: Vec<i64> = ordered_invoice_dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .filter(|d| *d > 0)
        .collect();
    if deltas.is_empty() {
        return 30.0;
    }
    deltas.sort_unstable();
    let mid = deltas.len() / 2;
    if deltas.len() % 2 == 0 {
        (deltas[mid - 1] + deltas[mid]) as f64 / 2.0
    } else {
        deltas[mid] as f64
    }
}

/// Classifies cadence from median inter-invoice days per spec §4.1's table.
pub fn classify_cadence(median_days: f64) -> PeriodType {
    match median_days {
        d if d >= 7.0 && d <= 21.0 => PeriodType::BiWeekly,
        d if d > 21.0 && d <= 45.0 => PeriodType::Monthly,
        d if d > 45.0 && d <= 75.0 => PeriodType::BiMonthly,
        d if d > 75.0 && d <= 135.0 => PeriodType::Quarterly,
        d if d > 135.0 && d <= 270.0 => PeriodType::SemiAnnually,
        d if d > 270.0 => PeriodType::Annually,
        _ => PeriodType::Monthly,
    }
}

/// `anchor = min(day_of_month(d), 28)`, clamped to avoid short-month drift.
pub fn anchor_day_of_month(d: NaiveDate) -> u32 {
    d.day().min(28)
}

/// Advance `d` by one cadence step, landing on `anchor_day` for
/// month-based cadences (clamped again if the target month is shorter).
/// Bi-Weekly steps by a flat 14 days and ignores the anchor.
pub fn step(period_type: PeriodType, d: NaiveDate, anchor_day: u32) -> NaiveDate {
    match period_type {
        PeriodType::BiWeekly => d.checked_add_days(Days::new(14)).expect("date overflow"),
        PeriodType::Monthly => step_months(d, 1, anchor_day),
        PeriodType::BiMonthly => step_months(d, 2, anchor_day),
        PeriodType::Quarterly => step_months(d, 3, anchor_day),
        PeriodType::SemiAnnually => step_months(d, 6, anchor_day),
        PeriodType::Annually => step_months(d, 12, anchor_day),
    }
}

fn step_months(d: NaiveDate, months: u32, anchor_day: u32) -> NaiveDate {
    let stepped = d
        .checked_add_months(Months::new(months))
        .expect("date overflow");
    let days_in_month = days_in_month(stepped.year(), stepped.month());
    let day = anchor_day.min(days_in_month);
    NaiveDate::from_ymd_opt(stepped.year(), stepped.month(), day).expect("valid clamped date")
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid date");
    let this_month_first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid date");
    (next_month_first - this_month_first).num_days() as u32
}

/// Inverse of `step`: step backwards by one cadence period, for the
/// round-trip property (spec §8 property 6).
pub fn step_back(period_type: PeriodType, d: NaiveDate, anchor_day: u32) -> NaiveDate {
    match period_type {
        PeriodType::BiWeekly => d.checked_sub_days(Days::new(14)).expect("date underflow"),
        PeriodType::Monthly => step_months_back(d, 1, anchor_day),
        PeriodType::BiMonthly => step_months_back(d, 2, anchor_day),
        PeriodType::Quarterly => step_months_back(d, 3, anchor_day),
        PeriodType::SemiAnnually => step_months_back(d, 6, anchor_day),
        PeriodType::Annually => step_months_back(d, 12, anchor_day),
    }
}

fn step_months_back(d: NaiveDate, months: u32, anchor_day: u32) -> NaiveDate {
    let stepped = d
        .checked_sub_months(Months::new(months))
        .expect("date underflow");
    let days_in_month = days_in_month(stepped.year(), stepped.month());
    let day = anchor_day.min(days_in_month);
    NaiveDate::from_ymd_opt(stepped.year(), stepped.month(), day).expect("valid clamped date")
}

/// `expected_next = step(last_invoice, period_type, anchor)`, repeatedly
/// stepped forward until `>= today` (spec §4.1 "Next-run from last
/// invoice"). Capped at `MAX_STEP_ITERATIONS` as a safety valve.
pub fn next_run_from_last_invoice(
    last_invoice: NaiveDate,
    period_type: PeriodType,
    anchor_day: u32,
    today: NaiveDate,
) -> NaiveDate {
    let mut candidate = step(period_type, last_invoice, anchor_day);
    let mut iterations = 0;
    while candidate < today && iterations < MAX_STEP_ITERATIONS {
        candidate = step(period_type, candidate, anchor_day);
        iterations += 1;
    }
    candidate
}

/// `range_start = next_run - window_before`, `range_end = next_run + window_after`.
pub fn window(next_run: NaiveDate, window_before: i32, window_after: i32) -> (NaiveDate, NaiveDate) {
    let start = next_run - chrono::Duration::days(window_before as i64);
    let end = next_run + chrono::Duration::days(window_after as i64);
    (start, end)
}

/// Derives `historical_billing_status` from `days_until_expected = expected_next - today`
/// per spec §4.1's threshold table.
pub fn historical_billing_status(
    days_until_expected: i64,
    period_days: i32,
    window_before: i32,
) -> BillingStatus {
    if days_until_expected < -(period_days as i64 * 2) {
        BillingStatus::Missing
    } else if days_until_expected < -(window_before as i64) {
        BillingStatus::Overdue
    } else if days_until_expected < 0 {
        BillingStatus::DueNow
    } else if days_until_expected <= window_before as i64 {
        BillingStatus::DueSoon
    } else if days_until_expected <= 30 {
        BillingStatus::Upcoming
    } else {
        BillingStatus::Future
    }
}

/// Derives `next_run_status`: mirrors `historical_billing_status` when that
/// is `Missing`; otherwise applies the same threshold table against
/// `days_until_next_run`, with `DueNow` renamed to `RunNow` per spec §4.1.
pub fn next_run_status(
    historical: BillingStatus,
    days_until_next_run: i64,
    period_days: i32,
    window_before: i32,
) -> BillingStatus {
    if historical == BillingStatus::Missing {
        return BillingStatus::Missing;
    }
    match historical_billing_status(days_until_next_run, period_days, window_before) {
        BillingStatus::Overdue | BillingStatus::DueNow => BillingStatus::RunNow,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn classifies_uniform_thirty_day_deltas_as_monthly() {
        let dates = vec![d(2024, 1, 1), d(2024, 1, 31), d(2024, 3, 1), d(2024, 3, 31)];
        let median = median_inter_invoice_days(&dates);
        assert_eq!(median, 30.0);
        let period = classify_cadence(median);
        assert_eq!(period, PeriodType::Monthly);
        assert_eq!(period.period_days(), 30);
        assert_eq!(period.default_window(), (5, 5));
    }

    #[test]
    fn defaults_to_monthly_with_fewer_than_two_invoices() {
        assert_eq!(median_inter_invoice_days(&[]), 30.0);
        assert_eq!(median_inter_invoice_days(&[d(2024, 1, 1)]), 30.0);
    }

    #[test]
    fn jan_31_anchors_to_feb_28_and_never_drifts_back() {
        let last_invoice = d(2024, 1, 31);
        let anchor = anchor_day_of_month(last_invoice);
        assert_eq!(anchor, 28);
        let feb = step(PeriodType::Monthly, last_invoice, anchor);
        assert_eq!(feb, d(2024, 2, 28));
        let mar = step(PeriodType::Monthly, feb, anchor);
        assert_eq!(mar, d(2024, 3, 28));
    }

    #[test]
    fn leap_year_feb_29_used_when_available() {
        let anchor = 28;
        // 2024 is a leap year; Feb has 29 days but anchor stays clamped at 28.
        let stepped = step(PeriodType::Monthly, d(2024, 1, 28), anchor);
        assert_eq!(stepped, d(2024, 2, 28));
    }

    #[test]
    fn next_run_catches_up_past_today() {
        let last_invoice = d(2023, 1, 15);
        let anchor = anchor_day_of_month(last_invoice);
        let today = d(2024, 1, 1);
        let next = next_run_from_last_invoice(last_invoice, PeriodType::Monthly, anchor, today);
        assert!(next >= today);
        assert_eq!(next.day(), 15);
    }

    #[test]
    fn step_and_step_back_round_trip_within_a_day_for_month_based_cadence() {
        let start = d(2024, 1, 15);
        let anchor = anchor_day_of_month(start);
        let mut forward = start;
        for _ in 0..6 {
            forward = step(PeriodType::Monthly, forward, anchor);
        }
        let mut back = forward;
        for _ in 0..6 {
            back = step_back(PeriodType::Monthly, back, anchor);
        }
        assert!((back - start).num_days().abs() <= 1);
    }

    #[test]
    fn step_and_step_back_round_trip_exact_for_biweekly() {
        let start = d(2024, 1, 15);
        let forward = step(PeriodType::BiWeekly, start, 0);
        let back = step_back(PeriodType::BiWeekly, forward, 0);
        assert_eq!(back, start);
    }

    #[test]
    fn window_computation_is_symmetric_offsets() {
        let (start, end) = window(d(2024, 2, 15), 5, 5);
        assert_eq!(start, d(2024, 2, 10));
        assert_eq!(end, d(2024, 2, 20));
    }

    #[test]
    fn status_thresholds_match_table() {
        let period_days = 30;
        let window_before = 5;
        assert_eq!(
            historical_billing_status(-61, period_days, window_before),
            BillingStatus::Missing
        );
        assert_eq!(
            historical_billing_status(-10, period_days, window_before),
            BillingStatus::Overdue
        );
        assert_eq!(
            historical_billing_status(-1, period_days, window_before),
            BillingStatus::DueNow
        );
        assert_eq!(
            historical_billing_status(3, period_days, window_before),
            BillingStatus::DueSoon
        );
        assert_eq!(
            historical_billing_status(20, period_days, window_before),
            BillingStatus::Upcoming
        );
        assert_eq!(
            historical_billing_status(45, period_days, window_before),
            BillingStatus::Future
        );
    }

    #[test]
    fn next_run_status_mirrors_missing_historical() {
        let status = next_run_status(BillingStatus::Missing, 100, 30, 5);
        assert_eq!(status, BillingStatus::Missing);
    }
}
