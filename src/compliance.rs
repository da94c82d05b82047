//! Monthly attendance compliance.
//!
//! A month is compliant when the share of working days spent in the office
//! reaches [`MONTHLY_COMPLIANCE_THRESHOLD`]. The `exception_approved` and
//! `weekly_compliance` flags come from people, not from arithmetic: they are
//! stored as given and only combined here to pick a display status.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::monthly_attendance::MonthlyAttendance;

/// Minimum office attendance, in percent, for a compliant month.
pub const MONTHLY_COMPLIANCE_THRESHOLD: f64 = 40.0;

/// `present / working * 100`, rounded to two decimals.
///
/// Returns `None` for a month without working days.
pub fn attendance_percentage(working_days: u32, present_in_office: u32) -> Option<f64> {
    if working_days == 0 {
        return None;
    }

    let raw = f64::from(present_in_office) / f64::from(working_days) * 100.0;
    Some((raw * 100.0).round() / 100.0)
}

pub fn is_monthly_compliant(percentage: Option<f64>) -> Option<bool> {
    percentage.map(|p| p >= MONTHLY_COMPLIANCE_THRESHOLD)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    /// Approved exception, wins over every other signal.
    Exception,
    /// No working days recorded, so there is no percentage.
    NotAvailable,
    NonCompliant,
    Compliant,
    /// Monthly threshold met but the week-level check was explicitly failed.
    WeeklyNonCompliant,
}

impl ComplianceStatus {
    pub fn label(self) -> &'static str {
        match self {
            ComplianceStatus::Exception => "exception",
            ComplianceStatus::NotAvailable => "not_available",
            ComplianceStatus::NonCompliant => "non_compliant",
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::WeeklyNonCompliant => "weekly_non_compliant",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            ComplianceStatus::Exception => "amber",
            ComplianceStatus::NotAvailable => "gray",
            ComplianceStatus::NonCompliant => "red",
            ComplianceStatus::Compliant => "green",
            ComplianceStatus::WeeklyNonCompliant => "blue",
        }
    }
}

pub fn classify(
    percentage: Option<f64>,
    exception_approved: Option<bool>,
    weekly_compliance: Option<bool>,
) -> ComplianceStatus {
    if exception_approved == Some(true) {
        return ComplianceStatus::Exception;
    }

    match percentage {
        None => ComplianceStatus::NotAvailable,
        Some(p) if p < MONTHLY_COMPLIANCE_THRESHOLD => ComplianceStatus::NonCompliant,
        Some(_) if weekly_compliance != Some(false) => ComplianceStatus::Compliant,
        Some(_) => ComplianceStatus::WeeklyNonCompliant,
    }
}

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct ComplianceSummary {
    pub months: usize,
    pub compliant: usize,
    pub weekly_non_compliant: usize,
    pub non_compliant: usize,
    pub exception: usize,
    pub not_available: usize,
    /// Mean of the months that have a percentage
    #[schema(nullable = true)]
    pub average_percentage: Option<f64>,
}

pub fn summarize<'a, I>(rows: I) -> ComplianceSummary
where
    I: IntoIterator<Item = &'a MonthlyAttendance>,
{
    let mut summary = ComplianceSummary::default();
    let mut total = 0.0;
    let mut counted = 0usize;

    for row in rows {
        summary.months += 1;
        match row.status() {
            ComplianceStatus::Exception => summary.exception += 1,
            ComplianceStatus::NotAvailable => summary.not_available += 1,
            ComplianceStatus::NonCompliant => summary.non_compliant += 1,
            ComplianceStatus::Compliant => summary.compliant += 1,
            ComplianceStatus::WeeklyNonCompliant => summary.weekly_non_compliant += 1,
        }
        if let Some(p) = row.attendance_percentage {
            total += p;
            counted += 1;
        }
    }

    if counted > 0 {
        summary.average_percentage = Some((total / counted as f64 * 100.0).round() / 100.0);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(month: u8, working: u32, present: u32, exception: Option<bool>) -> MonthlyAttendance {
        MonthlyAttendance {
            id: u64::from(month),
            user_id: 1,
            month,
            year: 2026,
            working_days: working,
            present_in_office: present,
            leaves_availed: 0,
            leave_notifications_in_teams_channel: 0,
            exception_approved: exception,
            weekly_compliance: None,
            attendance_percentage: attendance_percentage(working, present),
        }
    }

    #[test]
    fn half_the_month_in_office_is_compliant() {
        let pct = attendance_percentage(20, 10);
        assert_eq!(pct, Some(50.0));
        assert_eq!(is_monthly_compliant(pct), Some(true));
        assert_eq!(classify(pct, None, None), ComplianceStatus::Compliant);
    }

    #[test]
    fn quarter_of_the_month_is_not_compliant() {
        let pct = attendance_percentage(20, 5);
        assert_eq!(pct, Some(25.0));
        assert_eq!(is_monthly_compliant(pct), Some(false));
        assert_eq!(classify(pct, None, None), ComplianceStatus::NonCompliant);
    }

    #[test]
    fn threshold_is_inclusive() {
        let pct = attendance_percentage(10, 4);
        assert_eq!(pct, Some(40.0));
        assert_eq!(is_monthly_compliant(pct), Some(true));
    }

    #[test]
    fn zero_working_days_has_no_percentage() {
        assert_eq!(attendance_percentage(0, 0), None);
        assert_eq!(attendance_percentage(0, 3), None);
        assert_eq!(is_monthly_compliant(None), None);
        assert_eq!(classify(None, None, Some(true)), ComplianceStatus::NotAvailable);
    }

    #[test]
    fn percentage_is_rounded_to_two_decimals() {
        assert_eq!(attendance_percentage(3, 1), Some(33.33));
        assert_eq!(attendance_percentage(3, 2), Some(66.67));
    }

    #[test]
    fn rounding_never_crosses_the_threshold_within_a_month() {
        for working in 1..=31u32 {
            for present in 0..=working {
                let exact = present * 5 >= working * 2;
                assert_eq!(
                    is_monthly_compliant(attendance_percentage(working, present)),
                    Some(exact),
                    "{present}/{working}"
                );
            }
        }
    }

    #[test]
    fn approved_exception_overrides_everything() {
        for pct in [None, Some(0.0), Some(25.0), Some(90.0)] {
            for weekly in [None, Some(true), Some(false)] {
                assert_eq!(
                    classify(pct, Some(true), weekly),
                    ComplianceStatus::Exception
                );
            }
        }
    }

    #[test]
    fn rejected_or_unset_exception_falls_through() {
        assert_eq!(
            classify(Some(10.0), Some(false), None),
            ComplianceStatus::NonCompliant
        );
        assert_eq!(classify(Some(10.0), None, None), ComplianceStatus::NonCompliant);
    }

    #[test]
    fn weekly_flag_only_demotes_when_explicitly_false() {
        assert_eq!(classify(Some(60.0), None, None).color(), "green");
        assert_eq!(classify(Some(60.0), None, Some(true)).color(), "green");
        assert_eq!(classify(Some(60.0), None, Some(false)).color(), "blue");
        assert_eq!(
            classify(Some(30.0), None, Some(false)),
            ComplianceStatus::NonCompliant
        );
    }

    #[test]
    fn status_serializes_as_its_label() {
        for status in [
            ComplianceStatus::Exception,
            ComplianceStatus::NotAvailable,
            ComplianceStatus::NonCompliant,
            ComplianceStatus::Compliant,
            ComplianceStatus::WeeklyNonCompliant,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.label()));
        }
    }

    #[test]
    fn summary_counts_statuses_and_averages_known_months() {
        let rows = vec![
            row(1, 20, 10, None),       // 50%, compliant
            row(2, 20, 5, None),        // 25%, non compliant
            row(3, 20, 2, Some(true)),  // 10%, exception
            row(4, 0, 0, None),         // n/a
        ];

        let summary = summarize(&rows);

        assert_eq!(summary.months, 4);
        assert_eq!(summary.compliant, 1);
        assert_eq!(summary.non_compliant, 1);
        assert_eq!(summary.exception, 1);
        assert_eq!(summary.not_available, 1);
        assert_eq!(summary.weekly_non_compliant, 0);
        assert_eq!(summary.average_percentage, Some(28.33));
    }

    #[test]
    fn empty_summary_has_no_average() {
        let summary = summarize(&Vec::<MonthlyAttendance>::new());
        assert_eq!(summary, ComplianceSummary::default());
    }
}
