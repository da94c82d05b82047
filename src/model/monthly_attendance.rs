use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::compliance::{self, ComplianceStatus};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 12,
        "user_id": 7,
        "month": 3,
        "year": 2026,
        "working_days": 20,
        "present_in_office": 10,
        "leaves_availed": 2,
        "leave_notifications_in_teams_channel": 2,
        "exception_approved": null,
        "weekly_compliance": true,
        "attendance_percentage": 50.0
    })
)]
pub struct MonthlyAttendance {
    pub id: u64,
    pub user_id: u64,

    #[schema(example = 3, minimum = 1, maximum = 12)]
    pub month: u8,

    #[schema(example = 2026)]
    pub year: u16,

    pub working_days: u32,
    pub present_in_office: u32,
    pub leaves_availed: u32,
    pub leave_notifications_in_teams_channel: u32,

    /// `null` when nobody has decided on an exception yet
    #[schema(nullable = true)]
    pub exception_approved: Option<bool>,

    #[schema(nullable = true)]
    pub weekly_compliance: Option<bool>,

    /// `null` when the month had no working days
    #[schema(nullable = true)]
    pub attendance_percentage: Option<f64>,
}

impl MonthlyAttendance {
    pub fn status(&self) -> ComplianceStatus {
        compliance::classify(
            self.attendance_percentage,
            self.exception_approved,
            self.weekly_compliance,
        )
    }

    pub fn monthly_compliant(&self) -> Option<bool> {
        compliance::is_monthly_compliant(self.attendance_percentage)
    }
}
