use crate::{
    access::{MySqlDirectory, collect_reports, ensure_access},
    auth::auth::AuthUser,
    compliance::{self, ComplianceStatus, ComplianceSummary},
    error::{ApiError, ApiResult},
    model::{monthly_attendance::MonthlyAttendance, role::Role, user::UserId},
};
use actix_web::{HttpResponse, web};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

/// A calendar month never has more working days than this.
const MAX_WORKING_DAYS: u32 = 31;

const ATTENDANCE_COLUMNS: &str = "id, user_id, month, year, working_days, present_in_office, \
     leaves_availed, leave_notifications_in_teams_channel, exception_approved, \
     weekly_compliance, attendance_percentage";

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertAttendance {
    #[schema(example = 7)]
    pub user_id: UserId,
    #[schema(example = 3, minimum = 1, maximum = 12)]
    pub month: u8,
    #[schema(example = 2026)]
    pub year: u16,
    #[schema(example = 20)]
    pub working_days: u32,
    #[schema(example = 10)]
    pub present_in_office: u32,
    #[serde(default)]
    #[schema(example = 2)]
    pub leaves_availed: u32,
    #[serde(default)]
    #[schema(example = 2)]
    pub leave_notifications_in_teams_channel: u32,
    #[serde(default)]
    #[schema(nullable = true)]
    pub exception_approved: Option<bool>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub weekly_compliance: Option<bool>,
}

impl UpsertAttendance {
    fn validate(&self) -> ApiResult<()> {
        if !(1..=12).contains(&self.month) {
            return Err(ApiError::bad_request("month must be between 1 and 12"));
        }
        if self.working_days > MAX_WORKING_DAYS {
            return Err(ApiError::bad_request(format!(
                "working_days cannot exceed {MAX_WORKING_DAYS}"
            )));
        }
        if self.present_in_office > self.working_days {
            return Err(ApiError::bad_request(
                "present_in_office cannot exceed working_days",
            ));
        }
        Ok(())
    }
}

/// A stored month together with its derived compliance.
#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceView {
    #[serde(flatten)]
    pub record: MonthlyAttendance,
    #[schema(nullable = true)]
    pub monthly_compliant: Option<bool>,
    pub status: ComplianceStatus,
    #[schema(example = "green", value_type = String)]
    pub color: &'static str,
}

impl From<MonthlyAttendance> for AttendanceView {
    fn from(record: MonthlyAttendance) -> Self {
        let status = record.status();
        AttendanceView {
            monthly_compliant: record.monthly_compliant(),
            status,
            color: status.color(),
            record,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceListResponse {
    #[schema(example = 7)]
    pub user_id: UserId,
    #[schema(example = 2026)]
    pub year: u16,
    pub data: Vec<AttendanceView>,
    pub summary: ComplianceSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeamAttendanceResponse {
    #[schema(example = 3)]
    pub month: u8,
    #[schema(example = 2026)]
    pub year: u16,
    pub data: Vec<AttendanceView>,
    pub summary: ComplianceSummary,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct YearQuery {
    /// Calendar year, defaults to the current one
    #[schema(example = 2026)]
    pub year: Option<u16>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TeamQuery {
    #[schema(example = 3)]
    pub month: u8,
    #[schema(example = 2026)]
    pub year: u16,
}

fn current_year() -> u16 {
    u16::try_from(Utc::now().year()).unwrap_or(u16::MAX)
}

async fn fetch_month(
    pool: &MySqlPool,
    user_id: UserId,
    year: u16,
    month: u8,
) -> ApiResult<Option<MonthlyAttendance>> {
    let record = sqlx::query_as::<_, MonthlyAttendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM monthly_attendance \
         WHERE user_id = ? AND year = ? AND month = ?"
    ))
    .bind(user_id)
    .bind(year)
    .bind(month)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Create or replace a user's attendance for one month
#[utoipa::path(
    put,
    path = "/api/attendance",
    request_body = UpsertAttendance,
    responses(
        (status = 200, description = "Attendance saved", body = AttendanceView),
        (status = 400, description = "Invalid month or day counts"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a manager/admin of this user, or a manager writing their own month"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(pool, auth, payload), fields(user_id = auth.user_id, target = payload.user_id))]
pub async fn upsert_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpsertAttendance>,
) -> ApiResult<HttpResponse> {
    auth.require_manager_or_admin()?;
    // Own months, and with them exception approval, are left to an admin
    if payload.user_id == auth.user_id {
        auth.require_admin()?;
    }
    payload.validate()?;
    ensure_access(&MySqlDirectory::new(pool.get_ref()), &auth, payload.user_id).await?;

    let percentage =
        compliance::attendance_percentage(payload.working_days, payload.present_in_office);
    debug!(?percentage, "Computed attendance percentage");

    let result = sqlx::query(
        r#"
        INSERT INTO monthly_attendance
            (user_id, month, year, working_days, present_in_office, leaves_availed,
             leave_notifications_in_teams_channel, exception_approved, weekly_compliance,
             attendance_percentage)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            working_days = VALUES(working_days),
            present_in_office = VALUES(present_in_office),
            leaves_availed = VALUES(leaves_availed),
            leave_notifications_in_teams_channel = VALUES(leave_notifications_in_teams_channel),
            exception_approved = VALUES(exception_approved),
            weekly_compliance = VALUES(weekly_compliance),
            attendance_percentage = VALUES(attendance_percentage)
        "#,
    )
    .bind(payload.user_id)
    .bind(payload.month)
    .bind(payload.year)
    .bind(payload.working_days)
    .bind(payload.present_in_office)
    .bind(payload.leaves_availed)
    .bind(payload.leave_notifications_in_teams_channel)
    .bind(payload.exception_approved)
    .bind(payload.weekly_compliance)
    .bind(percentage)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        // Foreign key violation: the target user does not exist
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return Err(ApiError::not_found("User"));
            }
        }
        return Err(e.into());
    }

    let record = fetch_month(pool.get_ref(), payload.user_id, payload.year, payload.month)
        .await?
        .ok_or_else(|| ApiError::internal("Attendance row missing right after upsert"))?;

    info!(status = record.status().label(), "Attendance saved");

    Ok(HttpResponse::Ok().json(AttendanceView::from(record)))
}

/// A user's attendance for a year, with a compliance summary
#[utoipa::path(
    get,
    path = "/api/attendance/{user_id}",
    params(
        ("user_id", Path, description = "User ID"),
        YearQuery
    ),
    responses(
        (status = 200, description = "Monthly attendance", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not in the caller's reporting line"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(pool, auth), fields(user_id = auth.user_id))]
pub async fn list_user_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<UserId>,
    query: web::Query<YearQuery>,
) -> ApiResult<HttpResponse> {
    let target_id = path.into_inner();
    ensure_access(&MySqlDirectory::new(pool.get_ref()), &auth, target_id).await?;

    let year = query.year.unwrap_or_else(current_year);

    let records = sqlx::query_as::<_, MonthlyAttendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM monthly_attendance \
         WHERE user_id = ? AND year = ? ORDER BY month"
    ))
    .bind(target_id)
    .bind(year)
    .fetch_all(pool.get_ref())
    .await?;

    let summary = compliance::summarize(&records);

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        user_id: target_id,
        year,
        data: records.into_iter().map(AttendanceView::from).collect(),
        summary,
    }))
}

/// A single month of a user's attendance
#[utoipa::path(
    get,
    path = "/api/attendance/{user_id}/{year}/{month}",
    params(
        ("user_id", Path, description = "User ID"),
        ("year", Path, description = "Calendar year"),
        ("month", Path, description = "Month, 1-12")
    ),
    responses(
        (status = 200, description = "Attendance for the month", body = AttendanceView),
        (status = 403, description = "Not in the caller's reporting line"),
        (status = 404, description = "No record for that month")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(pool, auth), fields(user_id = auth.user_id))]
pub async fn get_month_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(UserId, u16, u8)>,
) -> ApiResult<HttpResponse> {
    let (target_id, year, month) = path.into_inner();
    ensure_access(&MySqlDirectory::new(pool.get_ref()), &auth, target_id).await?;

    let record = fetch_month(pool.get_ref(), target_id, year, month)
        .await?
        .ok_or_else(|| ApiError::not_found("Attendance record"))?;

    Ok(HttpResponse::Ok().json(AttendanceView::from(record)))
}

/// Attendance for everybody the caller manages, directly or not
#[utoipa::path(
    get,
    path = "/api/attendance/team",
    params(TeamQuery),
    responses(
        (status = 200, description = "Team attendance for the month", body = TeamAttendanceResponse),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Manager/Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(pool, auth), fields(user_id = auth.user_id))]
pub async fn team_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TeamQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_manager_or_admin()?;

    if !(1..=12).contains(&query.month) {
        return Err(ApiError::bad_request("month must be between 1 and 12"));
    }

    let records = match auth.role {
        Role::Admin => {
            sqlx::query_as::<_, MonthlyAttendance>(&format!(
                "SELECT {ATTENDANCE_COLUMNS} FROM monthly_attendance \
                 WHERE year = ? AND month = ? ORDER BY user_id"
            ))
            .bind(query.year)
            .bind(query.month)
            .fetch_all(pool.get_ref())
            .await?
        }
        _ => {
            let members = collect_reports(&MySqlDirectory::new(pool.get_ref()), auth.user_id).await?;
            debug!(team_size = members.len(), "Resolved team");

            if members.is_empty() {
                Vec::new()
            } else {
                let placeholders = vec!["?"; members.len()].join(", ");
                let sql = format!(
                    "SELECT {ATTENDANCE_COLUMNS} FROM monthly_attendance \
                     WHERE year = ? AND month = ? AND user_id IN ({placeholders}) \
                     ORDER BY user_id"
                );

                let mut team_query = sqlx::query_as::<_, MonthlyAttendance>(&sql)
                    .bind(query.year)
                    .bind(query.month);
                for member in &members {
                    team_query = team_query.bind(*member);
                }

                team_query.fetch_all(pool.get_ref()).await?
            }
        }
    };

    let summary = compliance::summarize(&records);

    Ok(HttpResponse::Ok().json(TeamAttendanceResponse {
        month: query.month,
        year: query.year,
        data: records.into_iter().map(AttendanceView::from).collect(),
        summary,
    }))
}
