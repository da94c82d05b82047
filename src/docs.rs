use crate::api::attendance::{
    AttendanceListResponse, AttendanceView, TeamAttendanceResponse, TeamQuery, UpsertAttendance,
    YearQuery,
};
use crate::compliance::{ComplianceStatus, ComplianceSummary};
use crate::model::{monthly_attendance::MonthlyAttendance, role::Role, user::User};
use crate::models::{LoginReqDto, LoginResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Performance360 API",
        version = "1.0.0",
        description = r#"
## Performance360

Core service of the **Performance360** performance-management system.

### 🔹 Key Features
- **Reporting-line access control**
  - Managers see their direct and indirect reports, admins see everyone,
    employees see themselves
- **Monthly attendance compliance**
  - Attendance percentage per month against a 40% office-presence threshold
  - Exception approvals and weekly compliance flags
  - Yearly and team summaries

### 🔐 Security
Every `/api` endpoint requires a **JWT Bearer** token obtained from `/auth/login`.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::user::get_me,
        crate::api::user::get_user,
        crate::api::user::list_direct_reports,

        crate::api::attendance::upsert_attendance,
        crate::api::attendance::list_user_attendance,
        crate::api::attendance::get_month_attendance,
        crate::api::attendance::team_attendance
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            Role,
            User,
            MonthlyAttendance,
            ComplianceStatus,
            ComplianceSummary,
            UpsertAttendance,
            AttendanceView,
            AttendanceListResponse,
            TeamAttendanceResponse,
            YearQuery,
            TeamQuery
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Authentication"),
        (name = "User", description = "Users and reporting lines"),
        (name = "Attendance", description = "Monthly attendance compliance"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
