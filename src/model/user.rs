use serde::Serialize;
use utoipa::ToSchema;

use crate::model::role::Role;

/// Primary key of the `users` table.
pub type UserId = u64;

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub manager_id: Option<u64>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "email": "jane.doe@company.com",
        "name": "Jane Doe",
        "role": "MANAGER",
        "manager_id": 1,
        "is_active": true
    })
)]
pub struct User {
    #[schema(example = 7)]
    pub id: UserId,

    #[schema(example = "jane.doe@company.com")]
    pub email: String,

    #[schema(example = "Jane Doe")]
    pub name: String,

    pub role: Role,

    #[schema(example = 1, nullable = true)]
    pub manager_id: Option<UserId>,

    #[schema(example = true)]
    pub is_active: bool,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_db(&row.role)
            .ok_or_else(|| format!("user {} has unknown role {:?}", row.id, row.role))?;

        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            role,
            manager_id: row.manager_id,
            is_active: row.is_active,
        })
    }
}
