use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    /// Parses the value stored in `users.role`, ignoring case and padding.
    pub fn from_db(value: &str) -> Option<Self> {
        value.trim().to_ascii_uppercase().parse().ok()
    }
}
