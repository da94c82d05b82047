pub mod monthly_attendance;
pub mod role;
pub mod user;
