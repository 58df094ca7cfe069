// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_ADMIN: &str = "admin";

/// Represents the 'users' table in the database.
/// Credentials are owned by the external auth service and never stored here.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    pub full_name: String,

    /// User role: 'student' or 'admin'.
    pub role: String,
}
