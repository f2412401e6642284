use serde::{Deserialize, Serialize};

use crate::accounts::model::{Account, City, Profession, Role};

fn default_role() -> Role {
    Role::Client
}

/// Request body for registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    #[serde(default = "default_role")]
    pub role: Role,
    pub profession: Option<Profession>,
    pub city: Option<City>,
    pub bio: Option<String>,
    pub experience: Option<i32>,
    pub hourly_rate: Option<f64>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: Account,
}
