//! User account types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User entity - an authenticated account, optionally linked to a client record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: Vec<String>,
    pub client_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, safe to return over the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub client_id: Option<Uuid>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            roles: user.roles,
            client_id: user.client_id,
        }
    }
}

/// Response to register/login: token plus the public user view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserPublic,
}

/// Registration request: account credentials, the client record, and
/// optionally the client's first vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub civil_title: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub phone: String,
    pub vehicle: Option<RegisterVehicle>,
}

/// Vehicle details supplied at registration time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVehicle {
    pub brand: String,
    pub model: String,
    pub registration: String,
    #[serde(default)]
    pub vin: String,
    pub circulation_date: Option<NaiveDate>,
    #[serde(default)]
    pub mileage: i32,
    /// True when somebody other than the client drives the vehicle
    #[serde(default)]
    pub driver: bool,
    pub driver_last_name: Option<String>,
    pub driver_first_name: Option<String>,
    pub driver_phone: Option<String>,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::nil(),
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            roles: vec!["ROLE_USER".to_string()],
            client_id: Some(Uuid::nil()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_serialize_hides_password_hash() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"email\":\"jane@example.com\""));
    }

    #[test]
    fn test_user_public_keeps_roles_and_client() {
        let public = UserPublic::from(sample_user());
        assert_eq!(public.roles, vec!["ROLE_USER".to_string()]);
        assert!(public.client_id.is_some());
    }
}
