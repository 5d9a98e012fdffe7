//! Client types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Client entity - the person appointments and vehicles belong to.
/// A client owns zero-or-more vehicles and appointments and is owned by
/// at most one user account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub civil_title: String,
    pub last_name: String,
    pub first_name: String,
    pub address: String,
    pub zip_code: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
