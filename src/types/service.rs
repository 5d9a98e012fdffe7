//! Workshop service types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Service entity - a bookable workshop operation (oil change, brake
/// inspection, …). Reference data, looked up by name by the reconciliation
/// pipeline and never created by it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub help: String,
    pub commentary: String,
    /// Duration in minutes
    pub duration: i32,
    /// Price in whole euros
    pub price: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response for list of services
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListResponse {
    pub items: Vec<Service>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_serialize() {
        let service = Service {
            id: Uuid::nil(),
            name: "Oil change".to_string(),
            category: "maintenance".to_string(),
            help: "Engine oil and filter replacement.".to_string(),
            commentary: "".to_string(),
            duration: 45,
            price: 89,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&service).unwrap();
        assert!(json.contains("\"name\":\"Oil change\""));
        assert!(json.contains("\"duration\":45"));
    }
}
