//! Dealership types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Dealership entity - reference data, looked up by name by the
/// reconciliation pipeline and never created by it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Dealership {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub address: String,
    pub zip_code: String,
    pub longitude: Decimal,
    pub latitude: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response for list of dealerships
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealershipListResponse {
    pub items: Vec<Dealership>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_dealership_serialize_keeps_coordinate_precision() {
        let dealership = Dealership {
            id: Uuid::nil(),
            name: "Atelio Paris Nord".to_string(),
            city: "Paris".to_string(),
            address: "12 rue de la Chapelle".to_string(),
            zip_code: "75018".to_string(),
            longitude: Decimal::from_str("2.359800").unwrap(),
            latitude: Decimal::from_str("48.897500").unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&dealership).unwrap();
        assert!(json.contains("\"zipCode\":\"75018\""));
        assert!(json.contains("48.897500"));
    }
}
