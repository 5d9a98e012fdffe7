//! Vehicle types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vehicle entity - belongs to exactly one client.
/// The registration plate is the resolution key used by the chatbot
/// reconciliation pipeline, unique within a client's fleet.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub client_id: Uuid,
    pub brand: String,
    pub model: String,
    pub registration: String,
    pub vin: String,
    pub circulation_date: NaiveDate,
    pub mileage: i32,
    /// True when somebody other than the client drives the vehicle
    pub driver: bool,
    pub driver_last_name: Option<String>,
    pub driver_first_name: Option<String>,
    pub driver_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub brand: String,
    pub model: String,
    pub registration: String,
    #[serde(default)]
    pub vin: String,
    pub circulation_date: NaiveDate,
    #[serde(default)]
    pub mileage: i32,
    #[serde(default)]
    pub driver: bool,
    pub driver_last_name: Option<String>,
    pub driver_first_name: Option<String>,
    pub driver_phone: Option<String>,
}

/// Request to update an existing vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    pub id: Uuid,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub registration: Option<String>,
    pub vin: Option<String>,
    pub circulation_date: Option<NaiveDate>,
    pub mileage: Option<i32>,
    pub driver: Option<bool>,
    pub driver_last_name: Option<String>,
    pub driver_first_name: Option<String>,
    pub driver_phone: Option<String>,
}

/// Request to fetch a single vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVehicleRequest {
    pub id: Uuid,
}

/// Request to delete a vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteVehicleRequest {
    pub id: Uuid,
}

/// Response for list of vehicles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleListResponse {
    pub items: Vec<Vehicle>,
    pub total: i64,
}
