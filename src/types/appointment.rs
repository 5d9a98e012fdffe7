//! Appointment types

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::service::Service;

/// Appointment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Validated,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validated => "validated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "validated" => Some(Self::Validated),
            _ => None,
        }
    }
}

/// Appointment entity - one workshop booking. Client, vehicle, and
/// dealership are non-null once created; services are attached through
/// the appointment_services join table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub vehicle_id: Uuid,
    pub dealership_id: Uuid,
    pub date: NaiveDateTime,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Appointment together with its linked services
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentWithServices {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub services: Vec<Service>,
}

/// Request to create a new appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub vehicle_id: Uuid,
    pub dealership_id: Uuid,
    #[serde(default)]
    pub service_ids: Vec<Uuid>,
    pub date: NaiveDateTime,
}

/// Request to update an existing appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    pub id: Uuid,
    pub date: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub vehicle_id: Option<Uuid>,
    pub dealership_id: Option<Uuid>,
}

/// Request to list appointments, optionally filtered by status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAppointmentsRequest {
    pub status: Option<String>,
}

/// Request to fetch a single appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAppointmentRequest {
    pub id: Uuid,
}

/// Request to delete an appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAppointmentRequest {
    pub id: Uuid,
}

/// Response for list of appointments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentListResponse {
    pub items: Vec<AppointmentWithServices>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        assert_eq!(AppointmentStatus::Pending.as_str(), "pending");
        assert_eq!(AppointmentStatus::Validated.as_str(), "validated");
        assert_eq!(AppointmentStatus::parse("pending"), Some(AppointmentStatus::Pending));
        assert_eq!(AppointmentStatus::parse("validated"), Some(AppointmentStatus::Validated));
        assert_eq!(AppointmentStatus::parse("cancelled"), None);
    }

    #[test]
    fn test_create_appointment_request_deserialize() {
        let json = r#"{
            "vehicleId": "123e4567-e89b-12d3-a456-426614174000",
            "dealershipId": "123e4567-e89b-12d3-a456-426614174001",
            "serviceIds": ["123e4567-e89b-12d3-a456-426614174002"],
            "date": "2024-06-01T10:00:00"
        }"#;

        let request: CreateAppointmentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.service_ids.len(), 1);
        assert_eq!(request.date.to_string(), "2024-06-01 10:00:00");
    }

    #[test]
    fn test_list_request_defaults_to_no_filter() {
        let request: ListAppointmentsRequest = serde_json::from_str("{}").unwrap();
        assert!(request.status.is_none());
    }

    #[test]
    fn test_appointment_serializes_flat_with_services() {
        let appointment = Appointment {
            id: Uuid::nil(),
            client_id: Uuid::nil(),
            vehicle_id: Uuid::nil(),
            dealership_id: Uuid::nil(),
            date: NaiveDateTime::parse_from_str("2024-06-01T10:00:00", "%Y-%m-%dT%H:%M:%S").unwrap(),
            status: "pending".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let with_services = AppointmentWithServices {
            appointment,
            services: vec![],
        };

        let json = serde_json::to_string(&with_services).unwrap();
        assert!(json.contains("\"status\":\"pending\""));
        assert!(json.contains("\"services\":[]"));
    }
}
