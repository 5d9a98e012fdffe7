//! Appointment assembly from resolved entities

use chrono::NaiveDateTime;
use sqlx::PgConnection;
use tracing::{error, info};

use crate::db::queries;
use crate::error::DomainError;
use crate::types::appointment::Appointment;
use crate::types::chatbot::AppointmentData;
use crate::types::client::Client;
use crate::types::dealership::Dealership;
use crate::types::service::Service;
use crate::types::vehicle::Vehicle;

/// Entities resolved from a chatbot payload, keyed by kind.
#[derive(Debug, Default)]
pub struct RelatedEntities {
    pub client: Option<Client>,
    pub vehicle: Option<Vehicle>,
    pub dealership: Option<Dealership>,
    pub services: Vec<Service>,
}

impl RelatedEntities {
    /// Kind keys required for an appointment that are still absent.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.dealership.is_none() {
            missing.push("dealership");
        }
        if self.vehicle.is_none() {
            missing.push("vehicle");
        }
        if self.client.is_none() {
            missing.push("client");
        }
        if self.services.is_empty() {
            missing.push("service");
        }
        missing
    }
}

/// Accepted `preferred_datetime` formats, ISO first.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse the appointment date supplied by the chatbot.
pub fn parse_preferred_datetime(raw: &str) -> Result<NaiveDateTime, DomainError> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| {
            error!("Invalid appointment date format: {raw}");
            DomainError::bad_request("Invalid appointment date format")
        })
}

/// Stage a new pending appointment linking the resolved entities.
///
/// Runs on the caller's connection so it joins the orchestrator's
/// transaction; the caller commits.
pub async fn create(
    conn: &mut PgConnection,
    related: &RelatedEntities,
    data: &AppointmentData<'_>,
) -> Result<Appointment, DomainError> {
    let missing = related.missing();
    if !missing.is_empty() {
        error!("Missing required entities for appointment: {}", missing.join(", "));
        return Err(DomainError::bad_request(format!(
            "Missing required entities: {}",
            missing.join(", ")
        )));
    }

    let (Some(client), Some(vehicle), Some(dealership)) = (
        related.client.as_ref(),
        related.vehicle.as_ref(),
        related.dealership.as_ref(),
    ) else {
        return Err(DomainError::bad_request("Missing required entities"));
    };

    let raw_date = data.field("preferred_datetime").ok_or_else(|| {
        error!("Appointment date missing from chatbot data");
        DomainError::bad_request("The appointment date is required")
    })?;
    let date = parse_preferred_datetime(raw_date)?;

    let appointment =
        queries::appointment::insert_appointment(conn, client.id, vehicle.id, dealership.id, date)
            .await?;

    for service in &related.services {
        queries::appointment::attach_service(conn, appointment.id, service.id).await?;
    }

    info!(
        "Appointment staged for client {} at dealership {} on {}",
        client.id, dealership.id, date
    );

    Ok(appointment)
}
