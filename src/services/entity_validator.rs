//! Record filtering and entity resolution for the reconciliation pipeline

use serde_json::{Map, Value};
use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use crate::db::queries;
use crate::error::DomainError;
use crate::services::entity_type::EntityKind;
use crate::types::client::Client;
use crate::types::dealership::Dealership;
use crate::types::service::Service;
use crate::types::vehicle::Vehicle;

/// Fields sourced from the authenticated user rather than the chatbot.
/// A record containing nothing else carries no new information.
const USER_SOURCED_FIELDS: &[&str] = &["full_name", "address", "phone"];

/// A reference entity resolved from the database
#[derive(Debug, Clone)]
pub enum ResolvedReference {
    Dealership(Dealership),
    Service(Service),
}

/// True unless every key of the record belongs to the user-sourced set.
pub fn is_valid_record(record: &Map<String, Value>) -> bool {
    let has_valid_fields = record
        .keys()
        .any(|key| !USER_SOURCED_FIELDS.contains(&key.as_str()));

    if !has_valid_fields {
        debug!(
            "Ignoring record containing only user-sourced fields: {:?}",
            record.keys().collect::<Vec<_>>()
        );
        return false;
    }

    true
}

/// Resolve the client associated with a user account.
pub async fn resolve_client(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Client, DomainError> {
    let user = queries::user::find_user(conn, user_id)
        .await?
        .ok_or_else(|| DomainError::not_found("User not found"))?;

    let client_id = user
        .client_id
        .ok_or_else(|| DomainError::not_found("No client record for this user"))?;

    let client = queries::client::find_client(conn, client_id)
        .await?
        .ok_or_else(|| DomainError::not_found("No client record for this user"))?;

    Ok(client)
}

/// Exact, case-sensitive registration match within a client's fleet.
pub fn find_by_registration<'a>(vehicles: &'a [Vehicle], registration: &str) -> Option<&'a Vehicle> {
    vehicles.iter().find(|vehicle| vehicle.registration == registration)
}

/// Resolve the client's vehicle matching a registration plate.
pub async fn resolve_vehicle(
    conn: &mut PgConnection,
    client: &Client,
    registration: &str,
) -> Result<Vehicle, DomainError> {
    let vehicles = queries::vehicle::vehicles_for_client(conn, client.id).await?;

    find_by_registration(&vehicles, registration)
        .cloned()
        .ok_or_else(|| {
            DomainError::not_found(format!(
                "Vehicle with registration {registration} not found for this client"
            ))
        })
}

/// Resolve a pre-existing reference entity by name. Reference entities are
/// only looked up, never created: absence is a hard error.
pub async fn resolve_reference(
    conn: &mut PgConnection,
    kind: EntityKind,
    name: &str,
) -> Result<ResolvedReference, DomainError> {
    match kind {
        EntityKind::Dealership => queries::dealership::find_by_name(conn, name)
            .await?
            .map(ResolvedReference::Dealership)
            .ok_or_else(|| {
                DomainError::not_found(format!("No dealership found matching name '{name}'"))
            }),
        EntityKind::Service => queries::service::find_by_name(conn, name)
            .await?
            .map(ResolvedReference::Service)
            .ok_or_else(|| {
                DomainError::not_found(format!("No service found matching name '{name}'"))
            }),
        other => Err(DomainError::InvalidArgument(other.as_str().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use serde_json::json;

    fn record(raw: serde_json::Value) -> Map<String, Value> {
        raw.as_object().unwrap().clone()
    }

    fn vehicle(registration: &str) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            client_id: Uuid::nil(),
            brand: "Renault".to_string(),
            model: "Clio".to_string(),
            registration: registration.to_string(),
            vin: "".to_string(),
            circulation_date: NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
            mileage: 0,
            driver: false,
            driver_last_name: None,
            driver_first_name: None,
            driver_phone: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // ---- is_valid_record ----

    #[test]
    fn test_record_with_only_user_fields_is_invalid() {
        let item = record(json!({
            "full_name": "Jane Doe",
            "address": "1 rue A",
            "phone": "0601020304"
        }));
        assert!(!is_valid_record(&item));
    }

    #[test]
    fn test_record_with_one_extra_field_is_valid() {
        let item = record(json!({
            "full_name": "Jane Doe",
            "operation_name": "Oil change"
        }));
        assert!(is_valid_record(&item));
    }

    #[test]
    fn test_record_with_no_user_fields_is_valid() {
        let item = record(json!({"dealership_name": "Garage X"}));
        assert!(is_valid_record(&item));
    }

    #[test]
    fn test_empty_record_is_invalid() {
        assert!(!is_valid_record(&Map::new()));
    }

    // ---- find_by_registration ----

    #[test]
    fn test_registration_exact_match() {
        let fleet = vec![vehicle("AB-123-CD"), vehicle("EF-456-GH")];
        let found = find_by_registration(&fleet, "EF-456-GH").unwrap();
        assert_eq!(found.registration, "EF-456-GH");
    }

    #[test]
    fn test_registration_match_is_case_sensitive() {
        let fleet = vec![vehicle("AB-123-CD")];
        assert!(find_by_registration(&fleet, "ab-123-cd").is_none());
    }

    #[test]
    fn test_registration_no_match_in_empty_fleet() {
        assert!(find_by_registration(&[], "AB-123-CD").is_none());
    }
}
