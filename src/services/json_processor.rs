//! Orchestrates reconciliation of chatbot data into a persisted appointment

use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::queries;
use crate::error::DomainError;
use crate::services::appointment_creator::{self, RelatedEntities};
use crate::services::entity_type::{self, EntityKind, PLATE_FIELD};
use crate::services::entity_validator::{self, ResolvedReference};
use crate::services::field_mapper;
use crate::types::appointment::Appointment;
use crate::types::chatbot::AppointmentData;

/// Derive the reference-lookup criteria for a classified record: the
/// external field that maps onto the entity's `name` attribute. Kinds
/// without a name attribute cannot be looked up.
fn search_criteria(kind: EntityKind, record: &Map<String, Value>) -> Result<String, DomainError> {
    let table = field_mapper::entity_table_for(kind)?;

    let field = field_mapper::mapping_for(kind)
        .iter()
        .find(|(_, internal)| *internal == "name")
        .map(|(external, _)| *external)
        .ok_or_else(|| DomainError::InvalidArgument(kind.as_str().to_string()))?;

    tracing::debug!("Looking up {table} by {field}");

    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            DomainError::bad_request(format!(
                "Record classified as {} is missing {field}",
                kind.as_str()
            ))
        })
}

/// Reconcile a chatbot `data` payload against the authenticated user's
/// entities and persist the resulting appointment.
///
/// Everything runs in one transaction. The guard rolls back on drop, so
/// every early return — domain failure or unexpected error — leaves no
/// partial writes behind.
pub async fn process_and_save_data(
    pool: &PgPool,
    raw: &Value,
    user_id: Option<Uuid>,
) -> Result<Appointment, DomainError> {
    info!("Processing chatbot appointment data");

    let Some(user_id) = user_id else {
        return Err(DomainError::bad_request("A user id is required"));
    };

    let data = AppointmentData::new(raw);

    let mut tx = pool.begin().await?;

    let valid_records: Vec<_> = data
        .records()
        .into_iter()
        .filter(|record| entity_validator::is_valid_record(record))
        .collect();

    if valid_records.is_empty() {
        return Err(DomainError::bad_request(
            "No usable records found in chatbot data",
        ));
    }

    let client = entity_validator::resolve_client(&mut tx, user_id).await?;

    let Some(plate) = data.field(PLATE_FIELD) else {
        return Err(DomainError::bad_request("The vehicle registration is required"));
    };
    let vehicle = entity_validator::resolve_vehicle(&mut tx, &client, plate).await?;

    let mut related = RelatedEntities {
        client: Some(client.clone()),
        vehicle: Some(vehicle.clone()),
        ..Default::default()
    };

    for record in &valid_records {
        let Some(kind) = entity_type::determine_type(record) else {
            continue;
        };
        // Client data comes from the authenticated user, never the chatbot
        if kind == EntityKind::Client {
            continue;
        }

        let name = search_criteria(kind, record)?;
        match entity_validator::resolve_reference(&mut tx, kind, &name).await? {
            ResolvedReference::Dealership(dealership) => related.dealership = Some(dealership),
            ResolvedReference::Service(service) => {
                if !related.services.iter().any(|s| s.id == service.id) {
                    related.services.push(service);
                }
            }
        }
    }

    // Reuse the pending appointment for this (client, vehicle) pair when one
    // exists, attaching the newly resolved services instead of duplicating.
    let pending = queries::appointment::find_pending(&mut tx, client.id, vehicle.id).await?;
    let appointment = match pending {
        Some(existing) => {
            info!(
                "Pending appointment {} found, attaching {} service(s)",
                existing.id,
                related.services.len()
            );
            for service in &related.services {
                queries::appointment::attach_service(&mut tx, existing.id, service.id).await?;
            }
            existing
        }
        None => {
            info!("No pending appointment for this vehicle, creating a new one");
            appointment_creator::create(&mut tx, &related, &data).await?
        }
    };

    tx.commit().await?;

    info!("Appointment {} saved", appointment.id);
    Ok(appointment)
}

/// Fetch and decode a JSON payload from a URL.
pub async fn process_json_from_url(url: &str) -> Result<Value, DomainError> {
    info!("Fetching JSON payload from {url}");

    let response = reqwest::get(url)
        .await
        .map_err(|e| DomainError::internal(format!("Error fetching JSON payload: {e}")))?;

    if !response.status().is_success() {
        return Err(DomainError::Upstream(format!(
            "Upstream returned {} while fetching JSON payload",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| DomainError::internal(format!("Error reading JSON payload: {e}")))?;

    serde_json::from_str(&body)
        .map_err(|e| DomainError::bad_request(format!("The content is not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(raw: Value) -> Map<String, Value> {
        raw.as_object().unwrap().clone()
    }

    #[test]
    fn test_search_criteria_for_dealership() {
        let item = record(json!({"dealership_name": "Garage X", "city": "Paris"}));
        let name = search_criteria(EntityKind::Dealership, &item).unwrap();
        assert_eq!(name, "Garage X");
    }

    #[test]
    fn test_search_criteria_for_service() {
        let item = record(json!({"operation_name": "Oil change"}));
        let name = search_criteria(EntityKind::Service, &item).unwrap();
        assert_eq!(name, "Oil change");
    }

    #[test]
    fn test_search_criteria_rejects_other_kinds() {
        let item = record(json!({"brand": "Renault"}));
        let err = search_criteria(EntityKind::Vehicle, &item).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");

        let err = search_criteria(EntityKind::Appointment, &item).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_search_criteria_requires_the_key_field() {
        let item = record(json!({"city": "Paris"}));
        let err = search_criteria(EntityKind::Dealership, &item).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    // End-to-end reconciliation against a live database. Run with a
    // dedicated DATABASE_URL and the migrations in ./migrations applied:
    //   cargo test --  --ignored reconciliation
    #[tokio::test]
    #[ignore]
    async fn test_reconciliation_reuses_pending_appointment() {
        use crate::types::user::{RegisterRequest, RegisterVehicle};

        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = crate::db::create_pool(&database_url).await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        let unique = Uuid::new_v4().simple().to_string();
        let request = RegisterRequest {
            email: format!("e2e-{unique}@example.com"),
            password: "ignored".to_string(),
            civil_title: "Mr".to_string(),
            last_name: "Doe".to_string(),
            first_name: "John".to_string(),
            address: "1 rue A".to_string(),
            zip_code: "75001".to_string(),
            phone: "0601020304".to_string(),
            vehicle: Some(RegisterVehicle {
                brand: "Renault".to_string(),
                model: "Clio".to_string(),
                registration: "AB-123-CD".to_string(),
                vin: "".to_string(),
                circulation_date: None,
                mileage: 42000,
                driver: false,
                driver_last_name: None,
                driver_first_name: None,
                driver_phone: None,
            }),
        };
        let user = queries::user::register_user(&pool, &request, "not-a-hash")
            .await
            .unwrap();

        // "Atelio Paris Nord" and "Oil change" come from the seed migration
        let payload = json!({
            "closest_dealer": {
                "dealership_name": "Atelio Paris Nord",
                "city": "Paris",
                "address": "12 rue de la Chapelle",
                "zipcode": "75018",
                "latitude": "48.897500",
                "longitude": "2.359800"
            },
            "matched_operation": {
                "operation_name": "Oil change",
                "category": "maintenance",
                "price": 89
            },
            "car_immatriculation": "AB-123-CD",
            "preferred_datetime": "2024-06-01T10:00:00"
        });

        let first = process_and_save_data(&pool, &payload, Some(user.id))
            .await
            .unwrap();
        assert_eq!(first.status, "pending");
        assert_eq!(first.date.to_string(), "2024-06-01 10:00:00");

        // Same payload again: the pending appointment is reused, not duplicated
        let second = process_and_save_data(&pool, &payload, Some(user.id))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let services = queries::service::list_for_appointment(&pool, first.id)
            .await
            .unwrap();
        assert_eq!(services.len(), 1);

        // Unknown dealership rolls back without persisting anything new
        let bad_payload = json!({
            "closest_dealer": {
                "dealership_name": "No Such Garage",
                "city": "Paris",
                "address": "1 rue A",
                "zipcode": "75001",
                "latitude": "48.8",
                "longitude": "2.3"
            },
            "car_immatriculation": "AB-123-CD",
            "preferred_datetime": "2024-06-02T10:00:00"
        });
        let err = process_and_save_data(&pool, &bad_payload, Some(user.id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        // Nothing was written by the failed run
        let services = queries::service::list_for_appointment(&pool, first.id)
            .await
            .unwrap();
        assert_eq!(services.len(), 1);
    }
}
