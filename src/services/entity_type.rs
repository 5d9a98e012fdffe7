//! Entity classification for chatbot records
//!
//! Chatbot payloads are noisy: records arrive with partial or extra fields.
//! Classification is a field-overlap heuristic, deliberately tolerant of
//! missing fields, not a guaranteed-correct classifier.

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Field carrying the vehicle registration plate. It identifies the
/// client's vehicle and is resolved separately, so it never counts toward
/// a signature match.
pub const PLATE_FIELD: &str = "car_immatriculation";

/// Minimum fraction of a signature's fields that must be present in a
/// record. Both this threshold and the evaluation order below are
/// load-bearing: changing either changes the outcome for ambiguous records.
pub const CLASSIFICATION_THRESHOLD: f64 = 0.7;

/// The entity kinds a chatbot record can map onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Dealership,
    Vehicle,
    Service,
    Client,
    Appointment,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dealership => "dealership",
            Self::Vehicle => "vehicle",
            Self::Service => "service",
            Self::Client => "client",
            Self::Appointment => "appointment",
        }
    }
}

/// Candidate kinds with their signature fields, in evaluation order.
/// First kind to reach the threshold wins.
const SIGNATURES: &[(EntityKind, &[&str])] = &[
    (
        EntityKind::Dealership,
        &["dealership_name", "city", "address", "zipcode", "latitude", "longitude"],
    ),
    (EntityKind::Vehicle, &["brand", "model", "year", "price"]),
    (
        EntityKind::Service,
        &["operation_name", "category", "time_unit", "price"],
    ),
    (EntityKind::Appointment, &["preferred_datetime"]),
];

/// Classify a record against the known entity signatures.
pub fn determine_type(record: &Map<String, Value>) -> Option<EntityKind> {
    for (kind, signature) in SIGNATURES {
        let matches = count_matching_fields(record, signature);

        if matches as f64 >= signature.len() as f64 * CLASSIFICATION_THRESHOLD {
            debug!(
                "Record classified as {} with {} matching fields",
                kind.as_str(),
                matches
            );
            return Some(*kind);
        }
    }

    warn!(
        "Could not classify record with fields: {:?}",
        record.keys().collect::<Vec<_>>()
    );
    None
}

fn count_matching_fields(record: &Map<String, Value>, signature: &[&str]) -> usize {
    signature
        .iter()
        .filter(|field| **field != PLATE_FIELD && record.contains_key(**field))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(raw: serde_json::Value) -> Map<String, Value> {
        raw.as_object().unwrap().clone()
    }

    #[test]
    fn test_full_dealership_record_classifies() {
        let item = record(json!({
            "dealership_name": "Garage X",
            "city": "Paris",
            "address": "1 rue A",
            "zipcode": "75001",
            "latitude": "48.85",
            "longitude": "2.35"
        }));
        assert_eq!(determine_type(&item), Some(EntityKind::Dealership));
    }

    #[test]
    fn test_dealership_tolerates_one_missing_field() {
        // 5 of 6 fields present: 5 >= 6 * 0.7
        let item = record(json!({
            "dealership_name": "Garage X",
            "city": "Paris",
            "address": "1 rue A",
            "zipcode": "75001",
            "latitude": "48.85"
        }));
        assert_eq!(determine_type(&item), Some(EntityKind::Dealership));
    }

    #[test]
    fn test_dealership_two_missing_fields_is_below_threshold() {
        // 4 of 6 fields present: 4 < 6 * 0.7 = 4.2, and no other signature matches
        let item = record(json!({
            "dealership_name": "Garage X",
            "city": "Paris",
            "address": "1 rue A",
            "zipcode": "75001"
        }));
        assert_eq!(determine_type(&item), None);
    }

    #[test]
    fn test_vehicle_three_of_four_fields_classifies() {
        let item = record(json!({
            "brand": "Renault",
            "model": "Clio",
            "year": 2021
        }));
        assert_eq!(determine_type(&item), Some(EntityKind::Vehicle));
    }

    #[test]
    fn test_service_record_classifies() {
        let item = record(json!({
            "operation_name": "Oil change",
            "category": "maintenance",
            "price": 89
        }));
        assert_eq!(determine_type(&item), Some(EntityKind::Service));
    }

    #[test]
    fn test_appointment_record_classifies() {
        let item = record(json!({"preferred_datetime": "2024-06-01T10:00:00"}));
        assert_eq!(determine_type(&item), Some(EntityKind::Appointment));
    }

    #[test]
    fn test_priority_order_wins_for_ambiguous_records() {
        // Matches both the vehicle and the service signature; vehicle is
        // evaluated first and must win.
        let item = record(json!({
            "brand": "Renault",
            "model": "Clio",
            "year": 2021,
            "operation_name": "Oil change",
            "category": "maintenance",
            "time_unit": 45
        }));
        assert_eq!(determine_type(&item), Some(EntityKind::Vehicle));
    }

    #[test]
    fn test_single_shared_field_is_unclassified() {
        // price alone is 1/4 of both vehicle and service signatures
        let item = record(json!({"price": 50}));
        assert_eq!(determine_type(&item), None);
    }

    #[test]
    fn test_plate_field_never_counts() {
        let item = record(json!({"car_immatriculation": "AB-123-CD"}));
        assert_eq!(determine_type(&item), None);
    }

    #[test]
    fn test_empty_record_is_unclassified() {
        assert_eq!(determine_type(&Map::new()), None);
    }
}
