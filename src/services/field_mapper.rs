//! Static field mappings between chatbot payloads and internal entities

use crate::error::DomainError;
use crate::services::entity_type::EntityKind;

const DEALERSHIP_MAPPING: &[(&str, &str)] = &[
    ("dealership_name", "name"),
    ("city", "city"),
    ("address", "address"),
    ("zipcode", "zip_code"),
    ("latitude", "latitude"),
    ("longitude", "longitude"),
];

const VEHICLE_MAPPING: &[(&str, &str)] = &[
    ("brand", "brand"),
    ("model", "model"),
    ("year", "circulation_date"),
    ("price", "price"),
];

const SERVICE_MAPPING: &[(&str, &str)] = &[
    ("operation_name", "name"),
    ("category", "category"),
    ("additionnal_help", "help"),
    ("additionnal_comment", "commentary"),
    ("time_unit", "duration"),
    ("price", "price"),
];

const CLIENT_MAPPING: &[(&str, &str)] = &[
    ("full_name", "last_name"),
    ("address", "address"),
    ("phone", "phone"),
];

/// Ordered external-field → internal-attribute mapping for a kind.
/// Appointment records carry no mappable attributes beyond the date.
pub fn mapping_for(kind: EntityKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        EntityKind::Dealership => DEALERSHIP_MAPPING,
        EntityKind::Vehicle => VEHICLE_MAPPING,
        EntityKind::Service => SERVICE_MAPPING,
        EntityKind::Client => CLIENT_MAPPING,
        EntityKind::Appointment => &[],
    }
}

/// Target table for a kind. Client records are never persisted from
/// chatbot data, so client is not a valid target.
pub fn entity_table_for(kind: EntityKind) -> Result<&'static str, DomainError> {
    match kind {
        EntityKind::Dealership => Ok("dealerships"),
        EntityKind::Vehicle => Ok("vehicles"),
        EntityKind::Service => Ok("services"),
        EntityKind::Appointment => Ok("appointments"),
        EntityKind::Client => Err(DomainError::InvalidArgument(
            EntityKind::Client.as_str().to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dealership_mapping_renames_name_and_zipcode() {
        let mapping = mapping_for(EntityKind::Dealership);
        assert_eq!(mapping.len(), 6);
        assert!(mapping.contains(&("dealership_name", "name")));
        assert!(mapping.contains(&("zipcode", "zip_code")));
    }

    #[test]
    fn test_service_mapping_renames_operation_fields() {
        let mapping = mapping_for(EntityKind::Service);
        assert!(mapping.contains(&("operation_name", "name")));
        assert!(mapping.contains(&("time_unit", "duration")));
    }

    #[test]
    fn test_appointment_has_no_field_mapping() {
        assert!(mapping_for(EntityKind::Appointment).is_empty());
    }

    #[test]
    fn test_entity_table_for_supported_kinds() {
        assert_eq!(entity_table_for(EntityKind::Dealership).unwrap(), "dealerships");
        assert_eq!(entity_table_for(EntityKind::Vehicle).unwrap(), "vehicles");
        assert_eq!(entity_table_for(EntityKind::Service).unwrap(), "services");
        assert_eq!(entity_table_for(EntityKind::Appointment).unwrap(), "appointments");
    }

    #[test]
    fn test_entity_table_for_client_is_invalid() {
        let err = entity_table_for(EntityKind::Client).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }
}
