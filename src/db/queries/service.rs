//! Workshop service database queries

use anyhow::Result;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::types::service::Service;

const SERVICE_COLUMNS: &str =
    "id, name, category, help, commentary, duration, price, created_at, updated_at";

/// List the service catalogue
pub async fn list_services(pool: &PgPool) -> Result<Vec<Service>> {
    let query = format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY name ASC");
    let services = sqlx::query_as::<_, Service>(&query)
        .fetch_all(pool)
        .await?;

    Ok(services)
}

/// Look up a service by exact name (reconciliation resolution key)
pub async fn find_by_name(conn: &mut PgConnection, name: &str) -> Result<Option<Service>> {
    let query = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE name = $1");
    let service = sqlx::query_as::<_, Service>(&query)
        .bind(name)
        .fetch_optional(conn)
        .await?;

    Ok(service)
}

/// List the services linked to an appointment
pub async fn list_for_appointment(pool: &PgPool, appointment_id: Uuid) -> Result<Vec<Service>> {
    let query = r#"
        SELECT s.id, s.name, s.category, s.help, s.commentary, s.duration, s.price,
               s.created_at, s.updated_at
        FROM services s
        JOIN appointment_services aps ON aps.service_id = s.id
        WHERE aps.appointment_id = $1
        ORDER BY s.name ASC
    "#;
    let services = sqlx::query_as::<_, Service>(query)
        .bind(appointment_id)
        .fetch_all(pool)
        .await?;

    Ok(services)
}
