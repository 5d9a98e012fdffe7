//! Dealership database queries

use anyhow::Result;
use sqlx::{PgConnection, PgPool};

use crate::types::dealership::Dealership;

const DEALERSHIP_COLUMNS: &str =
    "id, name, city, address, zip_code, longitude, latitude, created_at, updated_at";

/// List the dealership catalogue
pub async fn list_dealerships(pool: &PgPool) -> Result<Vec<Dealership>> {
    let query = format!("SELECT {DEALERSHIP_COLUMNS} FROM dealerships ORDER BY name ASC");
    let dealerships = sqlx::query_as::<_, Dealership>(&query)
        .fetch_all(pool)
        .await?;

    Ok(dealerships)
}

/// Look up a dealership by exact name (reconciliation resolution key)
pub async fn find_by_name(conn: &mut PgConnection, name: &str) -> Result<Option<Dealership>> {
    let query = format!("SELECT {DEALERSHIP_COLUMNS} FROM dealerships WHERE name = $1");
    let dealership = sqlx::query_as::<_, Dealership>(&query)
        .bind(name)
        .fetch_optional(conn)
        .await?;

    Ok(dealership)
}
