//! Client database queries

use anyhow::Result;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::types::client::Client;

const CLIENT_COLUMNS: &str =
    "id, civil_title, last_name, first_name, address, zip_code, phone, created_at, updated_at";

/// Insert a new client record
pub async fn insert_client(
    conn: &mut PgConnection,
    civil_title: &str,
    last_name: &str,
    first_name: &str,
    address: &str,
    zip_code: &str,
    phone: &str,
) -> Result<Client> {
    let query = format!(
        "INSERT INTO clients (civil_title, last_name, first_name, address, zip_code, phone)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {CLIENT_COLUMNS}"
    );
    let client = sqlx::query_as::<_, Client>(&query)
        .bind(civil_title)
        .bind(last_name)
        .bind(first_name)
        .bind(address)
        .bind(zip_code)
        .bind(phone)
        .fetch_one(conn)
        .await?;

    Ok(client)
}

/// Look up a client by id
pub async fn find_client(conn: &mut PgConnection, id: Uuid) -> Result<Option<Client>> {
    let query = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1");
    let client = sqlx::query_as::<_, Client>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(client)
}
