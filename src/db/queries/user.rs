//! User database queries

use anyhow::Result;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db::queries;
use crate::types::user::{RegisterRequest, User};

const USER_COLUMNS: &str = "id, email, password_hash, roles, client_id, created_at, updated_at";

const DEFAULT_ROLES: [&str; 1] = ["ROLE_USER"];

/// Look up a user by email
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let user = sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Look up a user by id on an existing connection (used inside the
/// reconciliation transaction)
pub async fn find_user(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(user)
}

/// Register a new account: the client record, the user, and optionally the
/// client's first vehicle, in one transaction.
pub async fn register_user(
    pool: &PgPool,
    request: &RegisterRequest,
    password_hash: &str,
) -> Result<User> {
    let mut tx = pool.begin().await?;

    let client = queries::client::insert_client(
        &mut tx,
        &request.civil_title,
        &request.last_name,
        &request.first_name,
        &request.address,
        &request.zip_code,
        &request.phone,
    )
    .await?;

    let roles: Vec<String> = DEFAULT_ROLES.iter().map(|r| r.to_string()).collect();

    let query = format!(
        "INSERT INTO users (email, password_hash, roles, client_id)
         VALUES ($1, $2, $3, $4)
         RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&query)
        .bind(&request.email)
        .bind(password_hash)
        .bind(&roles)
        .bind(client.id)
        .fetch_one(&mut *tx)
        .await?;

    if let Some(ref vehicle) = request.vehicle {
        queries::vehicle::insert_registration_vehicle(&mut tx, client.id, request, vehicle).await?;
    }

    tx.commit().await?;

    Ok(user)
}
