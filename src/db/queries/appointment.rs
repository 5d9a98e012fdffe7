//! Appointment database queries

use anyhow::Result;
use chrono::NaiveDateTime;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::types::appointment::{
    Appointment, AppointmentStatus, CreateAppointmentRequest, UpdateAppointmentRequest,
};

const APPOINTMENT_COLUMNS: &str =
    "id, client_id, vehicle_id, dealership_id, date, status, created_at, updated_at";

/// Insert a pending appointment on an existing connection (staged by the
/// reconciliation pipeline; the caller owns the transaction)
pub async fn insert_appointment(
    conn: &mut PgConnection,
    client_id: Uuid,
    vehicle_id: Uuid,
    dealership_id: Uuid,
    date: NaiveDateTime,
) -> Result<Appointment> {
    let query = format!(
        "INSERT INTO appointments (client_id, vehicle_id, dealership_id, date)
         VALUES ($1, $2, $3, $4)
         RETURNING {APPOINTMENT_COLUMNS}"
    );
    let appointment = sqlx::query_as::<_, Appointment>(&query)
        .bind(client_id)
        .bind(vehicle_id)
        .bind(dealership_id)
        .bind(date)
        .fetch_one(conn)
        .await?;

    Ok(appointment)
}

/// Link a service to an appointment. Idempotent: attaching an already
/// linked service is a no-op.
pub async fn attach_service(
    conn: &mut PgConnection,
    appointment_id: Uuid,
    service_id: Uuid,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO appointment_services (appointment_id, service_id)
         VALUES ($1, $2)
         ON CONFLICT DO NOTHING",
    )
    .bind(appointment_id)
    .bind(service_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Find the pending appointment for a (client, vehicle) pair, if any
pub async fn find_pending(
    conn: &mut PgConnection,
    client_id: Uuid,
    vehicle_id: Uuid,
) -> Result<Option<Appointment>> {
    let query = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE client_id = $1 AND vehicle_id = $2 AND status = $3
         ORDER BY created_at DESC
         LIMIT 1"
    );
    let appointment = sqlx::query_as::<_, Appointment>(&query)
        .bind(client_id)
        .bind(vehicle_id)
        .bind(AppointmentStatus::Pending.as_str())
        .fetch_optional(conn)
        .await?;

    Ok(appointment)
}

/// Find the client's most recent pending appointment (chatbot reset flow)
pub async fn latest_pending_for_client(
    pool: &PgPool,
    client_id: Uuid,
) -> Result<Option<Appointment>> {
    let query = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE client_id = $1 AND status = $2
         ORDER BY created_at DESC
         LIMIT 1"
    );
    let appointment = sqlx::query_as::<_, Appointment>(&query)
        .bind(client_id)
        .bind(AppointmentStatus::Pending.as_str())
        .fetch_optional(pool)
        .await?;

    Ok(appointment)
}

/// Set the status of an appointment, scoped to its owning client
pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    client_id: Uuid,
    status: AppointmentStatus,
) -> Result<Option<Appointment>> {
    let query = format!(
        "UPDATE appointments
         SET status = $1, updated_at = NOW()
         WHERE id = $2 AND client_id = $3
         RETURNING {APPOINTMENT_COLUMNS}"
    );
    let appointment = sqlx::query_as::<_, Appointment>(&query)
        .bind(status.as_str())
        .bind(id)
        .bind(client_id)
        .fetch_optional(pool)
        .await?;

    Ok(appointment)
}

/// Create an appointment with its service links
pub async fn create_appointment(
    pool: &PgPool,
    client_id: Uuid,
    request: &CreateAppointmentRequest,
) -> Result<Appointment> {
    let mut tx = pool.begin().await?;

    let appointment = insert_appointment(
        &mut tx,
        client_id,
        request.vehicle_id,
        request.dealership_id,
        request.date,
    )
    .await?;

    for service_id in &request.service_ids {
        attach_service(&mut tx, appointment.id, *service_id).await?;
    }

    tx.commit().await?;

    Ok(appointment)
}

/// List a client's appointments, optionally filtered by status
pub async fn list_appointments(
    pool: &PgPool,
    client_id: Uuid,
    status: Option<&str>,
) -> Result<Vec<Appointment>> {
    let appointments = if let Some(status) = status {
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments
             WHERE client_id = $1 AND status = $2
             ORDER BY date ASC"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(client_id)
            .bind(status)
            .fetch_all(pool)
            .await?
    } else {
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments
             WHERE client_id = $1
             ORDER BY date ASC"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await?
    };

    Ok(appointments)
}

/// Get a single appointment, scoped to its owning client
pub async fn get_appointment(
    pool: &PgPool,
    id: Uuid,
    client_id: Uuid,
) -> Result<Option<Appointment>> {
    let query = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1 AND client_id = $2");
    let appointment = sqlx::query_as::<_, Appointment>(&query)
        .bind(id)
        .bind(client_id)
        .fetch_optional(pool)
        .await?;

    Ok(appointment)
}

/// Update an appointment
pub async fn update_appointment(
    pool: &PgPool,
    client_id: Uuid,
    request: UpdateAppointmentRequest,
) -> Result<Option<Appointment>> {
    // First check if the appointment exists and belongs to the client
    let Some(existing) = get_appointment(pool, request.id, client_id).await? else {
        return Ok(None);
    };

    let date = request.date.unwrap_or(existing.date);
    let status = request.status.unwrap_or(existing.status);
    let vehicle_id = request.vehicle_id.unwrap_or(existing.vehicle_id);
    let dealership_id = request.dealership_id.unwrap_or(existing.dealership_id);

    let query = format!(
        "UPDATE appointments
         SET date = $1, status = $2, vehicle_id = $3, dealership_id = $4, updated_at = NOW()
         WHERE id = $5 AND client_id = $6
         RETURNING {APPOINTMENT_COLUMNS}"
    );
    let appointment = sqlx::query_as::<_, Appointment>(&query)
        .bind(date)
        .bind(&status)
        .bind(vehicle_id)
        .bind(dealership_id)
        .bind(request.id)
        .bind(client_id)
        .fetch_optional(pool)
        .await?;

    Ok(appointment)
}

/// Delete an appointment (service links cascade)
pub async fn delete_appointment(pool: &PgPool, id: Uuid, client_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = $1 AND client_id = $2")
        .bind(id)
        .bind(client_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
