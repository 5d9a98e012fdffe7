//! Appointment handlers for gateway messages

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use sqlx::PgPool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::queries;
use crate::handlers::{authenticated_request, send_error, send_success};
use crate::types::{
    Appointment, AppointmentListResponse, AppointmentStatus, AppointmentWithServices,
    CreateAppointmentRequest, DeleteAppointmentRequest, ErrorResponse, GetAppointmentRequest,
    ListAppointmentsRequest, Request, UpdateAppointmentRequest,
};

async fn with_services(
    pool: &PgPool,
    appointment: Appointment,
) -> Result<AppointmentWithServices> {
    let services = queries::service::list_for_appointment(pool, appointment.id).await?;
    Ok(AppointmentWithServices {
        appointment,
        services,
    })
}

/// Handle appointment.create messages
pub async fn handle_create(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received appointment.create message");
        let (reply, request, client_id) =
            authenticated_request!(client, msg, &jwt_secret, CreateAppointmentRequest);

        let payload = &request.payload;

        // The vehicle must belong to the authenticated client
        match queries::vehicle::get_vehicle(&pool, payload.vehicle_id, client_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                send_error(&client, reply, request.id, "NOT_FOUND", "Vehicle not found").await;
                continue;
            }
            Err(e) => {
                error!("Failed to check vehicle: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
                continue;
            }
        }

        match queries::appointment::create_appointment(&pool, client_id, payload).await {
            Ok(appointment) => {
                info!("Appointment {} created for client {}", appointment.id, client_id);
                match with_services(&pool, appointment).await {
                    Ok(response) => send_success(&client, reply, request.id, response).await,
                    Err(e) => {
                        error!("Failed to load appointment services: {}", e);
                        send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
                    }
                }
            }
            Err(e) => {
                error!("Failed to create appointment: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
            }
        }
    }

    Ok(())
}

/// Handle appointment.list messages
pub async fn handle_list(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received appointment.list message");
        let (reply, request, client_id) =
            authenticated_request!(client, msg, &jwt_secret, ListAppointmentsRequest);

        let status = request.payload.status.as_deref();
        if let Some(value) = status {
            if AppointmentStatus::parse(value).is_none() {
                send_error(&client, reply, request.id, "VALIDATION_ERROR", format!("Unknown status '{value}'")).await;
                continue;
            }
        }

        let appointments = match queries::appointment::list_appointments(&pool, client_id, status).await
        {
            Ok(appointments) => appointments,
            Err(e) => {
                error!("Failed to list appointments: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
                continue;
            }
        };

        let mut items = Vec::with_capacity(appointments.len());
        let mut failed = false;
        for appointment in appointments {
            match with_services(&pool, appointment).await {
                Ok(item) => items.push(item),
                Err(e) => {
                    error!("Failed to load appointment services: {}", e);
                    send_error(&client, reply.clone(), request.id, "DATABASE_ERROR", e.to_string()).await;
                    failed = true;
                    break;
                }
            }
        }
        if failed {
            continue;
        }

        let total = items.len() as i64;
        send_success(&client, reply, request.id, AppointmentListResponse { items, total }).await;
    }

    Ok(())
}

/// Handle appointment.get messages
pub async fn handle_get(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received appointment.get message");
        let (reply, request, client_id) =
            authenticated_request!(client, msg, &jwt_secret, GetAppointmentRequest);

        match queries::appointment::get_appointment(&pool, request.payload.id, client_id).await {
            Ok(Some(appointment)) => match with_services(&pool, appointment).await {
                Ok(response) => send_success(&client, reply, request.id, response).await,
                Err(e) => {
                    error!("Failed to load appointment services: {}", e);
                    send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
                }
            },
            Ok(None) => {
                send_error(&client, reply, request.id, "NOT_FOUND", "Appointment not found").await;
            }
            Err(e) => {
                error!("Failed to get appointment: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
            }
        }
    }

    Ok(())
}

/// Handle appointment.update messages
pub async fn handle_update(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received appointment.update message");
        let (reply, request, client_id) =
            authenticated_request!(client, msg, &jwt_secret, UpdateAppointmentRequest);

        if let Some(ref value) = request.payload.status {
            if AppointmentStatus::parse(value).is_none() {
                send_error(&client, reply, request.id, "VALIDATION_ERROR", format!("Unknown status '{value}'")).await;
                continue;
            }
        }

        match queries::appointment::update_appointment(&pool, client_id, request.payload).await {
            Ok(Some(appointment)) => match with_services(&pool, appointment).await {
                Ok(response) => send_success(&client, reply, request.id, response).await,
                Err(e) => {
                    error!("Failed to load appointment services: {}", e);
                    send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
                }
            },
            Ok(None) => {
                send_error(&client, reply, request.id, "NOT_FOUND", "Appointment not found").await;
            }
            Err(e) => {
                error!("Failed to update appointment: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
            }
        }
    }

    Ok(())
}

/// Handle appointment.delete messages
pub async fn handle_delete(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received appointment.delete message");
        let (reply, request, client_id) =
            authenticated_request!(client, msg, &jwt_secret, DeleteAppointmentRequest);

        match queries::appointment::delete_appointment(&pool, request.payload.id, client_id).await {
            Ok(true) => {
                send_success(&client, reply, request.id, serde_json::json!({ "deleted": true })).await;
            }
            Ok(false) => {
                send_error(&client, reply, request.id, "NOT_FOUND", "Appointment not found").await;
            }
            Err(e) => {
                error!("Failed to delete appointment: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
            }
        }
    }

    Ok(())
}
