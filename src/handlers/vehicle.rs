//! Vehicle handlers for gateway messages

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
    CreateVehicleRequest, DeleteVehicleRequest, EmptyPayload, ErrorResponse, GetVehicleRequest,
    Request, UpdateVehicleRequest, VehicleListResponse,
};

/// Handle vehicle.create messages
pub async fn handle_create(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received vehicle.create message");
        let (reply, request, client_id) =
            authenticated_request!(client, msg, &jwt_secret, CreateVehicleRequest);

        let payload = &request.payload;
        if payload.brand.is_empty() || payload.model.is_empty() || payload.registration.is_empty() {
            send_error(&client, reply, request.id, "VALIDATION_ERROR", "Brand, model, and registration are required").await;
            continue;
        }

        match queries::vehicle::create_vehicle(&pool, client_id, payload).await {
            Ok(vehicle) => {
                info!("Vehicle {} created for client {}", vehicle.id, client_id);
                send_success(&client, reply, request.id, vehicle).await;
            }
            Err(e) => {
                error!("Failed to create vehicle: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
            }
        }
    }

    Ok(())
}

/// Handle vehicle.list messages
pub async fn handle_list(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received vehicle.list message");
        let (reply, request, client_id) =
            authenticated_request!(client, msg, &jwt_secret, EmptyPayload);

        match queries::vehicle::list_vehicles(&pool, client_id).await {
            Ok(vehicles) => {
                let total = vehicles.len() as i64;
                let response = VehicleListResponse {
                    items: vehicles,
                    total,
                };
                send_success(&client, reply, request.id, response).await;
            }
            Err(e) => {
                error!("Failed to list vehicles: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
            }
        }
    }

    Ok(())
}

/// Handle vehicle.get messages
pub async fn handle_get(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received vehicle.get message");
        let (reply, request, client_id) =
            authenticated_request!(client, msg, &jwt_secret, GetVehicleRequest);

        match queries::vehicle::get_vehicle(&pool, request.payload.id, client_id).await {
            Ok(Some(vehicle)) => {
                send_success(&client, reply, request.id, vehicle).await;
            }
            Ok(None) => {
                send_error(&client, reply, request.id, "NOT_FOUND", "Vehicle not found").await;
            }
            Err(e) => {
                error!("Failed to get vehicle: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
            }
        }
    }

    Ok(())
}

/// Handle vehicle.update messages
pub async fn handle_update(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received vehicle.update message");
        let (reply, request, client_id) =
            authenticated_request!(client, msg, &jwt_secret, UpdateVehicleRequest);

        match queries::vehicle::update_vehicle(&pool, client_id, request.payload).await {
            Ok(Some(vehicle)) => {
                send_success(&client, reply, request.id, vehicle).await;
            }
            Ok(None) => {
                send_error(&client, reply, request.id, "NOT_FOUND", "Vehicle not found").await;
            }
            Err(e) => {
                error!("Failed to update vehicle: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
            }
        }
    }

    Ok(())
}

/// Handle vehicle.delete messages
pub async fn handle_delete(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received vehicle.delete message");
        let (reply, request, client_id) =
            authenticated_request!(client, msg, &jwt_secret, DeleteVehicleRequest);

        match queries::vehicle::delete_vehicle(&pool, request.payload.id, client_id).await {
            Ok(true) => {
                send_success(&client, reply, request.id, serde_json::json!({ "deleted": true })).await;
            }
            Ok(false) => {
                send_error(&client, reply, request.id, "NOT_FOUND", "Vehicle not found").await;
            }
            Err(e) => {
                error!("Failed to delete vehicle: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
            }
        }
    }

    Ok(())
}
