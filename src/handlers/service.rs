//! Service catalogue handlers

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use sqlx::PgPool;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::db::queries;
use crate::handlers::{send_error, send_success};
use crate::types::{EmptyPayload, ErrorResponse, Request, ServiceListResponse};

/// Handle service.list messages
pub async fn handle_list(client: Client, mut subscriber: Subscriber, pool: PgPool) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received service.list message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<EmptyPayload> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match queries::service::list_services(&pool).await {
            Ok(services) => {
                let total = services.len() as i64;
                let response = ServiceListResponse {
                    items: services,
                    total,
                };
                send_success(&client, reply, request.id, response).await;
            }
            Err(e) => {
                error!("Failed to list services: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
            }
        }
    }

    Ok(())
}
