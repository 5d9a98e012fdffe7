//! Chatbot conversation handlers
//!
//! Proxies the conversation to the external chatbot service. When a reply
//! carries a `data` payload, the reconciliation pipeline turns it into a
//! pending appointment for the authenticated user.

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use sqlx::PgPool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth;
use crate::db::queries;
use crate::handlers::{send_domain_error, send_error, send_success};
use crate::services::chatbot::ChatbotApi;
use crate::services::json_processor;
use crate::types::{
    AppointmentStatus, ChatMessageRequest, ChatMessageResponse, EmptyPayload, ErrorResponse,
    InitializeChatRequest, Request, ResetChatResponse,
};

/// Handle chatbot.initialize messages
pub async fn handle_initialize(
    client: Client,
    mut subscriber: Subscriber,
    chatbot: Arc<dyn ChatbotApi>,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received chatbot.initialize message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<InitializeChatRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        if auth::extract_auth(&request, &jwt_secret).is_err() {
            send_error(&client, reply, request.id, "UNAUTHORIZED", "Authentication required").await;
            continue;
        }

        if request.payload.user_info.is_empty() {
            send_error(&client, reply, request.id, "VALIDATION_ERROR", "No user info provided").await;
            continue;
        }

        match chatbot.initialize(&request.payload.user_info).await {
            Ok(response) => {
                send_success(&client, reply, request.id, response).await;
            }
            Err(e) => {
                error!("Failed to initialize chat: {}", e);
                send_domain_error(&client, reply, request.id, &e).await;
            }
        }
    }

    Ok(())
}

/// Handle chatbot.message messages
pub async fn handle_message(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    chatbot: Arc<dyn ChatbotApi>,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received chatbot.message message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<ChatMessageRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let auth_info = match auth::extract_auth(&request, &jwt_secret) {
            Ok(info) => info,
            Err(_) => {
                send_error(&client, reply, request.id, "UNAUTHORIZED", "Authentication required").await;
                continue;
            }
        };

        if request.payload.message.is_empty() {
            send_error(&client, reply, request.id, "VALIDATION_ERROR", "Missing message field").await;
            continue;
        }

        let chatbot_reply = match chatbot.send_message(&request.payload.message).await {
            Ok(reply_data) => reply_data,
            Err(e) => {
                error!("Failed to send chat message: {}", e);
                send_domain_error(&client, reply, request.id, &e).await;
                continue;
            }
        };

        // A data payload means the conversation produced an appointment
        let appointment_id = match chatbot_reply.data {
            Some(ref data) => {
                info!("Chatbot reply carries appointment data, reconciling");
                match json_processor::process_and_save_data(&pool, data, Some(auth_info.user_id))
                    .await
                {
                    Ok(appointment) => Some(appointment.id),
                    Err(e) => {
                        error!("Failed to reconcile chatbot data: {}", e);
                        send_domain_error(&client, reply, request.id, &e).await;
                        continue;
                    }
                }
            }
            None => None,
        };

        let response = ChatMessageResponse {
            reply: chatbot_reply,
            appointment_id,
        };
        send_success(&client, reply, request.id, response).await;
    }

    Ok(())
}

/// Handle chatbot.reset messages
///
/// Confirms the client's most recent pending appointment, then ends the
/// conversation on the chatbot side.
pub async fn handle_reset(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    chatbot: Arc<dyn ChatbotApi>,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received chatbot.reset message");

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

        let auth_info = match auth::extract_auth(&request, &jwt_secret) {
            Ok(info) => info,
            Err(_) => {
                send_error(&client, reply, request.id, "UNAUTHORIZED", "Authentication required").await;
                continue;
            }
        };

        let client_id = match auth_info.client_id {
            Some(id) => id,
            None => {
                send_error(&client, reply, request.id, "NOT_FOUND", "No client record for this user").await;
                continue;
            }
        };

        let pending = match queries::appointment::latest_pending_for_client(&pool, client_id).await
        {
            Ok(Some(appointment)) => appointment,
            Ok(None) => {
                send_error(&client, reply, request.id, "NOT_FOUND", "No pending appointment found for this user").await;
                continue;
            }
            Err(e) => {
                error!("Failed to look up pending appointment: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
                continue;
            }
        };

        let validated = match queries::appointment::set_status(
            &pool,
            pending.id,
            client_id,
            AppointmentStatus::Validated,
        )
        .await
        {
            Ok(Some(appointment)) => appointment,
            Ok(None) => {
                send_error(&client, reply, request.id, "NOT_FOUND", "Appointment not found").await;
                continue;
            }
            Err(e) => {
                error!("Failed to validate appointment: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
                continue;
            }
        };

        info!(
            "Appointment {} validated for client {}",
            validated.id, client_id
        );

        if let Err(e) = chatbot.reset().await {
            error!("Failed to reset chat: {}", e);
            send_domain_error(&client, reply, request.id, &e).await;
            continue;
        }

        let response = ResetChatResponse {
            message: "Appointment confirmed".to_string(),
            appointment_id: validated.id,
        };
        send_success(&client, reply, request.id, response).await;
    }

    Ok(())
}
