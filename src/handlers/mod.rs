//! Gateway message handlers

pub mod appointment;
pub mod auth;
pub mod chatbot;
pub mod dealership;
pub mod ping;
pub mod service;
pub mod vehicle;

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subject};
use serde::Serialize;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::error::DomainError;
use crate::services::chatbot as chatbot_service;
use crate::services::chatbot::ChatbotApi;
use crate::types::{ErrorResponse, SuccessResponse};

/// Login rate limit: attempts per window
const LOGIN_MAX_ATTEMPTS: usize = 5;
const LOGIN_WINDOW_SECS: u64 = 900;

/// Reply with a success envelope
pub(crate) async fn send_success<T: Serialize>(
    client: &Client,
    reply: Subject,
    request_id: Uuid,
    payload: T,
) {
    let response = SuccessResponse::new(request_id, payload);
    match serde_json::to_vec(&response) {
        Ok(bytes) => {
            let _ = client.publish(reply, bytes.into()).await;
        }
        Err(e) => error!("Failed to serialize response: {}", e),
    }
}

/// Reply with an error envelope
pub(crate) async fn send_error(
    client: &Client,
    reply: Subject,
    request_id: Uuid,
    code: &str,
    message: impl Into<String>,
) {
    let response = ErrorResponse::new(request_id, code, message);
    match serde_json::to_vec(&response) {
        Ok(bytes) => {
            let _ = client.publish(reply, bytes.into()).await;
        }
        Err(e) => error!("Failed to serialize error response: {}", e),
    }
}

/// Reply with a domain error, mapped to its wire code
pub(crate) async fn send_domain_error(
    client: &Client,
    reply: Subject,
    request_id: Uuid,
    err: &DomainError,
) {
    send_error(client, reply, request_id, err.code(), err.to_string()).await;
}

/// Parse the envelope and resolve the authenticated client id, replying
/// with the appropriate error and skipping the message when a step fails.
macro_rules! authenticated_request {
    ($client:expr, $msg:expr, $jwt_secret:expr, $payload_ty:ty) => {{
        let reply = match $msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<$payload_ty> = match serde_json::from_slice(&$msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = $client
                    .publish(reply, serde_json::to_vec(&error)?.into())
                    .await;
                continue;
            }
        };

        let auth_info = match crate::auth::extract_auth(&request, $jwt_secret) {
            Ok(info) => info,
            Err(_) => {
                send_error(&$client, reply, request.id, "UNAUTHORIZED", "Authentication required")
                    .await;
                continue;
            }
        };

        let client_id = match auth_info.client_id {
            Some(id) => id,
            None => {
                send_error(
                    &$client,
                    reply,
                    request.id,
                    "NOT_FOUND",
                    "No client record for this user",
                )
                .await;
                continue;
            }
        };

        (reply, request, client_id)
    }};
}

pub(crate) use authenticated_request;

/// Start all message handlers
pub async fn start_handlers(client: Client, pool: PgPool, config: &Config) -> Result<()> {
    info!("Starting message handlers...");

    // Shared chatbot client (trait object: http in production, mock in dev)
    let chatbot: Arc<dyn ChatbotApi> =
        Arc::from(chatbot_service::create_chatbot_client(&config.chatbot_url));
    info!("Chatbot client initialized: {}", chatbot.name());

    let jwt_secret = Arc::new(config.jwt_secret.clone());
    let rate_limiter = Arc::new(auth::RateLimiter::new(LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW_SECS));

    // Subscribe to all subjects
    let ping_sub = client.subscribe("atelio.ping").await?;

    // Auth subjects
    let auth_register_sub = client.subscribe("atelio.auth.register").await?;
    let auth_login_sub = client.subscribe("atelio.auth.login").await?;
    let auth_logout_sub = client.subscribe("atelio.auth.logout").await?;
    let auth_me_sub = client.subscribe("atelio.auth.me").await?;

    // Vehicle subjects
    let vehicle_create_sub = client.subscribe("atelio.vehicle.create").await?;
    let vehicle_list_sub = client.subscribe("atelio.vehicle.list").await?;
    let vehicle_get_sub = client.subscribe("atelio.vehicle.get").await?;
    let vehicle_update_sub = client.subscribe("atelio.vehicle.update").await?;
    let vehicle_delete_sub = client.subscribe("atelio.vehicle.delete").await?;

    // Appointment subjects
    let appointment_create_sub = client.subscribe("atelio.appointment.create").await?;
    let appointment_list_sub = client.subscribe("atelio.appointment.list").await?;
    let appointment_get_sub = client.subscribe("atelio.appointment.get").await?;
    let appointment_update_sub = client.subscribe("atelio.appointment.update").await?;
    let appointment_delete_sub = client.subscribe("atelio.appointment.delete").await?;

    // Reference catalogue subjects
    let dealership_list_sub = client.subscribe("atelio.dealership.list").await?;
    let service_list_sub = client.subscribe("atelio.service.list").await?;

    // Chatbot subjects
    let chatbot_initialize_sub = client.subscribe("atelio.chatbot.initialize").await?;
    let chatbot_message_sub = client.subscribe("atelio.chatbot.message").await?;
    let chatbot_reset_sub = client.subscribe("atelio.chatbot.reset").await?;

    info!("Subscribed to gateway subjects");

    // Spawn handlers
    let mut handlers: Vec<(&'static str, JoinHandle<Result<()>>)> = Vec::new();

    handlers.push((
        "ping",
        tokio::spawn(ping::handle_ping(client.clone(), ping_sub)),
    ));

    handlers.push((
        "auth.register",
        tokio::spawn(auth::handle_register(
            client.clone(),
            auth_register_sub,
            pool.clone(),
            Arc::clone(&jwt_secret),
        )),
    ));
    handlers.push((
        "auth.login",
        tokio::spawn(auth::handle_login(
            client.clone(),
            auth_login_sub,
            pool.clone(),
            Arc::clone(&jwt_secret),
            Arc::clone(&rate_limiter),
        )),
    ));
    handlers.push((
        "auth.logout",
        tokio::spawn(auth::handle_logout(
            client.clone(),
            auth_logout_sub,
            Arc::clone(&jwt_secret),
        )),
    ));
    handlers.push((
        "auth.me",
        tokio::spawn(auth::handle_me(
            client.clone(),
            auth_me_sub,
            Arc::clone(&jwt_secret),
        )),
    ));

    handlers.push((
        "vehicle.create",
        tokio::spawn(vehicle::handle_create(
            client.clone(),
            vehicle_create_sub,
            pool.clone(),
            Arc::clone(&jwt_secret),
        )),
    ));
    handlers.push((
        "vehicle.list",
        tokio::spawn(vehicle::handle_list(
            client.clone(),
            vehicle_list_sub,
            pool.clone(),
            Arc::clone(&jwt_secret),
        )),
    ));
    handlers.push((
        "vehicle.get",
        tokio::spawn(vehicle::handle_get(
            client.clone(),
            vehicle_get_sub,
            pool.clone(),
            Arc::clone(&jwt_secret),
        )),
    ));
    handlers.push((
        "vehicle.update",
        tokio::spawn(vehicle::handle_update(
            client.clone(),
            vehicle_update_sub,
            pool.clone(),
            Arc::clone(&jwt_secret),
        )),
    ));
    handlers.push((
        "vehicle.delete",
        tokio::spawn(vehicle::handle_delete(
            client.clone(),
            vehicle_delete_sub,
            pool.clone(),
            Arc::clone(&jwt_secret),
        )),
    ));

    handlers.push((
        "appointment.create",
        tokio::spawn(appointment::handle_create(
            client.clone(),
            appointment_create_sub,
            pool.clone(),
            Arc::clone(&jwt_secret),
        )),
    ));
    handlers.push((
        "appointment.list",
        tokio::spawn(appointment::handle_list(
            client.clone(),
            appointment_list_sub,
            pool.clone(),
            Arc::clone(&jwt_secret),
        )),
    ));
    handlers.push((
        "appointment.get",
        tokio::spawn(appointment::handle_get(
            client.clone(),
            appointment_get_sub,
            pool.clone(),
            Arc::clone(&jwt_secret),
        )),
    ));
    handlers.push((
        "appointment.update",
        tokio::spawn(appointment::handle_update(
            client.clone(),
            appointment_update_sub,
            pool.clone(),
            Arc::clone(&jwt_secret),
        )),
    ));
    handlers.push((
        "appointment.delete",
        tokio::spawn(appointment::handle_delete(
            client.clone(),
            appointment_delete_sub,
            pool.clone(),
            Arc::clone(&jwt_secret),
        )),
    ));

    handlers.push((
        "dealership.list",
        tokio::spawn(dealership::handle_list(
            client.clone(),
            dealership_list_sub,
            pool.clone(),
        )),
    ));
    handlers.push((
        "service.list",
        tokio::spawn(service::handle_list(
            client.clone(),
            service_list_sub,
            pool.clone(),
        )),
    ));

    handlers.push((
        "chatbot.initialize",
        tokio::spawn(chatbot::handle_initialize(
            client.clone(),
            chatbot_initialize_sub,
            Arc::clone(&chatbot),
            Arc::clone(&jwt_secret),
        )),
    ));
    handlers.push((
        "chatbot.message",
        tokio::spawn(chatbot::handle_message(
            client.clone(),
            chatbot_message_sub,
            pool.clone(),
            Arc::clone(&chatbot),
            Arc::clone(&jwt_secret),
        )),
    ));
    handlers.push((
        "chatbot.reset",
        tokio::spawn(chatbot::handle_reset(
            client.clone(),
            chatbot_reset_sub,
            pool.clone(),
            Arc::clone(&chatbot),
            Arc::clone(&jwt_secret),
        )),
    ));

    info!("All handlers started");

    // The worker runs until a handler exits; that only happens on a broken
    // subscription, so surface which one and shut down.
    let names: Vec<&'static str> = handlers.iter().map(|(name, _)| *name).collect();
    let handles: Vec<_> = handlers.into_iter().map(|(_, handle)| handle).collect();
    let (result, index, _remaining) = futures::future::select_all(handles).await;
    error!("{} handler finished: {:?}", names[index], result);

    Ok(())
}
