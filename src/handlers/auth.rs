//! Authentication handlers: register, login, logout, session info

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use parking_lot::Mutex;
use sqlx::PgPool;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::auth;
use crate::db::queries;
use crate::handlers::{send_error, send_success};
use crate::types::{
    user::{AuthResponse, LoginRequest, RegisterRequest, UserPublic},
    EmptyPayload, ErrorResponse, Request,
};

// =============================================================================
// Rate limiting
// =============================================================================

/// Simple in-memory rate limiter for login attempts
pub struct RateLimiter {
    /// Map of email -> list of attempt timestamps
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
    /// Maximum attempts per window
    max_attempts: usize,
    /// Window duration in seconds
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window_secs: u64) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            max_attempts,
            window_secs,
        }
    }

    /// Check if the given key is rate limited. Returns true if allowed, false if rate limited.
    pub fn check_and_record(&self, key: &str) -> bool {
        let mut attempts = self.attempts.lock();
        let now = Instant::now();
        let window = std::time::Duration::from_secs(self.window_secs);

        let entry = attempts.entry(key.to_string()).or_default();

        // Remove expired entries
        entry.retain(|t| now.duration_since(*t) < window);

        if entry.len() >= self.max_attempts {
            return false;
        }

        entry.push(now);
        true
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle auth.register messages
pub async fn handle_register(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received auth.register message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<RegisterRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse register request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let payload = &request.payload;

        // Validate input
        if payload.email.is_empty() || payload.password.is_empty() {
            send_error(&client, reply, request.id, "VALIDATION_ERROR", "Email and password are required").await;
            continue;
        }

        if payload.password.len() < 8 {
            send_error(&client, reply, request.id, "VALIDATION_ERROR", "Password must be at least 8 characters").await;
            continue;
        }

        // Check if email already exists
        match queries::user::get_user_by_email(&pool, &payload.email).await {
            Ok(Some(_)) => {
                send_error(&client, reply, request.id, "DUPLICATE_EMAIL", "Email is already registered").await;
                continue;
            }
            Ok(None) => {} // Good, email is available
            Err(e) => {
                error!("Database error checking email: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
                continue;
            }
        }

        // Hash password
        let password_hash = match auth::hash_password(&payload.password) {
            Ok(hash) => hash,
            Err(e) => {
                error!("Failed to hash password: {}", e);
                send_error(&client, reply, request.id, "INTERNAL_ERROR", "Failed to process password").await;
                continue;
            }
        };

        // Create the client record, the user, and the optional first vehicle
        match queries::user::register_user(&pool, payload, &password_hash).await {
            Ok(user) => {
                let token = match auth::generate_token(
                    user.id,
                    &user.email,
                    &user.roles,
                    user.client_id,
                    &jwt_secret,
                ) {
                    Ok(t) => t,
                    Err(e) => {
                        error!("Failed to generate token: {}", e);
                        send_error(&client, reply, request.id, "INTERNAL_ERROR", "Failed to generate token").await;
                        continue;
                    }
                };

                let email = user.email.clone();
                let auth_response = AuthResponse {
                    token,
                    user: UserPublic::from(user),
                };
                send_success(&client, reply, request.id, auth_response).await;
                debug!("Registered user: {}", email);
            }
            Err(e) => {
                error!("Failed to register user: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
            }
        }
    }

    Ok(())
}

/// Handle auth.login messages
pub async fn handle_login(
    client: Client,
    mut subscriber: Subscriber,
    pool: PgPool,
    jwt_secret: Arc<String>,
    rate_limiter: Arc<RateLimiter>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received auth.login message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<LoginRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse login request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let payload = &request.payload;

        // Rate limiting check
        if !rate_limiter.check_and_record(&payload.email) {
            warn!("Rate limited login attempt for: {}", payload.email);
            send_error(&client, reply, request.id, "RATE_LIMITED", "Too many login attempts. Please try again later.").await;
            continue;
        }

        // Look up user by email
        let user = match queries::user::get_user_by_email(&pool, &payload.email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                send_error(&client, reply, request.id, "INVALID_CREDENTIALS", "Invalid email or password").await;
                continue;
            }
            Err(e) => {
                error!("Database error during login: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await;
                continue;
            }
        };

        // Verify password
        match auth::verify_password(&payload.password, &user.password_hash) {
            Ok(true) => {} // Password correct
            Ok(false) => {
                send_error(&client, reply, request.id, "INVALID_CREDENTIALS", "Invalid email or password").await;
                continue;
            }
            Err(e) => {
                error!("Password verification error: {}", e);
                send_error(&client, reply, request.id, "INTERNAL_ERROR", "Failed to verify password").await;
                continue;
            }
        }

        // Generate JWT
        let token = match auth::generate_token(
            user.id,
            &user.email,
            &user.roles,
            user.client_id,
            &jwt_secret,
        ) {
            Ok(t) => t,
            Err(e) => {
                error!("Failed to generate token: {}", e);
                send_error(&client, reply, request.id, "INTERNAL_ERROR", "Failed to generate token").await;
                continue;
            }
        };

        let email = user.email.clone();
        let auth_response = AuthResponse {
            token,
            user: UserPublic::from(user),
        };
        send_success(&client, reply, request.id, auth_response).await;
        debug!("Logged in user: {}", email);
    }

    Ok(())
}

/// Handle auth.logout messages
///
/// Tokens are stateless: logout validates the token and acknowledges, and
/// the caller discards the token.
pub async fn handle_logout(
    client: Client,
    mut subscriber: Subscriber,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received auth.logout message");

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
                error!("Failed to parse logout request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match auth::extract_auth(&request, &jwt_secret) {
            Ok(info) => {
                debug!("User {} logged out", info.email);
                send_success(&client, reply, request.id, serde_json::json!({ "loggedOut": true })).await;
            }
            Err(_) => {
                send_error(&client, reply, request.id, "UNAUTHORIZED", "Authentication required").await;
            }
        }
    }

    Ok(())
}

/// Handle auth.me messages - return the session user carried by the token
pub async fn handle_me(
    client: Client,
    mut subscriber: Subscriber,
    jwt_secret: Arc<String>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received auth.me message");

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
                error!("Failed to parse session request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match auth::extract_auth(&request, &jwt_secret) {
            Ok(info) => {
                let user = UserPublic {
                    id: info.user_id,
                    email: info.email,
                    roles: info.roles,
                    client_id: info.client_id,
                };
                send_success(&client, reply, request.id, user).await;
            }
            Err(_) => {
                send_error(&client, reply, request.id, "UNAUTHORIZED", "Authentication required").await;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_allows_up_to_max_attempts() {
        let limiter = RateLimiter::new(3, 60);

        assert!(limiter.check_and_record("jane@example.com"));
        assert!(limiter.check_and_record("jane@example.com"));
        assert!(limiter.check_and_record("jane@example.com"));
        assert!(!limiter.check_and_record("jane@example.com"));
    }

    #[test]
    fn test_rate_limiter_tracks_keys_independently() {
        let limiter = RateLimiter::new(1, 60);

        assert!(limiter.check_and_record("jane@example.com"));
        assert!(limiter.check_and_record("john@example.com"));
        assert!(!limiter.check_and_record("jane@example.com"));
    }
}
