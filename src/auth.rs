//! Authentication utilities: JWT token management and password hashing

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Request;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User email
    pub email: String,
    /// Granted roles (e.g. ROLE_USER, ROLE_ADMIN)
    #[serde(default)]
    pub roles: Vec<String>,
    /// The client record owned by this user, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Issued at (unix timestamp)
    pub iat: usize,
    /// Expiration (unix timestamp)
    pub exp: usize,
}

/// Authentication result from extract_auth
#[derive(Debug, Clone)]
pub struct AuthInfo {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub client_id: Option<Uuid>,
}

/// Generate a JWT access token
pub fn generate_token(
    user_id: Uuid,
    email: &str,
    roles: &[String],
    client_id: Option<Uuid>,
    secret: &str,
) -> Result<String> {
    let now = chrono::Utc::now().timestamp() as usize;
    let exp = now + 24 * 60 * 60; // 24 hours

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        roles: roles.to_vec(),
        client_id: client_id.map(|id| id.to_string()),
        iat: now,
        exp,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate a JWT token and return claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| anyhow!("Invalid token: {}", e))?;

    Ok(token_data.claims)
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Extract authentication info from a gateway request.
///
/// The `token` field of the envelope must carry a valid JWT; there is no
/// fallback identification path.
pub fn extract_auth<T>(request: &Request<T>, jwt_secret: &str) -> Result<AuthInfo> {
    let Some(ref token) = request.token else {
        return Err(anyhow!("No authentication provided — JWT token is required"));
    };

    let claims = validate_token(token, jwt_secret)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|e| anyhow!("Invalid user_id in token: {}", e))?;
    let client_id = claims
        .client_id
        .as_deref()
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|e| anyhow!("Invalid client_id in token: {}", e))?;

    Ok(AuthInfo {
        user_id,
        email: claims.email,
        roles: claims.roles,
        client_id,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Request;
    use chrono::Utc;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-at-least-32-bytes-long";

    fn user_roles() -> Vec<String> {
        vec!["ROLE_USER".to_string()]
    }

    // ---- Password hashing tests ----

    #[test]
    fn test_hash_password_produces_valid_hash() {
        let hash = hash_password("my-secure-password").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(hash.len() > 50);
    }

    #[test]
    fn test_hash_password_different_each_time() {
        let hash1 = hash_password("same-password").unwrap();
        let hash2 = hash_password("same-password").unwrap();
        assert_ne!(hash1, hash2, "Hashes should differ due to random salt");
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = hash_password("correct-password").unwrap();
        assert!(verify_password("correct-password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("correct-password").unwrap();
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let result = verify_password("any-password", "not-a-valid-hash");
        assert!(result.is_err());
    }

    // ---- JWT token tests ----

    #[test]
    fn test_generate_and_validate_token() {
        let user_id = Uuid::new_v4();
        let token =
            generate_token(user_id, "test@example.com", &user_roles(), None, TEST_SECRET).unwrap();

        let claims = validate_token(&token, TEST_SECRET).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.roles, user_roles());
        assert!(claims.client_id.is_none());
    }

    #[test]
    fn test_generate_token_with_client_id() {
        let user_id = Uuid::new_v4();
        let client_id = Uuid::new_v4();
        let token = generate_token(
            user_id,
            "owner@example.com",
            &user_roles(),
            Some(client_id),
            TEST_SECRET,
        )
        .unwrap();

        let claims = validate_token(&token, TEST_SECRET).unwrap();
        assert_eq!(claims.client_id.unwrap(), client_id.to_string());
    }

    #[test]
    fn test_validate_token_wrong_secret() {
        let user_id = Uuid::new_v4();
        let token =
            generate_token(user_id, "test@example.com", &user_roles(), None, TEST_SECRET).unwrap();

        let result = validate_token(&token, "wrong-secret");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_token_malformed() {
        let result = validate_token("not.a.valid.token", TEST_SECRET);
        assert!(result.is_err());
    }

    // ---- extract_auth tests ----

    fn make_request_with_token<T: Default>(token: Option<String>) -> Request<T> {
        Request {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            token,
            payload: T::default(),
        }
    }

    #[test]
    fn test_extract_auth_with_valid_token() {
        let user_id = Uuid::new_v4();
        let client_id = Uuid::new_v4();
        let token = generate_token(
            user_id,
            "test@example.com",
            &user_roles(),
            Some(client_id),
            TEST_SECRET,
        )
        .unwrap();

        let request = make_request_with_token::<serde_json::Value>(Some(token));
        let auth = extract_auth(&request, TEST_SECRET).unwrap();

        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.roles, user_roles());
        assert_eq!(auth.client_id.unwrap(), client_id);
    }

    #[test]
    fn test_extract_auth_without_client() {
        let user_id = Uuid::new_v4();
        let token =
            generate_token(user_id, "test@example.com", &user_roles(), None, TEST_SECRET).unwrap();

        let request = make_request_with_token::<serde_json::Value>(Some(token));
        let auth = extract_auth(&request, TEST_SECRET).unwrap();

        assert!(auth.client_id.is_none());
    }

    #[test]
    fn test_extract_auth_no_token_fails() {
        let request = make_request_with_token::<serde_json::Value>(None);
        let result = extract_auth(&request, TEST_SECRET);
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_auth_invalid_token_fails() {
        let request = make_request_with_token::<serde_json::Value>(Some("bad-token".to_string()));
        let result = extract_auth(&request, TEST_SECRET);
        assert!(result.is_err());
    }
}
