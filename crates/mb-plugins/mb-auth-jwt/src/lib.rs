//! # mb-auth-jwt
//!
//! Argon2-based implementation of `AuthProvider` with HS256 bearer tokens.
//! Passwords exist at rest only as PHC hash strings; tokens embed the admin
//! identity and expire after one day.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use mb_core::error::{AppError, Result};
use mb_core::traits::AuthProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Admin id.
    sub: Uuid,
    /// Unix expiry, validated by `decode`.
    exp: i64,
}

pub struct JwtAuthProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtAuthProvider {
    /// Accepts the server-held signing secret (e.g., from an environment
    /// variable).
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    fn issue_with_exp(&self, admin_id: Uuid, exp: i64) -> Result<String> {
        let claims = Claims { sub: admin_id, exp };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("token encode: {e}")))
    }
}

impl AuthProvider for JwtAuthProvider {
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hash: {e}")))
    }

    /// Argon2's verify is constant-effort over the hash parameters, so
    /// wrong-password and unknown-user paths cost the same.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn issue_token(&self, admin_id: Uuid) -> Result<String> {
        let exp = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp();
        self.issue_with_exp(admin_id, exp)
    }

    fn verify_token(&self, token: &str) -> Result<Uuid> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims.sub)
            .map_err(|_| AppError::Unauthenticated("Invalid token".to_string()))
    }
}
