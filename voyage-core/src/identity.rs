use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voyage_shared::Masked;

use crate::{CoreError, CoreResult};

pub const CUSTOMER_ROLE: &str = "CUSTOMER";
pub const MIN_PASSWORD_LEN: usize = 8;

/// A registered account. The password hash never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: Masked<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<Masked<String>>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for account creation, after validation and hashing.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            email: Masked(self.email),
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone.map(Masked),
            role: CUSTOMER_ROLE.to_string(),
            created_at: Utc::now(),
            last_login_at: None,
        }
    }
}

/// Lower-cases and trims an email, rejecting anything without a local part and a dotted domain.
pub fn normalize_email(raw: &str) -> CoreResult<String> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !domain.contains('@')
        }
        None => false,
    };

    if !valid || email.chars().any(char::is_whitespace) {
        return Err(CoreError::ValidationError("A valid email address is required".to_string()));
    }
    Ok(email)
}

pub fn validate_password(plain: &str) -> CoreResult<()> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id into a PHC string.
pub fn hash_password(plain: &str) -> CoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CoreError::InternalError(format!("Password hashing failed: {}", e)))
}

/// Returns false for a wrong password and for an unparseable stored hash.
pub fn verify_password(plain: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

// ============================================================================
// JWT
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> CoreResult<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| CoreError::Unauthorized("Token subject is not a user id".to_string()))
    }

    /// Seconds until the token expires, never negative.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        let exp = self.exp as i64;
        (exp - now.timestamp()).max(0) as u64
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    expiration_seconds: u64,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, expiration_seconds: u64) -> Self {
        Self {
            secret: secret.into(),
            expiration_seconds,
        }
    }

    pub fn issue(&self, user: &User) -> CoreResult<IssuedToken> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> CoreResult<IssuedToken> {
        let expires_at = now + Duration::seconds(self.expiration_seconds as i64);
        let jti = Uuid::new_v4().to_string();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.expose().clone(),
            role: user.role.clone(),
            jti: jti.clone(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CoreError::InternalError(format!("Token encoding failed: {}", e)))?;

        Ok(IssuedToken { token, jti, expires_at })
    }

    pub fn verify(&self, token: &str) -> CoreResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| CoreError::Unauthorized(e.to_string()))
    }
}
