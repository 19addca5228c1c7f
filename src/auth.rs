use actix_web::{dev::ServiceRequest, web, Error, HttpMessage, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, info, warn};
use rand::{rngs::OsRng, RngCore};
use std::fmt;

use crate::config::Config;
use crate::errors::{ApiError, ApiResult};
use crate::models::Claims;

pub const MIN_SIGNING_KEY_LEN: usize = 32;
pub const GENERATED_SIGNING_KEY_LEN: usize = 64;
pub const SALT_LEN: usize = 32;
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug)]
pub enum KeyError {
    InvalidBase64(&'static str, base64::DecodeError),
    KeyTooShort(usize),
    WeakKey,
    KeyFile(String, std::io::Error),
    InvalidSaltLength(usize),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::InvalidBase64(var, err) => write!(f, "{} is not valid base64: {}", var, err),
            KeyError::KeyTooShort(len) => write!(
                f,
                "signing key must be at least {} bytes, got {}",
                MIN_SIGNING_KEY_LEN, len
            ),
            KeyError::WeakKey => write!(f, "signing key appears to be a placeholder value"),
            KeyError::KeyFile(path, err) => write!(f, "failed to read signing key file {}: {}", path, err),
            KeyError::InvalidSaltLength(len) => {
                write!(f, "invalid salt length: expected {} bytes, got {}", SALT_LEN, len)
            }
        }
    }
}

impl std::error::Error for KeyError {}

/// Token signing key and password salt, created once at startup.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    salt: [u8; SALT_LEN],
}

impl AuthKeys {
    pub fn new(signing_key: &[u8], salt: [u8; SALT_LEN]) -> Result<Self, KeyError> {
        if signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(KeyError::KeyTooShort(signing_key.len()));
        }
        if String::from_utf8_lossy(signing_key).contains("change-this") {
            return Err(KeyError::WeakKey);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(signing_key),
            decoding: DecodingKey::from_secret(signing_key),
            salt,
        })
    }

    /// Loads key material from the config, generating whatever is missing.
    pub fn from_config(config: &Config) -> Result<Self, KeyError> {
        let signing_key = load_or_generate_signing_key(config)?;
        let salt = load_or_generate_salt(config)?;
        Self::new(&signing_key, salt)
    }

    pub fn salt(&self) -> [u8; SALT_LEN] {
        self.salt
    }

    pub fn issue_token(&self, subject: &str) -> ApiResult<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
            .ok_or(ApiError::Internal)?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    pub fn verify_token(&self, token: &str) -> ApiResult<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(token_data.claims)
    }
}

fn load_or_generate_signing_key(config: &Config) -> Result<Vec<u8>, KeyError> {
    if let Some(encoded) = config.auth_private_key.as_deref() {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|e| KeyError::InvalidBase64("AUTH_PRIVATE_KEY", e))?;
        info!("Loaded signing key from configuration");
        return Ok(key);
    }

    if let Some(path) = config.auth_private_key_file.as_deref() {
        let key = std::fs::read(path).map_err(|e| KeyError::KeyFile(path.to_string(), e))?;
        info!("Loaded signing key from file {}", path);
        return Ok(key);
    }

    let mut key = vec![0u8; GENERATED_SIGNING_KEY_LEN];
    OsRng.fill_bytes(&mut key);
    warn!("Generated new signing key; issued tokens will not survive a restart");
    Ok(key)
}

fn load_or_generate_salt(config: &Config) -> Result<[u8; SALT_LEN], KeyError> {
    if let Some(encoded) = config.auth_salt.as_deref() {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| KeyError::InvalidBase64("AUTH_SALT", e))?;
        let salt: [u8; SALT_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSaltLength(bytes.len()))?;
        info!("Loaded password salt from configuration");
        return Ok(salt);
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    warn!("Generated new password salt; users registered now cannot log in after a restart");
    Ok(salt)
}

// Middleware for JWT authentication
pub async fn jwt_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let Some(keys) = req.app_data::<web::Data<AuthKeys>>().cloned() else {
        log::error!("AuthKeys missing from application data");
        return Err((ApiError::Internal.into(), req));
    };

    match keys.verify_token(credentials.token()) {
        Ok(claims) => {
            debug!("JWT token validated for subject: {}", claims.sub);
            req.extensions_mut().insert(claims);
            Ok(req)
        }
        Err(err) => {
            debug!("Rejected bearer token: {}", err);
            let err = match err {
                ApiError::Unauthorized(_) => err,
                _ => ApiError::Unauthorized("Invalid token".to_string()),
            };
            Err((err.into(), req))
        }
    }
}

// Helper function to extract claims from request
pub fn extract_claims(req: &HttpRequest) -> ApiResult<Claims> {
    req.extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
}

impl From<KeyError> for ApiError {
    fn from(err: KeyError) -> Self {
        log::error!("Auth key error: {}", err);
        ApiError::Internal
    }
}
