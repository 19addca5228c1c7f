use argon2::{Algorithm, Argon2, Params, Version};

use crate::errors::ApiResult;

pub const PASSWORD_HASH_LEN: usize = 32;

/// Deterministic Argon2id digest keyed by the process-wide salt.
///
/// The same password always produces the same bytes for a given salt, so
/// stored users can be looked up by `name + hash` directly.
#[derive(Clone)]
pub struct PasswordHasher {
    salt: [u8; 32],
    params: Params,
}

impl PasswordHasher {
    pub fn new(salt: [u8; 32]) -> Self {
        Self::with_params(salt, Params::default())
    }

    pub fn with_params(salt: [u8; 32], params: Params) -> Self {
        Self { salt, params }
    }

    pub fn hash(&self, password: &str) -> ApiResult<Vec<u8>> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let mut out = vec![0u8; PASSWORD_HASH_LEN];
        argon2.hash_password_into(password.as_bytes(), &self.salt, &mut out)?;
        Ok(out)
    }
}
