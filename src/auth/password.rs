use argon2::{Algorithm, Argon2, Params, Version};
use rand::{rngs::OsRng, RngCore};

/// Bytes of random salt generated per account.
pub const SALT_LEN: usize = 16;
/// Bytes of derived digest stored per account.
pub const DIGEST_LEN: usize = 64;

// v1 parameters. Stored digests only compare under these values.
const V1_MEMORY_KIB: u32 = 19 * 1024;
const V1_PASSES: u32 = 2;
const V1_LANES: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("invalid key derivation parameters: {0}")]
    Params(argon2::Error),
    #[error("key derivation failed: {0}")]
    Derive(argon2::Error),
}

/// Salted Argon2id derivation with fixed parameters.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(memory_kib: u32, passes: u32, lanes: u32) -> Result<Self, HashError> {
        let params =
            Params::new(memory_kib, passes, lanes, Some(DIGEST_LEN)).map_err(HashError::Params)?;
        Ok(Self { params })
    }

    pub fn v1() -> Result<Self, HashError> {
        Self::new(V1_MEMORY_KIB, V1_PASSES, V1_LANES)
    }

    pub fn derive(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>, HashError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let mut digest = vec![0u8; DIGEST_LEN];
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut digest)
            .map_err(HashError::Derive)?;
        Ok(digest)
    }

    /// Re-derives from `password` and compares against `expected` in constant time.
    pub fn verify(&self, password: &str, salt: &[u8], expected: &[u8]) -> Result<bool, HashError> {
        let digest = self.derive(password, salt)?;
        Ok(constant_time_eq(&digest, expected))
    }
}

pub fn new_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Compares two buffers without stopping at the first differing byte.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
