use anyhow::Result;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use log::debug;
use rand::rngs::OsRng;

/// Default Argon2id memory cost in kibibytes (64 MiB)
pub const DEFAULT_MEMORY_COST: u32 = 65536;

/// One-way salted password hashing with Argon2id.
///
/// The memory cost is the tunable knob; time cost and parallelism are
/// fixed. Hashes are PHC strings carrying their own salt and parameters.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    /// Memory cost in kibibytes
    memory_cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_COST)
    }
}

impl PasswordHasher {
    pub fn new(memory_cost: u32) -> Self {
        Self { memory_cost }
    }

    /// Hash a secret with a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let argon2 = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(
                self.memory_cost, // Memory cost (kibibytes)
                2,                // Iterations
                1,                // Parallelism
                None,             // Output length (defaults to 32 bytes)
            )
            .map_err(|e| anyhow::anyhow!("Invalid Argon2 parameters: {}", e))?,
        );

        let hash = argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();

        Ok(hash)
    }

    /// Verify a secret against a stored hash.
    ///
    /// Malformed hashes are treated as a failed verification rather than
    /// an error, so callers never have to special-case corrupt records.
    pub fn verify(&self, secret: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Rejecting malformed password hash: {}", e);
                return false;
            }
        };

        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}
