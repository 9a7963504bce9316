/// Checks a plaintext password against a stored hash.
pub trait PasswordVerifier: Send + Sync + 'static {
    /// # Errors
    /// The stored hash is unreadable.
    fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool>;
}

/// Verifier for `$2a$`/`$2b$`/`$2y$` bcrypt hashes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BcryptVerifier;

impl PasswordVerifier for BcryptVerifier {
    fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
        Ok(bcrypt::verify(password, hash)?)
    }
}
