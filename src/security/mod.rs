// Security primitives: credential hashing and verification.

pub mod password;

pub use password::PasswordHasher;
