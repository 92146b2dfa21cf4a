//! Credential authentication with per-account lockout protection.
//!
//! The core is a small state machine: a per-account counter of failed
//! login attempts that escalates to a timed lockout, lazily expired on
//! read and persisted as a full JSON snapshot on every mutation.
//!
//! - [`security::password`] — Argon2id hashing and verification
//! - [`store`] — the injected account repository and its file-backed impl
//! - [`policy`] — the lockout state machine
//! - [`auth`] — the authentication gate tying the three together

pub mod auth;
pub mod cli;
pub mod config;
pub mod policy;
pub mod security;
pub mod store;
