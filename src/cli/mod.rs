// Command handlers wiring the authentication gate to the terminal.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::error;

use crate::auth::{AuthGate, Decision, RegisterError, RejectReason};
use crate::store::AccountRepository;

mod utils;

use utils::read_password;

/// Handle account registration.
pub fn register<R: AccountRepository>(gate: &AuthGate<R>, email: &str) -> Result<()> {
    let password = read_password("Password: ").context("Failed to read password")?;
    let confirm = read_password("Confirm password: ").context("Failed to read password")?;

    if password != confirm {
        return Err(anyhow!("Passwords do not match"));
    }

    match gate.register(email, &password) {
        Ok(user) => {
            println!("Account created: {} ({})", user.email, user.id);
            Ok(())
        }
        Err(e @ RegisterError::Store(_)) => {
            error!("Registration failed: {}", e);
            Err(e.into())
        }
        Err(e) => Err(anyhow!("Registration failed: {}", e)),
    }
}

/// Handle a login attempt.
pub fn login<R: AccountRepository>(gate: &AuthGate<R>, email: &str) -> Result<()> {
    let password = read_password("Password: ").context("Failed to read password")?;

    match gate.authenticate(email, &password, Utc::now())? {
        Decision::Accepted(user) => {
            println!("Login successful: {} ({})", user.email, user.id);
            Ok(())
        }
        Decision::Rejected(RejectReason::Locked { remaining_ms }) => {
            let seconds = (remaining_ms + 999) / 1000;
            Err(anyhow!(
                "Account is locked. Try again in {} second(s)",
                seconds
            ))
        }
        // NotFound and BadCredentials are deliberately indistinguishable
        Decision::Rejected(_) => Err(anyhow!("Invalid email or password")),
    }
}

/// Print the lock status of an account as JSON.
pub fn status<R: AccountRepository>(gate: &AuthGate<R>, email: &str) -> Result<()> {
    let status = gate.lock_status(email, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

/// Administratively unlock an account.
pub fn unlock<R: AccountRepository>(gate: &AuthGate<R>, email: &str) -> Result<()> {
    if gate.unlock(email)? {
        println!("Account unlocked: {}", email);
    } else {
        println!("No such account: {}", email);
    }
    Ok(())
}
