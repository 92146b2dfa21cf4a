use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

pub mod models;

use models::Account;

/// Account store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Account already exists")]
    AlreadyExists,

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt account store: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable mapping from account identifier to account record.
///
/// Identifiers are expected to be normalized (trimmed, lowercased) before
/// they reach the repository. Any mutation is persisted synchronously
/// before the call returns.
#[cfg_attr(test, mockall::automock)]
pub trait AccountRepository: Send {
    /// Look up an account by identifier.
    fn find(&self, email: &str) -> Option<Account>;

    /// Insert a new account and persist the snapshot.
    fn insert(&mut self, account: Account) -> Result<(), StoreError>;

    /// Replace an account record and persist the snapshot.
    fn update(&mut self, account: &Account) -> Result<(), StoreError>;
}

/// File-backed account store: an in-memory map mirrored to a JSON snapshot
/// file. Every mutation rewrites the whole file.
pub struct FileStore {
    path: PathBuf,
    accounts: HashMap<String, Account>,
}

impl FileStore {
    /// Open the store at `path`, creating the directory and an empty
    /// collection on first use, and load all records into memory.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        ensure_backing_file(&path)?;

        let raw = fs::read_to_string(&path)?;
        let records: Vec<Account> = serde_json::from_str(&raw)?;

        let mut accounts = HashMap::with_capacity(records.len());
        for record in records {
            accounts.insert(record.email.clone(), record);
        }

        debug!("Loaded {} account(s) from {}", accounts.len(), path.display());
        Ok(Self { path, accounts })
    }

    /// Serialize the full record set to the backing file, overwriting prior
    /// content.
    fn persist(&self) -> Result<(), StoreError> {
        let mut records: Vec<&Account> = self.accounts.values().collect();
        // Stable ordering keeps snapshots diffable across rewrites
        records.sort_by(|a, b| a.email.cmp(&b.email));

        let serialized = serde_json::to_string_pretty(&records)?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountRepository for FileStore {
    fn find(&self, email: &str) -> Option<Account> {
        self.accounts.get(email).cloned()
    }

    fn insert(&mut self, account: Account) -> Result<(), StoreError> {
        if self.accounts.contains_key(&account.email) {
            return Err(StoreError::AlreadyExists);
        }

        let email = account.email.clone();
        self.accounts.insert(email.clone(), account);

        if let Err(e) = self.persist() {
            // The record is not durable, so don't pretend it exists
            self.accounts.remove(&email);
            return Err(e);
        }

        info!("Account created: {}", email);
        Ok(())
    }

    fn update(&mut self, account: &Account) -> Result<(), StoreError> {
        self.accounts
            .insert(account.email.clone(), account.clone());
        self.persist()
    }
}

fn ensure_backing_file(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    if !path.exists() {
        fs::write(path, "[]")?;
        info!("Created account store at {}", path.display());
    }

    Ok(())
}
