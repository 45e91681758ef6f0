//! Encrypting decorator over the client repository.

use crate::error::StoreError;
use crate::legacy::{decrypt_phone, encrypt_phone, storage_key};
use crate::record::Record;
use crate::repository::Repository;
use tracing::{debug, warn};

/// Repository view that stores phone numbers encrypted per identity.
///
/// Identities never reach the wrapped [`Repository`]; it only sees storage keys
/// and ciphertext.
#[derive(Debug)]
pub struct EncryptedRepository {
    inner: Repository,
}

impl EncryptedRepository {
    pub fn new(inner: Repository) -> Self {
        Self { inner }
    }

    /// The wrapped repository.
    pub fn repository(&self) -> &Repository {
        &self.inner
    }

    /// Encrypt and store a phone number under an identity, in memory only.
    pub fn add(&mut self, identity: &str, phone: &str) -> &mut Self {
        let key = storage_key(identity);
        let cipher_phone = encrypt_phone(&key, phone);
        debug!(storage_key = %key, "Storing encrypted phone number");

        self.inner.add(key, Record::new(cipher_phone));
        self
    }

    /// Look up and decrypt the phone number stored for an identity.
    pub fn get_by_email(&self, identity: &str) -> Result<String, StoreError> {
        let key = storage_key(identity);
        let record = self.inner.get_by_email(&key)?;
        decrypt_phone(&key, &record.cipher_phone)
    }

    /// Bulk decryption is not available: it needs a private key that this
    /// scheme does not have. The `data` field of each record is reserved for
    /// such an envelope and is never written.
    pub fn get_all(&self) -> Result<Vec<(String, String)>, StoreError> {
        Err(StoreError::Unsupported(
            "bulk decryption requires a private key, which this store does not have",
        ))
    }

    /// Persist the wrapped repository.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.inner.save().await
    }

    /// Add then save as one step.
    ///
    /// If saving fails the in-memory entry for the identity is put back to what
    /// it was before, so memory never runs ahead of the document.
    pub async fn commit(&mut self, identity: &str, phone: &str) -> Result<(), StoreError> {
        let key = storage_key(identity);
        let previous = self.inner.get_by_email(&key).ok().cloned();

        self.add(identity, phone);

        if let Err(e) = self.inner.save().await {
            warn!(storage_key = %key, error = %e, "Save failed, rolling back in-memory entry");
            self.inner.restore(&key, previous);
            return Err(e);
        }

        Ok(())
    }
}
