//! Client phone number vault.
//!
//! A single JSON document maps storage keys (hashed email identities) to
//! records holding an encrypted phone number:
//! - [`Repository`] loads, mutates and saves the document with no knowledge of
//!   encryption
//! - [`EncryptedRepository`] wraps it, turning identities into storage keys and
//!   phone numbers into ciphertext
//! - [`legacy`] holds the key schedule that existing documents were written with

mod encrypted;
mod error;
pub mod legacy;
mod record;
mod repository;

pub use encrypted::EncryptedRepository;
pub use error::{DocumentError, StoreError};
pub use record::Record;
pub use repository::Repository;
