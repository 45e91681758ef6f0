//! Legacy key schedule for stored phone numbers.
//!
//! Documents written by the first deployment of the service index clients by
//! `hex(MD5(email))` and encrypt the phone number with AES-256-CTR, using that
//! same hex string as the password for OpenSSL's `EVP_BytesToKey` (MD5, one
//! round, no salt). Everything here exists to keep those documents readable.
//!
//! The scheme is weak:
//! - the storage key is an unsalted hash of the email, so anyone holding the
//!   document can test guesses offline;
//! - the cipher key is derived from the storage key, which is stored in the
//!   clear next to the ciphertext;
//! - there is no per-record IV, so equal inputs give equal ciphertext.
//!
//! Replacing it means swapping [`legacy_key_schedule`] and re-encrypting the
//! document; callers only see [`storage_key`], [`encrypt_phone`] and
//! [`decrypt_phone`].

use crate::error::StoreError;
use aes::cipher::{KeyIvInit, StreamCipher};
use md5::{Digest, Md5};

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

const KEY_SIZE: usize = 32;
const IV_SIZE: usize = 16;

/// Cipher key and IV for one identity.
pub struct KeySchedule {
    pub key: [u8; KEY_SIZE],
    pub iv: [u8; IV_SIZE],
}

/// Storage key of an identity: lowercase hex MD5 of its UTF-8 bytes.
pub fn storage_key(identity: &str) -> String {
    hex::encode(Md5::digest(identity.as_bytes()))
}

/// Derive AES-256-CTR key material from a storage key.
///
/// `EVP_BytesToKey` with MD5: `D1 = MD5(pw)`, `Dn = MD5(Dn-1 || pw)`; the key is
/// `D1 || D2` and the IV is `D3`.
pub fn legacy_key_schedule(storage_key: &str) -> KeySchedule {
    let password = storage_key.as_bytes();

    let mut material = Vec::with_capacity(KEY_SIZE + IV_SIZE);
    let mut previous: Vec<u8> = Vec::new();
    while material.len() < KEY_SIZE + IV_SIZE {
        let mut hasher = Md5::new();
        hasher.update(&previous);
        hasher.update(password);
        previous = hasher.finalize().to_vec();
        material.extend_from_slice(&previous);
    }

    let mut key = [0u8; KEY_SIZE];
    let mut iv = [0u8; IV_SIZE];
    key.copy_from_slice(&material[..KEY_SIZE]);
    iv.copy_from_slice(&material[KEY_SIZE..KEY_SIZE + IV_SIZE]);

    KeySchedule { key, iv }
}

fn keystream(storage_key: &str) -> Aes256Ctr {
    let schedule = legacy_key_schedule(storage_key);
    Aes256Ctr::new(&schedule.key.into(), &schedule.iv.into())
}

/// Encrypt a phone number, returning lowercase hex ciphertext.
pub fn encrypt_phone(storage_key: &str, phone: &str) -> String {
    let mut buf = phone.as_bytes().to_vec();
    keystream(storage_key).apply_keystream(&mut buf);
    hex::encode(buf)
}

/// Decrypt hex ciphertext produced by [`encrypt_phone`].
pub fn decrypt_phone(storage_key: &str, cipher_hex: &str) -> Result<String, StoreError> {
    let mut buf = hex::decode(cipher_hex)
        .map_err(|e| StoreError::Decryption(format!("ciphertext is not hex: {}", e)))?;
    keystream(storage_key).apply_keystream(&mut buf);

    String::from_utf8(buf)
        .map_err(|_| StoreError::Decryption("plaintext is not valid UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference values produced with:
    // printf '+1-555-0100' | openssl enc -aes-256-ctr -md md5 -nosalt -pass pass:<storage key>
    const IDENTITY: &str = "a@x.com";
    const STORAGE_KEY: &str = "743173788aa9166801df2e18f0e7ff24";
    const CIPHER_HEX: &str = "52d89b623210a8bfe5abad";

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key(IDENTITY), STORAGE_KEY);
        assert_eq!(storage_key("user@example.com"), "b58996c504c5638798eb6b511e6f49af");
        assert_eq!(storage_key("").len(), 32);
    }

    #[test]
    fn test_key_schedule_matches_openssl() {
        let schedule = legacy_key_schedule(STORAGE_KEY);

        assert_eq!(
            hex::encode_upper(schedule.key),
            "DBD2960B8BDAC1D4E2EBAAE816AB875873CD39A19CF4A0F2501E4A5095EDB12B"
        );
        assert_eq!(hex::encode_upper(schedule.iv), "2D007D2839E39926450BAB87FFC236D9");
    }

    #[test]
    fn test_encrypt_matches_openssl() {
        assert_eq!(encrypt_phone(STORAGE_KEY, "+1-555-0100"), CIPHER_HEX);
        assert_eq!(
            encrypt_phone("b58996c504c5638798eb6b511e6f49af", "+1-555-0100"),
            "758e777d05dd0e7c8db90a"
        );
    }

    #[test]
    fn test_decrypt_known_ciphertext() {
        assert_eq!(decrypt_phone(STORAGE_KEY, CIPHER_HEX).unwrap(), "+1-555-0100");
    }

    #[test]
    fn test_ciphertext_is_deterministic() {
        let first = encrypt_phone(STORAGE_KEY, "+44 20 7946 0958");
        let second = encrypt_phone(STORAGE_KEY, "+44 20 7946 0958");
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_ascii_round_trip() {
        let cipher = encrypt_phone(STORAGE_KEY, "☎ 0800 123");
        assert_eq!(decrypt_phone(STORAGE_KEY, &cipher).unwrap(), "☎ 0800 123");
    }

    #[test]
    fn test_decrypt_rejects_bad_hex() {
        let err = decrypt_phone(STORAGE_KEY, "zz").unwrap_err();
        assert_eq!(err.kind(), "DecryptionError");
    }
}
