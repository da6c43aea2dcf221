//! Transaction identifiers.

use std::fmt;

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::ledger::types::Identity;

const NONCE_LEN: usize = 24;

/// A single-use transaction identifier.
///
/// The id is the hex SHA-256 of a fresh random nonce followed by the
/// creator's certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId {
    id: String,
    nonce: [u8; NONCE_LEN],
    creator: String,
}

impl TransactionId {
    /// Mint a new id bound to `identity`.
    pub fn mint(identity: &Identity) -> Self {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let mut hasher = Sha256::new();
        hasher.update(nonce);
        hasher.update(&identity.certificate);
        let id = hex::encode(hasher.finalize());

        Self {
            id,
            nonce,
            creator: identity.username.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    /// Username of the identity the id was minted for.
    pub fn creator(&self) -> &str {
        &self.creator
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn identity() -> Identity {
        Identity {
            username: "user1".into(),
            msp_id: "Org1MSP".into(),
            certificate: b"-----BEGIN CERTIFICATE-----".to_vec(),
            enrolled: true,
        }
    }

    #[test]
    fn test_id_is_hash_of_nonce_and_creator() {
        let identity = identity();
        let tx_id = TransactionId::mint(&identity);

        let mut hasher = Sha256::new();
        hasher.update(tx_id.nonce());
        hasher.update(&identity.certificate);
        assert_eq!(tx_id.as_str(), hex::encode(hasher.finalize()));
        assert_eq!(tx_id.as_str().len(), 64);
        assert_eq!(tx_id.creator(), "user1");
    }

    #[test]
    fn test_ids_are_unique() {
        let identity = identity();
        let ids: HashSet<_> = (0..1000)
            .map(|_| TransactionId::mint(&identity).to_string())
            .collect();
        assert_eq!(ids.len(), 1000);
    }
}
