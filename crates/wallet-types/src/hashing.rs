//! Deterministic hashing used by the simulated wallet and ledger.
//!
//! Signatures here are keyed digests, not public-key signatures; they only need
//! to be unique per (key, message) and reproducible in tests.

use sha2::{Digest, Sha256};

use crate::ids::{Blockhash, Signature};

const SIGNATURE_TAG_LO: &[u8] = b"wallet.session.sig.lo.v1";
const SIGNATURE_TAG_HI: &[u8] = b"wallet.session.sig.hi.v1";
const BLOCKHASH_TAG: &[u8] = b"wallet.session.blockhash.v1";

pub fn sha256_32(bytes: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// 64-byte keyed digest over `message`.
pub fn simulated_signature_bytes(secret: &[u8; 32], message: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&tagged_digest(SIGNATURE_TAG_LO, secret, message));
    out[32..].copy_from_slice(&tagged_digest(SIGNATURE_TAG_HI, secret, message));
    out
}

pub fn simulated_signature(secret: &[u8; 32], message: &[u8]) -> Signature {
    Signature::from_bytes(&simulated_signature_bytes(secret, message))
}

pub fn derive_blockhash(seed: &[u8], block_height: u64) -> Blockhash {
    let mut enc = Vec::with_capacity(BLOCKHASH_TAG.len() + seed.len() + 8);
    enc.extend_from_slice(BLOCKHASH_TAG);
    enc.extend_from_slice(seed);
    enc.extend_from_slice(&block_height.to_be_bytes());
    Blockhash::from_bytes(&sha256_32(&enc))
}

fn tagged_digest(tag: &[u8], secret: &[u8; 32], message: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(tag);
    hasher.update(secret);
    hasher.update((message.len() as u32).to_be_bytes());
    hasher.update(message);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::{derive_blockhash, simulated_signature, simulated_signature_bytes};

    #[test]
    fn signatures_depend_on_key_and_message() {
        let a = simulated_signature(&[1u8; 32], b"hello");
        assert_eq!(a, simulated_signature(&[1u8; 32], b"hello"));
        assert_ne!(a, simulated_signature(&[2u8; 32], b"hello"));
        assert_ne!(a, simulated_signature(&[1u8; 32], b"hellp"));
        assert_eq!(a.to_bytes().len(), 64);
        let raw = simulated_signature_bytes(&[1u8; 32], b"hello");
        assert_ne!(raw[..32], raw[32..]);
    }

    #[test]
    fn blockhash_changes_with_height() {
        assert_ne!(derive_blockhash(b"seed", 1), derive_blockhash(b"seed", 2));
        assert_eq!(derive_blockhash(b"seed", 7), derive_blockhash(b"seed", 7));
    }
}
