//! Signer identities for a launch run
//!
//! Key material lives only in process memory. Decoded secret bytes are
//! zeroized as soon as the keypair is built, and `Debug` output never
//! includes anything but public keys.

use crate::errors::MintError;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::fmt;
use std::path::Path;
use zeroize::Zeroize;

/// Length of an encoded ed25519 keypair (32-byte seed + 32-byte public key)
pub const KEYPAIR_LEN: usize = 64;

/// Decode a secret key from base58 text or a JSON byte array
///
/// Both encodings must decode to exactly 64 bytes forming a consistent
/// ed25519 keypair.
pub fn decode_secret_key(text: &str) -> Result<Keypair, MintError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MintError::KeyFormat("secret key is empty".to_string()));
    }

    let mut bytes: Vec<u8> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)
            .map_err(|e| MintError::KeyFormat(format!("invalid JSON byte array: {}", e)))?
    } else {
        bs58::decode(trimmed)
            .into_vec()
            .map_err(|e| MintError::KeyFormat(format!("invalid base58: {}", e)))?
    };

    let result = keypair_from_bytes(&bytes);
    bytes.zeroize();
    result
}

fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair, MintError> {
    if bytes.len() != KEYPAIR_LEN {
        return Err(MintError::KeyFormat(format!(
            "expected {} bytes, got {}",
            KEYPAIR_LEN,
            bytes.len()
        )));
    }
    if bytes.iter().all(|&b| b == 0) {
        return Err(MintError::KeyFormat("all-zero key rejected".to_string()));
    }
    Keypair::try_from(bytes)
        .map_err(|e| MintError::KeyFormat(format!("not a valid ed25519 keypair: {}", e)))
}

/// Fee payer and mint authority for the run
pub struct PayerIdentity {
    keypair: Keypair,
}

impl PayerIdentity {
    /// Create from secret key text (base58 or JSON array)
    pub fn from_secret_text(text: &str) -> Result<Self, MintError> {
        decode_secret_key(text).map(Self::from_keypair)
    }

    /// Create from a keypair file as written by `solana-keygen`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MintError> {
        let path = path.as_ref();
        let mut content = std::fs::read_to_string(path).map_err(|e| {
            MintError::KeyFormat(format!("failed to read keypair file {}: {}", path.display(), e))
        })?;
        let result = Self::from_secret_text(&content);
        content.zeroize();
        result
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl fmt::Debug for PayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayerIdentity")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

/// Freshly generated signer for the new mint account
///
/// Generated once per run, never persisted. Not `Clone`: the same mint key
/// must not be shared between concurrent launches.
pub struct MintIdentity {
    keypair: Keypair,
}

impl MintIdentity {
    pub fn generate() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl fmt::Debug for MintIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MintIdentity")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_decode_base58_secret_key() {
        let keypair = Keypair::new();
        let encoded = keypair.to_base58_string();

        let decoded = decode_secret_key(&encoded).unwrap();
        assert_eq!(decoded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_decode_json_secret_key() {
        let keypair = Keypair::new();
        let json = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();

        let decoded = decode_secret_key(&json).unwrap();
        assert_eq!(decoded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let short = bs58::encode([7u8; 32]).into_string();
        let err = decode_secret_key(&short).unwrap_err();
        assert!(matches!(err, MintError::KeyFormat(ref m) if m.contains("got 32")));

        let err = decode_secret_key("[1,2,3]").unwrap_err();
        assert!(matches!(err, MintError::KeyFormat(_)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            decode_secret_key("not-base58-0OIl"),
            Err(MintError::KeyFormat(_))
        ));
        assert!(matches!(decode_secret_key("   "), Err(MintError::KeyFormat(_))));
        assert!(matches!(
            decode_secret_key(&bs58::encode([0u8; 64]).into_string()),
            Err(MintError::KeyFormat(_))
        ));
    }

    #[test]
    fn test_mismatched_public_half_rejected() {
        let mut bytes = Keypair::new().to_bytes();
        bytes[32..].copy_from_slice(&Keypair::new().pubkey().to_bytes());
        let encoded = bs58::encode(bytes).into_string();
        assert!(matches!(
            decode_secret_key(&encoded),
            Err(MintError::KeyFormat(_))
        ));
    }

    #[test]
    fn test_payer_from_file() {
        let keypair = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap()).unwrap();

        let payer = PayerIdentity::from_file(file.path()).unwrap();
        assert_eq!(payer.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let keypair = Keypair::new();
        let secret = keypair.to_base58_string();
        let payer = PayerIdentity::from_keypair(keypair);

        let debug = format!("{:?}", payer);
        assert!(debug.contains(&payer.pubkey().to_string()));
        assert!(!debug.contains(&secret));
    }

    #[test]
    fn test_mint_identities_are_unique() {
        let a = MintIdentity::generate();
        let b = MintIdentity::generate();
        assert_ne!(a.pubkey(), b.pubkey());
    }
}
