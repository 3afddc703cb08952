use sha2::{Digest, Sha256};
use tallyscan_core::DocumentType;

/// SHA-256 of an in-memory byte slice.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Lowercase hex (64 chars).
pub fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Cache key for a parse. The document type and the parser configuration
/// digest both change the resulting transactions, so both are hashed in.
pub fn cache_key(data: &[u8], document_type: DocumentType, config_digest: &[u8; 32]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.update(b"\0");
    hasher.update(document_type.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(config_digest);
    let hash: [u8; 32] = hasher.finalize().into();
    to_hex(&hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_bytes_known_vector() {
        let hex = to_hex(&sha256_bytes(b""));
        assert_eq!(hex, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    }

    #[test]
    fn cache_key_covers_bytes_type_and_config() {
        let config = sha256_bytes(b"config");
        let bank = cache_key(b"statement", DocumentType::Bank, &config);
        assert_eq!(bank, cache_key(b"statement", DocumentType::Bank, &config));
        assert_ne!(bank, cache_key(b"statement", DocumentType::CreditCard, &config));
        assert_ne!(bank, cache_key(b"statement!", DocumentType::Bank, &config));
        assert_ne!(bank, cache_key(b"statement", DocumentType::Bank, &sha256_bytes(b"other")));
        assert_eq!(bank.len(), 64);
    }
}
