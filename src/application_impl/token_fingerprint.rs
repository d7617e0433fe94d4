use sha2::{Digest, Sha256};

/// Store identity of a token: hex SHA-256 of its bytes. Raw tokens never reach
/// the revocation store.
pub fn token_fingerprint(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_hex_sha256() {
        assert_eq!(
            token_fingerprint("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(token_fingerprint("abc"), token_fingerprint("abd"));
    }
}
