use sha2::{Digest, Sha256};

/// Maps an opaque client identity to its filesystem-safe storage key.
///
/// Total and deterministic: every string, the empty one included, digests to
/// a 64-character lowercase hex SHA-256. The key doubles as the session
/// directory name, so it must never contain path separators or depend on
/// anything but the identity itself.
pub fn storage_key(identity: &str) -> String {
    hex::encode(Sha256::digest(identity.as_bytes()))
}
