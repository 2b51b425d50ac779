//! Keccak-256 hashing.

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    ethers::utils::keccak256(data)
}
