//! secp256k1 signatures over EIP-191 personal messages.
//!
//! Ledger actions carry a 65-byte `r || s || v` signature over a base string
//! (see the `signature_base` helpers in `quill-types`). The signer's address
//! is the author/member of the action.

use ethers::signers::LocalWallet;
use ethers::types::{Address, Signature};
use ethers::utils::hash_message;

use crate::CryptoError;

/// Recover the address that signed `message` with `signature`.
///
/// Accepts both `v ∈ {27, 28}` and the raw recovery id `v ∈ {0, 1}`.
pub fn recover_signer(message: &str, signature: &[u8]) -> Result<Address, CryptoError> {
    if signature.len() != 65 {
        return Err(CryptoError::MalformedSignature(format!(
            "expected 65 bytes, got {}",
            signature.len()
        )));
    }
    let mut raw = [0u8; 65];
    raw.copy_from_slice(signature);
    if raw[64] < 27 {
        raw[64] += 27;
    }
    let sig = Signature::try_from(&raw[..])
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
    sig.recover(message)
        .map_err(|e| CryptoError::Recovery(e.to_string()))
}

/// Sign `message` as an EIP-191 personal message, returning `r || s || v`.
pub fn sign_personal(wallet: &LocalWallet, message: &str) -> Result<Vec<u8>, CryptoError> {
    let sig = wallet
        .sign_hash(hash_message(message))
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    Ok(sig.to_vec())
}
