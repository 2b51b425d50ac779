//! DNA derivation for articles and groups.

use quill_types::Dna;

use crate::{encode_base36, keccak256};

/// DNA of an article: base36 of keccak256(`signature_hex` ++ `block_hash`).
pub fn article_dna(signature_hex: &str, block_hash: &str) -> Dna {
    let base = format!("{}{}", signature_hex, block_hash);
    Dna::new(encode_base36(&keccak256(base.as_bytes())))
}

/// DNA of a group: base36 of keccak256(`signature_hex`).
pub fn group_dna(signature_hex: &str) -> Dna {
    Dna::new(encode_base36(&keccak256(signature_hex.as_bytes())))
}
