//! Cryptographic primitives for the Quill node.
//!
//! - **Keccak-256** for DNA digests
//! - **Base36** (uppercase) rendering of digests into DNA strings
//! - **secp256k1** signer recovery over EIP-191 personal messages

pub mod base36;
pub mod dna;
pub mod error;
pub mod hash;
pub mod sign;

pub use base36::encode_base36;
pub use dna::{article_dna, group_dna};
pub use error::CryptoError;
pub use hash::keccak256;
pub use sign::{recover_signer, sign_personal};
