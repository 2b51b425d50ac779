//! Natural-key encoding shared by the backends.
//!
//! Composite keys are a concatenation of length-prefixed parts
//! (`u16` big-endian length, then the bytes), so `("AB", "C")` and
//! `("A", "BC")` never collide and a prefix of parts is a byte prefix.

use quill_types::{Address, Dna};

/// Builder for composite binary keys.
#[derive(Default)]
pub struct KeyBuilder {
    buf: Vec<u8>,
}

impl KeyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part(mut self, bytes: &[u8]) -> Self {
        let len = u16::try_from(bytes.len()).unwrap_or(u16::MAX);
        self.buf.extend_from_slice(&len.to_be_bytes());
        self.buf.extend_from_slice(&bytes[..usize::from(len)]);
        self
    }

    pub fn dna(self, dna: &Dna) -> Self {
        self.part(dna.as_str().as_bytes())
    }

    pub fn address(self, address: &Address) -> Self {
        self.part(address.as_bytes())
    }

    pub fn text(self, s: &str) -> Self {
        self.part(s.as_bytes())
    }

    /// Append a fixed-width big-endian integer without a length prefix.
    pub fn u64(mut self, n: u64) -> Self {
        self.buf.extend_from_slice(&n.to_be_bytes());
        self
    }

    pub fn byte(mut self, b: u8) -> Self {
        self.buf.push(b);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

/// `(group_dna, member)`
pub fn member_key(group_dna: &Dna, member: &Address) -> Vec<u8> {
    KeyBuilder::new().dna(group_dna).address(member).build()
}

/// `(group_dna, article_dna, member)`
pub fn group_article_key(group_dna: &Dna, article_dna: &Dna, member: &Address) -> Vec<u8> {
    KeyBuilder::new()
        .dna(group_dna)
        .dna(article_dna)
        .address(member)
        .build()
}

/// `(article_dna, group_dna, member)`
pub fn like_key(article_dna: &Dna, group_dna: &Dna, member: &Address) -> Vec<u8> {
    KeyBuilder::new()
        .dna(article_dna)
        .dna(group_dna)
        .address(member)
        .build()
}

/// `(article_dna, group_dna, member, content_hash)`
pub fn comment_key(
    article_dna: &Dna,
    group_dna: &Dna,
    member: &Address,
    content_hash: &str,
) -> Vec<u8> {
    KeyBuilder::new()
        .dna(article_dna)
        .dna(group_dna)
        .address(member)
        .text(content_hash)
        .build()
}
