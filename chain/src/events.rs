//! Decoded contract events.

use ethers::abi::{LogParam, Token};
use ethers::types::{Address, U256};
use quill_types::Dna;

use crate::ChainError;

/// One decoded log, tagged by event name.
///
/// Byte fields that carry text on chain (titles, DNAs, hashes) are decoded
/// lossily as UTF-8; signatures stay raw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractEvent {
    Publish {
        title: String,
        content_hash: String,
        license: String,
        extras: String,
        block_hash: String,
        signature: Vec<u8>,
        dna: Dna,
    },
    Like {
        article_dna: Dna,
        group_dna: Dna,
        signature: Vec<u8>,
    },
    Comment {
        article_dna: Dna,
        group_dna: Dna,
        content_hash: String,
        signature: Vec<u8>,
    },
    Share {
        article_dna: Dna,
        /// Comma-joined group DNAs.
        groups_dna: String,
        signature: Vec<u8>,
    },
    CreateGroup {
        title: String,
        description: String,
        signature: Vec<u8>,
    },
    AddMember {
        group_dna: Dna,
        signature: Vec<u8>,
    },
    RemoveMember {
        group_dna: Dna,
        signature: Vec<u8>,
    },
    RemoveMemberByOwner {
        group_dna: Dna,
        /// The member's address as the owner typed it (hex text).
        member_address: String,
        signature: Vec<u8>,
    },
    Transfer {
        from: Address,
        to: Address,
        value: U256,
    },
    Inflate {
        amount: U256,
    },
    Lock {
        user: Address,
        resource_type: U256,
        resource_dna: Dna,
        amount: U256,
        expire: U256,
    },
    UserTokenBurn {
        user: Address,
        amount: U256,
    },
}

impl ContractEvent {
    /// The on-chain event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Publish { .. } => "PublishLog",
            Self::Like { .. } => "LikeLog",
            Self::Comment { .. } => "CommentLog",
            Self::Share { .. } => "ShareLog",
            Self::CreateGroup { .. } => "CreateLog",
            Self::AddMember { .. } => "AddMemberLog",
            Self::RemoveMember { .. } => "RemoveMemberLog",
            Self::RemoveMemberByOwner { .. } => "RemoveMemberByOwnerLog",
            Self::Transfer { .. } => "Transfer",
            Self::Inflate { .. } => "Inflate",
            Self::Lock { .. } => "Lock",
            Self::UserTokenBurn { .. } => "UserTokenBurnLog",
        }
    }

    pub(crate) fn from_fields(name: &str, mut f: EventFields) -> Result<Self, ChainError> {
        let event = match name {
            "PublishLog" => Self::Publish {
                title: f.text("title")?,
                content_hash: f.text("contentHash")?,
                license: f.text("license")?,
                extras: f.text("extras")?,
                block_hash: f.text("blockHash")?,
                signature: f.bytes("signature")?,
                dna: f.dna("DNA")?,
            },
            "LikeLog" => Self::Like {
                article_dna: f.dna("articleDNA")?,
                group_dna: f.dna("groupDNA")?,
                signature: f.bytes("signature")?,
            },
            "CommentLog" => Self::Comment {
                article_dna: f.dna("articleDNA")?,
                group_dna: f.dna("groupDNA")?,
                content_hash: f.text("contentHash")?,
                signature: f.bytes("signature")?,
            },
            "ShareLog" => Self::Share {
                article_dna: f.dna("articleDNA")?,
                groups_dna: f.text("groupsDNA")?,
                signature: f.bytes("signature")?,
            },
            "CreateLog" => Self::CreateGroup {
                title: f.text("title")?,
                description: f.text("description")?,
                signature: f.bytes("signature")?,
            },
            "AddMemberLog" => Self::AddMember {
                group_dna: f.dna("groupDNA")?,
                signature: f.bytes("signature")?,
            },
            "RemoveMemberLog" => Self::RemoveMember {
                group_dna: f.dna("groupDNA")?,
                signature: f.bytes("signature")?,
            },
            "RemoveMemberByOwnerLog" => Self::RemoveMemberByOwner {
                group_dna: f.dna("groupDNA")?,
                member_address: f.text("groupMemberAddress")?,
                signature: f.bytes("signature")?,
            },
            "Transfer" => Self::Transfer {
                from: f.address("from")?,
                to: f.address("to")?,
                value: f.uint("value")?,
            },
            "Inflate" => Self::Inflate {
                amount: f.uint("amount")?,
            },
            "Lock" => Self::Lock {
                user: f.address("userAddress")?,
                resource_type: f.uint("resourceType")?,
                resource_dna: f.dna("resourceDNA")?,
                amount: f.uint("amount")?,
                expire: f.uint("expire")?,
            },
            "UserTokenBurnLog" => Self::UserTokenBurn {
                user: f.address("userAddress")?,
                amount: f.uint("amount")?,
            },
            other => {
                return Err(ChainError::Decode {
                    event: other.to_string(),
                    reason: "no decoder for event".into(),
                })
            }
        };
        Ok(event)
    }
}

/// Named parameters of one parsed log, consumed field by field.
pub(crate) struct EventFields {
    event: String,
    params: Vec<LogParam>,
}

impl EventFields {
    pub(crate) fn new(event: &str, params: Vec<LogParam>) -> Self {
        Self {
            event: event.to_string(),
            params,
        }
    }

    fn take(&mut self, name: &str) -> Result<Token, ChainError> {
        let pos = self
            .params
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| self.error(format!("missing field {name}")))?;
        Ok(self.params.swap_remove(pos).value)
    }

    fn error(&self, reason: String) -> ChainError {
        ChainError::Decode {
            event: self.event.clone(),
            reason,
        }
    }

    fn bytes(&mut self, name: &str) -> Result<Vec<u8>, ChainError> {
        match self.take(name)? {
            Token::Bytes(b) => Ok(b),
            other => Err(self.error(format!("{name}: expected bytes, got {other:?}"))),
        }
    }

    fn text(&mut self, name: &str) -> Result<String, ChainError> {
        Ok(String::from_utf8_lossy(&self.bytes(name)?).into_owned())
    }

    fn dna(&mut self, name: &str) -> Result<Dna, ChainError> {
        Ok(Dna::from_event_bytes(&self.bytes(name)?))
    }

    fn address(&mut self, name: &str) -> Result<Address, ChainError> {
        match self.take(name)? {
            Token::Address(a) => Ok(a),
            other => Err(self.error(format!("{name}: expected address, got {other:?}"))),
        }
    }

    fn uint(&mut self, name: &str) -> Result<U256, ChainError> {
        match self.take(name)? {
            Token::Uint(v) => Ok(v),
            other => Err(self.error(format!("{name}: expected uint, got {other:?}"))),
        }
    }
}
