//! Outbound contract calls.
//!
//! Every user-originated call carries the signature the user produced and the
//! address it recovers to; the contract re-emits both in its log.

use ethers::abi::Token;
use ethers::types::{Address, U256};

use crate::ContractKind;

/// A ledger-mutating call the node can submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractCall {
    Publish {
        title: Vec<u8>,
        content_hash: Vec<u8>,
        license: Vec<u8>,
        extras: Vec<u8>,
        block_hash: Vec<u8>,
        signature: Vec<u8>,
        dna: Vec<u8>,
        user: Address,
    },
    Like {
        article_dna: Vec<u8>,
        group_dna: Vec<u8>,
        signature: Vec<u8>,
        user: Address,
    },
    Comment {
        article_dna: Vec<u8>,
        group_dna: Vec<u8>,
        content_hash: Vec<u8>,
        signature: Vec<u8>,
        user: Address,
    },
    Share {
        article_dna: Vec<u8>,
        groups_dna: Vec<u8>,
        signature: Vec<u8>,
        user: Address,
    },
    CreateGroup {
        dna: Vec<u8>,
        title: Vec<u8>,
        description: Vec<u8>,
        signature: Vec<u8>,
        user: Address,
    },
    AddMember {
        group_dna: Vec<u8>,
        signature: Vec<u8>,
        user: Address,
    },
    RemoveMember {
        group_dna: Vec<u8>,
        signature: Vec<u8>,
        user: Address,
    },
    RemoveMemberByOwner {
        group_dna: Vec<u8>,
        member_address: Vec<u8>,
        signature: Vec<u8>,
        user: Address,
    },
    /// Burn the user's tokens; `timestamp` is the signed message.
    Burn {
        timestamp: String,
        signature: Vec<u8>,
        user: Address,
    },
    Inflate,
    GrantIncentives {
        users: Vec<Address>,
        amounts: Vec<U256>,
    },
}

impl ContractCall {
    /// The contract that exposes this method.
    pub fn kind(&self) -> ContractKind {
        match self {
            Self::Publish { .. } | Self::Like { .. } | Self::Comment { .. } | Self::Share { .. } => {
                ContractKind::Metadata
            }
            Self::CreateGroup { .. }
            | Self::AddMember { .. }
            | Self::RemoveMember { .. }
            | Self::RemoveMemberByOwner { .. } => ContractKind::Group,
            Self::Burn { .. } => ContractKind::User,
            Self::Inflate => ContractKind::Token,
            Self::GrantIncentives { .. } => ContractKind::Incentives,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::Publish { .. } => "publish",
            Self::Like { .. } => "like",
            Self::Comment { .. } => "comment",
            Self::Share { .. } => "share",
            Self::CreateGroup { .. } => "create",
            Self::AddMember { .. } => "addMember",
            Self::RemoveMember { .. } => "removeMember",
            Self::RemoveMemberByOwner { .. } => "removeMemberByOwner",
            Self::Burn { .. } => "burn",
            Self::Inflate => "inflate",
            Self::GrantIncentives { .. } => "grantIncentives",
        }
    }

    /// Arguments in declaration order.
    pub fn tokens(&self) -> Vec<Token> {
        let b = |v: &Vec<u8>| Token::Bytes(v.clone());
        let a = |user: &Address| Token::Address(*user);
        match self {
            Self::Publish {
                title,
                content_hash,
                license,
                extras,
                block_hash,
                signature,
                dna,
                user,
            } => vec![
                b(title),
                b(content_hash),
                b(license),
                b(extras),
                b(block_hash),
                b(signature),
                b(dna),
                a(user),
            ],
            Self::Like {
                article_dna,
                group_dna,
                signature,
                user,
            } => vec![b(article_dna), b(group_dna), b(signature), a(user)],
            Self::Comment {
                article_dna,
                group_dna,
                content_hash,
                signature,
                user,
            } => vec![
                b(article_dna),
                b(group_dna),
                b(content_hash),
                b(signature),
                a(user),
            ],
            Self::Share {
                article_dna,
                groups_dna,
                signature,
                user,
            } => vec![b(article_dna), b(groups_dna), b(signature), a(user)],
            Self::CreateGroup {
                dna,
                title,
                description,
                signature,
                user,
            } => vec![b(dna), b(title), b(description), b(signature), a(user)],
            Self::AddMember {
                group_dna,
                signature,
                user,
            }
            | Self::RemoveMember {
                group_dna,
                signature,
                user,
            } => vec![b(group_dna), b(signature), a(user)],
            Self::RemoveMemberByOwner {
                group_dna,
                member_address,
                signature,
                user,
            } => vec![b(group_dna), b(member_address), b(signature), a(user)],
            Self::Burn {
                timestamp,
                signature,
                user,
            } => vec![Token::String(timestamp.clone()), b(signature), a(user)],
            Self::Inflate => vec![],
            Self::GrantIncentives { users, amounts } => vec![
                Token::Array(users.iter().copied().map(Token::Address).collect()),
                Token::Array(amounts.iter().copied().map(Token::Uint).collect()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_call_targets_incentives_contract() {
        let call = ContractCall::GrantIncentives {
            users: vec![Address::repeat_byte(1), Address::repeat_byte(2)],
            amounts: vec![U256::from(3), U256::from(4)],
        };
        assert_eq!(call.kind(), ContractKind::Incentives);
        assert_eq!(call.method(), "grantIncentives");
        match &call.tokens()[..] {
            [Token::Array(users), Token::Array(amounts)] => {
                assert_eq!(users.len(), 2);
                assert_eq!(amounts[1], Token::Uint(U256::from(4)));
            }
            other => panic!("unexpected tokens {other:?}"),
        }
    }

    #[test]
    fn member_calls_share_argument_shape() {
        let add = ContractCall::AddMember {
            group_dna: b"G".to_vec(),
            signature: vec![1],
            user: Address::repeat_byte(9),
        };
        let remove = ContractCall::RemoveMember {
            group_dna: b"G".to_vec(),
            signature: vec![1],
            user: Address::repeat_byte(9),
        };
        assert_eq!(add.tokens(), remove.tokens());
        assert_ne!(add.method(), remove.method());
        assert_eq!(remove.kind(), ContractKind::Group);
    }

    #[test]
    fn user_address_is_the_trailing_argument() {
        let user = Address::repeat_byte(5);
        let call = ContractCall::Burn {
            timestamp: "1700000000".into(),
            signature: vec![2; 65],
            user,
        };
        assert_eq!(call.kind(), ContractKind::User);
        assert_eq!(call.tokens().last(), Some(&Token::Address(user)));
    }
}
