//! Contract interfaces and the topic-to-event-name tables built from them.

use std::collections::HashMap;

use ethers::abi::{parse_abi, Abi, RawLog, Token};
use ethers::types::{H256, U256};
use quill_types::RawLogEntry;

use crate::calls::ContractCall;
use crate::events::{ContractEvent, EventFields};
use crate::{ChainError, ContractKind};

const METADATA_ABI: &[&str] = &[
    "event PublishLog(bytes title, bytes contentHash, bytes license, bytes extras, bytes blockHash, bytes signature, bytes DNA)",
    "event LikeLog(bytes articleDNA, bytes groupDNA, bytes signature)",
    "event CommentLog(bytes articleDNA, bytes groupDNA, bytes contentHash, bytes signature)",
    "event ShareLog(bytes articleDNA, bytes groupsDNA, bytes signature)",
    "function publish(bytes title, bytes contentHash, bytes license, bytes extras, bytes blockHash, bytes signature, bytes DNA, address userAddress)",
    "function like(bytes articleDNA, bytes groupDNA, bytes signature, address userAddress)",
    "function comment(bytes articleDNA, bytes groupDNA, bytes contentHash, bytes signature, address userAddress)",
    "function share(bytes articleDNA, bytes groupsDNA, bytes signature, address userAddress)",
];

const GROUP_ABI: &[&str] = &[
    "event CreateLog(bytes title, bytes description, bytes signature)",
    "event AddMemberLog(bytes groupDNA, bytes signature)",
    "event RemoveMemberLog(bytes groupDNA, bytes signature)",
    "event RemoveMemberByOwnerLog(bytes groupDNA, bytes groupMemberAddress, bytes signature)",
    "function create(bytes DNA, bytes title, bytes description, bytes signature, address userAddress)",
    "function addMember(bytes groupDNA, bytes signature, address userAddress)",
    "function removeMember(bytes groupDNA, bytes signature, address userAddress)",
    "function removeMemberByOwner(bytes groupDNA, bytes groupMemberAddress, bytes signature, address userAddress)",
];

const TOKEN_ABI: &[&str] = &[
    "event Transfer(address indexed from, address indexed to, uint256 value)",
    "event Inflate(uint256 amount)",
    "event Lock(address userAddress, uint256 resourceType, bytes resourceDNA, uint256 amount, uint256 expire)",
    "function inflate()",
];

const USER_ABI: &[&str] = &[
    "event UserTokenBurnLog(address userAddress, uint256 amount)",
    "function burn(string timestamp, bytes signature, address userAddress)",
];

const INCENTIVES_ABI: &[&str] = &["function grantIncentives(address[] users, uint256[] amounts)"];

fn interface_of(kind: ContractKind) -> &'static [&'static str] {
    match kind {
        ContractKind::Metadata => METADATA_ABI,
        ContractKind::Group => GROUP_ABI,
        ContractKind::Token => TOKEN_ABI,
        ContractKind::User => USER_ABI,
        ContractKind::Incentives => INCENTIVES_ABI,
    }
}

/// A parsed contract interface plus its event name table.
#[derive(Clone, Debug)]
pub struct ContractAbi {
    kind: ContractKind,
    abi: Abi,
    event_names: HashMap<H256, String>,
}

impl ContractAbi {
    pub fn new(kind: ContractKind) -> Result<Self, ChainError> {
        let abi = parse_abi(interface_of(kind)).map_err(|e| ChainError::Abi(e.to_string()))?;
        let event_names = abi
            .events()
            .map(|event| (event.signature(), event.name.clone()))
            .collect();
        Ok(Self {
            kind,
            abi,
            event_names,
        })
    }

    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    /// Resolve a log's primary topic to an event name.
    pub fn event_name(&self, topic: Option<&H256>) -> Result<&str, ChainError> {
        topic
            .and_then(|t| self.event_names.get(t))
            .map(String::as_str)
            .ok_or(ChainError::UnknownEvent {
                kind: self.kind,
                topic: topic.copied(),
            })
    }

    /// Decode a raw log emitted by this contract.
    pub fn decode(&self, log: &RawLogEntry) -> Result<ContractEvent, ChainError> {
        let name = self.event_name(log.primary_topic())?;
        let event = self
            .abi
            .event(name)
            .map_err(|e| ChainError::Abi(e.to_string()))?;
        let parsed = event
            .parse_log(RawLog {
                topics: log.topics.clone(),
                data: log.data.clone(),
            })
            .map_err(|e| ChainError::Decode {
                event: name.to_string(),
                reason: e.to_string(),
            })?;
        ContractEvent::from_fields(name, EventFields::new(name, parsed.params))
    }

    /// ABI-encode the calldata for `call`.
    pub fn encode_call(&self, call: &ContractCall) -> Result<Vec<u8>, ChainError> {
        if call.kind() != self.kind {
            return Err(ChainError::Abi(format!(
                "{} is not a {} method",
                call.method(),
                self.kind
            )));
        }
        let function = self
            .abi
            .function(call.method())
            .map_err(|e| ChainError::Abi(e.to_string()))?;
        function
            .encode_input(&call.tokens())
            .map_err(|e| ChainError::Abi(e.to_string()))
    }

    /// Build the `(topics, data)` pair a node would emit for `name`.
    ///
    /// Used by tests and the nullable chain to script logs.
    pub fn encode_event(
        &self,
        name: &str,
        tokens: Vec<Token>,
    ) -> Result<(Vec<H256>, Vec<u8>), ChainError> {
        let event = self
            .abi
            .event(name)
            .map_err(|e| ChainError::Abi(e.to_string()))?;
        if event.inputs.len() != tokens.len() {
            return Err(ChainError::Abi(format!(
                "{name} takes {} fields, got {}",
                event.inputs.len(),
                tokens.len()
            )));
        }

        let mut topics = vec![event.signature()];
        let mut data = Vec::new();
        for (param, token) in event.inputs.iter().zip(tokens) {
            if !param.indexed {
                data.push(token);
                continue;
            }
            let topic = match token {
                Token::Address(address) => H256::from(address),
                Token::Uint(value) => uint_topic(value),
                other => {
                    return Err(ChainError::Abi(format!(
                        "cannot index {other:?} in {name}"
                    )))
                }
            };
            topics.push(topic);
        }
        Ok((topics, ethers::abi::encode(&data)))
    }
}

fn uint_topic(value: U256) -> H256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    H256(bytes)
}

/// Interfaces for every contract kind, parsed once at startup.
#[derive(Clone, Debug)]
pub struct ContractAbis {
    abis: HashMap<ContractKind, ContractAbi>,
}

impl ContractAbis {
    pub fn load() -> Result<Self, ChainError> {
        let abis = ContractKind::ALL
            .iter()
            .map(|kind| ContractAbi::new(*kind).map(|abi| (*kind, abi)))
            .collect::<Result<_, _>>()?;
        Ok(Self { abis })
    }

    pub fn get(&self, kind: ContractKind) -> Result<&ContractAbi, ChainError> {
        self.abis
            .get(&kind)
            .ok_or_else(|| ChainError::Abi(format!("no interface loaded for {kind}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Address;

    fn raw(address: Address, topics: Vec<H256>, data: Vec<u8>) -> RawLogEntry {
        RawLogEntry {
            address,
            topics,
            data,
            block_number: 1,
            block_hash: None,
            log_index: None,
        }
    }

    #[test]
    fn every_interface_parses() {
        let abis = ContractAbis::load().unwrap();
        for kind in ContractKind::ALL {
            assert_eq!(abis.get(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn like_event_decodes() {
        let abi = ContractAbi::new(ContractKind::Metadata).unwrap();
        let (topics, data) = abi
            .encode_event(
                "LikeLog",
                vec![
                    Token::Bytes(b"ART1".to_vec()),
                    Token::Bytes(b"GRP1".to_vec()),
                    Token::Bytes(vec![7; 65]),
                ],
            )
            .unwrap();
        let event = abi.decode(&raw(Address::zero(), topics, data)).unwrap();
        match event {
            ContractEvent::Like {
                article_dna,
                group_dna,
                signature,
            } => {
                assert_eq!(article_dna.as_str(), "ART1");
                assert_eq!(group_dna.as_str(), "GRP1");
                assert_eq!(signature, vec![7; 65]);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn transfer_reads_indexed_endpoints() {
        let abi = ContractAbi::new(ContractKind::Token).unwrap();
        let from = Address::repeat_byte(0xaa);
        let to = Address::repeat_byte(0xbb);
        let (topics, data) = abi
            .encode_event(
                "Transfer",
                vec![
                    Token::Address(from),
                    Token::Address(to),
                    Token::Uint(U256::from(500)),
                ],
            )
            .unwrap();
        assert_eq!(topics.len(), 3);

        let event = abi.decode(&raw(Address::zero(), topics, data)).unwrap();
        assert_eq!(
            event,
            ContractEvent::Transfer {
                from,
                to,
                value: U256::from(500)
            }
        );
    }

    #[test]
    fn unknown_topic_is_rejected() {
        let abi = ContractAbi::new(ContractKind::User).unwrap();
        let err = abi
            .decode(&raw(Address::zero(), vec![H256::repeat_byte(1)], vec![]))
            .unwrap_err();
        assert!(matches!(err, ChainError::UnknownEvent { .. }));

        let err = abi.decode(&raw(Address::zero(), vec![], vec![])).unwrap_err();
        assert!(matches!(err, ChainError::UnknownEvent { topic: None, .. }));
    }

    #[test]
    fn truncated_data_is_a_decode_error() {
        let abi = ContractAbi::new(ContractKind::Token).unwrap();
        let (topics, _) = abi
            .encode_event("Inflate", vec![Token::Uint(U256::from(1))])
            .unwrap();
        let err = abi.decode(&raw(Address::zero(), topics, vec![1, 2, 3])).unwrap_err();
        assert!(matches!(err, ChainError::Decode { .. }));
    }

    #[test]
    fn calls_encode_with_selector() {
        let abi = ContractAbi::new(ContractKind::Incentives).unwrap();
        let call = ContractCall::GrantIncentives {
            users: vec![Address::repeat_byte(1)],
            amounts: vec![U256::from(10)],
        };
        let calldata = abi.encode_call(&call).unwrap();
        let selector = &ethers::utils::keccak256("grantIncentives(address[],uint256[])")[..4];
        assert_eq!(&calldata[..4], selector);

        let token = ContractAbi::new(ContractKind::Token).unwrap();
        assert!(token.encode_call(&call).is_err());
        assert_eq!(token.encode_call(&ContractCall::Inflate).unwrap().len(), 4);
    }
}
