//! End-to-end tests for the node's task set: scripted heads and logs go in,
//! ledger state, submitted transactions and metrics come out.

use std::sync::Arc;
use std::time::Duration;

use ethers::abi::Token;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use quill_chain::{ContractAbis, ContractKind};
use quill_crypto::sign_personal;
use quill_incentives::reputation::token_unit;
use quill_node::{NodeConfig, NodeParts, QuillNode};
use quill_nullables::{NullChain, NullClock, NullHeadSource, NullStore};
use quill_store::MetaStore;
use quill_store_lmdb::CURRENT_SCHEMA_VERSION;
use quill_types::RawLogEntry;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const NODE_KEY: &str = "0x0202020202020202020202020202020202020202020202020202020202020202";
const AUTHOR_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
const READER_KEY: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";

fn wallet(key: &str) -> LocalWallet {
    key.parse().unwrap()
}

fn config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.chain.reconnect_delay_secs = 0;
    config.chain.batch_width = 100;
    config.contracts.metadata = Some(Address::repeat_byte(0x10));
    config.contracts.group = Some(Address::repeat_byte(0x11));
    config.contracts.token = Some(Address::repeat_byte(0x12));
    config.contracts.user = Some(Address::repeat_byte(0x13));
    config.contracts.incentives = Some(Address::repeat_byte(0x14));
    config
}

struct Harness {
    store: Arc<NullStore>,
    chain: Arc<NullChain>,
    heads: Arc<NullHeadSource>,
    abis: ContractAbis,
    node: QuillNode<NullStore>,
}

fn harness(config: NodeConfig) -> Harness {
    let store = Arc::new(NullStore::new());
    let chain = Arc::new(NullChain::new());
    let heads = Arc::new(NullHeadSource::new());
    let node = QuillNode::with_parts(
        config,
        NodeParts {
            store: store.clone(),
            chain: chain.clone(),
            head_source: heads.clone(),
            clock: Arc::new(NullClock::new(1_700_000_000)),
            wallet: wallet(NODE_KEY),
        },
    )
    .unwrap();
    Harness {
        store,
        chain,
        heads,
        abis: ContractAbis::load().unwrap(),
        node,
    }
}

impl Harness {
    fn push(&self, kind: ContractKind, name: &str, tokens: Vec<Token>, block: u64) {
        let (topics, data) = self
            .abis
            .get(kind)
            .unwrap()
            .encode_event(name, tokens)
            .unwrap();
        let address = self.node.config().registry().unwrap().address_of(kind).unwrap();
        self.chain.push_log(RawLogEntry {
            address,
            topics,
            data,
            block_number: block,
            block_hash: None,
            log_index: Some(0),
        });
    }

    fn push_mint(&self, to: Address, whole_tokens: u64, block: u64) {
        self.push(
            ContractKind::Token,
            "Transfer",
            vec![
                Token::Address(Address::zero()),
                Token::Address(to),
                Token::Uint(U256::from(whole_tokens) * token_unit()),
            ],
            block,
        );
    }

    fn cursor(&self) -> Option<u64> {
        self.node.driver().cursor().unwrap()
    }
}

fn bytes(text: &str) -> Token {
    Token::Bytes(text.as_bytes().to_vec())
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

#[tokio::test]
async fn head_notification_drives_sync_to_confirmed_height() {
    let mut h = harness(config());
    let holder = Address::repeat_byte(0xAA);
    h.push_mint(holder, 5, 3);
    h.push_mint(holder, 7, 12); // beyond the confirmed height
    h.heads.push_session(&[16]);

    h.node.start().await.unwrap();
    wait_for(|| h.cursor() == Some(10)).await;
    h.node.stop().await.unwrap();

    let user = h.store.user(&holder).unwrap();
    assert_eq!(user.balance, U256::from(5u64) * token_unit());
    assert_eq!(h.chain.queries(), vec![(1, 10)]);

    let metrics = h.node.metrics();
    assert_eq!(metrics.chain_head.get(), 16);
    assert_eq!(metrics.sync_cursor.get(), 10);
    assert_eq!(metrics.ranges_synced.get(), 1);
    assert_eq!(metrics.events_applied.get(), 1);
}

#[tokio::test]
async fn failed_subscription_is_retried_and_counted() {
    let mut h = harness(config());
    h.heads.push_failure("connection refused");
    h.heads.push_session(&[20]);

    h.node.start().await.unwrap();
    wait_for(|| h.cursor() == Some(14)).await;
    h.node.stop().await.unwrap();

    assert!(h.heads.subscriptions() >= 2);
    assert!(h.node.metrics().head_reconnects.get() >= 1);
}

#[tokio::test]
async fn failed_range_is_counted_and_leaves_the_cursor() {
    let mut h = harness(config());
    h.chain.fail_logs_at(5);
    h.heads.push_session(&[16]);

    h.node.start().await.unwrap();
    wait_for(|| h.node.metrics().sync_failures.get() == 1).await;
    assert_eq!(h.cursor(), None);

    h.chain.clear_log_failure();
    let report = h.node.driver().sync_to(17).await.unwrap();
    assert_eq!(report.cursor, 11);
    h.node.stop().await.unwrap();
}

// ---------------------------------------------------------------------------
// Outbound transactions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assigned_grants_are_submitted_when_enabled() {
    let mut config = config();
    config.incentives.submit_grants = true;
    let mut h = harness(config);

    let author = wallet(AUTHOR_KEY);
    let reader = wallet(READER_KEY);
    h.push_mint(reader.address(), 2500, 1);

    let signature = sign_personal(&author, "TitleQmContentcc-by").unwrap();
    h.push(
        ContractKind::Metadata,
        "PublishLog",
        vec![
            bytes("Title"),
            bytes("QmContent"),
            bytes("cc-by"),
            bytes("{}"),
            bytes("0xblock"),
            Token::Bytes(signature),
            bytes("ART1"),
        ],
        2,
    );
    let signature = sign_personal(&reader, "ART1GRP1").unwrap();
    h.push(
        ContractKind::Metadata,
        "LikeLog",
        vec![bytes("ART1"), bytes("GRP1"), Token::Bytes(signature)],
        3,
    );
    h.push(
        ContractKind::Token,
        "Inflate",
        vec![Token::Uint(U256::from(1_000_000u64) * token_unit())],
        4,
    );
    h.heads.push_session(&[16]);

    h.node.start().await.unwrap();
    wait_for(|| h.chain.sent().len() == 1).await;
    h.node.stop().await.unwrap();

    assert_eq!(h.node.metrics().transactions_submitted.get(), 1);
    assert_eq!(h.node.sequencer().last_nonce().await, Some(U256::zero()));
}

#[tokio::test]
async fn grants_are_only_logged_by_default() {
    let mut h = harness(config());
    h.push(
        ContractKind::Token,
        "Inflate",
        vec![Token::Uint(U256::from(1_000_000u64) * token_unit())],
        4,
    );
    h.heads.push_session(&[16]);

    h.node.start().await.unwrap();
    wait_for(|| h.cursor() == Some(10)).await;
    h.node.stop().await.unwrap();

    assert!(h.chain.sent().is_empty());
}

#[tokio::test]
async fn inflation_trigger_calls_inflate_on_interval() {
    let mut config = config();
    config.incentives.inflation_interval_secs = 1;
    let mut h = harness(config);

    h.node.start().await.unwrap();
    wait_for(|| !h.chain.sent().is_empty()).await;
    h.node.stop().await.unwrap();

    assert!(h.node.metrics().transactions_submitted.get() >= 1);
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_creates_and_migrates_the_lmdb_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.data_dir = dir.path().to_path_buf();
    config.node_account.private_key = Some(NODE_KEY.into());

    let node = QuillNode::open(config).unwrap();
    assert_eq!(
        node.store().get_schema_version().unwrap(),
        CURRENT_SCHEMA_VERSION
    );
    assert_eq!(node.sequencer().account(), wallet(NODE_KEY).address());
    assert_eq!(node.driver().cursor().unwrap(), None);
}

#[tokio::test]
async fn open_without_contracts_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = NodeConfig::default();
    config.data_dir = dir.path().to_path_buf();
    config.node_account.private_key = Some(NODE_KEY.into());

    assert!(QuillNode::open(config).is_err());
}

#[tokio::test]
async fn stop_without_start_is_harmless() {
    let mut h = harness(config());
    h.node.stop().await.unwrap();
}
