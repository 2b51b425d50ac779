//! The node's signing account.

use std::path::{Path, PathBuf};

use ethers::signers::{LocalWallet, Signer};

use crate::config::AccountConfig;
use crate::NodeError;

/// Load the wallet that signs the node's own transactions.
///
/// A configured `private_key` wins. Otherwise `keystore` is decrypted with
/// `passphrase`; when it names a directory, its first keystore file (by
/// file name) is used.
pub fn load_wallet(account: &AccountConfig, chain_id: u64) -> Result<LocalWallet, NodeError> {
    let wallet = match &account.private_key {
        Some(key) => key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| NodeError::Account(format!("invalid private key: {e}")))?,
        None => {
            let path = keystore_file(&account.keystore)?;
            LocalWallet::decrypt_keystore(&path, &account.passphrase).map_err(|e| {
                NodeError::Account(format!("unlock {}: {e}", path.display()))
            })?
        }
    };
    let wallet = wallet.with_chain_id(chain_id);
    tracing::info!(address = ?wallet.address(), chain_id, "node account unlocked");
    Ok(wallet)
}

fn keystore_file(keystore: &Path) -> Result<PathBuf, NodeError> {
    if keystore.is_file() {
        return Ok(keystore.to_path_buf());
    }
    if !keystore.is_dir() {
        return Err(NodeError::Account(format!(
            "keystore not found: {}",
            keystore.display()
        )));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(keystore)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    files
        .into_iter()
        .next()
        .ok_or_else(|| NodeError::Account(format!("no account in {}", keystore.display())))
}
