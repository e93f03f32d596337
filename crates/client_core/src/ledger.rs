use std::{sync::Arc, time::Duration};

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{
    domain::ChainId,
    error::DaoError,
    protocol::{CallRequest, TransactionReceipt, TransactionRequest, LATEST_BLOCK},
};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::transport::RpcTransport;

const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(300);

/// Typed Ethereum JSON-RPC calls over a shared transport.
#[derive(Clone)]
pub struct Ledger {
    transport: Arc<dyn RpcTransport>,
}

impl Ledger {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    async fn call_method<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let raw = self.transport.request(method, params).await?;
        serde_json::from_value(raw).with_context(|| format!("unexpected result shape for {method}"))
    }

    pub async fn chain_id(&self) -> Result<ChainId> {
        let id: U64 = self.call_method("eth_chainId", json!([])).await?;
        Ok(ChainId(id.to::<u64>()))
    }

    /// Asks the wallet to expose its accounts. Plain nodes do not implement
    /// `eth_requestAccounts`; those fall back to `eth_accounts`.
    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        match self.call_method("eth_requestAccounts", json!([])).await {
            Ok(accounts) => Ok(accounts),
            Err(err) => {
                debug!(error = %err, "wallet: eth_requestAccounts unavailable; using eth_accounts");
                self.call_method("eth_accounts", json!([])).await
            }
        }
    }

    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let request = CallRequest { to, data };
        self.call_method("eth_call", json!([request, LATEST_BLOCK]))
            .await
    }

    pub async fn balance(&self, address: Address) -> Result<U256> {
        self.call_method("eth_getBalance", json!([address, LATEST_BLOCK]))
            .await
    }

    pub async fn send_transaction(&self, request: TransactionRequest) -> Result<B256> {
        self.call_method("eth_sendTransaction", json!([request]))
            .await
    }

    pub async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        self.call_method("eth_getTransactionReceipt", json!([hash]))
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            timeout: DEFAULT_RECEIPT_TIMEOUT,
        }
    }
}

/// A submitted transaction whose inclusion has not been observed yet.
#[derive(Clone)]
pub struct PendingTransaction {
    ledger: Ledger,
    hash: B256,
}

impl PendingTransaction {
    pub fn new(ledger: Ledger, hash: B256) -> Self {
        Self { ledger, hash }
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Polls for the receipt until it shows up or the policy times out.
    /// A receipt with a failed status is a revert.
    pub async fn confirm(&self, policy: ConfirmationPolicy) -> Result<TransactionReceipt, DaoError> {
        let started = Instant::now();
        loop {
            let receipt = self
                .ledger
                .transaction_receipt(self.hash)
                .await
                .map_err(DaoError::submission)?;
            match receipt {
                Some(receipt) if receipt.succeeded() => return Ok(receipt),
                Some(_) => {
                    warn!(tx = %self.hash, "ledger: transaction reverted");
                    return Err(DaoError::SubmissionFailure(format!(
                        "transaction {} reverted",
                        self.hash
                    )));
                }
                None => {}
            }

            if started.elapsed() >= policy.timeout {
                return Err(DaoError::SubmissionFailure(format!(
                    "transaction {} not confirmed within {}s",
                    self.hash,
                    policy.timeout.as_secs()
                )));
            }
            sleep(policy.poll_interval).await;
        }
    }
}
