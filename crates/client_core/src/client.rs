use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use alloy_primitives::{Address, B256, U256};
use shared::{
    domain::{ChainId, NetworkIdentity, Proposal, ProposalId, TokenId, VoteChoice},
    error::{AlertPayload, DaoError},
    protocol::TransactionReceipt,
};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::{
    contracts::{ContractCall, GovernanceContract, MembershipToken},
    dispatcher::{ActionDispatcher, ActionKind},
    ledger::ConfirmationPolicy,
    proposals::{fetch_proposals, ProposalBook, DEFAULT_FETCH_CONCURRENCY},
    session::{ConnectionStatus, SessionManager},
    transport::RpcTransport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub governance: Address,
    pub membership_nft: Address,
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub network: NetworkIdentity,
    pub contracts: ContractAddresses,
    pub account: Option<Address>,
    pub fetch_concurrency: usize,
    pub confirmation: ConfirmationPolicy,
}

impl ClientOptions {
    pub fn new(network: NetworkIdentity, contracts: ContractAddresses) -> Self {
        Self {
            network,
            contracts,
            account: None,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            confirmation: ConfirmationPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    Connected {
        chain_id: ChainId,
        account: Option<Address>,
    },
    /// Blocking notification for the user.
    Alert(AlertPayload),
    TransactionSubmitted {
        action: ActionKind,
        hash: B256,
    },
    ActionConfirmed {
        action: ActionKind,
        hash: B256,
    },
}

#[derive(Debug, Clone, Default)]
struct Overview {
    membership_balance: U256,
    treasury_balance: U256,
    is_owner: bool,
}

/// Point-in-time copy of everything a front-end renders.
#[derive(Debug, Clone)]
pub struct DaoSnapshot {
    pub connection: ConnectionStatus,
    pub membership_balance: U256,
    pub treasury_balance: U256,
    pub num_proposals: u64,
    pub proposals: Vec<Proposal>,
    pub is_owner: bool,
    pub busy: bool,
}

pub struct DaoClient {
    session: Mutex<SessionManager>,
    contracts: ContractAddresses,
    fetch_concurrency: usize,
    overview: RwLock<Overview>,
    book: RwLock<ProposalBook>,
    fetch_generation: AtomicU64,
    dispatcher: ActionDispatcher,
    events: broadcast::Sender<ClientEvent>,
}


impl DaoClient {
    pub fn new(transport: Arc<dyn RpcTransport>, options: ClientOptions) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            session: Mutex::new(
                SessionManager::new(transport, options.network).with_account(options.account),
            ),
            contracts: options.contracts,
            fetch_concurrency: options.fetch_concurrency,
            overview: RwLock::new(Overview::default()),
            book: RwLock::new(ProposalBook::default()),
            fetch_generation: AtomicU64::new(0),
            dispatcher: ActionDispatcher::new(options.confirmation),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    /// Connects the wallet, then loads treasury, membership, proposal count
    /// and ownership. Load failures are logged and leave defaults in place.
    pub async fn connect(&self) -> Result<(), DaoError> {
        let connected = self.session.lock().await.connect().await;
        let connection = match connected {
            Ok(connection) => connection,
            Err(err) => {
                self.alert(&err);
                return Err(err);
            }
        };
        let _ = self.events.send(ClientEvent::Connected {
            chain_id: connection.chain_id(),
            account: connection.account(),
        });

        let _ = self.refresh_treasury().await;
        let _ = self.refresh_membership().await;
        let _ = self.refresh_count().await;
        let _ = self.refresh_owner().await;
        Ok(())
    }

    pub async fn disconnect(&self) {
        self.session.lock().await.disconnect();
        self.clear_cached_state().await;
    }

    async fn clear_cached_state(&self) {
        *self.overview.write().await = Overview::default();
        let started = self.fetch_generation.load(Ordering::Acquire);
        self.book.write().await.clear(started);
    }

    /// A read that finds the wallet on the wrong chain alerts and drops
    /// everything loaded from the previous chain. Other read failures keep
    /// the previous state.
    async fn read_failed(&self, what: &str, err: DaoError) -> DaoError {
        error!(code = ?err.code(), error = %err, "view: {what} refresh failed");
        if matches!(err, DaoError::NetworkMismatch { .. }) {
            self.alert(&err);
            self.clear_cached_state().await;
        }
        err
    }

    pub async fn snapshot(&self) -> DaoSnapshot {
        let connection = self.session.lock().await.state().status();
        let overview = self.overview.read().await.clone();
        let book = self.book.read().await;
        DaoSnapshot {
            connection,
            membership_balance: overview.membership_balance,
            treasury_balance: overview.treasury_balance,
            num_proposals: book.count(),
            proposals: book.proposals().to_vec(),
            is_owner: overview.is_owner,
            busy: self.dispatcher.is_busy(),
        }
    }

    async fn governance(&self) -> Result<GovernanceContract, DaoError> {
        let reader = self.session.lock().await.reader().await?;
        Ok(GovernanceContract::new(
            reader.ledger().clone(),
            self.contracts.governance,
        ))
    }

    pub async fn refresh_treasury(&self) -> Result<U256, DaoError> {
        let balance = match async { self.governance().await?.treasury_balance().await }.await {
            Ok(balance) => balance,
            Err(err) => return Err(self.read_failed("treasury balance", err).await),
        };
        self.overview.write().await.treasury_balance = balance;
        Ok(balance)
    }

    pub async fn refresh_membership(&self) -> Result<U256, DaoError> {
        let read = async {
            let signer = self.session.lock().await.signer().await?;
            MembershipToken::new(signer.ledger().clone(), self.contracts.membership_nft)
                .balance_of(signer.address())
                .await
        };
        let balance = match read.await {
            Ok(balance) => balance,
            Err(err) => return Err(self.read_failed("membership balance", err).await),
        };
        self.overview.write().await.membership_balance = balance;
        Ok(balance)
    }

    pub async fn refresh_owner(&self) -> Result<bool, DaoError> {
        let read = async {
            let signer = self.session.lock().await.signer().await?;
            let owner = GovernanceContract::new(signer.ledger().clone(), self.contracts.governance)
                .owner()
                .await?;
            Ok::<_, DaoError>(owner == signer.address())
        };
        let is_owner = match read.await {
            Ok(is_owner) => is_owner,
            Err(err) => return Err(self.read_failed("ownership", err).await),
        };
        if is_owner {
            info!("view: signer owns the DAO");
        }
        self.overview.write().await.is_owner = is_owner;
        Ok(is_owner)
    }

    pub async fn refresh_count(&self) -> Result<u64, DaoError> {
        let count = match async { self.governance().await?.num_proposals().await }.await {
            Ok(count) => count,
            Err(err) => return Err(self.read_failed("proposal count", err).await),
        };
        self.book.write().await.set_count(count);
        Ok(count)
    }

    /// Re-reads every proposal below the known count. A failed batch leaves
    /// the previous list in place, and a batch overtaken by a newer fetch is
    /// discarded.
    pub async fn fetch_all(&self) -> Result<Vec<Proposal>, DaoError> {
        let generation = self.fetch_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let count = self.book.read().await.count();
        let read = async {
            let governance = self.governance().await?;
            fetch_proposals(&governance, count, self.fetch_concurrency).await
        };
        let fetched = match read.await {
            Ok(fetched) => fetched,
            Err(err) => return Err(self.read_failed("proposal list", err).await),
        };

        let applied = {
            let mut book = self.book.write().await;
            book.apply_fetched(generation, fetched)
                .map(|fresh| (fresh, book.proposals().to_vec()))
        };
        match applied {
            Ok((fresh, proposals)) => {
                if !fresh {
                    debug!(generation, "view: dropped proposal batch overtaken by a newer fetch");
                }
                Ok(proposals)
            }
            Err(err) => Err(self.read_failed("proposal list", err).await),
        }
    }

    pub async fn refresh_proposals(&self) -> Result<Vec<Proposal>, DaoError> {
        self.refresh_count().await?;
        self.fetch_all().await
    }

    pub async fn create_proposal(
        &self,
        nft_token_id: TokenId,
    ) -> Result<TransactionReceipt, DaoError> {
        let _in_flight = self.dispatcher.begin(ActionKind::CreateProposal)?;
        let call = ContractCall::create_proposal(self.contracts.governance, nft_token_id);
        let receipt = self
            .submit_and_confirm(ActionKind::CreateProposal, call)
            .await?;
        let _ = self.refresh_count().await;
        Ok(receipt)
    }

    pub async fn vote(
        &self,
        proposal_id: ProposalId,
        choice: VoteChoice,
    ) -> Result<TransactionReceipt, DaoError> {
        let _in_flight = self.dispatcher.begin(ActionKind::Vote)?;
        let call = ContractCall::vote(self.contracts.governance, proposal_id, choice);
        let receipt = self.submit_and_confirm(ActionKind::Vote, call).await?;
        let _ = self.fetch_all().await;
        Ok(receipt)
    }

    pub async fn execute(&self, proposal_id: ProposalId) -> Result<TransactionReceipt, DaoError> {
        let _in_flight = self.dispatcher.begin(ActionKind::Execute)?;
        let call = ContractCall::execute(self.contracts.governance, proposal_id);
        let receipt = self.submit_and_confirm(ActionKind::Execute, call).await?;
        let _ = self.refresh_treasury().await;
        let _ = self.fetch_all().await;
        Ok(receipt)
    }

    /// Only offered to the owner established at connect time.
    pub async fn withdraw(&self) -> Result<TransactionReceipt, DaoError> {
        if !self.overview.read().await.is_owner {
            warn!("dispatcher: withdraw refused; signer is not the DAO owner");
            return Err(DaoError::NotOwner);
        }
        let _in_flight = self.dispatcher.begin(ActionKind::Withdraw)?;
        let call = ContractCall::withdraw(self.contracts.governance);
        let receipt = self.submit_and_confirm(ActionKind::Withdraw, call).await?;
        let _ = self.refresh_treasury().await;
        Ok(receipt)
    }

    async fn submit_and_confirm(
        &self,
        action: ActionKind,
        call: ContractCall,
    ) -> Result<TransactionReceipt, DaoError> {
        let outcome = async {
            let signer = self.session.lock().await.signer().await?;
            let pending = signer.submit(call).await?;
            info!(action = %action, tx = %pending.hash(), "dispatcher: waiting for transaction");
            let _ = self.events.send(ClientEvent::TransactionSubmitted {
                action,
                hash: pending.hash(),
            });
            pending.confirm(self.dispatcher.confirmation()).await
        }
        .await;

        match outcome {
            Ok(receipt) => {
                info!(
                    action = %action,
                    tx = %receipt.transaction_hash,
                    block = ?receipt.block_number,
                    "dispatcher: confirmed"
                );
                let _ = self.events.send(ClientEvent::ActionConfirmed {
                    action,
                    hash: receipt.transaction_hash,
                });
                Ok(receipt)
            }
            Err(err) => {
                error!(action = %action, code = ?err.code(), error = %err, "dispatcher: action failed");
                self.alert(&err);
                if matches!(err, DaoError::NetworkMismatch { .. }) {
                    self.clear_cached_state().await;
                }
                Err(err)
            }
        }
    }

    fn alert(&self, err: &DaoError) {
        let _ = self.events.send(ClientEvent::Alert(AlertPayload::from(err)));
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
