//! Wallet-backed session: connect, enforce the required network, and hand out
//! read-only or signing accessors derived from the same connection.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use shared::{
    domain::{ChainId, NetworkIdentity},
    error::DaoError,
    protocol::TransactionRequest,
};
use tracing::{error, info, warn};

use crate::{
    contracts::ContractCall,
    ledger::{Ledger, PendingTransaction},
    transport::RpcTransport,
};

#[derive(Clone)]
pub struct Connection {
    ledger: Ledger,
    chain_id: ChainId,
    account: Option<Address>,
}

impl Connection {
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }
}

pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected(Connection),
    Mismatched { expected: ChainId, actual: ChainId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Mismatched,
}

impl ConnectionState {
    pub fn status(&self) -> ConnectionStatus {
        match self {
            ConnectionState::Disconnected => ConnectionStatus::Disconnected,
            ConnectionState::Connecting => ConnectionStatus::Connecting,
            ConnectionState::Connected(_) => ConnectionStatus::Connected,
            ConnectionState::Mismatched { .. } => ConnectionStatus::Mismatched,
        }
    }
}

#[derive(Clone)]
pub struct ReadOnlyAccess {
    ledger: Ledger,
}

impl ReadOnlyAccess {
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

#[derive(Clone)]
pub struct SigningAccess {
    ledger: Ledger,
    from: Address,
}

impl SigningAccess {
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn address(&self) -> Address {
        self.from
    }

    pub async fn submit(&self, call: ContractCall) -> Result<PendingTransaction, DaoError> {
        self.send(TransactionRequest {
            from: self.from,
            to: Some(call.to),
            data: call.data,
            value: call.value,
        })
        .await
    }

    /// Contract creation: no recipient, init code as data.
    pub async fn deploy(
        &self,
        init_code: Bytes,
        value: Option<U256>,
    ) -> Result<PendingTransaction, DaoError> {
        self.send(TransactionRequest {
            from: self.from,
            to: None,
            data: init_code,
            value,
        })
        .await
    }

    async fn send(&self, request: TransactionRequest) -> Result<PendingTransaction, DaoError> {
        let hash = self
            .ledger
            .send_transaction(request)
            .await
            .map_err(DaoError::submission)?;
        Ok(PendingTransaction::new(self.ledger.clone(), hash))
    }
}

pub enum Accessor {
    ReadOnly(ReadOnlyAccess),
    Signing(SigningAccess),
}

impl Accessor {
    pub fn ledger(&self) -> &Ledger {
        match self {
            Accessor::ReadOnly(access) => access.ledger(),
            Accessor::Signing(access) => access.ledger(),
        }
    }

    pub fn is_signing(&self) -> bool {
        matches!(self, Accessor::Signing(_))
    }
}

pub struct SessionManager {
    transport: Arc<dyn RpcTransport>,
    required: NetworkIdentity,
    preferred_account: Option<Address>,
    state: ConnectionState,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn RpcTransport>, required: NetworkIdentity) -> Self {
        Self {
            transport,
            required,
            preferred_account: None,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn with_account(mut self, account: Option<Address>) -> Self {
        self.preferred_account = account;
        self
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn required_network(&self) -> &NetworkIdentity {
        &self.required
    }

    /// Prompts the wallet once and checks the network. A mismatch leaves the
    /// session in `Mismatched`; there is no retry.
    pub async fn connect(&mut self) -> Result<Connection, DaoError> {
        self.state = ConnectionState::Connecting;
        let ledger = Ledger::new(Arc::clone(&self.transport));

        let accounts = match ledger.request_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                self.state = ConnectionState::Disconnected;
                return Err(DaoError::read(format!("wallet connection failed: {err:#}")));
            }
        };
        let chain_id = match ledger.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(err) => {
                self.state = ConnectionState::Disconnected;
                return Err(DaoError::read(format!("wallet connection failed: {err:#}")));
            }
        };
        self.ensure_required_network(chain_id)?;

        let account = self.select_account(&accounts);
        info!(
            chain_id = chain_id.0,
            account = ?account,
            "session: connected to {}",
            self.required.name
        );
        let connection = Connection {
            ledger,
            chain_id,
            account,
        };
        self.state = ConnectionState::Connected(connection.clone());
        Ok(connection)
    }

    pub fn disconnect(&mut self) {
        if !matches!(self.state, ConnectionState::Disconnected) {
            info!("session: disconnected");
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Re-checks the network on every request, since the wallet may switch
    /// chains under an established connection.
    pub async fn accessor(&mut self, needs_signing: bool) -> Result<Accessor, DaoError> {
        let connection = match &self.state {
            ConnectionState::Connected(connection) => connection.clone(),
            ConnectionState::Mismatched { expected, actual } => {
                return Err(DaoError::NetworkMismatch {
                    expected: *expected,
                    actual: *actual,
                })
            }
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                return Err(DaoError::NotConnected)
            }
        };

        let chain_id = connection.ledger.chain_id().await.map_err(DaoError::read)?;
        self.ensure_required_network(chain_id)?;

        if !needs_signing {
            return Ok(Accessor::ReadOnly(ReadOnlyAccess {
                ledger: connection.ledger,
            }));
        }
        let from = connection.account.ok_or(DaoError::NoSigner)?;
        Ok(Accessor::Signing(SigningAccess {
            ledger: connection.ledger,
            from,
        }))
    }

    pub async fn reader(&mut self) -> Result<ReadOnlyAccess, DaoError> {
        match self.accessor(false).await? {
            Accessor::ReadOnly(access) => Ok(access),
            Accessor::Signing(access) => Ok(ReadOnlyAccess {
                ledger: access.ledger,
            }),
        }
    }

    pub async fn signer(&mut self) -> Result<SigningAccess, DaoError> {
        match self.accessor(true).await? {
            Accessor::Signing(access) => Ok(access),
            Accessor::ReadOnly(_) => Err(DaoError::NoSigner),
        }
    }

    fn ensure_required_network(&mut self, actual: ChainId) -> Result<(), DaoError> {
        let expected = self.required.chain_id;
        if actual == expected {
            return Ok(());
        }
        error!(
            expected = expected.0,
            actual = actual.0,
            "session: change to {} network!",
            self.required.name
        );
        self.state = ConnectionState::Mismatched { expected, actual };
        Err(DaoError::NetworkMismatch { expected, actual })
    }

    fn select_account(&self, accounts: &[Address]) -> Option<Address> {
        match self.preferred_account {
            Some(preferred) if accounts.contains(&preferred) => Some(preferred),
            Some(preferred) => {
                warn!(account = %preferred, "session: configured account not exposed by wallet; read-only session");
                None
            }
            None => accounts.first().copied(),
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
