pub mod client;
pub mod config;
pub mod contracts;
pub mod deployer;
pub mod dispatcher;
pub mod ledger;
pub mod proposals;
pub mod session;
pub mod transport;
pub mod view;

pub use client::{ClientEvent, ClientOptions, ContractAddresses, DaoClient, DaoSnapshot};
pub use dispatcher::ActionKind;
pub use ledger::ConfirmationPolicy;
pub use session::{ConnectionStatus, SessionManager};
pub use transport::{HttpTransport, RpcTransport};

#[cfg(test)]
#[path = "tests/fake_ledger.rs"]
pub(crate) mod fake_ledger;
