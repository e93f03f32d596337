use super::*;
use crate::fake_ledger::{transport, FakeChain, FakeLedger, ALICE, BOB};
use shared::domain::ChainId;

fn session(ledger: &Arc<FakeLedger>) -> SessionManager {
    SessionManager::new(transport(ledger), NetworkIdentity::new(5, "goerli"))
}

#[tokio::test]
async fn connect_on_required_network_yields_signing_and_read_accessors() {
    let ledger = FakeLedger::new();
    let mut session = session(&ledger);

    let connection = session.connect().await.expect("connect");
    assert_eq!(connection.chain_id(), ChainId(5));
    assert_eq!(connection.account(), Some(ALICE));
    assert_eq!(session.state().status(), ConnectionStatus::Connected);

    let reader = session.accessor(false).await.expect("read accessor");
    assert!(!reader.is_signing());
    let signer = session.accessor(true).await.expect("signing accessor");
    assert!(signer.is_signing());
    assert_eq!(session.signer().await.expect("signer").address(), ALICE);
}

#[tokio::test]
async fn connect_on_unsupported_network_fails_and_yields_no_accessor() {
    let ledger = FakeLedger::with_chain(FakeChain {
        chain_id: 1,
        ..FakeChain::default()
    });
    let mut session = session(&ledger);

    let err = session.connect().await.err().expect("must fail");
    assert_eq!(
        err,
        DaoError::NetworkMismatch {
            expected: ChainId(5),
            actual: ChainId(1),
        }
    );
    assert_eq!(session.state().status(), ConnectionStatus::Mismatched);
    assert!(matches!(
        session.accessor(false).await,
        Err(DaoError::NetworkMismatch { .. })
    ));
    assert!(matches!(
        session.accessor(true).await,
        Err(DaoError::NetworkMismatch { .. })
    ));
}

#[tokio::test]
async fn switching_network_after_connect_invalidates_accessors() {
    let ledger = FakeLedger::new();
    let mut session = session(&ledger);
    session.connect().await.expect("connect");

    ledger.with(|chain| chain.chain_id = 137);
    assert!(matches!(
        session.accessor(false).await,
        Err(DaoError::NetworkMismatch { .. })
    ));
    assert_eq!(session.state().status(), ConnectionStatus::Mismatched);

    ledger.with(|chain| chain.chain_id = 5);
    session.connect().await.expect("manual reconnect");
    assert!(session.accessor(false).await.is_ok());
}

#[tokio::test]
async fn accessor_before_connect_is_not_connected() {
    let ledger = FakeLedger::new();
    let mut session = session(&ledger);
    assert!(matches!(
        session.accessor(false).await,
        Err(DaoError::NotConnected)
    ));
    assert_eq!(ledger.calls_to("eth_chainId"), 0);
}

#[tokio::test]
async fn falls_back_to_eth_accounts_when_wallet_prompt_is_unsupported() {
    let ledger = FakeLedger::with_chain(FakeChain {
        supports_request_accounts: false,
        ..FakeChain::default()
    });
    let mut session = session(&ledger);

    let connection = session.connect().await.expect("connect");
    assert_eq!(connection.account(), Some(ALICE));
    assert_eq!(ledger.calls_to("eth_accounts"), 1);
}

#[tokio::test]
async fn configured_account_selects_among_exposed_accounts() {
    let ledger = FakeLedger::with_chain(FakeChain {
        accounts: vec![ALICE, BOB],
        ..FakeChain::default()
    });
    let mut session = session(&ledger).with_account(Some(BOB));
    session.connect().await.expect("connect");
    assert_eq!(session.signer().await.expect("signer").address(), BOB);
}

#[tokio::test]
async fn wallet_without_accounts_is_read_only() {
    let ledger = FakeLedger::with_chain(FakeChain {
        accounts: Vec::new(),
        ..FakeChain::default()
    });
    let mut session = session(&ledger);
    session.connect().await.expect("connect");

    assert!(session.reader().await.is_ok());
    assert!(matches!(session.signer().await, Err(DaoError::NoSigner)));
}

#[tokio::test]
async fn disconnect_resets_state() {
    let ledger = FakeLedger::new();
    let mut session = session(&ledger);
    session.connect().await.expect("connect");
    session.disconnect();
    assert_eq!(session.state().status(), ConnectionStatus::Disconnected);
    assert!(matches!(
        session.accessor(false).await,
        Err(DaoError::NotConnected)
    ));
}
