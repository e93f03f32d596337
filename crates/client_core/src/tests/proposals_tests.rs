use super::*;
use alloy_primitives::U256;
use chrono::Utc;
use shared::domain::TokenId;

use crate::{
    fake_ledger::{transport, FakeLedger, GOVERNANCE},
    ledger::Ledger,
};

fn governance(ledger: &std::sync::Arc<FakeLedger>) -> GovernanceContract {
    GovernanceContract::new(Ledger::new(transport(ledger)), GOVERNANCE)
}

fn proposal(id: u64, executed: bool) -> Proposal {
    Proposal {
        id: ProposalId(id),
        nft_token_id: TokenId(U256::from(id + 100)),
        deadline: Utc::now(),
        yay_votes: U256::ZERO,
        nay_votes: U256::ZERO,
        executed,
    }
}

#[tokio::test]
async fn fetch_returns_every_proposal_in_id_order() {
    let ledger = FakeLedger::new();
    ledger.with(|chain| {
        for token in 0..7 {
            chain.push_proposal(token + 10, 60, token, 0, token % 3 == 0);
        }
    });

    let fetched = fetch_proposals(&governance(&ledger), 7, 3)
        .await
        .expect("fetch");
    assert_eq!(fetched.len(), 7);
    for (index, proposal) in fetched.iter().enumerate() {
        assert_eq!(proposal.id, ProposalId(index as u64));
        assert_eq!(proposal.nft_token_id, TokenId(U256::from(index as u64 + 10)));
        assert_eq!(proposal.yay_votes, U256::from(index as u64));
        assert_eq!(proposal.executed, index % 3 == 0);
    }
    assert_eq!(ledger.calls_to("eth_call"), 7);
}

#[tokio::test]
async fn zero_count_reads_nothing() {
    let ledger = FakeLedger::new();
    let fetched = fetch_proposals(&governance(&ledger), 0, 4)
        .await
        .expect("fetch");
    assert!(fetched.is_empty());
    assert_eq!(ledger.calls_to("eth_call"), 0);
}

#[tokio::test]
async fn a_single_failed_read_fails_the_batch() {
    let ledger = FakeLedger::new();
    ledger.with(|chain| {
        for token in 0..3 {
            chain.push_proposal(token, 60, 0, 0, false);
        }
        chain.failing_proposal_reads.insert(1);
    });

    let err = fetch_proposals(&governance(&ledger), 3, 2)
        .await
        .expect_err("batch must fail");
    assert!(matches!(err, DaoError::ReadFailure(ref msg) if msg.contains("proposal 1")));
}

#[tokio::test]
async fn reading_past_the_count_fails() {
    let ledger = FakeLedger::new();
    ledger.with(|chain| chain.push_proposal(1, 60, 0, 0, false));
    assert!(fetch_proposals(&governance(&ledger), 2, 2).await.is_err());
}

#[test]
fn book_replaces_list_with_a_consistent_batch() {
    let mut book = ProposalBook::default();
    book.set_count(2);
    book.apply(vec![proposal(0, false), proposal(1, true)])
        .expect("apply");
    assert_eq!(book.count(), 2);
    assert_eq!(book.proposals().len(), 2);

    book.apply(vec![proposal(0, true), proposal(1, true), proposal(2, false)])
        .expect("growing batch");
    assert_eq!(book.proposals().len(), 3);
}

#[test]
fn book_rejects_out_of_order_batch() {
    let mut book = ProposalBook::default();
    let seeded = vec![proposal(0, false)];
    book.apply(seeded.clone()).expect("seed");

    let err = book
        .apply(vec![proposal(1, false), proposal(0, false)])
        .expect_err("out of order");
    assert!(matches!(err, DaoError::ReadFailure(_)));
    assert_eq!(book.proposals(), seeded.as_slice());
}

#[test]
fn book_rejects_executed_regression_and_keeps_previous_list() {
    let mut book = ProposalBook::default();
    let seeded = vec![proposal(0, true), proposal(1, false)];
    book.apply(seeded.clone()).expect("seed");

    let err = book
        .apply(vec![proposal(0, false), proposal(1, false)])
        .expect_err("regression");
    assert!(matches!(err, DaoError::ReadFailure(ref msg) if msg.contains("proposal 0")));
    assert_eq!(book.proposals(), seeded.as_slice());
}

#[test]
fn book_rejects_batch_missing_an_executed_proposal() {
    let mut book = ProposalBook::default();
    let seeded = vec![proposal(0, false), proposal(1, false), proposal(2, true)];
    book.apply(seeded.clone()).expect("seed");

    let err = book
        .apply(vec![proposal(0, false), proposal(1, false)])
        .expect_err("shorter batch");
    assert!(matches!(err, DaoError::ReadFailure(ref msg) if msg.contains("proposal 2")));
    assert_eq!(book.proposals(), seeded.as_slice());
}

#[test]
fn book_drops_batch_overtaken_by_newer_fetch() {
    let mut book = ProposalBook::default();
    let mut newer = vec![proposal(0, false)];
    newer[0].yay_votes = U256::from(3u64);
    let older = vec![proposal(0, false)];

    assert!(book.apply_fetched(2, newer.clone()).expect("newer"));
    assert!(!book.apply_fetched(1, older).expect("older is dropped"));
    assert_eq!(book.proposals(), newer.as_slice());

    assert!(book.apply_fetched(3, vec![proposal(0, true)]).expect("next"));
    assert!(book.proposals()[0].executed);
}

#[test]
fn cleared_book_drops_batches_started_before_the_reset() {
    let mut book = ProposalBook::default();
    book.set_count(1);
    assert!(book.apply_fetched(1, vec![proposal(0, false)]).expect("first"));

    book.clear(3);
    assert_eq!(book.count(), 0);
    assert!(book.proposals().is_empty());
    assert!(!book.apply_fetched(3, vec![proposal(0, false)]).expect("started before reset"));
    assert!(book.proposals().is_empty());
    assert!(book.apply_fetched(4, vec![proposal(0, false)]).expect("after reset"));
}
