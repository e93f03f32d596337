use futures::{stream, StreamExt, TryStreamExt};
use shared::{
    domain::{Proposal, ProposalId},
    error::DaoError,
};

use crate::contracts::GovernanceContract;

pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Last successfully fetched proposal set. Only ever replaced by a complete,
/// consistent batch.
#[derive(Debug, Clone, Default)]
pub struct ProposalBook {
    count: u64,
    proposals: Vec<Proposal>,
    generation: u64,
}

impl ProposalBook {
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn set_count(&mut self, count: u64) {
        self.count = count;
    }

    /// Empties the book. Batches from fetches started up to `generation`
    /// are dropped when they land afterwards.
    pub fn clear(&mut self, generation: u64) {
        self.count = 0;
        self.proposals.clear();
        self.generation = self.generation.max(generation);
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Rejects batches that are out of order or that show a proposal as
    /// un-executed after it was seen executed. The book is untouched on error.
    pub fn apply(&mut self, fetched: Vec<Proposal>) -> Result<(), DaoError> {
        if let Some((index, proposal)) = fetched
            .iter()
            .enumerate()
            .find(|(index, proposal)| proposal.id.0 != *index as u64)
        {
            return Err(DaoError::ReadFailure(format!(
                "proposal batch out of order: slot {index} holds proposal {}",
                proposal.id
            )));
        }

        for previous in self.proposals.iter().filter(|p| p.executed) {
            match fetched.get(previous.id.0 as usize) {
                Some(next) if next.executed => {}
                Some(_) => {
                    return Err(DaoError::ReadFailure(format!(
                        "proposal {} reported as not executed after it was executed",
                        previous.id
                    )))
                }
                None => {
                    return Err(DaoError::ReadFailure(format!(
                        "proposal batch of {} misses executed proposal {}",
                        fetched.len(),
                        previous.id
                    )))
                }
            }
        }

        self.proposals = fetched;
        Ok(())
    }

    /// Like `apply`, for a batch whose fetch started as `generation`. A batch
    /// older than the one already applied is dropped and `Ok(false)` returned.
    pub fn apply_fetched(
        &mut self,
        generation: u64,
        fetched: Vec<Proposal>,
    ) -> Result<bool, DaoError> {
        if generation <= self.generation {
            return Ok(false);
        }
        self.apply(fetched)?;
        self.generation = generation;
        Ok(true)
    }
}

/// Reads proposals `0..count` with at most `concurrency` requests in flight.
/// Results keep id order; the first failure aborts the batch.
pub async fn fetch_proposals(
    governance: &GovernanceContract,
    count: u64,
    concurrency: usize,
) -> Result<Vec<Proposal>, DaoError> {
    stream::iter((0..count).map(ProposalId))
        .map(|id| governance.proposal(id))
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

#[cfg(test)]
#[path = "tests/proposals_tests.rs"]
mod tests;
