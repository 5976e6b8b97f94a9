//! The stores that feed the tally engine.
//!
//! The engine never keeps state between two tallies: it reads the election and the
//! full set of its ballots every time. Any persistence layer can be plugged in by
//! implementing [ElectionStore] and [BallotStore]. [MemoryStore] is the reference
//! implementation.

use std::collections::BTreeMap;

use log::debug;
use snafu::prelude::*;

use crate::config::*;

/// Lookup of elections and their candidates.
pub trait ElectionStore {
    fn election(&self, id: &ElectionId) -> Result<Election, TallyError>;

    /// The candidates of an election, in increasing index order.
    fn candidates(&self, id: &ElectionId) -> Result<Vec<Candidate>, TallyError>;
}

/// Append-only storage of ballots.
pub trait BallotStore {
    /// All the ballots of an election, sorted by voter and then by cast time.
    fn ballots(&self, id: &ElectionId) -> Result<Vec<Ballot>, TallyError>;

    /// Adds a ballot. Ballots already stored are never modified.
    fn put_ballot(&mut self, ballot: Ballot) -> Result<(), TallyError>;
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct ElectionRecord {
    election: Election,
    candidates: Vec<Candidate>,
}

/// Elections and ballots held in memory.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MemoryStore {
    elections: BTreeMap<ElectionId, ElectionRecord>,
    ballots: BTreeMap<ElectionId, Vec<Ballot>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Registers an election. An election with the same id is replaced, along with
    /// its ballots.
    pub fn insert_election(&mut self, election: Election, candidates: Vec<Candidate>) {
        let mut candidates = candidates;
        candidates.sort_by_key(|c| c.index);
        let id = election.id.clone();
        debug!(
            "insert_election: {} with {} candidates",
            id,
            candidates.len()
        );
        self.ballots.insert(id.clone(), Vec::new());
        self.elections.insert(
            id,
            ElectionRecord {
                election,
                candidates,
            },
        );
    }

    fn record(&self, id: &ElectionId) -> Result<&ElectionRecord, TallyError> {
        self.elections
            .get(id)
            .context(UnknownElectionSnafu {
                election: id.clone(),
            })
    }
}

impl ElectionStore for MemoryStore {
    fn election(&self, id: &ElectionId) -> Result<Election, TallyError> {
        Ok(self.record(id)?.election.clone())
    }

    fn candidates(&self, id: &ElectionId) -> Result<Vec<Candidate>, TallyError> {
        Ok(self.record(id)?.candidates.clone())
    }
}

impl BallotStore for MemoryStore {
    fn ballots(&self, id: &ElectionId) -> Result<Vec<Ballot>, TallyError> {
        self.record(id)?;
        let mut res: Vec<Ballot> = self.ballots.get(id).cloned().unwrap_or_default();
        // Stable: ballots of a voter cast at the same instant keep their insertion order.
        res.sort_by(|a, b| (&a.voter, a.cast_time).cmp(&(&b.voter, b.cast_time)));
        Ok(res)
    }

    fn put_ballot(&mut self, ballot: Ballot) -> Result<(), TallyError> {
        self.record(&ballot.election)?;
        self.ballots
            .entry(ballot.election.clone())
            .or_insert_with(Vec::new)
            .push(ballot);
        Ok(())
    }
}
