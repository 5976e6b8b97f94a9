pub use crate::config::*;
use crate::store::{BallotStore, MemoryStore};
use crate::visibility;

use snafu::prelude::*;
use std::collections::BTreeSet;

/// A builder for an election and its ballots.
///
/// The result is an in-memory store, ready to be tallied.
///
/// ```
/// pub use blind_tally::builder::Builder;
/// pub use blind_tally::{ElectionId, RefreshInterval, Timestamp};
/// # use blind_tally::TallyError;
///
/// let mut builder = Builder::new("lunch", RefreshInterval::MINUTE)?
///     .candidates(&["Pizza".to_string(), "Tacos".to_string()])?;
///
/// builder.add_ballot_simple("alice", &[1, 2], Timestamp::EPOCH)?;
///
/// let store = builder.build();
/// let res = blind_tally::tally(&store, &ElectionId::from("lunch"), Timestamp::MAX)?;
/// assert_eq!(res.tiers, vec![vec![0], vec![1]]);
///
/// # Ok::<(), TallyError>(())
/// ```
pub struct Builder {
    pub(crate) _election: Election,
    pub(crate) _candidates: Vec<Candidate>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    /// A new election open from the epoch and without an end.
    pub fn new(id: &str, refresh_interval: RefreshInterval) -> Result<Builder, TallyError> {
        ensure!(
            refresh_interval.as_nanos() > 0,
            InvalidConfigSnafu {
                refresh_interval: refresh_interval.as_nanos()
            }
        );
        Ok(Builder {
            _election: Election {
                id: ElectionId::from(id),
                title: String::new(),
                created: Timestamp::EPOCH,
                end: Timestamp::MAX,
                refresh_interval,
                hide_results: false,
                num_candidates: 0,
                allowed_voters: BTreeSet::new(),
            },
            _candidates: Vec::new(),
            _ballots: Vec::new(),
        })
    }

    pub fn title(mut self, title: &str) -> Builder {
        self._election.title = title.to_string();
        self
    }

    pub fn window(mut self, created: Timestamp, end: Timestamp) -> Builder {
        self._election.created = created;
        self._election.end = end;
        self
    }

    pub fn hide_results(mut self, hide: bool) -> Builder {
        self._election.hide_results = hide;
        self
    }

    /// Restricts the election to these voters. An empty list lets anyone vote.
    pub fn allowed_voters(mut self, voters: &[String]) -> Builder {
        self._election.allowed_voters = voters.iter().map(|v| VoterId(v.clone())).collect();
        self
    }

    /// Sets the candidates, in index order. Ballots added so far are dropped.
    pub fn candidates(self, names: &[String]) -> Result<Builder, TallyError> {
        let candidates: Vec<Candidate> = names
            .iter()
            .enumerate()
            .map(|(index, name)| Candidate {
                name: name.clone(),
                blurb: None,
                index,
            })
            .collect();
        Ok(Builder {
            _election: Election {
                num_candidates: candidates.len(),
                ..self._election
            },
            _candidates: candidates,
            _ballots: Vec::new(),
        })
    }

    /// Attaches a description to the candidate at `index`, if there is one.
    pub fn blurb(mut self, index: usize, blurb: &str) -> Builder {
        if let Some(c) = self._candidates.get_mut(index) {
            c.blurb = Some(blurb.to_string());
        }
        self
    }

    /// Adds a ballot cast at `cast_time`. Its viewable time is scheduled as for any
    /// new ballot.
    ///
    /// ordering: the rank of each candidate, in candidate order. Lower is better and
    /// `0` leaves a candidate unranked.
    pub fn add_ballot_simple(
        &mut self,
        voter: &str,
        ordering: &[i32],
        cast_time: Timestamp,
    ) -> Result<(), TallyError> {
        ensure!(
            ordering.len() == self._election.num_candidates,
            MalformedOrderingSnafu {
                voter: VoterId::from(voter),
                expected: self._election.num_candidates,
                found: ordering.len(),
            }
        );
        let viewable_time = visibility::schedule(cast_time, self._election.refresh_interval)?;
        self.add_ballot(Ballot {
            election: self._election.id.clone(),
            voter: VoterId::from(voter),
            ordering: ordering.to_vec(),
            cast_time,
            viewable_time,
        })
    }

    /// Adds a ballot as it was stored, without any check on its ordering.
    ///
    /// The ballot cannot become viewable before it was cast.
    pub fn add_ballot(&mut self, ballot: Ballot) -> Result<(), TallyError> {
        ensure!(
            ballot.viewable_time >= ballot.cast_time,
            ViewableBeforeCastSnafu {
                voter: ballot.voter.clone(),
                cast_time: ballot.cast_time,
                viewable_time: ballot.viewable_time,
            }
        );
        self._ballots.push(Ballot {
            election: self._election.id.clone(),
            ..ballot
        });
        Ok(())
    }

    /// Adds a ballot as [Builder::add_ballot] does, if its voter was allowed to cast
    /// it at its cast time.
    pub fn add_submitted_ballot(&mut self, ballot: Ballot) -> Result<(), TallyError> {
        self._election.check_submission(&ballot.voter, ballot.cast_time)?;
        self.add_ballot(ballot)
    }

    pub fn build(self) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_election(self._election, self._candidates);
        for b in self._ballots {
            // The election was just registered.
            let _ = store.put_ballot(b);
        }
        store
    }
}
