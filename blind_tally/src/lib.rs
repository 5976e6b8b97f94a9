mod config;
pub mod blur;
pub mod builder;
pub mod graph;
pub mod manual;
pub mod schulze;
pub mod selector;
pub mod store;
pub mod tiers;
pub mod visibility;

use log::{debug, info, warn};
use snafu::prelude::*;

pub use crate::config::*;
pub use crate::graph::Matrix;
pub use crate::store::{BallotStore, ElectionStore, MemoryStore};

/// Computes the instant at which a ballot cast at `cast_time` may be counted.
///
/// The result is a multiple of the refresh interval, strictly after `cast_time`
/// and at most two intervals later.
pub fn schedule_visibility(
    cast_time: Timestamp,
    refresh_interval: RefreshInterval,
) -> Result<Timestamp, TallyError> {
    visibility::schedule(cast_time, refresh_interval)
}

/// Runs the tally of an election as it stands at `now`.
///
/// Arguments:
/// * `store` the source of the election, its candidates and its ballots
/// * `election_id` the election to tally
/// * `now` the instant of the tally. Every visibility check of this tally uses it.
///
/// Each voter contributes the last of their ballots that is visible at `now`.
/// Ballots whose ordering does not match the candidates are left out and
/// reported in [TallyResult::rejected].
pub fn tally<S>(
    store: &S,
    election_id: &ElectionId,
    now: Timestamp,
) -> Result<TallyResult, TallyError>
where
    S: ElectionStore + BallotStore,
{
    let election = store.election(election_id)?;
    let candidates = store.candidates(election_id)?;
    ensure!(
        candidates.len() == election.num_candidates,
        CandidateCountMismatchSnafu {
            expected: election.num_candidates,
            found: candidates.len(),
        }
    );
    {
        info!(
            "tally: election {} with {} candidates at {}",
            election_id,
            candidates.len(),
            now
        );
        for c in candidates.iter() {
            debug!("Candidate: {}: {}", c.index, c.name);
        }
    }

    let ballots = store.ballots(election_id)?;
    let selected = selector::select(ballots, now);

    let mut pairwise = Matrix::new(election.num_candidates);
    let mut count: u64 = 0;
    let mut rejected: u64 = 0;
    for ballot in selected.values() {
        match graph::accumulate(&mut pairwise, ballot) {
            Ok(()) => count += 1,
            Err(e) => {
                warn!("tally: excluding ballot: {}", e);
                rejected += 1;
            }
        }
    }
    debug!("tally: pairwise: {:?}", pairwise.rows());

    let closure = schulze::close(&pairwise);
    let tiers = tiers::extract(&closure);
    if tiers.iter().map(|t| t.len()).sum::<usize>() < election.num_candidates {
        warn!("tally: election {}: some candidates could not be ranked", election_id);
    }
    info!(
        "tally: election {}: {} ballots counted, {} rejected, {} tiers",
        election_id,
        count,
        rejected,
        tiers.len()
    );
    Ok(TallyResult {
        tiers,
        blurred_count: blur::blur(count),
        rejected,
    })
}

/// The results of an election as an observer may see them at `now`.
///
/// Elections that hide their results only show them once they are over.
pub fn public_results<S>(
    store: &S,
    election_id: &ElectionId,
    now: Timestamp,
) -> Result<PublicResults, TallyError>
where
    S: ElectionStore + BallotStore,
{
    let election = store.election(election_id)?;
    if election.hide_results && now < election.end {
        debug!(
            "public_results: election {} hidden until {}",
            election_id, election.end
        );
        return Ok(PublicResults::Hidden {
            until: election.end,
        });
    }
    Ok(PublicResults::Visible(tally(store, election_id, now)?))
}

/// Casts a ballot at `now` and stores it.
///
/// Negative ranks are stored as 0 (unranked). The returned ballot carries the
/// instant from which it will be counted.
pub fn cast_ballot<S>(
    store: &mut S,
    election_id: &ElectionId,
    voter: &VoterId,
    ordering: &[i32],
    now: Timestamp,
) -> Result<Ballot, TallyError>
where
    S: ElectionStore + BallotStore,
{
    let election = store.election(election_id)?;
    election.check_submission(voter, now)?;
    ensure!(
        ordering.len() == election.num_candidates,
        MalformedOrderingSnafu {
            voter: voter.clone(),
            expected: election.num_candidates,
            found: ordering.len(),
        }
    );

    let viewable_time = schedule_visibility(now, election.refresh_interval)?;
    let ballot = Ballot {
        election: election_id.clone(),
        voter: voter.clone(),
        ordering: ordering.iter().map(|&r| r.max(0)).collect(),
        cast_time: now,
        viewable_time,
    };
    store.put_ballot(ballot.clone())?;
    debug!(
        "cast_ballot: election {}: ballot from {} viewable at {}",
        election_id, voter, viewable_time
    );
    Ok(ballot)
}

/// The number of distinct voters who cast at least one ballot, visible or not.
pub fn voter_count<S>(store: &S, election_id: &ElectionId) -> Result<u64, TallyError>
where
    S: BallotStore,
{
    let ballots = store.ballots(election_id)?;
    let mut count: u64 = 0;
    let mut prev_voter: Option<&VoterId> = None;
    for b in ballots.iter() {
        if prev_voter != Some(&b.voter) {
            prev_voter = Some(&b.voter);
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::builder::Builder;
    use super::*;
    use proptest::prelude::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Random head-to-head counts with an empty diagonal.
    pub(crate) fn pairwise_strategy(n: usize) -> impl Strategy<Value = Matrix> {
        prop::collection::vec(0i64..20, n * n).prop_map(move |cells| {
            let rows: Vec<Vec<i64>> = cells
                .chunks(n)
                .enumerate()
                .map(|(i, r)| {
                    let mut row = r.to_vec();
                    row[i] = 0;
                    row
                })
                .collect();
            Matrix::from_rows(&rows).unwrap_or_else(|| Matrix::new(n))
        })
    }

    fn names(ns: &[&str]) -> Vec<String> {
        ns.iter().map(|s| s.to_string()).collect()
    }

    fn stored(voter: &str, ordering: &[i32], cast: i64, viewable: i64) -> Ballot {
        Ballot {
            election: ElectionId::from("lunch"),
            voter: VoterId::from(voter),
            ordering: ordering.to_vec(),
            cast_time: Timestamp::from_nanos(cast),
            viewable_time: Timestamp::from_nanos(viewable),
        }
    }

    fn lunch() -> Builder {
        Builder::new("lunch", RefreshInterval::from_nanos(10))
            .unwrap()
            .title("Lunch")
            .candidates(&names(&["Pizza", "Tacos", "Sushi"]))
            .unwrap()
    }

    #[test]
    fn three_candidates_strict_order() {
        init();
        let mut builder = lunch();
        builder.add_ballot(stored("a", &[1, 2, 3], 1, 10)).unwrap();
        builder.add_ballot(stored("b", &[1, 2, 3], 1, 10)).unwrap();
        builder.add_ballot(stored("c", &[3, 2, 1], 1, 10)).unwrap();
        let store = builder.build();

        let res = tally(&store, &ElectionId::from("lunch"), Timestamp::from_nanos(20)).unwrap();
        assert_eq!(res.tiers, vec![vec![0], vec![1], vec![2]]);
        assert_eq!(res.blurred_count, 2);
        assert_eq!(res.rejected, 0);
    }

    #[test]
    fn all_unranked_is_a_full_tie() {
        init();
        let mut builder = lunch();
        builder.add_ballot(stored("a", &[0, 0, 0], 1, 10)).unwrap();
        builder.add_ballot(stored("b", &[0, 0, 0], 1, 10)).unwrap();
        let store = builder.build();

        let res = tally(&store, &ElectionId::from("lunch"), Timestamp::from_nanos(20)).unwrap();
        assert_eq!(res.tiers, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn no_ballots() {
        init();
        let store = lunch().build();
        let res = tally(&store, &ElectionId::from("lunch"), Timestamp::from_nanos(20)).unwrap();
        assert_eq!(res.tiers, vec![vec![0, 1, 2]]);
        assert_eq!(res.blurred_count, 0);
    }

    #[test]
    fn hidden_and_superseded_ballots() {
        init();
        let mut builder = lunch();
        // "a" changed their mind, the second ballot is visible.
        builder.add_ballot(stored("a", &[3, 2, 1], 1, 10)).unwrap();
        builder.add_ballot(stored("a", &[1, 2, 3], 5, 20)).unwrap();
        // The third ballot of "b" is not visible yet: the second one counts.
        builder.add_ballot(stored("b", &[3, 2, 1], 1, 10)).unwrap();
        builder.add_ballot(stored("b", &[1, 2, 3], 2, 10)).unwrap();
        builder.add_ballot(stored("b", &[3, 1, 2], 25, 40)).unwrap();
        // Nothing from "c" is visible.
        builder.add_ballot(stored("c", &[3, 2, 1], 25, 40)).unwrap();
        let store = builder.build();

        let res = tally(&store, &ElectionId::from("lunch"), Timestamp::from_nanos(30)).unwrap();
        assert_eq!(res.tiers, vec![vec![0], vec![1], vec![2]]);
        assert_eq!(res.blurred_count, 2);

        let later = tally(&store, &ElectionId::from("lunch"), Timestamp::from_nanos(40)).unwrap();
        // The new ballots of "b" and "c" both put Pizza last.
        assert_eq!(later.tiers, vec![vec![1], vec![2], vec![0]]);
        assert_eq!(later.blurred_count, 2);
    }

    #[test]
    fn malformed_ballot_is_excluded() {
        init();
        let mut builder = lunch();
        builder.add_ballot(stored("a", &[1, 2, 3], 1, 10)).unwrap();
        builder.add_ballot(stored("b", &[1, 2], 1, 10)).unwrap();
        let store = builder.build();

        let res = tally(&store, &ElectionId::from("lunch"), Timestamp::from_nanos(20)).unwrap();
        assert_eq!(res.tiers, vec![vec![0], vec![1], vec![2]]);
        assert_eq!(res.rejected, 1);
    }

    #[test]
    fn candidate_count_mismatch() {
        init();
        let builder = lunch();
        let mut election = builder._election.clone();
        election.num_candidates = 4;
        let mut store = MemoryStore::new();
        store.insert_election(election, builder._candidates.clone());
        let res = tally(&store, &ElectionId::from("lunch"), Timestamp::from_nanos(20));
        assert_eq!(
            res,
            Err(TallyError::CandidateCountMismatch {
                expected: 4,
                found: 3
            })
        );
    }

    #[test]
    fn unknown_election() {
        let store = MemoryStore::new();
        let res = tally(&store, &ElectionId::from("nope"), Timestamp::EPOCH);
        assert_eq!(
            res,
            Err(TallyError::UnknownElection {
                election: ElectionId::from("nope")
            })
        );
    }

    #[test]
    fn cast_then_tally() {
        init();
        let mut store = lunch().build();
        let id = ElectionId::from("lunch");
        let now = Timestamp::from_nanos(1_000);
        let b = cast_ballot(&mut store, &id, &VoterId::from("a"), &[2, -1, 1], now).unwrap();
        assert_eq!(b.ordering, vec![2, 0, 1]);
        assert!(b.viewable_time > now);
        assert_eq!(b.viewable_time.as_nanos() % 10, 0);

        // Not visible yet.
        let res = tally(&store, &id, now).unwrap();
        assert_eq!(res.blurred_count, 0);

        let res = tally(&store, &id, b.viewable_time).unwrap();
        assert_eq!(res.blurred_count, 2);
        assert_eq!(res.tiers, vec![vec![2], vec![0], vec![1]]);
        assert_eq!(voter_count(&store, &id), Ok(1));
    }

    #[test]
    fn cast_checks() {
        init();
        let mut store = lunch()
            .window(Timestamp::EPOCH, Timestamp::from_nanos(100))
            .allowed_voters(&names(&["a"]))
            .build();
        let id = ElectionId::from("lunch");
        assert_eq!(
            cast_ballot(&mut store, &id, &VoterId::from("b"), &[1, 2, 3], Timestamp::EPOCH),
            Err(TallyError::VoterNotAllowed {
                voter: VoterId::from("b")
            })
        );
        assert_eq!(
            cast_ballot(&mut store, &id, &VoterId::from("a"), &[1, 2, 3], Timestamp::from_nanos(100)),
            Err(TallyError::ElectionClosed {
                end: Timestamp::from_nanos(100)
            })
        );
        assert_eq!(
            cast_ballot(&mut store, &id, &VoterId::from("a"), &[1, 2], Timestamp::EPOCH),
            Err(TallyError::MalformedOrdering {
                voter: VoterId::from("a"),
                expected: 3,
                found: 2
            })
        );
        assert_eq!(voter_count(&store, &id), Ok(0));
    }

    #[test]
    fn voter_count_ignores_visibility() {
        let mut builder = lunch();
        builder.add_ballot(stored("a", &[1, 2, 3], 1, 10)).unwrap();
        builder.add_ballot(stored("a", &[1, 2, 3], 2, 10)).unwrap();
        builder.add_ballot(stored("b", &[1, 2, 3], 1, 1_000)).unwrap();
        let store = builder.build();
        assert_eq!(voter_count(&store, &ElectionId::from("lunch")), Ok(2));
    }

    #[test]
    fn hidden_results_until_the_end() {
        init();
        let mut builder = lunch()
            .window(Timestamp::EPOCH, Timestamp::from_nanos(100))
            .hide_results(true);
        builder.add_ballot(stored("a", &[1, 2, 3], 1, 10)).unwrap();
        let store = builder.build();
        let id = ElectionId::from("lunch");

        assert_eq!(
            public_results(&store, &id, Timestamp::from_nanos(50)),
            Ok(PublicResults::Hidden {
                until: Timestamp::from_nanos(100)
            })
        );
        match public_results(&store, &id, Timestamp::from_nanos(100)) {
            Ok(PublicResults::Visible(res)) => {
                assert_eq!(res.tiers, vec![vec![0], vec![1], vec![2]])
            }
            x => panic!("unexpected results {:?}", x),
        }
    }
}
