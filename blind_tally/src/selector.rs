//! Selection of the ballots that count in a tally.

use log::{debug, warn};
use std::collections::BTreeMap;

use crate::config::*;

/// Selects, for every voter, the ballot that counts at `now`.
///
/// The ballots must be sorted by voter and then by cast time, which is the
/// natural enumeration order of the ballot store. They are not sorted again here.
///
/// Within the ballots of a voter, only those with `viewable_time <= now` are
/// considered, and the one cast last wins. A voter whose ballots are all still
/// hidden is absent from the result.
pub fn select<I>(ballots: I, now: Timestamp) -> BTreeMap<VoterId, Ballot>
where
    I: IntoIterator<Item = Ballot>,
{
    let mut selected: BTreeMap<VoterId, Ballot> = BTreeMap::new();
    let mut current_voter: Option<VoterId> = None;
    let mut latest: Option<Ballot> = None;
    let mut num_seen: usize = 0;

    for b in ballots {
        num_seen += 1;
        if current_voter.as_ref() != Some(&b.voter) {
            if let Some(l) = latest.take() {
                keep(&mut selected, l);
            }
            current_voter = Some(b.voter.clone());
        }
        // Hidden ballots have no effect on anything.
        if b.viewable_time > now {
            continue;
        }
        let is_later = latest
            .as_ref()
            .map_or(true, |l| b.cast_time > l.cast_time);
        if is_later {
            latest = Some(b);
        }
    }
    if let Some(l) = latest {
        keep(&mut selected, l);
    }
    debug!(
        "select: {} ballots seen, {} voters selected at {}",
        num_seen,
        selected.len(),
        now
    );
    selected
}

fn keep(selected: &mut BTreeMap<VoterId, Ballot>, ballot: Ballot) {
    match selected.get(&ballot.voter) {
        // Only happens when the input is not grouped by voter.
        Some(previous) => {
            warn!(
                "select: ballots of voter {} are not contiguous in the input",
                ballot.voter
            );
            if ballot.cast_time > previous.cast_time {
                selected.insert(ballot.voter.clone(), ballot);
            }
        }
        None => {
            selected.insert(ballot.voter.clone(), ballot);
        }
    }
}
