// ********* Input data structures ***********

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::time::{SystemTime, UNIX_EPOCH};

/// An instant, in nanoseconds since the Unix epoch (UTC).
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);
    pub const MAX: Timestamp = Timestamp(i64::MAX);

    pub fn from_nanos(nanos: i64) -> Timestamp {
        Timestamp(nanos)
    }

    /// The current wall clock.
    ///
    /// A tally should read this once and reuse the value for every comparison it makes.
    pub fn now() -> Timestamp {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Timestamp(i64::try_from(nanos).unwrap_or(i64::MAX))
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// How often the results of an election are refreshed, in nanoseconds.
///
/// It also bounds the visibility delay of a ballot: a ballot becomes countable
/// between one and two intervals after it was cast.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshInterval(i64);

impl RefreshInterval {
    pub const SECOND: RefreshInterval = RefreshInterval(1_000_000_000);
    pub const MINUTE: RefreshInterval = RefreshInterval(60 * 1_000_000_000);
    pub const TEN_MINUTES: RefreshInterval = RefreshInterval(10 * 60 * 1_000_000_000);
    pub const HOUR: RefreshInterval = RefreshInterval(60 * 60 * 1_000_000_000);
    pub const DAY: RefreshInterval = RefreshInterval(24 * 60 * 60 * 1_000_000_000);

    pub fn from_nanos(nanos: i64) -> RefreshInterval {
        RefreshInterval(nanos)
    }

    /// The named presets offered when creating an election.
    pub fn parse_preset(name: &str) -> Option<RefreshInterval> {
        match name {
            "1second" => Some(RefreshInterval::SECOND),
            "1minute" => Some(RefreshInterval::MINUTE),
            "10minute" => Some(RefreshInterval::TEN_MINUTES),
            "hour" => Some(RefreshInterval::HOUR),
            "day" => Some(RefreshInterval::DAY),
            _ => None,
        }
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElectionId(pub String);

impl Display for ElectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ElectionId {
    fn from(s: &str) -> Self {
        ElectionId(s.to_string())
    }
}

/// The identity of a voter. It is also the entry in the allow-list of an election.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterId(pub String);

impl Display for VoterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VoterId {
    fn from(s: &str) -> Self {
        VoterId(s.to_string())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    pub title: String,
    /// When the election opened.
    pub created: Timestamp,
    /// When the election is over. Ballots cast at or after this instant are refused.
    pub end: Timestamp,
    pub refresh_interval: RefreshInterval,
    /// If set, results are not published before the end of the election.
    pub hide_results: bool,
    pub num_candidates: usize,
    /// The voters allowed to cast a ballot. Empty means anyone.
    pub allowed_voters: BTreeSet<VoterId>,
}

impl Election {
    pub fn is_voter_allowed(&self, voter: &VoterId) -> bool {
        self.allowed_voters.is_empty() || self.allowed_voters.contains(voter)
    }

    pub fn is_open(&self, now: Timestamp) -> bool {
        self.created <= now && now < self.end
    }

    /// Checks that `voter` may cast a ballot at `cast_time`.
    pub fn check_submission(&self, voter: &VoterId, cast_time: Timestamp) -> Result<(), TallyError> {
        ensure!(
            self.is_voter_allowed(voter),
            VoterNotAllowedSnafu {
                voter: voter.clone()
            }
        );
        ensure!(cast_time < self.end, ElectionClosedSnafu { end: self.end });
        Ok(())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub blurb: Option<String>,
    /// The row and column of this candidate in all the matrices of a tally.
    pub index: usize,
}

/// A ballot, as stored. Ballots are never updated: a voter who changes their mind
/// casts a new one.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Ballot {
    pub election: ElectionId,
    pub voter: VoterId,
    /// `ordering[i]` is the rank given to candidate `i`. Lower is better and two
    /// candidates may share a rank. A rank `<= 0` means unranked (tied for last).
    pub ordering: Vec<i32>,
    pub cast_time: Timestamp,
    /// The earliest instant at which this ballot may be counted.
    pub viewable_time: Timestamp,
}

// ******** Output data structures *********

/// A set of candidate indices tied at the same rank, in increasing index order.
pub type Tier = Vec<usize>;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TallyResult {
    /// Tiers from best to worst.
    pub tiers: Vec<Tier>,
    /// The rounded number of ballots that were counted.
    pub blurred_count: u64,
    /// Selected ballots that could not be counted because their ordering did not
    /// match the candidates of the election.
    pub rejected: u64,
}

/// What an observer of an election is allowed to see at a given time.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub enum PublicResults {
    /// The election hides its results until it ends.
    Hidden { until: Timestamp },
    Visible(TallyResult),
}

/// Errors raised by the tally engine and the ballot submission path.
///
/// Ties, unranked candidates, elections without any ballot or a stalled
/// extraction of the tiers are normal outcomes and never errors.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TallyError {
    #[snafu(display("The refresh interval must be positive, got {refresh_interval}ns"))]
    InvalidConfig { refresh_interval: i64 },

    #[snafu(display("Expected {expected} candidates, found {found}"))]
    CandidateCountMismatch { expected: usize, found: usize },

    #[snafu(display(
        "Ballot from voter {voter} ranks {found} candidates, but the election has {expected}"
    ))]
    MalformedOrdering {
        voter: VoterId,
        expected: usize,
        found: usize,
    },

    #[snafu(display("Unknown election {election}"))]
    UnknownElection { election: ElectionId },

    #[snafu(display("Voter {voter} is not allowed to vote in this election"))]
    VoterNotAllowed { voter: VoterId },

    #[snafu(display("The election ended at {end}"))]
    ElectionClosed { end: Timestamp },

    #[snafu(display(
        "Ballot from voter {voter} is viewable at {viewable_time}, before it was cast at {cast_time}"
    ))]
    ViewableBeforeCast {
        voter: VoterId,
        cast_time: Timestamp,
        viewable_time: Timestamp,
    },

    #[snafu(display("Timestamp overflow while scheduling a ballot"))]
    TimestampOverflow {},

    #[snafu(display("Store error: {message}"))]
    Store { message: String },
}
