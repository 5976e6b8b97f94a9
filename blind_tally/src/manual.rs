/*!

This is the long-form manual for `blind_tally` and `blindvote`.

## How a tally works

A tally is always computed from scratch, from all the ballots of an election as they
stand at a single instant `now`:

1. **Selection.** Ballots are read sorted by voter and cast time. For every voter,
   only the ballots whose viewable time is not after `now` are considered, and the
   one cast last is kept. A voter contributes at most one ballot.
2. **Pairwise matrix.** For each kept ballot, every candidate ranked better than
   another one gets one point over it. Unranked candidates (rank `0` or less) come
   after all the ranked ones and stay tied with each other.
3. **Strongest paths.** Head-to-head defeats are dropped, then the strength of the
   strongest path between every pair of candidates is computed (Schulze method).
4. **Tiers.** The candidates that nobody beats on strongest paths form the first
   tier. They are removed and the process repeats. Candidates in the same tier are
   tied.
5. **Count.** The number of counted ballots is published on the
   2, 5, 10, 20, 50, 100, ... scale, rounded to the closer value (down on a tie).

## Delayed visibility

A ballot cast at `t` in an election refreshed every `r` becomes viewable at
`floor((t + blind + r) / r) * r`, with `blind` drawn uniformly in `[0, r)` from a
cryptographic source. It is always strictly after `t`, and at most `2r` later.
Results therefore only move on refresh boundaries, and the viewable time does not
reveal when the ballot was cast.

The refresh interval can be given as a number of nanoseconds or as one of the presets:

| preset     | interval   |
|------------|------------|
| `1second`  | 1 second   |
| `1minute`  | 1 minute   |
| `10minute` | 10 minutes |
| `hour`     | 1 hour     |
| `day`      | 1 day      |

## Configuration

`blindvote` reads a JSON description of the election:

```text
{
  "title": "Lunch",
  "refreshInterval": "1minute",
  "start": 0,
  "end": 1700000000000000000,
  "hideResults": false,
  "emails": ["alice@example.com", "bob@example.com"],
  "candidates": [{"name": "Pizza"}, {"name": "Tacos", "blurb": "al pastor"}],
  "ballotSources": [{"provider": "csv", "filePath": "ballots.csv"}],
  "ballots": [
    {"voter": "alice@example.com", "ordering": [1, 2], "castTime": 10, "viewableTime": 60000000000}
  ]
}
```

All the times are in nanoseconds since the Unix epoch. A ballot without a
`viewableTime` is scheduled when it is loaded, as if it had just been cast at its
`castTime`.

### csv

Ballot files in CSV have one ballot per line:

```text
voter,castTime,viewableTime,Pizza,Tacos
alice@example.com,10,60000000000,1,2
bob@example.com,20,,2,
```

The header row is optional (see `firstVoteRowIndex`). An empty `viewableTime`
schedules the ballot. An empty rank leaves the candidate unranked.

 */
