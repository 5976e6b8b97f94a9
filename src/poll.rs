use log::{debug, info, warn};

use blind_tally::builder::Builder;
use blind_tally::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;

use crate::poll::config_reader::*;

#[derive(Debug, Snafu)]
pub enum PollError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive number"))]
    ParsingJsonNumber {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Unknown refresh interval: '{name}'"))]
    UnknownRefreshPreset { name: String },
    #[snafu(display("Provider not implemented: {provider}"))]
    UnknownProvider { provider: String },

    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Invalid CSV: {source}"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Line {lineno}: invalid time '{value}'"))]
    CsvTime { lineno: usize, value: String },

    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Tally error: {source}"))]
    Tally { source: TallyError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PollResult<T> = Result<T, PollError>;

fn read_ballot_source(root_path: &Path, cfs: &FileSource) -> PollResult<Vec<ParsedBallot>> {
    let p = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read ballot file {:?}", p2);
    match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_ballots(p2, cfs),
        "json" => {
            let contents = fs::read_to_string(&p).context(OpeningJsonSnafu { path: p2 })?;
            serde_json::from_str(&contents).context(ParsingJsonSnafu {})
        }
        x => UnknownProviderSnafu {
            provider: x.to_string(),
        }
        .fail(),
    }
}

/// Loads an election and all its ballots into a store.
///
/// Ballot files are resolved relative to `root_path`. Ballots without a viewable
/// time are scheduled as if they had just been cast at their cast time. Ballots
/// from voters outside the allow-list, or cast once the election was over, are
/// skipped with a warning.
pub fn load_poll(
    election_id: &str,
    config: &PollConfig,
    root_path: &Path,
) -> PollResult<MemoryStore> {
    let refresh_interval = config.refresh_interval()?;
    let names: Vec<String> = config.candidates.iter().map(|c| c.name.clone()).collect();
    let mut builder = Builder::new(election_id, refresh_interval)
        .context(TallySnafu {})?
        .title(&config.title)
        .window(
            Timestamp::from_nanos(config.start.unwrap_or(0)),
            config.end.map(Timestamp::from_nanos).unwrap_or(Timestamp::MAX),
        )
        .hide_results(config.hide_results.unwrap_or(false))
        .allowed_voters(config.emails.as_deref().unwrap_or(&[]))
        .candidates(&names)
        .context(TallySnafu {})?;
    for (index, c) in config.candidates.iter().enumerate() {
        if let Some(blurb) = &c.blurb {
            builder = builder.blurb(index, blurb);
        }
    }

    let mut parsed: Vec<ParsedBallot> = config.ballots.clone().unwrap_or_default();
    for cfs in config.ballot_sources.iter().flatten() {
        let mut file_data = read_ballot_source(root_path, cfs)?;
        parsed.append(&mut file_data);
    }
    info!("Loaded {} ballots", parsed.len());

    let mut skipped: usize = 0;
    for pb in parsed {
        let cast_time = Timestamp::from_nanos(pb.cast_time);
        let viewable_time = match pb.viewable_time {
            Some(t) => Timestamp::from_nanos(t),
            None => schedule_visibility(cast_time, refresh_interval).context(TallySnafu {})?,
        };
        let res = builder.add_submitted_ballot(Ballot {
            election: ElectionId::from(election_id),
            voter: VoterId(pb.voter),
            ordering: pb.ordering,
            cast_time,
            viewable_time,
        });
        match res {
            Ok(()) => {}
            Err(e @ TallyError::VoterNotAllowed { .. })
            | Err(e @ TallyError::ElectionClosed { .. }) => {
                warn!("Skipping ballot: {}", e);
                skipped += 1;
            }
            Err(e) => return Err(PollError::Tally { source: e }),
        }
    }
    if skipped > 0 {
        info!("Skipped {} ballots", skipped);
    }

    Ok(builder.build())
}

fn results_to_json(results: &PublicResults, candidates: &[Candidate]) -> JSValue {
    match results {
        PublicResults::Hidden { until } => json!({
            "hidden": true,
            "until": until.as_nanos()
        }),
        PublicResults::Visible(res) => {
            let tiers: Vec<Vec<String>> = res
                .tiers
                .iter()
                .map(|t| {
                    t.iter()
                        .filter_map(|idx| candidates.get(*idx).map(|c| c.name.clone()))
                        .collect()
                })
                .collect();
            json!({
                "tiers": tiers,
                "approximateVotes": res.blurred_count,
                "rejectedBallots": res.rejected
            })
        }
    }
}

pub fn build_summary_js<S>(store: &S, election_id: &ElectionId, now: Timestamp) -> PollResult<JSValue>
where
    S: ElectionStore + BallotStore,
{
    let election = store.election(election_id).context(TallySnafu {})?;
    let candidates = store.candidates(election_id).context(TallySnafu {})?;
    let results = public_results(store, election_id, now).context(TallySnafu {})?;
    let voters = voter_count(store, election_id).context(TallySnafu {})?;
    let c = OutputConfig {
        title: election.title.clone(),
        refresh_interval: election.refresh_interval.as_nanos(),
        end: election.end.as_nanos(),
        open: election.is_open(now),
    };
    Ok(json!({
        "config": c,
        "voters": voters,
        "results": results_to_json(&results, &candidates)
    }))
}

fn write_output(out: &Option<String>, contents: &str) -> PollResult<()> {
    match out.as_deref() {
        None | Some("stdout") => {
            println!("{}", contents);
            Ok(())
        }
        Some(path) => {
            info!("Writing summary to {:?}", path);
            fs::write(path, contents).context(WritingOutputSnafu {
                path: path.to_string(),
            })
        }
    }
}

/// Runs the tally of the election described in `config_path` at `now`.
///
/// If a reference summary is given, the computed summary must match it.
pub fn run_tally(
    config_path: String,
    now: Timestamp,
    out: Option<String>,
    check_summary_path: Option<String>,
) -> PollResult<()> {
    let config_p = Path::new(config_path.as_str());
    let config = read_config(&config_path)?;
    info!("config: {:?}", config);

    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    let election_id = io_common::simplify_file_name(&config_path);
    let store = load_poll(&election_id, &config, root_p)?;

    let summary_js = build_summary_js(&store, &ElectionId::from(election_id.as_str()), now)?;
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    write_output(&out, &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        debug!("summary: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}
