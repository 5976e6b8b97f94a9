use crate::poll::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

/// The refresh interval, either as a named preset or in nanoseconds.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefreshSetting {
    Nanos(i64),
    Preset(String),
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
}

impl FileSource {
    /// The row (starting at 1) of the first ballot, if it was set.
    pub fn first_vote_row_index(&self) -> PollResult<Option<usize>> {
        match self._first_vote_row_index {
            None => Ok(None),
            ref x => read_js_int(x).map(Some),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollCandidate {
    pub name: String,
    pub blurb: Option<String>,
}

/// A ballot as written in a configuration or a ballot file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ParsedBallot {
    pub voter: String,
    pub ordering: Vec<i32>,
    #[serde(rename = "castTime")]
    pub cast_time: i64,
    #[serde(rename = "viewableTime")]
    pub viewable_time: Option<i64>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    pub title: String,
    #[serde(rename = "refreshInterval")]
    pub refresh_interval: RefreshSetting,
    pub start: Option<i64>,
    pub end: Option<i64>,
    #[serde(rename = "hideResults")]
    pub hide_results: Option<bool>,
    pub emails: Option<Vec<String>>,
    pub candidates: Vec<PollCandidate>,
    #[serde(rename = "ballotSources")]
    pub ballot_sources: Option<Vec<FileSource>>,
    pub ballots: Option<Vec<ParsedBallot>>,
}

impl PollConfig {
    pub fn refresh_interval(&self) -> PollResult<RefreshInterval> {
        match &self.refresh_interval {
            RefreshSetting::Nanos(n) => Ok(RefreshInterval::from_nanos(*n)),
            RefreshSetting::Preset(name) => RefreshInterval::parse_preset(name)
                .context(UnknownRefreshPresetSnafu { name: name.clone() }),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub title: String,
    #[serde(rename = "refreshInterval")]
    pub refresh_interval: i64,
    pub end: i64,
    pub open: bool,
}

pub fn read_config(path: &str) -> PollResult<PollConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.to_string(),
    })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

pub fn read_summary(path: String) -> PollResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    debug!("read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> PollResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let js = r#"{
            "title": "Lunch",
            "refreshInterval": "10minute",
            "start": 0,
            "end": 1000,
            "hideResults": true,
            "emails": ["a@example.com"],
            "candidates": [{"name": "Pizza"}, {"name": "Tacos", "blurb": "al pastor"}],
            "ballotSources": [{"provider": "csv", "filePath": "b.csv", "firstVoteRowIndex": "2"}],
            "ballots": [{"voter": "a@example.com", "ordering": [1, 2], "castTime": 5}]
        }"#;
        let config: PollConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.refresh_interval().unwrap(), RefreshInterval::TEN_MINUTES);
        assert_eq!(config.candidates[1].blurb, Some("al pastor".to_string()));
        let sources = config.ballot_sources.unwrap();
        assert_eq!(sources[0].first_vote_row_index().unwrap(), Some(2));
        let ballots = config.ballots.unwrap();
        assert_eq!(ballots[0].viewable_time, None);
    }

    #[test]
    fn refresh_interval_in_nanos() {
        let js = r#"{"title": "t", "refreshInterval": 42, "candidates": []}"#;
        let config: PollConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.refresh_interval().unwrap(), RefreshInterval::from_nanos(42));
        assert_eq!(config.ballot_sources, None);
    }

    #[test]
    fn unknown_preset() {
        let js = r#"{"title": "t", "refreshInterval": "fortnight", "candidates": []}"#;
        let config: PollConfig = serde_json::from_str(js).unwrap();
        assert!(matches!(
            config.refresh_interval(),
            Err(PollError::UnknownRefreshPreset { .. })
        ));
    }
}
