use clap::Parser;

/// This is a tabulation program for ranked-choice elections with delayed ballot visibility.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file containing the description of the election and its ballots, in JSON.
    /// For more information about the file format, read the documentation of the `blind_tally::manual` module.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (nanoseconds since the Unix epoch, optional) The instant of the tally. Only the ballots
    /// viewable at this instant are counted. Defaults to the current time.
    #[clap(short, long, value_parser)]
    pub now: Option<i64>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Otherwise it is printed on the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, blindvote will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
