use clap::Parser;

/// This is the scoring program of the Song of the Week contest.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the round: sources of the songs and
    /// of the votes, participants, tiebreak rules and ledger location.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the summary of a round in JSON format. If provided, sotw will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the round will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A CSV file with the submissions (title, artists, submitter). Overrides the
    /// submission source of the --config option.
    #[clap(short, long, value_parser)]
    pub submissions: Option<String>,

    /// (file path) A CSV file with the ballots (voter, then one column per song). Overrides the
    /// ballot source of the --config option.
    #[clap(short, long, value_parser)]
    pub ballots: Option<String>,

    /// (integer) The seed of the tiebreak draw. Overrides the seed of the --config option.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// Only compares the song names of the ballots with the submissions, and stops.
    #[clap(long, takes_value = false)]
    pub check: bool,

    /// Computes the results without writing the ledger.
    #[clap(long, takes_value = false)]
    pub dry_run: bool,

    /// Writes the ledger even when some submissions do not appear on the ballots.
    #[clap(long, takes_value = false)]
    pub force: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
