use clap::{Parser, Subcommand};

/// Data-cleaning tools for election-poll voter rosters.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// (file path, optional) A JSON file with roster options (column names,
    /// category prefix, target count, reference year, ...). Command-line
    /// flags take precedence over the fields of this file.
    #[clap(short, long, global = true, value_parser)]
    pub config: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, global = true, takes_value = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Randomly downsamples one category of roster records to a target count,
    /// keeping every other record.
    Sample {
        /// (file path) The roster CSV file to read.
        #[clap(short, long, value_parser)]
        input: String,

        /// (file path or empty) Where to write the downsampled roster.
        /// Defaults to `<input>_filtered.csv` next to the input.
        #[clap(short, long, value_parser)]
        out: Option<String>,

        /// Case-insensitive matric-number prefix of the category to downsample.
        #[clap(long, value_parser)]
        prefix: Option<String>,

        /// Number of matching records to keep.
        #[clap(long, value_parser)]
        target: Option<usize>,

        /// Seed for a reproducible selection. The selection is seeded from the
        /// operating system when this is not given.
        #[clap(long, value_parser)]
        seed: Option<u64>,
    },

    /// Reshapes roster columns into the fixed five-column schema expected by
    /// the voter-upload tool.
    Prepare {
        /// (file path) The roster CSV file to read, typically the output of `sample`.
        #[clap(short, long, value_parser)]
        input: String,

        /// (file path or empty) Where to write the voters file.
        /// Defaults to `<input>_voters_ready.csv` next to the input.
        #[clap(short, long, value_parser)]
        out: Option<String>,

        /// Two-digit intake year of the current first-year cohort, used to
        /// derive the academic level from the matric number.
        #[clap(long, value_parser)]
        reference_year: Option<i32>,

        /// Domain of the addresses synthesized for rows without a username.
        #[clap(long, value_parser)]
        email_domain: Option<String>,
    },
}
