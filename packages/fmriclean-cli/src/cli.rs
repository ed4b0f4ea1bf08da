use clap::{Args, Parser, Subcommand, ValueEnum};

use fmriclean_rs::PipelineChain;

#[derive(Parser)]
#[command(
    name = "fmriclean",
    version,
    about = "EEG-fMRI artifact cleaning with provenance-tracked BIDS derivatives",
    long_about = "Clean EEG recordings acquired during fMRI sessions.\n\
                  Each processing stage writes its result into a DERIVATIVES tree whose\n\
                  folder name encodes the exact sequence of stages applied."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Clean every recording under a raw-data root
    Batch(BatchArgs),
    /// List the recordings of a dataset with their parsed entities
    Index(IndexArgs),
    /// Generate a simulated BIDS dataset for trial runs
    Simulate(SimulateArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChainArg {
    /// Gradient (when the task calls for it) then cardiac removal
    Cbin,
    /// Cbin followed by subspace reconstruction
    CbinAsr,
    /// Cbin, automated re-referencing, then subspace reconstruction
    Full,
}

impl From<ChainArg> for PipelineChain {
    fn from(arg: ChainArg) -> Self {
        match arg {
            ChainArg::Cbin => PipelineChain::Cbin,
            ChainArg::CbinAsr => PipelineChain::CbinAsr,
            ChainArg::Full => PipelineChain::Full,
        }
    }
}

#[derive(Args)]
pub struct BatchArgs {
    /// Raw-data root of the dataset (the directory named after the raw tree)
    pub root: String,

    /// Recording extensions to index
    #[arg(long, num_args = 1.., default_values_t = vec!["csv".to_string(), "txt".to_string(), "st".to_string()])]
    pub extensions: Vec<String>,

    /// Only clean recordings whose path matches this glob pattern
    #[arg(long)]
    pub pattern: Option<String>,

    /// Stage chain to run on each recording
    #[arg(long, value_enum, default_value_t = ChainArg::Full)]
    pub chain: ChainArg,

    /// Task labels recorded with scanner gradients switched on
    #[arg(long, num_args = 1..)]
    pub gradient_tasks: Option<Vec<String>>,

    /// Task labels recorded without gradients
    #[arg(long, num_args = 1..)]
    pub no_gradient_tasks: Option<Vec<String>>,

    /// Print the matching recordings and exit
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct IndexArgs {
    /// Raw-data root of the dataset
    pub root: String,

    /// Recording extensions to index
    #[arg(long, num_args = 1.., default_values_t = vec!["csv".to_string(), "txt".to_string(), "st".to_string()])]
    pub extensions: Vec<String>,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Directory the dataset is created under
    pub root: String,

    /// Number of subjects
    #[arg(long, default_value_t = 1)]
    pub subjects: usize,

    /// Number of sessions per subject
    #[arg(long, default_value_t = 1)]
    pub sessions: usize,

    /// Number of runs per session
    #[arg(long, default_value_t = 1)]
    pub runs: usize,

    /// Task label written into filenames and sidecars
    #[arg(long, default_value = "checker")]
    pub task: String,

    /// Name of the raw-data folder
    #[arg(long, default_value = "RAW")]
    pub data_folder: String,

    /// Sampling frequency in Hz
    #[arg(long, default_value_t = 256.0)]
    pub sfreq: f64,

    /// Recording duration in seconds
    #[arg(long, default_value_t = 2.0)]
    pub duration: f64,

    /// Number of EEG channels
    #[arg(long, default_value_t = 8)]
    pub channels: usize,

    /// Number of volume triggers marked in the events table
    #[arg(long, default_value_t = 10)]
    pub triggers: usize,
}
