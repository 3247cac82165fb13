use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderKind {
    /// InnerTube player API: caption language list plus metadata
    Innertube,
    /// Legacy timedtext endpoint: English captions only, no metadata
    Timedtext,
}

#[derive(Parser)]
#[command(
    name = "ytnode",
    about = "Resolve YouTube transcripts and metadata, one record per input",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Video IDs, URLs or JSON item objects (reads lines from stdin if omitted)
    pub inputs: Vec<String>,

    /// Preferred caption language [default: en]
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Include the channel id in each record
    #[arg(long)]
    pub channel_id: bool,

    /// Include the channel name in each record
    #[arg(long)]
    pub channel_name: bool,

    /// Include the video title in each record
    #[arg(long)]
    pub title: bool,

    /// Record failing items as error entries instead of aborting
    #[arg(short, long)]
    pub continue_on_fail: bool,

    /// Video data provider [default: innertube]
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show per-item progress on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
