use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "brainfilter",
    version,
    about = "Hide YouTube entries by predicted category"
)]
pub struct Cli {
    /// Model artifact: file path or http(s) URL
    #[arg(long, env = "BRAINFILTER_MODEL", global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Predict the category of one or more titles
    Classify(ClassifyArgs),
    /// Decide whether a single entry would be hidden
    Check(CheckArgs),
    /// Read entries from stdin (JSON or bare titles), write one decision per line
    Batch(BatchArgs),
    /// Show model metadata
    Inspect,
    /// Print the tokens a title is split into
    Tokenize(TokenizeArgs),
}

#[derive(Parser)]
pub struct ClassifyArgs {
    /// Titles to classify
    #[arg(required = true)]
    pub titles: Vec<String>,

    /// Print the full prediction as JSON, one object per title
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Video title
    pub title: String,

    /// Hour of day 0-23 (default: local time)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
    pub hour: Option<u8>,

    /// Channel name, checked against blocked_channels
    #[arg(long)]
    pub channel: Option<String>,

    /// Treat the entry as a Short
    #[arg(long)]
    pub short: bool,
}

#[derive(Parser)]
pub struct BatchArgs {
    /// Hour of day 0-23 (default: local time)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
    pub hour: Option<u8>,
}

#[derive(Parser)]
pub struct TokenizeArgs {
    /// Text to tokenize
    pub text: String,
}
