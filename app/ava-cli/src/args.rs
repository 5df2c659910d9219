use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, bin_name = "ava", about = "Chat with Ava in the terminal")]
pub struct CliArgs {
    /// JSON config file. Missing fields fall back to defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Model used for general chat.
    #[arg(long)]
    pub chat_model: Option<String>,

    /// Model used by actions (summaries, questions, insights).
    #[arg(long)]
    pub action_model: Option<String>,

    /// Answer from a scripted offline model instead of the configured provider.
    #[arg(long, default_value_t = false)]
    pub offline: bool,
}
