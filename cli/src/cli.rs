use clap::Parser;
use clap::ValueEnum;
use std::path::PathBuf;

/// Lets a language model play a text-based terminal game: game output goes to
/// the model, the model's `<command>` replies are typed back into the game.
#[derive(Parser, Debug)]
#[command(name = "autoquest", version)]
pub struct Cli {
    /// Configuration file to load. When omitted, `autoquest.toml` in the
    /// current directory is used if present.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Model that plays the game.
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Model that writes history summaries.
    #[arg(long = "summary-model")]
    pub summary_model: Option<String>,

    /// Number of executed commands between summarization cuts.
    #[arg(long = "summarize-after", value_name = "N")]
    pub summarize_after: Option<u32>,

    /// File whose contents replace the built-in system prompt.
    #[arg(long = "system-prompt", value_name = "FILE")]
    pub system_prompt: Option<PathBuf>,

    /// File whose contents replace the built-in summarization instruction.
    #[arg(long = "summary-prompt", value_name = "FILE")]
    pub summary_prompt: Option<PathBuf>,

    /// File the produced summaries are appended to.
    #[arg(long = "summary-log", value_name = "FILE")]
    pub summary_log: Option<PathBuf>,

    /// Tell the game process to use the specified directory as its working
    /// root.
    #[clap(long = "cd", short = 'C', value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Specifies color settings for use in the output.
    #[arg(long = "color", value_enum, default_value_t = Color::Auto)]
    pub color: Color,

    /// Game command to run, overriding `[game] command` from the
    /// configuration file. Must follow a `--` separator.
    #[arg(value_name = "GAME_COMMAND", last = true)]
    pub game_command: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum Color {
    Always,
    Never,
    #[default]
    Auto,
}
