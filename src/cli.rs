use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Top-level CLI entry point.
#[derive(Debug, Parser)]
#[command(
    name = "probel",
    version,
    about = "Restore missing spaces in concatenated classifieds text via a remote LLM"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run inference over the input table and write a submission file.
    Predict(PredictArgs),
    /// Rebuild a submission so it covers exactly the required id set.
    Fix(FixArgs),
    /// Health-check the endpoint and run sample phrases through it.
    Check(CheckArgs),
}

/// Which API shape the remote endpoint speaks.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Api {
    /// Ollama-style POST /api/generate.
    Generate,
    /// OpenAI-compatible POST /v1/chat/completions (vLLM).
    Chat,
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Input table with `id` and `text_no_spaces` columns.
    #[arg(long, default_value = "dataset_1937770_3.txt")]
    pub dataset: PathBuf,
    /// Where to write the submission.
    #[arg(long, default_value = "submission.csv")]
    pub output: PathBuf,
    #[arg(long, value_enum, default_value_t = Api::Generate)]
    pub api: Api,
    /// Model identifier; defaults to LLM_MODEL or the built-in tag.
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Debug, Args)]
pub struct FixArgs {
    /// Reference dataset the required id set is derived from.
    #[arg(long, default_value = "dataset_1937770_3.txt")]
    pub dataset: PathBuf,
    /// Existing submission to repair (missing file means every id gets []).
    #[arg(long, default_value = "submission.csv")]
    pub submission: PathBuf,
    /// Repaired submission (standard CSV quoting).
    #[arg(long, default_value = "submission_fixed_final.csv")]
    pub output: PathBuf,
    /// Variant with the list field unquoted.
    #[arg(long, default_value = "submission_fixed_no_quotes.csv")]
    pub unquoted_output: PathBuf,
    /// Variant with the list field always double-quoted.
    #[arg(long, default_value = "submission_fixed_with_quotes.csv")]
    pub quoted_output: PathBuf,
    /// Id range length to assume when the dataset is unreadable.
    #[arg(long, default_value_t = 1005)]
    pub fallback_len: usize,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[arg(long, value_enum, default_value_t = Api::Generate)]
    pub api: Api,
    /// Model identifier; defaults to LLM_MODEL or the built-in tag.
    #[arg(long)]
    pub model: Option<String>,
}
