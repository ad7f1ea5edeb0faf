use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Turn private C/C++ sources into their clean public variant.",
	long_about = "docstrip normalizes C and C++ sources for publication.\n\nFor every file it \
	              removes Doxygen block comments and inline doc markers, adds a provenance \
	              notice once, collapses redundant blank lines around declarations and runs \
	              clang-format with a fixed style.\n\nQuick start:\n  docstrip include/        \
	              Normalize a directory in place\n  docstrip --dry-run src/  Show what would \
	              change\n  docstrip publish --source src --destination include/sdk",
	args_conflicts_with_subcommands = true,
	subcommand_negates_reqs = true
)]
pub struct DocstripCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	#[command(flatten)]
	pub run: RunArgs,

	/// Use this config file instead of discovering `docstrip.toml`.
	#[arg(long, short, global = true)]
	pub config: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Copy headers into a public tree and normalize the copies.
	///
	/// Every header under `--source` is copied to the same relative path under
	/// `--destination`. Lines between `#BEGIN_COPY_IGNORING` and
	/// `#END_COPY_IGNORING` are left out. The copies are then stripped of doc
	/// comments, or run through the full pipeline with `--full`.
	Publish {
		/// Private source tree to copy headers from.
		#[arg(long)]
		source: PathBuf,

		/// Public tree that receives the copies.
		#[arg(long)]
		destination: PathBuf,

		/// Run the full pipeline on the copies instead of only stripping doc
		/// comments.
		#[arg(long, default_value_t = false)]
		full: bool,

		#[command(flatten)]
		pipeline: PipelineArgs,
	},
}

/// Arguments of the default normalize run.
#[derive(Args)]
pub struct RunArgs {
	/// File or directory to normalize in place.
	#[arg(required = true)]
	pub path: Option<PathBuf>,

	/// Only remove doc comments. No notice, blank-line collapsing or
	/// formatting.
	#[arg(long, default_value_t = false)]
	pub strip_only: bool,

	/// Compute the result and report which files would change without
	/// writing anything. The formatter is not run.
	#[arg(long, default_value_t = false)]
	pub dry_run: bool,

	#[command(flatten)]
	pub pipeline: PipelineArgs,
}

/// Overrides shared by every command that runs the pipeline. Each one takes
/// precedence over the matching `docstrip.toml` value.
#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct PipelineArgs {
	/// Skip the external formatter.
	#[arg(long, default_value_t = false)]
	pub no_format: bool,

	/// Formatter executable, `clang-format` unless configured otherwise.
	#[arg(long, value_name = "CMD")]
	pub formatter: Option<String>,

	/// Seconds before a formatter run is abandoned. `0` waits forever.
	#[arg(long, value_name = "SECS")]
	pub timeout: Option<u64>,

	/// Number of worker threads. `0` uses every available core.
	#[arg(long, short, value_name = "N")]
	pub jobs: Option<usize>,

	/// Decode files that are neither UTF-8 nor in a detectable encoding as
	/// Windows-1252 instead of skipping them.
	#[arg(long, default_value_t = false)]
	pub legacy_fallback: bool,

	/// Do not guess the encoding of files that are not valid UTF-8.
	#[arg(long, default_value_t = false)]
	pub no_detect: bool,

	/// Output format for the report. Use `text` for human-readable output
	/// or `json` for programmatic consumption.
	#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors.
	Text,
	/// The full report as JSON.
	Json,
}
