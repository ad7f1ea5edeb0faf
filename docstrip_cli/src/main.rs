use std::path::Path;
use std::process;

use clap::Parser;
use docstrip_cli::Commands;
use docstrip_cli::DocstripCli;
use docstrip_cli::OutputFormat;
use docstrip_cli::PipelineArgs;
use docstrip_core::AnyEmptyResult;
use docstrip_core::BatchReport;
use docstrip_core::DocstripConfig;
use docstrip_core::DocstripError;
use docstrip_core::FileReport;
use docstrip_core::FileStatus;
use docstrip_core::PipelineMode;
use docstrip_core::PipelineOptions;
use docstrip_core::publish::CopiedFile;
use docstrip_core::publish::copy_headers;
use docstrip_core::run_batch;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,dimmed) => {
		if color_enabled() {
			format!("{}", $text.dimmed())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

/// Log filter used when `DOCSTRIP_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "error";
const VERBOSE_LOG_FILTER: &str = "docstrip_core=debug,docstrip=debug";

fn main() {
	let args = DocstripCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Publish {
			source,
			destination,
			full,
			pipeline,
		}) => run_publish(&args, source, destination, *full, pipeline),
		None => run_normalize(&args),
	};

	if let Err(e) = result {
		// Render through miette for error codes and help text.
		match e.downcast::<DocstripError>() {
			Ok(error) => {
				let report: miette::Report = (*error).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let fallback = if verbose {
		VERBOSE_LOG_FILTER
	} else {
		DEFAULT_LOG_FILTER
	};
	let filter =
		EnvFilter::try_from_env("DOCSTRIP_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.try_init()
		.ok();
}

/// Load the explicit `--config` file or discover one next to `target`.
fn load_config(args: &DocstripCli, target: &Path) -> Result<DocstripConfig, DocstripError> {
	match &args.config {
		Some(path) => DocstripConfig::load_file(path),
		None => DocstripConfig::discover(target),
	}
}

/// Merge command-line overrides into options built from the config file.
fn apply_overrides(options: &mut PipelineOptions, pipeline: &PipelineArgs) {
	if pipeline.no_format {
		options.format = false;
	}
	if let Some(command) = &pipeline.formatter {
		options.formatter_command.clone_from(command);
	}
	if let Some(timeout) = pipeline.timeout {
		options.formatter_timeout_secs = timeout;
	}
	if let Some(jobs) = pipeline.jobs {
		options.jobs = jobs;
	}
	if pipeline.legacy_fallback {
		options.encoding.legacy_fallback = true;
	}
	if pipeline.no_detect {
		options.encoding.detect = false;
	}
}

fn run_normalize(args: &DocstripCli) -> AnyEmptyResult {
	let Some(root) = args.run.path.clone() else {
		return Err("no path given. Run `docstrip --help` for usage.".into());
	};

	if !root.exists() {
		return Err(Box::new(DocstripError::MissingRoot {
			path: root.display().to_string(),
		}));
	}

	let config = load_config(args, &root)?;
	let mut options = PipelineOptions::from_config(&config);
	apply_overrides(&mut options, &args.run.pipeline);
	options.dry_run = args.run.dry_run;
	if args.run.strip_only {
		options.mode = PipelineMode::StripOnly;
	}

	let report = run_batch(&root, &options)?;

	match args.run.pipeline.format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
		OutputFormat::Text => print_report(&report, options.dry_run),
	}

	Ok(())
}

fn run_publish(
	args: &DocstripCli,
	source: &Path,
	destination: &Path,
	full: bool,
	pipeline: &PipelineArgs,
) -> AnyEmptyResult {
	let config = load_config(args, source)?;
	let mut options = PipelineOptions::from_config(&config);
	apply_overrides(&mut options, pipeline);
	if !full {
		options.mode = PipelineMode::StripOnly;
	}

	let copied = copy_headers(source, destination, &config.copy, &options.encoding)?;
	let report = run_batch(destination, &options)?;

	match pipeline.format {
		OutputFormat::Json => {
			let output = serde_json::json!({
				"copied": copied,
				"report": report,
			});
			println!("{}", serde_json::to_string_pretty(&output)?);
		}
		OutputFormat::Text => {
			print_copied(&copied, source);
			print_report(&report, false);
		}
	}

	Ok(())
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.ok()
		.filter(|relative| !relative.as_os_str().is_empty())
		.unwrap_or(path)
		.display()
		.to_string()
}

fn print_copied(copied: &[CopiedFile], source: &Path) {
	for file in copied {
		let rel = make_relative(&file.source, source);
		match &file.status {
			FileStatus::Normalized { changed: true } => {
				println!("{} {rel}", colored!("copied", green));
			}
			FileStatus::Normalized { changed: false } => {
				println!("{} {rel}", colored!("unchanged", dimmed));
			}
			FileStatus::Skipped { reason } => {
				println!("{} {rel}: {reason}", colored!("skipped", red));
			}
		}
	}
	println!();
}

fn print_file(file: &FileReport, root: &Path, dry_run: bool) {
	let rel = make_relative(&file.path, root);
	match &file.status {
		FileStatus::Normalized { changed: true } => {
			let label = if dry_run { "would change" } else { "normalized" };
			println!("{} {rel}", colored!(label, green));
		}
		FileStatus::Normalized { changed: false } => {
			println!("{} {rel}", colored!("unchanged", dimmed));
		}
		FileStatus::Skipped { reason } => {
			println!("{} {rel}: {reason}", colored!("skipped", red));
		}
	}

	for warning in &file.warnings {
		println!("  {} {warning}", colored!("warning:", yellow));
	}
}

fn print_report(report: &BatchReport, dry_run: bool) {
	for file in &report.files {
		print_file(file, &report.root, dry_run);
	}

	let total = report.files.len();
	let changed = report.changed_count();
	let skipped = report.skipped_count();
	let unchanged = total - changed - skipped;
	let verb = if dry_run { "would change" } else { "normalized" };
	let summary = format!(
		"{total} file(s): {changed} {verb}, {unchanged} unchanged, {skipped} skipped, {} \
		 warning(s)",
		report.warning_count()
	);
	println!();
	println!("{}", colored!(summary, bold));
}
