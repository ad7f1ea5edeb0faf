use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use rayon::prelude::*;
use serde::Serialize;

use crate::DocstripError;
use crate::DocstripResult;
use crate::config::extension_in;
use crate::formatter::CommandFormatter;
use crate::formatter::Formatter;
use crate::pipeline::FileReport;
use crate::pipeline::PipelineContext;
use crate::pipeline::PipelineOptions;

/// Result of a batch run over a directory or a single file.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
	pub root: PathBuf,
	pub files: Vec<FileReport>,
}

impl BatchReport {
	pub fn changed_count(&self) -> usize {
		self.files.iter().filter(|file| file.is_changed()).count()
	}

	pub fn skipped_count(&self) -> usize {
		self.files.iter().filter(|file| file.is_skipped()).count()
	}

	pub fn warning_count(&self) -> usize {
		self.files.iter().map(|file| file.warnings.len()).sum()
	}
}

/// Build a `Gitignore` matcher from exclude patterns. These follow
/// `.gitignore` syntax relative to `root`.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> DocstripResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder
			.add_line(None, pattern)
			.map_err(|e| DocstripError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			})?;
	}
	builder.build().map_err(|e| DocstripError::InvalidPattern {
		pattern: patterns.join(", "),
		reason: e.to_string(),
	})
}

/// Collect every regular file under `root` with an allowed extension.
///
/// A single file is returned as-is regardless of its extension. The result is
/// sorted for deterministic ordering.
pub fn collect_files(
	root: &Path,
	extensions: &[String],
	exclude_patterns: &[String],
) -> DocstripResult<Vec<PathBuf>> {
	if !root.exists() {
		return Err(DocstripError::MissingRoot {
			path: root.display().to_string(),
		});
	}

	if root.is_file() {
		return Ok(vec![root.to_path_buf()]);
	}

	let exclude = build_exclude_matcher(root, exclude_patterns)?;
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();
	walk_dir(root, extensions, &exclude, &mut files, &mut visited_dirs)?;
	files.sort();

	Ok(files)
}

fn walk_dir(
	dir: &Path,
	extensions: &[String],
	exclude: &Gitignore,
	files: &mut Vec<PathBuf>,
	visited_dirs: &mut HashSet<PathBuf>,
) -> DocstripResult<()> {
	// Symlinked directories can loop back on themselves.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		tracing::warn!(path = %dir.display(), "skipping directory already visited through a symlink");
		return Ok(());
	}

	let entries = std::fs::read_dir(dir)?;

	for entry in entries {
		let entry = match entry {
			Ok(entry) => entry,
			Err(error) => {
				tracing::warn!(path = %dir.display(), "skipping unreadable entry: {error}");
				continue;
			}
		};
		let path = entry.path();

		if path.file_name().is_some_and(|name| name == ".git") {
			continue;
		}

		let is_dir = path.is_dir();
		if exclude.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if is_dir {
			// Only the root may fail the walk. Below it, unreadable directories
			// are reported and left out.
			if let Err(error) = walk_dir(&path, extensions, exclude, files, visited_dirs) {
				tracing::warn!(path = %path.display(), "skipping unreadable directory: {error}");
			}
		} else if path.is_file() && extension_in(&path, extensions) {
			files.push(path);
		}
	}

	Ok(())
}

/// Run the pipeline over `root` with the formatter named in `options`.
pub fn run_batch(root: &Path, options: &PipelineOptions) -> DocstripResult<BatchReport> {
	let formatter = CommandFormatter::new(
		options.formatter_command.clone(),
		options.formatter_timeout_secs,
	);
	run_batch_with_formatter(root, options, &formatter)
}

/// Run the pipeline over `root`.
///
/// Files are processed independently on a worker pool. A failure on one file
/// is recorded in its report and never stops the others. Only configuration
/// problems (missing root, unusable formatter, bad patterns) return `Err`.
pub fn run_batch_with_formatter(
	root: &Path,
	options: &PipelineOptions,
	formatter: &dyn Formatter,
) -> DocstripResult<BatchReport> {
	let files = collect_files(root, &options.extensions, &options.exclude_patterns)?;

	if options.uses_formatter() {
		formatter.ensure_available()?;
	}

	let pool = rayon::ThreadPoolBuilder::new()
		.num_threads(options.jobs)
		.build()
		.map_err(|e| DocstripError::WorkerPool(e.to_string()))?;
	let context = PipelineContext::new(options, Some(formatter));

	tracing::debug!(root = %root.display(), files = files.len(), "starting batch");
	let reports: Vec<FileReport> = pool.install(|| {
		files
			.par_iter()
			.map(|path| context.process_file(path))
			.collect()
	});

	let report = BatchReport {
		root: root.to_path_buf(),
		files: reports,
	};
	tracing::info!(
		root = %root.display(),
		files = report.files.len(),
		changed = report.changed_count(),
		skipped = report.skipped_count(),
		warnings = report.warning_count(),
		"batch finished"
	);

	Ok(report)
}
