use std::fmt;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::DocstripError;
use crate::DocstripResult;
use crate::collapser::collapse_blank_lines;
use crate::config::DocstripConfig;
use crate::encoding::EncodingOptions;
use crate::encoding::decode_bytes;
use crate::formatter::Formatter;
use crate::notice::HeaderNotice;
use crate::notice::inject_notice;
use crate::stripper::strip_doc_comments;
use crate::style::FormatStyleSpec;
use crate::style::StyleWriter;

/// Which stages run for each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
	/// Strip, add the notice, collapse, format and collapse again.
	#[default]
	Full,
	/// Only remove doc comments.
	StripOnly,
}

/// Everything a pipeline run needs, resolved up front from config and CLI
/// flags and passed explicitly to each stage.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
	pub mode: PipelineMode,
	pub extensions: Vec<String>,
	pub exclude_patterns: Vec<String>,
	pub encoding: EncodingOptions,
	pub notice: HeaderNotice,
	pub collapse_iterations: usize,
	/// Run the external formatter in [`PipelineMode::Full`].
	pub format: bool,
	pub formatter_command: String,
	pub formatter_timeout_secs: u64,
	pub style: FormatStyleSpec,
	/// Worker threads; `0` uses the available parallelism.
	pub jobs: usize,
	/// Compute results without writing anything.
	pub dry_run: bool,
}

impl Default for PipelineOptions {
	fn default() -> Self {
		Self::from_config(&DocstripConfig::default())
	}
}

impl PipelineOptions {
	pub fn from_config(config: &DocstripConfig) -> Self {
		Self {
			mode: PipelineMode::Full,
			extensions: config.extensions.clone(),
			exclude_patterns: config.exclude.patterns.clone(),
			encoding: config.encoding.clone(),
			notice: config.notice.clone(),
			collapse_iterations: config.collapse_iterations,
			format: config.formatter.enabled,
			formatter_command: config.formatter.command.clone(),
			formatter_timeout_secs: config.formatter.timeout_secs,
			style: config.style.clone(),
			jobs: config.jobs,
			dry_run: false,
		}
	}

	/// True when the external formatter takes part in this run.
	pub fn uses_formatter(&self) -> bool {
		self.mode == PipelineMode::Full && self.format && !self.dry_run
	}
}

/// A non-fatal problem attached to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum FileWarning {
	/// A block doc comment opened on `line` never closed; the rest of the
	/// file was dropped.
	UnterminatedComment { line: usize },
	/// The file was not UTF-8 and has been re-encoded.
	LegacyEncoding { encoding: String },
	/// The formatter reported an error; the unformatted output was kept.
	FormatterFailed { reason: String },
	/// The formatter did not finish in time; the unformatted output was kept.
	FormatterTimeout { seconds: u64 },
	/// The formatted output could not be written; the unformatted output
	/// stays on disk.
	FormattedWriteFailed { reason: String },
}

impl fmt::Display for FileWarning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::UnterminatedComment { line } => {
				write!(
					f,
					"unterminated block comment opened on line {line}; remainder dropped"
				)
			}
			Self::LegacyEncoding { encoding } => {
				write!(f, "decoded as {encoding} and rewritten as UTF-8")
			}
			Self::FormatterFailed { reason } => {
				write!(f, "formatter failed, kept unformatted output: {reason}")
			}
			Self::FormatterTimeout { seconds } => {
				write!(f, "formatter timed out after {seconds}s, kept unformatted output")
			}
			Self::FormattedWriteFailed { reason } => {
				write!(f, "could not write formatted output, kept unformatted output: {reason}")
			}
		}
	}
}

/// Outcome of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
	/// The pipeline completed. `changed` is false when the file was already
	/// normalized.
	Normalized { changed: bool },
	/// The file was left untouched.
	Skipped { reason: String },
}

/// Per-file report. Every warning and error is attributable to `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
	pub path: PathBuf,
	pub encoding: Option<String>,
	#[serde(flatten)]
	pub status: FileStatus,
	pub warnings: Vec<FileWarning>,
}

impl FileReport {
	fn new(path: &Path) -> Self {
		Self {
			path: path.to_path_buf(),
			encoding: None,
			status: FileStatus::Normalized { changed: false },
			warnings: Vec::new(),
		}
	}

	pub fn is_skipped(&self) -> bool {
		matches!(self.status, FileStatus::Skipped { .. })
	}

	pub fn is_changed(&self) -> bool {
		matches!(self.status, FileStatus::Normalized { changed: true })
	}

	fn warn(&mut self, warning: FileWarning) {
		tracing::warn!(path = %self.path.display(), "{warning}");
		self.warnings.push(warning);
	}
}

/// A file read once at pipeline entry. Lines are newline-normalized and
/// carry no terminators.
#[derive(Debug, Clone)]
pub struct SourceFile {
	pub path: PathBuf,
	pub raw: Vec<u8>,
	pub encoding: &'static str,
	pub lines: Vec<String>,
}

impl SourceFile {
	/// Read and decode `path`.
	pub fn read(path: &Path, options: &EncodingOptions) -> DocstripResult<(Self, bool)> {
		let raw = std::fs::read(path)?;
		let decoded = decode_bytes(&raw, options).ok_or_else(|| DocstripError::Decode {
			path: path.display().to_string(),
		})?;
		let non_primary = decoded.is_non_primary();
		let file = Self {
			path: path.to_path_buf(),
			encoding: decoded.encoding_name(),
			lines: split_lines(&decoded.text),
			raw,
		};

		Ok((file, non_primary))
	}

	/// True when `rendered` differs from what is on disk.
	pub fn differs_from(&self, rendered: &str) -> bool {
		self.raw != rendered.as_bytes()
	}
}

/// Normalize CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Split text into lines after normalizing line endings.
pub fn split_lines(content: &str) -> Vec<String> {
	normalize_line_endings(content)
		.lines()
		.map(String::from)
		.collect()
}

/// Join lines with `\n` and terminate the last one. Zero lines render as an
/// empty string.
pub fn render_lines<S: AsRef<str>>(lines: &[S]) -> String {
	let mut rendered = String::new();
	for line in lines {
		rendered.push_str(line.as_ref());
		rendered.push('\n');
	}
	rendered
}

/// The in-memory stages that run before the formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
	pub lines: Vec<String>,
	pub unterminated_at: Option<usize>,
}

/// Strip doc comments and, in [`PipelineMode::Full`], add the notice and
/// collapse blank lines. Pure; touches no files.
pub fn normalize_lines<S: AsRef<str>>(lines: &[S], options: &PipelineOptions) -> Normalized {
	let stripped = strip_doc_comments(lines);
	let mut lines = stripped.lines;

	if options.mode == PipelineMode::Full {
		inject_notice(&mut lines, &options.notice);
		lines = collapse_blank_lines(&lines, options.collapse_iterations);
	}

	Normalized {
		lines,
		unterminated_at: stripped.unterminated_at,
	}
}

/// Convenience wrapper over [`normalize_lines`] for whole strings.
pub fn normalize_text(content: &str, options: &PipelineOptions) -> String {
	render_lines(&normalize_lines(&split_lines(content), options).lines)
}

/// Shared state for processing many files, possibly from several threads.
pub struct PipelineContext<'a> {
	pub options: &'a PipelineOptions,
	pub formatter: Option<&'a dyn Formatter>,
	styles: StyleWriter,
}

impl fmt::Debug for PipelineContext<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PipelineContext")
			.field("options", &self.options)
			.field("formatter", &self.formatter.is_some())
			.finish_non_exhaustive()
	}
}

impl<'a> PipelineContext<'a> {
	/// `formatter` is ignored unless the options ask for formatting.
	pub fn new(options: &'a PipelineOptions, formatter: Option<&'a dyn Formatter>) -> Self {
		Self {
			options,
			formatter: formatter.filter(|_| options.uses_formatter()),
			styles: StyleWriter::new(&options.style),
		}
	}

	/// Run the whole pipeline on one file. Errors never escape: they end up
	/// as a skipped status in the report.
	pub fn process_file(&self, path: &Path) -> FileReport {
		let mut report = FileReport::new(path);

		if let Err(error) = self.run(path, &mut report) {
			tracing::error!(path = %path.display(), "skipped: {error}");
			report.status = FileStatus::Skipped {
				reason: error.to_string(),
			};
		}

		report
	}

	fn run(&self, path: &Path, report: &mut FileReport) -> DocstripResult<()> {
		let options = self.options;
		let (source, non_primary) = SourceFile::read(path, &options.encoding)?;
		report.encoding = Some(source.encoding.to_string());
		if non_primary {
			report.warn(FileWarning::LegacyEncoding {
				encoding: source.encoding.to_string(),
			});
		}

		let normalized = normalize_lines(&source.lines, options);
		if let Some(line) = normalized.unterminated_at {
			report.warn(FileWarning::UnterminatedComment { line });
		}

		let mut rendered = render_lines(&normalized.lines);
		tracing::debug!(
			path = %path.display(),
			before = source.lines.len(),
			after = normalized.lines.len(),
			"normalized lines"
		);

		if options.dry_run {
			report.status = FileStatus::Normalized {
				changed: source.differs_from(&rendered),
			};
			return Ok(());
		}

		if source.differs_from(&rendered) {
			write_atomic(path, rendered.as_bytes())?;
		}

		if let Some(formatter) = self.formatter {
			if let Some(formatted) = self.format(formatter, path, report) {
				if formatted != rendered {
					match write_atomic(path, formatted.as_bytes()) {
						Ok(()) => rendered = formatted,
						Err(error) => {
							report.warn(FileWarning::FormattedWriteFailed {
								reason: error.to_string(),
							});
						}
					}
				}
			}
		}

		report.status = FileStatus::Normalized {
			changed: source.differs_from(&rendered),
		};

		Ok(())
	}

	/// Format the already written file and collapse the formatter's output
	/// again. Failures become warnings and yield `None`.
	fn format(
		&self,
		formatter: &dyn Formatter,
		path: &Path,
		report: &mut FileReport,
	) -> Option<String> {
		let dir = path
			.parent()
			.filter(|parent| !parent.as_os_str().is_empty())
			.unwrap_or_else(|| Path::new("."));

		let result = self
			.styles
			.ensure(dir)
			.and_then(|style| formatter.format(&style, path));

		match result {
			Ok(text) => {
				let lines =
					collapse_blank_lines(&split_lines(&text), self.options.collapse_iterations);
				Some(render_lines(&lines))
			}
			Err(DocstripError::FormatterTimeout { seconds, .. }) => {
				report.warn(FileWarning::FormatterTimeout { seconds });
				None
			}
			Err(error) => {
				report.warn(FileWarning::FormatterFailed {
					reason: error.to_string(),
				});
				None
			}
		}
	}
}

/// Write `contents` to `path` through a temporary file in the same directory
/// followed by a rename, so an interrupted run never leaves a truncated
/// file. Permissions of an existing file are carried over.
pub fn write_atomic(path: &Path, contents: &[u8]) -> DocstripResult<()> {
	let dir = path
		.parent()
		.filter(|parent| !parent.as_os_str().is_empty())
		.unwrap_or_else(|| Path::new("."));
	let mut temp = tempfile::NamedTempFile::new_in(dir)?;
	temp.write_all(contents)?;
	temp.as_file().sync_all()?;

	if let Ok(metadata) = std::fs::metadata(path) {
		temp.as_file().set_permissions(metadata.permissions())?;
	}

	temp.persist(path).map_err(|e| e.error)?;

	Ok(())
}
