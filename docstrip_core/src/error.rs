use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum DocstripError {
	#[error(transparent)]
	#[diagnostic(code(docstrip::io_error))]
	Io(#[from] std::io::Error),

	#[error("unable to decode `{path}` with any of the attempted encodings")]
	#[diagnostic(
		code(docstrip::decode),
		help("enable `legacy_fallback` under [encoding] in docstrip.toml or pass `--legacy-fallback`")
	)]
	Decode { path: String },

	#[error("formatter `{program}` could not be started: {reason}")]
	#[diagnostic(
		code(docstrip::formatter_unavailable),
		help("install it, point `--formatter` at the right executable, or pass `--no-format`")
	)]
	FormatterUnavailable { program: String, reason: String },

	#[error("formatter failed on `{path}`: {reason}")]
	#[diagnostic(code(docstrip::formatter_failed))]
	FormatterFailed { path: String, reason: String },

	#[error("formatter timed out after {seconds}s on `{path}`")]
	#[diagnostic(
		code(docstrip::formatter_timeout),
		help("raise `timeout_secs` under [formatter] or pass `--timeout`")
	)]
	FormatterTimeout { path: String, seconds: u64 },

	#[error("path does not exist: `{path}`")]
	#[diagnostic(code(docstrip::missing_root))]
	MissingRoot { path: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(docstrip::config_parse),
		help("check that docstrip.toml is valid TOML and only uses known keys")
	)]
	ConfigParse(String),

	#[error("invalid exclude pattern `{pattern}`: {reason}")]
	#[diagnostic(code(docstrip::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("failed to start worker pool: {0}")]
	#[diagnostic(code(docstrip::worker_pool))]
	WorkerPool(String),
}

impl DocstripError {
	/// Configuration-level errors abort a whole batch. Everything else is
	/// attributable to a single file and only skips that file.
	pub fn is_fatal(&self) -> bool {
		matches!(
			self,
			Self::FormatterUnavailable { .. }
				| Self::MissingRoot { .. }
				| Self::ConfigParse(_)
				| Self::InvalidPattern { .. }
				| Self::WorkerPool(_)
		)
	}
}

pub type DocstripResult<T> = Result<T, DocstripError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
