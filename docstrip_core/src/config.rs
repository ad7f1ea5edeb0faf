use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::DocstripError;
use crate::DocstripResult;
use crate::encoding::EncodingOptions;
use crate::notice::HeaderNotice;
use crate::style::FormatStyleSpec;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"docstrip.toml",
	".docstrip.toml",
	".config/docstrip.toml",
];

/// Default fixed-point cap for the blank-line collapser.
pub const DEFAULT_COLLAPSE_ITERATIONS: usize = 3;

/// Default formatter timeout in seconds.
pub const DEFAULT_FORMATTER_TIMEOUT_SECS: u64 = 30;

/// C and C++ source and header suffixes processed by default.
pub fn default_extensions() -> Vec<String> {
	["c", "cc", "cpp", "cxx", "h", "hpp"]
		.into_iter()
		.map(String::from)
		.collect()
}

/// Configuration loaded from a `docstrip.toml` file.
///
/// ```toml
/// extensions = ["h", "hpp"]
/// jobs = 4
/// collapse_iterations = 3
///
/// [exclude]
/// patterns = ["third_party/", "*.generated.h"]
///
/// [encoding]
/// detect = true
/// legacy_fallback = true
///
/// [notice]
/// text = """
/// // Public copy. See src/ for the documented sources.
/// """
///
/// [formatter]
/// command = "clang-format-18"
/// timeout_secs = 10
///
/// [style]
/// column_limit = 100
///
/// [copy]
/// extensions = ["h", "hpp", "inl"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocstripConfig {
	/// File extensions (without the dot) the batch walker picks up.
	pub extensions: Vec<String>,
	/// Gitignore-style exclusion patterns.
	pub exclude: ExcludeConfig,
	/// Worker threads. `0` uses the available parallelism.
	pub jobs: usize,
	/// Upper bound on blank-line collapsing passes.
	pub collapse_iterations: usize,
	pub encoding: EncodingOptions,
	pub notice: HeaderNotice,
	pub formatter: FormatterConfig,
	pub style: FormatStyleSpec,
	pub copy: CopyConfig,
}

impl Default for DocstripConfig {
	fn default() -> Self {
		Self {
			extensions: default_extensions(),
			exclude: ExcludeConfig::default(),
			jobs: 0,
			collapse_iterations: DEFAULT_COLLAPSE_ITERATIONS,
			encoding: EncodingOptions::default(),
			notice: HeaderNotice::default(),
			formatter: FormatterConfig::default(),
			style: FormatStyleSpec::default(),
			copy: CopyConfig::default(),
		}
	}
}

/// Configuration for excluding files and directories from the batch.
///
/// Patterns follow gitignore syntax and are relative to the batch root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExcludeConfig {
	/// Examples: `"build/"`, `"*.generated.h"`, `"!keep.h"`.
	pub patterns: Vec<String>,
}

/// External formatter settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatterConfig {
	/// When false the formatter stages are skipped entirely.
	pub enabled: bool,
	/// Executable name or path. Invoked as `<command> -style=file:<style> <file>`.
	pub command: String,
	/// Seconds to wait for a single file. `0` waits forever.
	pub timeout_secs: u64,
}

impl Default for FormatterConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			command: "clang-format".to_string(),
			timeout_secs: DEFAULT_FORMATTER_TIMEOUT_SECS,
		}
	}
}

/// Settings for copying headers into a public tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CopyConfig {
	/// Extensions copied from the source tree.
	pub extensions: Vec<String>,
	/// Lines starting with this marker open a region left out of the copy.
	pub ignore_start: String,
	/// Lines starting with this marker close the region.
	pub ignore_end: String,
}

impl Default for CopyConfig {
	fn default() -> Self {
		Self {
			extensions: vec!["h".to_string(), "hpp".to_string()],
			ignore_start: "#BEGIN_COPY_IGNORING".to_string(),
			ignore_end: "#END_COPY_IGNORING".to_string(),
		}
	}
}

impl CopyConfig {
	/// An empty marker would match every line.
	pub fn validate(&self) -> DocstripResult<()> {
		for (key, marker) in [
			("ignore_start", &self.ignore_start),
			("ignore_end", &self.ignore_end),
		] {
			if marker.trim().is_empty() {
				return Err(DocstripError::ConfigParse(format!(
					"`[copy] {key}` must not be empty"
				)));
			}
		}

		Ok(())
	}
}

impl DocstripConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no candidate exists.
	pub fn load(root: &Path) -> DocstripResult<Option<DocstripConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_file(&config_path).map(Some)
	}

	/// Load the config from an explicit file path.
	pub fn load_file(path: &Path) -> DocstripResult<DocstripConfig> {
		let content = std::fs::read_to_string(path).map_err(|e| {
			DocstripError::ConfigParse(format!("cannot read `{}`: {e}", path.display()))
		})?;

		let config: DocstripConfig =
			toml::from_str(&content).map_err(|e| DocstripError::ConfigParse(e.to_string()))?;
		config.copy.validate()?;

		Ok(config)
	}

	/// Load the config that applies to `target`. Directories are searched
	/// directly; for a single file its parent directory is searched.
	pub fn discover(target: &Path) -> DocstripResult<DocstripConfig> {
		let dir = if target.is_file() {
			target.parent().unwrap_or_else(|| Path::new("."))
		} else {
			target
		};

		Ok(Self::load(dir)?.unwrap_or_default())
	}
}

/// Case-sensitive extension match against an allow-list.
pub(crate) fn extension_in(path: &Path, allowed: &[String]) -> bool {
	let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
		return false;
	};

	allowed.iter().any(|candidate| candidate == ext)
}
