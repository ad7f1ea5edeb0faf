use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Deserialize;

use crate::DocstripResult;
use crate::pipeline::write_atomic;

/// File name of the style sidecar written next to formatted files.
pub const STYLE_FILE_NAME: &str = ".clang-format";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub enum TabPolicy {
	Never,
	ForIndentation,
	Always,
}

impl TabPolicy {
	fn as_str(self) -> &'static str {
		match self {
			Self::Never => "Never",
			Self::ForIndentation => "ForIndentation",
			Self::Always => "Always",
		}
	}
}

/// Fixed formatting options handed to the external formatter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatStyleSpec {
	pub based_on_style: String,
	pub indent_width: u32,
	pub continuation_indent_width: u32,
	pub access_modifier_offset: i32,
	pub indent_case_labels: bool,
	pub use_tab: TabPolicy,
	pub column_limit: u32,
	pub break_before_braces: String,
	pub keep_empty_lines_at_the_start_of_blocks: bool,
}

impl Default for FormatStyleSpec {
	fn default() -> Self {
		Self {
			based_on_style: "Google".to_string(),
			indent_width: 4,
			continuation_indent_width: 4,
			access_modifier_offset: -4,
			indent_case_labels: true,
			use_tab: TabPolicy::Never,
			column_limit: 120,
			break_before_braces: "Attach".to_string(),
			keep_empty_lines_at_the_start_of_blocks: false,
		}
	}
}

impl FormatStyleSpec {
	/// Render as a `.clang-format` document.
	pub fn render(&self) -> String {
		let entries: [(&str, String); 9] = [
			("BasedOnStyle", self.based_on_style.clone()),
			("IndentWidth", self.indent_width.to_string()),
			(
				"ContinuationIndentWidth",
				self.continuation_indent_width.to_string(),
			),
			("AccessModifierOffset", self.access_modifier_offset.to_string()),
			("IndentCaseLabels", self.indent_case_labels.to_string()),
			("UseTab", self.use_tab.as_str().to_string()),
			("ColumnLimit", self.column_limit.to_string()),
			("BreakBeforeBraces", self.break_before_braces.clone()),
			(
				"KeepEmptyLinesAtTheStartOfBlocks",
				self.keep_empty_lines_at_the_start_of_blocks.to_string(),
			),
		];

		entries
			.iter()
			.map(|(key, value)| format!("{key}: {value}\n"))
			.collect()
	}
}

/// Writes the style sidecar at most once per directory for the lifetime of
/// the writer. Safe to share between worker threads.
#[derive(Debug)]
pub struct StyleWriter {
	rendered: String,
	written: Mutex<HashSet<PathBuf>>,
}

impl StyleWriter {
	pub fn new(spec: &FormatStyleSpec) -> Self {
		Self {
			rendered: spec.render(),
			written: Mutex::new(HashSet::new()),
		}
	}

	/// Ensure the sidecar exists in `dir` and return its path.
	///
	/// The lock is held across the write so two workers in the same
	/// directory never race on the file.
	pub fn ensure(&self, dir: &Path) -> DocstripResult<PathBuf> {
		let path = dir.join(STYLE_FILE_NAME);
		let mut written = self
			.written
			.lock()
			.unwrap_or_else(std::sync::PoisonError::into_inner);

		if written.contains(dir) {
			return Ok(path);
		}

		write_atomic(&path, self.rendered.as_bytes())?;
		written.insert(dir.to_path_buf());
		tracing::debug!(path = %path.display(), "wrote style sidecar");

		Ok(path)
	}
}
