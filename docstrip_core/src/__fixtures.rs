use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::DocstripError;
use crate::DocstripResult;
use crate::formatter::Formatter;
use crate::pipeline::PipelineOptions;

/// A header in the shape the pipeline is built for: Doxygen class docs, an
/// inline member comment and a run of blank lines between two variables.
pub const WIDGET_HEADER: &str = concat!(
	"// widget.hpp\n",
	"// Part of the example SDK.\n",
	"\n",
	"#pragma once\n",
	"\n",
	"/**\n",
	" * @brief A widget.\n",
	" *\n",
	" * Longer description.\n",
	" */\n",
	"class Widget {\n",
	"public:\n",
	"    int width; ///< Width in pixels\n",
	"\n",
	"\n",
	"\n",
	"    int height;\n",
	"    void resize(int w, int h); //!< Resize both axes\n",
	"};\n",
);

#[derive(Debug, Clone, Copy)]
pub enum FakeBehavior {
	/// Return the file with an extra blank line after every `;` line.
	Spacing,
	Fail,
	Timeout,
	Unavailable,
}

/// In-process stand-in for `clang-format`.
#[derive(Debug)]
pub struct FakeFormatter {
	pub behavior: FakeBehavior,
	pub calls: AtomicUsize,
}

impl FakeFormatter {
	pub fn new(behavior: FakeBehavior) -> Self {
		Self {
			behavior,
			calls: AtomicUsize::new(0),
		}
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl Formatter for FakeFormatter {
	fn ensure_available(&self) -> DocstripResult<()> {
		match self.behavior {
			FakeBehavior::Unavailable => Err(DocstripError::FormatterUnavailable {
				program: "fake-format".to_string(),
				reason: "not installed".to_string(),
			}),
			_ => Ok(()),
		}
	}

	fn format(&self, style_path: &Path, file: &Path) -> DocstripResult<String> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		assert!(style_path.is_file(), "style sidecar must exist before formatting");

		match self.behavior {
			FakeBehavior::Spacing => Ok(std::fs::read_to_string(file)?.replace(";\n", ";\n\n")),
			FakeBehavior::Fail => Err(DocstripError::FormatterFailed {
				path: file.display().to_string(),
				reason: "syntax error".to_string(),
			}),
			FakeBehavior::Timeout => Err(DocstripError::FormatterTimeout {
				path: file.display().to_string(),
				seconds: 1,
			}),
			FakeBehavior::Unavailable => unreachable!("availability is checked first"),
		}
	}
}

/// Options with the formatter stages switched off.
pub fn unformatted_options() -> PipelineOptions {
	PipelineOptions {
		format: false,
		jobs: 2,
		..PipelineOptions::default()
	}
}

/// Options that run the full pipeline including the formatter.
pub fn formatted_options() -> PipelineOptions {
	PipelineOptions {
		jobs: 2,
		..PipelineOptions::default()
	}
}
