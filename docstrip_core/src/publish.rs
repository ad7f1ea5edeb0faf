//! Copying headers from a private source tree into a public include tree.
//!
//! Regions wrapped in ignore markers are left out of the copy:
//!
//! ```text
//! class Widget {
//! #BEGIN_COPY_IGNORING
//!     void internal_only();
//! #END_COPY_IGNORING
//! };
//! ```

use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::DocstripError;
use crate::DocstripResult;
use crate::batch::collect_files;
use crate::config::CopyConfig;
use crate::encoding::EncodingOptions;
use crate::pipeline::FileStatus;
use crate::pipeline::SourceFile;
use crate::pipeline::render_lines;
use crate::pipeline::write_atomic;

/// Drop every line between an ignore-start marker line and the matching
/// ignore-end marker line, markers included. Markers are recognised at the
/// start of the trimmed line. An unterminated region runs to the end. An
/// empty start marker disables filtering.
pub fn filter_ignored_regions<'a, S: AsRef<str>>(
	lines: &'a [S],
	copy: &CopyConfig,
) -> Vec<&'a str> {
	if copy.ignore_start.trim().is_empty() {
		return lines.iter().map(AsRef::as_ref).collect();
	}

	let mut ignoring = false;
	let mut kept = Vec::with_capacity(lines.len());

	for line in lines {
		let line = line.as_ref();
		let trimmed = line.trim();

		if trimmed.starts_with(copy.ignore_start.as_str()) {
			ignoring = true;
			continue;
		}

		if !copy.ignore_end.trim().is_empty() && trimmed.starts_with(copy.ignore_end.as_str()) {
			ignoring = false;
			continue;
		}

		if !ignoring {
			kept.push(line);
		}
	}

	kept
}

/// Outcome of copying one header.
#[derive(Debug, Clone, Serialize)]
pub struct CopiedFile {
	pub source: PathBuf,
	pub destination: PathBuf,
	#[serde(flatten)]
	pub status: FileStatus,
}

/// Copy every header under `source` into the same relative location under
/// `destination`, leaving out ignored regions. Per-file failures are
/// recorded and do not stop the copy.
pub fn copy_headers(
	source: &Path,
	destination: &Path,
	copy: &CopyConfig,
	encoding: &EncodingOptions,
) -> DocstripResult<Vec<CopiedFile>> {
	if !source.is_dir() {
		return Err(DocstripError::MissingRoot {
			path: source.display().to_string(),
		});
	}

	let files = collect_files(source, &copy.extensions, &[])?;
	std::fs::create_dir_all(destination)?;

	let copied = files
		.into_iter()
		.map(|file| {
			let relative = file.strip_prefix(source).unwrap_or(&file).to_path_buf();
			let target = destination.join(&relative);
			let status = match copy_one(&file, &target, copy, encoding) {
				Ok(changed) => FileStatus::Normalized { changed },
				Err(error) => {
					tracing::error!(path = %file.display(), "copy failed: {error}");
					FileStatus::Skipped {
						reason: error.to_string(),
					}
				}
			};

			CopiedFile {
				source: file,
				destination: target,
				status,
			}
		})
		.collect();

	Ok(copied)
}

fn copy_one(
	file: &Path,
	target: &Path,
	copy: &CopyConfig,
	encoding: &EncodingOptions,
) -> DocstripResult<bool> {
	let (source, _) = SourceFile::read(file, encoding)?;
	let rendered = render_lines(&filter_ignored_regions(&source.lines, copy));

	if let Some(parent) = target.parent() {
		std::fs::create_dir_all(parent)?;
	}

	let unchanged = std::fs::read(target).is_ok_and(|existing| existing == rendered.as_bytes());
	if !unchanged {
		write_atomic(target, rendered.as_bytes())?;
		tracing::debug!(from = %file.display(), to = %target.display(), "copied header");
	}

	Ok(!unchanged)
}
