//! Doc-comment removal.
//!
//! A two-state line scanner drops Doxygen block comments (`/** ... */` and
//! `/*! ... */`) that start a line, and cuts trailing inline doc markers
//! (`///<` and `//!`) together with everything after them.
//!
//! The scanner does not know about string or character literals. A literal
//! such as `"//! not a comment"` is truncated like a real comment. Inputs are
//! expected to be generated library headers where this does not happen.

use std::borrow::Cow;

/// Block doc-comment openers, matched after leading whitespace.
pub const BLOCK_OPENERS: [&str; 2] = ["/**", "/*!"];

/// Block comment closer.
pub const BLOCK_CLOSER: &str = "*/";

/// Inline doc-comment markers. The marker and the rest of the line go.
pub const INLINE_MARKERS: [&str; 2] = ["///<", "//!"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentScanState {
	#[default]
	Normal,
	InsideBlockComment,
}

/// What happens to a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction<'a> {
	Drop,
	Keep(Cow<'a, str>),
}

/// Transition function of the scanner. Returns the next state together with
/// the fate of `line`.
pub fn scan_line(state: CommentScanState, line: &str) -> (CommentScanState, LineAction<'_>) {
	match state {
		CommentScanState::InsideBlockComment => {
			let next = if line.contains(BLOCK_CLOSER) {
				CommentScanState::Normal
			} else {
				CommentScanState::InsideBlockComment
			};
			(next, LineAction::Drop)
		}
		CommentScanState::Normal => {
			let trimmed = line.trim_start();
			if BLOCK_OPENERS.iter().any(|opener| trimmed.starts_with(opener)) {
				// Search past the `/*` so that `/**/` counts as closed.
				let next = if trimmed[2..].contains(BLOCK_CLOSER) {
					CommentScanState::Normal
				} else {
					CommentScanState::InsideBlockComment
				};
				return (next, LineAction::Drop);
			}

			(CommentScanState::Normal, LineAction::Keep(strip_inline_markers(line)))
		}
	}
}

/// Remove the first inline doc marker, everything after it and the
/// whitespace directly before it.
pub fn strip_inline_markers(line: &str) -> Cow<'_, str> {
	let cut = INLINE_MARKERS
		.iter()
		.filter_map(|marker| line.find(marker))
		.min();

	match cut {
		Some(index) => Cow::Borrowed(line[..index].trim_end()),
		None => Cow::Borrowed(line),
	}
}

/// Result of stripping one file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StripOutcome {
	pub lines: Vec<String>,
	/// 1-indexed line of the opener when end of input was reached inside a
	/// block comment. Everything after that opener was dropped.
	pub unterminated_at: Option<usize>,
}

/// Strip doc comments from `lines`.
///
/// Blank lines are collapsed to one while emitting and leading and trailing
/// blank lines are trimmed once the scan finishes.
///
/// An unterminated block comment is tolerated: the rest of the input is
/// treated as commented out and reported through
/// [`StripOutcome::unterminated_at`] instead of failing, so malformed headers
/// never abort a batch.
pub fn strip_doc_comments<S: AsRef<str>>(lines: &[S]) -> StripOutcome {
	let mut state = CommentScanState::Normal;
	let mut opened_at = None;
	let mut kept: Vec<String> = Vec::with_capacity(lines.len());

	for (index, line) in lines.iter().enumerate() {
		let (next, action) = scan_line(state, line.as_ref());
		if state == CommentScanState::Normal && next == CommentScanState::InsideBlockComment {
			opened_at = Some(index + 1);
		}
		state = next;

		let LineAction::Keep(text) = action else {
			continue;
		};

		let is_blank = text.trim().is_empty();
		let follows_blank = kept.last().is_none_or(|last| last.trim().is_empty());
		if is_blank && follows_blank {
			continue;
		}

		kept.push(text.into_owned());
	}

	while kept.last().is_some_and(|last| last.trim().is_empty()) {
		kept.pop();
	}

	StripOutcome {
		lines: kept,
		unterminated_at: match state {
			CommentScanState::InsideBlockComment => opened_at,
			CommentScanState::Normal => None,
		},
	}
}
