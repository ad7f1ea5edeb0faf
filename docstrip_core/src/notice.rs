use serde::Deserialize;

/// Banner placed in every public copy of a file.
pub const DEFAULT_NOTICE: &str = "\
// NOTICE: This is a public, automatically normalized copy of this file.
// Documentation comments and internal sections were removed and the code was reformatted.
// The complete source, including all documentation, lives in the project's `src` directory.";

/// Provenance banner and the marker used to detect an earlier insertion.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderNotice {
	/// Banner text. Every line should be a `//` comment so the result stays
	/// valid source.
	pub text: String,
	/// Substring whose presence anywhere in a file means the banner is
	/// already there. Defaults to the first non-empty banner line.
	pub marker: Option<String>,
}

impl Default for HeaderNotice {
	fn default() -> Self {
		Self {
			text: DEFAULT_NOTICE.to_string(),
			marker: None,
		}
	}
}

impl HeaderNotice {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			marker: None,
		}
	}

	/// Banner lines without surrounding blank lines.
	pub fn lines(&self) -> Vec<&str> {
		let lines: Vec<&str> = self.text.lines().collect();
		let start = lines
			.iter()
			.position(|line| !line.trim().is_empty())
			.unwrap_or(lines.len());
		let end = lines
			.iter()
			.rposition(|line| !line.trim().is_empty())
			.map_or(start, |index| index + 1);

		lines[start..end].to_vec()
	}

	pub fn marker(&self) -> &str {
		if let Some(marker) = self.marker.as_deref().filter(|m| !m.trim().is_empty()) {
			return marker;
		}

		self.lines().into_iter().next().map_or("", str::trim)
	}

	/// True when the marker occurs anywhere in `lines`.
	pub fn is_present<S: AsRef<str>>(&self, lines: &[S]) -> bool {
		let marker = self.marker();
		!marker.is_empty() && lines.iter().any(|line| line.as_ref().contains(marker))
	}
}

/// Number of leading lines that form an existing `//` header comment.
pub fn leading_header_len<S: AsRef<str>>(lines: &[S]) -> usize {
	lines
		.iter()
		.take_while(|line| line.as_ref().trim_start().starts_with("//"))
		.count()
}

/// Insert the banner once, directly below a leading `//` header comment or
/// at the very top. Returns `false` without touching `lines` if the banner is
/// already present or empty.
pub fn inject_notice(lines: &mut Vec<String>, notice: &HeaderNotice) -> bool {
	let banner = notice.lines();
	if banner.is_empty() || notice.is_present(lines) {
		return false;
	}

	let at = leading_header_len(lines);
	let mut block = Vec::with_capacity(banner.len() + 2);
	if at > 0 {
		block.push(String::new());
	}
	block.extend(banner.iter().map(|line| (*line).to_string()));
	if at < lines.len() {
		block.push(String::new());
	}

	lines.splice(at..at, block);
	true
}
