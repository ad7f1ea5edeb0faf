use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Heuristic role of a single line. Only used to decide which blank lines
/// are redundant; this is not a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LineRole {
	FunctionDeclaration,
	VariableDeclaration,
	Other,
}

impl LineRole {
	/// Function and variable declarations form blocks whose inner blank
	/// lines are collapsed.
	pub fn is_declaration(self) -> bool {
		matches!(self, Self::FunctionDeclaration | Self::VariableDeclaration)
	}
}

/// `[qualifier] <type> <name> (`, terminated by `;` for a declaration.
static FUNCTION_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(constexpr\s+|inline\s+|static\s+|virtual\s+|\w+\s+)?[\w*&<>]+\s+\w+\s*\(")
		.unwrap_or_else(|e| panic!("invalid function pattern: {e}"))
});

/// `<type tokens> <name> =` or `<type tokens> <name>;`.
static VARIABLE_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[\w\s*&<>]+\s+\w+\s*[=;]")
		.unwrap_or_else(|e| panic!("invalid variable pattern: {e}"))
});

/// Classify a line. Surrounding whitespace is ignored; the first matching
/// rule wins.
pub fn classify_line(line: &str) -> LineRole {
	let trimmed = line.trim();

	if trimmed.ends_with(';') && FUNCTION_DECLARATION.is_match(trimmed) {
		return LineRole::FunctionDeclaration;
	}

	if VARIABLE_DECLARATION.is_match(trimmed) {
		return LineRole::VariableDeclaration;
	}

	LineRole::Other
}
