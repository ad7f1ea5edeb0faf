use crate::classifier::LineRole;
use crate::classifier::classify_line;

fn is_blank(line: &str) -> bool {
	line.trim().is_empty()
}

/// Roles of the nearest non-blank lines before and after a blank run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Neighbors {
	before: Option<LineRole>,
	after: Option<LineRole>,
}

impl Neighbors {
	/// A blank run inside a homogeneous declaration block is removed.
	fn joins_declarations(self) -> bool {
		match (self.before, self.after) {
			(Some(before), Some(after)) => before.is_declaration() && before == after,
			_ => false,
		}
	}
}

/// One collapsing pass. Lines are re-classified from scratch.
///
/// Every run of blank lines either disappears (when it sits between two
/// declarations of the same role) or shrinks to its first line.
pub fn collapse_pass<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
	let roles: Vec<Option<LineRole>> = lines
		.iter()
		.map(|line| {
			let line = line.as_ref();
			(!is_blank(line)).then(|| classify_line(line))
		})
		.collect();

	let mut output = Vec::with_capacity(lines.len());
	let mut previous_role = None;
	let mut index = 0;

	while index < lines.len() {
		let Some(role) = roles[index] else {
			let run_end = roles[index..]
				.iter()
				.position(Option::is_some)
				.map_or(lines.len(), |offset| index + offset);
			let neighbors = Neighbors {
				before: previous_role,
				after: roles.get(run_end).copied().flatten(),
			};

			if !neighbors.joins_declarations() {
				output.push(lines[index].as_ref().to_string());
			}

			index = run_end;
			continue;
		};

		output.push(lines[index].as_ref().to_string());
		previous_role = Some(role);
		index += 1;
	}

	output
}

/// Apply [`collapse_pass`] until nothing changes or `max_iterations` passes
/// have run. The result is a fixed point for any realistic input, so calling
/// this again on its own output returns it unchanged.
pub fn collapse_blank_lines<S: AsRef<str>>(lines: &[S], max_iterations: usize) -> Vec<String> {
	let mut current: Vec<String> = lines.iter().map(|line| line.as_ref().to_string()).collect();

	for pass in 0..max_iterations.max(1) {
		let next = collapse_pass(&current);
		if next == current {
			tracing::trace!(pass, "blank-line collapsing converged");
			break;
		}
		current = next;
	}

	current
}
