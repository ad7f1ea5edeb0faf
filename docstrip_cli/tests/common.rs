#![allow(dead_code)]

use std::path::Path;
use std::path::PathBuf;

use assert_cmd::Command;

pub const SAMPLE_HEADER: &str = "// counter.h\n\n#pragma once\n\n/**\n * @brief Counts things.\n */\nclass Counter {\npublic:\n    int value; ///< Current value\n\n\n    int step;\n    void tick(); //!< Advance once\n};\n";

pub fn docstrip_cmd() -> Command {
	let mut cmd = Command::cargo_bin("docstrip")
		.unwrap_or_else(|e| panic!("docstrip binary should be built: {e}"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("DOCSTRIP_LOG");
	cmd
}

/// Write an executable shell script that stands in for `clang-format`. It
/// answers `--version` and otherwise runs `body` with the file as `$2`.
#[cfg(unix)]
pub fn fake_formatter(dir: &Path, name: &str, body: &str) -> std::io::Result<PathBuf> {
	use std::os::unix::fs::PermissionsExt;

	let path = dir.join(name);
	let script = format!(
		"#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then\n  echo \"fake-format 1.0\"\n  exit 0\nfi\n{body}\n"
	);
	std::fs::write(&path, script)?;
	std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;

	Ok(path)
}
