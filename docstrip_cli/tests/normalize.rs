mod common;

use clap::Parser;
use docstrip_cli::DocstripCli;
use docstrip_cli::OutputFormat;
use docstrip_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use serde_json::Value;

#[test]
fn normalizes_directory_without_formatter() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let header = tmp.path().join("counter.h");
	std::fs::write(&header, common::SAMPLE_HEADER)?;

	common::docstrip_cmd()
		.arg("--no-format")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("normalized counter.h"))
		.stdout(predicates::str::contains(
			"1 file(s): 1 normalized, 0 unchanged, 0 skipped, 0 warning(s)",
		));

	let content = std::fs::read_to_string(&header)?;
	assert!(content.starts_with("// counter.h\n\n// NOTICE:"));
	assert_eq!(content.matches("// NOTICE:").count(), 1);
	assert!(!content.contains("@brief"));
	assert!(!content.contains("///<"));
	assert!(!content.contains("//!<"));
	assert!(content.contains("    int value;\n    int step;\n    void tick();\n};\n"));
	assert!(!tmp.path().join(".clang-format").exists());

	Ok(())
}

#[test]
fn second_run_reports_unchanged() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let header = tmp.path().join("counter.h");
	std::fs::write(&header, common::SAMPLE_HEADER)?;

	common::docstrip_cmd()
		.arg("--no-format")
		.arg(tmp.path())
		.assert()
		.success();
	let first = std::fs::read_to_string(&header)?;

	common::docstrip_cmd()
		.arg("--no-format")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("unchanged counter.h"));

	assert_eq!(std::fs::read_to_string(&header)?, first);

	Ok(())
}

#[test]
fn strip_only_removes_doc_comments_only() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let header = tmp.path().join("counter.h");
	std::fs::write(&header, common::SAMPLE_HEADER)?;

	common::docstrip_cmd()
		.arg("--strip-only")
		.arg(tmp.path())
		.assert()
		.success();

	assert_eq!(
		std::fs::read_to_string(&header)?,
		"// counter.h\n\n#pragma once\n\nclass Counter {\npublic:\n    int value;\n\n    int \
		 step;\n    void tick();\n};\n"
	);

	Ok(())
}

#[test]
fn dry_run_writes_nothing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let header = tmp.path().join("counter.h");
	std::fs::write(&header, common::SAMPLE_HEADER)?;

	common::docstrip_cmd()
		.arg("--dry-run")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("would change counter.h"));

	assert_eq!(std::fs::read_to_string(&header)?, common::SAMPLE_HEADER);

	Ok(())
}

#[test]
fn single_file_target() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let target = tmp.path().join("counter.h");
	let untouched = tmp.path().join("other.h");
	std::fs::write(&target, common::SAMPLE_HEADER)?;
	std::fs::write(&untouched, common::SAMPLE_HEADER)?;

	common::docstrip_cmd()
		.arg("--no-format")
		.arg(&target)
		.assert()
		.success()
		.stdout(predicates::str::contains("1 file(s)"));

	assert_ne!(std::fs::read_to_string(&target)?, common::SAMPLE_HEADER);
	assert_eq!(std::fs::read_to_string(&untouched)?, common::SAMPLE_HEADER);

	Ok(())
}

#[test]
fn json_report() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("counter.h"), common::SAMPLE_HEADER)?;
	std::fs::write(tmp.path().join("broken.h"), "int a;\n/** never closed\n")?;

	let output = common::docstrip_cmd()
		.arg("--no-format")
		.arg("--format")
		.arg("json")
		.arg(tmp.path())
		.output()?;
	assert!(output.status.success());

	let report: Value = serde_json::from_slice(&output.stdout)?;
	let files = report["files"]
		.as_array()
		.ok_or("files should be an array")?;
	assert_eq!(files.len(), 2);

	assert!(files[0]["path"].as_str().is_some_and(|p| p.ends_with("broken.h")));
	assert_eq!(files[0]["status"], "normalized");
	assert_eq!(files[0]["changed"], true);
	assert_eq!(files[0]["warnings"][0]["kind"], "unterminated_comment");
	assert_eq!(files[0]["warnings"][0]["line"], 2);

	assert_eq!(files[1]["encoding"], "UTF-8");
	assert_eq!(files[1]["warnings"].as_array().map(Vec::len), Some(0));

	Ok(())
}

#[test]
fn unterminated_comment_is_reported() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("broken.h"), "int a;\n\n/** never closed\nint b;\n")?;

	common::docstrip_cmd()
		.arg("--no-format")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"warning: unterminated block comment opened on line 3",
		));

	Ok(())
}

#[test]
fn undecodable_file_is_skipped() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let bad = tmp.path().join("bad.h");
	std::fs::write(&bad, b"int caf\xE9;\n")?;
	std::fs::write(tmp.path().join("good.h"), "int ok;\n")?;

	common::docstrip_cmd()
		.arg("--no-format")
		.arg("--no-detect")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("skipped bad.h"))
		.stdout(predicates::str::contains("normalized good.h"));

	assert_eq!(std::fs::read(&bad)?, b"int caf\xE9;\n");

	Ok(())
}

#[test]
fn legacy_fallback_rewrites_as_utf8() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let file = tmp.path().join("legacy.h");
	std::fs::write(&file, b"int caf\xE9;\n")?;

	common::docstrip_cmd()
		.args(["--strip-only", "--no-detect", "--legacy-fallback"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("rewritten as UTF-8"));

	assert_eq!(std::fs::read_to_string(&file)?, "int café;\n");

	Ok(())
}

#[test]
fn missing_root_exits_with_error() {
	common::docstrip_cmd()
		.arg("/definitely/not/here")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("docstrip::missing_root"));
}

#[test]
fn missing_formatter_exits_with_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let header = tmp.path().join("counter.h");
	std::fs::write(&header, common::SAMPLE_HEADER)?;

	common::docstrip_cmd()
		.arg("--formatter")
		.arg("docstrip-no-such-formatter")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("docstrip::formatter_unavailable"));

	assert_eq!(std::fs::read_to_string(&header)?, common::SAMPLE_HEADER);

	Ok(())
}

#[test]
fn config_file_is_discovered() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("docstrip.toml"),
		"[formatter]\nenabled = false\n\n[notice]\ntext = \"// PUBLIC COPY\"\n",
	)?;
	let header = tmp.path().join("counter.h");
	std::fs::write(&header, common::SAMPLE_HEADER)?;

	common::docstrip_cmd()
		.arg("--formatter")
		.arg("docstrip-no-such-formatter")
		.arg(tmp.path())
		.assert()
		.success();

	let content = std::fs::read_to_string(&header)?;
	assert!(content.starts_with("// counter.h\n\n// PUBLIC COPY\n\n#pragma once\n"));

	Ok(())
}

#[test]
fn explicit_config_path() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config = tmp.path().join("custom.toml");
	std::fs::write(&config, "extensions = [\"inl\"]\n")?;
	let src = tmp.path().join("src");
	std::fs::create_dir_all(&src)?;
	std::fs::write(src.join("a.inl"), "int a; ///< doc\n")?;
	std::fs::write(src.join("b.h"), "int b; ///< doc\n")?;

	common::docstrip_cmd()
		.arg("--config")
		.arg(&config)
		.arg("--strip-only")
		.arg(&src)
		.assert()
		.success()
		.stdout(predicates::str::contains("a.inl"))
		.stdout(predicates::str::contains("b.h").not());

	assert_eq!(std::fs::read_to_string(src.join("a.inl"))?, "int a;\n");
	assert_eq!(std::fs::read_to_string(src.join("b.h"))?, "int b; ///< doc\n");

	Ok(())
}

#[test]
fn invalid_config_exits_with_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("docstrip.toml"), "unknown_key = 1\n")?;
	std::fs::write(tmp.path().join("a.h"), "int a;\n")?;

	common::docstrip_cmd()
		.arg("--no-format")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("docstrip::config_parse"));

	Ok(())
}

#[test]
fn path_is_required_without_subcommand() {
	assert!(DocstripCli::try_parse_from(["docstrip"]).is_err());
}

#[test]
fn parses_pipeline_overrides() -> AnyEmptyResult {
	let cli = DocstripCli::try_parse_from([
		"docstrip",
		"--jobs",
		"4",
		"--timeout",
		"0",
		"--format",
		"json",
		"--no-detect",
		"include",
	])?;

	assert!(cli.command.is_none());
	assert_eq!(cli.run.path.as_deref(), Some(std::path::Path::new("include")));
	assert_eq!(cli.run.pipeline.jobs, Some(4));
	assert_eq!(cli.run.pipeline.timeout, Some(0));
	assert_eq!(cli.run.pipeline.format, OutputFormat::Json);
	assert!(cli.run.pipeline.no_detect);
	assert!(!cli.run.pipeline.legacy_fallback);

	Ok(())
}

#[cfg(unix)]
#[test]
fn runs_external_formatter() -> AnyEmptyResult {
	let tools = tempfile::tempdir()?;
	let formatter = common::fake_formatter(tools.path(), "fake-format", "cat \"$2\"")?;

	let tmp = tempfile::tempdir()?;
	let header = tmp.path().join("counter.h");
	std::fs::write(&header, common::SAMPLE_HEADER)?;

	common::docstrip_cmd()
		.arg("--formatter")
		.arg(&formatter)
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("normalized counter.h"))
		.stdout(predicates::str::contains("0 warning(s)"))
		.stdout(predicates::str::contains("warning:").not());

	let style = std::fs::read_to_string(tmp.path().join(".clang-format"))?;
	assert!(style.contains("BasedOnStyle: Google\n"));
	assert!(style.contains("ColumnLimit: 120\n"));
	assert!(!std::fs::read_to_string(&header)?.contains("@brief"));

	Ok(())
}

#[cfg(unix)]
#[test]
fn failing_formatter_keeps_unformatted_output() -> AnyEmptyResult {
	let tools = tempfile::tempdir()?;
	let formatter = common::fake_formatter(
		tools.path(),
		"broken-format",
		"echo \"counter.h:3: unexpected token\" >&2\nexit 1",
	)?;

	let tmp = tempfile::tempdir()?;
	let header = tmp.path().join("counter.h");
	std::fs::write(&header, common::SAMPLE_HEADER)?;

	common::docstrip_cmd()
		.arg("--formatter")
		.arg(&formatter)
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("warning: formatter failed"))
		.stdout(predicates::str::contains("unexpected token"));

	let content = std::fs::read_to_string(&header)?;
	assert_eq!(content.matches("// NOTICE:").count(), 1);
	assert!(!content.contains("///<"));

	Ok(())
}

#[cfg(unix)]
#[test]
fn slow_formatter_times_out() -> AnyEmptyResult {
	let tools = tempfile::tempdir()?;
	let formatter = common::fake_formatter(tools.path(), "slow-format", "exec sleep 10")?;

	let tmp = tempfile::tempdir()?;
	let header = tmp.path().join("counter.h");
	std::fs::write(&header, common::SAMPLE_HEADER)?;

	common::docstrip_cmd()
		.arg("--formatter")
		.arg(&formatter)
		.arg("--timeout")
		.arg("1")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("formatter timed out after 1s"));

	assert!(!std::fs::read_to_string(&header)?.contains("@brief"));

	Ok(())
}
