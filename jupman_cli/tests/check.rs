mod common;

use jupman_core::AnyEmptyResult;

#[test]
fn check_passes_when_balanced() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("add_sol.py"), common::SOLUTION_SCRIPT)?;
	std::fs::write(tmp.path().join("notes.txt"), "#jupman-raise without a close")?;

	let mut cmd = common::jupman_cmd();
	let _ = cmd
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"ok: 3 tag(s) across 1 file(s) are balanced.",
		));

	Ok(())
}

#[test]
fn check_fails_on_unclosed_region() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("broken_sol.py"),
		"x = 1\n#jupman-raise\nreturn x\n",
	)?;

	let mut cmd = common::jupman_cmd();
	let _ = cmd
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("broken_sol.py:2:1"))
		.stderr(predicates::str::contains("jupman::unclosed_region"))
		.stderr(predicates::str::contains("1 unbalanced region(s) found."));

	Ok(())
}

#[test]
fn check_json_lists_notebook_cells() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("lesson-sol.ipynb"),
		common::notebook_json(&[
			("markdown", "# Lesson"),
			("code", "x = 1\n#/jupman-strip\n"),
		]),
	)?;

	let mut cmd = common::jupman_cmd();
	let output = cmd
		.arg("check")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;
	assert_eq!(output.status.code(), Some(1));

	let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
	similar_asserts::assert_eq!(
		json,
		serde_json::json!({
			"ok": false,
			"files": 1,
			"tags": 0,
			"diagnostics": [{
				"file": "lesson-sol.ipynb",
				"cell": 1,
				"line": 2,
				"column": 1,
				"tag": "jupman-strip",
				"message": "`#/jupman-strip` closes a region that was never opened",
			}],
			"failures": [],
		})
	);

	Ok(())
}

#[test]
fn check_skips_ignored_directories() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("_build"))?;
	std::fs::write(tmp.path().join("_build/stale_sol.py"), "#jupman-purge\n")?;
	std::fs::write(tmp.path().join("ok_sol.py"), "# SOLUTION\nx = 1\n")?;

	let mut cmd = common::jupman_cmd();
	let _ = cmd
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("1 tag(s) across 1 file(s)"));

	Ok(())
}

#[test]
fn check_reports_bad_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("jupman.toml"), "[naming\nsol_suffix = 3")?;

	let mut cmd = common::jupman_cmd();
	let _ = cmd
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}

#[test]
fn check_reports_every_file_past_a_malformed_one() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("a-sol.ipynb"), "not json")?;
	std::fs::write(tmp.path().join("b_sol.py"), "x = 1\n#jupman-strip\ny = 2\n")?;
	std::fs::write(tmp.path().join("c_sol.py"), "# SOLUTION\nx = 1\n")?;

	let mut cmd = common::jupman_cmd();
	let _ = cmd
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("failed: a-sol.ipynb: failed to read notebook"))
		.stderr(predicates::str::contains("b_sol.py:2:1"))
		.stderr(predicates::str::contains("1 unbalanced region(s) found."))
		.stderr(predicates::str::contains("1 file(s) could not be checked."));

	Ok(())
}

#[test]
fn check_json_lists_failed_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("a-sol.ipynb"), "not json")?;
	std::fs::write(tmp.path().join("b_sol.py"), "# SOLUTION\nx = 1\n")?;

	let mut cmd = common::jupman_cmd();
	let output = cmd
		.arg("check")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;
	assert_eq!(output.status.code(), Some(1));

	let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
	similar_asserts::assert_eq!(json["ok"], serde_json::json!(false));
	similar_asserts::assert_eq!(json["files"], serde_json::json!(2));
	similar_asserts::assert_eq!(json["tags"], serde_json::json!(1));
	similar_asserts::assert_eq!(json["failures"][0]["file"], serde_json::json!("a-sol.ipynb"));
	assert!(
		json["failures"][0]["error"]
			.as_str()
			.is_some_and(|error| error.starts_with("failed to read notebook"))
	);

	Ok(())
}
