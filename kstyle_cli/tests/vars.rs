mod common;

use kstyle_core::AnyEmptyResult;

#[test]
fn vars_lists_sorted_names() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_site(
		tmp.path(),
		&[("page.html", "{$title} {$user['name']} {$title} <!-- tmplphp: echo $hidden; -->")],
	)?;

	common::kstyle_cmd()
		.args(["vars", "page.html", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("title\nuser\n");

	Ok(())
}

#[test]
fn vars_json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_site(tmp.path(), &[("page.html", "{$b}{$a}")])?;

	let output = common::kstyle_cmd()
		.args(["vars", "page.html", "--format", "json", "--path"])
		.arg(tmp.path())
		.output()?;
	assert!(output.status.success());

	let names: Vec<String> = serde_json::from_slice(&output.stdout)?;
	similar_asserts::assert_eq!(names, vec!["a".to_string(), "b".to_string()]);

	Ok(())
}

#[test]
fn vars_reports_templates_without_references() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_site(tmp.path(), &[("plain.html", "<p>static</p>")])?;

	common::kstyle_cmd()
		.args(["vars", "plain.html", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No variables found in plain.html."));

	Ok(())
}
